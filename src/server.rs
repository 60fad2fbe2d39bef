//! HTTP surface (feature `server`).
//!
//! | Route | Body | Success |
//! |-------|------|---------|
//! | `POST /extract-text` | multipart, field `file` | `{text, pages}` |
//! | `POST /generate-quiz` | JSON `{text}` | `{questions}` |
//! | `POST /generate-outline` | JSON `{text}` | `{outline}` |
//! | `POST /generate-mindmap` | JSON `{text}` | `{mindMap}` |
//! | `GET /health` | none | `ok` |
//!
//! Every failure answers `{"error": "..."}`: `400` for caller mistakes (no
//! file, no text, unreadable body), `500` for everything else. Error bodies
//! carry the generic user message; the detailed cause is logged.
//!
//! Handlers are stateless: each request is one extraction or one generation.

use crate::artifact::{Artifact, ArtifactKind, ExtractedText};
use crate::config::{GenerationConfig, ServerConfig};
use crate::error::{ErrorCategory, StudyError};
use crate::generate;
use crate::pipeline::extract::{PdfiumExtractor, TextExtractor};
use crate::pipeline::llm::ModelClient;
use axum::body::Bytes;
use axum::extract::multipart::MultipartRejection;
use axum::extract::rejection::JsonRejection;
use axum::extract::{DefaultBodyLimit, Multipart, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};

/// Multipart framing on top of the raw upload cap.
const MULTIPART_OVERHEAD_BYTES: usize = 64 * 1024;

/// Shared handler state.
#[derive(Clone)]
pub struct AppState {
    pub extractor: Arc<dyn TextExtractor>,
    pub model: Arc<dyn ModelClient>,
    pub config: Arc<GenerationConfig>,
}

impl AppState {
    pub fn new(
        extractor: Arc<dyn TextExtractor>,
        model: Arc<dyn ModelClient>,
        config: GenerationConfig,
    ) -> Self {
        Self {
            extractor,
            model,
            config: Arc::new(config),
        }
    }

    /// Production state: pdfium extraction and the provider resolved from
    /// `config`.
    pub fn from_config(config: GenerationConfig) -> Result<Self, StudyError> {
        let extractor = match config.password {
            Some(ref pwd) => PdfiumExtractor::with_password(pwd.clone()),
            None => PdfiumExtractor::new(),
        };
        let model = generate::resolve_model_client(&config)?;
        Ok(Self::new(Arc::new(extractor), Arc::new(model), config))
    }
}

/// Build the application router.
pub fn router(state: AppState) -> Router {
    let body_limit = state
        .config
        .max_upload_bytes
        .saturating_add(MULTIPART_OVERHEAD_BYTES);

    Router::new()
        .route("/extract-text", post(extract_text))
        .route("/generate-quiz", post(generate_quiz))
        .route("/generate-outline", post(generate_outline))
        .route("/generate-mindmap", post(generate_mind_map))
        .route("/health", get(health))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Bind `config.bind_addr()` and serve until Ctrl-C.
pub async fn serve(config: ServerConfig, state: AppState) -> Result<(), StudyError> {
    let addr = config.bind_addr();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| StudyError::Internal(format!("Failed to bind {addr}: {e}")))?;
    info!("Listening on http://{}", addr);

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| StudyError::Internal(format!("Server error: {e}")))
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        info!("Shutting down");
    }
}

// ── Handlers ─────────────────────────────────────────────────────────────

async fn health() -> &'static str {
    "ok"
}

async fn extract_text(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<ExtractedText>, ApiError> {
    let mut multipart =
        multipart.map_err(|e| StudyError::usage(format!("expected a multipart upload: {e}")))?;

    let mut file: Option<Bytes> = None;
    while let Some(field) = multipart.next_field().await.map_err(upload_error)? {
        if field.name() == Some("file") {
            file = Some(field.bytes().await.map_err(upload_error)?);
            break;
        }
    }
    let bytes = file.ok_or_else(|| StudyError::usage("no file uploaded"))?;

    let extracted =
        generate::extract_text(&bytes, state.extractor.as_ref(), &state.config).await?;
    Ok(Json(extracted))
}

fn upload_error(e: axum::extract::multipart::MultipartError) -> StudyError {
    StudyError::usage(format!("could not read upload: {}", e.body_text()))
}

#[derive(Debug, Deserialize)]
struct GenerateBody {
    #[serde(default)]
    text: Option<String>,
}

async fn generate_quiz(
    State(state): State<AppState>,
    body: Result<Json<GenerateBody>, JsonRejection>,
) -> Result<Json<Artifact>, ApiError> {
    generate_kind(ArtifactKind::Quiz, &state, body).await
}

async fn generate_outline(
    State(state): State<AppState>,
    body: Result<Json<GenerateBody>, JsonRejection>,
) -> Result<Json<Artifact>, ApiError> {
    generate_kind(ArtifactKind::Outline, &state, body).await
}

async fn generate_mind_map(
    State(state): State<AppState>,
    body: Result<Json<GenerateBody>, JsonRejection>,
) -> Result<Json<Artifact>, ApiError> {
    generate_kind(ArtifactKind::MindMap, &state, body).await
}

async fn generate_kind(
    kind: ArtifactKind,
    state: &AppState,
    body: Result<Json<GenerateBody>, JsonRejection>,
) -> Result<Json<Artifact>, ApiError> {
    let Json(body) =
        body.map_err(|e| StudyError::usage(format!("invalid request body: {}", e.body_text())))?;
    let text = body.text.unwrap_or_default();
    let artifact =
        generate::generate_artifact(kind, &text, state.model.as_ref(), &state.config).await?;
    Ok(Json(artifact))
}

// ── Errors ───────────────────────────────────────────────────────────────

/// [`StudyError`] as an HTTP response.
#[derive(Debug)]
pub struct ApiError(pub StudyError);

impl From<StudyError> for ApiError {
    fn from(e: StudyError) -> Self {
        ApiError(e)
    }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self.0.category() {
            ErrorCategory::Usage => StatusCode::BAD_REQUEST,
            ErrorCategory::Extraction
            | ErrorCategory::Provider
            | ErrorCategory::MalformedArtifact
            | ErrorCategory::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!("Request failed: {}", self.0);
        } else {
            warn!("Rejected request: {}", self.0);
        }
        let body = Json(serde_json::json!({ "error": self.0.user_message() }));
        (status, body).into_response()
    }
}
