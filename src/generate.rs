//! Generation entry points: extract text, then turn it into artifacts.
//!
//! These functions wire the [`crate::pipeline`] stages together. They are
//! stateless: the caller owns whatever session or view state surrounds a
//! request (see [`crate::session`]). The HTTP handlers and the CLI both call
//! into this module.

use crate::artifact::{Artifact, ArtifactKind, ExtractedText};
use crate::config::GenerationConfig;
use crate::error::StudyError;
use crate::pipeline::extract::TextExtractor;
use crate::pipeline::llm::{LlmModelClient, ModelClient};
use crate::pipeline::parse;
use crate::pipeline::request::ArtifactRequest;
use edgequake_llm::{LLMProvider, ProviderFactory};
use futures::future::join_all;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Extract text from an uploaded PDF.
///
/// The upload cap from `config.max_upload_bytes` is checked here, before the
/// extractor sees the bytes.
pub async fn extract_text(
    bytes: &[u8],
    extractor: &dyn TextExtractor,
    config: &GenerationConfig,
) -> Result<ExtractedText, StudyError> {
    if bytes.len() > config.max_upload_bytes {
        return Err(StudyError::usage(format!(
            "file is too large ({} bytes, limit {} bytes)",
            bytes.len(),
            config.max_upload_bytes
        )));
    }

    if let Some(ref cb) = config.progress_callback {
        cb.on_extraction_start(bytes.len());
    }
    info!("Extracting text with {} ({} bytes)", extractor.name(), bytes.len());

    let extracted = extractor.extract(bytes).await?;

    if let Some(ref cb) = config.progress_callback {
        cb.on_extraction_complete(extracted.char_count(), extracted.page_count);
    }
    Ok(extracted)
}

/// Generate one artifact of `kind` from `text`.
///
/// # Errors
/// - [`StudyError::Usage`] when `text` is empty; the model is never called
/// - [`StudyError::Provider`] when the model call fails
/// - [`StudyError::MalformedArtifact`] when the response is not the JSON
///   shape asked for
pub async fn generate_artifact(
    kind: ArtifactKind,
    text: &str,
    model: &dyn ModelClient,
    config: &GenerationConfig,
) -> Result<Artifact, StudyError> {
    let request = ArtifactRequest::new(kind, text, config.max_source_chars)?;
    if request.was_truncated() {
        debug!(
            "Source text truncated to {} characters for {}",
            config.max_source_chars, kind
        );
    }

    let start = Instant::now();
    if let Some(ref cb) = config.progress_callback {
        cb.on_generation_start(kind);
    }

    let result = match model.complete(&request.prompt()).await {
        Ok(raw) => parse::parse_artifact(kind, &raw, config.json_recovery),
        Err(e) => Err(e),
    };

    let elapsed_ms = start.elapsed().as_millis() as u64;
    match &result {
        Ok(_) => {
            info!("Generated {} in {}ms", kind, elapsed_ms);
            if let Some(ref cb) = config.progress_callback {
                cb.on_generation_complete(kind, elapsed_ms);
            }
        }
        Err(e) => {
            warn!("Generating {} failed after {}ms: {}", kind, elapsed_ms, e);
            if let Some(ref cb) = config.progress_callback {
                cb.on_generation_error(kind, &e.to_string());
            }
        }
    }
    result
}

/// Generate every kind in `kinds` concurrently.
///
/// The kinds share no state, so one failing does not affect the others.
/// Results come back in the order of `kinds`.
pub async fn generate_many(
    kinds: &[ArtifactKind],
    text: &str,
    model: &dyn ModelClient,
    config: &GenerationConfig,
) -> Vec<(ArtifactKind, Result<Artifact, StudyError>)> {
    let futures = kinds.iter().map(|&kind| async move {
        (kind, generate_artifact(kind, text, model, config).await)
    });
    join_all(futures).await
}

/// Generate quiz, outline and mind map concurrently.
pub async fn generate_all(
    text: &str,
    model: &dyn ModelClient,
    config: &GenerationConfig,
) -> Vec<(ArtifactKind, Result<Artifact, StudyError>)> {
    generate_many(&ArtifactKind::ALL, text, model, config).await
}

/// Generate one artifact using the provider resolved from `config`.
///
/// Convenience wrapper around [`resolve_model_client`] +
/// [`generate_artifact`].
pub async fn generate(
    kind: ArtifactKind,
    text: &str,
    config: &GenerationConfig,
) -> Result<Artifact, StudyError> {
    // Refuse empty input before a provider is even resolved.
    ArtifactRequest::new(kind, text, config.max_source_chars)?;
    let client = resolve_model_client(config)?;
    generate_artifact(kind, text, &client, config).await
}

/// Build the production [`ModelClient`] for `config`.
pub fn resolve_model_client(config: &GenerationConfig) -> Result<LlmModelClient, StudyError> {
    let provider = resolve_provider(config)?;
    Ok(LlmModelClient::new(provider, config))
}

// ── Internal helpers ─────────────────────────────────────────────────────

fn create_provider(provider_name: &str, model: &str) -> Result<Arc<dyn LLMProvider>, StudyError> {
    ProviderFactory::create_llm_provider(provider_name, model).map_err(|e| {
        StudyError::ProviderNotConfigured {
            provider: provider_name.to_string(),
            hint: format!("{e}"),
        }
    })
}

/// Resolve the LLM provider, from most-specific to least-specific.
///
/// 1. **Pre-built provider** (`config.provider`) — used as-is.
/// 2. **Named provider + model** (`config.provider_name`) — the factory reads
///    the matching API key (`OPENAI_API_KEY`, …) from the environment.
/// 3. **Environment pair** (`EDGEQUAKE_LLM_PROVIDER` + `EDGEQUAKE_MODEL`).
/// 4. **OpenAI key present** — OpenAI with the configured or default model.
/// 5. **Full auto-detection** (`ProviderFactory::from_env`).
fn resolve_provider(config: &GenerationConfig) -> Result<Arc<dyn LLMProvider>, StudyError> {
    if let Some(ref provider) = config.provider {
        return Ok(Arc::clone(provider));
    }

    if let Some(ref name) = config.provider_name {
        return create_provider(name, config.model_or_default());
    }

    if let (Ok(prov), Ok(model)) = (
        std::env::var("EDGEQUAKE_LLM_PROVIDER"),
        std::env::var("EDGEQUAKE_MODEL"),
    ) {
        if !prov.is_empty() && !model.is_empty() {
            return create_provider(&prov, &model);
        }
    }

    if let Ok(openai_key) = std::env::var("OPENAI_API_KEY") {
        if !openai_key.is_empty() {
            return create_provider("openai", config.model_or_default());
        }
    }

    let (llm_provider, _embedding) =
        ProviderFactory::from_env().map_err(|e| StudyError::ProviderNotConfigured {
            provider: "auto".to_string(),
            hint: format!(
                "No LLM provider could be auto-detected from environment.\n\
                Set OPENAI_API_KEY, ANTHROPIC_API_KEY, or configure a provider.\n\
                Error: {}",
                e
            ),
        })?;

    Ok(llm_provider)
}
