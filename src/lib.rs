//! # edgequake-pdf2study
//!
//! Turn a PDF into study material: a multiple-choice quiz, a hierarchical
//! outline and a mind map, each generated by an LLM as strict JSON.
//!
//! ## Pipeline Overview
//!
//! ```text
//! PDF bytes
//!  │
//!  ├─ 1. Extract  plain text + page count via pdfium (spawn_blocking)
//!  ├─ 2. Request  cut text to 8000 chars, fill the kind's prompt template
//!  ├─ 3. Model    one completion call through edgequake-llm
//!  ├─ 4. Parse    strict JSON → typed artifact (fail closed)
//!  └─ 5. Session  per-kind state + quiz / outline / mind-map views
//! ```
//!
//! Each artifact kind is generated on demand and independently of the
//! others; regenerating one replaces only that kind.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use edgequake_pdf2study::{generate, ArtifactKind, GenerationConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Provider auto-detected from OPENAI_API_KEY / ANTHROPIC_API_KEY / …
//!     let config = GenerationConfig::default();
//!     let quiz = generate(ArtifactKind::Quiz, "Photosynthesis converts light…", &config).await?;
//!     println!("{}", serde_json::to_string_pretty(&quiz)?);
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `server` | on | axum HTTP surface ([`server`]) |
//! | `cli`    | on | The `pdf2study` binary (clap + anyhow + tracing-subscriber) |
//! | `bundled` | off | Embed the pdfium library at compile time |
//!
//! Library-only use:
//! ```toml
//! edgequake-pdf2study = { version = "0.1", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod artifact;
pub mod config;
pub mod error;
pub mod generate;
pub mod pipeline;
pub mod progress;
pub mod prompts;
pub mod render;
pub mod session;
#[cfg(feature = "server")]
pub mod server;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use artifact::{
    Artifact, ArtifactKind, Document, ExtractedText, MindMapArtifact, MindMapNode,
    OutlineArtifact, OutlineNode, Question, QuizArtifact,
};
pub use config::{GenerationConfig, GenerationConfigBuilder, ServerConfig};
pub use error::{ErrorCategory, StudyError};
pub use generate::{
    extract_text, generate, generate_all, generate_artifact, generate_many, resolve_model_client,
};
pub use pipeline::extract::{PdfiumExtractor, TextExtractor};
pub use pipeline::llm::{LlmModelClient, ModelClient};
pub use progress::{GenerationProgressCallback, NoopProgressCallback, ProgressCallback};
pub use session::{
    Applied, GenerationTicket, MindMapView, OptionMark, OutlineRow, OutlineView, Phase, QuizScore,
    QuizView, Session,
};
