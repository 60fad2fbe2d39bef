//! Error types for the edgequake-pdf2study library.
//!
//! Every failure in the pipeline is recoverable: the user re-invokes the
//! action and nothing in the session is left half-updated. [`StudyError`]
//! therefore carries enough detail for a diagnostic log line, while
//! [`StudyError::user_message`] gives the generic text shown to end users.
//!
//! The variants group into four categories ([`ErrorCategory`]) that decide
//! how the HTTP layer answers:
//!
//! | Category | Raised when | HTTP |
//! |----------|-------------|------|
//! | `Usage` | missing file, empty text, bad quiz interaction | 400 |
//! | `Extraction` | unreadable or non-PDF payload | 500 |
//! | `Provider` | network / auth / provider failure, provider not configured | 500 |
//! | `MalformedArtifact` | model returned non-JSON or the wrong top-level shape | 500 |

use crate::artifact::ArtifactKind;
use std::path::PathBuf;
use thiserror::Error;

/// All errors returned by the edgequake-pdf2study library.
#[derive(Debug, Error)]
pub enum StudyError {
    // ── Caller errors ─────────────────────────────────────────────────────
    /// The request was rejected before any I/O happened.
    #[error("{0}")]
    Usage(String),

    // ── Extraction errors ─────────────────────────────────────────────────
    /// The payload is empty, not a PDF, or could not be parsed.
    #[error("Text extraction failed: {detail}")]
    Extraction { detail: String },

    /// Could not bind to a pdfium library.
    #[error(
        "Failed to bind to pdfium library: {0}\n\n\
PDFium is normally downloaded automatically on first run.\n\
If the auto-download failed, you can:\n\
  • Check your internet connection and try again.\n\
  • Set PDFIUM_LIB_PATH=/path/to/libpdfium to use an existing copy.\n"
    )]
    PdfiumBindingFailed(String),

    // ── LLM errors ────────────────────────────────────────────────────────
    /// The configured provider is not initialised (missing API key etc.).
    #[error("LLM provider '{provider}' is not configured.\n{hint}")]
    ProviderNotConfigured { provider: String, hint: String },

    /// The model call failed (network, timeout, authentication, rejection).
    #[error("LLM provider error: {message}")]
    Provider { message: String },

    /// The model answered, but not with the JSON shape we asked for.
    ///
    /// `raw` keeps the untouched response for diagnostics.
    #[error("Malformed {kind} artifact: {detail}")]
    MalformedArtifact {
        kind: ArtifactKind,
        detail: String,
        raw: String,
    },

    // ── I/O errors ────────────────────────────────────────────────────────
    /// Could not create or write an export file.
    #[error("Failed to write output file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Coarse classification of a [`StudyError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Usage,
    Extraction,
    Provider,
    MalformedArtifact,
    Internal,
}

impl StudyError {
    /// Shorthand for [`StudyError::Usage`].
    pub fn usage(msg: impl Into<String>) -> Self {
        StudyError::Usage(msg.into())
    }

    /// Shorthand for [`StudyError::Extraction`].
    pub fn extraction(detail: impl Into<String>) -> Self {
        StudyError::Extraction {
            detail: detail.into(),
        }
    }

    /// Shorthand for [`StudyError::Provider`].
    pub fn provider(message: impl Into<String>) -> Self {
        StudyError::Provider {
            message: message.into(),
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            StudyError::Usage(_) => ErrorCategory::Usage,
            StudyError::Extraction { .. } | StudyError::PdfiumBindingFailed(_) => {
                ErrorCategory::Extraction
            }
            StudyError::ProviderNotConfigured { .. } | StudyError::Provider { .. } => {
                ErrorCategory::Provider
            }
            StudyError::MalformedArtifact { .. } => ErrorCategory::MalformedArtifact,
            StudyError::OutputWriteFailed { .. }
            | StudyError::InvalidConfig(_)
            | StudyError::Internal(_) => ErrorCategory::Internal,
        }
    }

    /// Whether the error was raised before any network or extraction work.
    pub fn is_usage(&self) -> bool {
        self.category() == ErrorCategory::Usage
    }

    /// Generic text suitable for an end-user notification.
    ///
    /// Usage errors are shown as-is (they tell the user what to fix); all
    /// other failures collapse to a retry hint and the detail goes to the log.
    pub fn user_message(&self) -> String {
        match self {
            StudyError::Usage(msg) => msg.clone(),
            StudyError::Extraction { .. } | StudyError::PdfiumBindingFailed(_) => {
                "Failed to extract text, please retry".to_string()
            }
            StudyError::MalformedArtifact { kind, .. } => {
                format!("Failed to generate {kind}, please retry")
            }
            StudyError::ProviderNotConfigured { .. } | StudyError::Provider { .. } => {
                "Operation failed, please retry".to_string()
            }
            StudyError::OutputWriteFailed { .. }
            | StudyError::InvalidConfig(_)
            | StudyError::Internal(_) => "Operation failed, please retry".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn usage_message_is_passed_through() {
        let e = StudyError::usage("no text available");
        assert_eq!(e.to_string(), "no text available");
        assert_eq!(e.user_message(), "no text available");
        assert!(e.is_usage());
    }

    #[test]
    fn malformed_artifact_keeps_raw_text() {
        let e = StudyError::MalformedArtifact {
            kind: ArtifactKind::Outline,
            detail: "expected value at line 1 column 1".into(),
            raw: "not json".into(),
        };
        assert!(e.to_string().contains("outline"), "got: {e}");
        assert_eq!(e.category(), ErrorCategory::MalformedArtifact);
        match e {
            StudyError::MalformedArtifact { raw, .. } => assert_eq!(raw, "not json"),
            _ => unreachable!(),
        }
    }

    #[test]
    fn provider_failures_hide_detail_from_users() {
        let e = StudyError::provider("401 invalid api key sk-xxx");
        assert_eq!(e.category(), ErrorCategory::Provider);
        assert!(!e.user_message().contains("sk-xxx"));
        assert!(e.to_string().contains("401"));
    }

    #[test]
    fn extraction_category() {
        assert_eq!(
            StudyError::extraction("bad xref").category(),
            ErrorCategory::Extraction
        );
        assert_eq!(
            StudyError::PdfiumBindingFailed("dlopen".into()).category(),
            ErrorCategory::Extraction
        );
    }
}
