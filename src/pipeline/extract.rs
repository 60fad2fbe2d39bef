//! Text extraction: PDF bytes in, plain text and page count out.
//!
//! Extraction sits behind the [`TextExtractor`] trait so the HTTP layer and
//! the CLI never depend on pdfium directly; tests swap in a canned extractor.
//!
//! ## Why spawn_blocking?
//!
//! `pdfium-render` wraps the pdfium C++ library, which is blocking and keeps
//! thread-local state. [`PdfiumExtractor`] therefore runs the whole
//! load-and-read cycle on Tokio's blocking pool.

use crate::artifact::ExtractedText;
use crate::error::StudyError;
use async_trait::async_trait;
use pdfium_render::prelude::*;
use tracing::{debug, info};

/// First bytes of every PDF file.
const PDF_MAGIC: &[u8] = b"%PDF";

/// Converts a binary document into plain text.
#[async_trait]
pub trait TextExtractor: Send + Sync {
    /// Extract text and page count from `bytes`.
    ///
    /// Fails with [`StudyError::Extraction`] when the payload is empty,
    /// unreadable or not a valid document. Never returns a partial result.
    async fn extract(&self, bytes: &[u8]) -> Result<ExtractedText, StudyError>;

    /// Human-readable name for logs.
    fn name(&self) -> &str;
}

/// pdfium-backed extractor.
///
/// The pdfium shared library is located (and downloaded on first use) by
/// `pdfium-auto`; set `PDFIUM_LIB_PATH` to use an existing copy.
#[derive(Debug, Clone, Default)]
pub struct PdfiumExtractor {
    password: Option<String>,
}

impl PdfiumExtractor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use `password` to open encrypted documents.
    pub fn with_password(password: impl Into<String>) -> Self {
        Self {
            password: Some(password.into()),
        }
    }
}

#[async_trait]
impl TextExtractor for PdfiumExtractor {
    async fn extract(&self, bytes: &[u8]) -> Result<ExtractedText, StudyError> {
        check_pdf_header(bytes)?;

        let owned = bytes.to_vec();
        let password = self.password.clone();
        let extracted = tokio::task::spawn_blocking(move || {
            extract_blocking(&owned, password.as_deref())
        })
        .await
        .map_err(|e| StudyError::Internal(format!("Extraction task panicked: {}", e)))??;

        info!(
            "Extracted {} characters from {} pages",
            extracted.char_count(),
            extracted.page_count
        );
        Ok(extracted)
    }

    fn name(&self) -> &str {
        "pdfium"
    }
}

/// Reject payloads that cannot possibly be a PDF before touching pdfium.
pub fn check_pdf_header(bytes: &[u8]) -> Result<(), StudyError> {
    if bytes.is_empty() {
        return Err(StudyError::extraction("payload is empty"));
    }
    if !bytes.starts_with(PDF_MAGIC) {
        let head: Vec<u8> = bytes.iter().take(4).copied().collect();
        return Err(StudyError::extraction(format!(
            "not a PDF (first bytes: {:?})",
            head
        )));
    }
    Ok(())
}

/// Blocking implementation of text extraction.
fn extract_blocking(bytes: &[u8], password: Option<&str>) -> Result<ExtractedText, StudyError> {
    let pdfium = pdfium_auto::bind_pdfium_silent()
        .map_err(|e| StudyError::PdfiumBindingFailed(e.to_string()))?;

    let document = pdfium
        .load_pdf_from_byte_slice(bytes, password)
        .map_err(|e| StudyError::extraction(format!("{:?}", e)))?;

    let pages = document.pages();
    let page_count = pages.len() as usize;

    let mut page_texts = Vec::with_capacity(page_count);
    for (idx, page) in pages.iter().enumerate() {
        let text = page
            .text()
            .map_err(|e| StudyError::extraction(format!("page {}: {:?}", idx + 1, e)))?;
        let content = text.all();
        debug!("Page {}: {} characters", idx + 1, content.chars().count());
        page_texts.push(content);
    }

    Ok(ExtractedText {
        text: page_texts.join("\n\n"),
        page_count,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_payload_is_an_extraction_error() {
        let err = check_pdf_header(b"").unwrap_err();
        assert!(matches!(err, StudyError::Extraction { .. }));
    }

    #[test]
    fn wrong_magic_is_rejected() {
        let err = check_pdf_header(b"PK\x03\x04 zip archive").unwrap_err();
        assert!(err.to_string().contains("not a PDF"), "got: {err}");
    }

    #[test]
    fn pdf_magic_passes_header_check() {
        assert!(check_pdf_header(b"%PDF-1.7\n...").is_ok());
    }

    #[tokio::test]
    async fn pdfium_extractor_rejects_garbage_without_binding() {
        let err = PdfiumExtractor::new().extract(b"hello").await.unwrap_err();
        assert!(matches!(err, StudyError::Extraction { .. }));
    }
}
