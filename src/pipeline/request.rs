//! Artifact requests: truncate the source text and render the prompt.
//!
//! An [`ArtifactRequest`] is built once per generation attempt and thrown
//! away afterwards. Construction is where empty input is refused, so a
//! request that exists is always safe to send to the model.

use crate::artifact::ArtifactKind;
use crate::error::StudyError;
use crate::prompts;

/// A validated, truncated request for one artifact kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactRequest {
    kind: ArtifactKind,
    source_text: String,
    truncated: bool,
}

impl ArtifactRequest {
    /// Build a request from raw extracted text.
    ///
    /// Keeps the first `max_chars` characters (a prefix cut on character
    /// boundaries). Empty or whitespace-only text is a usage error.
    pub fn new(kind: ArtifactKind, text: &str, max_chars: usize) -> Result<Self, StudyError> {
        if text.trim().is_empty() {
            return Err(StudyError::usage("no text available"));
        }
        let (source_text, truncated) = truncate_chars(text, max_chars);
        Ok(Self {
            kind,
            source_text: source_text.to_string(),
            truncated,
        })
    }

    pub fn kind(&self) -> ArtifactKind {
        self.kind
    }

    /// The text that will be embedded in the prompt.
    pub fn source_text(&self) -> &str {
        &self.source_text
    }

    /// Whether the original text was longer than the limit.
    pub fn was_truncated(&self) -> bool {
        self.truncated
    }

    /// Render the kind-specific instruction prompt.
    pub fn prompt(&self) -> String {
        prompts::render(self.kind, &self.source_text)
    }
}

/// Prefix of `text` holding at most `max_chars` characters.
pub fn truncate_chars(text: &str, max_chars: usize) -> (&str, bool) {
    match text.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => (&text[..byte_idx], true),
        None => (text, false),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn long_text_is_cut_to_exactly_the_limit() {
        let text: String = "abcdefghij".repeat(1000); // 10 000 chars
        let req = ArtifactRequest::new(ArtifactKind::Quiz, &text, 8000).unwrap();
        assert_eq!(req.source_text().chars().count(), 8000);
        assert_eq!(req.source_text(), &text[..8000]);
        assert!(req.was_truncated());

        let prompt = req.prompt();
        assert!(prompt.contains(&text[..8000]));
        assert!(!prompt.contains(&text[..8001]));
    }

    #[test]
    fn short_text_is_unchanged() {
        let req = ArtifactRequest::new(ArtifactKind::Outline, "Hello world", 8000).unwrap();
        assert_eq!(req.source_text(), "Hello world");
        assert!(!req.was_truncated());
        assert!(req.prompt().ends_with("Hello world"));
    }

    #[test]
    fn truncation_respects_char_boundaries() {
        let text = "é".repeat(10);
        let (cut, truncated) = truncate_chars(&text, 3);
        assert_eq!(cut, "ééé");
        assert!(truncated);
    }

    #[test]
    fn empty_text_is_a_usage_error_for_every_kind() {
        for kind in ArtifactKind::ALL {
            let err = ArtifactRequest::new(kind, "", 8000).unwrap_err();
            assert!(err.is_usage(), "{kind}: {err}");
            assert!(ArtifactRequest::new(kind, "  \n\t", 8000).is_err());
        }
    }

    #[test]
    fn prompt_is_deterministic() {
        let a = ArtifactRequest::new(ArtifactKind::MindMap, "text", 10).unwrap();
        let b = ArtifactRequest::new(ArtifactKind::MindMap, "text", 10).unwrap();
        assert_eq!(a.prompt(), b.prompt());
    }
}
