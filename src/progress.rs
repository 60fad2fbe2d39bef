//! Progress-callback trait for generation events.
//!
//! Inject an [`Arc<dyn GenerationProgressCallback>`] via
//! [`crate::config::GenerationConfigBuilder::progress_callback`] to hear about
//! extraction and per-kind generation as it happens. The CLI drives its
//! spinners from these events; a server could forward them to a channel.
//!
//! # Example
//!
//! ```rust
//! use edgequake_pdf2study::{ArtifactKind, GenerationConfig, GenerationProgressCallback};
//! use std::sync::{Arc, atomic::{AtomicUsize, Ordering}};
//!
//! struct CountingCallback {
//!     done: AtomicUsize,
//! }
//!
//! impl GenerationProgressCallback for CountingCallback {
//!     fn on_generation_complete(&self, kind: ArtifactKind, elapsed_ms: u64) {
//!         self.done.fetch_add(1, Ordering::SeqCst);
//!         eprintln!("{kind} ready in {elapsed_ms}ms");
//!     }
//! }
//!
//! let config = GenerationConfig::builder()
//!     .progress_callback(Arc::new(CountingCallback { done: AtomicUsize::new(0) }))
//!     .build()
//!     .unwrap();
//! ```

use crate::artifact::ArtifactKind;
use std::sync::Arc;

/// Called by the pipeline as it extracts text and generates artifacts.
///
/// All methods have default no-op implementations. When several kinds are
/// generated together the per-kind methods may be called concurrently, so
/// implementations must synchronise any shared mutable state.
pub trait GenerationProgressCallback: Send + Sync {
    /// Called before text extraction starts.
    fn on_extraction_start(&self, byte_len: usize) {
        let _ = byte_len;
    }

    /// Called after text extraction succeeded.
    fn on_extraction_complete(&self, char_count: usize, page_count: usize) {
        let _ = (char_count, page_count);
    }

    /// Called just before the model request for `kind` is sent.
    fn on_generation_start(&self, kind: ArtifactKind) {
        let _ = kind;
    }

    /// Called when an artifact of `kind` parsed successfully.
    fn on_generation_complete(&self, kind: ArtifactKind, elapsed_ms: u64) {
        let _ = (kind, elapsed_ms);
    }

    /// Called when generating `kind` failed.
    fn on_generation_error(&self, kind: ArtifactKind, error: &str) {
        let _ = (kind, error);
    }
}

/// A no-op implementation for callers that don't need progress events.
pub struct NoopProgressCallback;

impl GenerationProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::config::GenerationConfig`].
pub type ProgressCallback = Arc<dyn GenerationProgressCallback>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[derive(Default)]
    struct Recorder {
        events: Mutex<Vec<String>>,
    }

    impl GenerationProgressCallback for Recorder {
        fn on_generation_start(&self, kind: ArtifactKind) {
            self.events.lock().unwrap().push(format!("start {kind}"));
        }

        fn on_generation_error(&self, kind: ArtifactKind, error: &str) {
            self.events.lock().unwrap().push(format!("error {kind}: {error}"));
        }
    }

    #[test]
    fn noop_callback_does_not_panic() {
        let cb = NoopProgressCallback;
        cb.on_extraction_start(1024);
        cb.on_extraction_complete(11, 1);
        cb.on_generation_start(ArtifactKind::Quiz);
        cb.on_generation_complete(ArtifactKind::Quiz, 5);
        cb.on_generation_error(ArtifactKind::Outline, "boom");
    }

    #[test]
    fn overridden_methods_receive_events() {
        let rec = Recorder::default();
        rec.on_generation_start(ArtifactKind::MindMap);
        rec.on_generation_complete(ArtifactKind::MindMap, 10);
        rec.on_generation_error(ArtifactKind::Quiz, "timeout");
        assert_eq!(
            *rec.events.lock().unwrap(),
            vec!["start mindmap".to_string(), "error quiz: timeout".to_string()]
        );
    }

    #[test]
    fn arc_dyn_callback_works() {
        let cb: ProgressCallback = Arc::new(NoopProgressCallback);
        cb.on_generation_start(ArtifactKind::Outline);
    }
}
