//! Session state: one document, its text, and one artifact per kind.
//!
//! [`Session`] is an explicit state container. Every change goes through a
//! transition method, so the rules can be tested without any UI:
//!
//! ```text
//!            begin()              complete(Ok)
//!   Empty ───────────▶ Generating ────────────▶ Ready
//!     ▲                    │                      │
//!     └── complete(Err) ───┘      begin() ◀───────┘
//!         (Ready again if a prior artifact exists)
//! ```
//!
//! ## Stale responses
//!
//! Each [`Session::begin`] issues a request token that is strictly greater
//! than every token issued before it. [`Session::complete`] only applies a
//! result whose token is still the latest for its kind; anything older
//! (superseded by a regeneration, or started before a reset) is discarded.
//! Kinds are independent: generating a quiz never touches the outline.

pub mod mindmap;
pub mod outline;
pub mod quiz;

pub use mindmap::MindMapView;
pub use outline::{OutlineRow, OutlineView};
pub use quiz::{OptionMark, QuizScore, QuizView};

use crate::artifact::{Artifact, ArtifactKind, Document, ExtractedText};
use crate::config::GenerationConfig;
use crate::error::StudyError;
use crate::generate;
use crate::pipeline::extract::TextExtractor;
use crate::pipeline::llm::ModelClient;
use tracing::{debug, warn};

/// Lifecycle phase of one artifact kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Empty,
    Generating,
    Ready,
}

/// Proof that a generation was started; hand it back to [`Session::complete`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationTicket {
    kind: ArtifactKind,
    token: u64,
    source_text: String,
}

impl GenerationTicket {
    pub fn kind(&self) -> ArtifactKind {
        self.kind
    }

    pub fn token(&self) -> u64 {
        self.token
    }

    /// The text the generation should run on (snapshot taken at `begin`).
    pub fn source_text(&self) -> &str {
        &self.source_text
    }
}

/// What [`Session::complete`] did with a successful result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Applied {
    /// The artifact replaced the previous one; the view was reset.
    Ready,
    /// A newer request for the same kind exists; the result was dropped.
    Stale,
}

#[derive(Debug, Clone)]
struct Slot<V> {
    phase: Phase,
    latest: u64,
    view: Option<V>,
}

impl<V> Default for Slot<V> {
    fn default() -> Self {
        Self {
            phase: Phase::Empty,
            latest: 0,
            view: None,
        }
    }
}

impl<V> Slot<V> {
    fn begin(&mut self, token: u64) {
        self.latest = token;
        self.phase = Phase::Generating;
    }

    fn is_current(&self, token: u64) -> bool {
        self.phase == Phase::Generating && self.latest == token
    }

    fn succeed(&mut self, view: V) {
        self.view = Some(view);
        self.phase = Phase::Ready;
    }

    fn fail(&mut self) {
        self.phase = if self.view.is_some() {
            Phase::Ready
        } else {
            Phase::Empty
        };
    }
}

/// In-memory state for one active document.
#[derive(Debug, Clone, Default)]
pub struct Session {
    document: Option<Document>,
    extracted: Option<ExtractedText>,
    next_token: u64,
    quiz: Slot<QuizView>,
    outline: Slot<OutlineView>,
    mind_map: Slot<MindMapView>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    // ── Document & text ──────────────────────────────────────────────────

    /// Start over with `document`. Everything derived from a previous
    /// document is dropped.
    pub fn load_document(&mut self, document: Document) {
        self.reset();
        debug!("Loaded document '{}' ({} bytes)", document.file_name, document.bytes.len());
        self.document = Some(document);
    }

    pub fn document(&self) -> Option<&Document> {
        self.document.as_ref()
    }

    /// Record the extraction result for the loaded document.
    pub fn set_extracted(&mut self, extracted: ExtractedText) -> Result<(), StudyError> {
        if self.document.is_none() {
            return Err(StudyError::usage("no document loaded"));
        }
        self.extracted = Some(extracted);
        Ok(())
    }

    /// Run `extractor` over the loaded document and record the text.
    ///
    /// On failure the session is unchanged.
    pub async fn extract(
        &mut self,
        extractor: &dyn TextExtractor,
        config: &GenerationConfig,
    ) -> Result<&ExtractedText, StudyError> {
        let document = self
            .document
            .as_ref()
            .ok_or_else(|| StudyError::usage("no document loaded"))?;
        let extracted = generate::extract_text(&document.bytes, extractor, config).await?;
        Ok(self.extracted.insert(extracted))
    }

    pub fn extracted(&self) -> Option<&ExtractedText> {
        self.extracted.as_ref()
    }

    /// The extracted text, if extraction has run.
    pub fn text(&self) -> Option<&str> {
        self.extracted.as_ref().map(|e| e.text.as_str())
    }

    /// Drop the document, its text and every artifact.
    ///
    /// Tokens keep counting, so results of requests started before the reset
    /// are recognised as stale.
    pub fn reset(&mut self) {
        self.document = None;
        self.extracted = None;
        self.quiz = Slot::default();
        self.outline = Slot::default();
        self.mind_map = Slot::default();
    }

    // ── Generation transitions ───────────────────────────────────────────

    pub fn phase(&self, kind: ArtifactKind) -> Phase {
        match kind {
            ArtifactKind::Quiz => self.quiz.phase,
            ArtifactKind::Outline => self.outline.phase,
            ArtifactKind::MindMap => self.mind_map.phase,
        }
    }

    /// Move `kind` to `Generating` and issue a ticket.
    ///
    /// Fails with a usage error, leaving the state unchanged, when there is
    /// no non-empty text to generate from. Calling `begin` while a request is
    /// already in flight supersedes it.
    pub fn begin(&mut self, kind: ArtifactKind) -> Result<GenerationTicket, StudyError> {
        let text = match self.text() {
            Some(t) if !t.trim().is_empty() => t.to_string(),
            _ => return Err(StudyError::usage("no text available")),
        };
        self.next_token += 1;
        let token = self.next_token;
        match kind {
            ArtifactKind::Quiz => self.quiz.begin(token),
            ArtifactKind::Outline => self.outline.begin(token),
            ArtifactKind::MindMap => self.mind_map.begin(token),
        }
        debug!("Started {} generation #{}", kind, token);
        Ok(GenerationTicket {
            kind,
            token,
            source_text: text,
        })
    }

    /// Apply the outcome of the request identified by `ticket`.
    ///
    /// * stale ticket → `Ok(Applied::Stale)`, nothing changes
    /// * success → `Ok(Applied::Ready)`, fresh view for the new artifact
    /// * failure → the error is returned; the kind goes back to `Ready` with
    ///   its previous artifact untouched, or to `Empty` if it had none
    pub fn complete(
        &mut self,
        ticket: &GenerationTicket,
        result: Result<Artifact, StudyError>,
    ) -> Result<Applied, StudyError> {
        if !self.is_current(ticket) {
            warn!(
                "Discarding stale {} result #{}",
                ticket.kind, ticket.token
            );
            return Ok(Applied::Stale);
        }

        let artifact = match result {
            Ok(a) => a,
            Err(e) => {
                self.fail(ticket.kind);
                return Err(e);
            }
        };

        match (ticket.kind, artifact) {
            (ArtifactKind::Quiz, Artifact::Quiz(q)) => self.quiz.succeed(QuizView::new(q)),
            (ArtifactKind::Outline, Artifact::Outline(o)) => {
                self.outline.succeed(OutlineView::new(o))
            }
            (ArtifactKind::MindMap, Artifact::MindMap(m)) => {
                self.mind_map.succeed(MindMapView::new(m))
            }
            (kind, other) => {
                self.fail(kind);
                return Err(StudyError::Internal(format!(
                    "{} ticket completed with a {} artifact",
                    kind,
                    other.kind()
                )));
            }
        }
        Ok(Applied::Ready)
    }

    /// `begin` + model call + `complete`, for callers that drive one kind at
    /// a time.
    pub async fn generate(
        &mut self,
        kind: ArtifactKind,
        model: &dyn ModelClient,
        config: &GenerationConfig,
    ) -> Result<Applied, StudyError> {
        let ticket = self.begin(kind)?;
        let result = generate::generate_artifact(kind, ticket.source_text(), model, config).await;
        self.complete(&ticket, result)
    }

    fn is_current(&self, ticket: &GenerationTicket) -> bool {
        match ticket.kind {
            ArtifactKind::Quiz => self.quiz.is_current(ticket.token),
            ArtifactKind::Outline => self.outline.is_current(ticket.token),
            ArtifactKind::MindMap => self.mind_map.is_current(ticket.token),
        }
    }

    fn fail(&mut self, kind: ArtifactKind) {
        match kind {
            ArtifactKind::Quiz => self.quiz.fail(),
            ArtifactKind::Outline => self.outline.fail(),
            ArtifactKind::MindMap => self.mind_map.fail(),
        }
    }

    // ── Views ────────────────────────────────────────────────────────────

    pub fn quiz(&self) -> Option<&QuizView> {
        self.quiz.view.as_ref()
    }

    pub fn quiz_mut(&mut self) -> Option<&mut QuizView> {
        self.quiz.view.as_mut()
    }

    pub fn outline(&self) -> Option<&OutlineView> {
        self.outline.view.as_ref()
    }

    pub fn outline_mut(&mut self) -> Option<&mut OutlineView> {
        self.outline.view.as_mut()
    }

    pub fn mind_map(&self) -> Option<&MindMapView> {
        self.mind_map.view.as_ref()
    }

    pub fn mind_map_mut(&mut self) -> Option<&mut MindMapView> {
        self.mind_map.view.as_mut()
    }

    /// A copy of the current artifact of `kind`, if any.
    pub fn artifact(&self, kind: ArtifactKind) -> Option<Artifact> {
        match kind {
            ArtifactKind::Quiz => self.quiz().map(|v| Artifact::Quiz(v.artifact().clone())),
            ArtifactKind::Outline => self
                .outline()
                .map(|v| Artifact::Outline(v.artifact().clone())),
            ArtifactKind::MindMap => self
                .mind_map()
                .map(|v| Artifact::MindMap(v.artifact().clone())),
        }
    }
}
