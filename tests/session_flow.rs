//! Session-level integration tests: upload → extract → generate → interact.
//!
//! Extraction and model calls are canned, so these run without pdfium or an
//! API key.

use async_trait::async_trait;
use edgequake_pdf2study::render;
use edgequake_pdf2study::{
    generate_all, generate_artifact, Applied, ArtifactKind, Document, ExtractedText,
    GenerationConfig, ModelClient, OptionMark, Phase, Session, StudyError, TextExtractor,
};
use std::collections::VecDeque;
use std::sync::Mutex;

// ── Test doubles ─────────────────────────────────────────────────────────────

struct FixedText(&'static str);

#[async_trait]
impl TextExtractor for FixedText {
    async fn extract(&self, _bytes: &[u8]) -> Result<ExtractedText, StudyError> {
        Ok(ExtractedText {
            text: self.0.to_string(),
            page_count: 1,
        })
    }

    fn name(&self) -> &str {
        "fixed"
    }
}

/// Hands out scripted responses in order and records every prompt.
#[derive(Default)]
struct Script {
    responses: Mutex<VecDeque<Result<String, String>>>,
    prompts: Mutex<Vec<String>>,
}

impl Script {
    fn new(responses: &[Result<&str, &str>]) -> Self {
        Self {
            responses: Mutex::new(
                responses
                    .iter()
                    .map(|r| r.map(str::to_string).map_err(str::to_string))
                    .collect(),
            ),
            prompts: Mutex::default(),
        }
    }

    fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl ModelClient for Script {
    async fn complete(&self, prompt: &str) -> Result<String, StudyError> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        match self.responses.lock().unwrap().pop_front() {
            Some(Ok(body)) => Ok(body),
            Some(Err(message)) => Err(StudyError::provider(message)),
            None => Err(StudyError::provider("script exhausted")),
        }
    }
}

const ONE_QUESTION: &str = r#"{"questions":[{"question":"What does the text greet?","options":["The moon","The world","The sun","The sea"],"correctAnswer":1,"explanation":"It says hello world."}]}"#;

async fn session_with(text: &'static str) -> Session {
    let mut session = Session::new();
    session.load_document(Document::new("hello.pdf", b"%PDF-1.7".to_vec()));
    session
        .extract(&FixedText(text), &GenerationConfig::default())
        .await
        .unwrap();
    session
}

// ── Tests ────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn hello_world_quiz_scores_one_of_one() {
    let config = GenerationConfig::default();
    let mut session = session_with("Hello world").await;
    assert_eq!(session.text(), Some("Hello world"));

    let model = Script::new(&[Ok(ONE_QUESTION)]);
    let applied = session
        .generate(ArtifactKind::Quiz, &model, &config)
        .await
        .unwrap();
    assert_eq!(applied, Applied::Ready);
    assert!(model.prompts()[0].contains("Hello world"));

    let quiz = session.quiz_mut().unwrap();
    quiz.select(0, 1).unwrap();
    let score = quiz.submit().unwrap();
    assert_eq!((score.correct, score.total), (1, 1));
    assert_eq!(score.percent(), 100);
    assert_eq!(quiz.mark(0, 1), OptionMark::Correct);

    // Outline and mind map were never requested.
    assert_eq!(session.phase(ArtifactKind::Outline), Phase::Empty);
    assert_eq!(session.phase(ArtifactKind::MindMap), Phase::Empty);
}

#[tokio::test]
async fn long_text_is_cut_before_prompting() {
    let long: &'static str = Box::leak("é".repeat(9000).into_boxed_str());
    let mut session = session_with(long).await;
    let model = Script::new(&[Ok(r#"{"outline":[]}"#)]);
    session
        .generate(ArtifactKind::Outline, &model, &GenerationConfig::default())
        .await
        .unwrap();
    let prompt = &model.prompts()[0];
    assert!(prompt.contains(&"é".repeat(8000)));
    assert!(!prompt.contains(&"é".repeat(8001)));
}

#[tokio::test]
async fn empty_document_text_blocks_generation() {
    let mut session = session_with("").await;
    let model = Script::new(&[]);
    let err = session
        .generate(ArtifactKind::MindMap, &model, &GenerationConfig::default())
        .await
        .unwrap_err();
    assert!(err.is_usage());
    assert!(model.prompts().is_empty());
    assert_eq!(session.phase(ArtifactKind::MindMap), Phase::Empty);
}

#[tokio::test]
async fn malformed_regeneration_keeps_the_previous_outline() {
    let config = GenerationConfig::default();
    let mut session = session_with("Chapter one. Chapter two.").await;
    let model = Script::new(&[
        Ok(r#"{"outline":[{"title":"One","level":1,"children":[{"title":"Detail","level":2}]}]}"#),
        Ok("not json at all"),
    ]);

    session
        .generate(ArtifactKind::Outline, &model, &config)
        .await
        .unwrap();
    session.outline_mut().unwrap().toggle("0");

    let err = session
        .generate(ArtifactKind::Outline, &model, &config)
        .await
        .unwrap_err();
    assert!(matches!(err, StudyError::MalformedArtifact { .. }));
    assert_eq!(session.phase(ArtifactKind::Outline), Phase::Ready);

    let view = session.outline().unwrap();
    assert_eq!(view.artifact().outline[0].title, "One");
    assert!(!view.is_expanded("0"));
    assert_eq!(
        render::outline_export(view.artifact()),
        "• One\n  ◦ Detail\n"
    );
}

#[tokio::test]
async fn late_result_of_a_superseded_request_is_dropped() {
    let config = GenerationConfig::default();
    let mut session = session_with("Hello world").await;
    let model = Script::new(&[
        Ok(r#"{"mindMap":{"id":"root","label":"Old"}}"#),
        Ok(r#"{"mindMap":{"id":"root","label":"New"}}"#),
    ]);

    let first = session.begin(ArtifactKind::MindMap).unwrap();
    let second = session.begin(ArtifactKind::MindMap).unwrap();

    // Both requests run; the newer one finishes first.
    let old = generate_artifact(first.kind(), first.source_text(), &model, &config).await;
    let new = generate_artifact(second.kind(), second.source_text(), &model, &config).await;

    assert_eq!(session.complete(&second, new).unwrap(), Applied::Ready);
    assert_eq!(session.complete(&first, old).unwrap(), Applied::Stale);
    assert_eq!(session.mind_map().unwrap().artifact().mind_map.label, "New");
}

#[tokio::test]
async fn all_kinds_generate_independently() {
    let config = GenerationConfig::default();
    let mut session = session_with("Hello world").await;
    let text = session.text().unwrap().to_string();

    // The three calls run concurrently, so answer by prompt content rather
    // than by order.
    struct ByKind;
    #[async_trait]
    impl ModelClient for ByKind {
        async fn complete(&self, prompt: &str) -> Result<String, StudyError> {
            if prompt.contains("\"questions\"") {
                Ok(ONE_QUESTION.to_string())
            } else if prompt.contains("\"outline\"") {
                Err(StudyError::provider("503"))
            } else {
                Ok(r#"{"mindMap":{"id":"root","label":"Hello"}}"#.to_string())
            }
        }
    }

    let tickets: Vec<_> = ArtifactKind::ALL
        .iter()
        .map(|&k| session.begin(k).unwrap())
        .collect();
    let results = generate_all(&text, &ByKind, &config).await;

    for (ticket, (kind, result)) in tickets.iter().zip(results) {
        assert_eq!(ticket.kind(), kind);
        let _ = session.complete(ticket, result);
    }

    assert_eq!(session.phase(ArtifactKind::Quiz), Phase::Ready);
    assert_eq!(session.phase(ArtifactKind::Outline), Phase::Empty);
    assert_eq!(session.phase(ArtifactKind::MindMap), Phase::Ready);
    assert_eq!(session.quiz().unwrap().question_count(), 1);
}

#[tokio::test]
async fn new_document_discards_everything() {
    let config = GenerationConfig::default();
    let mut session = session_with("Hello world").await;
    let model = Script::new(&[Ok(ONE_QUESTION)]);
    session
        .generate(ArtifactKind::Quiz, &model, &config)
        .await
        .unwrap();

    session.load_document(Document::new("other.pdf", b"%PDF-1.4".to_vec()));
    assert!(session.text().is_none());
    assert!(session.quiz().is_none());
    for kind in ArtifactKind::ALL {
        assert_eq!(session.phase(kind), Phase::Empty);
    }
    assert_eq!(session.document().unwrap().file_name, "other.pdf");
}
