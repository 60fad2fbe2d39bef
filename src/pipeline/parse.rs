//! Parse and validate model output into typed artifacts.
//!
//! The model is an untrusted source. Its text goes through three gates, each
//! of which fails closed with [`StudyError::MalformedArtifact`]:
//!
//! 1. **Strict JSON** — the whole response must parse; no regex extraction,
//!    no repair of near-JSON.
//! 2. **Top-level shape** — the key for the kind (`questions`, `outline`,
//!    `mindMap`) must exist with the right container type.
//! 3. **Typed decode** — members must decode into the artifact structs. A
//!    non-string option or a node without a title stops here instead of
//!    travelling on into rendering.
//!
//! Field *values* are never normalised: an out-of-range `correctAnswer`, a
//! question with three options or an outline node at level 7 all pass through
//! exactly as received.
//!
//! ## Fence recovery
//!
//! Chat models sometimes wrap JSON in a ```` ```json ```` fence despite being
//! told not to. With `json_recovery` enabled, a response that fails gate 1
//! gets one more strict parse after the outer fence is stripped. Nothing else
//! is recovered.

use crate::artifact::{
    Artifact, ArtifactKind, MindMapArtifact, OutlineArtifact, QuizArtifact,
};
use crate::error::StudyError;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, warn};

static OUTER_FENCE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)^\s*```[A-Za-z]*[ \t]*\r?\n(.*?)\r?\n?[ \t]*```\s*$").unwrap()
});

/// Parse `raw` model output as an artifact of `kind`.
pub fn parse_artifact(
    kind: ArtifactKind,
    raw: &str,
    json_recovery: bool,
) -> Result<Artifact, StudyError> {
    let value = parse_json(kind, raw, json_recovery)?;
    check_top_level(kind, &value, raw)?;

    let artifact = match kind {
        ArtifactKind::Quiz => Artifact::Quiz(decode::<QuizArtifact>(kind, value, raw)?),
        ArtifactKind::Outline => Artifact::Outline(decode::<OutlineArtifact>(kind, value, raw)?),
        ArtifactKind::MindMap => Artifact::MindMap(decode::<MindMapArtifact>(kind, value, raw)?),
    };
    debug!("Parsed {} artifact from {} bytes", kind, raw.len());
    Ok(artifact)
}

/// Typed convenience wrapper for quizzes.
pub fn parse_quiz(raw: &str, json_recovery: bool) -> Result<QuizArtifact, StudyError> {
    match parse_artifact(ArtifactKind::Quiz, raw, json_recovery)? {
        Artifact::Quiz(q) => Ok(q),
        other => Err(StudyError::Internal(format!(
            "expected quiz, decoded {}",
            other.kind()
        ))),
    }
}

/// Typed convenience wrapper for outlines.
pub fn parse_outline(raw: &str, json_recovery: bool) -> Result<OutlineArtifact, StudyError> {
    match parse_artifact(ArtifactKind::Outline, raw, json_recovery)? {
        Artifact::Outline(o) => Ok(o),
        other => Err(StudyError::Internal(format!(
            "expected outline, decoded {}",
            other.kind()
        ))),
    }
}

/// Typed convenience wrapper for mind maps.
pub fn parse_mind_map(raw: &str, json_recovery: bool) -> Result<MindMapArtifact, StudyError> {
    match parse_artifact(ArtifactKind::MindMap, raw, json_recovery)? {
        Artifact::MindMap(m) => Ok(m),
        other => Err(StudyError::Internal(format!(
            "expected mindmap, decoded {}",
            other.kind()
        ))),
    }
}

/// The body of an outer Markdown code fence, if `raw` is fenced.
pub fn strip_outer_fence(raw: &str) -> Option<&str> {
    OUTER_FENCE
        .captures(raw)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str())
}

fn malformed(kind: ArtifactKind, detail: impl Into<String>, raw: &str) -> StudyError {
    let detail = detail.into();
    warn!("Malformed {} output: {}", kind, detail);
    StudyError::MalformedArtifact {
        kind,
        detail,
        raw: raw.to_string(),
    }
}

fn parse_json(kind: ArtifactKind, raw: &str, json_recovery: bool) -> Result<Value, StudyError> {
    match serde_json::from_str::<Value>(raw) {
        Ok(v) => Ok(v),
        Err(first) => {
            if json_recovery {
                if let Some(inner) = strip_outer_fence(raw) {
                    debug!("Retrying {} parse without outer code fence", kind);
                    return serde_json::from_str::<Value>(inner)
                        .map_err(|e| malformed(kind, format!("invalid JSON inside fence: {e}"), raw));
                }
            }
            Err(malformed(kind, format!("invalid JSON: {first}"), raw))
        }
    }
}

fn check_top_level(kind: ArtifactKind, value: &Value, raw: &str) -> Result<(), StudyError> {
    let key = kind.top_level_key();
    let obj = value
        .as_object()
        .ok_or_else(|| malformed(kind, "top-level value is not an object", raw))?;
    let member = obj
        .get(key)
        .ok_or_else(|| malformed(kind, format!("missing top-level key '{key}'"), raw))?;

    let shape_ok = match kind {
        ArtifactKind::Quiz | ArtifactKind::Outline => member.is_array(),
        ArtifactKind::MindMap => member.is_object(),
    };
    if !shape_ok {
        let expected = if kind == ArtifactKind::MindMap {
            "an object"
        } else {
            "an array"
        };
        return Err(malformed(kind, format!("'{key}' must be {expected}"), raw));
    }
    Ok(())
}

fn decode<T: DeserializeOwned>(kind: ArtifactKind, value: Value, raw: &str) -> Result<T, StudyError> {
    serde_json::from_value(value).map_err(|e| malformed(kind, format!("unexpected shape: {e}"), raw))
}

#[cfg(test)]
mod tests {
    use super::*;

    const QUIZ: &str = r#"{"questions":[{"question":"Q1","options":["a","b","c","d"],"correctAnswer":1,"explanation":"e"}]}"#;

    fn assert_malformed(result: Result<Artifact, StudyError>) -> String {
        match result {
            Err(StudyError::MalformedArtifact { detail, .. }) => detail,
            other => panic!("expected MalformedArtifact, got {other:?}"),
        }
    }

    #[test]
    fn quiz_question_count_matches_input() {
        let raw = format!(
            r#"{{"questions":[{q},{q},{q}]}}"#,
            q = r#"{"question":"Q","options":["a","b","c","d"],"correctAnswer":0,"explanation":"x"}"#
        );
        let quiz = parse_quiz(&raw, false).unwrap();
        assert_eq!(quiz.questions.len(), 3);
    }

    #[test]
    fn empty_question_list_is_accepted() {
        let quiz = parse_quiz(r#"{"questions":[]}"#, false).unwrap();
        assert!(quiz.questions.is_empty());
    }

    #[test]
    fn values_pass_through_unclamped() {
        let raw = r#"{"questions":[{"question":"Q","options":["a","b","c"],"correctAnswer":7,"explanation":""},
                                   {"question":"R","options":["a","b","c","d","e"],"correctAnswer":-2,"explanation":""}]}"#;
        let quiz = parse_quiz(raw, false).unwrap();
        assert_eq!(quiz.questions[0].correct_answer, 7);
        assert_eq!(quiz.questions[0].options.len(), 3);
        assert_eq!(quiz.questions[1].correct_answer, -2);
        assert_eq!(quiz.questions[1].options.len(), 5);
    }

    #[test]
    fn fields_are_copied_verbatim() {
        let quiz = parse_quiz(QUIZ, false).unwrap();
        let q = &quiz.questions[0];
        assert_eq!(q.question, "Q1");
        assert_eq!(q.options, vec!["a", "b", "c", "d"]);
        assert_eq!(q.correct_answer, 1);
        assert_eq!(q.explanation, "e");
    }

    #[test]
    fn non_json_is_malformed_for_every_kind() {
        for kind in ArtifactKind::ALL {
            let detail = assert_malformed(parse_artifact(kind, "Sure! Here is your quiz:", false));
            assert!(detail.contains("invalid JSON"), "{kind}: {detail}");
        }
    }

    #[test]
    fn malformed_error_carries_raw_text() {
        match parse_artifact(ArtifactKind::Outline, "oops", false) {
            Err(StudyError::MalformedArtifact { raw, kind, .. }) => {
                assert_eq!(raw, "oops");
                assert_eq!(kind, ArtifactKind::Outline);
            }
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn missing_top_level_key_is_malformed() {
        let detail = assert_malformed(parse_artifact(ArtifactKind::Outline, QUIZ, false));
        assert!(detail.contains("'outline'"), "{detail}");
    }

    #[test]
    fn wrong_container_type_is_malformed() {
        assert_malformed(parse_artifact(ArtifactKind::Quiz, r#"{"questions":{}}"#, false));
        assert_malformed(parse_artifact(ArtifactKind::MindMap, r#"{"mindMap":[]}"#, false));
        assert_malformed(parse_artifact(ArtifactKind::Outline, r#"[{"title":"x"}]"#, false));
    }

    #[test]
    fn wrong_member_shape_fails_closed() {
        let raw = r#"{"questions":[{"question":"Q","options":[1,2,3,4],"correctAnswer":0}]}"#;
        let detail = assert_malformed(parse_artifact(ArtifactKind::Quiz, raw, false));
        assert!(detail.contains("unexpected shape"), "{detail}");
    }

    #[test]
    fn outline_and_mind_map_decode() {
        let outline = parse_outline(
            r#"{"outline":[{"title":"A","level":1,"children":[{"title":"B","level":2}]}]}"#,
            false,
        )
        .unwrap();
        assert_eq!(outline.outline[0].children[0].title, "B");
        assert!(outline.outline[0].children[0].children.is_empty());

        let map = parse_mind_map(
            r#"{"mindMap":{"id":"root","label":"Root","children":[{"id":"b1","label":"B1"}]}}"#,
            false,
        )
        .unwrap();
        assert_eq!(map.mind_map.children[0].id, "b1");
    }

    #[test]
    fn outline_levels_outside_range_pass_through() {
        let outline = parse_outline(
            r#"{"outline":[{"title":"A","level":-1},{"title":"B","level":0},{"title":"C","level":7}]}"#,
            false,
        )
        .unwrap();
        let levels: Vec<i64> = outline.outline.iter().map(|n| n.level).collect();
        assert_eq!(levels, vec![-1, 0, 7]);
    }

    #[test]
    fn fenced_json_is_rejected_by_default() {
        let raw = format!("```json\n{QUIZ}\n```");
        assert_malformed(parse_artifact(ArtifactKind::Quiz, &raw, false));
    }

    #[test]
    fn fenced_json_is_recovered_when_enabled() {
        let raw = format!("```json\n{QUIZ}\n```\n");
        let quiz = parse_quiz(&raw, true).unwrap();
        assert_eq!(quiz.questions.len(), 1);
    }

    #[test]
    fn recovery_does_not_extract_from_prose() {
        let raw = format!("Here you go: {QUIZ}");
        assert_malformed(parse_artifact(ArtifactKind::Quiz, &raw, true));
    }

    #[test]
    fn strip_outer_fence_variants() {
        assert_eq!(strip_outer_fence("```\n{}\n```"), Some("{}"));
        assert_eq!(strip_outer_fence("  ```JSON\r\n[1]\r\n```  "), Some("[1]"));
        assert_eq!(strip_outer_fence("{}"), None);
    }
}
