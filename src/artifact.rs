//! Data model: documents, extracted text and the three study artifacts.
//!
//! The artifact structs double as the JSON contract with the model, so the
//! serde names follow the wire format (`correctAnswer`, `mindMap`) rather than
//! Rust conventions. Values are decoded as received: an out-of-range
//! `correctAnswer` or a question with three options is a valid
//! [`Question`]; the views decide how to present it.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// One of the three derivative artifacts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArtifactKind {
    Quiz,
    Outline,
    #[serde(alias = "mind-map", alias = "mind_map")]
    MindMap,
}

impl ArtifactKind {
    pub const ALL: [ArtifactKind; 3] = [ArtifactKind::Quiz, ArtifactKind::Outline, ArtifactKind::MindMap];

    pub fn as_str(self) -> &'static str {
        match self {
            ArtifactKind::Quiz => "quiz",
            ArtifactKind::Outline => "outline",
            ArtifactKind::MindMap => "mindmap",
        }
    }

    /// The JSON key the model must place the artifact under.
    pub fn top_level_key(self) -> &'static str {
        match self {
            ArtifactKind::Quiz => "questions",
            ArtifactKind::Outline => "outline",
            ArtifactKind::MindMap => "mindMap",
        }
    }
}

impl fmt::Display for ArtifactKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ArtifactKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "quiz" => Ok(ArtifactKind::Quiz),
            "outline" => Ok(ArtifactKind::Outline),
            "mindmap" | "mind-map" | "mind_map" => Ok(ArtifactKind::MindMap),
            other => Err(format!(
                "unknown artifact kind '{other}' (expected quiz, outline or mindmap)"
            )),
        }
    }
}

/// An uploaded file. Immutable once created.
#[derive(Debug, Clone)]
pub struct Document {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

impl Document {
    pub fn new(file_name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            file_name: file_name.into(),
            bytes,
        }
    }
}

/// Plain text extracted from a [`Document`].
///
/// `text` may be empty (scanned PDFs carry no text layer) but is always
/// present once extraction has succeeded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractedText {
    pub text: String,
    #[serde(rename = "pages")]
    pub page_count: usize,
}

impl ExtractedText {
    /// Number of characters (Unicode scalar values) in the text.
    pub fn char_count(&self) -> usize {
        self.text.chars().count()
    }
}

// ── Quiz ─────────────────────────────────────────────────────────────────

/// A multiple-choice question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Question {
    pub question: String,
    pub options: Vec<String>,
    /// Index into `options`. Signed so that whatever the model sends survives.
    pub correct_answer: i64,
    #[serde(default)]
    pub explanation: String,
}

impl Question {
    /// The correct option index, if it actually points at an option.
    pub fn correct_option(&self) -> Option<usize> {
        usize::try_from(self.correct_answer)
            .ok()
            .filter(|&i| i < self.options.len())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuizArtifact {
    pub questions: Vec<Question>,
}

// ── Outline ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutlineNode {
    pub title: String,
    pub level: i64,
    #[serde(default)]
    pub children: Vec<OutlineNode>,
}

impl OutlineNode {
    pub fn has_children(&self) -> bool {
        !self.children.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutlineArtifact {
    pub outline: Vec<OutlineNode>,
}

impl OutlineArtifact {
    /// Visit every node depth-first with its path key and depth.
    ///
    /// Keys are the "-"-joined local indices from the root: `"0"`, `"0-1"`, …
    pub fn walk(&self, mut visit: impl FnMut(&str, usize, &OutlineNode)) {
        fn go(
            nodes: &[OutlineNode],
            prefix: &str,
            depth: usize,
            visit: &mut dyn FnMut(&str, usize, &OutlineNode),
        ) {
            for (i, node) in nodes.iter().enumerate() {
                let key = format!("{prefix}{i}");
                visit(&key, depth, node);
                go(&node.children, &format!("{key}-"), depth + 1, visit);
            }
        }
        go(&self.outline, "", 0, &mut visit);
    }

    /// Look a node up by its path key.
    ///
    /// Only the canonical key produced by [`OutlineArtifact::walk`] matches;
    /// spellings such as `"00"` or `"+0"` find nothing.
    pub fn node(&self, key: &str) -> Option<&OutlineNode> {
        let mut nodes = &self.outline;
        let mut found = None;
        for part in key.split('-') {
            let idx: usize = part.parse().ok()?;
            if idx.to_string() != part {
                return None;
            }
            let node = nodes.get(idx)?;
            nodes = &node.children;
            found = Some(node);
        }
        found
    }
}

// ── Mind map ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MindMapNode {
    pub id: String,
    pub label: String,
    #[serde(default)]
    pub children: Vec<MindMapNode>,
}

impl MindMapNode {
    /// Total number of nodes in this subtree, including `self`.
    pub fn node_count(&self) -> usize {
        1 + self.children.iter().map(MindMapNode::node_count).sum::<usize>()
    }

    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    /// Depth of the subtree; a lone node has depth 0.
    pub fn depth(&self) -> usize {
        self.children
            .iter()
            .map(|c| c.depth() + 1)
            .max()
            .unwrap_or(0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MindMapArtifact {
    pub mind_map: MindMapNode,
}

// ── Any artifact ─────────────────────────────────────────────────────────

/// A generated artifact of any kind.
///
/// Serialises untagged, so each variant produces exactly the JSON body the
/// HTTP API returns (`{"questions": …}`, `{"outline": …}`, `{"mindMap": …}`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Artifact {
    Quiz(QuizArtifact),
    Outline(OutlineArtifact),
    MindMap(MindMapArtifact),
}

impl Artifact {
    pub fn kind(&self) -> ArtifactKind {
        match self {
            Artifact::Quiz(_) => ArtifactKind::Quiz,
            Artifact::Outline(_) => ArtifactKind::Outline,
            Artifact::MindMap(_) => ArtifactKind::MindMap,
        }
    }
}
