//! Plain-text renderings and file exports.
//!
//! The exports keep the formats users already download from the study page:
//!
//! | File | Content |
//! |------|---------|
//! | `extracted-text.txt` | the extracted text, verbatim |
//! | `outline.txt` | one line per node, `"{indent}{bullet} {title}\n"` |
//!
//! The mind-map tree and quiz renderings are for terminals only.

use crate::artifact::{MindMapNode, OutlineArtifact};
use crate::error::StudyError;
use crate::session::{OptionMark, QuizView};
use std::fmt::Write as _;
use std::path::Path;

pub const EXTRACTED_TEXT_FILE: &str = "extracted-text.txt";
pub const OUTLINE_FILE: &str = "outline.txt";

/// The extracted text export. Identical to the input.
pub fn extracted_text_export(text: &str) -> String {
    text.to_string()
}

/// The outline export: two spaces per depth, `•` for top-level nodes and `◦`
/// below.
pub fn outline_export(outline: &OutlineArtifact) -> String {
    let mut out = String::new();
    outline.walk(|_, depth, node| {
        let bullet = if depth == 0 { '•' } else { '◦' };
        let _ = writeln!(out, "{}{} {}", "  ".repeat(depth), bullet, node.title);
    });
    out
}

/// Box-drawing tree of a mind map, root first.
///
/// ```text
/// Photosynthesis
/// ├── Inputs
/// │   ├── Light
/// │   └── CO2
/// └── Outputs
/// ```
pub fn mind_map_tree(root: &MindMapNode) -> String {
    let mut out = String::new();
    out.push_str(&root.label);
    out.push('\n');
    push_children(&mut out, &root.children, "");
    out
}

fn push_children(out: &mut String, children: &[MindMapNode], prefix: &str) {
    for (i, child) in children.iter().enumerate() {
        let last = i + 1 == children.len();
        let (connector, extension) = if last {
            ("└── ", "    ")
        } else {
            ("├── ", "│   ")
        };
        let _ = writeln!(out, "{prefix}{connector}{}", child.label);
        push_children(out, &child.children, &format!("{prefix}{extension}"));
    }
}

/// Text rendering of a quiz in its current state.
///
/// While answering, the selected option shows `(•)`. After submission each
/// option is tagged `✓` (correct) or `✗` (selected but wrong), explanations
/// are shown and the score closes the listing.
pub fn quiz_text(view: &QuizView) -> String {
    let mut out = String::new();
    for (qi, q) in view.artifact().questions.iter().enumerate() {
        let _ = writeln!(out, "{}. {}", qi + 1, q.question);
        for (oi, option) in q.options.iter().enumerate() {
            let marker = match view.mark(qi, oi) {
                OptionMark::Plain => "( )",
                OptionMark::Selected => "(•)",
                OptionMark::Correct => " ✓ ",
                OptionMark::Wrong => " ✗ ",
            };
            let _ = writeln!(out, "   {marker} {}. {option}", option_letter(oi));
        }
        if view.is_submitted() && !q.explanation.is_empty() {
            let _ = writeln!(out, "   Explanation: {}", q.explanation);
        }
        out.push('\n');
    }
    if let Some(score) = view.score() {
        let _ = writeln!(
            out,
            "Score: {}/{} ({}%)",
            score.correct,
            score.total,
            score.percent()
        );
    }
    out
}

/// `A`, `B`, … for option indices; falls back to the 1-based number past `Z`.
pub fn option_letter(index: usize) -> String {
    match u8::try_from(index) {
        Ok(i) if i < 26 => char::from(b'A' + i).to_string(),
        _ => (index + 1).to_string(),
    }
}

/// Write `content` to `path`.
///
/// Uses an atomic write (temp file + rename) so a failed export never leaves
/// a partial file behind. Parent directories are created as needed.
pub async fn write_export(path: impl AsRef<Path>, content: &str) -> Result<(), StudyError> {
    let path = path.as_ref();
    let io_err = |source| StudyError::OutputWriteFailed {
        path: path.to_path_buf(),
        source,
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await.map_err(io_err)?;
    }

    let mut tmp_name = path.as_os_str().to_owned();
    tmp_name.push(".tmp");
    let tmp_path = std::path::PathBuf::from(tmp_name);

    tokio::fs::write(&tmp_path, content).await.map_err(io_err)?;
    if let Err(e) = tokio::fs::rename(&tmp_path, path).await {
        let _ = tokio::fs::remove_file(&tmp_path).await;
        return Err(io_err(e));
    }
    Ok(())
}
