//! Instruction templates for the three artifact kinds.
//!
//! Every template names the JSON top-level key, spells out the exact shape
//! with an example, and bounds the structure (question count, tree depth,
//! label length). The parser in [`crate::pipeline::parse`] checks the same
//! top-level keys, so the two must change together.
//!
//! The placeholder [`SOURCE_PLACEHOLDER`] is replaced with the (already
//! truncated) source text by [`render`].

use crate::artifact::ArtifactKind;

/// Marker substituted with the source text.
pub const SOURCE_PLACEHOLDER: &str = "{source_text}";

/// Five multiple-choice questions, four options each.
pub const QUIZ_TEMPLATE: &str = r#"Based on the following text, write exactly 5 multiple-choice questions. Each question must have exactly 4 options and exactly one correct answer.

Requirements:
1. Questions must test understanding of the text
2. Options must be plausible and reasonably challenging
3. Give a short explanation for every answer
4. "correctAnswer" is the 0-based index (0 to 3) of the correct option
5. Return ONLY JSON in exactly this format, with no commentary and no code fences:

{
  "questions": [
    {
      "question": "Question text",
      "options": ["Option A", "Option B", "Option C", "Option D"],
      "correctAnswer": 0,
      "explanation": "Why this answer is correct"
    }
  ]
}

Text:
{source_text}"#;

/// Hierarchical outline, at most three levels.
pub const OUTLINE_TEMPLATE: &str = r#"Based on the following text, produce a structured document outline.

Requirements:
1. Extract the main topics and their subtopics
2. Build a hierarchy at most 3 levels deep ("level" is 1, 2 or 3)
3. Keep every title short and clear
4. Return ONLY JSON in exactly this format, with no commentary and no code fences:

{
  "outline": [
    {
      "title": "Topic title",
      "level": 1,
      "children": [
        {
          "title": "Subtopic title",
          "level": 2,
          "children": [
            {
              "title": "Detail",
              "level": 3
            }
          ]
        }
      ]
    }
  ]
}

Text:
{source_text}"#;

/// Single-rooted mind map, 2–5 branches, depth ≤ 2.
pub const MINDMAP_TEMPLATE: &str = r#"Based on the following text, produce a mind map.

Requirements:
1. Use the central theme of the text as the root node
2. Identify 2 to 5 main branches
3. Each branch may have child nodes (at most 2 levels below the root)
4. Keep node labels concise (no more than 15 characters)
5. Every node "id" must be unique within the map
6. Return ONLY JSON in exactly this format, with no commentary and no code fences:

{
  "mindMap": {
    "id": "root",
    "label": "Central theme",
    "children": [
      {
        "id": "branch1",
        "label": "Branch 1",
        "children": [
          {
            "id": "branch1-1",
            "label": "Leaf 1-1"
          }
        ]
      }
    ]
  }
}

Text:
{source_text}"#;

/// The template for `kind`.
pub fn template(kind: ArtifactKind) -> &'static str {
    match kind {
        ArtifactKind::Quiz => QUIZ_TEMPLATE,
        ArtifactKind::Outline => OUTLINE_TEMPLATE,
        ArtifactKind::MindMap => MINDMAP_TEMPLATE,
    }
}

/// Interpolate `source_text` into the template for `kind`.
///
/// Only the first placeholder is replaced, so source text that happens to
/// contain the marker is embedded verbatim.
pub fn render(kind: ArtifactKind, source_text: &str) -> String {
    template(kind).replacen(SOURCE_PLACEHOLDER, source_text, 1)
}
