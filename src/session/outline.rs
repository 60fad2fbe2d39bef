//! Collapsible outline tree.

use crate::artifact::OutlineArtifact;
use std::collections::HashSet;

/// One visible line of the outline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutlineRow {
    pub key: String,
    pub depth: usize,
    pub title: String,
    pub level: i64,
    pub has_children: bool,
    pub expanded: bool,
}

/// An outline plus per-node expanded/collapsed flags.
///
/// Nodes are addressed by path keys (`"0"`, `"0-1"`, `"0-1-2"`). Every node
/// starts expanded.
#[derive(Debug, Clone, PartialEq)]
pub struct OutlineView {
    outline: OutlineArtifact,
    expanded: HashSet<String>,
}

impl OutlineView {
    pub fn new(outline: OutlineArtifact) -> Self {
        let mut view = Self {
            outline,
            expanded: HashSet::new(),
        };
        view.expand_all();
        view
    }

    pub fn artifact(&self) -> &OutlineArtifact {
        &self.outline
    }

    pub fn is_expanded(&self, key: &str) -> bool {
        self.expanded.contains(key)
    }

    /// Flip the expanded flag of the branch at `key`.
    ///
    /// Leaves and unknown keys are left alone. Returns whether anything
    /// changed. Descendants keep their own flags.
    pub fn toggle(&mut self, key: &str) -> bool {
        match self.outline.node(key) {
            Some(node) if node.has_children() => {
                if !self.expanded.remove(key) {
                    self.expanded.insert(key.to_string());
                }
                true
            }
            _ => false,
        }
    }

    pub fn expand_all(&mut self) {
        let mut keys = HashSet::new();
        self.outline.walk(|key, _, _| {
            keys.insert(key.to_string());
        });
        self.expanded = keys;
    }

    pub fn collapse_all(&mut self) {
        self.expanded.clear();
    }

    /// The rows a reader currently sees: children of collapsed branches are
    /// hidden.
    pub fn visible_rows(&self) -> Vec<OutlineRow> {
        let mut rows = Vec::new();
        // Any key below a collapsed branch starts with "<branch>-".
        let mut hidden_prefix: Option<String> = None;
        self.outline.walk(|key, depth, node| {
            if let Some(prefix) = &hidden_prefix {
                if key.starts_with(prefix.as_str()) {
                    return;
                }
                hidden_prefix = None;
            }
            let expanded = self.is_expanded(key);
            rows.push(OutlineRow {
                key: key.to_string(),
                depth,
                title: node.title.clone(),
                level: node.level,
                has_children: node.has_children(),
                expanded,
            });
            if node.has_children() && !expanded {
                hidden_prefix = Some(format!("{key}-"));
            }
        });
        rows
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::artifact::OutlineNode;

    fn node(title: &str, level: i64, children: Vec<OutlineNode>) -> OutlineNode {
        OutlineNode {
            title: title.into(),
            level,
            children,
        }
    }

    fn view() -> OutlineView {
        OutlineView::new(OutlineArtifact {
            outline: vec![
                node(
                    "A",
                    1,
                    vec![node("A1", 2, vec![node("A1a", 3, vec![])]), node("A2", 2, vec![])],
                ),
                node("B", 1, vec![]),
            ],
        })
    }

    #[test]
    fn everything_starts_expanded() {
        let v = view();
        for key in ["0", "0-0", "0-0-0", "0-1", "1"] {
            assert!(v.is_expanded(key), "{key}");
        }
        assert_eq!(v.visible_rows().len(), 5);
    }

    #[test]
    fn toggling_a_leaf_is_a_no_op() {
        let mut v = view();
        let before = v.clone();
        assert!(!v.toggle("0-1"));
        assert!(!v.toggle("1"));
        assert!(!v.toggle("7"));
        assert_eq!(v, before);
    }

    #[test]
    fn non_canonical_keys_toggle_nothing() {
        let mut v = view();
        let before = v.clone();
        for key in ["00", "+0", "0-", "00-0"] {
            assert!(!v.toggle(key), "{key:?}");
        }
        assert_eq!(v, before);
        assert_eq!(v.visible_rows().len(), 5);
    }

    #[test]
    fn toggling_a_branch_flips_only_itself() {
        let mut v = view();
        assert!(v.toggle("0"));
        assert!(!v.is_expanded("0"));
        assert!(v.is_expanded("0-0"));
        assert!(v.is_expanded("0-0-0"));

        assert!(v.toggle("0"));
        assert!(v.is_expanded("0"));
    }

    #[test]
    fn collapsed_branch_hides_descendants() {
        let mut v = view();
        v.toggle("0-0");
        let keys: Vec<_> = v.visible_rows().into_iter().map(|r| r.key).collect();
        assert_eq!(keys, vec!["0", "0-0", "0-1", "1"]);

        v.toggle("0");
        let keys: Vec<_> = v.visible_rows().into_iter().map(|r| r.key).collect();
        assert_eq!(keys, vec!["0", "1"]);
    }

    #[test]
    fn collapse_and_expand_all() {
        let mut v = view();
        v.collapse_all();
        assert_eq!(v.visible_rows().len(), 2);
        v.expand_all();
        assert_eq!(v.visible_rows().len(), 5);
    }
}
