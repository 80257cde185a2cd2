//! Selector language: parsing and evaluation.
//!
//! `Pressable[testID="x"]:has-press`, `List > Item:nth-of-type(2)`,
//! `ScrollView:has-scroll, #close`. See [`parser`] for the grammar.

pub mod matcher;
pub mod parser;

pub use matcher::{dedupe_by_uid, matches_complex, matches_compound, select_branch};
pub use parser::{parse, ComplexSelector, CompoundSelector, Nth, SelectorSet};

use log::debug;
use treescope_common::MatchedRecord;

use crate::serializer::Serializer;

/// Evaluate `selector` and serialize every match.
///
/// An invalid selector matches nothing.
#[must_use]
pub fn query(serializer: &Serializer<'_>, selector: &str) -> Vec<MatchedRecord> {
    let set = match parse(selector) {
        Ok(set) => set,
        Err(e) => {
            debug!("Selector {selector:?} rejected: {e}");
            return Vec::new();
        }
    };

    let tree = serializer.tree();
    let records = set
        .branches
        .iter()
        .flat_map(|branch| select_branch(tree, branch, serializer.max_depth()))
        .filter_map(|entry| serializer.record(&entry))
        .collect();
    dedupe_by_uid(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::NoGeometry;
    use crate::host::{HostTree, HostValue, Node, NodeKind};

    fn pressable(on_press: bool) -> HostTree {
        let mut tree = HostTree::new();
        let root = tree.add_root(Node::new(NodeKind::Root, "Root"));
        let mut node = Node::function("Pressable").with_prop("testID", "x");
        if on_press {
            node = node.with_prop("onPress", HostValue::function("handlePress"));
        }
        tree.add_child(root, node);
        tree
    }

    #[test]
    fn test_query_pressable_by_identifier_and_capability() {
        let selector = r#"Pressable[testID="x"]:has-press"#;

        let tree = pressable(true);
        let records = query(&Serializer::new(&tree, &NoGeometry, 64), selector);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].uid, "x");
        assert!(records[0].has_on_press);

        let tree = pressable(false);
        assert!(query(&Serializer::new(&tree, &NoGeometry, 64), selector).is_empty());
    }

    #[test]
    fn test_invalid_selector_matches_nothing() {
        let tree = pressable(true);
        let serializer = Serializer::new(&tree, &NoGeometry, 64);
        assert!(query(&serializer, r#"Pressable:text("x"#).is_empty());
    }

    #[test]
    fn test_overlapping_branches_are_deduped() {
        let tree = pressable(true);
        let serializer = Serializer::new(&tree, &NoGeometry, 64);
        let records = query(&serializer, "Pressable, #x, :has-press");
        assert_eq!(records.len(), 1);
    }

    #[test]
    fn test_text_matches_across_adjacent_leaves() {
        let mut tree = HostTree::new();
        let root = tree.add_root(Node::new(NodeKind::Root, "Root"));
        let price = tree.add_child(root, Node::host("Text"));
        tree.add_child(price, Node::text("$"));
        tree.add_child(price, Node::text("12"));

        let serializer = Serializer::new(&tree, &NoGeometry, 64);
        let records = query(&serializer, r#"Text:text("$12")"#);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].text.as_deref(), Some("$12"));
    }
}
