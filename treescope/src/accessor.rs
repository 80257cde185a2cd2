//! Read-only helpers over live nodes.
//!
//! Everything the selector matcher, the serializer and the change tracker
//! need to know about a node that is not a plain field: collected text,
//! capabilities, identifiers and positions. All traversals are bounded by a
//! depth limit and go through [`HostTree::walk_from`] or
//! [`HostTree::ancestors`], so malformed links cannot loop.

use crate::domain::NodeId;
use crate::host::{HostTree, HostValue, Node};

const ACCESSIBILITY_LABEL_PROPS: &[&str] = &["accessibilityLabel", "aria-label"];

/// Interaction capabilities of a node, computed once per access.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Capabilities {
    pub press: bool,
    pub long_press: bool,
    pub scroll: bool,
}

impl Capabilities {
    /// Press capabilities come from function-valued handler props; scroll
    /// from an `onScroll` handler or a scrollable native view.
    #[must_use]
    pub fn of(node: &Node) -> Self {
        let handler = |key: &str| node.prop(key).is_some_and(HostValue::is_function);
        Self {
            press: handler("onPress"),
            long_press: handler("onLongPress"),
            scroll: handler("onScroll") || node.native.as_ref().is_some_and(|n| n.scrollable),
        }
    }
}

/// Name used for type matching and reporting.
#[must_use]
pub fn type_name(node: &Node) -> &str {
    &node.name
}

/// Visible text under `id`: every text leaf in pre-order, concatenated and
/// whitespace-collapsed. `None` when there is no non-blank text.
#[must_use]
pub fn collect_text(tree: &HostTree, id: NodeId, max_depth: usize) -> Option<String> {
    let pieces: Vec<&str> = tree
        .walk_from(id, String::new(), max_depth)
        .filter_map(|entry| tree.get(entry.id))
        .filter(|node| node.kind.is_text())
        .filter_map(|node| node.text.as_deref())
        .collect();

    let text = pieces.concat().split_whitespace().collect::<Vec<_>>().join(" ");
    (!text.is_empty()).then_some(text)
}

/// Accessibility label of `id` or, failing that, of its nearest descendant in pre-order.
#[must_use]
pub fn accessibility_label(tree: &HostTree, id: NodeId, max_depth: usize) -> Option<String> {
    tree.walk_from(id, String::new(), max_depth).find_map(|entry| {
        let node = tree.get(entry.id)?;
        ACCESSIBILITY_LABEL_PROPS
            .iter()
            .find_map(|key| node.prop(key).and_then(HostValue::as_str))
            .map(str::to_string)
    })
}

/// Identifier of the nearest ancestor that has one.
#[must_use]
pub fn ancestor_identifier(tree: &HostTree, id: NodeId) -> Option<String> {
    tree.ancestors(id).find_map(|a| tree.get(a)?.identifier())
}

/// Root-relative dot path of sibling indices (`"0.2.1"`).
///
/// `None` if `id` is not reachable from the current root.
#[must_use]
pub fn path_of(tree: &HostTree, id: NodeId) -> Option<String> {
    let root = tree.root()?;
    let mut indices = Vec::new();
    let mut current = id;
    for parent in tree.ancestors(id) {
        let index = tree.get(parent)?.children.iter().position(|c| *c == current)?;
        indices.push(index);
        current = parent;
    }
    if current != root {
        return None;
    }

    let mut path = String::from("0");
    for index in indices.iter().rev() {
        path.push('.');
        path.push_str(&index.to_string());
    }
    Some(path)
}

/// External address of a node: its identifier, else its path.
#[must_use]
pub fn uid(node: &Node, path: &str) -> String {
    node.identifier().unwrap_or_else(|| path.to_string())
}

/// Resolve a uid produced by [`uid`] back to a node of the current tree.
#[must_use]
pub fn find_by_uid(tree: &HostTree, target: &str, max_depth: usize) -> Option<NodeId> {
    tree.walk(max_depth).find_map(|entry| {
        let node = tree.get(entry.id)?;
        (uid(node, &entry.path) == target).then_some(entry.id)
    })
}

/// First primitive strictly below `id`, in pre-order.
#[must_use]
pub fn first_primitive_descendant(tree: &HostTree, id: NodeId, max_depth: usize) -> Option<NodeId> {
    tree.walk_from(id, String::new(), max_depth)
        .skip(1)
        .find(|entry| tree.get(entry.id).is_some_and(|n| n.kind.is_primitive()))
        .map(|entry| entry.id)
}

#[must_use]
pub fn nearest_composite_ancestor(tree: &HostTree, id: NodeId) -> Option<NodeId> {
    tree.ancestors(id).find(|a| tree.get(*a).is_some_and(|n| n.kind.is_composite()))
}

/// Current input value: the `value` prop, else `defaultValue`, string-coerced.
#[must_use]
pub fn input_value(node: &Node) -> Option<String> {
    ["value", "defaultValue"]
        .iter()
        .filter_map(|key| node.prop(key))
        .find(|v| !matches!(v, HostValue::Undefined | HostValue::Null))
        .map(HostValue::coerce_string)
}

#[must_use]
pub fn disabled(node: &Node) -> Option<bool> {
    node.prop("disabled")
        .and_then(HostValue::as_bool)
        .or_else(|| node.prop("accessibilityState")?.get("disabled")?.as_bool())
}

#[must_use]
pub fn editable(node: &Node) -> Option<bool> {
    node.prop("editable").and_then(HostValue::as_bool)
}
