//! State-change tracking, run on every commit whether or not profiling is active.

use treescope_common::StateChangeRecord;

use super::diff::state_diff;
use super::filter::is_default_ignored;
use crate::config::CaptureLimits;
use crate::domain::{NodeId, Timestamp, TrackError};
use crate::host::HostTree;

/// State-change rows for one composite node.
///
/// Fresh mounts and framework internals produce nothing. Ids are left at 0
/// for the buffer to assign.
///
/// # Errors
/// Returns an error if the node or its alternate is missing from the arena
pub fn track_state(
    tree: &HostTree,
    id: NodeId,
    timestamp: Timestamp,
    limits: &CaptureLimits,
) -> Result<Vec<StateChangeRecord>, TrackError> {
    let node = tree.get(id).ok_or(TrackError::MissingNode(id))?;
    let Some(alternate) = node.alternate else { return Ok(Vec::new()) };
    if is_default_ignored(&node.name) {
        return Ok(Vec::new());
    }
    let previous =
        tree.get(alternate).ok_or(TrackError::MissingAlternate { node: id, alternate })?;

    Ok(state_diff(node, previous, limits)
        .into_iter()
        .map(|diff| StateChangeRecord {
            id: 0,
            timestamp: timestamp.0,
            component: node.name.clone(),
            hook_index: diff.hook_index,
            prev: diff.prev,
            next: diff.next,
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::{Hook, Node, NodeKind};
    use serde_json::json;

    #[test]
    fn test_changed_slots_become_records() {
        let mut tree = HostTree::new();
        let root = tree.add_root(Node::new(NodeKind::Root, "Root"));
        let old = tree.add(Node::function("Counter").with_hook(Hook::state(1)).with_hook(Hook::state("x")));
        let current = tree.add_child(
            root,
            Node::function("Counter").with_hook(Hook::state(2)).with_hook(Hook::state("x")),
        );
        tree.set_alternate(current, old);

        let records = track_state(&tree, current, Timestamp(5.0), &CaptureLimits::default()).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].component, "Counter");
        assert_eq!(records[0].hook_index, 0);
        assert_eq!(records[0].prev, Some(json!(1)));
        assert_eq!(records[0].next, Some(json!(2)));
    }

    #[test]
    fn test_mount_and_ignored_produce_nothing() {
        let mut tree = HostTree::new();
        let root = tree.add_root(Node::new(NodeKind::Root, "Root"));
        let mounted = tree.add_child(root, Node::function("Counter").with_hook(Hook::state(1)));
        let old = tree.add(Node::function("LogBoxLog").with_hook(Hook::state(1)));
        let ignored = tree.add_child(root, Node::function("LogBoxLog").with_hook(Hook::state(2)));
        tree.set_alternate(ignored, old);

        let limits = CaptureLimits::default();
        assert!(track_state(&tree, mounted, Timestamp(0.0), &limits).unwrap().is_empty());
        assert!(track_state(&tree, ignored, Timestamp(0.0), &limits).unwrap().is_empty());
    }

    #[test]
    fn test_dangling_alternate_is_an_error() {
        let mut tree = HostTree::new();
        let root = tree.add_root(Node::new(NodeKind::Root, "Root"));
        let node = tree.add_child(root, Node::function("Counter"));
        tree.set_alternate(node, NodeId(99));
        let err = track_state(&tree, node, Timestamp(0.0), &CaptureLimits::default()).unwrap_err();
        assert_eq!(err, TrackError::MissingAlternate { node, alternate: NodeId(99) });
    }
}
