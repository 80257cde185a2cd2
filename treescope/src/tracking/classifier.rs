//! Render classification: mount, bail-out, or update with a trigger.

use treescope_common::{Changes, RenderKind, RenderRecord, Trigger};

use super::diff::{context_diff, prop_diff, state_diff};
use super::filter::parent_name;
use crate::accessor;
use crate::config::CaptureLimits;
use crate::domain::{CommitId, NodeId, Timestamp, TrackError};
use crate::host::{HostTree, NodeKind};

/// Identifies the commit being classified.
#[derive(Debug, Clone, Copy)]
pub struct CommitStamp {
    pub commit: CommitId,
    pub timestamp: Timestamp,
}

/// Classify the render of the composite at `id`, reported under `component`.
///
/// - no alternate: mount, trigger `parent`, no diff
/// - alternate without the did-work marker: bail-out, `Ok(None)`
/// - alternate with the marker: update; every non-empty diff list is kept
///   and the trigger is the first of state, props, context, parent
///
/// # Errors
/// Returns an error if the node or its alternate is missing from the arena
pub fn classify(
    tree: &HostTree,
    id: NodeId,
    component: String,
    stamp: CommitStamp,
    limits: &CaptureLimits,
) -> Result<Option<RenderRecord>, TrackError> {
    let node = tree.get(id).ok_or(TrackError::MissingNode(id))?;

    let (kind, changes) = match node.alternate {
        None => (RenderKind::Mount, None),
        Some(alternate) => {
            let previous =
                tree.get(alternate).ok_or(TrackError::MissingAlternate { node: id, alternate })?;
            if !node.performed_work {
                return Ok(None);
            }
            let changes = Changes {
                state: state_diff(node, previous, limits),
                props: prop_diff(node, previous, limits),
                context: context_diff(node, previous, limits),
            };
            (RenderKind::Update, Some(changes))
        }
    };

    let trigger = changes.as_ref().map_or(Trigger::Parent, Changes::trigger);
    let is_memoized = tree
        .parent(id)
        .and_then(|p| tree.get(p))
        .is_some_and(|p| p.kind == NodeKind::MemoWrapper);
    let native_type = accessor::first_primitive_descendant(tree, id, usize::MAX)
        .and_then(|d| tree.get(d))
        .map(|d| d.name.clone());

    Ok(Some(RenderRecord {
        component,
        kind,
        trigger,
        timestamp: stamp.timestamp.0,
        commit_id: stamp.commit.0,
        parent: parent_name(tree, id),
        is_memoized,
        native_type,
        changes: changes.filter(|c| !c.is_empty()),
    }))
}
