//! Live node to transferable record conversion.
//!
//! Nothing returned from here references the live tree: every record is
//! plain data from `treescope_common` and can be sent over the wire as is.

use std::collections::{BTreeMap, HashSet};
use treescope_common::{HookDetails, MatchedRecord, Measure, NodeDetails, SnapshotNode};

use crate::accessor::{self, Capabilities};
use crate::capture::capture;
use crate::config::CaptureLimits;
use crate::domain::NodeId;
use crate::geometry::GeometryBackend;
use crate::host::{HostTree, WalkEntry};

/// Where a node's geometry comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MeasureTarget {
    /// Node whose native handle is measured
    pub node: NodeId,
    /// Uid of that node when it is a stand-in for a composite
    pub fallback_uid: Option<String>,
}

pub struct Serializer<'a> {
    tree: &'a HostTree,
    geometry: &'a dyn GeometryBackend,
    max_depth: usize,
    capture: CaptureLimits,
}

impl<'a> Serializer<'a> {
    pub fn new(tree: &'a HostTree, geometry: &'a dyn GeometryBackend, max_depth: usize) -> Self {
        Self { tree, geometry, max_depth, capture: CaptureLimits::default() }
    }

    #[must_use]
    pub fn with_capture(mut self, limits: CaptureLimits) -> Self {
        self.capture = limits;
        self
    }

    #[must_use]
    pub fn tree(&self) -> &'a HostTree {
        self.tree
    }

    #[must_use]
    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    /// Record for a node reached by a walk.
    #[must_use]
    pub fn record(&self, entry: &WalkEntry) -> Option<MatchedRecord> {
        self.build(entry.id, &entry.path)
    }

    /// Record for any node of the current tree; `None` for detached nodes.
    #[must_use]
    pub fn record_for(&self, id: NodeId) -> Option<MatchedRecord> {
        let path = accessor::path_of(self.tree, id)?;
        self.build(id, &path)
    }

    fn build(&self, id: NodeId, path: &str) -> Option<MatchedRecord> {
        let node = self.tree.get(id)?;
        let caps = Capabilities::of(node);
        let target = self.measure_target(id, path);
        let measure = target
            .as_ref()
            .and_then(|t| self.tree.get(t.node)?.native.as_ref())
            .and_then(|handle| self.geometry.measure_sync(handle));

        Some(MatchedRecord {
            uid: accessor::uid(node, path),
            node_type: accessor::type_name(node).to_string(),
            identifier: node.identifier(),
            text: accessor::collect_text(self.tree, id, self.max_depth),
            accessibility_label: accessor::accessibility_label(self.tree, id, self.max_depth),
            has_on_press: caps.press,
            has_on_long_press: caps.long_press,
            has_scrollable: caps.scroll,
            value: accessor::input_value(node),
            disabled: accessor::disabled(node),
            editable: accessor::editable(node),
            measure,
            measure_fallback_uid: target.and_then(|t| t.fallback_uid),
        })
    }

    /// Resolve which native handle to measure for `id`.
    ///
    /// Phase 1 is the node's own handle, when it has one the backend can
    /// measure right now. Phase 2, for composites only, is the first
    /// primitive descendant, whose uid is kept as a fallback reference for a
    /// later asynchronous measurement.
    #[must_use]
    pub fn measure_target(&self, id: NodeId, path: &str) -> Option<MeasureTarget> {
        let node = self.tree.get(id)?;
        if let Some(handle) = &node.native {
            if self.geometry.measure_sync(handle).is_some() || !node.kind.is_composite() {
                return Some(MeasureTarget { node: id, fallback_uid: None });
            }
        }
        if !node.kind.is_composite() {
            return None;
        }

        let entry = self
            .tree
            .walk_from(id, path.to_string(), self.max_depth)
            .skip(1)
            .find(|e| self.tree.get(e.id).is_some_and(|n| n.kind.is_primitive()))?;
        let descendant = self.tree.get(entry.id)?;
        Some(MeasureTarget {
            node: entry.id,
            fallback_uid: Some(accessor::uid(descendant, &entry.path)),
        })
    }

    /// Synchronous geometry of `id` after both phases; `None` if unknown.
    #[must_use]
    pub fn measure(&self, id: NodeId) -> Option<Measure> {
        let path = accessor::path_of(self.tree, id)?;
        let target = self.measure_target(id, &path)?;
        let handle = self.tree.get(target.node)?.native.as_ref()?;
        self.geometry.measure_sync(handle)
    }

    /// Whole tree from the root. Nodes deeper than `depth` are omitted and
    /// the deepest kept nodes carry no `children`.
    #[must_use]
    pub fn snapshot(&self, depth: usize) -> Option<SnapshotNode> {
        let root = self.tree.root()?;
        let bound = depth.min(self.max_depth);
        let mut seen = HashSet::new();
        self.snapshot_node(root, "0".to_string(), 0, bound, &mut seen)
    }

    fn snapshot_node(
        &self,
        id: NodeId,
        path: String,
        depth: usize,
        bound: usize,
        seen: &mut HashSet<NodeId>,
    ) -> Option<SnapshotNode> {
        if !seen.insert(id) {
            return None;
        }
        let node = self.tree.get(id)?;
        let record = self.build(id, &path)?;

        let children: Vec<SnapshotNode> = if depth < bound {
            node.children
                .iter()
                .enumerate()
                .filter_map(|(i, child)| {
                    self.snapshot_node(*child, format!("{path}.{i}"), depth + 1, bound, seen)
                })
                .collect()
        } else {
            Vec::new()
        };

        Some(SnapshotNode { record, children: (!children.is_empty()).then_some(children) })
    }

    /// Full inspection view of a node: record plus captured props and hooks.
    #[must_use]
    pub fn details(&self, id: NodeId) -> Option<NodeDetails> {
        let node = self.tree.get(id)?;
        let path = accessor::path_of(self.tree, id)?;
        let record = self.build(id, &path)?;

        let props: BTreeMap<_, _> = node
            .props
            .iter()
            .filter_map(|(key, value)| Some((key.clone(), capture(value, &self.capture)?)))
            .collect();
        let hooks = node
            .hooks
            .iter()
            .enumerate()
            .map(|(index, hook)| HookDetails {
                index,
                stateful: hook.has_queue,
                value: capture(&hook.value, &self.capture),
            })
            .collect();

        Some(NodeDetails {
            record,
            path,
            display_name: node.display_name.clone(),
            ancestor_identifier: accessor::ancestor_identifier(self.tree, id),
            props,
            hooks,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::{FrameGeometry, NoGeometry};
    use crate::host::{Hook, HostValue, NativeHandle, Node, NodeKind};

    fn frame(x: f64) -> Measure {
        Measure { x, y: 0.0, width: 10.0, height: 10.0, page_x: x, page_y: 0.0 }
    }

    fn native(tag: u64, at: f64) -> NativeHandle {
        NativeHandle { tag, frame: Some(frame(at)), scrollable: false }
    }

    /// Root > Card(function) > [View(testID=inner, native) > "Hi", Label(function)]
    fn sample() -> (HostTree, NodeId, NodeId, NodeId) {
        let mut tree = HostTree::new();
        let root = tree.add_root(Node::new(NodeKind::Root, "Root"));
        let card = tree.add_child(
            root,
            Node::function("Card").with_hook(Hook::state(HostValue::from(3))).with_prop("title", "x"),
        );
        let view = tree.add_child(
            card,
            Node::host("View").with_prop("testID", "inner").with_native(native(7, 5.0)),
        );
        tree.add_child(view, Node::text("Hi"));
        let label = tree.add_child(card, Node::function("Label"));
        (tree, card, view, label)
    }

    #[test]
    fn test_record_fields() {
        let (tree, _, view, _) = sample();
        let serializer = Serializer::new(&tree, &FrameGeometry, 64);
        let record = serializer.record_for(view).unwrap();
        assert_eq!(record.uid, "inner");
        assert_eq!(record.node_type, "View");
        assert_eq!(record.text.as_deref(), Some("Hi"));
        assert_eq!(record.measure, Some(frame(5.0)));
        assert_eq!(record.measure_fallback_uid, None);
        assert!(!record.has_on_press);
    }

    #[test]
    fn test_composite_falls_back_to_first_primitive() {
        let (tree, card, _, label) = sample();
        let serializer = Serializer::new(&tree, &FrameGeometry, 64);

        let record = serializer.record_for(card).unwrap();
        assert_eq!(record.uid, "0.0");
        assert_eq!(record.measure, Some(frame(5.0)));
        assert_eq!(record.measure_fallback_uid.as_deref(), Some("inner"));

        // No primitive below: measure stays null
        let record = serializer.record_for(label).unwrap();
        assert_eq!(record.measure, None);
        assert_eq!(record.measure_fallback_uid, None);
    }

    #[test]
    fn test_fallback_recorded_even_without_sync_geometry() {
        let (tree, card, ..) = sample();
        let serializer = Serializer::new(&tree, &NoGeometry, 64);
        let record = serializer.record_for(card).unwrap();
        assert_eq!(record.measure, None);
        assert_eq!(record.measure_fallback_uid.as_deref(), Some("inner"));
    }

    #[test]
    fn test_snapshot_depth_bound() {
        let (tree, ..) = sample();
        let serializer = Serializer::new(&tree, &NoGeometry, 64);

        let full = serializer.snapshot(10).unwrap();
        let card = &full.children.as_ref().unwrap()[0];
        assert_eq!(card.children.as_ref().unwrap().len(), 2);
        let view = &card.children.as_ref().unwrap()[0];
        assert_eq!(view.children.as_ref().unwrap()[0].record.uid, "0.0.0.0");

        let shallow = serializer.snapshot(1).unwrap();
        let card = &shallow.children.as_ref().unwrap()[0];
        assert_eq!(card.record.node_type, "Card");
        assert!(card.children.is_none());
    }

    #[test]
    fn test_details_capture_props_and_hooks() {
        let (tree, card, ..) = sample();
        let serializer = Serializer::new(&tree, &NoGeometry, 64);
        let details = serializer.details(card).unwrap();
        assert_eq!(details.path, "0.0");
        assert_eq!(details.props["title"], serde_json::json!("x"));
        assert_eq!(details.hooks.len(), 1);
        assert!(details.hooks[0].stateful);
        assert_eq!(details.hooks[0].value, Some(serde_json::json!(3)));
    }
}
