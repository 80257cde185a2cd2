//! Host model: the read-only view of the live component tree.
//!
//! The host runtime owns its tree; the engine sees it as an arena of
//! [`Node`]s addressed by [`NodeId`]. Parent, child and alternate links are
//! arena indices rather than pointers, so a malformed or cyclic link can be
//! detected and skipped instead of followed forever.

pub mod fixture;
pub mod value;

pub use value::{shallow_equal, HostFunction, HostValue};

use crate::domain::NodeId;
use std::collections::{BTreeMap, HashSet};
use treescope_common::Measure;

/// Prop holding a node's explicit identifier
pub const IDENTIFIER_PROP: &str = "testID";

/// Prop key excluded from prop diffs
pub const CHILDREN_PROP: &str = "children";

/// What kind of work a node represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    FunctionComponent,
    ClassComponent,
    ForwardRef,
    /// Structural wrapper around a memoized composite (its child)
    MemoWrapper,
    ContextProvider,
    ContextConsumer,
    /// Primitive backed by a native view
    HostComponent,
    /// Raw text leaf
    HostText,
    Fragment,
    Root,
    Other,
}

impl NodeKind {
    /// Composite nodes run user or framework logic and are the unit of render tracking.
    #[must_use]
    pub fn is_composite(self) -> bool {
        matches!(
            self,
            NodeKind::FunctionComponent | NodeKind::ClassComponent | NodeKind::ForwardRef
        )
    }

    #[must_use]
    pub fn is_primitive(self) -> bool {
        matches!(self, NodeKind::HostComponent)
    }

    #[must_use]
    pub fn is_text(self) -> bool {
        matches!(self, NodeKind::HostText)
    }
}

/// One ordered local-state slot of a composite node.
#[derive(Debug, Clone)]
pub struct Hook {
    pub value: HostValue,
    /// Slots with an update queue are stateful and diffable
    pub has_queue: bool,
}

impl Hook {
    pub fn state(value: impl Into<HostValue>) -> Self {
        Self { value: value.into(), has_queue: true }
    }

    /// A slot without an update queue (memo, ref, effect)
    pub fn passive(value: impl Into<HostValue>) -> Self {
        Self { value: value.into(), has_queue: false }
    }
}

/// Handle to the native view behind a primitive node.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NativeHandle {
    pub tag: u64,
    /// Layout known synchronously, if the backend exposes it
    pub frame: Option<Measure>,
    pub scrollable: bool,
}

#[derive(Debug, Clone)]
pub struct Node {
    pub kind: NodeKind,
    /// Resolved type name (component name or primitive tag)
    pub name: String,
    /// Stricter name some wrapped components carry
    pub display_name: Option<String>,
    pub props: BTreeMap<String, HostValue>,
    pub hooks: Vec<Hook>,
    /// Memoized values of the contexts this node reads, in read order
    pub context_deps: Vec<HostValue>,
    /// Content of a text leaf
    pub text: Option<String>,
    pub parent: Option<NodeId>,
    pub children: Vec<NodeId>,
    /// The same node as of the previous commit
    pub alternate: Option<NodeId>,
    /// Set by the host when it actually re-rendered the node this commit
    pub performed_work: bool,
    pub native: Option<NativeHandle>,
}

impl Node {
    pub fn new(kind: NodeKind, name: impl Into<String>) -> Self {
        Self {
            kind,
            name: name.into(),
            display_name: None,
            props: BTreeMap::new(),
            hooks: Vec::new(),
            context_deps: Vec::new(),
            text: None,
            parent: None,
            children: Vec::new(),
            alternate: None,
            performed_work: false,
            native: None,
        }
    }

    pub fn function(name: impl Into<String>) -> Self {
        Self::new(NodeKind::FunctionComponent, name)
    }

    pub fn host(name: impl Into<String>) -> Self {
        Self::new(NodeKind::HostComponent, name)
    }

    pub fn text(content: impl Into<String>) -> Self {
        let mut node = Self::new(NodeKind::HostText, "#text");
        node.text = Some(content.into());
        node
    }

    pub fn memo() -> Self {
        Self::new(NodeKind::MemoWrapper, "Memo")
    }

    #[must_use]
    pub fn with_prop(mut self, key: impl Into<String>, value: impl Into<HostValue>) -> Self {
        self.props.insert(key.into(), value.into());
        self
    }

    #[must_use]
    pub fn with_hook(mut self, hook: Hook) -> Self {
        self.hooks.push(hook);
        self
    }

    #[must_use]
    pub fn with_context(mut self, value: impl Into<HostValue>) -> Self {
        self.context_deps.push(value.into());
        self
    }

    #[must_use]
    pub fn with_display_name(mut self, name: impl Into<String>) -> Self {
        self.display_name = Some(name.into());
        self
    }

    #[must_use]
    pub fn with_native(mut self, handle: NativeHandle) -> Self {
        self.native = Some(handle);
        self
    }

    #[must_use]
    pub fn prop(&self, key: &str) -> Option<&HostValue> {
        self.props.get(key)
    }

    /// Explicit identifier, when the identifier prop holds a string or number.
    #[must_use]
    pub fn identifier(&self) -> Option<String> {
        match self.prop(IDENTIFIER_PROP)? {
            v @ (HostValue::Str(_) | HostValue::Number(_)) => Some(v.coerce_string()),
            _ => None,
        }
    }
}

/// Arena of live nodes for one commit.
///
/// The arena holds both the current tree (reachable from `root`) and any
/// previous-version nodes referenced through `alternate`.
#[derive(Debug, Clone, Default)]
pub struct HostTree {
    nodes: Vec<Node>,
    root: Option<NodeId>,
}

impl HostTree {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a detached node (root or alternate) and return its index.
    pub fn add(&mut self, node: Node) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(node);
        id
    }

    /// Add a node and make it the root.
    pub fn add_root(&mut self, node: Node) -> NodeId {
        let id = self.add(node);
        self.root = Some(id);
        id
    }

    /// Add a node as the last child of `parent`.
    pub fn add_child(&mut self, parent: NodeId, mut node: Node) -> NodeId {
        node.parent = Some(parent);
        let id = self.add(node);
        if let Some(p) = self.nodes.get_mut(parent.0) {
            p.children.push(id);
        }
        id
    }

    /// Pair `current` with its previous version.
    pub fn set_alternate(&mut self, current: NodeId, previous: NodeId) {
        if let Some(node) = self.nodes.get_mut(current.0) {
            node.alternate = Some(previous);
        }
    }

    pub fn set_root(&mut self, root: NodeId) {
        self.root = Some(root);
    }

    #[must_use]
    pub fn root(&self) -> Option<NodeId> {
        self.root
    }

    #[must_use]
    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.0)
    }

    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(id.0)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Parent of `id`, if it exists and is a valid index.
    #[must_use]
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.get(id)?.parent.filter(|p| self.get(*p).is_some())
    }

    /// Ancestors of `id`, nearest first. Stops at a repeated node.
    #[must_use]
    pub fn ancestors(&self, id: NodeId) -> Ancestors<'_> {
        Ancestors { tree: self, next: self.parent(id), seen: HashSet::from([id]) }
    }

    /// Pre-order walk of the current tree from the root.
    #[must_use]
    pub fn walk(&self, max_depth: usize) -> Walk<'_> {
        match self.root {
            Some(root) => self.walk_from(root, "0".to_string(), max_depth),
            None => Walk { tree: self, stack: Vec::new(), seen: HashSet::new(), max_depth },
        }
    }

    /// Pre-order walk of the subtree under `start`, whose own path is `path`.
    #[must_use]
    pub fn walk_from(&self, start: NodeId, path: String, max_depth: usize) -> Walk<'_> {
        Walk {
            tree: self,
            stack: vec![WalkEntry { id: start, depth: 0, path }],
            seen: HashSet::new(),
            max_depth,
        }
    }
}

/// Iterator over ancestors, nearest first.
pub struct Ancestors<'a> {
    tree: &'a HostTree,
    next: Option<NodeId>,
    seen: HashSet<NodeId>,
}

impl Iterator for Ancestors<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let current = self.next?;
        if !self.seen.insert(current) {
            self.next = None;
            return None;
        }
        self.next = self.tree.parent(current);
        Some(current)
    }
}

/// A node visited by [`Walk`], with its depth and root-relative sibling path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WalkEntry {
    pub id: NodeId,
    pub depth: usize,
    pub path: String,
}

/// Depth-first pre-order traversal with a visited set and depth bound.
///
/// Children deeper than `max_depth` are not visited. Dangling child indices
/// and nodes already visited are skipped.
pub struct Walk<'a> {
    tree: &'a HostTree,
    stack: Vec<WalkEntry>,
    seen: HashSet<NodeId>,
    max_depth: usize,
}

impl Iterator for Walk<'_> {
    type Item = WalkEntry;

    fn next(&mut self) -> Option<WalkEntry> {
        loop {
            let entry = self.stack.pop()?;
            let Some(node) = self.tree.get(entry.id) else { continue };
            if !self.seen.insert(entry.id) {
                continue;
            }
            if entry.depth < self.max_depth {
                for (index, child) in node.children.iter().enumerate().rev() {
                    self.stack.push(WalkEntry {
                        id: *child,
                        depth: entry.depth + 1,
                        path: format!("{}.{index}", entry.path),
                    });
                }
            }
            return Some(entry);
        }
    }
}
