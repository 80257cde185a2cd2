//! JSON tree fixtures
//!
//! Describes a [`HostTree`] (or a sequence of commits) on disk so trees can
//! be replayed by the CLI and by integration tests without a live host.
//!
//! ```json
//! {
//!   "shared": { "onPress": { "$fn": "handlePress" } },
//!   "nodes": [
//!     { "kind": "root", "children": [1] },
//!     { "kind": "function", "name": "Pressable",
//!       "props": { "testID": "x", "onPress": { "$ref": "onPress" } } }
//!   ]
//! }
//! ```
//!
//! Special value forms: `{"$fn": name}` is a function, `{"$undefined": true}`
//! is undefined, and `{"$ref": name}` reuses the *same* value reference from
//! the `shared` table (every other JSON object or array is a fresh reference).

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use serde_json::Value as JsonValue;
use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use treescope_common::Measure;

use super::{Hook, HostTree, HostValue, NativeHandle, Node, NodeKind};
use crate::domain::NodeId;

/// Node kinds as written in fixtures
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum KindFixture {
    Function,
    Class,
    ForwardRef,
    Memo,
    Provider,
    Consumer,
    Host,
    Text,
    Fragment,
    Root,
    Other,
}

impl From<KindFixture> for NodeKind {
    fn from(kind: KindFixture) -> Self {
        match kind {
            KindFixture::Function => NodeKind::FunctionComponent,
            KindFixture::Class => NodeKind::ClassComponent,
            KindFixture::ForwardRef => NodeKind::ForwardRef,
            KindFixture::Memo => NodeKind::MemoWrapper,
            KindFixture::Provider => NodeKind::ContextProvider,
            KindFixture::Consumer => NodeKind::ContextConsumer,
            KindFixture::Host => NodeKind::HostComponent,
            KindFixture::Text => NodeKind::HostText,
            KindFixture::Fragment => NodeKind::Fragment,
            KindFixture::Root => NodeKind::Root,
            KindFixture::Other => NodeKind::Other,
        }
    }
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Deserialize)]
pub struct HookFixture {
    pub value: JsonValue,
    #[serde(default = "default_true")]
    pub queue: bool,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct NativeFixture {
    #[serde(default)]
    pub tag: u64,
    #[serde(default)]
    pub frame: Option<Measure>,
    #[serde(default)]
    pub scrollable: bool,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeFixture {
    pub kind: KindFixture,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub props: BTreeMap<String, JsonValue>,
    #[serde(default)]
    pub hooks: Vec<HookFixture>,
    #[serde(default)]
    pub context: Vec<JsonValue>,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub children: Vec<usize>,
    #[serde(default)]
    pub alternate: Option<usize>,
    #[serde(default)]
    pub performed_work: bool,
    #[serde(default)]
    pub native: Option<NativeFixture>,
}

/// One tree, as stored on disk
#[derive(Debug, Clone, Deserialize)]
pub struct TreeFixture {
    #[serde(default)]
    pub root: Option<usize>,
    pub nodes: Vec<NodeFixture>,
    #[serde(default)]
    pub shared: BTreeMap<String, JsonValue>,
}

/// A sequence of commits sharing one `shared` table
#[derive(Debug, Clone, Deserialize)]
pub struct SessionFixture {
    #[serde(default)]
    pub shared: BTreeMap<String, JsonValue>,
    pub commits: Vec<TreeFixture>,
}

/// Shared value table: each entry is one reference reused by every `$ref`
pub type SharedValues = HashMap<String, HostValue>;

/// Build the shared table. Shared entries may not themselves use `$ref`.
pub fn build_shared(shared: &BTreeMap<String, JsonValue>) -> Result<SharedValues> {
    let empty = SharedValues::new();
    shared
        .iter()
        .map(|(name, json)| {
            let value = to_host_value(json, &empty)
                .with_context(|| format!("Invalid shared value '{name}'"))?;
            Ok((name.clone(), value))
        })
        .collect()
}

/// Convert a fixture JSON value into a host value.
pub fn to_host_value(json: &JsonValue, shared: &SharedValues) -> Result<HostValue> {
    Ok(match json {
        JsonValue::Null => HostValue::Null,
        JsonValue::Bool(b) => HostValue::Bool(*b),
        JsonValue::Number(n) => HostValue::Number(n.as_f64().unwrap_or(f64::NAN)),
        JsonValue::String(s) => HostValue::string(s),
        JsonValue::Array(items) => HostValue::array(
            items.iter().map(|item| to_host_value(item, shared)).collect::<Result<Vec<_>>>()?,
        ),
        JsonValue::Object(map) => {
            if map.len() == 1 {
                if let Some(name) = map.get("$fn").and_then(JsonValue::as_str) {
                    return Ok(HostValue::function(name));
                }
                if map.get("$undefined").is_some() {
                    return Ok(HostValue::Undefined);
                }
                if let Some(name) = map.get("$ref").and_then(JsonValue::as_str) {
                    return shared
                        .get(name)
                        .cloned()
                        .with_context(|| format!("Unknown shared reference '{name}'"));
                }
            }
            let mut entries = Vec::with_capacity(map.len());
            for (key, value) in map {
                entries.push((key.clone(), to_host_value(value, shared)?));
            }
            HostValue::object(entries)
        }
    })
}

impl TreeFixture {
    /// Build the arena. `inherited` holds shared values from an enclosing session.
    pub fn build(&self, inherited: &SharedValues) -> Result<HostTree> {
        let mut shared = inherited.clone();
        shared.extend(build_shared(&self.shared)?);

        let count = self.nodes.len();
        let mut tree = HostTree::new();
        for (index, fixture) in self.nodes.iter().enumerate() {
            let node = build_node(fixture, &shared)
                .with_context(|| format!("Invalid node at index {index}"))?;
            tree.add(node);
        }

        for (index, fixture) in self.nodes.iter().enumerate() {
            for &child in &fixture.children {
                if child >= count {
                    bail!("Node {index} lists missing child {child}");
                }
                if let Some(node) = tree.get_mut(NodeId(child)) {
                    node.parent = Some(NodeId(index));
                }
            }
            if let Some(alternate) = fixture.alternate {
                if alternate >= count {
                    bail!("Node {index} lists missing alternate {alternate}");
                }
            }
        }

        match self.root {
            Some(root) if root >= count => bail!("Root index {root} out of range"),
            Some(root) => tree.set_root(NodeId(root)),
            None if count > 0 => tree.set_root(NodeId(0)),
            None => {}
        }
        Ok(tree)
    }
}

fn build_node(fixture: &NodeFixture, shared: &SharedValues) -> Result<Node> {
    let kind = NodeKind::from(fixture.kind);
    let name = fixture.name.clone().unwrap_or_else(|| {
        match kind {
            NodeKind::HostText => "#text",
            NodeKind::MemoWrapper => "Memo",
            NodeKind::Root => "Root",
            _ => "Anonymous",
        }
        .to_string()
    });

    let mut node = Node::new(kind, name);
    node.display_name.clone_from(&fixture.display_name);
    node.text.clone_from(&fixture.text);
    node.performed_work = fixture.performed_work;
    node.children = fixture.children.iter().map(|&c| NodeId(c)).collect();
    node.alternate = fixture.alternate.map(NodeId);
    node.native = fixture.native.as_ref().map(|n| NativeHandle {
        tag: n.tag,
        frame: n.frame,
        scrollable: n.scrollable,
    });
    for (key, value) in &fixture.props {
        node.props.insert(key.clone(), to_host_value(value, shared)?);
    }
    for hook in &fixture.hooks {
        node.hooks.push(Hook { value: to_host_value(&hook.value, shared)?, has_queue: hook.queue });
    }
    for value in &fixture.context {
        node.context_deps.push(to_host_value(value, shared)?);
    }
    Ok(node)
}

/// Parse a single tree from JSON text.
pub fn parse_tree(json: &str) -> Result<HostTree> {
    let fixture: TreeFixture = serde_json::from_str(json).context("Failed to parse tree fixture")?;
    fixture.build(&SharedValues::new())
}

/// Parse a commit session from JSON text.
pub fn parse_session(json: &str) -> Result<Vec<HostTree>> {
    let fixture: SessionFixture =
        serde_json::from_str(json).context("Failed to parse session fixture")?;
    let shared = build_shared(&fixture.shared)?;
    fixture
        .commits
        .iter()
        .enumerate()
        .map(|(i, commit)| commit.build(&shared).with_context(|| format!("Invalid commit {i}")))
        .collect()
}

/// Load a single tree fixture from disk.
pub fn load_tree(path: impl AsRef<Path>) -> Result<HostTree> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    parse_tree(&content)
}

/// Load a commit session fixture from disk.
pub fn load_session(path: impl AsRef<Path>) -> Result<Vec<HostTree>> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    parse_session(&content)
}
