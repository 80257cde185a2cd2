//! # Shared Data Structures (Engine ↔ Remote Client)
//!
//! Defines the records that cross the remote boundary of the treescope engine.
//! Every type here is plain data with a stable camelCase JSON shape, so a
//! client (editor extension, test runner, CLI) can depend on this crate
//! without pulling in the engine.
//!
//! ## Key Types
//!
//! - [`MatchedRecord`] / [`SnapshotNode`] - Serialized tree nodes
//! - [`RenderRecord`] - One classified render of one component in one commit
//! - [`StateChangeRecord`] - One hook slot whose value changed between commits
//! - [`ConsoleEntry`] / [`NetworkEntry`] - Captured log lines and requests
//! - [`MockRule`] - A network mock rule and its response
//! - [`RenderReport`] - Per-component render aggregation
//! - [`NodeDetails`] - Full inspection view of one node

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;

// ============================================================================
// Buffer Sizing
// ============================================================================

/// Default capacity of the console log buffer
pub const CONSOLE_CAPACITY: usize = 500;

/// Default capacity of the network request buffer
pub const NETWORK_CAPACITY: usize = 200;

/// Default capacity of the state-change buffer
pub const STATE_CHANGE_CAPACITY: usize = 300;

/// Default capacity of the render record buffer
///
/// Much larger than the others: a single commit of a busy screen can emit
/// hundreds of render records.
pub const RENDER_CAPACITY: usize = 5000;

/// Records returned by a console query when no limit is given
pub const DEFAULT_CONSOLE_LIMIT: usize = 50;

/// Records returned by a network query when no limit is given
pub const DEFAULT_NETWORK_LIMIT: usize = 20;

/// Records returned by a state-change query when no limit is given
pub const DEFAULT_STATE_CHANGE_LIMIT: usize = 30;

/// Records returned by a render query when no limit is given
pub const DEFAULT_RENDER_LIMIT: usize = 100;

// ============================================================================
// Tree Records
// ============================================================================

/// Synchronously measured geometry of a native view.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Measure {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    pub page_x: f64,
    pub page_y: f64,
}

/// A live node serialized for transfer.
///
/// `uid` is the node's explicit identifier when it has one, otherwise a
/// root-relative dot-path of sibling indices. Path uids are only valid for
/// the snapshot they were produced from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchedRecord {
    pub uid: String,
    #[serde(rename = "type")]
    pub node_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub identifier: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub accessibility_label: Option<String>,
    pub has_on_press: bool,
    pub has_on_long_press: bool,
    pub has_scrollable: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub disabled: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub editable: Option<bool>,
    /// `null` when every synchronous measurement strategy failed
    #[serde(default)]
    pub measure: Option<Measure>,
    /// Primitive descendant to measure asynchronously when `measure` is null
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub measure_fallback_uid: Option<String>,
}

impl MatchedRecord {
    /// Returns true if this record's capability flags include all of `other`'s.
    #[must_use]
    pub fn covers_capabilities_of(&self, other: &MatchedRecord) -> bool {
        (self.has_scrollable || !other.has_scrollable)
            && (self.has_on_press || !other.has_on_press)
            && (self.has_on_long_press || !other.has_on_long_press)
    }
}

/// A node in a whole-tree snapshot.
///
/// `children` is absent both for leaves and for nodes at the depth bound.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnapshotNode {
    #[serde(flatten)]
    pub record: MatchedRecord,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub children: Option<Vec<SnapshotNode>>,
}

// ============================================================================
// Render Records
// ============================================================================

/// Whether a render was a first mount or a re-render.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RenderKind {
    Mount,
    Update,
}

/// Reported reason for a render, chosen by precedence state > props > context > parent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Trigger {
    State,
    Props,
    Context,
    Parent,
}

impl fmt::Display for Trigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Trigger::State => "state",
            Trigger::Props => "props",
            Trigger::Context => "context",
            Trigger::Parent => "parent",
        };
        f.write_str(label)
    }
}

/// One hook slot whose value changed. `None` stands for `undefined`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StateDiff {
    pub hook_index: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prev: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next: Option<Value>,
}

/// One prop key whose value changed by reference.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropDiff {
    pub key: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prev: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next: Option<Value>,
}

/// One context dependency whose memoized value changed by reference.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContextDiff {
    pub index: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prev: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next: Option<Value>,
}

/// Every diff category that changed in an update, independent of the trigger label.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Changes {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub state: Vec<StateDiff>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub props: Vec<PropDiff>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub context: Vec<ContextDiff>,
}

impl Changes {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.state.is_empty() && self.props.is_empty() && self.context.is_empty()
    }

    /// Pick the single trigger label for this set of changes.
    #[must_use]
    pub fn trigger(&self) -> Trigger {
        if !self.state.is_empty() {
            Trigger::State
        } else if !self.props.is_empty() {
            Trigger::Props
        } else if !self.context.is_empty() {
            Trigger::Context
        } else {
            Trigger::Parent
        }
    }
}

/// A classified render of one component in one commit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderRecord {
    /// Grouping key: the component name, or `"Parent > Primitive"` for built-ins
    pub component: String,
    #[serde(rename = "type")]
    pub kind: RenderKind,
    pub trigger: Trigger,
    pub timestamp: f64,
    pub commit_id: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<String>,
    pub is_memoized: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub native_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub changes: Option<Changes>,
}

/// A hook slot whose value differed between two commits.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StateChangeRecord {
    pub id: u64,
    pub timestamp: f64,
    pub component: String,
    pub hook_index: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prev: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next: Option<Value>,
}

/// Per-trigger render counts for one component.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TriggerCounts {
    pub state: usize,
    pub props: usize,
    pub context: usize,
    pub parent: usize,
}

impl TriggerCounts {
    pub fn record(&mut self, trigger: Trigger) {
        match trigger {
            Trigger::State => self.state += 1,
            Trigger::Props => self.props += 1,
            Trigger::Context => self.context += 1,
            Trigger::Parent => self.parent += 1,
        }
    }
}

/// Aggregated renders of one component key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComponentRenders {
    pub component: String,
    pub renders: usize,
    pub mounts: usize,
    /// Updates whose only reason was the parent re-rendering
    pub unnecessary_renders: usize,
    pub triggers: TriggerCounts,
    /// Most recent records, oldest first
    pub recent: Vec<RenderRecord>,
}

/// Render profiling summary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderReport {
    pub total_renders: usize,
    /// Distinct commit ids seen in the render buffer
    pub total_commits: usize,
    /// Time since profiling started, e.g. `12.3s`
    pub elapsed: String,
    pub components: Vec<ComponentRenders>,
}

/// One hook slot of an inspected node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HookDetails {
    pub index: usize,
    pub stateful: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,
}

/// Detailed view of a single node, for inspection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeDetails {
    #[serde(flatten)]
    pub record: MatchedRecord,
    pub path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    /// Nearest ancestor carrying an explicit identifier
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ancestor_identifier: Option<String>,
    pub props: BTreeMap<String, Value>,
    pub hooks: Vec<HookDetails>,
}

// ============================================================================
// Console and Network Records
// ============================================================================

/// Console method a log line was written with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Log,
    Info,
    Warn,
    Error,
    Debug,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConsoleEntry {
    pub id: u64,
    pub timestamp: f64,
    pub level: LogLevel,
    pub message: String,
}

/// A request observed by the network interceptors.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NetworkEntry {
    pub id: u64,
    pub timestamp: f64,
    pub method: String,
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_ms: Option<f64>,
    #[serde(default)]
    pub mocked: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mock_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

// ============================================================================
// Network Mocks
// ============================================================================

/// The fabricated response a mock rule delivers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MockResponse {
    pub status: u16,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status_text: Option<String>,
    pub headers: BTreeMap<String, String>,
    pub body: Value,
    /// Milliseconds to wait before delivering
    pub delay: u64,
}

impl Default for MockResponse {
    fn default() -> Self {
        Self {
            status: 200,
            status_text: None,
            headers: BTreeMap::new(),
            body: Value::Null,
            delay: 0,
        }
    }
}

/// A mock rule as stored in the registry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MockRule {
    pub id: String,
    pub url_pattern: String,
    pub is_regex: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub method: Option<String>,
    pub response: MockResponse,
    pub enabled: bool,
    pub hit_count: u64,
}
