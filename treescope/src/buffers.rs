//! Bounded event buffers.
//!
//! Four independent FIFO stores (console, network, state changes, renders).
//! Each push that takes a buffer over capacity evicts exactly one oldest
//! record, so memory stays bounded however fast events arrive.
//!
//! Queries run in a fixed order: kind-specific filters, then the strict
//! `since` filter, then `limit`, which keeps the most recent N matches in
//! chronological order.

use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use treescope_common::{
    ConsoleEntry, LogLevel, NetworkEntry, RenderRecord, StateChangeRecord, Trigger,
};

use crate::config::BufferConfig;

/// A record that can be filtered by time.
pub trait BufferRecord {
    /// Milliseconds since the Unix epoch
    fn timestamp(&self) -> f64;
}

impl BufferRecord for ConsoleEntry {
    fn timestamp(&self) -> f64 {
        self.timestamp
    }
}

impl BufferRecord for NetworkEntry {
    fn timestamp(&self) -> f64 {
        self.timestamp
    }
}

impl BufferRecord for StateChangeRecord {
    fn timestamp(&self) -> f64 {
        self.timestamp
    }
}

impl BufferRecord for RenderRecord {
    fn timestamp(&self) -> f64 {
        self.timestamp
    }
}

#[derive(Debug, Clone)]
pub struct BoundedBuffer<T> {
    items: VecDeque<T>,
    capacity: usize,
    last_id: u64,
}

impl<T> BoundedBuffer<T> {
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self { items: VecDeque::new(), capacity, last_id: 0 }
    }

    /// Next record id. Ids start at 1 and restart after [`clear`](Self::clear).
    pub fn next_id(&mut self) -> u64 {
        self.last_id += 1;
        self.last_id
    }

    pub fn push(&mut self, item: T) {
        self.items.push_back(item);
        if self.items.len() > self.capacity {
            self.items.pop_front();
        }
    }

    pub fn clear(&mut self) {
        self.items.clear();
        self.last_id = 0;
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &T> {
        self.items.iter()
    }
}

impl<T: BufferRecord + Clone> BoundedBuffer<T> {
    /// Filter, then drop records at or before `since`, then keep the last `limit`.
    pub fn query(&self, filter: impl Fn(&T) -> bool, since: Option<f64>, limit: usize) -> Vec<T> {
        let mut matched: Vec<&T> = self
            .items
            .iter()
            .filter(|item| filter(item))
            .filter(|item| since.map_or(true, |s| item.timestamp() > s))
            .collect();
        let skip = matched.len().saturating_sub(limit);
        matched.drain(..skip);
        matched.into_iter().cloned().collect()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ConsoleQuery {
    pub level: Option<LogLevel>,
    /// Substring of the message
    pub search: Option<String>,
    pub since: Option<f64>,
    pub limit: Option<usize>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct NetworkQuery {
    /// Case-insensitive
    pub method: Option<String>,
    pub url_contains: Option<String>,
    pub status: Option<u16>,
    pub since: Option<f64>,
    pub limit: Option<usize>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct StateChangeQuery {
    /// Substring of the component name
    pub component: Option<String>,
    pub since: Option<f64>,
    pub limit: Option<usize>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RenderQuery {
    /// Substring of the component key
    pub component: Option<String>,
    pub trigger: Option<Trigger>,
    pub since: Option<f64>,
    pub limit: Option<usize>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum BufferKind {
    Console,
    Network,
    StateChanges,
    Renders,
}

fn contains(haystack: &str, needle: Option<&String>) -> bool {
    needle.map_or(true, |n| haystack.contains(n.as_str()))
}

/// The four buffers of one engine.
#[derive(Debug, Clone)]
pub struct EventBuffers {
    pub console: BoundedBuffer<ConsoleEntry>,
    pub network: BoundedBuffer<NetworkEntry>,
    pub state_changes: BoundedBuffer<StateChangeRecord>,
    pub renders: BoundedBuffer<RenderRecord>,
    config: BufferConfig,
}

impl Default for EventBuffers {
    fn default() -> Self {
        Self::new(&BufferConfig::default())
    }
}

impl EventBuffers {
    #[must_use]
    pub fn new(config: &BufferConfig) -> Self {
        Self {
            console: BoundedBuffer::new(config.console_capacity),
            network: BoundedBuffer::new(config.network_capacity),
            state_changes: BoundedBuffer::new(config.state_change_capacity),
            renders: BoundedBuffer::new(config.render_capacity),
            config: config.clone(),
        }
    }

    pub fn push_console(&mut self, timestamp: f64, level: LogLevel, message: impl Into<String>) -> u64 {
        let id = self.console.next_id();
        self.console.push(ConsoleEntry { id, timestamp, level, message: message.into() });
        id
    }

    /// Store a network entry under a fresh id (any id it carries is replaced).
    pub fn push_network(&mut self, mut entry: NetworkEntry) -> u64 {
        entry.id = self.network.next_id();
        let id = entry.id;
        self.network.push(entry);
        id
    }

    pub fn push_state_change(&mut self, mut record: StateChangeRecord) -> u64 {
        record.id = self.state_changes.next_id();
        let id = record.id;
        self.state_changes.push(record);
        id
    }

    pub fn push_render(&mut self, record: RenderRecord) {
        self.renders.push(record);
    }

    #[must_use]
    pub fn console(&self, q: &ConsoleQuery) -> Vec<ConsoleEntry> {
        self.console.query(
            |e| q.level.map_or(true, |l| e.level == l) && contains(&e.message, q.search.as_ref()),
            q.since,
            q.limit.unwrap_or(self.config.console_limit),
        )
    }

    #[must_use]
    pub fn network(&self, q: &NetworkQuery) -> Vec<NetworkEntry> {
        self.network.query(
            |e| {
                q.method.as_ref().map_or(true, |m| e.method.eq_ignore_ascii_case(m))
                    && contains(&e.url, q.url_contains.as_ref())
                    && q.status.map_or(true, |s| e.status == Some(s))
            },
            q.since,
            q.limit.unwrap_or(self.config.network_limit),
        )
    }

    #[must_use]
    pub fn state_changes(&self, q: &StateChangeQuery) -> Vec<StateChangeRecord> {
        self.state_changes.query(
            |r| contains(&r.component, q.component.as_ref()),
            q.since,
            q.limit.unwrap_or(self.config.state_change_limit),
        )
    }

    #[must_use]
    pub fn renders(&self, q: &RenderQuery) -> Vec<RenderRecord> {
        self.renders.query(
            |r| contains(&r.component, q.component.as_ref()) && q.trigger.map_or(true, |t| r.trigger == t),
            q.since,
            q.limit.unwrap_or(self.config.render_limit),
        )
    }

    pub fn clear(&mut self, kind: BufferKind) {
        match kind {
            BufferKind::Console => self.console.clear(),
            BufferKind::Network => self.network.clear(),
            BufferKind::StateChanges => self.state_changes.clear(),
            BufferKind::Renders => self.renders.clear(),
        }
    }

    pub fn clear_all(&mut self) {
        self.console.clear();
        self.network.clear();
        self.state_changes.clear();
        self.renders.clear();
    }
}
