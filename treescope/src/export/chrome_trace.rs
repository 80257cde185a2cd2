use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::collections::{BTreeMap, BTreeSet};
use std::io::Write;
use treescope_common::{RenderKind, RenderRecord};

/// Chrome Trace Event format
/// Format reference: https://docs.google.com/document/d/1CvAClvFfyA5R-PhYUmn5OOQtYMH4h6I0nSsKchNAySU/preview
#[derive(Debug, Clone, Serialize, Deserialize)]
struct ChromeTraceEvent {
    /// Component key
    name: String,
    /// "mount" or "update"
    cat: String,
    /// Phase: "i" = instant, "M" = metadata
    ph: String,
    /// Timestamp in microseconds, relative to the first record
    ts: f64,
    /// Instant event scope: "t" = thread
    #[serde(skip_serializing_if = "Option::is_none")]
    s: Option<String>,
    pid: u32,
    /// One track per commit
    tid: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    args: Option<BTreeMap<String, JsonValue>>,
}

/// Chrome Trace Format container
#[derive(Debug, Serialize)]
struct ChromeTrace {
    #[serde(rename = "traceEvents")]
    trace_events: Vec<ChromeTraceEvent>,
    #[serde(rename = "displayTimeUnit")]
    display_time_unit: String,
}

/// Process id written into every event; a trace holds one profiling session.
const TRACE_PID: u32 = 1;

/// Render timeline exporter
///
/// Each render record becomes an instant event on the track of its commit,
/// so a commit that re-rendered many components reads as one dense row.
#[derive(Debug, Default)]
pub struct ChromeTraceExporter {
    events: Vec<ChromeTraceEvent>,
    /// First record timestamp in milliseconds
    start_ms: Option<f64>,
}

impl ChromeTraceExporter {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a render record to the trace
    pub fn add_render(&mut self, record: &RenderRecord) {
        let start = *self.start_ms.get_or_insert(record.timestamp);
        let ts_us = (record.timestamp - start).max(0.0) * 1000.0;

        let mut args = BTreeMap::new();
        args.insert("trigger".to_string(), serde_json::json!(record.trigger));
        args.insert("memoized".to_string(), serde_json::json!(record.is_memoized));
        if let Some(parent) = &record.parent {
            args.insert("parent".to_string(), serde_json::json!(parent));
        }
        if let Some(native) = &record.native_type {
            args.insert("nativeType".to_string(), serde_json::json!(native));
        }
        if let Some(changes) = &record.changes {
            args.insert("changes".to_string(), serde_json::json!(changes));
        }

        let cat = match record.kind {
            RenderKind::Mount => "mount",
            RenderKind::Update => "update",
        };
        self.events.push(ChromeTraceEvent {
            name: record.component.clone(),
            cat: cat.to_string(),
            ph: "i".to_string(),
            ts: ts_us,
            s: Some("t".to_string()),
            pid: TRACE_PID,
            tid: record.commit_id,
            args: Some(args),
        });
    }

    pub fn add_renders<'a>(&mut self, records: impl IntoIterator<Item = &'a RenderRecord>) {
        for record in records {
            self.add_render(record);
        }
    }

    /// Export the trace to any writer (file, stdout, buffer, etc.)
    ///
    /// # Errors
    /// Returns an error if the JSON cannot be written
    pub fn export<W: Write>(&self, writer: W) -> Result<()> {
        let mut all_events = self.events.clone();

        // Name each commit track
        let tids: BTreeSet<u64> = self.events.iter().map(|e| e.tid).collect();
        for tid in tids {
            let mut args = BTreeMap::new();
            args.insert("name".to_string(), serde_json::json!(format!("Commit {tid}")));
            all_events.push(ChromeTraceEvent {
                name: "thread_name".to_string(),
                cat: String::new(),
                ph: "M".to_string(),
                ts: 0.0,
                s: None,
                pid: TRACE_PID,
                tid,
                args: Some(args),
            });
        }

        let trace = ChromeTrace { trace_events: all_events, display_time_unit: "ms".to_string() };
        serde_json::to_writer_pretty(writer, &trace).context("Failed to write trace JSON")?;
        Ok(())
    }

    #[must_use]
    pub fn event_count(&self) -> usize {
        self.events.len()
    }
}
