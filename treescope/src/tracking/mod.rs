//! Per-commit change tracking and render classification.
//!
//! [`process_commit`] walks the current tree once. For every composite node
//! it always runs the state tracker and, while profiling, the render
//! classifier. Each step is isolated: a failing or panicking node is logged
//! and skipped, and the rest of the commit is still processed.

pub mod change_tracker;
pub mod classifier;
pub mod diff;
pub mod filter;

pub use classifier::CommitStamp;
pub use filter::{ComponentFilter, ProfileOptions};

use log::warn;
use std::panic::{catch_unwind, AssertUnwindSafe};
use treescope_common::{RenderRecord, StateChangeRecord};

use crate::config::CaptureLimits;
use crate::domain::{NodeId, TrackError};
use crate::host::HostTree;

/// Records produced by one commit.
#[derive(Debug, Default)]
pub struct CommitOutput {
    pub state_changes: Vec<StateChangeRecord>,
    pub renders: Vec<RenderRecord>,
    /// Node steps that failed and were skipped
    pub failures: usize,
}

/// Run `step`, turning a panic into a [`TrackError`].
fn isolated<T>(step: impl FnOnce() -> Result<T, TrackError>) -> Result<T, TrackError> {
    catch_unwind(AssertUnwindSafe(step)).unwrap_or_else(|payload| {
        let message = payload
            .downcast_ref::<&str>()
            .map(ToString::to_string)
            .or_else(|| payload.downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "unknown panic".to_string());
        Err(TrackError::Panicked(message))
    })
}

/// Process one commit of `tree`.
///
/// `classify` is `Some` only while profiling; it carries the component
/// filter used to key and suppress render records.
pub fn process_commit(
    tree: &HostTree,
    stamp: CommitStamp,
    classify: Option<&ComponentFilter>,
    limits: &CaptureLimits,
    max_depth: usize,
) -> CommitOutput {
    let mut output = CommitOutput::default();

    let composites: Vec<NodeId> = tree
        .walk(max_depth)
        .filter(|e| tree.get(e.id).is_some_and(|n| n.kind.is_composite()))
        .map(|e| e.id)
        .collect();

    for id in composites {
        match isolated(|| change_tracker::track_state(tree, id, stamp.timestamp, limits)) {
            Ok(records) => output.state_changes.extend(records),
            Err(e) => {
                warn!("State tracking skipped {id} in {}: {e}", stamp.commit);
                output.failures += 1;
            }
        }

        let Some(filter) = classify else { continue };
        let Some(component) = filter.component_key(tree, id) else { continue };
        match isolated(|| classifier::classify(tree, id, component, stamp, limits)) {
            Ok(Some(record)) => output.renders.push(record),
            Ok(None) => {}
            Err(e) => {
                warn!("Render classification skipped {id} in {}: {e}", stamp.commit);
                output.failures += 1;
            }
        }
    }

    output
}
