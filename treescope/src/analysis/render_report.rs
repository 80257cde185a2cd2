//! Render aggregation for profiling sessions.
//!
//! Groups buffered render records by component key and ranks components by
//! how often they rendered.
//!
//! # Output
//!
//! ```text
//! RENDERS (12.4s, 38 commits)
//! ─────────────────────────────────────────────
//!   FeedItem          96   mounts 12  unnecessary 61
//!   Card > Pressable  40   mounts 4   unnecessary 0
//! ```

use std::collections::{HashMap, HashSet};
use treescope_common::{
    ComponentRenders, RenderKind, RenderRecord, RenderReport, Trigger, TriggerCounts,
};

use crate::domain::Elapsed;

// =============================================================================
// CONSTANTS
// =============================================================================

/// Components kept in a report, busiest first.
pub const MAX_REPORTED_COMPONENTS: usize = 20;

/// Detailed records kept per component, most recent last.
pub const MAX_RECENT_PER_COMPONENT: usize = 5;

/// Aggregate `records` (oldest first) into a report.
///
/// An unnecessary render is an update whose trigger is `parent`: the
/// component re-rendered without any state, prop or context change of its
/// own. Ranking is by render count, descending; components with equal
/// counts keep the order in which they first rendered.
#[must_use]
pub fn build_report<'a>(
    records: impl IntoIterator<Item = &'a RenderRecord>,
    elapsed: Elapsed,
) -> RenderReport {
    let mut groups: Vec<ComponentRenders> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();
    let mut commits: HashSet<u64> = HashSet::new();
    let mut total_renders = 0;

    for record in records {
        total_renders += 1;
        commits.insert(record.commit_id);

        let slot = *index.entry(record.component.clone()).or_insert_with(|| {
            groups.push(ComponentRenders {
                component: record.component.clone(),
                renders: 0,
                mounts: 0,
                unnecessary_renders: 0,
                triggers: TriggerCounts::default(),
                recent: Vec::new(),
            });
            groups.len() - 1
        });
        let group = &mut groups[slot];

        group.renders += 1;
        match record.kind {
            RenderKind::Mount => group.mounts += 1,
            RenderKind::Update if record.trigger == Trigger::Parent => {
                group.unnecessary_renders += 1;
            }
            RenderKind::Update => {}
        }
        group.triggers.record(record.trigger);

        group.recent.push(record.clone());
        if group.recent.len() > MAX_RECENT_PER_COMPONENT {
            group.recent.remove(0);
        }
    }

    // Stable: ties keep first-render order
    groups.sort_by_key(|g| std::cmp::Reverse(g.renders));
    groups.truncate(MAX_REPORTED_COMPONENTS);

    RenderReport {
        total_renders,
        total_commits: commits.len(),
        elapsed: elapsed.to_string(),
        components: groups,
    }
}
