//! Analysis over buffered profiling data
//!
//! Pure aggregation logic, separated from the engine that collects records
//! and from the protocol that returns them.

pub mod render_report;

pub use render_report::{build_report, MAX_RECENT_PER_COMPONENT, MAX_REPORTED_COMPONENTS};
