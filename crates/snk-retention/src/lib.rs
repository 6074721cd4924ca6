//! snk-retention
//!
//! Retention and selection engine for repository snapshots.
//!
//! - Snapshot names carry their creation time (two legacy naming conventions)
//! - Retention keeps the newest N eligible snapshots, bounded by a maximum age
//! - Manual cleanup resolves targets by name, glob pattern, age cutoff or "all"
//!
//! Deterministic, pure logic. No IO. No cluster calls.

mod name;
mod policy;
mod selection;
mod types;

pub use name::parse_snapshot_date;
pub use policy::{
    DeleteReason, ExcludedSnapshot, ExclusionCause, RetentionAction, RetentionDecision,
    RetentionPlan, RetentionPolicy,
};
pub use selection::{
    parse_cutoff_date, GlobPattern, PatternSyntax, Selection, SelectionError, Selector,
};
pub use types::*;
