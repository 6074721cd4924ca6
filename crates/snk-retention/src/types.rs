use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::name::parse_snapshot_date;

/// Snapshot state as reported by the cluster.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SnapshotState {
    Success,
    Partial,
    Failed,
    InProgress,
    Unknown,
}

impl SnapshotState {
    /// Map a service state string. Anything unrecognised becomes `Unknown`.
    pub fn parse(s: &str) -> Self {
        match s.trim().to_ascii_uppercase().as_str() {
            "SUCCESS" => SnapshotState::Success,
            "PARTIAL" => SnapshotState::Partial,
            "FAILED" => SnapshotState::Failed,
            "IN_PROGRESS" => SnapshotState::InProgress,
            _ => SnapshotState::Unknown,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SnapshotState::Success => "SUCCESS",
            SnapshotState::Partial => "PARTIAL",
            SnapshotState::Failed => "FAILED",
            SnapshotState::InProgress => "IN_PROGRESS",
            SnapshotState::Unknown => "UNKNOWN",
        }
    }
}

/// One snapshot as listed by the service.
///
/// `name` is unique within a repository and is the join key for every
/// operation. The timing and index fields are informational only; retention
/// decisions are driven by the date encoded in the name.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotRecord {
    pub name: String,
    pub state: SnapshotState,
    pub start_time: Option<String>,
    pub end_time: Option<String>,
    pub indices: Vec<String>,
}

impl SnapshotRecord {
    pub fn new(name: impl Into<String>, state: SnapshotState) -> Self {
        Self {
            name: name.into(),
            state,
            start_time: None,
            end_time: None,
            indices: Vec::new(),
        }
    }

    /// Creation time derived from the name, if it follows a known convention.
    pub fn parsed_date(&self) -> Option<NaiveDateTime> {
        parse_snapshot_date(&self.name)
    }
}
