//! Retention decision: keep the newest `max_snapshots` eligible snapshots that
//! are younger than `max_age_days`; everything else eligible is deleted.

use std::fmt;

use chrono::{Duration, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::types::{SnapshotRecord, SnapshotState};

/// The three retention knobs.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetentionPolicy {
    pub max_snapshots: usize,
    pub max_age_days: u32,
    pub keep_successful_only: bool,
}

impl Default for RetentionPolicy {
    fn default() -> Self {
        Self {
            max_snapshots: 10,
            max_age_days: 30,
            keep_successful_only: true,
        }
    }
}

/// Why a snapshot is scheduled for deletion.
///
/// The count limit takes reason priority when both limits are exceeded.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum DeleteReason {
    ExceedsCount { max_snapshots: usize },
    ExceedsAge { max_age_days: u32 },
}

impl fmt::Display for DeleteReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeleteReason::ExceedsCount { max_snapshots } => {
                write!(f, "exceeds max_snapshots limit ({max_snapshots})")
            }
            DeleteReason::ExceedsAge { max_age_days } => {
                write!(f, "exceeds {max_age_days}-day retention")
            }
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum RetentionAction {
    Keep,
    Delete(DeleteReason),
}

/// One decision per eligible snapshot.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetentionDecision {
    pub snapshot_name: String,
    pub parsed_date: NaiveDateTime,
    pub action: RetentionAction,
    /// 0-based position in the newest-first order.
    pub rank: usize,
}

impl RetentionDecision {
    pub fn is_delete(&self) -> bool {
        matches!(self.action, RetentionAction::Delete(_))
    }

    pub fn delete_reason(&self) -> Option<DeleteReason> {
        match self.action {
            RetentionAction::Delete(reason) => Some(reason),
            RetentionAction::Keep => None,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExclusionCause {
    /// `keep_successful_only` is set and the snapshot did not succeed.
    NotSuccessful(SnapshotState),
    /// The name follows neither known date convention.
    UnparsableName,
}

impl fmt::Display for ExclusionCause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExclusionCause::NotSuccessful(state) => write!(f, "state {}", state.as_str()),
            ExclusionCause::UnparsableName => write!(f, "unparsable name"),
        }
    }
}

/// A snapshot left out of the decision set: neither kept nor deleted.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExcludedSnapshot {
    pub name: String,
    pub cause: ExclusionCause,
}

/// Result of evaluating a policy against one listing.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetentionPlan {
    /// Newest first.
    pub decisions: Vec<RetentionDecision>,
    /// In input order.
    pub excluded: Vec<ExcludedSnapshot>,
}

impl RetentionPlan {
    pub fn to_delete(&self) -> impl Iterator<Item = &RetentionDecision> {
        self.decisions.iter().filter(|d| d.is_delete())
    }

    pub fn to_keep(&self) -> impl Iterator<Item = &RetentionDecision> {
        self.decisions.iter().filter(|d| !d.is_delete())
    }
}

impl RetentionPolicy {
    pub fn new(max_snapshots: usize, max_age_days: u32, keep_successful_only: bool) -> Self {
        Self {
            max_snapshots,
            max_age_days,
            keep_successful_only,
        }
    }

    /// Oldest timestamp still inside the age limit (exclusive bound).
    pub fn age_cutoff(&self, now: NaiveDateTime) -> NaiveDateTime {
        now.checked_sub_signed(Duration::days(i64::from(self.max_age_days)))
            .unwrap_or(NaiveDateTime::MIN)
    }

    /// Partition `snapshots` into keep/delete decisions.
    ///
    /// Total over its inputs: ineligible snapshots land in `excluded`, never
    /// in `decisions`. Equal timestamps keep their input order.
    pub fn evaluate(&self, snapshots: &[SnapshotRecord], now: NaiveDateTime) -> RetentionPlan {
        let mut eligible: Vec<(&SnapshotRecord, NaiveDateTime)> = Vec::new();
        let mut excluded: Vec<ExcludedSnapshot> = Vec::new();

        for s in snapshots {
            if self.keep_successful_only && s.state != SnapshotState::Success {
                excluded.push(ExcludedSnapshot {
                    name: s.name.clone(),
                    cause: ExclusionCause::NotSuccessful(s.state),
                });
                continue;
            }
            match s.parsed_date() {
                Some(date) => eligible.push((s, date)),
                None => excluded.push(ExcludedSnapshot {
                    name: s.name.clone(),
                    cause: ExclusionCause::UnparsableName,
                }),
            }
        }

        // Vec::sort_by is stable.
        eligible.sort_by(|a, b| b.1.cmp(&a.1));

        let cutoff = self.age_cutoff(now);
        let decisions = eligible
            .into_iter()
            .enumerate()
            .map(|(rank, (s, date))| {
                let action = if rank >= self.max_snapshots {
                    RetentionAction::Delete(DeleteReason::ExceedsCount {
                        max_snapshots: self.max_snapshots,
                    })
                } else if date < cutoff {
                    RetentionAction::Delete(DeleteReason::ExceedsAge {
                        max_age_days: self.max_age_days,
                    })
                } else {
                    RetentionAction::Keep
                };
                RetentionDecision {
                    snapshot_name: s.name.clone(),
                    parsed_date: date,
                    action,
                    rank,
                }
            })
            .collect();

        RetentionPlan {
            decisions,
            excluded,
        }
    }
}
