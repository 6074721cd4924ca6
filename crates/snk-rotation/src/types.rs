use chrono::NaiveDateTime;
use serde::{Serialize, Serializer};
use snk_retention::{DeleteReason, RetentionPolicy};

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct DeletedSnapshot {
    pub name: String,
    pub date: NaiveDateTime,
    /// Serialized as its display text, e.g. `exceeds max_snapshots limit (10)`.
    #[serde(serialize_with = "reason_text")]
    pub reason: DeleteReason,
}

fn reason_text<S: Serializer>(reason: &DeleteReason, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.collect_str(reason)
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct KeptSnapshot {
    pub name: String,
    pub date: NaiveDateTime,
}

/// A delete the service refused. The snapshot is still in the repository.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct FailedDeletion {
    pub name: String,
    pub error: String,
}

/// Outcome of one rotation pass.
///
/// `deleted` and `kept` are newest first. A snapshot whose delete failed is
/// in `failed` only, so `total_deleted + total_kept` is short of the eligible
/// count by exactly `failed.len()`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct RotationResult {
    pub deleted: Vec<DeletedSnapshot>,
    pub kept: Vec<KeptSnapshot>,
    pub failed: Vec<FailedDeletion>,
    pub total_deleted: usize,
    pub total_kept: usize,
    pub policy: RetentionPolicy,
    /// When set, `deleted` lists what would have been deleted.
    pub dry_run: bool,
}

impl RotationResult {
    pub(crate) fn new(policy: RetentionPolicy, dry_run: bool) -> Self {
        Self {
            deleted: Vec::new(),
            kept: Vec::new(),
            failed: Vec::new(),
            total_deleted: 0,
            total_kept: 0,
            policy,
            dry_run,
        }
    }

    pub(crate) fn finish(mut self) -> Self {
        self.total_deleted = self.deleted.len();
        self.total_kept = self.kept.len();
        self
    }
}

/// Outcome of one manual cleanup pass.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct CleanupResult {
    /// Selector mode: `names`, `pattern`, `older_than` or `all`.
    pub mode: String,
    /// Resolved targets, in listing order.
    pub selected: Vec<String>,
    /// Empty on a dry run.
    pub deleted: Vec<String>,
    pub failed: Vec<FailedDeletion>,
    /// Requested names that were not in the repository.
    pub missing: Vec<String>,
    pub dry_run: bool,
}
