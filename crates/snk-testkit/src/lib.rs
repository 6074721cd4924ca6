//! Test doubles for snapshot passes.
//!
//! `InMemorySnapshotService` stands in for a cluster repository. No network,
//! no clock; failures are injected explicitly.

use std::collections::BTreeSet;
use std::sync::{Mutex, MutexGuard};

use chrono::NaiveDateTime;
use snk_retention::{SnapshotRecord, SnapshotState};
use snk_service::{ServiceError, SnapshotService};

/// `snapshot_YYYYMMDD_HHMMSS` for `ts`.
pub fn snapshot_name(ts: NaiveDateTime) -> String {
    format!("snapshot_{}", ts.format("%Y%m%d_%H%M%S"))
}

/// Successful snapshot named after `ts`.
pub fn dated(ts: NaiveDateTime) -> SnapshotRecord {
    SnapshotRecord::new(snapshot_name(ts), SnapshotState::Success)
}

/// Snapshot named after `ts` with an explicit state.
pub fn dated_with_state(ts: NaiveDateTime, state: SnapshotState) -> SnapshotRecord {
    SnapshotRecord::new(snapshot_name(ts), state)
}

#[derive(Default)]
struct Inner {
    snapshots: Vec<SnapshotRecord>,
    failing_deletes: BTreeSet<String>,
    list_failure: Option<ServiceError>,
    delete_calls: Vec<String>,
    list_calls: usize,
}

/// In-memory repository.
///
/// Deletes remove the record; deleting a name that is not present succeeds,
/// like the cluster adapter does for an already-deleted snapshot.
#[derive(Default)]
pub struct InMemorySnapshotService {
    repository: String,
    inner: Mutex<Inner>,
}

impl InMemorySnapshotService {
    pub fn new(repository: impl Into<String>) -> Self {
        Self {
            repository: repository.into(),
            inner: Mutex::new(Inner::default()),
        }
    }

    pub fn with_snapshots(
        repository: impl Into<String>,
        snapshots: impl IntoIterator<Item = SnapshotRecord>,
    ) -> Self {
        let svc = Self::new(repository);
        svc.lock().snapshots.extend(snapshots);
        svc
    }

    pub fn insert(&self, snapshot: SnapshotRecord) {
        self.lock().snapshots.push(snapshot);
    }

    /// Every delete of `name` fails with an api error.
    pub fn fail_delete_of(&self, name: impl Into<String>) {
        self.lock().failing_deletes.insert(name.into());
    }

    /// Every list call fails with `err`.
    pub fn fail_list_with(&self, err: ServiceError) {
        self.lock().list_failure = Some(err);
    }

    /// Names still present, in listing order.
    pub fn names(&self) -> Vec<String> {
        self.lock().snapshots.iter().map(|s| s.name.clone()).collect()
    }

    /// Every delete attempt, including failed ones, in call order.
    pub fn delete_calls(&self) -> Vec<String> {
        self.lock().delete_calls.clone()
    }

    pub fn list_calls(&self) -> usize {
        self.lock().list_calls
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[async_trait::async_trait]
impl SnapshotService for InMemorySnapshotService {
    fn repository(&self) -> &str {
        &self.repository
    }

    async fn list_snapshots(&self) -> Result<Vec<SnapshotRecord>, ServiceError> {
        let mut inner = self.lock();
        inner.list_calls += 1;
        if let Some(err) = &inner.list_failure {
            return Err(err.clone());
        }
        Ok(inner.snapshots.clone())
    }

    async fn delete_snapshot(&self, name: &str) -> Result<(), ServiceError> {
        let mut inner = self.lock();
        inner.delete_calls.push(name.to_string());
        if inner.failing_deletes.contains(name) {
            return Err(ServiceError::Api {
                status: Some(503),
                message: format!("injected delete failure for {name}"),
            });
        }
        inner.snapshots.retain(|s| s.name != name);
        Ok(())
    }
}
