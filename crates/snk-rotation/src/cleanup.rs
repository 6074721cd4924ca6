use anyhow::{Context, Result};
use snk_retention::Selector;
use snk_service::SnapshotService;
use tracing::{error, info, warn};

use crate::types::{CleanupResult, FailedDeletion};

/// Manual delete of an explicit selection, outside retention policy.
///
/// Selectors are validated when they are built, so a bad pattern or date
/// never reaches the repository.
pub struct CleanupExecutor<'a> {
    service: &'a dyn SnapshotService,
}

impl<'a> CleanupExecutor<'a> {
    pub fn new(service: &'a dyn SnapshotService) -> Self {
        Self { service }
    }

    pub async fn cleanup(&self, selector: &Selector, dry_run: bool) -> Result<CleanupResult> {
        let repository = self.service.repository();
        let existing = self
            .service
            .list_snapshots()
            .await
            .with_context(|| format!("list snapshots in repository '{repository}'"))?;

        let mut result = CleanupResult {
            mode: selector.mode().to_string(),
            dry_run,
            ..CleanupResult::default()
        };

        let selection = selector.resolve(&existing);
        for name in &selection.missing {
            warn!(snapshot = %name, "snapshot not found; skipping");
        }

        if existing.is_empty() {
            info!(repository, "no snapshots in repository");
            result.missing = selection.missing;
            return Ok(result);
        }

        for name in &selection.undated {
            warn!(snapshot = %name, "cannot parse date from snapshot name; skipping");
        }

        info!(
            repository,
            mode = selector.mode(),
            selected = selection.targets.len(),
            dry_run,
            "cleanup pass"
        );

        result.missing = selection.missing;
        result.selected = selection.targets;

        if dry_run {
            for name in &result.selected {
                info!(snapshot = %name, "would delete");
            }
            return Ok(result);
        }

        for name in &result.selected {
            match self.service.delete_snapshot(name).await {
                Ok(()) => {
                    info!(snapshot = %name, "deleted");
                    result.deleted.push(name.clone());
                }
                Err(e) => {
                    error!(snapshot = %name, error = %e, "delete failed; continuing");
                    result.failed.push(FailedDeletion {
                        name: name.clone(),
                        error: e.to_string(),
                    });
                }
            }
        }

        info!(
            deleted = result.deleted.len(),
            failed = result.failed.len(),
            "cleanup complete"
        );
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use snk_retention::{SnapshotRecord, SnapshotState};
    use snk_testkit::InMemorySnapshotService;

    fn svc(names: &[&str]) -> InMemorySnapshotService {
        InMemorySnapshotService::with_snapshots(
            "repo",
            names
                .iter()
                .map(|n| SnapshotRecord::new(*n, SnapshotState::Success)),
        )
    }

    #[tokio::test]
    async fn empty_repository_is_success() {
        let s = svc(&[]);
        let r = CleanupExecutor::new(&s)
            .cleanup(&Selector::All, false)
            .await
            .unwrap();
        assert!(r.selected.is_empty());
        assert!(s.delete_calls().is_empty());
    }

    #[tokio::test]
    async fn empty_repository_still_reports_missing_names() {
        let s = svc(&[]);
        let r = CleanupExecutor::new(&s)
            .cleanup(&Selector::names(["snapshot_20250729_130424"]), false)
            .await
            .unwrap();
        assert_eq!(r.missing, vec!["snapshot_20250729_130424"]);
        assert!(r.selected.is_empty());
        assert!(s.delete_calls().is_empty());
    }

    #[tokio::test]
    async fn dry_run_selects_but_does_not_delete() {
        let s = svc(&["a", "b"]);
        let r = CleanupExecutor::new(&s)
            .cleanup(&Selector::All, true)
            .await
            .unwrap();
        assert_eq!(r.selected, vec!["a", "b"]);
        assert!(r.deleted.is_empty());
        assert!(s.delete_calls().is_empty());
    }
}
