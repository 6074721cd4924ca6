use anyhow::{Context, Result};
use chrono::NaiveDateTime;
use snk_retention::{ExclusionCause, RetentionAction, RetentionPlan, RetentionPolicy};
use snk_service::SnapshotService;
use tracing::{error, info, warn};

use crate::types::{DeletedSnapshot, FailedDeletion, KeptSnapshot, RotationResult};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RotationOptions {
    pub policy: RetentionPolicy,
    /// Plan and report, but never call delete.
    pub dry_run: bool,
}

/// One rotation pass over the service's repository.
///
/// The service must already be connected and the repository registered;
/// a failed listing is returned as an error and nothing is deleted.
pub struct RotationOrchestrator<'a> {
    service: &'a dyn SnapshotService,
    options: RotationOptions,
}

impl<'a> RotationOrchestrator<'a> {
    pub fn new(service: &'a dyn SnapshotService, options: RotationOptions) -> Self {
        Self { service, options }
    }

    pub fn options(&self) -> RotationOptions {
        self.options
    }

    /// List and evaluate without deleting.
    pub async fn plan(&self) -> Result<RetentionPlan> {
        self.plan_at(crate::local_now()).await
    }

    pub async fn plan_at(&self, now: NaiveDateTime) -> Result<RetentionPlan> {
        let repository = self.service.repository();
        let snapshots = self
            .service
            .list_snapshots()
            .await
            .with_context(|| format!("list snapshots in repository '{repository}'"))?;

        let plan = self.options.policy.evaluate(&snapshots, now);
        for ex in &plan.excluded {
            match ex.cause {
                ExclusionCause::UnparsableName => {
                    warn!(snapshot = %ex.name, "cannot parse date from snapshot name; skipping")
                }
                ExclusionCause::NotSuccessful(state) => {
                    info!(snapshot = %ex.name, state = state.as_str(), "not successful; skipping")
                }
            }
        }
        Ok(plan)
    }

    pub async fn rotate(&self) -> Result<RotationResult> {
        self.rotate_at(crate::local_now()).await
    }

    /// Rotation pass with an injected clock.
    pub async fn rotate_at(&self, now: NaiveDateTime) -> Result<RotationResult> {
        let RotationOptions { policy, dry_run } = self.options;
        let plan = self.plan_at(now).await?;

        info!(
            repository = self.service.repository(),
            max_snapshots = policy.max_snapshots,
            max_age_days = policy.max_age_days,
            keep_successful_only = policy.keep_successful_only,
            eligible = plan.decisions.len(),
            excluded = plan.excluded.len(),
            dry_run,
            "rotation pass"
        );

        let mut result = RotationResult::new(policy, dry_run);

        for d in plan.decisions {
            let reason = match d.action {
                RetentionAction::Keep => {
                    result.kept.push(KeptSnapshot {
                        name: d.snapshot_name,
                        date: d.parsed_date,
                    });
                    continue;
                }
                RetentionAction::Delete(reason) => reason,
            };

            if dry_run {
                info!(snapshot = %d.snapshot_name, reason = %reason, "would delete");
            } else {
                let outcome = self.service.delete_snapshot(&d.snapshot_name).await;
                if let Err(e) = outcome {
                    error!(snapshot = %d.snapshot_name, error = %e, "delete failed; continuing");
                    result.failed.push(FailedDeletion {
                        name: d.snapshot_name,
                        error: e.to_string(),
                    });
                    continue;
                }
                info!(snapshot = %d.snapshot_name, reason = %reason, "deleted");
            }

            result.deleted.push(DeletedSnapshot {
                name: d.snapshot_name,
                date: d.parsed_date,
                reason,
            });
        }

        let result = result.finish();
        info!(
            deleted = result.total_deleted,
            kept = result.total_kept,
            failed = result.failed.len(),
            "rotation complete"
        );
        Ok(result)
    }
}
