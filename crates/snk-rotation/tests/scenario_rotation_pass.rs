//! Scenario: full rotation passes against an in-memory repository.
//!
//! # Invariants under test
//!
//! 1. Count limit: 15 daily snapshots with max_snapshots=10 leave the 10
//!    newest and delete the 5 oldest with the count reason.
//! 2. Age limit: a 40-day-old snapshot under a 30-day limit is deleted with
//!    the age reason even inside the count budget.
//! 3. keep_successful_only: FAILED and PARTIAL snapshots are neither kept
//!    nor deleted, and no delete call ever names them.
//! 4. Best effort: one failing delete is reported in `failed`, the pass
//!    continues, and deleted + kept + failed == eligible.
//! 5. Idempotence: a second pass over the survivors deletes nothing.
//! 6. An empty repository is success with zero counts.
//! 7. A failed listing aborts the pass before any delete.

use chrono::{Duration, NaiveDate, NaiveDateTime};
use snk_retention::{DeleteReason, RetentionPolicy, SnapshotRecord, SnapshotState};
use snk_rotation::{RotationOptions, RotationOrchestrator};
use snk_service::ServiceError;
use snk_testkit::{dated, dated_with_state, snapshot_name, InMemorySnapshotService};

fn now() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2025, 8, 1)
        .unwrap()
        .and_hms_opt(2, 0, 0)
        .unwrap()
}

fn days_ago(d: i64) -> NaiveDateTime {
    now() - Duration::days(d)
}

fn options(max_snapshots: usize, max_age_days: u32, keep_successful_only: bool) -> RotationOptions {
    RotationOptions {
        policy: RetentionPolicy::new(max_snapshots, max_age_days, keep_successful_only),
        dry_run: false,
    }
}

// ---------------------------------------------------------------------------
// Limits
// ---------------------------------------------------------------------------

#[tokio::test]
async fn count_limit_keeps_ten_newest_of_fifteen() {
    let svc = InMemorySnapshotService::with_snapshots("repo", (0..15).map(|d| dated(days_ago(d))));

    let result = RotationOrchestrator::new(&svc, options(10, 365, true))
        .rotate_at(now())
        .await
        .unwrap();

    assert_eq!(result.total_kept, 10);
    assert_eq!(result.total_deleted, 5);
    let kept: Vec<String> = result.kept.iter().map(|k| k.name.clone()).collect();
    let expected: Vec<String> = (0..10).map(|d| snapshot_name(days_ago(d))).collect();
    assert_eq!(kept, expected);
    assert!(result
        .deleted
        .iter()
        .all(|d| d.reason == DeleteReason::ExceedsCount { max_snapshots: 10 }));
    assert_eq!(svc.names().len(), 10);
}

#[tokio::test]
async fn age_limit_deletes_inside_count_budget() {
    let svc =
        InMemorySnapshotService::with_snapshots("repo", [dated(days_ago(0)), dated(days_ago(40))]);

    let result = RotationOrchestrator::new(&svc, options(10, 30, true))
        .rotate_at(now())
        .await
        .unwrap();

    assert_eq!(result.total_kept, 1);
    assert_eq!(result.deleted.len(), 1);
    assert_eq!(result.deleted[0].name, snapshot_name(days_ago(40)));
    assert_eq!(
        result.deleted[0].reason,
        DeleteReason::ExceedsAge { max_age_days: 30 }
    );
    assert_eq!(result.deleted[0].reason.to_string(), "exceeds 30-day retention");
}

#[tokio::test]
async fn snapshot_exactly_at_cutoff_is_kept() {
    let svc = InMemorySnapshotService::with_snapshots("repo", [dated(days_ago(30))]);

    let result = RotationOrchestrator::new(&svc, options(10, 30, true))
        .rotate_at(now())
        .await
        .unwrap();

    assert_eq!(result.total_kept, 1);
    assert_eq!(result.total_deleted, 0);
}

#[tokio::test]
async fn unsuccessful_snapshots_are_never_touched() {
    let svc = InMemorySnapshotService::with_snapshots(
        "repo",
        [
            dated(days_ago(1)),
            dated_with_state(days_ago(90), SnapshotState::Failed),
            dated_with_state(days_ago(91), SnapshotState::Partial),
            dated(days_ago(95)),
        ],
    );

    let result = RotationOrchestrator::new(&svc, options(10, 30, true))
        .rotate_at(now())
        .await
        .unwrap();

    assert_eq!(result.total_kept, 1);
    assert_eq!(result.total_deleted, 1);
    assert_eq!(svc.delete_calls(), vec![snapshot_name(days_ago(95))]);
    assert_eq!(svc.names().len(), 3);
}

#[tokio::test]
async fn unsuccessful_snapshots_count_when_filter_is_off() {
    let svc = InMemorySnapshotService::with_snapshots(
        "repo",
        [
            dated(days_ago(1)),
            dated_with_state(days_ago(2), SnapshotState::Failed),
            dated(days_ago(3)),
        ],
    );

    let result = RotationOrchestrator::new(&svc, options(2, 365, false))
        .rotate_at(now())
        .await
        .unwrap();

    assert_eq!(result.total_kept, 2);
    assert_eq!(svc.delete_calls(), vec![snapshot_name(days_ago(3))]);
}

#[tokio::test]
async fn unparsable_names_are_excluded() {
    let svc = InMemorySnapshotService::with_snapshots(
        "repo",
        [
            SnapshotRecord::new("manual-before-upgrade", SnapshotState::Success),
            dated(days_ago(100)),
        ],
    );

    let result = RotationOrchestrator::new(&svc, options(10, 30, true))
        .rotate_at(now())
        .await
        .unwrap();

    assert_eq!(result.total_deleted, 1);
    assert_eq!(result.total_kept, 0);
    assert!(svc.names().contains(&"manual-before-upgrade".to_string()));
}

#[tokio::test]
async fn max_snapshots_zero_deletes_every_eligible_snapshot() {
    let svc = InMemorySnapshotService::with_snapshots("repo", (0..3).map(|d| dated(days_ago(d))));

    let result = RotationOrchestrator::new(&svc, options(0, 365, true))
        .rotate_at(now())
        .await
        .unwrap();

    assert_eq!(result.total_deleted, 3);
    assert!(svc.names().is_empty());
}

// ---------------------------------------------------------------------------
// Failure handling
// ---------------------------------------------------------------------------

#[tokio::test]
async fn failed_delete_is_reported_and_pass_continues() {
    let svc = InMemorySnapshotService::with_snapshots("repo", (0..6).map(|d| dated(days_ago(d))));
    let stuck = snapshot_name(days_ago(3));
    svc.fail_delete_of(stuck.clone());

    let result = RotationOrchestrator::new(&svc, options(2, 365, true))
        .rotate_at(now())
        .await
        .unwrap();

    // Every candidate was attempted, in order.
    let attempted: Vec<String> = (2..6).map(|d| snapshot_name(days_ago(d))).collect();
    assert_eq!(svc.delete_calls(), attempted);

    assert_eq!(result.failed.len(), 1);
    assert_eq!(result.failed[0].name, stuck);
    assert!(result.failed[0].error.contains("503"));
    assert_eq!(result.total_deleted, 3);
    assert_eq!(result.total_kept, 2);
    assert!(!result.deleted.iter().any(|d| d.name == stuck));
    assert!(!result.kept.iter().any(|k| k.name == stuck));
    assert_eq!(result.total_deleted + result.total_kept + result.failed.len(), 6);
}

#[tokio::test]
async fn list_failure_aborts_before_any_delete() {
    let svc = InMemorySnapshotService::with_snapshots("repo", [dated(days_ago(100))]);
    svc.fail_list_with(ServiceError::Precondition(
        "repository 'repo' does not exist".to_string(),
    ));

    let err = RotationOrchestrator::new(&svc, options(10, 30, true))
        .rotate_at(now())
        .await
        .unwrap_err();

    assert!(matches!(
        err.downcast_ref::<ServiceError>(),
        Some(ServiceError::Precondition(_))
    ));
    assert!(format!("{err:#}").contains("list snapshots in repository 'repo'"));
    assert!(svc.delete_calls().is_empty());
}

#[tokio::test]
async fn empty_repository_is_success_with_zero_counts() {
    let svc = InMemorySnapshotService::new("repo");

    let result = RotationOrchestrator::new(&svc, options(10, 30, true))
        .rotate_at(now())
        .await
        .unwrap();

    assert_eq!(result.total_deleted, 0);
    assert_eq!(result.total_kept, 0);
    assert!(result.failed.is_empty());
    assert_eq!(svc.list_calls(), 1);
}

// ---------------------------------------------------------------------------
// Repeated passes
// ---------------------------------------------------------------------------

#[tokio::test]
async fn second_pass_deletes_nothing() {
    let svc = InMemorySnapshotService::with_snapshots(
        "repo",
        (0..20).map(|d| dated(days_ago(d * 3))),
    );
    let orch = RotationOrchestrator::new(&svc, options(5, 30, true));

    let first = orch.rotate_at(now()).await.unwrap();
    assert!(first.total_deleted > 0);

    let calls_after_first = svc.delete_calls().len();
    let second = orch.rotate_at(now()).await.unwrap();
    assert_eq!(second.total_deleted, 0);
    assert_eq!(second.total_kept, first.total_kept);
    assert_eq!(svc.delete_calls().len(), calls_after_first);
}

#[tokio::test]
async fn result_echoes_policy_and_serializes() {
    let svc = InMemorySnapshotService::with_snapshots("repo", [dated(days_ago(1))]);
    let result = RotationOrchestrator::new(&svc, options(7, 14, false))
        .rotate_at(now())
        .await
        .unwrap();

    assert_eq!(result.policy, RetentionPolicy::new(7, 14, false));
    let json = serde_json::to_value(&result).unwrap();
    assert_eq!(json["policy"]["max_snapshots"], 7);
    assert_eq!(json["total_kept"], 1);
    assert_eq!(json["kept"][0]["date"], "2025-07-31T02:00:00");
}

#[tokio::test]
async fn deleted_reason_serializes_as_text() {
    let svc = InMemorySnapshotService::with_snapshots(
        "repo",
        [dated(days_ago(1)), dated(days_ago(2)), dated(days_ago(40))],
    );
    let result = RotationOrchestrator::new(&svc, options(1, 30, true))
        .rotate_at(now())
        .await
        .unwrap();

    let json = serde_json::to_value(&result).unwrap();
    assert_eq!(json["deleted"][0]["reason"], "exceeds max_snapshots limit (1)");
    assert_eq!(json["deleted"][1]["reason"], "exceeds max_snapshots limit (1)");

    let aged = InMemorySnapshotService::with_snapshots("repo", [dated(days_ago(40))]);
    let result = RotationOrchestrator::new(&aged, options(10, 30, true))
        .rotate_at(now())
        .await
        .unwrap();
    let json = serde_json::to_value(&result).unwrap();
    assert_eq!(json["deleted"][0]["reason"], "exceeds 30-day retention");
}
