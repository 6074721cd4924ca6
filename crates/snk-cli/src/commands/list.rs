use anyhow::Result;
use snk_retention::{RetentionAction, RetentionPolicy};
use snk_rotation::{RotationOptions, RotationOrchestrator};
use snk_service::SnapshotService;

use super::{connect, load_settings, quoted, RetentionArgs};

pub async fn run_list(paths: &[String]) -> Result<()> {
    let (_, settings) = load_settings(paths)?;
    let svc = connect(&settings).await?;

    let snapshots = svc.list_snapshots().await?;
    println!("repository={}", svc.repository());
    println!("count={}", snapshots.len());
    for s in &snapshots {
        let date = s
            .parsed_date()
            .map(|d| d.format("%Y-%m-%dT%H:%M:%S").to_string())
            .unwrap_or_else(|| "-".to_string());
        println!(
            "snapshot name={} state={} date={} start_time={} indices={}",
            s.name,
            s.state.as_str(),
            date,
            s.start_time.as_deref().unwrap_or("-"),
            s.indices.len()
        );
    }
    Ok(())
}

pub async fn run_plan(paths: &[String], knobs: RetentionArgs) -> Result<()> {
    let (_, settings) = load_settings(paths)?;
    let policy = knobs.policy(&settings);
    let svc = connect(&settings).await?;

    let orch = RotationOrchestrator::new(
        &svc,
        RotationOptions {
            policy,
            dry_run: true,
        },
    );
    let plan = orch.plan().await?;

    print_policy(svc.repository(), &policy);
    for d in &plan.decisions {
        let date = d.parsed_date.format("%Y-%m-%dT%H:%M:%S");
        match d.action {
            RetentionAction::Keep => {
                println!("keep rank={} name={} date={}", d.rank, d.snapshot_name, date)
            }
            RetentionAction::Delete(reason) => println!(
                "delete rank={} name={} date={} reason={}",
                d.rank,
                d.snapshot_name,
                date,
                quoted(&reason.to_string())
            ),
        }
    }
    for ex in &plan.excluded {
        println!("skip name={} cause={}", ex.name, quoted(&ex.cause.to_string()));
    }
    println!("would_delete={}", plan.to_delete().count());
    println!("would_keep={}", plan.to_keep().count());
    println!("skipped={}", plan.excluded.len());
    Ok(())
}

pub(crate) fn print_policy(repository: &str, policy: &RetentionPolicy) {
    println!("repository={repository}");
    println!("max_snapshots={}", policy.max_snapshots);
    println!("max_age_days={}", policy.max_age_days);
    println!("keep_successful_only={}", policy.keep_successful_only);
}
