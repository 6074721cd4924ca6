use anyhow::{Context, Result};
use snk_rotation::{RotationOptions, RotationOrchestrator, RotationResult};
use snk_service::SnapshotService;

use super::list::print_policy;
use super::{connect_and_provision, load_settings, quoted, RetentionArgs};

pub async fn run_rotate(
    paths: &[String],
    knobs: RetentionArgs,
    dry_run: bool,
    json: bool,
) -> Result<()> {
    let (loaded, settings) = load_settings(paths)?;
    let policy = knobs.policy(&settings);
    let svc = connect_and_provision(&settings).await?;

    let result = RotationOrchestrator::new(&svc, RotationOptions { policy, dry_run })
        .rotate()
        .await?;

    if json {
        let out = serde_json::to_string_pretty(&result).context("serialize rotation result")?;
        println!("{out}");
        return Ok(());
    }

    println!("config_hash={}", loaded.config_hash);
    print_policy(svc.repository(), &policy);
    print_result(&result);
    Ok(())
}

fn print_result(result: &RotationResult) {
    println!("dry_run={}", result.dry_run);
    for d in &result.deleted {
        println!(
            "deleted name={} date={} reason={}",
            d.name,
            d.date.format("%Y-%m-%dT%H:%M:%S"),
            quoted(&d.reason.to_string())
        );
    }
    for k in &result.kept {
        println!("kept name={} date={}", k.name, k.date.format("%Y-%m-%dT%H:%M:%S"));
    }
    for f in &result.failed {
        println!("failed name={} error={}", f.name, quoted(&f.error));
    }
    println!("total_deleted={}", result.total_deleted);
    println!("total_kept={}", result.total_kept);
    println!("failed={}", result.failed.len());
}
