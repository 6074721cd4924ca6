use anyhow::{bail, Result};
use snk_config::Settings;
use snk_retention::Selector;
use snk_rotation::CleanupExecutor;
use snk_service::SnapshotService;

use super::{connect_and_provision, load_settings, pattern_syntax, quoted};

#[derive(Debug, Clone, Default)]
pub struct CleanupArgs {
    pub names: Vec<String>,
    pub all: bool,
    pub pattern: Option<String>,
    pub older_than: Option<String>,
    pub legacy_pattern: bool,
    pub dry_run: bool,
    pub yes: bool,
}

/// Exactly one selector mode, validated before anything touches the cluster.
pub fn build_selector(args: &CleanupArgs, settings: &Settings) -> Result<Selector> {
    let given = [
        !args.names.is_empty(),
        args.all,
        args.pattern.is_some(),
        args.older_than.is_some(),
    ]
    .iter()
    .filter(|g| **g)
    .count();
    if given != 1 {
        bail!("exactly one of NAMES, --all, --pattern or --older-than is required (got {given})");
    }

    let selector = if args.all {
        Selector::All
    } else if let Some(p) = &args.pattern {
        Selector::pattern(p, pattern_syntax(settings, args.legacy_pattern))?
    } else if let Some(d) = &args.older_than {
        Selector::older_than(d)?
    } else {
        Selector::names(args.names.iter().cloned())
    };
    Ok(selector)
}

pub async fn run_cleanup(paths: &[String], args: CleanupArgs) -> Result<()> {
    let (_, settings) = load_settings(paths)?;
    let selector = build_selector(&args, &settings)?;

    if !args.dry_run && !args.yes {
        bail!(
            "REFUSING CLEANUP: this deletes snapshots from repository '{}'. \
             Preview with --dry-run, then re-run with --yes",
            settings.repository.name
        );
    }

    let svc = connect_and_provision(&settings).await?;
    let result = CleanupExecutor::new(&svc)
        .cleanup(&selector, args.dry_run)
        .await?;

    println!("repository={}", svc.repository());
    println!("mode={}", result.mode);
    println!("dry_run={}", result.dry_run);
    for name in &result.missing {
        println!("missing name={name}");
    }
    if result.dry_run {
        for name in &result.selected {
            println!("would_delete name={name}");
        }
    } else {
        for name in &result.deleted {
            println!("deleted name={name}");
        }
    }
    for f in &result.failed {
        println!("failed name={} error={}", f.name, quoted(&f.error));
    }
    println!("selected={}", result.selected.len());
    println!("deleted={}", result.deleted.len());
    println!("failed={}", result.failed.len());
    Ok(())
}
