//! Command handler modules for snapkeep.
//!
//! Shared wiring (config -> settings -> service) lives here.
//! Command-specific logic lives in the submodules.

pub mod cleanup;
pub mod list;
pub mod rotate;

use std::time::Duration;

use anyhow::{Context, Result};
use clap::Args;
use snk_config::{LoadedConfig, PatternSyntaxSetting, Settings};
use snk_retention::{PatternSyntax, RetentionPolicy};
use snk_service::{
    BasicAuth, ElasticsearchConfig, ElasticsearchSnapshotService, RepositorySpec,
    S3RepositorySettings,
};
use tracing::info;

/// Per-invocation overrides for the retention knobs in config.
#[derive(Args, Debug, Clone, Copy, Default)]
pub struct RetentionArgs {
    /// Keep at most this many eligible snapshots.
    #[arg(long)]
    pub max_snapshots: Option<usize>,

    /// Delete eligible snapshots older than this many days.
    #[arg(long)]
    pub max_age_days: Option<u32>,

    /// Only SUCCESS snapshots take part in retention.
    #[arg(long)]
    pub keep_successful_only: Option<bool>,
}

impl RetentionArgs {
    pub fn policy(&self, settings: &Settings) -> RetentionPolicy {
        let r = settings.retention;
        RetentionPolicy::new(
            self.max_snapshots.unwrap_or(r.max_snapshots),
            self.max_age_days.unwrap_or(r.max_age_days),
            self.keep_successful_only.unwrap_or(r.keep_successful_only),
        )
    }
}

/// YAML layers, then the process environment.
pub fn load_config(paths: &[String]) -> Result<LoadedConfig> {
    let path_refs: Vec<&str> = paths.iter().map(|s| s.as_str()).collect();
    let loaded = snk_config::load_layered_yaml(&path_refs)?;
    loaded.with_env_overrides(|k| std::env::var(k).ok())
}

pub fn load_settings(paths: &[String]) -> Result<(LoadedConfig, Settings)> {
    let loaded = load_config(paths)?;
    let settings = loaded.settings()?;
    Ok((loaded, settings))
}

pub fn pattern_syntax(settings: &Settings, legacy_flag: bool) -> PatternSyntax {
    if legacy_flag {
        return PatternSyntax::Legacy;
    }
    match settings.cleanup.pattern_syntax {
        PatternSyntaxSetting::Strict => PatternSyntax::Strict,
        PatternSyntaxSetting::Legacy => PatternSyntax::Legacy,
    }
}

pub fn repository_spec(settings: &Settings) -> RepositorySpec {
    RepositorySpec {
        name: settings.repository.name.clone(),
        s3: settings.repository.s3.as_ref().map(|s3| S3RepositorySettings {
            bucket: s3.bucket.clone(),
            base_path: s3.base_path.clone(),
            region: s3.region.clone(),
            endpoint: s3.endpoint.clone(),
            protocol: Some(s3.protocol.clone()),
            path_style_access: Some(s3.path_style_access),
        }),
    }
}

/// Build the cluster client and check it answers.
pub async fn connect(settings: &Settings) -> Result<ElasticsearchSnapshotService> {
    let auth = snk_config::resolve_credentials(settings)?.map(|c| BasicAuth {
        username: c.username,
        password: c.password,
    });

    let svc = ElasticsearchSnapshotService::new(ElasticsearchConfig {
        hosts: settings.hosts(),
        repository: settings.repository.name.clone(),
        timeout: Duration::from_secs(settings.cluster.timeout_secs),
        verify_certs: settings.cluster.verify_certs,
        auth,
    })?;

    let cluster = svc
        .cluster_name()
        .await
        .context("connect to snapshot cluster")?;
    info!(cluster = %cluster, repository = %settings.repository.name, "connected");
    Ok(svc)
}

/// [`connect`], then make sure the repository is registered.
pub async fn connect_and_provision(settings: &Settings) -> Result<ElasticsearchSnapshotService> {
    let svc = connect(settings).await?;
    svc.ensure_repository(&repository_spec(settings))
        .await
        .with_context(|| format!("register repository '{}'", settings.repository.name))?;
    Ok(svc)
}

/// Quote values that may contain spaces so lines stay `key=value` parseable.
pub fn quoted(s: &str) -> String {
    format!("{s:?}")
}
