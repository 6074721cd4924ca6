//! Typed view of the effective config document.

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub cluster: ClusterSettings,
    #[serde(default)]
    pub repository: RepositorySettings,
    #[serde(default)]
    pub retention: RetentionSettings,
    #[serde(default)]
    pub cleanup: CleanupSettings,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClusterSettings {
    #[serde(default)]
    pub hosts: Vec<String>,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_true")]
    pub verify_certs: bool,
    #[serde(default)]
    pub auth_env: AuthEnvNames,
}

impl Default for ClusterSettings {
    fn default() -> Self {
        Self {
            hosts: Vec::new(),
            timeout_secs: default_timeout_secs(),
            verify_certs: true,
            auth_env: AuthEnvNames::default(),
        }
    }
}

/// Env var NAMES holding the cluster credentials. Never the values.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthEnvNames {
    #[serde(default = "default_username_env")]
    pub username: String,
    #[serde(default = "default_password_env")]
    pub password: String,
}

impl Default for AuthEnvNames {
    fn default() -> Self {
        Self {
            username: default_username_env(),
            password: default_password_env(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepositorySettings {
    #[serde(default)]
    pub name: String,
    /// Required when `name` starts with `s3_`.
    #[serde(default)]
    pub s3: Option<S3Settings>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct S3Settings {
    #[serde(default)]
    pub bucket: String,
    #[serde(default = "default_base_path")]
    pub base_path: String,
    #[serde(default)]
    pub region: String,
    #[serde(default)]
    pub endpoint: Option<String>,
    #[serde(default = "default_protocol")]
    pub protocol: String,
    #[serde(default = "default_true")]
    pub path_style_access: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetentionSettings {
    #[serde(default = "default_max_snapshots")]
    pub max_snapshots: usize,
    #[serde(default = "default_max_age_days")]
    pub max_age_days: u32,
    #[serde(default = "default_true")]
    pub keep_successful_only: bool,
}

impl Default for RetentionSettings {
    fn default() -> Self {
        Self {
            max_snapshots: default_max_snapshots(),
            max_age_days: default_max_age_days(),
            keep_successful_only: true,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CleanupSettings {
    #[serde(default)]
    pub pattern_syntax: PatternSyntaxSetting,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PatternSyntaxSetting {
    #[default]
    Strict,
    Legacy,
}

fn default_timeout_secs() -> u64 {
    300
}
fn default_true() -> bool {
    true
}
fn default_username_env() -> String {
    "SNAPSHOT_USERNAME".to_string()
}
fn default_password_env() -> String {
    "SNAPSHOT_PASSWORD".to_string()
}
fn default_base_path() -> String {
    "elasticsearch-snapshots".to_string()
}
fn default_protocol() -> String {
    "https".to_string()
}
fn default_max_snapshots() -> usize {
    10
}
fn default_max_age_days() -> u32 {
    30
}

impl Settings {
    pub fn from_json(config_json: &Value) -> Result<Self> {
        let settings: Settings =
            serde_json::from_value(config_json.clone()).context("CONFIG_INVALID: settings shape")?;
        settings.validate()?;
        Ok(settings)
    }

    /// Hosts with surrounding whitespace removed and blanks dropped.
    pub fn hosts(&self) -> Vec<String> {
        self.cluster
            .hosts
            .iter()
            .map(|h| h.trim().to_string())
            .filter(|h| !h.is_empty())
            .collect()
    }

    pub fn validate(&self) -> Result<()> {
        if self.hosts().is_empty() {
            bail!("CONFIG_INVALID cluster.hosts: at least one host must be provided (SNAPSHOT_HOSTS)");
        }
        if self.cluster.timeout_secs == 0 {
            bail!("CONFIG_INVALID cluster.timeout_secs: must be greater than zero");
        }

        let repo = &self.repository;
        if repo.name.trim().is_empty() {
            bail!("CONFIG_INVALID repository.name: must not be empty (ES_REPOSITORY_NAME)");
        }
        if repo.name.starts_with("s3_") {
            let Some(s3) = &repo.s3 else {
                bail!(
                    "CONFIG_INVALID repository.s3: required for S3 repository '{}'",
                    repo.name
                );
            };
            if s3.bucket.trim().is_empty() {
                bail!("CONFIG_INVALID repository.s3.bucket: must not be empty (S3_BUCKET_NAME)");
            }
            if s3.region.trim().is_empty() {
                bail!("CONFIG_INVALID repository.s3.region: must not be empty (S3_REGION)");
            }
        }
        if let Some(s3) = &repo.s3 {
            if !matches!(s3.protocol.as_str(), "http" | "https") {
                bail!(
                    "CONFIG_INVALID repository.s3.protocol: expected http or https, got '{}'",
                    s3.protocol
                );
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn minimal() -> Value {
        json!({
            "cluster": {"hosts": ["https://es-0:9200"]},
            "repository": {"name": "fs_backups"}
        })
    }

    #[test]
    fn defaults_fill_missing_sections() {
        let s = Settings::from_json(&minimal()).unwrap();
        assert_eq!(s.cluster.timeout_secs, 300);
        assert!(s.cluster.verify_certs);
        assert_eq!(s.cluster.auth_env.username, "SNAPSHOT_USERNAME");
        assert_eq!(s.retention, RetentionSettings::default());
        assert_eq!(s.retention.max_snapshots, 10);
        assert_eq!(s.retention.max_age_days, 30);
        assert_eq!(s.cleanup.pattern_syntax, PatternSyntaxSetting::Strict);
    }

    #[test]
    fn s3_defaults() {
        let mut v = minimal();
        v["repository"] = json!({
            "name": "s3_backups",
            "s3": {"bucket": "snaps", "region": "eu-west-1"}
        });
        let s = Settings::from_json(&v).unwrap();
        let s3 = s.repository.s3.unwrap();
        assert_eq!(s3.base_path, "elasticsearch-snapshots");
        assert_eq!(s3.protocol, "https");
        assert!(s3.path_style_access);
        assert_eq!(s3.endpoint, None);
    }

    #[test]
    fn missing_hosts_rejected() {
        let err = Settings::from_json(&json!({"repository": {"name": "r"}})).unwrap_err();
        assert!(err.to_string().contains("cluster.hosts"));

        let err = Settings::from_json(&json!({
            "cluster": {"hosts": ["  "]},
            "repository": {"name": "r"}
        }))
        .unwrap_err();
        assert!(err.to_string().contains("cluster.hosts"));
    }

    #[test]
    fn missing_repository_name_rejected() {
        let err = Settings::from_json(&json!({"cluster": {"hosts": ["h"]}})).unwrap_err();
        assert!(err.to_string().contains("repository.name"));
    }

    #[test]
    fn s3_repository_needs_bucket_and_region() {
        let mut v = minimal();
        v["repository"] = json!({"name": "s3_backups"});
        assert!(Settings::from_json(&v).is_err());

        v["repository"]["s3"] = json!({"bucket": "snaps"});
        let err = Settings::from_json(&v).unwrap_err();
        assert!(err.to_string().contains("region"));
    }

    #[test]
    fn legacy_pattern_syntax_parses() {
        let mut v = minimal();
        v["cleanup"] = json!({"pattern_syntax": "legacy"});
        let s = Settings::from_json(&v).unwrap();
        assert_eq!(s.cleanup.pattern_syntax, PatternSyntaxSetting::Legacy);
    }

    #[test]
    fn wrong_type_is_a_shape_error() {
        let mut v = minimal();
        v["retention"] = json!({"max_snapshots": "ten"});
        let err = Settings::from_json(&v).unwrap_err();
        assert!(format!("{err:#}").contains("CONFIG_INVALID"));
    }
}
