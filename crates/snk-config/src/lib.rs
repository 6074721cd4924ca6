//! snk-config
//!
//! Layered YAML configuration with a deterministic hash, a one-shot
//! environment overlay, and the typed settings the passes are built from.
//!
//! Load order: YAML layers (later wins) -> env overlay -> `Settings`.
//! Nothing reads the process environment after startup.

use anyhow::{bail, Context, Result};
use serde_json::Value;
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::fs;

mod env;
mod secrets;
mod settings;

pub use env::{apply_env_overrides, EnvKind, ENV_OVERRIDES};
pub use secrets::{resolve_credentials, resolve_credentials_with, ClusterCredentials};
pub use settings::{
    AuthEnvNames, CleanupSettings, ClusterSettings, PatternSyntaxSetting, RepositorySettings,
    RetentionSettings, S3Settings, Settings,
};

/// Leaf values starting with any of these abort the load with
/// CONFIG_SECRET_DETECTED. Credentials belong in env vars named by config.
const SECRET_PREFIXES: &[&str] = &[
    "AKIA",       // AWS access key ID
    "ASIA",       // AWS temporary access key ID
    "-----BEGIN", // PEM private keys
    "ghp_",       // GitHub PAT
    "glpat-",     // GitLab PAT
    "xoxb-",      // Slack bot token
];

#[derive(Debug, Clone)]
pub struct LoadedConfig {
    pub config_hash: String,
    pub canonical_json: String,
    pub config_json: Value,
}

impl LoadedConfig {
    fn from_value(config_json: Value) -> Result<Self> {
        enforce_no_secret_literals(&config_json)?;
        let canonical_json = canonicalize_json(&config_json)?;
        let config_hash = sha256_hex(canonical_json.as_bytes());
        Ok(Self {
            config_hash,
            canonical_json,
            config_json,
        })
    }

    /// Apply the env overlay and re-hash. The hash then covers the
    /// effective configuration, not just the files.
    pub fn with_env_overrides<F>(self, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let json = apply_env_overrides(self.config_json, lookup)?;
        Self::from_value(json)
    }

    pub fn settings(&self) -> Result<Settings> {
        Settings::from_json(&self.config_json)
    }
}

pub fn load_layered_yaml(paths: &[&str]) -> Result<LoadedConfig> {
    let mut docs: Vec<String> = Vec::new();
    for p in paths {
        let raw =
            fs::read_to_string(p).with_context(|| format!("failed to read yaml path: {p}"))?;
        docs.push(raw);
    }

    let doc_refs: Vec<&str> = docs.iter().map(|s| s.as_str()).collect();
    load_layered_yaml_from_strings(&doc_refs)
}

pub fn load_layered_yaml_from_strings(yaml_docs: &[&str]) -> Result<LoadedConfig> {
    // Earlier docs are base, later docs override.
    let mut merged = serde_json::json!({});
    for raw in yaml_docs {
        let v_yaml: serde_yaml::Value = serde_yaml::from_str(raw).context("invalid yaml")?;
        let v_json = serde_json::to_value(v_yaml).context("yaml->json conversion failed")?;
        // An empty document parses as null; treat it as an empty layer.
        if v_json.is_null() {
            continue;
        }
        merged = deep_merge(merged, v_json);
    }

    LoadedConfig::from_value(merged)
}

fn deep_merge(a: Value, b: Value) -> Value {
    match (a, b) {
        (Value::Object(mut a_map), Value::Object(b_map)) => {
            for (k, b_val) in b_map {
                let a_val = a_map.remove(&k).unwrap_or(Value::Null);
                a_map.insert(k, deep_merge(a_val, b_val));
            }
            Value::Object(a_map)
        }
        (_, b_other) => b_other,
    }
}

fn canonicalize_json(v: &Value) -> Result<String> {
    // Keys sorted at every level, compact form. Holds even if serde_json's
    // preserve_order feature is switched on by another crate in the graph.
    let s = serde_json::to_string(&sorted_keys(v)).context("canonical json serialize failed")?;
    Ok(s)
}

fn sorted_keys(v: &Value) -> Value {
    match v {
        Value::Object(map) => {
            let sorted: BTreeMap<&String, Value> =
                map.iter().map(|(k, vv)| (k, sorted_keys(vv))).collect();
            Value::Object(sorted.into_iter().map(|(k, vv)| (k.clone(), vv)).collect())
        }
        Value::Array(arr) => Value::Array(arr.iter().map(sorted_keys).collect()),
        other => other.clone(),
    }
}

fn sha256_hex(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    hex::encode(hasher.finalize())
}

fn collect_leaf_pointers(v: &Value, prefix: &str, out: &mut Vec<String>) {
    match v {
        Value::Object(map) => {
            for (k, vv) in map.iter() {
                let next = format!("{}/{}", prefix, escape_pointer_token(k));
                collect_leaf_pointers(vv, &next, out);
            }
        }
        Value::Array(arr) => {
            for (i, vv) in arr.iter().enumerate() {
                let next = format!("{}/{}", prefix, i);
                collect_leaf_pointers(vv, &next, out);
            }
        }
        _ => {
            let p = if prefix.is_empty() {
                "/".to_string()
            } else {
                prefix.to_string()
            };
            out.push(p);
        }
    }
}

fn escape_pointer_token(s: &str) -> String {
    s.replace('~', "~0").replace('/', "~1")
}

fn enforce_no_secret_literals(v: &Value) -> Result<()> {
    let mut leaves = Vec::new();
    collect_leaf_pointers(v, "", &mut leaves);

    for ptr in leaves {
        if let Some(s) = v.pointer(&ptr).and_then(Value::as_str) {
            if looks_like_secret(s) {
                bail!("CONFIG_SECRET_DETECTED leaf={} value=REDACTED", ptr);
            }
        }
    }
    Ok(())
}

fn looks_like_secret(s: &str) -> bool {
    let t = s.trim();
    if t.len() < 8 {
        return false;
    }
    SECRET_PREFIXES.iter().any(|p| t.starts_with(p))
}
