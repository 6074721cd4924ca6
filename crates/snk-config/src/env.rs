//! Environment overlay.
//!
//! Each known variable overwrites one leaf of the config document. Values are
//! typed on the way in so a bad `MAX_SNAPSHOTS=ten` fails at load, naming the
//! variable, rather than deep inside a pass.

use anyhow::{bail, Result};
use serde_json::{Map, Value};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnvKind {
    Str,
    /// Comma-separated, blanks dropped.
    List,
    UInt,
    Bool,
}

/// `(variable, json pointer, kind)`.
pub const ENV_OVERRIDES: &[(&str, &str, EnvKind)] = &[
    ("SNAPSHOT_HOSTS", "/cluster/hosts", EnvKind::List),
    ("SNAPSHOT_TIMEOUT", "/cluster/timeout_secs", EnvKind::UInt),
    ("SNAPSHOT_VERIFY_CERTS", "/cluster/verify_certs", EnvKind::Bool),
    ("ES_REPOSITORY_NAME", "/repository/name", EnvKind::Str),
    ("S3_BUCKET_NAME", "/repository/s3/bucket", EnvKind::Str),
    ("S3_BASE_PATH", "/repository/s3/base_path", EnvKind::Str),
    ("S3_REGION", "/repository/s3/region", EnvKind::Str),
    ("S3_ENDPOINT", "/repository/s3/endpoint", EnvKind::Str),
    ("S3_PROTOCOL", "/repository/s3/protocol", EnvKind::Str),
    ("S3_PATH_STYLE_ACCESS", "/repository/s3/path_style_access", EnvKind::Bool),
    ("MAX_SNAPSHOTS", "/retention/max_snapshots", EnvKind::UInt),
    ("MAX_AGE_DAYS", "/retention/max_age_days", EnvKind::UInt),
    ("KEEP_SUCCESSFUL_ONLY", "/retention/keep_successful_only", EnvKind::Bool),
];

/// Overlay every variable `lookup` returns a non-blank value for.
///
/// `lookup` is `|k| std::env::var(k).ok()` in the binary and a map in tests.
pub fn apply_env_overrides<F>(mut config: Value, lookup: F) -> Result<Value>
where
    F: Fn(&str) -> Option<String>,
{
    for &(var, pointer, kind) in ENV_OVERRIDES {
        let Some(raw) = lookup(var) else { continue };
        let raw = raw.trim();
        if raw.is_empty() {
            continue;
        }
        let value = typed_value(var, raw, kind)?;
        set_pointer(&mut config, pointer, value);
    }
    Ok(config)
}

fn typed_value(var: &str, raw: &str, kind: EnvKind) -> Result<Value> {
    Ok(match kind {
        EnvKind::Str => Value::String(raw.to_string()),
        EnvKind::List => Value::Array(
            raw.split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(|s| Value::String(s.to_string()))
                .collect(),
        ),
        EnvKind::UInt => match raw.parse::<u64>() {
            Ok(n) => Value::from(n),
            Err(_) => bail!("ENV_INVALID {var}: expected a non-negative integer"),
        },
        EnvKind::Bool => Value::Bool(parse_bool(var, raw)?),
    })
}

fn parse_bool(var: &str, raw: &str) -> Result<bool> {
    match raw.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => bail!("ENV_INVALID {var}: expected true/false"),
    }
}

/// Set `pointer` to `value`, creating intermediate objects. Non-object
/// intermediates are replaced.
fn set_pointer(root: &mut Value, pointer: &str, value: Value) {
    let mut cur = root;
    let mut tokens = pointer.trim_start_matches('/').split('/').peekable();

    while let Some(token) = tokens.next() {
        if !cur.is_object() {
            *cur = Value::Object(Map::new());
        }
        let Value::Object(map) = cur else { return };
        if tokens.peek().is_none() {
            map.insert(token.to_string(), value);
            return;
        }
        cur = map
            .entry(token.to_string())
            .or_insert_with(|| Value::Object(Map::new()));
    }
}
