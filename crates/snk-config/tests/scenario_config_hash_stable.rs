//! Config hash stability.
//!
//! GREEN when:
//! - the same layers always produce the same hash
//! - key order inside a document does not change the hash
//! - a changed value changes the hash
//! - the env overlay is part of the hashed, effective config

use snk_config::load_layered_yaml_from_strings;

const BASE_YAML: &str = r#"
cluster:
  hosts: ["https://es-0:9200", "https://es-1:9200"]
  timeout_secs: 300
repository:
  name: "s3_backups"
  s3:
    bucket: "snapshots-prod"
    region: "us-east-1"
retention:
  max_snapshots: 10
  max_age_days: 30
"#;

const BASE_YAML_REORDERED: &str = r#"
retention:
  max_age_days: 30
  max_snapshots: 10
repository:
  s3:
    region: "us-east-1"
    bucket: "snapshots-prod"
  name: "s3_backups"
cluster:
  timeout_secs: 300
  hosts: ["https://es-0:9200", "https://es-1:9200"]
"#;

const OVERLAY_YAML: &str = r#"
retention:
  max_snapshots: 3
"#;

#[test]
fn same_input_produces_identical_hash() {
    let a = load_layered_yaml_from_strings(&[BASE_YAML]).unwrap();
    let b = load_layered_yaml_from_strings(&[BASE_YAML]).unwrap();
    assert_eq!(a.config_hash, b.config_hash);
    assert_eq!(a.canonical_json, b.canonical_json);
}

#[test]
fn reordered_keys_produce_same_hash() {
    let a = load_layered_yaml_from_strings(&[BASE_YAML]).unwrap();
    let b = load_layered_yaml_from_strings(&[BASE_YAML_REORDERED]).unwrap();
    assert_eq!(a.config_hash, b.config_hash);
    assert_eq!(a.canonical_json, b.canonical_json);
}

#[test]
fn host_order_is_significant() {
    let a = load_layered_yaml_from_strings(&[BASE_YAML]).unwrap();
    let b = load_layered_yaml_from_strings(&[
        BASE_YAML,
        "cluster:\n  hosts: [\"https://es-1:9200\", \"https://es-0:9200\"]\n",
    ])
    .unwrap();
    assert_ne!(a.config_hash, b.config_hash, "hosts are tried in order");
}

#[test]
fn overlay_wins_and_changes_hash() {
    let base = load_layered_yaml_from_strings(&[BASE_YAML]).unwrap();
    let merged = load_layered_yaml_from_strings(&[BASE_YAML, OVERLAY_YAML]).unwrap();

    assert_ne!(base.config_hash, merged.config_hash);
    assert_eq!(
        merged
            .config_json
            .pointer("/retention/max_snapshots")
            .and_then(|v| v.as_u64()),
        Some(3)
    );
    assert_eq!(
        merged
            .config_json
            .pointer("/retention/max_age_days")
            .and_then(|v| v.as_u64()),
        Some(30),
        "sibling keys survive the overlay"
    );
}

#[test]
fn env_overlay_is_hashed() {
    let files = load_layered_yaml_from_strings(&[BASE_YAML]).unwrap();
    let files_hash = files.config_hash.clone();

    let effective = files
        .with_env_overrides(|k| (k == "MAX_AGE_DAYS").then(|| "7".to_string()))
        .unwrap();
    assert_ne!(effective.config_hash, files_hash);
    assert_eq!(effective.settings().unwrap().retention.max_age_days, 7);

    let untouched = load_layered_yaml_from_strings(&[BASE_YAML])
        .unwrap()
        .with_env_overrides(|_| None)
        .unwrap();
    assert_eq!(untouched.config_hash, files_hash);
}

#[test]
fn hash_is_64_hex_chars() {
    let loaded = load_layered_yaml_from_strings(&[BASE_YAML]).unwrap();
    assert_eq!(loaded.config_hash.len(), 64);
    assert!(loaded.config_hash.chars().all(|c| c.is_ascii_hexdigit()));
}
