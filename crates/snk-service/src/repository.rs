//! Repository registration body.

use serde_json::{json, Map, Value};

use crate::ServiceError;

/// Filesystem repositories live under the cluster's data path.
const FS_LOCATION_ROOT: &str = "/usr/share/elasticsearch/data/snapshots";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct S3RepositorySettings {
    pub bucket: String,
    pub base_path: String,
    pub region: String,
    /// Custom endpoint for S3-compatible stores.
    pub endpoint: Option<String>,
    pub protocol: Option<String>,
    pub path_style_access: Option<bool>,
}

/// What to register under `name`.
///
/// Names starting with `s3_` are S3 repositories; anything else is a
/// compressed filesystem repository.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepositorySpec {
    pub name: String,
    pub s3: Option<S3RepositorySettings>,
}

impl RepositorySpec {
    pub fn is_s3(&self) -> bool {
        self.name.starts_with("s3_")
    }

    pub fn body(&self) -> Result<Value, ServiceError> {
        if !self.is_s3() {
            return Ok(json!({
                "type": "fs",
                "settings": {
                    "location": format!("{FS_LOCATION_ROOT}/{}", self.name),
                    "compress": true,
                },
            }));
        }

        let s3 = self.s3.as_ref().ok_or_else(|| {
            ServiceError::Precondition(format!(
                "repository '{}' is an S3 repository but no S3 settings are configured",
                self.name
            ))
        })?;

        let mut settings = Map::new();
        settings.insert("bucket".into(), json!(s3.bucket));
        settings.insert("base_path".into(), json!(s3.base_path));
        settings.insert("region".into(), json!(s3.region));
        if let Some(endpoint) = &s3.endpoint {
            settings.insert("endpoint".into(), json!(endpoint));
        }
        if let Some(protocol) = &s3.protocol {
            settings.insert("protocol".into(), json!(protocol));
        }
        if let Some(path_style) = s3.path_style_access {
            settings.insert("path_style_access".into(), json!(path_style));
        }

        Ok(json!({ "type": "s3", "settings": Value::Object(settings) }))
    }
}
