//! Elasticsearch snapshot API adapter.
//!
//! Only the calls a retention or cleanup pass needs: cluster ping, repository
//! registration, list and delete. Hosts are tried in order; the next host is
//! only tried when the previous one could not be reached at all.

use std::fmt;
use std::time::Duration;

use reqwest::{Method, StatusCode};
use serde::Deserialize;
use serde_json::Value;
use snk_retention::{SnapshotRecord, SnapshotState};
use tracing::{debug, info, warn};

use crate::{RepositorySpec, ServiceError, SnapshotService};

/// Cluster credentials. **Values are redacted in `Debug` output.**
#[derive(Clone)]
pub struct BasicAuth {
    pub username: String,
    pub password: String,
}

impl fmt::Debug for BasicAuth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BasicAuth")
            .field("username", &"<REDACTED>")
            .field("password", &"<REDACTED>")
            .finish()
    }
}

#[derive(Debug, Clone)]
pub struct ElasticsearchConfig {
    /// Base URLs, e.g. `https://es-0:9200`. Tried in order.
    pub hosts: Vec<String>,
    pub repository: String,
    /// Whole-request timeout, applied to every call.
    pub timeout: Duration,
    pub verify_certs: bool,
    pub auth: Option<BasicAuth>,
}

#[derive(Debug, Clone)]
pub struct ElasticsearchSnapshotService {
    hosts: Vec<String>,
    repository: String,
    auth: Option<BasicAuth>,
    http: reqwest::Client,
}

impl ElasticsearchSnapshotService {
    pub fn new(cfg: ElasticsearchConfig) -> Result<Self, ServiceError> {
        let hosts: Vec<String> = cfg
            .hosts
            .iter()
            .map(|h| h.trim().trim_end_matches('/').to_string())
            .filter(|h| !h.is_empty())
            .collect();
        if hosts.is_empty() {
            return Err(ServiceError::Precondition(
                "no cluster hosts configured".to_string(),
            ));
        }
        if cfg.repository.trim().is_empty() {
            return Err(ServiceError::Precondition(
                "repository name is empty".to_string(),
            ));
        }

        let http = reqwest::Client::builder()
            .timeout(cfg.timeout)
            .danger_accept_invalid_certs(!cfg.verify_certs)
            .build()
            .map_err(|e| ServiceError::Precondition(format!("http client build failed: {e}")))?;

        Ok(Self {
            hosts,
            repository: cfg.repository,
            auth: cfg.auth,
            http,
        })
    }

    /// Connection check. Returns the cluster name.
    pub async fn cluster_name(&self) -> Result<String, ServiceError> {
        let resp = self.send(Method::GET, "/", &[], None).await?;
        if !resp.status.is_success() {
            return Err(resp.into_error());
        }
        resp.body
            .get("cluster_name")
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| ServiceError::Decode("cluster info has no cluster_name".to_string()))
    }

    /// Register the repository. An already registered repository is fine.
    pub async fn ensure_repository(&self, spec: &RepositorySpec) -> Result<(), ServiceError> {
        let body = spec.body()?;
        let kind = if spec.is_s3() { "s3" } else { "fs" };
        let path = format!("/_snapshot/{}", spec.name);

        let resp = self
            .send(Method::PUT, &path, &[("verify", "false")], Some(&body))
            .await?;

        if resp.status.is_success() {
            info!(repository = %spec.name, kind, "repository registered");
            return Ok(());
        }
        if resp.status == StatusCode::BAD_REQUEST && resp.reason().contains("already exists") {
            info!(repository = %spec.name, "repository already exists");
            return Ok(());
        }
        Err(resp.into_error())
    }

    async fn send(
        &self,
        method: Method,
        path: &str,
        query: &[(&str, &str)],
        body: Option<&Value>,
    ) -> Result<EsResponse, ServiceError> {
        let mut last_err: Option<ServiceError> = None;

        for host in &self.hosts {
            let url = format!("{host}{path}");
            let mut req = self.http.request(method.clone(), url.as_str()).query(query);
            if let Some(auth) = &self.auth {
                req = req.basic_auth(&auth.username, Some(&auth.password));
            }
            if let Some(b) = body {
                req = req.json(b);
            }

            match req.send().await {
                Ok(resp) => {
                    let status = resp.status();
                    let text = resp
                        .text()
                        .await
                        .map_err(|e| ServiceError::Transport(format!("{url}: {e}")))?;
                    debug!(%method, %url, status = status.as_u16(), "cluster response");

                    let body = if text.trim().is_empty() {
                        Value::Null
                    } else {
                        // Proxies in front of the cluster may answer with plain text.
                        serde_json::from_str(&text).unwrap_or(Value::String(text))
                    };
                    return Ok(EsResponse { status, body });
                }
                Err(e) => {
                    warn!(host = %host, error = %e, "cluster host unreachable");
                    last_err = Some(ServiceError::Transport(format!("{url}: {e}")));
                }
            }
        }

        Err(last_err
            .unwrap_or_else(|| ServiceError::Precondition("no cluster hosts configured".to_string())))
    }

    fn repository_missing(&self) -> ServiceError {
        ServiceError::Precondition(format!("repository '{}' does not exist", self.repository))
    }
}

#[async_trait::async_trait]
impl SnapshotService for ElasticsearchSnapshotService {
    fn repository(&self) -> &str {
        &self.repository
    }

    async fn list_snapshots(&self) -> Result<Vec<SnapshotRecord>, ServiceError> {
        let path = format!("/_snapshot/{}/_all", self.repository);
        let resp = self.send(Method::GET, &path, &[], None).await?;

        if resp.status == StatusCode::NOT_FOUND {
            return match resp.error_type() {
                Some("repository_missing_exception") => Err(self.repository_missing()),
                Some("snapshot_missing_exception") => Ok(Vec::new()),
                _ => Err(resp.into_error()),
            };
        }
        if !resp.status.is_success() {
            return Err(resp.into_error());
        }

        let listing: SnapshotListing = serde_json::from_value(resp.body)
            .map_err(|e| ServiceError::Decode(format!("snapshot listing: {e}")))?;
        Ok(listing
            .snapshots
            .into_iter()
            .map(EsSnapshot::into_record)
            .collect())
    }

    async fn delete_snapshot(&self, name: &str) -> Result<(), ServiceError> {
        let path = format!("/_snapshot/{}/{}", self.repository, name);
        let resp = self.send(Method::DELETE, &path, &[], None).await?;

        if resp.status.is_success() {
            info!(snapshot = %name, "snapshot deleted");
            return Ok(());
        }
        if resp.status == StatusCode::NOT_FOUND {
            if resp.error_type() == Some("repository_missing_exception") {
                return Err(self.repository_missing());
            }
            warn!(snapshot = %name, "snapshot not found; treating as deleted");
            return Ok(());
        }
        Err(resp.into_error())
    }
}

struct EsResponse {
    status: StatusCode,
    body: Value,
}

impl EsResponse {
    fn error_type(&self) -> Option<&str> {
        self.body.pointer("/error/type").and_then(Value::as_str)
    }

    fn reason(&self) -> String {
        if let Some(r) = self.body.pointer("/error/reason").and_then(Value::as_str) {
            return r.to_string();
        }
        match &self.body {
            Value::Null => self
                .status
                .canonical_reason()
                .unwrap_or("no response body")
                .to_string(),
            Value::String(s) => s.clone(),
            Value::Object(map) => match map.get("error") {
                Some(Value::String(s)) => s.clone(),
                _ => self.body.to_string(),
            },
            other => other.to_string(),
        }
    }

    fn into_error(self) -> ServiceError {
        let message = match self.error_type() {
            Some(t) => format!("{t}: {}", self.reason()),
            None => self.reason(),
        };
        ServiceError::Api {
            status: Some(self.status.as_u16()),
            message,
        }
    }
}

#[derive(Debug, Deserialize)]
struct SnapshotListing {
    #[serde(default)]
    snapshots: Vec<EsSnapshot>,
}

#[derive(Debug, Deserialize)]
struct EsSnapshot {
    snapshot: String,
    state: Option<String>,
    start_time: Option<String>,
    end_time: Option<String>,
    #[serde(default)]
    indices: Vec<String>,
}

impl EsSnapshot {
    fn into_record(self) -> SnapshotRecord {
        SnapshotRecord {
            state: self
                .state
                .as_deref()
                .map(SnapshotState::parse)
                .unwrap_or(SnapshotState::Unknown),
            name: self.snapshot,
            start_time: self.start_time,
            end_time: self.end_time,
            indices: self.indices,
        }
    }
}
