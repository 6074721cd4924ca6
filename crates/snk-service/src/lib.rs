//! snk-service
//!
//! Boundary to the document-store cluster that owns the snapshots.
//!
//! The rotation and cleanup passes only need two calls: list everything in
//! the configured repository, and delete one snapshot by name. Connection
//! setup and repository provisioning happen before a pass starts.

pub mod elasticsearch;
pub mod repository;

use std::fmt;

use snk_retention::SnapshotRecord;

pub use elasticsearch::{BasicAuth, ElasticsearchConfig, ElasticsearchSnapshotService};
pub use repository::{RepositorySpec, S3RepositorySettings};

// ---------------------------------------------------------------------------
// Error type
// ---------------------------------------------------------------------------

/// Errors a [`SnapshotService`] implementation may return.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServiceError {
    /// Network or transport failure (no HTTP response at all).
    Transport(String),
    /// The cluster answered with an application-level error.
    Api { status: Option<u16>, message: String },
    /// A response payload could not be decoded.
    Decode(String),
    /// Missing connection, missing repository, bad client configuration.
    Precondition(String),
}

impl fmt::Display for ServiceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ServiceError::Transport(msg) => write!(f, "transport error: {msg}"),
            ServiceError::Api {
                status: Some(s),
                message,
            } => write!(f, "cluster api error status={s}: {message}"),
            ServiceError::Api {
                status: None,
                message,
            } => write!(f, "cluster api error: {message}"),
            ServiceError::Decode(msg) => write!(f, "decode error: {msg}"),
            ServiceError::Precondition(msg) => write!(f, "precondition failed: {msg}"),
        }
    }
}

impl std::error::Error for ServiceError {}

// ---------------------------------------------------------------------------
// Service trait
// ---------------------------------------------------------------------------

/// Snapshot operations against one repository.
///
/// Object safe so passes can hold a `&dyn SnapshotService`.
#[async_trait::async_trait]
pub trait SnapshotService: Send + Sync {
    /// Repository every call operates on.
    fn repository(&self) -> &str;

    /// Every snapshot in the repository, in service order.
    ///
    /// An empty repository is `Ok(vec![])`, never an error.
    async fn list_snapshots(&self) -> Result<Vec<SnapshotRecord>, ServiceError>;

    /// Delete one snapshot.
    ///
    /// A snapshot that is already gone counts as deleted.
    async fn delete_snapshot(&self, name: &str) -> Result<(), ServiceError>;
}
