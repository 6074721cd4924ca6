//! snk-rotation
//!
//! Drives retention and manual cleanup passes against a [`SnapshotService`].
//!
//! One list call per pass, then deletes issued one at a time in decision
//! order. A failed delete is recorded and the pass continues; only a failed
//! list aborts a pass.
//!
//! [`SnapshotService`]: snk_service::SnapshotService

mod cleanup;
mod orchestrator;
mod types;

pub use cleanup::CleanupExecutor;
pub use orchestrator::{RotationOptions, RotationOrchestrator};
pub use types::{CleanupResult, DeletedSnapshot, FailedDeletion, KeptSnapshot, RotationResult};

/// Wall-clock `now` in the zone-less form snapshot names are written in.
pub fn local_now() -> chrono::NaiveDateTime {
    chrono::Local::now().naive_local()
}
