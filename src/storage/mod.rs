//! Snapshot store adapters.
//!
//! The snapshot is the full set of [`StoredEvent`] rows the watcher
//! currently believes are on the calendar. Adapters only need full scans
//! and per-key writes:
//!
//! - [`MemoryStore`]: in-process map for tests and dry runs
//! - [`LocalStore`]: one JSON file per key on the local filesystem
//! - `S3Store` (feature `s3`): one JSON object per key in a bucket
//!
//! No adapter provides cross-run locking; at most one run may execute at a
//! time.

pub mod local;
pub mod memory;
#[cfg(feature = "s3")]
pub mod s3;

use async_trait::async_trait;

use crate::error::Result;
use crate::models::StoredEvent;

// Re-export for convenience
pub use local::LocalStore;
pub use memory::MemoryStore;
#[cfg(feature = "s3")]
pub use s3::S3Store;

/// Durable key-value storage for the event snapshot.
#[async_trait]
pub trait SnapshotStore: Send + Sync {
    /// Read every stored row.
    async fn scan(&self) -> Result<Vec<StoredEvent>>;

    /// Insert or replace the row under `event.key`.
    async fn put(&self, event: &StoredEvent) -> Result<()>;

    /// Remove the row under `key`. Removing a missing key is not an error.
    async fn delete(&self, key: &str) -> Result<()>;
}
