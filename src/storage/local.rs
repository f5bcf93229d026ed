//! Local filesystem snapshot store.
//!
//! Used for local runs and development. Production deployments use
//! `S3Store`.
//!
//! ## Storage Layout
//!
//! ```text
//! {root}/
//! ├── 20250310_1a2b3c4d.json   # one StoredEvent per file
//! └── 20250314_9f8e7d6c.json
//! ```

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;

use crate::error::{AppError, Result};
use crate::models::StoredEvent;
use crate::storage::SnapshotStore;

const EXTENSION: &str = "json";

/// Filesystem snapshot store, one file per key.
#[derive(Debug, Clone)]
pub struct LocalStore {
    root_dir: PathBuf,
}

impl LocalStore {
    /// Create a new LocalStore rooted at the given directory.
    pub fn new(root_dir: impl Into<PathBuf>) -> Self {
        Self {
            root_dir: root_dir.into(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root_dir
    }

    /// Get the file path for a key.
    fn path(&self, key: &str) -> Result<PathBuf> {
        if key.is_empty() || key.contains(['/', '\\']) || key.starts_with('.') {
            return Err(AppError::store(format!("invalid snapshot key '{key}'")));
        }
        Ok(self.root_dir.join(format!("{key}.{EXTENSION}")))
    }

    /// Write bytes atomically (write to temp, then rename).
    async fn write_bytes(&self, path: &Path, bytes: &[u8]) -> Result<()> {
        tokio::fs::create_dir_all(&self.root_dir).await?;

        let tmp = path.with_extension("tmp");
        let mut file = tokio::fs::File::create(&tmp).await?;
        file.write_all(bytes).await?;
        file.flush().await?;
        drop(file);

        tokio::fs::rename(&tmp, path).await?;
        Ok(())
    }
}

#[async_trait]
impl SnapshotStore for LocalStore {
    async fn scan(&self) -> Result<Vec<StoredEvent>> {
        let mut dir = match tokio::fs::read_dir(&self.root_dir).await {
            Ok(dir) => dir,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                log::warn!("No snapshot directory at {}", self.root_dir.display());
                return Ok(Vec::new());
            }
            Err(e) => return Err(AppError::Io(e)),
        };

        let mut paths = Vec::new();
        while let Some(entry) = dir.next_entry().await? {
            let path = entry.path();
            if path.extension().is_some_and(|ext| ext == EXTENSION) {
                paths.push(path);
            }
        }
        paths.sort();

        let mut rows = Vec::with_capacity(paths.len());
        for path in paths {
            let bytes = tokio::fs::read(&path).await?;
            let row: StoredEvent = serde_json::from_slice(&bytes).map_err(|e| {
                AppError::store(format!("corrupt snapshot row {}: {}", path.display(), e))
            })?;
            rows.push(row);
        }
        Ok(rows)
    }

    async fn put(&self, event: &StoredEvent) -> Result<()> {
        let path = self.path(&event.key)?;
        let bytes = serde_json::to_vec_pretty(event)?;
        self.write_bytes(&path, &bytes).await
    }

    async fn delete(&self, key: &str) -> Result<()> {
        let path = self.path(key)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(AppError::Io(e)),
        }
    }
}
