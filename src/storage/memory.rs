//! In-memory snapshot store.

use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;

use crate::error::{AppError, Result};
use crate::models::StoredEvent;
use crate::storage::SnapshotStore;

/// Snapshot kept in a key-ordered map; scans return rows in key order.
#[derive(Debug, Default)]
pub struct MemoryStore {
    rows: Mutex<BTreeMap<String, StoredEvent>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store pre-filled with `rows`.
    pub fn with_rows(rows: impl IntoIterator<Item = StoredEvent>) -> Self {
        let rows = rows.into_iter().map(|r| (r.key.clone(), r)).collect();
        Self {
            rows: Mutex::new(rows),
        }
    }

    /// Stored keys in order.
    pub fn keys(&self) -> Result<Vec<String>> {
        Ok(self.lock()?.keys().cloned().collect())
    }

    fn lock(&self) -> Result<MutexGuard<'_, BTreeMap<String, StoredEvent>>> {
        self.rows
            .lock()
            .map_err(|_| AppError::store("memory store lock poisoned"))
    }
}

#[async_trait]
impl SnapshotStore for MemoryStore {
    async fn scan(&self) -> Result<Vec<StoredEvent>> {
        Ok(self.lock()?.values().cloned().collect())
    }

    async fn put(&self, event: &StoredEvent) -> Result<()> {
        self.lock()?.insert(event.key.clone(), event.clone());
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<()> {
        self.lock()?.remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn row(key: &str) -> StoredEvent {
        StoredEvent {
            key: key.to_string(),
            date: NaiveDate::from_ymd_opt(2025, 3, 10).unwrap(),
            description: format!("event {key}"),
            checksum: "00".repeat(32),
        }
    }

    #[tokio::test]
    async fn test_put_scan_delete() {
        let store = MemoryStore::new();
        store.put(&row("b")).await.unwrap();
        store.put(&row("a")).await.unwrap();

        let keys: Vec<_> = store.scan().await.unwrap().into_iter().map(|r| r.key).collect();
        assert_eq!(keys, vec!["a", "b"]);

        store.delete("a").await.unwrap();
        store.delete("missing").await.unwrap();
        assert_eq!(store.keys().unwrap(), vec!["b"]);
    }

    #[tokio::test]
    async fn test_with_rows() {
        let store = MemoryStore::with_rows(vec![row("x"), row("y")]);
        assert_eq!(store.scan().await.unwrap().len(), 2);
    }
}
