//! AWS S3 snapshot store.
//!
//! Every snapshot row is its own object:
//! `{bucket}/{prefix}/events/{key}.json`. A scan lists the prefix and reads
//! each object. The same client also serves the configuration files kept
//! under `{prefix}/config/`.

use aws_sdk_s3::Client;
use aws_sdk_s3::primitives::ByteStream;
use async_trait::async_trait;

use crate::error::{AppError, Result};
use crate::models::StoredEvent;
use crate::storage::SnapshotStore;

/// S3-based snapshot store.
#[derive(Clone)]
pub struct S3Store {
    client: Client,
    bucket: String,
    prefix: String,
}

impl S3Store {
    /// Create a new S3 store instance.
    pub fn new(client: Client, bucket: impl Into<String>, prefix: impl Into<String>) -> Self {
        Self {
            client,
            bucket: bucket.into(),
            prefix: prefix.into().trim_matches('/').to_string(),
        }
    }

    /// Create S3 store from environment configuration.
    ///
    /// `S3_BUCKET` and `S3_PREFIX` override the given defaults.
    pub async fn from_env(default_bucket: &str, default_prefix: &str) -> Result<Self> {
        let config = aws_config::load_defaults(aws_config::BehaviorVersion::latest()).await;
        let client = Client::new(&config);

        let bucket = std::env::var("S3_BUCKET").unwrap_or_else(|_| default_bucket.to_string());
        let prefix = std::env::var("S3_PREFIX").unwrap_or_else(|_| default_prefix.to_string());

        Ok(Self::new(client, bucket, prefix))
    }

    /// Same client, different bucket and prefix.
    pub fn relocated(&self, bucket: impl Into<String>, prefix: impl Into<String>) -> Self {
        Self::new(self.client.clone(), bucket, prefix)
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    fn events_prefix(&self) -> String {
        if self.prefix.is_empty() {
            "events/".to_string()
        } else {
            format!("{}/events/", self.prefix)
        }
    }

    fn object_key(&self, key: &str) -> String {
        format!("{}{}.json", self.events_prefix(), key)
    }

    /// Read an object, returning None if it doesn't exist.
    pub async fn read_bytes_optional(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let result = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await;

        match result {
            Ok(output) => {
                let bytes = output
                    .body
                    .collect()
                    .await
                    .map_err(|e| AppError::store(format!("reading s3://{}/{}: {}", self.bucket, key, e)))?;
                Ok(Some(bytes.into_bytes().to_vec()))
            }
            Err(err) => {
                let service_err = err.into_service_error();
                if service_err.is_no_such_key() {
                    log::info!("No object at s3://{}/{}", self.bucket, key);
                    Ok(None)
                } else {
                    Err(AppError::store(service_err))
                }
            }
        }
    }

    /// List all object keys under the events prefix.
    async fn list_event_objects(&self) -> Result<Vec<String>> {
        let mut keys = Vec::new();
        let mut continuation: Option<String> = None;

        loop {
            let output = self
                .client
                .list_objects_v2()
                .bucket(&self.bucket)
                .prefix(self.events_prefix())
                .set_continuation_token(continuation.take())
                .send()
                .await
                .map_err(|e| AppError::store(e.into_service_error()))?;

            keys.extend(
                output
                    .contents()
                    .iter()
                    .filter_map(|object| object.key())
                    .filter(|key| key.ends_with(".json"))
                    .map(str::to_string),
            );

            match output.next_continuation_token() {
                Some(token) if output.is_truncated().unwrap_or(false) => {
                    continuation = Some(token.to_string());
                }
                _ => break,
            }
        }

        Ok(keys)
    }
}

#[async_trait]
impl SnapshotStore for S3Store {
    async fn scan(&self) -> Result<Vec<StoredEvent>> {
        let object_keys = self.list_event_objects().await?;

        let mut rows = Vec::with_capacity(object_keys.len());
        for object_key in object_keys {
            // Listed objects can vanish before they are read.
            let Some(bytes) = self.read_bytes_optional(&object_key).await? else {
                continue;
            };
            let row: StoredEvent = serde_json::from_slice(&bytes).map_err(|e| {
                AppError::store(format!("corrupt snapshot row {}: {}", object_key, e))
            })?;
            rows.push(row);
        }

        log::info!(
            "Scanned {} snapshot rows from s3://{}/{}",
            rows.len(),
            self.bucket,
            self.events_prefix()
        );
        Ok(rows)
    }

    async fn put(&self, event: &StoredEvent) -> Result<()> {
        let key = self.object_key(&event.key);
        let json = serde_json::to_vec_pretty(event)?;

        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(&key)
            .body(ByteStream::from(json))
            .content_type("application/json")
            .send()
            .await
            .map_err(|e| AppError::store(e.into_service_error()))?;

        log::debug!("Wrote s3://{}/{}", self.bucket, key);
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<()> {
        let key = self.object_key(key);

        self.client
            .delete_object()
            .bucket(&self.bucket)
            .key(&key)
            .send()
            .await
            .map_err(|e| AppError::store(e.into_service_error()))?;

        log::debug!("Deleted s3://{}/{}", self.bucket, key);
        Ok(())
    }
}
