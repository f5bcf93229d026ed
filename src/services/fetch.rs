// src/services/fetch.rs

//! Calendar page retrieval.

use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;

use crate::error::{AppError, Result};
use crate::models::SourceConfig;

/// Something that yields the raw calendar markup.
#[async_trait]
pub trait PageSource: Send + Sync {
    async fn fetch(&self) -> Result<Vec<u8>>;
}

/// Fetches the calendar page over HTTP with a fixed identity.
pub struct CalendarFetcher {
    client: Client,
    url: String,
}

impl CalendarFetcher {
    /// Create a fetcher with the configured user agent and timeout.
    pub fn new(config: &SourceConfig) -> Result<Self> {
        let client = Client::builder()
            .user_agent(&config.user_agent)
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            url: config.url.clone(),
        })
    }
}

#[async_trait]
impl PageSource for CalendarFetcher {
    async fn fetch(&self) -> Result<Vec<u8>> {
        let response = self.client.get(&self.url).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(AppError::Fetch {
                url: self.url.clone(),
                status: status.as_u16(),
            });
        }

        let body = response.bytes().await?;
        log::info!("Fetched {} bytes from {}", body.len(), self.url);
        Ok(body.to_vec())
    }
}

/// Reads the calendar markup from a saved file.
pub struct FileSource {
    path: PathBuf,
}

impl FileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl PageSource for FileSource {
    async fn fetch(&self) -> Result<Vec<u8>> {
        let body = tokio::fs::read(&self.path).await?;
        log::info!("Read {} bytes from {}", body.len(), self.path.display());
        Ok(body)
    }
}
