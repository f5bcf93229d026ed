// src/config.rs

//! Configuration loading utilities.
//!
//! Local runs read `config.toml` from disk (see [`Config::load_or_default`]).
//! The Lambda reads the same file from S3 and then applies environment
//! overrides.

use crate::models::Config;

#[cfg(feature = "s3")]
use crate::error::{AppError, Result};
#[cfg(feature = "s3")]
use crate::storage::S3Store;

/// Config loader for Lambda environment.
#[cfg(feature = "s3")]
pub struct LambdaConfigLoader {
    storage: S3Store,
    prefix: String,
}

#[cfg(feature = "s3")]
impl LambdaConfigLoader {
    pub fn new(storage: S3Store, config_prefix: &str) -> Self {
        Self {
            storage,
            prefix: config_prefix.trim_matches('/').to_string(),
        }
    }

    /// Load `config.toml` from S3, falling back to defaults when absent.
    pub async fn load_config(&self) -> Result<Config> {
        let key = format!("{}/config.toml", self.prefix);
        log::info!("Loading config file from S3: {}", key);

        let Some(bytes) = self.storage.read_bytes_optional(&key).await? else {
            log::warn!("Config file not found in S3: {}. Using defaults.", key);
            return Ok(Config::default());
        };

        let s = String::from_utf8(bytes).map_err(|e| {
            AppError::config(format!("Config file {} is not valid UTF-8: {}", key, e))
        })?;
        Config::from_toml(&s)
    }
}

/// Apply environment overrides on top of a loaded configuration.
///
/// - `SOURCE_URL`: calendar page URL
/// - `FETCH_TIMEOUT_SECS`: HTTP request timeout
/// - `NOTIFY_RECIPIENTS`: comma separated recipient list
/// - `S3_BUCKET`, `S3_PREFIX`: snapshot location
pub fn apply_env_overrides(config: &mut Config) {
    apply_overrides(config, |name| std::env::var(name).ok());
}

fn apply_overrides(config: &mut Config, var: impl Fn(&str) -> Option<String>) {
    if let Some(url) = var("SOURCE_URL") {
        config.source.url = url;
    }

    if let Some(timeout) = var("FETCH_TIMEOUT_SECS") {
        match timeout.parse() {
            Ok(secs) => config.source.timeout_secs = secs,
            Err(_) => log::warn!("Ignoring invalid FETCH_TIMEOUT_SECS '{}'", timeout),
        }
    }

    if let Some(recipients) = var("NOTIFY_RECIPIENTS") {
        config.notify.recipients = recipients
            .split(',')
            .map(str::trim)
            .filter(|r| !r.is_empty())
            .map(str::to_string)
            .collect();
    }

    if let Some(bucket) = var("S3_BUCKET") {
        config.storage.s3_bucket = bucket;
    }

    if let Some(prefix) = var("S3_PREFIX") {
        config.storage.s3_prefix = prefix;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn test_overrides_applied() {
        let mut config = Config::default();
        apply_overrides(
            &mut config,
            env(&[
                ("SOURCE_URL", "http://localhost:9000/kalender/"),
                ("FETCH_TIMEOUT_SECS", "5"),
                ("NOTIFY_RECIPIENTS", "a@example.org, b@example.org,,"),
            ]),
        );

        assert_eq!(config.source.url, "http://localhost:9000/kalender/");
        assert_eq!(config.source.timeout_secs, 5);
        assert_eq!(config.notify.recipients, vec!["a@example.org", "b@example.org"]);
    }

    #[test]
    fn test_storage_overrides_win_over_file() {
        let mut config = Config::from_toml(
            r#"
            [storage]
            s3_bucket = "from-file"
            s3_prefix = "file-prefix"
            "#,
        )
        .unwrap();

        apply_overrides(&mut config, env(&[]));
        assert_eq!(config.storage.s3_bucket, "from-file");
        assert_eq!(config.storage.s3_prefix, "file-prefix");

        apply_overrides(&mut config, env(&[("S3_BUCKET", "from-env")]));
        assert_eq!(config.storage.s3_bucket, "from-env");
        assert_eq!(config.storage.s3_prefix, "file-prefix");
    }

    #[test]
    fn test_invalid_timeout_ignored() {
        let mut config = Config::default();
        apply_overrides(&mut config, env(&[("FETCH_TIMEOUT_SECS", "soon")]));
        assert_eq!(config.source.timeout_secs, 30);
    }

    #[test]
    fn test_no_overrides() {
        let mut config = Config::default();
        apply_overrides(&mut config, env(&[]));
        assert_eq!(config.source.url, Config::default().source.url);
        assert!(config.notify.recipients.is_empty());
    }
}
