// src/lambda/mod.rs

//! AWS Lambda handler for the calendar watcher.
//!
//! Each scheduled invocation:
//! 1. Loads `config.toml` from S3 (or defaults) and applies env overrides
//! 2. Fetches and extracts the calendar page
//! 3. Diffs against the S3 snapshot and applies the changes
//! 4. Sends the report mail when there are additions or on the summary day
//!
//! ## Environment Variables
//!
//! - `S3_BUCKET`, `S3_PREFIX`: location of the config file and snapshot
//! - `CONFIG_S3_PREFIX`: location of `config.toml` (default `{S3_PREFIX}/config`)
//! - `SOURCE_URL`, `FETCH_TIMEOUT_SECS`, `NOTIFY_RECIPIENTS`: config overrides
//!
//! The snapshot lives at `storage.s3_bucket` / `storage.s3_prefix` from
//! `config.toml`; `S3_BUCKET` and `S3_PREFIX` take precedence when set.
//! - `MAIL_API_TOKEN`: mail API token (name follows `notify.credential_name`)
//! - `RUST_LOG`: log level

use chrono::Utc;
use lambda_runtime::{Error as LambdaError, LambdaEvent};
use serde_json::Value;
use tracing::{error, info, instrument};

use crate::config::{LambdaConfigLoader, apply_env_overrides};
use crate::error::Result;
use crate::models::Config;
use crate::pipeline::{InvocationResult, RunOutcome, run_once};
use crate::services::{CalendarFetcher, EnvCredentials, HttpMailer};
use crate::storage::S3Store;

/// Main Lambda handler function.
///
/// Failures are reported in the returned payload, not as Lambda errors, so
/// the scheduler simply retries on its next tick.
#[instrument(skip(event))]
pub async fn handler(event: LambdaEvent<Value>) -> std::result::Result<InvocationResult, LambdaError> {
    let start = std::time::Instant::now();
    info!("Handling event: {:?}", event.payload);

    let result = InvocationResult::from_run(run_lambda().await, start.elapsed());
    match &result.error {
        None => info!(
            "Run completed in {}ms (notified: {})",
            result.execution_time_ms, result.notified
        ),
        Some(message) => error!("Run failed: {}", message),
    }

    Ok(result)
}

/// Internal run logic for the Lambda environment.
async fn run_lambda() -> Result<RunOutcome> {
    let defaults = Config::default();
    let bootstrap =
        S3Store::from_env(&defaults.storage.s3_bucket, &defaults.storage.s3_prefix).await?;

    let config_prefix = std::env::var("CONFIG_S3_PREFIX").unwrap_or_else(|_| {
        let trimmed = bootstrap.prefix().trim_matches('/');
        if trimmed.is_empty() {
            "config".to_string()
        } else {
            format!("{}/config", trimmed)
        }
    });

    let mut config = LambdaConfigLoader::new(bootstrap.clone(), &config_prefix)
        .load_config()
        .await?;
    apply_env_overrides(&mut config);
    config.validate()?;

    let store = bootstrap.relocated(&config.storage.s3_bucket, &config.storage.s3_prefix);
    info!(
        "Snapshot store: s3://{}/{}",
        config.storage.s3_bucket, config.storage.s3_prefix
    );

    let fetcher = CalendarFetcher::new(&config.source)?;
    let mailer = HttpMailer::new(&config.notify, EnvCredentials)?;

    let now = Utc::now();
    let outcome = run_once(&config, &fetcher, &store, &mailer, now).await?;

    info!(
        "Report: {} added, {} deleted, {} upcoming",
        outcome.report.added_count,
        outcome.report.deleted_count,
        outcome.report.upcoming_events.len()
    );
    Ok(outcome)
}
