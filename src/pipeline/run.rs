// src/pipeline/run.rs

//! One watcher run: fetch → extract → diff → maybe notify.

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::error::{Phase, Result};
use crate::models::{ChangeReport, Config};
use crate::services::{Differ, EventExtractor, Notifier, PageSource, Reporter};
use crate::storage::SnapshotStore;

/// Result of a successful run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunOutcome {
    pub report: ChangeReport,
    /// Whether a notification was sent
    pub notified: bool,
}

/// Run the full pipeline once.
///
/// `now` is taken once at run start and used both for the upcoming window
/// and for the summary-day check. Store mutations are durable before any
/// notification is attempted, including the mail credential lookup.
pub async fn run_once(
    config: &Config,
    source: &dyn PageSource,
    store: &dyn SnapshotStore,
    notifier: &dyn Notifier,
    now: DateTime<Utc>,
) -> Result<RunOutcome> {
    let body = source.fetch().await.map_err(|e| e.in_phase(Phase::Fetch))?;

    let events = EventExtractor::new(&config.extract).extract(&body);
    log::info!("Extracted {} events", events.len());

    let report = Differ::new(config.report.upcoming_days)
        .run(&events, store, now)
        .await
        .map_err(|e| e.in_phase(Phase::Diff))?;
    if !report.has_changes() {
        log::info!("Snapshot unchanged since the last run");
    }

    let reporter = Reporter::new(&config.report);
    let today = now.date_naive();
    if !reporter.should_notify(&report, today) {
        log::info!("No additions and not a summary day; skipping notification");
        return Ok(RunOutcome {
            report,
            notified: false,
        });
    }

    let message = reporter
        .message(&report, today, &config.notify.recipients)
        .map_err(|e| e.in_phase(Phase::Report))?;
    notifier
        .send(&message)
        .await
        .map_err(|e| e.in_phase(Phase::Notify))?;

    Ok(RunOutcome {
        report,
        notified: true,
    })
}

/// Structured result handed back to whatever invoked the run.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InvocationResult {
    /// 200 on success, 500 on failure
    pub status_code: u16,

    #[serde(flatten)]
    pub report: Option<ChangeReport>,

    pub notified: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    pub execution_time_ms: u64,
}

impl InvocationResult {
    pub fn from_run(result: Result<RunOutcome>, elapsed: Duration) -> Self {
        let execution_time_ms = elapsed.as_millis() as u64;
        match result {
            Ok(outcome) => Self {
                status_code: 200,
                report: Some(outcome.report),
                notified: outcome.notified,
                error: None,
                execution_time_ms,
            },
            Err(e) => Self {
                status_code: 500,
                report: None,
                notified: false,
                error: Some(e.to_string()),
                execution_time_ms,
            },
        }
    }

    pub fn is_success(&self) -> bool {
        self.status_code == 200
    }
}
