// src/services/differ.rs

//! Change detection against the stored snapshot.
//!
//! Events are identified by a content key built from the date and a hash of
//! the description, so a changed description shows up as delete + add and a
//! moved but otherwise identical entry shows up as nothing at all.
//!
//! Keys keep only 8 hex characters of the hash. Two different descriptions on
//! the same day could collide; existing stored keys depend on this width, so
//! it is left as is.

use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Duration, NaiveDate, Utc};
use sha2::{Digest, Sha256};

use crate::error::{AppError, Result};
use crate::models::{ChangeReport, Event, StoredEvent};
use crate::storage::SnapshotStore;

/// Hex characters of the checksum kept in the key.
const KEY_HASH_LEN: usize = 8;

/// Lowercase hex SHA-256 of a description.
pub fn checksum(description: &str) -> String {
    hex::encode(Sha256::digest(description.as_bytes()))
}

/// Key of a stored event: `YYYYMMDD_<first 8 hex chars of checksum>`.
pub fn event_key(date: NaiveDate, checksum: &str) -> String {
    let short = checksum.get(..KEY_HASH_LEN).unwrap_or(checksum);
    format!("{}_{}", date.format("%Y%m%d"), short)
}

/// Build the snapshot row for an event.
pub fn stored_event(event: &Event) -> StoredEvent {
    let checksum = checksum(&event.description);
    StoredEvent {
        key: event_key(event.date, &checksum),
        date: event.date,
        description: event.description.clone(),
        checksum,
    }
}

/// Computes the changeset and applies it to the store.
#[derive(Debug, Clone)]
pub struct Differ {
    upcoming_days: i64,
}

impl Differ {
    /// Create a differ whose upcoming window spans `upcoming_days`.
    pub fn new(upcoming_days: i64) -> Self {
        Self { upcoming_days }
    }

    /// End of the upcoming window starting at `now`.
    ///
    /// Fails when the window does not fit chrono's date range.
    pub fn window_end(&self, now: DateTime<Utc>) -> Result<DateTime<Utc>> {
        Duration::try_days(self.upcoming_days)
            .and_then(|window| now.checked_add_signed(window))
            .ok_or_else(|| {
                AppError::validation(format!(
                    "upcoming window of {} days from {} is out of range",
                    self.upcoming_days, now
                ))
            })
    }

    /// Whether `event` starts strictly inside `(now, now + window)`.
    pub fn is_upcoming(&self, event: &Event, now: DateTime<Utc>) -> Result<bool> {
        Ok(starts_within(event, now, self.window_end(now)?))
    }

    /// Diff `events` against the store and bring the store in line.
    ///
    /// Additions are written through one at a time, then stale rows are
    /// deleted. Any store failure aborts the run; writes made before the
    /// failure stay applied.
    pub async fn run(
        &self,
        events: &[Event],
        store: &dyn SnapshotStore,
        now: DateTime<Utc>,
    ) -> Result<ChangeReport> {
        let window_end = self.window_end(now)?;
        let existing = store.scan().await?;
        let existing_keys: HashMap<&str, &StoredEvent> =
            existing.iter().map(|row| (row.key.as_str(), row)).collect();

        let mut report = ChangeReport::default();
        let mut seen: HashSet<String> = HashSet::new();

        for event in events {
            let row = stored_event(event);

            let first_sighting = seen.insert(row.key.clone());
            if first_sighting && !existing_keys.contains_key(row.key.as_str()) {
                log::debug!("Added {}: {}", row.key, row.description);
                store.put(&row).await?;
                report.added_events.push(event.clone());
            }

            if starts_within(event, now, window_end) {
                report.upcoming_events.push(event.clone());
            }
        }

        for row in &existing {
            if !seen.contains(&row.key) {
                log::debug!("Deleted {}: {}", row.key, row.description);
                store.delete(&row.key).await?;
                report.deleted_events.push(row.to_event());
            }
        }

        report.upcoming_events.sort_by_key(|event| event.date);
        report.added_count = report.added_events.len();
        report.deleted_count = report.deleted_events.len();

        log::info!(
            "Diff: {} current, {} stored, {} added, {} deleted, {} upcoming",
            events.len(),
            existing.len(),
            report.added_count,
            report.deleted_count,
            report.upcoming_events.len()
        );

        Ok(report)
    }
}

fn starts_within(event: &Event, now: DateTime<Utc>, window_end: DateTime<Utc>) -> bool {
    let starts_at = event.starts_at();
    starts_at > now && starts_at < window_end
}

impl Default for Differ {
    fn default() -> Self {
        Self::new(60)
    }
}
