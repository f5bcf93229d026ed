//! Event records produced by extraction and kept in the snapshot.

use std::fmt::Write;

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};

/// A calendar entry as read from the source page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    /// Calendar day of the entry
    pub date: NaiveDate,

    /// Normalized display text (time and detail as written on the page)
    pub description: String,
}

impl Event {
    pub fn new(date: NaiveDate, description: impl Into<String>) -> Self {
        Self {
            date,
            description: description.into(),
        }
    }

    /// Midnight UTC at the start of the event's day.
    pub fn starts_at(&self) -> DateTime<Utc> {
        self.date.and_time(NaiveTime::MIN).and_utc()
    }

    /// Format the event for display using a template.
    ///
    /// Supported placeholders: `{date}` (rendered with `date_format`) and
    /// `{description}`.
    pub fn format(&self, template: &str, date_format: &str) -> Result<String> {
        Ok(template
            .replace("{date}", &format_date(self.date, date_format)?)
            .replace("{description}", &self.description))
    }
}

/// Render `date` with a chrono format string.
///
/// Unknown specifiers are reported as a configuration error instead of
/// panicking inside `to_string`.
pub fn format_date(date: NaiveDate, date_format: &str) -> Result<String> {
    let mut out = String::new();
    write!(out, "{}", date.format(date_format))
        .map_err(|_| AppError::config(format!("invalid date format '{date_format}'")))?;
    Ok(out)
}

/// One row of the durable snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredEvent {
    /// `YYYYMMDD_<first 8 hex chars of checksum>`
    pub key: String,

    pub date: NaiveDate,

    pub description: String,

    /// Full hex SHA-256 of the description
    pub checksum: String,
}

impl StoredEvent {
    /// The transient event this row was stored for.
    pub fn to_event(&self) -> Event {
        Event::new(self.date, self.description.clone())
    }
}

/// Net changes of one run plus the upcoming window.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangeReport {
    pub added_count: usize,
    pub added_events: Vec<Event>,
    pub deleted_count: usize,
    pub deleted_events: Vec<Event>,
    pub upcoming_events: Vec<Event>,
}

impl ChangeReport {
    /// Check if anything was added or deleted.
    pub fn has_changes(&self) -> bool {
        self.added_count > 0 || self.deleted_count > 0
    }
}
