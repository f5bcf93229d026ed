// src/error.rs

//! Unified error handling for the calendar watcher.

use std::fmt;

use thiserror::Error;

/// Result type alias for watcher operations.
pub type Result<T> = std::result::Result<T, AppError>;

/// Stage of a run in which an error surfaced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Fetch,
    Diff,
    Report,
    Notify,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Phase::Fetch => "fetch",
            Phase::Diff => "diff",
            Phase::Report => "report",
            Phase::Notify => "notify",
        };
        f.write_str(name)
    }
}

/// Unified application error type.
#[derive(Error, Debug)]
pub enum AppError {
    /// I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// HTTP request failed
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization/deserialization failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// TOML parsing failed
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    /// Calendar page answered with a non-success status
    #[error("Fetching {url} returned status {status}")]
    Fetch { url: String, status: u16 },

    /// Snapshot store read or write failed
    #[error("Store error: {0}")]
    Store(String),

    /// Notification transport failed
    #[error("Notify error: {0}")]
    Notify(String),

    /// Credential lookup failed
    #[error("Credential '{name}' unavailable: {message}")]
    Credential { name: String, message: String },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Data validation error
    #[error("Validation error: {0}")]
    Validation(String),

    /// An error annotated with the run phase it happened in
    #[error("{phase} failed: {source}")]
    Phase {
        phase: Phase,
        #[source]
        source: Box<AppError>,
    },
}

impl AppError {
    /// Create a store error.
    pub fn store(message: impl fmt::Display) -> Self {
        Self::Store(message.to_string())
    }

    /// Create a notification error.
    pub fn notify(message: impl fmt::Display) -> Self {
        Self::Notify(message.to_string())
    }

    /// Create a credential error.
    pub fn credential(name: impl Into<String>, message: impl fmt::Display) -> Self {
        Self::Credential {
            name: name.into(),
            message: message.to_string(),
        }
    }

    /// Create a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Create a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Tag this error with the phase it occurred in.
    ///
    /// Errors that already carry a phase keep the innermost one.
    pub fn in_phase(self, phase: Phase) -> Self {
        match self {
            already @ Self::Phase { .. } => already,
            other => Self::Phase {
                phase,
                source: Box::new(other),
            },
        }
    }

    /// The phase this error was tagged with, if any.
    pub fn phase(&self) -> Option<Phase> {
        match self {
            Self::Phase { phase, .. } => Some(*phase),
            _ => None,
        }
    }
}
