// src/models/mod.rs

//! Domain models for the calendar watcher.

mod config;
mod event;

// Re-export all public types
pub use config::{
    Config, ExtractConfig, LoggingConfig, NotifyConfig, ReportConfig, SourceConfig,
    StorageConfig,
};
pub use event::{ChangeReport, Event, StoredEvent, format_date};
