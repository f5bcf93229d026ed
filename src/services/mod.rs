//! Service layer for the calendar watcher.
//!
//! This module contains the business logic for:
//! - Page retrieval (`CalendarFetcher`)
//! - Event extraction (`EventExtractor`) and text normalization
//! - Change detection (`Differ`)
//! - Report rendering (`Reporter`) and delivery (`Notifier`)

pub mod credentials;
pub mod differ;
pub mod extract;
pub mod fetch;
pub mod normalize;
pub mod notify;
pub mod report;

pub use credentials::{CredentialProvider, EnvCredentials, StaticCredentials};
pub use differ::Differ;
pub use extract::{EventExtractor, MarkupNode};
pub use fetch::{CalendarFetcher, FileSource, PageSource};
pub use normalize::normalize;
pub use notify::{HttpMailer, LogNotifier, Message, Notifier};
pub use report::Reporter;
