//! Pipeline entry points.
//!
//! - `run_once`: one complete watcher run against a page source, snapshot
//!   store and notifier

pub mod run;

pub use run::{InvocationResult, RunOutcome, run_once};
