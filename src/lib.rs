// src/lib.rs

//! Calendar watcher library.
//!
//! Fetches a public HTML calendar, extracts its events, diffs them against a
//! stored snapshot and reports additions and the upcoming weeks.

pub mod config;
pub mod error;
#[cfg(feature = "lambda")]
pub mod lambda;
pub mod models;
pub mod pipeline;
pub mod services;
pub mod storage;
