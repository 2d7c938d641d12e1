//! billing-digest - posts yesterday's BigQuery billing totals to Google Chat.
//!
//! This library exposes the core modules for use in integration tests.

pub mod app;
pub mod bigquery;
pub mod cli;
pub mod config;
pub mod error;
pub mod logging;
pub mod notify;
pub mod query;
pub mod report;
pub mod trigger;
