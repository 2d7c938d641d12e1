//! Billing query construction and execution.
//!
//! Builds the daily aggregation statement, runs it as a job and exposes the result
//! as a forward-only cursor of typed rows.

pub mod billing;
pub mod cursor;
pub mod executor;

pub use billing::{BillingQuery, MAX_GROUPS};
pub use cursor::{ResultRow, RowCursor};
pub use executor::QueryExecutor;
