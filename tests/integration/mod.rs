//! Integration tests for billing-digest.
//!
//! These run the real HTTP clients against local fakes of the BigQuery REST API
//! and a chat webhook, so no cloud credentials are needed.

pub mod bigquery_rest_test;
pub mod digest_test;
pub mod trigger_test;
pub mod webhook_test;
