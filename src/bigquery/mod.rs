//! Analytical store abstraction for billing-digest.
//!
//! Provides a trait-based interface over BigQuery's job API, so the query executor
//! can run against the REST client in production and an in-memory store in tests.

mod auth;
mod mock;
mod rest;
mod types;

pub use auth::TokenSource;
pub use mock::{BillingRecord, FailurePoint, MockAnalyticsClient};
pub use rest::BigQueryRestClient;
pub use types::{
    JobError, JobReference, JobState, JobStatus, QueryJobRequest, QueryParameter, ResultPage,
    TableCell, TableRow,
};

use crate::error::Result;
use async_trait::async_trait;
use std::sync::Arc;

/// Trait defining the job operations the query executor needs.
///
/// All operations are async and return Results with DigestError.
#[async_trait]
pub trait AnalyticsClient: Send + Sync {
    /// Submits a query job and returns its reference without waiting for it.
    async fn submit_query(&self, request: &QueryJobRequest) -> Result<JobReference>;

    /// Fetches the current status of a job.
    async fn job_status(&self, job: &JobReference) -> Result<JobStatus>;

    /// Fetches one page of a completed job's results.
    ///
    /// `page_token` is `None` for the first page and the previous page's token afterwards.
    async fn fetch_page(&self, job: &JobReference, page_token: Option<&str>) -> Result<ResultPage>;
}

#[async_trait]
impl<T: AnalyticsClient + ?Sized> AnalyticsClient for Arc<T> {
    async fn submit_query(&self, request: &QueryJobRequest) -> Result<JobReference> {
        (**self).submit_query(request).await
    }

    async fn job_status(&self, job: &JobReference) -> Result<JobStatus> {
        (**self).job_status(job).await
    }

    async fn fetch_page(&self, job: &JobReference, page_token: Option<&str>) -> Result<ResultPage> {
        (**self).fetch_page(job, page_token).await
    }
}
