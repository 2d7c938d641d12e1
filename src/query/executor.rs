//! Query execution against the analytical store.
//!
//! Runs the billing query through the full job protocol (submit, wait, status check,
//! cursor open) so it can be tested independently of the orchestrator.

use std::time::{Duration, Instant};

use tracing::{debug, info};

use super::{BillingQuery, RowCursor};
use crate::bigquery::{AnalyticsClient, JobReference, JobStatus};
use crate::error::{DigestError, Result};

/// Query executor that submits jobs and waits for them to finish.
pub struct QueryExecutor<'a> {
    client: &'a dyn AnalyticsClient,
    poll_interval: Duration,
}

impl<'a> QueryExecutor<'a> {
    /// Creates a new query executor.
    pub fn new(client: &'a dyn AnalyticsClient, poll_interval: Duration) -> Self {
        Self {
            client,
            poll_interval,
        }
    }

    /// Runs the query and returns a cursor over its result.
    ///
    /// Any failure before the cursor is open is returned as an error and no row is
    /// produced.
    pub async fn execute(&self, query: &BillingQuery) -> Result<RowCursor<'a>> {
        info!(
            "Querying {} in {} for {}",
            query.table_path(),
            query.location(),
            query.date()
        );

        let start = Instant::now();
        let job = self.client.submit_query(&query.job_request()).await?;
        let status = self.wait(&job).await?;

        if let Some(error) = status.error {
            return Err(DigestError::query(format!(
                "Job {} failed: {error}",
                job.job_id
            )));
        }

        debug!("Job {} finished in {:?}", job.job_id, start.elapsed());
        RowCursor::open(self.client, job).await
    }

    /// Polls the job until it reaches a terminal state. There is no overall timeout.
    async fn wait(&self, job: &JobReference) -> Result<JobStatus> {
        loop {
            let status = self.client.job_status(job).await?;
            if status.state.is_terminal() {
                return Ok(status);
            }

            debug!(
                "Job {} is {:?}, checking again in {:?}",
                job.job_id, status.state, self.poll_interval
            );
            tokio::time::sleep(self.poll_interval).await;
        }
    }
}
