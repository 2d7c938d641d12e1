//! In-memory analytical store for testing.
//!
//! Holds raw billing export records and answers the digest query by applying the
//! same filter, grouping, credit summing, ordering and limit the SQL statement does.
//! Failures can be injected at each stage of the job protocol.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::NaiveDate;
use serde_json::Value;

use super::{
    AnalyticsClient, JobError, JobReference, JobStatus, QueryJobRequest, ResultPage, TableRow,
};
use crate::error::{DigestError, Result};
use crate::query::MAX_GROUPS;

/// One raw row of the billing export.
#[derive(Debug, Clone, PartialEq)]
pub struct BillingRecord {
    pub billing_account_id: String,
    pub project_name: Option<String>,
    pub currency: String,
    pub cost: f64,
    /// Amounts of the row's `credits` array; often empty.
    pub credits: Vec<f64>,
    pub partition_date: NaiveDate,
}

impl BillingRecord {
    /// Creates a record with no credits.
    pub fn new(
        billing_account_id: impl Into<String>,
        project_name: impl Into<String>,
        currency: impl Into<String>,
        cost: f64,
        partition_date: NaiveDate,
    ) -> Self {
        Self {
            billing_account_id: billing_account_id.into(),
            project_name: Some(project_name.into()),
            currency: currency.into(),
            cost,
            credits: Vec::new(),
            partition_date,
        }
    }

    /// Appends a credit amount.
    pub fn with_credit(mut self, amount: f64) -> Self {
        self.credits.push(amount);
        self
    }

    /// Clears the project name, as for charges not tied to a project.
    pub fn without_project(mut self) -> Self {
        self.project_name = None;
        self
    }
}

/// Stage at which the mock fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailurePoint {
    /// `submit_query` returns an error.
    Submit,
    /// `job_status` returns an error.
    Wait,
    /// The job finishes with an error result.
    JobError,
    /// The first page cannot be fetched.
    OpenCursor,
    /// Any page starting at or beyond this row offset cannot be fetched.
    PageAt(usize),
    /// The row at this offset is returned with a missing column.
    MalformedRow(usize),
}

#[derive(Debug, Default)]
struct MockState {
    submitted: Vec<QueryJobRequest>,
    results: HashMap<String, Vec<TableRow>>,
    status_calls: usize,
}

/// A mock analytical store that answers the billing query from in-memory records.
#[derive(Debug)]
pub struct MockAnalyticsClient {
    records: Vec<BillingRecord>,
    page_size: usize,
    running_polls: usize,
    failure: Option<FailurePoint>,
    next_job: AtomicUsize,
    state: Mutex<MockState>,
}

impl MockAnalyticsClient {
    /// Creates a mock over the given records.
    pub fn new(records: Vec<BillingRecord>) -> Self {
        Self {
            records,
            page_size: 100,
            running_polls: 0,
            failure: None,
            next_job: AtomicUsize::new(1),
            state: Mutex::new(MockState::default()),
        }
    }

    /// Sets how many rows each result page carries.
    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    /// Reports the job as running for this many status polls before it is done.
    pub fn with_running_polls(mut self, polls: usize) -> Self {
        self.running_polls = polls;
        self
    }

    /// Injects a failure.
    pub fn failing_at(mut self, failure: FailurePoint) -> Self {
        self.failure = Some(failure);
        self
    }

    /// Returns the requests submitted so far.
    pub fn submitted(&self) -> Vec<QueryJobRequest> {
        self.lock().submitted.clone()
    }

    /// Returns how many times job status was polled.
    pub fn status_calls(&self) -> usize {
        self.lock().status_calls
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Evaluates the billing aggregation for one partition date.
    fn aggregate(&self, date: NaiveDate) -> Vec<TableRow> {
        type Key<'a> = (&'a str, Option<&'a str>, &'a str);

        let mut order: Vec<Key<'_>> = Vec::new();
        let mut sums: HashMap<Key<'_>, (f64, f64)> = HashMap::new();

        for record in self.records.iter().filter(|r| r.partition_date == date) {
            let key = (
                record.billing_account_id.as_str(),
                record.project_name.as_deref(),
                record.currency.as_str(),
            );
            let entry = sums.entry(key).or_insert_with(|| {
                order.push(key);
                (0.0, 0.0)
            });
            entry.0 += record.cost;
            entry.1 += record.credits.iter().sum::<f64>();
        }

        let mut groups: Vec<(Key<'_>, f64, f64)> = order
            .into_iter()
            .map(|key| {
                let (cost, credits) = sums[&key];
                (key, cost, credits)
            })
            .collect();
        groups.sort_by(|a, b| b.1.total_cmp(&a.1));
        groups.truncate(MAX_GROUPS);

        groups
            .into_iter()
            .map(|((account, project, currency), cost, credits)| {
                TableRow::from_values([
                    Value::from(account),
                    project.map(Value::from).unwrap_or(Value::Null),
                    Value::from(currency),
                    Value::from(cost.to_string()),
                    Value::from(credits.to_string()),
                    Value::from((cost + credits).to_string()),
                ])
            })
            .collect()
    }
}

#[async_trait]
impl AnalyticsClient for MockAnalyticsClient {
    async fn submit_query(&self, request: &QueryJobRequest) -> Result<JobReference> {
        if self.failure == Some(FailurePoint::Submit) {
            return Err(DigestError::query("Access Denied: mock submit failure"));
        }

        let date = request
            .parameter("date")
            .and_then(|d| NaiveDate::parse_from_str(d, "%Y-%m-%d").ok())
            .ok_or_else(|| DigestError::query("Query parameter 'date' is missing or invalid"))?;

        let job_id = format!("mock_job_{}", self.next_job.fetch_add(1, Ordering::SeqCst));
        let rows = self.aggregate(date);

        let mut state = self.lock();
        state.submitted.push(request.clone());
        state.results.insert(job_id.clone(), rows);

        Ok(JobReference {
            project_id: "mock-project".to_string(),
            job_id,
            location: Some(request.location.clone()),
        })
    }

    async fn job_status(&self, _job: &JobReference) -> Result<JobStatus> {
        if self.failure == Some(FailurePoint::Wait) {
            return Err(DigestError::query("Job status request failed: mock wait failure"));
        }

        let mut state = self.lock();
        state.status_calls += 1;
        if state.status_calls <= self.running_polls {
            return Ok(JobStatus::running());
        }

        if self.failure == Some(FailurePoint::JobError) {
            return Ok(JobStatus::failed(JobError {
                reason: "invalidQuery".to_string(),
                message: "Unrecognized name: _PARTITIONTIME".to_string(),
            }));
        }

        Ok(JobStatus::done())
    }

    async fn fetch_page(&self, job: &JobReference, page_token: Option<&str>) -> Result<ResultPage> {
        let offset = match page_token {
            None => 0,
            Some(token) => token
                .parse::<usize>()
                .map_err(|_| DigestError::query(format!("Invalid page token '{token}'")))?,
        };

        match self.failure {
            Some(FailurePoint::OpenCursor) if page_token.is_none() => {
                return Err(DigestError::query("Query results failed: mock cursor failure"));
            }
            Some(FailurePoint::PageAt(at)) if offset >= at => {
                return Err(DigestError::query("Query results failed: mock page failure"));
            }
            _ => {}
        }

        let state = self.lock();
        let rows = state
            .results
            .get(&job.job_id)
            .ok_or_else(|| DigestError::query(format!("Not found: Job {}", job.job_id)))?;

        let end = (offset + self.page_size).min(rows.len());
        let mut page_rows: Vec<TableRow> = rows.get(offset..end).unwrap_or_default().to_vec();

        if let Some(FailurePoint::MalformedRow(at)) = self.failure {
            if (offset..end).contains(&at) {
                page_rows[at - offset].f.pop();
            }
        }

        Ok(ResultPage {
            job_complete: true,
            total_rows: Some(rows.len() as u64),
            rows: page_rows,
            page_token: (end < rows.len()).then(|| end.to_string()),
        })
    }
}
