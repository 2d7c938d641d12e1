//! BigQuery REST v2 client implementation.
//!
//! Implements the `AnalyticsClient` trait over `jobs.insert`, `jobs.get` and
//! `jobs.getQueryResults` using reqwest.

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::debug;

use super::types::{
    ApiErrorResponse, InsertJobBody, JobConfiguration, JobResource, QueryConfiguration,
    QueryResultsResource, WireQueryParameter,
};
use super::{
    AnalyticsClient, JobReference, JobStatus, QueryJobRequest, ResultPage, TokenSource,
};
use crate::config::Config;
use crate::error::{DigestError, Result};

/// Timeout for a single API request. Waiting for a job spans many requests.
const REQUEST_TIMEOUT_SECS: u64 = 60;

/// Maximum rows requested per result page.
const PAGE_SIZE: u32 = 500;

/// BigQuery client bound to one project and one access token.
#[derive(Debug, Clone)]
pub struct BigQueryRestClient {
    client: Client,
    base_url: String,
    project_id: String,
    token: String,
}

impl BigQueryRestClient {
    /// Creates a client and resolves its access token.
    ///
    /// Failures here are connection errors: nothing has been submitted yet.
    pub async fn connect(config: &Config) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .map_err(|e| DigestError::connection(format!("Failed to create HTTP client: {e}")))?;

        let token = TokenSource::from_config(config).token(&client).await?;

        Ok(Self::with_token(
            client,
            config.bigquery_api_url.clone(),
            config.project_id.clone(),
            token,
        ))
    }

    /// Creates a client from parts, without resolving credentials.
    pub fn with_token(
        client: Client,
        base_url: impl Into<String>,
        project_id: impl Into<String>,
        token: impl Into<String>,
    ) -> Self {
        Self {
            client,
            base_url: base_url.into(),
            project_id: project_id.into(),
            token: token.into(),
        }
    }

    fn jobs_url(&self) -> String {
        format!("{}/projects/{}/jobs", self.base_url, self.project_id)
    }

    fn job_url(&self, job: &JobReference) -> String {
        format!(
            "{}/projects/{}/jobs/{}",
            self.base_url, job.project_id, job.job_id
        )
    }

    fn results_url(&self, job: &JobReference) -> String {
        format!(
            "{}/projects/{}/queries/{}",
            self.base_url, job.project_id, job.job_id
        )
    }

    /// Sends an authorized request and decodes a successful JSON response.
    async fn send_json<T: DeserializeOwned>(&self, request: RequestBuilder, what: &str) -> Result<T> {
        let response = request
            .bearer_auth(&self.token)
            .send()
            .await
            .map_err(|e| DigestError::query(format!("{what} request failed: {e}")))?;

        let response = Self::check_status(response, what).await?;

        response
            .json()
            .await
            .map_err(|e| DigestError::query(format!("Failed to parse {what} response: {e}")))
    }

    /// Turns a non-success response into a query error carrying the API's message.
    async fn check_status(response: Response, what: &str) -> Result<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let message = match serde_json::from_str::<ApiErrorResponse>(&body) {
            Ok(err) if !err.error.message.is_empty() => err.error.message,
            _ => body,
        };

        Err(DigestError::query(format!(
            "{what} failed ({status}): {message}"
        )))
    }
}

#[async_trait]
impl AnalyticsClient for BigQueryRestClient {
    async fn submit_query(&self, request: &QueryJobRequest) -> Result<JobReference> {
        let body = InsertJobBody {
            job_reference: JobReference {
                project_id: self.project_id.clone(),
                job_id: format!("billing_digest_{}", uuid::Uuid::new_v4().simple()),
                location: Some(request.location.clone()),
            },
            configuration: JobConfiguration {
                query: QueryConfiguration {
                    query: &request.sql,
                    use_legacy_sql: false,
                    parameter_mode: "NAMED",
                    query_parameters: request
                        .parameters
                        .iter()
                        .map(WireQueryParameter::from)
                        .collect(),
                },
            },
        };

        debug!("Inserting query job {}", body.job_reference.job_id);

        let job: JobResource = self
            .send_json(self.client.post(self.jobs_url()).json(&body), "Job insert")
            .await?;

        let mut reference = job.job_reference;
        if reference.location.is_none() {
            reference.location = Some(request.location.clone());
        }
        Ok(reference)
    }

    async fn job_status(&self, job: &JobReference) -> Result<JobStatus> {
        let mut request = self.client.get(self.job_url(job));
        if let Some(location) = &job.location {
            request = request.query(&[("location", location)]);
        }

        let resource: JobResource = self.send_json(request, "Job status").await?;
        resource
            .status
            .map(JobStatus::from)
            .ok_or_else(|| DigestError::query(format!("Job {} has no status", job.job_id)))
    }

    async fn fetch_page(&self, job: &JobReference, page_token: Option<&str>) -> Result<ResultPage> {
        let mut params: Vec<(&str, String)> = vec![("maxResults", PAGE_SIZE.to_string())];
        if let Some(location) = &job.location {
            params.push(("location", location.clone()));
        }
        if let Some(token) = page_token {
            params.push(("pageToken", token.to_string()));
        }

        let request = self.client.get(self.results_url(job)).query(&params);
        let resource: QueryResultsResource = self.send_json(request, "Query results").await?;
        Ok(resource.into())
    }
}
