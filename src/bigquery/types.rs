//! BigQuery job types.
//!
//! Wire structures follow the REST v2 `jobs` and `jobs.getQueryResults` resources.
//! Only the fields billing-digest reads or writes are modeled.

use serde::{Deserialize, Serialize};

/// A parameterized standard-SQL query to run as a job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryJobRequest {
    /// Statement text.
    pub sql: String,

    /// Execution location (region or multi-region).
    pub location: String,

    /// Named parameters bound to the statement.
    pub parameters: Vec<QueryParameter>,
}

impl QueryJobRequest {
    /// Returns the value bound to the named parameter, if any.
    pub fn parameter(&self, name: &str) -> Option<&str> {
        self.parameters
            .iter()
            .find(|p| p.name == name)
            .map(|p| p.value.as_str())
    }
}

/// A named, scalar query parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryParameter {
    /// Parameter name, referenced as `@name` in the statement.
    pub name: String,

    /// BigQuery type name (e.g. "DATE", "STRING").
    pub type_name: String,

    /// Value in BigQuery's canonical text form.
    pub value: String,
}

impl QueryParameter {
    /// Creates a DATE parameter from a `YYYY-MM-DD` value.
    pub fn date(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            type_name: "DATE".to_string(),
            value: value.into(),
        }
    }
}

/// Identifies a submitted job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobReference {
    pub project_id: String,
    #[serde(default)]
    pub job_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
}

/// Lifecycle state of a job.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobState {
    Pending,
    Running,
    Done,
}

impl JobState {
    /// Parses the REST `status.state` value. Unknown states are treated as running.
    pub fn parse(s: &str) -> Self {
        match s {
            "PENDING" => Self::Pending,
            "DONE" => Self::Done,
            _ => Self::Running,
        }
    }

    /// Returns true once the job can no longer change state.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done)
    }
}

/// Status of a job at one point in time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobStatus {
    pub state: JobState,

    /// Set when a `DONE` job failed as a whole.
    pub error: Option<JobError>,
}

impl JobStatus {
    pub fn running() -> Self {
        Self {
            state: JobState::Running,
            error: None,
        }
    }

    pub fn done() -> Self {
        Self {
            state: JobState::Done,
            error: None,
        }
    }

    pub fn failed(error: JobError) -> Self {
        Self {
            state: JobState::Done,
            error: Some(error),
        }
    }
}

/// A job-level error result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobError {
    #[serde(default)]
    pub reason: String,
    #[serde(default)]
    pub message: String,
}

impl std::fmt::Display for JobError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.reason.is_empty() {
            write!(f, "{}", self.message)
        } else {
            write!(f, "{} ({})", self.message, self.reason)
        }
    }
}

/// One page of query results.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResultPage {
    /// False when results were requested before the job finished.
    pub job_complete: bool,

    /// Total rows in the result set, when reported.
    pub total_rows: Option<u64>,

    /// Rows in this page.
    pub rows: Vec<TableRow>,

    /// Token for the next page; `None` on the last page.
    pub page_token: Option<String>,
}

/// A result row as returned by the REST API: `{"f": [{"v": ...}, ...]}`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TableRow {
    #[serde(default)]
    pub f: Vec<TableCell>,
}

impl TableRow {
    /// Builds a row from cell values.
    pub fn from_values(values: impl IntoIterator<Item = serde_json::Value>) -> Self {
        Self {
            f: values.into_iter().map(|v| TableCell { v }).collect(),
        }
    }
}

/// A single cell. Scalars arrive as strings; NULL arrives as JSON null.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TableCell {
    #[serde(default)]
    pub v: serde_json::Value,
}

// REST request/response bodies

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct InsertJobBody<'a> {
    pub job_reference: JobReference,
    pub configuration: JobConfiguration<'a>,
}

#[derive(Debug, Serialize)]
pub(crate) struct JobConfiguration<'a> {
    pub query: QueryConfiguration<'a>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct QueryConfiguration<'a> {
    pub query: &'a str,
    pub use_legacy_sql: bool,
    pub parameter_mode: &'static str,
    pub query_parameters: Vec<WireQueryParameter<'a>>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct WireQueryParameter<'a> {
    pub name: &'a str,
    pub parameter_type: WireParameterType<'a>,
    pub parameter_value: WireParameterValue<'a>,
}

#[derive(Debug, Serialize)]
pub(crate) struct WireParameterType<'a> {
    #[serde(rename = "type")]
    pub type_name: &'a str,
}

#[derive(Debug, Serialize)]
pub(crate) struct WireParameterValue<'a> {
    pub value: &'a str,
}

impl<'a> From<&'a QueryParameter> for WireQueryParameter<'a> {
    fn from(p: &'a QueryParameter) -> Self {
        Self {
            name: &p.name,
            parameter_type: WireParameterType {
                type_name: &p.type_name,
            },
            parameter_value: WireParameterValue { value: &p.value },
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct JobResource {
    pub job_reference: JobReference,
    #[serde(default)]
    pub status: Option<JobStatusResource>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct JobStatusResource {
    #[serde(default)]
    pub state: String,
    #[serde(default)]
    pub error_result: Option<JobError>,
}

impl From<JobStatusResource> for JobStatus {
    fn from(s: JobStatusResource) -> Self {
        Self {
            state: JobState::parse(&s.state),
            error: s.error_result,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct QueryResultsResource {
    #[serde(default)]
    pub job_complete: bool,
    #[serde(default)]
    pub total_rows: Option<String>,
    #[serde(default)]
    pub rows: Vec<TableRow>,
    #[serde(default)]
    pub page_token: Option<String>,
}

impl From<QueryResultsResource> for ResultPage {
    fn from(r: QueryResultsResource) -> Self {
        Self {
            job_complete: r.job_complete,
            total_rows: r.total_rows.and_then(|t| t.parse().ok()),
            rows: r.rows,
            page_token: r.page_token.filter(|t| !t.is_empty()),
        }
    }
}

/// Error envelope returned by Google APIs.
#[derive(Debug, Deserialize)]
pub(crate) struct ApiErrorResponse {
    pub error: ApiErrorDetail,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ApiErrorDetail {
    #[serde(default)]
    pub message: String,
}
