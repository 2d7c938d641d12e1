//! Configuration management for billing-digest.
//!
//! All settings come from the process environment. The five target identifiers are
//! required; the remaining settings tune the HTTP clients and have defaults.

use crate::error::{DigestError, Result};
use std::time::Duration;
use url::Url;

/// Required environment variables, in the order they are reported when missing.
pub const REQUIRED_VARS: [&str; 5] = [
    "PROJECT_ID",
    "DATASET",
    "BQ_TABLE_NAME",
    "LOCATION",
    "GOOGLE_CHAT_URL",
];

/// Default BigQuery REST endpoint.
pub const DEFAULT_BIGQUERY_API_URL: &str = "https://bigquery.googleapis.com/bigquery/v2";

/// Default interval between job status polls.
const DEFAULT_POLL_INTERVAL_MS: u64 = 1000;

/// Default timeout for a single webhook POST.
const DEFAULT_CHAT_TIMEOUT_SECS: u64 = 30;

/// Resolved configuration for one invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Project that owns the billing export and runs the query job.
    pub project_id: String,

    /// Dataset holding the billing export table.
    pub dataset: String,

    /// Billing export table name.
    pub table_name: String,

    /// Query execution location (e.g. "US", "EU", "europe-west1").
    pub location: String,

    /// Google Chat incoming webhook URL.
    pub chat_url: String,

    /// BigQuery REST API base URL.
    pub bigquery_api_url: String,

    /// Explicit bearer token; when `None` the metadata server is asked.
    pub access_token: Option<String>,

    /// How often to poll the query job while waiting for it to finish.
    pub poll_interval: Duration,

    /// Timeout for each webhook POST.
    pub chat_timeout: Duration,
}

impl Config {
    /// Resolves configuration from the process environment.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Resolves configuration through `lookup`, which returns the raw value of a variable.
    ///
    /// Every required variable is checked before returning, so the error names all of
    /// the missing ones at once. Blank values count as missing.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let mut missing: Vec<&str> = Vec::new();
        let mut require = |key: &'static str| {
            get(key).unwrap_or_else(|| {
                missing.push(key);
                String::new()
            })
        };

        let [project_id, dataset, table_name, location, chat_url] = REQUIRED_VARS.map(&mut require);

        if !missing.is_empty() {
            return Err(DigestError::config(format!(
                "{} environment variable{} must be set",
                missing.join(", "),
                if missing.len() == 1 { "" } else { "s" }
            )));
        }

        validate_http_url("GOOGLE_CHAT_URL", &chat_url)?;

        let bigquery_api_url = get("BIGQUERY_API_URL")
            .unwrap_or_else(|| DEFAULT_BIGQUERY_API_URL.to_string())
            .trim_end_matches('/')
            .to_string();
        validate_http_url("BIGQUERY_API_URL", &bigquery_api_url)?;

        let poll_interval = Duration::from_millis(parse_number(
            "JOB_POLL_INTERVAL_MS",
            get("JOB_POLL_INTERVAL_MS"),
            DEFAULT_POLL_INTERVAL_MS,
        )?);
        let chat_timeout = Duration::from_secs(parse_number(
            "CHAT_TIMEOUT_SECS",
            get("CHAT_TIMEOUT_SECS"),
            DEFAULT_CHAT_TIMEOUT_SECS,
        )?);

        Ok(Self {
            project_id,
            dataset,
            table_name,
            location,
            chat_url,
            bigquery_api_url,
            access_token: get("BIGQUERY_ACCESS_TOKEN"),
            poll_interval,
            chat_timeout,
        })
    }

    /// Returns the fully qualified `project.dataset.table` identifier.
    pub fn table_path(&self) -> String {
        format!("{}.{}.{}", self.project_id, self.dataset, self.table_name)
    }
}

fn validate_http_url(name: &str, value: &str) -> Result<()> {
    let url = Url::parse(value)
        .map_err(|e| DigestError::config(format!("{name} is not a valid URL: {e}")))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(DigestError::config(format!(
            "Invalid scheme '{}' in {name}. Expected 'http' or 'https'",
            url.scheme()
        )));
    }

    Ok(())
}

fn parse_number(name: &str, value: Option<String>, default: u64) -> Result<u64> {
    match value {
        Some(raw) => raw
            .parse()
            .map_err(|_| DigestError::config(format!("{name} must be a number, got '{raw}'"))),
        None => Ok(default),
    }
}

#[cfg(test)]
impl Config {
    /// Configuration matching PROJECT_ID=p, DATASET=d, BQ_TABLE_NAME=t, LOCATION=US.
    pub(crate) fn sample() -> Self {
        Self::from_lookup(|key| {
            let value = match key {
                "PROJECT_ID" => "p",
                "DATASET" => "d",
                "BQ_TABLE_NAME" => "t",
                "LOCATION" => "US",
                "GOOGLE_CHAT_URL" => "https://chat.example/hook",
                _ => return None,
            };
            Some(value.to_string())
        })
        .expect("sample configuration is complete")
    }
}
