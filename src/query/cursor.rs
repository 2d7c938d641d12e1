//! Forward-only cursor over a completed query job.

use std::collections::VecDeque;

use serde_json::Value;
use tracing::debug;

use crate::bigquery::{AnalyticsClient, JobReference, TableRow};
use crate::error::{DigestError, Result};

/// Number of columns the billing query selects.
const COLUMN_COUNT: usize = 6;

/// One aggregated billing group.
#[derive(Debug, Clone, PartialEq)]
pub struct ResultRow {
    pub billing_account_id: String,
    pub project_name: String,
    pub currency: String,
    pub total_cost: f64,
    pub total_credits: f64,
    /// `total_cost + total_credits`.
    pub after_credits: f64,
}

impl ResultRow {
    /// Decodes a REST result row in select-list order.
    ///
    /// NULL text decodes as an empty string and NULL numbers as zero; anything else
    /// that does not fit is a row read error.
    pub fn decode(row: &TableRow) -> Result<Self> {
        if row.f.len() != COLUMN_COUNT {
            return Err(DigestError::row_read(format!(
                "expected {COLUMN_COUNT} columns, got {}",
                row.f.len()
            )));
        }

        let cell = |i: usize| &row.f[i].v;

        Ok(Self {
            billing_account_id: decode_text(cell(0), "billing_id")?,
            project_name: decode_text(cell(1), "name")?,
            currency: decode_text(cell(2), "currency")?,
            total_cost: decode_number(cell(3), "total_cost")?,
            total_credits: decode_number(cell(4), "total_credits")?,
            after_credits: decode_number(cell(5), "after_credits")?,
        })
    }
}

fn decode_text(value: &Value, column: &str) -> Result<String> {
    match value {
        Value::String(s) => Ok(s.clone()),
        Value::Null => Ok(String::new()),
        Value::Number(n) => Ok(n.to_string()),
        other => Err(DigestError::row_read(format!(
            "column {column}: expected a string, got {other}"
        ))),
    }
}

fn decode_number(value: &Value, column: &str) -> Result<f64> {
    match value {
        Value::String(s) => s.parse().map_err(|_| {
            DigestError::row_read(format!("column {column}: '{s}' is not a number"))
        }),
        Value::Number(n) => n.as_f64().ok_or_else(|| {
            DigestError::row_read(format!("column {column}: {n} is out of range"))
        }),
        Value::Null => Ok(0.0),
        other => Err(DigestError::row_read(format!(
            "column {column}: expected a number, got {other}"
        ))),
    }
}

/// Lazy, forward-only sequence of result rows.
///
/// Pages are fetched on demand. `Ok(None)` marks the end of data; after an error or
/// the end, the cursor stays exhausted.
pub struct RowCursor<'a> {
    client: &'a dyn AnalyticsClient,
    job: JobReference,
    buffered: VecDeque<TableRow>,
    page_token: Option<String>,
    total_rows: Option<u64>,
    exhausted: bool,
}

impl<'a> RowCursor<'a> {
    /// Opens the cursor by fetching the first page. Failures are query errors.
    pub async fn open(client: &'a dyn AnalyticsClient, job: JobReference) -> Result<Self> {
        let page = client.fetch_page(&job, None).await?;

        if !page.job_complete {
            return Err(DigestError::query(format!(
                "Results for job {} are not available yet",
                job.job_id
            )));
        }

        debug!(
            "Opened cursor for job {} ({} rows total)",
            job.job_id,
            page.total_rows
                .map(|n| n.to_string())
                .unwrap_or_else(|| "unknown".to_string())
        );

        Ok(Self {
            client,
            job,
            buffered: page.rows.into(),
            page_token: page.page_token,
            total_rows: page.total_rows,
            exhausted: false,
        })
    }

    /// Total rows reported by the store, if known.
    pub fn total_rows(&self) -> Option<u64> {
        self.total_rows
    }

    /// Returns the next row, `Ok(None)` at the end, or a row read error.
    pub async fn next(&mut self) -> Result<Option<ResultRow>> {
        loop {
            if self.exhausted {
                return Ok(None);
            }

            if let Some(row) = self.buffered.pop_front() {
                let decoded = ResultRow::decode(&row);
                if decoded.is_err() {
                    self.exhausted = true;
                }
                return decoded.map(Some);
            }

            let Some(token) = self.page_token.take() else {
                self.exhausted = true;
                return Ok(None);
            };

            debug!("Fetching next result page for job {}", self.job.job_id);
            match self.client.fetch_page(&self.job, Some(&token)).await {
                Ok(page) => {
                    self.buffered = page.rows.into();
                    self.page_token = page.page_token;
                }
                Err(e) => {
                    self.exhausted = true;
                    return Err(match e {
                        DigestError::Query(msg) => DigestError::RowRead(msg),
                        other => DigestError::row_read(other.to_string()),
                    });
                }
            }
        }
    }
}
