//! The daily billing aggregation query.

use chrono::NaiveDate;

use crate::bigquery::{QueryJobRequest, QueryParameter};
use crate::config::Config;

/// Maximum number of groups the query returns; lower-cost groups beyond it are dropped.
pub const MAX_GROUPS: usize = 1000;

/// Name of the bound date parameter.
pub const DATE_PARAM: &str = "date";

/// Credits per export row; rows without credits contribute zero.
const ROW_CREDITS: &str = "IFNULL((SELECT SUM(c.amount) FROM UNNEST(credits) c), 0)";

/// Per-account, per-project, per-currency totals for one partition date.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BillingQuery {
    table_path: String,
    location: String,
    date: NaiveDate,
}

impl BillingQuery {
    /// Creates the query for `date` against the configured table.
    pub fn new(config: &Config, date: NaiveDate) -> Self {
        Self {
            table_path: config.table_path(),
            location: config.location.clone(),
            date,
        }
    }

    /// Fully qualified `project.dataset.table` the query reads.
    pub fn table_path(&self) -> &str {
        &self.table_path
    }

    pub fn location(&self) -> &str {
        &self.location
    }

    pub fn date(&self) -> NaiveDate {
        self.date
    }

    /// Returns the statement text. The date is bound as `@date`, never inlined.
    pub fn sql(&self) -> String {
        format!(
            "SELECT
  billing_account_id AS billing_id,
  project.name,
  currency,
  SUM(cost) AS total_cost,
  SUM({credits}) AS total_credits,
  SUM(cost) + SUM({credits}) AS after_credits
FROM `{table}`
WHERE DATE(_PARTITIONTIME) = @{param}
GROUP BY billing_account_id, project.name, currency
ORDER BY total_cost DESC
LIMIT {limit}",
            credits = ROW_CREDITS,
            table = self.table_path,
            param = DATE_PARAM,
            limit = MAX_GROUPS,
        )
    }

    /// Builds the job request: statement, location and the `date` parameter.
    pub fn job_request(&self) -> QueryJobRequest {
        QueryJobRequest {
            sql: self.sql(),
            location: self.location.clone(),
            parameters: vec![QueryParameter::date(
                DATE_PARAM,
                self.date.format("%Y-%m-%d").to_string(),
            )],
        }
    }
}
