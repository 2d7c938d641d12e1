//! Core orchestrator for billing-digest.
//!
//! Wires the analytical store, the query executor, the formatter and the chat
//! notifier together for one invocation.

use chrono::{DateTime, NaiveDate, Utc};
use tracing::{debug, error, info, warn};

use crate::bigquery::{AnalyticsClient, BigQueryRestClient};
use crate::config::Config;
use crate::error::Result;
use crate::notify::{ChatNotifier, GoogleChatNotifier};
use crate::query::{BillingQuery, QueryExecutor};
use crate::report::{format_row, report_date, DeliveryResult, ReportOutcome, RowDelivery};

/// Runs one invocation against the real services: yesterday's digest relative to `now`.
pub async fn invoke(config: Config, now: DateTime<Utc>) -> Result<ReportOutcome> {
    let digest = Digest::connect(config).await?;
    digest.run(report_date(now)).await
}

/// One configured digest: where to read billing data and where to post it.
pub struct Digest {
    config: Config,
    analytics: Box<dyn AnalyticsClient>,
    notifier: Box<dyn ChatNotifier>,
}

impl Digest {
    /// Creates a digest from explicit collaborators.
    pub fn new(
        config: Config,
        analytics: Box<dyn AnalyticsClient>,
        notifier: Box<dyn ChatNotifier>,
    ) -> Self {
        Self {
            config,
            analytics,
            notifier,
        }
    }

    /// Creates a digest backed by BigQuery and the configured Google Chat webhook.
    pub async fn connect(config: Config) -> Result<Self> {
        let analytics = BigQueryRestClient::connect(&config).await?;
        let notifier = GoogleChatNotifier::from_config(&config)?;
        Ok(Self::new(config, Box::new(analytics), Box::new(notifier)))
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Reports on `date`: one message per result row, in result order.
    ///
    /// Query stage failures are returned as errors before any message is sent. Once
    /// rows are flowing, a failed send is recorded on its row and the next row is
    /// processed; a failed row read stops the loop and is recorded on the outcome.
    pub async fn run(&self, date: NaiveDate) -> Result<ReportOutcome> {
        let query = BillingQuery::new(&self.config, date);
        let executor = QueryExecutor::new(self.analytics.as_ref(), self.config.poll_interval);
        let mut cursor = executor.execute(&query).await?;

        let mut outcome = ReportOutcome::new(date);

        loop {
            let row = match cursor.next().await {
                Ok(Some(row)) => row,
                Ok(None) => break,
                Err(e) => {
                    error!("Reading query results failed: {}", e);
                    outcome.interrupted = Some(e);
                    break;
                }
            };

            let message = format_row(&row);
            let result = match self.notifier.send(&message).await {
                Ok(response) => {
                    info!(
                        "Posted {} [{}]: {}",
                        row.project_name, row.billing_account_id, response.status
                    );
                    debug!("Webhook headers: {:?}", response.headers);
                    debug!("Webhook body: {}", response.body);
                    DeliveryResult::Delivered {
                        status: response.status,
                    }
                }
                Err(e) => {
                    warn!(
                        "Posting {} [{}] failed: {}",
                        row.project_name, row.billing_account_id, e
                    );
                    DeliveryResult::Failed { error: e }
                }
            };

            outcome.deliveries.push(RowDelivery {
                project_name: row.project_name,
                billing_account_id: row.billing_account_id,
                result,
            });
        }

        info!(
            "Digest for {}: {} rows, {} posted, {} failed",
            date,
            outcome.deliveries.len(),
            outcome.delivered(),
            outcome.failed()
        );

        Ok(outcome)
    }
}
