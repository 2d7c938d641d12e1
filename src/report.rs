//! Report formatting and outcome types.
//!
//! Turns result rows into chat messages and records what happened to each one.

use chrono::{DateTime, Days, NaiveDate, Utc};

use crate::error::DigestError;
use crate::notify::ChatMessage;
use crate::query::ResultRow;

/// Returns the day before `now`, in UTC.
pub fn report_date(now: DateTime<Utc>) -> NaiveDate {
    let today = now.date_naive();
    today.checked_sub_days(Days::new(1)).unwrap_or(today)
}

/// Formats one billing group as a chat message.
///
/// Amounts always carry two decimals; each is followed by the group's currency.
pub fn format_row(row: &ResultRow) -> ChatMessage {
    ChatMessage::new(format!(
        "*Project: {project}* \n[Billing account: {account}]\nCost: {cost:.2} {cur} , Credits applied: {credits:.2} {cur} \nTotal: {total:.2} {cur}\n",
        project = row.project_name,
        account = row.billing_account_id,
        cost = row.total_cost,
        credits = row.total_credits,
        total = row.after_credits,
        cur = row.currency,
    ))
}

/// Result of delivering one row's message.
#[derive(Debug)]
pub enum DeliveryResult {
    /// The webhook answered; non-2xx statuses are kept, not treated as failures.
    Delivered { status: u16 },
    /// The message never got a response.
    Failed { error: DigestError },
}

/// One row and what happened to its message.
#[derive(Debug)]
pub struct RowDelivery {
    pub project_name: String,
    pub billing_account_id: String,
    pub result: DeliveryResult,
}

/// Everything one invocation did after the query stage succeeded.
#[derive(Debug)]
pub struct ReportOutcome {
    /// Partition date that was reported on.
    pub date: NaiveDate,

    /// One entry per row read from the cursor, in cursor order.
    pub deliveries: Vec<RowDelivery>,

    /// Set when reading rows failed part-way; remaining rows were not processed.
    pub interrupted: Option<DigestError>,
}

impl ReportOutcome {
    pub fn new(date: NaiveDate) -> Self {
        Self {
            date,
            deliveries: Vec::new(),
            interrupted: None,
        }
    }

    /// Number of rows whose message got an HTTP response.
    pub fn delivered(&self) -> usize {
        self.deliveries
            .iter()
            .filter(|d| matches!(d.result, DeliveryResult::Delivered { .. }))
            .count()
    }

    /// Number of rows whose message failed in transport.
    pub fn failed(&self) -> usize {
        self.deliveries.len() - self.delivered()
    }

    /// True when every row was read. Per-row send failures do not count against it.
    pub fn is_success(&self) -> bool {
        self.interrupted.is_none()
    }
}
