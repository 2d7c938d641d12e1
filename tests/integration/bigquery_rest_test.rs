//! BigQuery REST client tests.
//!
//! Exercises the job protocol over HTTP: insert, status polling and paging.

use std::time::Duration;

use billing_digest::bigquery::{AnalyticsClient, BigQueryRestClient, JobState};
use billing_digest::error::DigestError;
use billing_digest::query::{BillingQuery, QueryExecutor};
use chrono::NaiveDate;
use reqwest::Client;

use super::fakes::{billing_row, config, FakeBigQuery, FakeJob};

fn client(bigquery: &FakeBigQuery) -> BigQueryRestClient {
    BigQueryRestClient::with_token(Client::new(), bigquery.base_url.clone(), "p", "test-token")
}

fn query(bigquery: &FakeBigQuery) -> BillingQuery {
    let config = config(bigquery, "https://chat.example/hook");
    BillingQuery::new(&config, NaiveDate::from_ymd_opt(2024, 3, 1).unwrap())
}

#[tokio::test]
async fn test_insert_sends_named_date_parameter() {
    let bigquery = FakeBigQuery::start(FakeJob::default()).await;
    let client = client(&bigquery);

    let job = client
        .submit_query(&query(&bigquery).job_request())
        .await
        .unwrap();

    assert_eq!(job.project_id, "p");
    assert!(job.job_id.starts_with("billing_digest_"));
    assert_eq!(job.location.as_deref(), Some("US"));

    let inserted = bigquery.inserted();
    assert_eq!(inserted.len(), 1);
    let config = &inserted[0]["configuration"]["query"];
    assert_eq!(config["useLegacySql"], false);
    assert_eq!(config["parameterMode"], "NAMED");
    assert_eq!(config["queryParameters"][0]["name"], "date");
    assert_eq!(config["queryParameters"][0]["parameterType"]["type"], "DATE");
    assert_eq!(
        config["queryParameters"][0]["parameterValue"]["value"],
        "2024-03-01"
    );
    assert!(config["query"]
        .as_str()
        .unwrap()
        .contains("FROM `p.d.t`"));
    assert_eq!(inserted[0]["jobReference"]["location"], "US");

    assert_eq!(bigquery.authorizations(), vec!["Bearer test-token"]);
}

#[tokio::test]
async fn test_insert_error_carries_api_message() {
    let bigquery = FakeBigQuery::start(FakeJob {
        insert_status: Some(403),
        ..Default::default()
    })
    .await;

    let err = client(&bigquery)
        .submit_query(&query(&bigquery).job_request())
        .await
        .unwrap_err();

    assert!(matches!(err, DigestError::Query(_)));
    assert!(err.to_string().contains("Access Denied: Project p"));
}

#[tokio::test]
async fn test_status_reports_running_then_done() {
    let bigquery = FakeBigQuery::start(FakeJob {
        running_polls: 1,
        ..Default::default()
    })
    .await;
    let client = client(&bigquery);
    let job = client
        .submit_query(&query(&bigquery).job_request())
        .await
        .unwrap();

    assert_eq!(client.job_status(&job).await.unwrap().state, JobState::Running);
    assert_eq!(client.job_status(&job).await.unwrap().state, JobState::Done);
}

#[tokio::test]
async fn test_executor_pages_through_results() {
    let rows = (0..5)
        .map(|i| billing_row("acct", &format!("p{i}"), "USD", 100.0 - i as f64, 0.0))
        .collect();
    let bigquery = FakeBigQuery::start(FakeJob {
        rows,
        page_size: 2,
        running_polls: 2,
        ..Default::default()
    })
    .await;
    let client = client(&bigquery);
    let executor = QueryExecutor::new(&client, Duration::from_millis(5));

    let mut cursor = executor.execute(&query(&bigquery)).await.unwrap();
    let mut names = Vec::new();
    while let Some(row) = cursor.next().await.unwrap() {
        names.push(row.project_name);
    }

    assert_eq!(names, vec!["p0", "p1", "p2", "p3", "p4"]);
    assert_eq!(bigquery.status_polls(), 3);

    let pages = bigquery.page_requests();
    assert_eq!(pages.len(), 3);
    assert_eq!(pages[0].get("pageToken"), None);
    assert_eq!(pages[0].get("location").map(String::as_str), Some("US"));
    assert_eq!(pages[1].get("pageToken").map(String::as_str), Some("2"));
    assert_eq!(pages[2].get("pageToken").map(String::as_str), Some("4"));
}

#[tokio::test]
async fn test_job_error_result_fails_query() {
    let bigquery = FakeBigQuery::start(FakeJob {
        rows: vec![billing_row("acct", "p", "USD", 1.0, 0.0)],
        error_result: Some((
            "invalidQuery".to_string(),
            "Unrecognized name: credits".to_string(),
        )),
        ..Default::default()
    })
    .await;
    let client = client(&bigquery);
    let executor = QueryExecutor::new(&client, Duration::from_millis(5));

    let err = executor.execute(&query(&bigquery)).await.err().unwrap();

    assert!(matches!(err, DigestError::Query(_)));
    assert!(err.to_string().contains("Unrecognized name: credits"));
    assert!(bigquery.page_requests().is_empty());
}

#[tokio::test]
async fn test_failed_later_page_is_row_read_error() {
    let rows = (0..4)
        .map(|i| billing_row("acct", &format!("p{i}"), "USD", 10.0 - i as f64, 0.0))
        .collect();
    let bigquery = FakeBigQuery::start(FakeJob {
        rows,
        page_size: 2,
        fail_pages_from: Some(2),
        ..Default::default()
    })
    .await;
    let client = client(&bigquery);
    let executor = QueryExecutor::new(&client, Duration::from_millis(5));

    let mut cursor = executor.execute(&query(&bigquery)).await.unwrap();
    assert!(cursor.next().await.unwrap().is_some());
    assert!(cursor.next().await.unwrap().is_some());

    let err = cursor.next().await.unwrap_err();
    assert!(matches!(err, DigestError::RowRead(_)));
    assert!(err.to_string().contains("Backend error"));
}
