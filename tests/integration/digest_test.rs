//! End-to-end digest runs against the local fakes.

use axum::http::StatusCode;
use billing_digest::app::Digest;
use billing_digest::error::DigestError;
use billing_digest::report::DeliveryResult;
use chrono::NaiveDate;
use serde_json::Value;

use super::fakes::{billing_row, config, FakeBigQuery, FakeChat, FakeJob};

fn date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 3, 1).unwrap()
}

fn texts(chat: &FakeChat) -> Vec<String> {
    chat.received()
        .iter()
        .map(|post| {
            let body: Value = serde_json::from_str(&post.body).unwrap();
            body["text"].as_str().unwrap().to_string()
        })
        .collect()
}

#[tokio::test]
async fn test_one_message_per_row_in_order() {
    let bigquery = FakeBigQuery::start(FakeJob {
        rows: vec![
            billing_row("123-ABC", "proj-x", "USD", 100.0, -10.0),
            billing_row("123-ABC", "proj-y", "USD", 50.0, 0.0),
            billing_row("456-DEF", "proj-z", "EUR", 5.5, -0.25),
        ],
        page_size: 2,
        running_polls: 1,
        ..Default::default()
    })
    .await;
    let chat = FakeChat::start(StatusCode::OK).await;

    let digest = Digest::connect(config(&bigquery, &chat.url)).await.unwrap();
    let outcome = digest.run(date()).await.unwrap();

    assert!(outcome.is_success());
    assert_eq!(outcome.delivered(), 3);

    let received = chat.received();
    assert_eq!(
        received[0].body,
        r#"{"text":"*Project: proj-x* \n[Billing account: 123-ABC]\nCost: 100.00 USD , Credits applied: -10.00 USD \nTotal: 90.00 USD\n"}"#
    );

    let texts = texts(&chat);
    assert_eq!(texts.len(), 3);
    assert!(texts[1].starts_with("*Project: proj-y* \n"));
    assert!(texts[2].contains("Cost: 5.50 EUR , Credits applied: -0.25 EUR \nTotal: 5.25 EUR\n"));
}

#[tokio::test]
async fn test_no_rows_sends_nothing() {
    let bigquery = FakeBigQuery::start(FakeJob::default()).await;
    let chat = FakeChat::start(StatusCode::OK).await;

    let digest = Digest::connect(config(&bigquery, &chat.url)).await.unwrap();
    let outcome = digest.run(date()).await.unwrap();

    assert!(outcome.is_success());
    assert!(outcome.deliveries.is_empty());
    assert!(chat.received().is_empty());
}

#[tokio::test]
async fn test_failed_job_sends_nothing() {
    let bigquery = FakeBigQuery::start(FakeJob {
        rows: vec![billing_row("123-ABC", "proj-x", "USD", 1.0, 0.0)],
        error_result: Some(("notFound".to_string(), "Not found: Table p:d.t".to_string())),
        ..Default::default()
    })
    .await;
    let chat = FakeChat::start(StatusCode::OK).await;

    let digest = Digest::connect(config(&bigquery, &chat.url)).await.unwrap();
    let err = digest.run(date()).await.unwrap_err();

    assert!(matches!(err, DigestError::Query(_)));
    assert!(chat.received().is_empty());
}

#[tokio::test]
async fn test_webhook_errors_do_not_stop_the_run() {
    let bigquery = FakeBigQuery::start(FakeJob {
        rows: vec![
            billing_row("a", "p1", "USD", 2.0, 0.0),
            billing_row("a", "p2", "USD", 1.0, 0.0),
        ],
        ..Default::default()
    })
    .await;
    let chat = FakeChat::start(StatusCode::BAD_REQUEST).await;

    let digest = Digest::connect(config(&bigquery, &chat.url)).await.unwrap();
    let outcome = digest.run(date()).await.unwrap();

    assert_eq!(chat.received().len(), 2);
    assert!(outcome.is_success());
    assert!(outcome
        .deliveries
        .iter()
        .all(|d| matches!(d.result, DeliveryResult::Delivered { status: 400 })));
}

#[tokio::test]
async fn test_page_failure_interrupts_after_earlier_rows() {
    let bigquery = FakeBigQuery::start(FakeJob {
        rows: vec![
            billing_row("a", "p1", "USD", 3.0, 0.0),
            billing_row("a", "p2", "USD", 2.0, 0.0),
            billing_row("a", "p3", "USD", 1.0, 0.0),
        ],
        page_size: 2,
        fail_pages_from: Some(2),
        ..Default::default()
    })
    .await;
    let chat = FakeChat::start(StatusCode::OK).await;

    let digest = Digest::connect(config(&bigquery, &chat.url)).await.unwrap();
    let outcome = digest.run(date()).await.unwrap();

    assert_eq!(texts(&chat).len(), 2);
    assert_eq!(outcome.deliveries.len(), 2);
    assert!(!outcome.is_success());
    assert!(matches!(outcome.interrupted, Some(DigestError::RowRead(_))));
}
