//! HTTP trigger tests.

use axum::http::StatusCode;
use billing_digest::trigger;
use tokio::net::TcpListener;

use super::fakes::{billing_row, config, FakeBigQuery, FakeChat, FakeJob};

async fn start_trigger(config: billing_digest::config::Config) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        trigger::serve(listener, config).await.unwrap();
    });
    format!("http://{addr}/")
}

#[tokio::test]
async fn test_successful_run_returns_no_content() {
    let bigquery = FakeBigQuery::start(FakeJob {
        rows: vec![billing_row("a", "p1", "USD", 1.0, 0.0)],
        ..Default::default()
    })
    .await;
    let chat = FakeChat::start(StatusCode::OK).await;
    let url = start_trigger(config(&bigquery, &chat.url)).await;

    let response = reqwest::Client::new().post(&url).send().await.unwrap();

    assert_eq!(response.status(), reqwest::StatusCode::NO_CONTENT);
    assert!(response.text().await.unwrap().is_empty());
    assert_eq!(chat.received().len(), 1);
}

#[tokio::test]
async fn test_failed_query_returns_server_error() {
    let bigquery = FakeBigQuery::start(FakeJob {
        insert_status: Some(403),
        ..Default::default()
    })
    .await;
    let chat = FakeChat::start(StatusCode::OK).await;
    let url = start_trigger(config(&bigquery, &chat.url)).await;

    let response = reqwest::Client::new().get(&url).send().await.unwrap();

    assert_eq!(response.status(), reqwest::StatusCode::INTERNAL_SERVER_ERROR);
    assert!(response.text().await.unwrap().is_empty());
    assert!(chat.received().is_empty());
}
