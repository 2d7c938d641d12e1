//! Google Chat webhook client tests.

use std::time::Duration;

use axum::http::StatusCode;
use billing_digest::error::DigestError;
use billing_digest::notify::{ChatMessage, ChatNotifier, GoogleChatNotifier};

use super::fakes::FakeChat;

#[tokio::test]
async fn test_posts_json_body_with_charset() {
    let chat = FakeChat::start(StatusCode::OK).await;
    let notifier = GoogleChatNotifier::new(&chat.url, Duration::from_secs(5)).unwrap();

    let response = notifier
        .send(&ChatMessage::new("*Project: proj-x* \n"))
        .await
        .unwrap();

    assert_eq!(response.status, 200);
    assert!(response.is_success());
    assert_eq!(response.body, r#"{"name":"spaces/AAA/messages/BBB"}"#);

    let received = chat.received();
    assert_eq!(received.len(), 1);
    assert_eq!(received[0].content_type, "application/json; charset=utf-8");
    assert_eq!(received[0].body, r#"{"text":"*Project: proj-x* \n"}"#);
}

#[tokio::test]
async fn test_error_status_is_a_response() {
    let chat = FakeChat::start(StatusCode::INTERNAL_SERVER_ERROR).await;
    let notifier = GoogleChatNotifier::new(&chat.url, Duration::from_secs(5)).unwrap();

    let response = notifier.send(&ChatMessage::new("hello")).await.unwrap();

    assert_eq!(response.status, 500);
    assert!(!response.is_success());
}

#[tokio::test]
async fn test_unreachable_webhook_is_notify_error() {
    // Bind and drop a listener to get a port nothing is listening on.
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let notifier =
        GoogleChatNotifier::new(format!("http://{addr}/hook"), Duration::from_secs(5)).unwrap();
    let err = notifier.send(&ChatMessage::new("hello")).await.unwrap_err();

    assert!(matches!(err, DigestError::Notify(_)));
}
