//! Chat notifications for billing-digest.
//!
//! Provides the `ChatNotifier` trait, the Google Chat webhook client and a
//! recording implementation for tests.

mod google_chat;
mod mock;

pub use google_chat::GoogleChatNotifier;
pub use mock::RecordingNotifier;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::error::Result;

/// A chat message body, posted as `{"text": "..."}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub text: String,
}

impl ChatMessage {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }

    /// Serializes the message as the webhook's JSON body.
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(self).map_err(|e| {
            crate::error::DigestError::internal(format!("Failed to serialize message: {e}"))
        })
    }
}

/// What the webhook answered. Any status, including errors, lands here.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WebhookResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: String,
}

impl WebhookResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Delivers one message per call.
///
/// A returned error means the request never got an HTTP response.
#[async_trait]
pub trait ChatNotifier: Send + Sync {
    async fn send(&self, message: &ChatMessage) -> Result<WebhookResponse>;
}

#[async_trait]
impl<T: ChatNotifier + ?Sized> ChatNotifier for Arc<T> {
    async fn send(&self, message: &ChatMessage) -> Result<WebhookResponse> {
        (**self).send(message).await
    }
}
