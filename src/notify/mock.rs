//! Recording notifier for testing.
//!
//! Captures every message it is asked to send, in order, and can fail chosen calls
//! the way an unreachable webhook would.

use std::collections::HashSet;
use std::sync::Mutex;

use async_trait::async_trait;

use super::{ChatMessage, ChatNotifier, WebhookResponse};
use crate::error::{DigestError, Result};

/// A notifier that records messages instead of posting them.
#[derive(Debug)]
pub struct RecordingNotifier {
    sent: Mutex<Vec<ChatMessage>>,
    failing_calls: HashSet<usize>,
    status: u16,
}

impl RecordingNotifier {
    /// Creates a notifier that answers every message with 200.
    pub fn new() -> Self {
        Self {
            sent: Mutex::new(Vec::new()),
            failing_calls: HashSet::new(),
            status: 200,
        }
    }

    /// Fails the given zero-based calls with a transport error.
    ///
    /// Failed calls are still recorded as attempts.
    pub fn failing_calls(mut self, calls: impl IntoIterator<Item = usize>) -> Self {
        self.failing_calls.extend(calls);
        self
    }

    /// Answers every message with `status`.
    pub fn with_status(mut self, status: u16) -> Self {
        self.status = status;
        self
    }

    /// Returns every attempted message, in call order.
    pub fn sent(&self) -> Vec<ChatMessage> {
        self.sent.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }
}

impl Default for RecordingNotifier {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ChatNotifier for RecordingNotifier {
    async fn send(&self, message: &ChatMessage) -> Result<WebhookResponse> {
        let call = {
            let mut sent = self.sent.lock().unwrap_or_else(|e| e.into_inner());
            sent.push(message.clone());
            sent.len() - 1
        };

        if self.failing_calls.contains(&call) {
            return Err(DigestError::notify("Failed to connect to chat webhook"));
        }

        Ok(WebhookResponse {
            status: self.status,
            headers: vec![("content-type".to_string(), "application/json".to_string())],
            body: "{}".to_string(),
        })
    }
}
