//! Google Chat incoming webhook client.

use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use reqwest::Client;
use std::time::Duration;
use tracing::{debug, warn};

use super::{ChatMessage, ChatNotifier, WebhookResponse};
use crate::config::Config;
use crate::error::{DigestError, Result};

const JSON_CONTENT_TYPE: &str = "application/json; charset=utf-8";

/// Posts messages to one webhook URL, reusing a single HTTP client.
#[derive(Debug, Clone)]
pub struct GoogleChatNotifier {
    url: String,
    client: Client,
}

impl GoogleChatNotifier {
    /// Creates a notifier for `url` with a per-request timeout.
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| DigestError::notify(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            url: url.into(),
            client,
        })
    }

    /// Creates a notifier from the configured webhook URL and timeout.
    pub fn from_config(config: &Config) -> Result<Self> {
        Self::new(config.chat_url.clone(), config.chat_timeout)
    }
}

#[async_trait]
impl ChatNotifier for GoogleChatNotifier {
    async fn send(&self, message: &ChatMessage) -> Result<WebhookResponse> {
        let body = message.to_json()?;

        let response = self
            .client
            .post(&self.url)
            .header(CONTENT_TYPE, JSON_CONTENT_TYPE)
            .body(body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    DigestError::notify("Webhook request timed out")
                } else if e.is_connect() {
                    DigestError::notify(format!("Failed to connect to chat webhook: {e}"))
                } else {
                    DigestError::notify(format!("Webhook request failed: {e}"))
                }
            })?;

        let status = response.status();
        let headers = response
            .headers()
            .iter()
            .map(|(name, value)| {
                (
                    name.to_string(),
                    String::from_utf8_lossy(value.as_bytes()).into_owned(),
                )
            })
            .collect();
        let body = response.text().await.unwrap_or_else(|e| {
            warn!("Failed to read webhook response body: {}", e);
            String::new()
        });

        if status.is_success() {
            debug!("Webhook responded {}", status);
        } else {
            warn!("Webhook responded {}: {}", status, body);
        }

        Ok(WebhookResponse {
            status: status.as_u16(),
            headers,
            body,
        })
    }
}
