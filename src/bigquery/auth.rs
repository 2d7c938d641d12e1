//! Access tokens for the BigQuery REST API.
//!
//! Either an explicit bearer token from configuration, or one minted by the
//! metadata server of the compute environment the digest runs on.

use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

use crate::config::Config;
use crate::error::{DigestError, Result};

/// Metadata server endpoint for the default service account's token.
const METADATA_TOKEN_URL: &str =
    "http://metadata.google.internal/computeMetadata/v1/instance/service-accounts/default/token";

/// Where access tokens come from.
#[derive(Clone)]
pub enum TokenSource {
    /// A token supplied up front.
    Static(String),
    /// The metadata server at the given token URL.
    Metadata(String),
}

impl std::fmt::Debug for TokenSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Static(_) => f.write_str("Static(<redacted>)"),
            Self::Metadata(url) => f.debug_tuple("Metadata").field(url).finish(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct MetadataToken {
    access_token: String,
}

impl TokenSource {
    /// Picks the explicit token when configured, otherwise the metadata server.
    pub fn from_config(config: &Config) -> Self {
        match &config.access_token {
            Some(token) => Self::Static(token.clone()),
            None => Self::Metadata(METADATA_TOKEN_URL.to_string()),
        }
    }

    /// Resolves a bearer token.
    pub async fn token(&self, http: &Client) -> Result<String> {
        match self {
            Self::Static(token) => Ok(token.clone()),
            Self::Metadata(url) => {
                debug!("Requesting access token from metadata server");

                let response = http
                    .get(url)
                    .header("Metadata-Flavor", "Google")
                    .send()
                    .await
                    .map_err(|e| {
                        DigestError::connection(format!(
                            "Failed to reach metadata server for credentials: {e}"
                        ))
                    })?;

                let status = response.status();
                if !status.is_success() {
                    return Err(DigestError::connection(format!(
                        "Metadata server returned {status} for access token"
                    )));
                }

                let token: MetadataToken = response.json().await.map_err(|e| {
                    DigestError::connection(format!("Invalid metadata token response: {e}"))
                })?;

                Ok(token.access_token)
            }
        }
    }
}
