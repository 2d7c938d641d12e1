//! Error types for billing-digest.
//!
//! Defines the main error enum used throughout the pipeline.

use thiserror::Error;

/// Main error type for billing-digest operations.
#[derive(Error, Debug)]
pub enum DigestError {
    /// Missing or invalid configuration (unset environment variables, bad URLs, etc.)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Analytical store setup errors (HTTP client, access token, etc.)
    #[error("Connection error: {0}")]
    Connection(String),

    /// Query stage errors (job submission, wait, job status, cursor open)
    #[error("Query error: {0}")]
    Query(String),

    /// Mid-stream cursor failures (page fetch, row decoding)
    #[error("Row read error: {0}")]
    RowRead(String),

    /// Chat webhook transport errors (connection refused, DNS, timeout)
    #[error("Notification error: {0}")]
    Notify(String),

    /// Internal application errors (unexpected states, bugs, etc.)
    #[error("Internal error: {0}")]
    Internal(String),
}

impl DigestError {
    /// Creates a configuration error with the given message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Creates a connection error with the given message.
    pub fn connection(msg: impl Into<String>) -> Self {
        Self::Connection(msg.into())
    }

    /// Creates a query error with the given message.
    pub fn query(msg: impl Into<String>) -> Self {
        Self::Query(msg.into())
    }

    /// Creates a row read error with the given message.
    pub fn row_read(msg: impl Into<String>) -> Self {
        Self::RowRead(msg.into())
    }

    /// Creates a notification error with the given message.
    pub fn notify(msg: impl Into<String>) -> Self {
        Self::Notify(msg.into())
    }

    /// Creates an internal error with the given message.
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// Returns the error category as a string for display purposes.
    pub fn category(&self) -> &'static str {
        match self {
            Self::Config(_) => "Configuration Error",
            Self::Connection(_) => "Connection Error",
            Self::Query(_) => "Query Error",
            Self::RowRead(_) => "Row Read Error",
            Self::Notify(_) => "Notification Error",
            Self::Internal(_) => "Internal Error",
        }
    }
}

/// Result type alias using DigestError.
pub type Result<T> = std::result::Result<T, DigestError>;
