//! Error types for rank tracking operations
//!
//! None of these escape the sources: every fetch collapses its error into
//! absent fields. They exist so the fetch internals can use `?` and so the
//! logs say what went wrong.

use std::time::Duration;

use thiserror::Error;

/// Rank tracker specific errors
#[derive(Debug, Error)]
pub enum TrackerError {
    /// Network or HTTP error
    #[error("Network error: {0}")]
    Http(#[from] reqwest::Error),

    /// Upstream answered with a non-success status
    #[error("HTTP {status} from {url}")]
    Status {
        url: String,
        status: reqwest::StatusCode,
    },

    /// Request did not finish within its deadline
    #[error("Request timed out after {0:?}")]
    Timeout(Duration),

    /// Yahoo Finance API error
    #[error("Yahoo Finance error: {0}")]
    YahooFinance(String),

    /// Session cookie or crumb could not be obtained
    #[error("Authentication handshake failed: {0}")]
    Auth(String),

    /// Response body did not have the expected shape
    #[error("Parse error: {0}")]
    Parse(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Ticker could not be built from the given input
    #[error("Invalid ticker: {0:?}")]
    InvalidTicker(String),
}

impl From<serde_json::Error> for TrackerError {
    fn from(err: serde_json::Error) -> Self {
        TrackerError::Parse(err.to_string())
    }
}

/// Result type alias for rank tracker operations
pub type Result<T> = std::result::Result<T, TrackerError>;
