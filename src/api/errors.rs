//! Error types for calls against the campaign analytics API

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Campaign '{0}' not found")]
    NotFound(String),

    #[error("Campaign '{0}' already exists")]
    Conflict(String),

    #[error("Incorrect username or password")]
    InvalidCredentials,

    #[error("Not authorized: {0}")]
    Unauthorized(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("API error (status {status_code}): {message}")]
    Status {
        status_code: u16,
        message: String,
    },

    #[error("Failed to parse response from {endpoint}: {source}")]
    Decode {
        endpoint: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Request to {0} timed out")]
    Timeout(String),

    #[error("HTTP request failed: {0}")]
    Transport(#[from] reqwest::Error),
}

impl ApiError {
    /// True when the service rejected the bearer credential, so the session
    /// it came from is no longer usable.
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, ApiError::Unauthorized(_))
    }
}
