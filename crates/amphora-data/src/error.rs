//! Outbound fetch error types.

use thiserror::Error;

/// Errors that can occur when performing an outbound fetch.
#[derive(Error, Debug)]
pub enum FetchError {
    /// The transport failed to send the request.
    #[error("Request failed: {0}")]
    RequestError(String),

    /// The target URL could not be resolved.
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// The server answered with an error status.
    #[error("HTTP {status}: {message}")]
    HttpError { status: u16, message: String },

    /// The response body could not be decoded.
    #[error("Failed to parse response: {0}")]
    ParseError(String),

    /// JSON serialization error.
    #[error("JSON error: {0}")]
    JsonError(String),
}

impl From<serde_json::Error> for FetchError {
    fn from(e: serde_json::Error) -> Self {
        FetchError::JsonError(e.to_string())
    }
}
