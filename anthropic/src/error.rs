//! Error types for the Messages API client

use thiserror::Error;

/// Errors that can occur when calling the Messages API
///
/// Every variant is a transport-level failure: the request did not produce a
/// usable response body.
#[derive(Debug, Error)]
pub enum ClaudeError {
    /// Missing `ANTHROPIC_API_KEY` environment variable
    #[error("Missing ANTHROPIC_API_KEY environment variable")]
    MissingApiKey,

    /// HTTP request failed before a status was received
    #[error("Request failed: {0}")]
    RequestFailed(String),

    /// Response body could not be decoded
    #[error("Response parsing failed: {0}")]
    ResponseParseFailed(String),

    /// Rate limited - too many requests
    #[error("Rate limited - too many requests")]
    RateLimited,

    /// Unauthorized - invalid API key
    #[error("Unauthorized - invalid API key")]
    Unauthorized,

    /// API returned a non-success status
    #[error("API error (status {status}): {message}")]
    ApiError {
        /// HTTP status code
        status: u16,
        /// Response body
        message: String,
    },
}
