//! Error types for generation service calls.
//!
//! All service operations return [`Result<T>`] which uses
//! [`GenerationError`] as the error type. Workers catch these errors and
//! degrade to a low-confidence response; they never abort the pipeline.

use thiserror::Error;

/// Errors that can occur when calling a generation service.
#[derive(Error, Debug)]
pub enum GenerationError {
    /// The HTTP request to the service failed.
    #[error("request failed: {0}")]
    RequestFailed(String),

    /// Authentication with the service was rejected (HTTP 401/403).
    #[error("authentication failed: {0}")]
    AuthFailed(String),

    /// The service returned a rate-limit response (HTTP 429).
    #[error("rate limited: retry after {retry_after_ms}ms")]
    RateLimited {
        /// Suggested wait time before retrying, in milliseconds.
        retry_after_ms: u64,
    },

    /// The requested model does not exist on the service.
    #[error("model not found: {0}")]
    ModelNotFound(String),

    /// The service has not been configured (e.g. missing API key).
    #[error("service not configured: {0}")]
    NotConfigured(String),

    /// The service returned a response that could not be used.
    #[error("invalid response: {0}")]
    InvalidResponse(String),

    /// The request timed out.
    #[error("timeout")]
    Timeout,

    /// An HTTP-level error from reqwest.
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// A JSON serialization/deserialization error.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

/// A convenience type alias for generation operations.
pub type Result<T> = std::result::Result<T, GenerationError>;
