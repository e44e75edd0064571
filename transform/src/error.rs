//! Error types for transformation providers.

use thiserror::Error;

/// Result type alias for transform operations.
pub type Result<T> = std::result::Result<T, TransformError>;

/// Errors that can occur while calling a transformation service.
#[derive(Error, Debug)]
pub enum TransformError {
    /// A required setting is absent or blank.
    #[error("missing required setting {0}")]
    MissingSetting(&'static str),

    /// API request failed.
    #[error("API request failed with {status}: {body}")]
    ApiRequest { status: u16, body: String },

    /// Rate limit or quota exceeded.
    #[error("rate limit exceeded, retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    /// Invalid response from provider.
    #[error("invalid response: {0}")]
    InvalidResponse(String),

    /// Serialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// HTTP error.
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
}
