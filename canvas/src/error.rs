//! Error types for the Canvas client.

use thiserror::Error;

/// Result type alias for Canvas operations.
pub type Result<T> = std::result::Result<T, CanvasError>;

/// Errors that can occur while talking to Canvas.
#[derive(Error, Debug)]
pub enum CanvasError {
    /// A required setting is absent or blank.
    #[error("missing required setting {0}")]
    MissingSetting(&'static str),

    /// Canvas answered with a non-2xx status.
    #[error("canvas returned {status} for {url}: {body}")]
    Upstream {
        status: u16,
        url: String,
        body: String,
    },

    /// Transport-level failure (DNS, TLS, timeout, ...).
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// A cursor or configured base URL could not be used as a request URL.
    #[error("invalid url: {0}")]
    Url(String),

    /// Response body did not decode.
    #[error("decode error: {0}")]
    Decode(#[from] serde_json::Error),

    /// A listing record lacks a field the collector needs.
    #[error("malformed record: {0}")]
    MalformedRecord(String),
}

impl CanvasError {
    /// HTTP status of an upstream rejection, if that is what this is.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Upstream { status, .. } => Some(*status),
            Self::Http(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}
