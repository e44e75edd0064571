//! Error types for the sync pipeline.
//!
//! Only batch-level failures live here. Per-item rewrite and write-back
//! failures are recorded as values ([`RewriteOutcome`](crate::RewriteOutcome),
//! [`WriteFailure`](crate::WriteFailure)) and never surface as errors.

use thiserror::Error;

use coursesync_canvas::CanvasError;
use coursesync_transform::TransformError;

/// Result type alias for pipeline operations.
pub type Result<T> = std::result::Result<T, SyncError>;

/// Errors that abort a pipeline operation.
#[derive(Error, Debug)]
pub enum SyncError {
    /// Missing or invalid setting; raised before any network call.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Canvas request failed.
    #[error("canvas error: {0}")]
    Canvas(#[from] CanvasError),

    /// Transformation service failed.
    #[error("transform error: {0}")]
    Transform(#[from] TransformError),

    /// Caller broke an invariant of the write-back contract.
    #[error("contract violation: {0}")]
    ContractViolation(String),

    /// An operation needs a harvested course and there is none.
    #[error("no course loaded")]
    NoCourseLoaded,

    /// Configuration file did not parse.
    #[error("invalid config file: {0}")]
    ConfigFile(#[from] toml::de::Error),

    /// IO error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl SyncError {
    /// Whether this error is a setup or programming error rather than a
    /// failed remote call. Fatal errors are not worth retrying.
    pub fn is_fatal(&self) -> bool {
        match self {
            Self::Configuration(_)
            | Self::ContractViolation(_)
            | Self::NoCourseLoaded
            | Self::ConfigFile(_) => true,
            Self::Canvas(CanvasError::MissingSetting(_))
            | Self::Transform(TransformError::MissingSetting(_)) => true,
            Self::Canvas(_) | Self::Transform(_) | Self::Io(_) => false,
        }
    }
}
