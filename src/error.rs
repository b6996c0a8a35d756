use chrono::{DateTime, FixedOffset};
use thiserror::Error;

/// Track cleaning error types
///
/// Rejecting an outlier fix is not an error; these are hard failures that
/// abort the whole run.
#[derive(Error, Debug)]
pub enum TrackError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Non-monotonic time at fix {index}: {current} is earlier than {previous}")]
    NonMonotonicTime {
        index: usize,
        previous: DateTime<FixedOffset>,
        current: DateTime<FixedOffset>,
    },

    #[error("Invalid parameters: {0}")]
    InvalidParameters(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type for track operations
pub type Result<T> = std::result::Result<T, TrackError>;
