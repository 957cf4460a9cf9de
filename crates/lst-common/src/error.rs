//! Error types for urban-lst services.

use thiserror::Error;

/// Result type alias using LstError.
pub type LstResult<T> = Result<T, LstError>;

/// Primary error type for temperature-pipeline operations.
#[derive(Debug, Error)]
pub enum LstError {
    /// Malformed or out-of-range input: non-positive radius, zero point
    /// budget, unknown city identifier, unknown source tag. Reported to
    /// the caller immediately, never retried.
    #[error("Invalid parameter value for '{param}': {message}")]
    InvalidParameter { param: String, message: String },

    /// Failure reaching the imagery service. Within the window expander
    /// these are absorbed per attempt; only surfaced when no window
    /// could be tried at all.
    #[error("Imagery service error: {0}")]
    Service(String),

    /// Every candidate window produced zero usable statistics, typically
    /// persistent cloud cover or no satellite coverage for the region.
    #[error("No usable satellite data for windows of {windows_attempted:?} days")]
    NoData { windows_attempted: Vec<u32> },

    #[error("Configuration error: {0}")]
    Config(String),
}

impl LstError {
    /// Create an InvalidParameter error.
    pub fn invalid_parameter(param: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidParameter {
            param: param.into(),
            message: message.into(),
        }
    }

    /// Create a Service error.
    pub fn service(msg: impl Into<String>) -> Self {
        Self::Service(msg.into())
    }
}

impl From<serde_yaml::Error> for LstError {
    fn from(err: serde_yaml::Error) -> Self {
        Self::Config(err.to_string())
    }
}

impl From<std::io::Error> for LstError {
    fn from(err: std::io::Error) -> Self {
        Self::Config(err.to_string())
    }
}
