//! Error types for PID weight lookup

use thiserror::Error;

/// PID weights error type
///
/// Only malformed input and contract violations are errors. Missing or
/// out-of-range calibration is reported as an absent value, never as an `Error`.
#[derive(Error, Debug)]
pub enum Error {
    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON parsing error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Validation error (malformed calibration input)
    #[error("Validation error: {0}")]
    Validation(String),

    /// A value column was requested that was never supplied at build time
    #[error("Unregistered column: '{column}'")]
    UnregisteredColumn {
        /// Requested column name
        column: String,
    },
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;
