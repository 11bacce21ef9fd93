//! Error types for the vehicle health check.

use thiserror::Error;

/// Error taxonomy shared by the serving and training paths.
#[derive(Error, Debug)]
pub enum HealthError {
    /// A form field did not parse as a number.
    #[error("invalid {field}: {value:?} is not a number")]
    InvalidInput { field: &'static str, value: String },

    /// A fitted model was required but is absent.
    #[error("model unavailable: {0}")]
    ModelUnavailable(&'static str),

    /// A derived value cannot be used (shape mismatch, degenerate input).
    #[error("computation failed: {0}")]
    Computation(String),

    /// A CSV dataset violated its expected schema.
    #[error("dataset error: {0}")]
    Dataset(String),

    /// A serialized artifact could not be written or read back.
    #[error("artifact error: {0}")]
    Artifact(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type alias for health check operations.
pub type Result<T> = std::result::Result<T, HealthError>;
