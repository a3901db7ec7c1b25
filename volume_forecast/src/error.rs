//! Error types for the volume_forecast crate

use thiserror::Error;

/// Custom error types for the volume_forecast crate
#[derive(Debug, Error)]
pub enum ForecastError {
    /// Series too short for the requested window geometry
    #[error("Insufficient data: need at least {needed} observations, have {available}")]
    InsufficientData { needed: usize, available: usize },

    /// Error related to data validation or processing
    #[error("Data error: {0}")]
    DataError(String),

    /// Error from invalid parameters
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// A model family could not be fitted with the given parameters
    #[error("Model error: {0}")]
    ModelError(String),

    /// Method name with no matching model family
    #[error("Unknown method: {0}")]
    UnknownMethod(String),

    /// No stored artifact for a dataset and method
    #[error("Model not found: {0}")]
    ModelNotFound(String),

    /// Failure of the parallel search itself
    #[error("Search error: {0}")]
    SearchError(String),

    /// Error from numeric primitives
    #[error("Math error: {0}")]
    Math(#[from] trade_math::MathError),

    /// Error from IO operations
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// Error from CSV parsing
    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),

    /// Error from artifact serialization
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    /// Error from configuration parsing
    #[error("Config error: {0}")]
    ConfigError(#[from] toml::de::Error),
}

impl ForecastError {
    /// Whether the error means a candidate could not be fitted, as opposed
    /// to a failure of the surrounding pipeline
    pub fn is_fit_failure(&self) -> bool {
        matches!(self, ForecastError::ModelError(_) | ForecastError::Math(_))
    }
}

/// Result type with our custom error
pub type Result<T> = std::result::Result<T, ForecastError>;
