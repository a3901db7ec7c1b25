//! # Trade Math
//!
//! Numeric building blocks for the trade volume forecasting models.
//! This crate provides feature scaling, small dense linear solvers,
//! kernel functions, seasonal differencing and neuron activations.

use thiserror::Error;

pub mod activation;
pub mod differencing;
pub mod kernels;
pub mod linalg;
pub mod scaling;

pub use activation::Activation;
pub use kernels::{Gamma, GammaMode, Kernel, KernelKind};
pub use scaling::{IdentityScaler, MinMaxScaler, Scaler};

/// Errors that can occur in numeric calculations
#[derive(Error, Debug)]
pub enum MathError {
    #[error("Insufficient data for calculation: {0}")]
    InsufficientData(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Calculation error: {0}")]
    CalculationError(String),

    #[error("Singular matrix: {0}")]
    SingularMatrix(String),
}

/// Result type for numeric operations
pub type Result<T> = std::result::Result<T, MathError>;
