//! Feature scaling
//!
//! Models operate in a scaled space; callers only ever see values in the
//! original units. [`Scaler`] is the seam between the two.

use crate::{MathError, Result};
use serde::{Deserialize, Serialize};

/// Maps values into a model's native range and back
pub trait Scaler: Send + Sync {
    /// Map a single value into the scaled space
    fn scale(&self, value: f64) -> f64;

    /// Map a single scaled value back to original units
    fn unscale(&self, value: f64) -> f64;

    /// Scale every value of a slice
    fn transform(&self, values: &[f64]) -> Vec<f64> {
        values.iter().map(|&v| self.scale(v)).collect()
    }

    /// Undo the scaling for every value of a slice
    fn inverse_transform(&self, values: &[f64]) -> Vec<f64> {
        values.iter().map(|&v| self.unscale(v)).collect()
    }
}

/// Min-max scaler mapping the observed `[min, max]` onto a target range
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MinMaxScaler {
    range_min: f64,
    range_max: f64,
    data_min: f64,
    data_max: f64,
}

impl MinMaxScaler {
    /// Fit a scaler on the given values for the target range `[low, high]`
    pub fn fit(values: &[f64], low: f64, high: f64) -> Result<Self> {
        if values.is_empty() {
            return Err(MathError::InsufficientData(
                "Cannot fit a scaler on an empty series".to_string(),
            ));
        }
        if !(low < high) {
            return Err(MathError::InvalidInput(format!(
                "Scaler range must satisfy low < high, got [{}, {}]",
                low, high
            )));
        }
        if values.iter().any(|v| !v.is_finite()) {
            return Err(MathError::InvalidInput(
                "Cannot fit a scaler on non-finite values".to_string(),
            ));
        }

        let data_min = values.iter().copied().fold(f64::INFINITY, f64::min);
        let data_max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);

        Ok(Self {
            range_min: low,
            range_max: high,
            data_min,
            data_max,
        })
    }

    /// Scaler onto `[0, 1]`
    pub fn unit(values: &[f64]) -> Result<Self> {
        Self::fit(values, 0.0, 1.0)
    }

    /// Scaler onto `[-1, 1]`
    pub fn symmetric(values: &[f64]) -> Result<Self> {
        Self::fit(values, -1.0, 1.0)
    }

    /// Smallest value seen while fitting
    pub fn data_min(&self) -> f64 {
        self.data_min
    }

    /// Largest value seen while fitting
    pub fn data_max(&self) -> f64 {
        self.data_max
    }

    // A constant series maps onto range_min.
    fn data_span(&self) -> f64 {
        let span = self.data_max - self.data_min;
        if span == 0.0 {
            1.0
        } else {
            span
        }
    }
}

impl Scaler for MinMaxScaler {
    fn scale(&self, value: f64) -> f64 {
        self.range_min + (value - self.data_min) / self.data_span() * (self.range_max - self.range_min)
    }

    fn unscale(&self, value: f64) -> f64 {
        self.data_min + (value - self.range_min) / (self.range_max - self.range_min) * self.data_span()
    }
}

/// Pass-through scaler for models that work in original units
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct IdentityScaler;

impl Scaler for IdentityScaler {
    fn scale(&self, value: f64) -> f64 {
        value
    }

    fn unscale(&self, value: f64) -> f64 {
        value
    }
}
