//! Metrics for evaluating forecast performance
//!
//! The scalar functions return `NaN` for empty or mismatched inputs so they can
//! be used inline; [`evaluate_forecast`] validates its inputs and returns a
//! `Result`.

use crate::error::{ForecastError, Result};
use serde::{Deserialize, Serialize};
use tracing::warn;

const MAPE_EPSILON: f64 = f64::EPSILON;

fn comparable(actual: &[f64], predicted: &[f64]) -> bool {
    !actual.is_empty() && actual.len() == predicted.len()
}

/// Mean Absolute Error
pub fn mean_absolute_error(actual: &[f64], predicted: &[f64]) -> f64 {
    if !comparable(actual, predicted) {
        return f64::NAN;
    }
    let n = actual.len() as f64;
    actual
        .iter()
        .zip(predicted)
        .map(|(a, p)| (a - p).abs() / n)
        .sum()
}

/// Mean Squared Error
pub fn mean_squared_error(actual: &[f64], predicted: &[f64]) -> f64 {
    if !comparable(actual, predicted) {
        return f64::NAN;
    }
    let n = actual.len() as f64;
    actual
        .iter()
        .zip(predicted)
        .map(|(a, p)| (a - p).powi(2))
        .sum::<f64>()
        / n
}

/// Root Mean Squared Error
pub fn root_mean_squared_error(actual: &[f64], predicted: &[f64]) -> f64 {
    mean_squared_error(actual, predicted).sqrt()
}

/// Mean Absolute Percentage Error as a fraction (0.1 means 10%)
pub fn mean_absolute_percentage_error(actual: &[f64], predicted: &[f64]) -> f64 {
    if !comparable(actual, predicted) {
        return f64::NAN;
    }
    let n = actual.len() as f64;
    actual
        .iter()
        .zip(predicted)
        .map(|(a, p)| (a - p).abs() / a.abs().max(MAPE_EPSILON))
        .sum::<f64>()
        / n
}

/// Coefficient of determination; `NaN` when the actual values are constant
pub fn r_squared(actual: &[f64], predicted: &[f64]) -> f64 {
    if !comparable(actual, predicted) {
        return f64::NAN;
    }
    let n = actual.len() as f64;
    let mean = actual.iter().sum::<f64>() / n;
    let ss_tot: f64 = actual.iter().map(|a| (a - mean).powi(2)).sum();
    if ss_tot == 0.0 {
        return f64::NAN;
    }
    let ss_res: f64 = actual
        .iter()
        .zip(predicted)
        .map(|(a, p)| (a - p).powi(2))
        .sum();
    1.0 - ss_res / ss_tot
}

/// Replace every non-finite forecast value with the largest finite `f64`
pub fn sanitize_forecast(predicted: &[f64]) -> Vec<f64> {
    predicted
        .iter()
        .map(|&v| if v.is_finite() { v } else { f64::MAX })
        .collect()
}

/// MAE used for ranking candidates.
///
/// Non-finite forecast values are replaced with `f64::MAX` first, so a failed
/// fit produces a huge but comparable error instead of `NaN`. The error
/// saturates at `f64::MAX` rather than overflowing to infinity.
pub fn ranking_error(actual: &[f64], predicted: &[f64]) -> f64 {
    if predicted.iter().any(|v| !v.is_finite()) {
        warn!("non-finite forecast values replaced with the maximal error sentinel");
        return mean_absolute_error(actual, &sanitize_forecast(predicted)).min(f64::MAX);
    }
    mean_absolute_error(actual, predicted)
}

/// Error metrics for forecast evaluation
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ErrorMetrics {
    /// Mean Absolute Error
    pub mae: f64,
    /// Root Mean Squared Error
    pub rmse: f64,
    /// Mean Absolute Percentage Error (fraction)
    pub mape: f64,
    /// Coefficient of determination
    pub r2: f64,
}

impl std::fmt::Display for ErrorMetrics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "MAE {:.4}  RMSE {:.4}  MAPE {:.4}  R2 {:.4}",
            self.mae, self.rmse, self.mape, self.r2
        )
    }
}

/// Evaluate forecast accuracy against actual values
pub fn evaluate_forecast(predicted: &[f64], actual: &[f64]) -> Result<ErrorMetrics> {
    if !comparable(actual, predicted) {
        return Err(ForecastError::DataError(format!(
            "Forecast ({}) and actual ({}) values must have the same non-zero length",
            predicted.len(),
            actual.len()
        )));
    }

    Ok(ErrorMetrics {
        mae: mean_absolute_error(actual, predicted),
        rmse: root_mean_squared_error(actual, predicted),
        mape: mean_absolute_percentage_error(actual, predicted),
        r2: r_squared(actual, predicted),
    })
}
