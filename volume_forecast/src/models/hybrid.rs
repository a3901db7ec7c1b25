//! Two-stage hybrid: an autoregressive model whose one-step fitted values and
//! forecasts become the input windows of a kernel regression

use crate::error::Result;
use crate::models::{FittedSeasonalArima, TrainedForecastModel, TrainedKernelRegression};
use serde::{Deserialize, Serialize};
use trade_math::{MinMaxScaler, Scaler};

/// Fitted hybrid model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HybridModel {
    name: String,
    autoregressive: FittedSeasonalArima,
    regression: TrainedKernelRegression,
    /// Fitted on the series together with its auxiliary series
    scaler: MinMaxScaler,
}

impl HybridModel {
    pub fn new(
        autoregressive: FittedSeasonalArima,
        regression: TrainedKernelRegression,
        scaler: MinMaxScaler,
    ) -> Self {
        Self {
            name: format!("Hybrid[{} -> {}]", autoregressive.name(), regression.name()),
            autoregressive,
            regression,
            scaler,
        }
    }

    pub fn autoregressive(&self) -> &FittedSeasonalArima {
        &self.autoregressive
    }

    pub fn regression(&self) -> &TrainedKernelRegression {
        &self.regression
    }

    pub fn scaler(&self) -> &MinMaxScaler {
        &self.scaler
    }

    /// Auxiliary series in original units, one value per observation
    pub fn auxiliary(&self, series: &[f64]) -> Result<Vec<f64>> {
        auxiliary_series(&self.autoregressive, series, 0)
    }

    /// Scaled auxiliary series the second stage reads its windows from
    pub fn scaled_features(&self, series: &[f64]) -> Result<Vec<f64>> {
        Ok(self.scaler.transform(&self.auxiliary(series)?))
    }
}

/// In-sample fitted values of the first `len - holdout` observations followed
/// by a `holdout`-step forecast from them.
///
/// The result has the same length as `series`.
pub fn auxiliary_series(
    autoregressive: &FittedSeasonalArima,
    series: &[f64],
    holdout: usize,
) -> Result<Vec<f64>> {
    let train = &series[..series.len().saturating_sub(holdout)];
    let mut aux = autoregressive.fitted_values(train)?;
    if holdout > 0 {
        aux.extend(autoregressive.forecast(train, holdout)?);
    }
    Ok(aux)
}

impl TrainedForecastModel for HybridModel {
    /// Rows are scaled auxiliary windows
    fn predict(&self, rows: &[Vec<f64>]) -> Result<Vec<Vec<f64>>> {
        self.regression.predict(rows)
    }

    fn horizon(&self) -> usize {
        self.regression.horizon()
    }

    fn name(&self) -> &str {
        &self.name
    }
}
