//! Seasonal ARIMA models for time series forecasting
//!
//! Estimation is two-stage conditional least squares: a long autoregression
//! supplies residual estimates, then the differenced series is regressed on
//! its own regular and seasonal lags and on the lagged residuals.

use crate::error::{ForecastError, Result};
use crate::models::TrainedForecastModel;
use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};
use std::fmt;
use trade_math::differencing::{difference, difference_polynomial, integrate};
use trade_math::linalg::least_squares;

const RIDGE: f64 = 1e-8;

/// SARIMA orders `(p, d, q)(P, D, Q, s)`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SarimaParams {
    pub order: (usize, usize, usize),
    pub seasonal_order: (usize, usize, usize, usize),
}

impl SarimaParams {
    pub fn new(order: (usize, usize, usize), seasonal_order: (usize, usize, usize, usize)) -> Self {
        Self {
            order,
            seasonal_order,
        }
    }
}

impl fmt::Display for SarimaParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (p, d, q) = self.order;
        let (sp, sd, sq, s) = self.seasonal_order;
        write!(f, "SARIMA({},{},{})({},{},{},{})", p, d, q, sp, sd, sq, s)
    }
}

/// Candidate orders for the autoregressive search
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SarimaGrid {
    pub p: Vec<usize>,
    pub d: Vec<usize>,
    pub q: Vec<usize>,
    pub seasonal_p: Vec<usize>,
    pub seasonal_d: Vec<usize>,
    pub seasonal_q: Vec<usize>,
    pub period: usize,
}

impl Default for SarimaGrid {
    fn default() -> Self {
        Self {
            p: vec![0, 1, 2],
            d: vec![0, 1],
            q: vec![0, 1, 2],
            seasonal_p: vec![0, 1, 2],
            seasonal_d: vec![0, 1],
            seasonal_q: vec![0, 1, 2],
            period: 12,
        }
    }
}

impl SarimaGrid {
    /// Total number of parameter combinations
    pub fn total_combinations(&self) -> usize {
        self.p.len()
            * self.d.len()
            * self.q.len()
            * self.seasonal_p.len()
            * self.seasonal_d.len()
            * self.seasonal_q.len()
    }

    /// Every combination, `p` varying slowest
    pub fn combinations(&self) -> Vec<SarimaParams> {
        let mut combos = Vec::with_capacity(self.total_combinations());
        for &p in &self.p {
            for &d in &self.d {
                for &q in &self.q {
                    for &sp in &self.seasonal_p {
                        for &sd in &self.seasonal_d {
                            for &sq in &self.seasonal_q {
                                combos.push(SarimaParams::new((p, d, q), (sp, sd, sq, self.period)));
                            }
                        }
                    }
                }
            }
        }
        combos
    }
}

/// Unfitted seasonal ARIMA specification
#[derive(Debug, Clone)]
pub struct SeasonalArima {
    name: String,
    params: SarimaParams,
    horizon: usize,
}

/// Fitted seasonal ARIMA coefficients
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FittedSeasonalArima {
    name: String,
    params: SarimaParams,
    horizon: usize,
    /// Coefficients of the differencing operator
    poly: Vec<f64>,
    intercept: f64,
    /// (lag, coefficient) of the autoregressive terms
    ar: Vec<(usize, f64)>,
    /// (lag, coefficient) of the moving-average terms
    ma: Vec<(usize, f64)>,
}

fn lags(regular: usize, seasonal: usize, period: usize) -> Vec<usize> {
    let mut lags: Vec<usize> = (1..=regular)
        .chain((1..=seasonal).map(|k| k * period))
        .collect();
    lags.sort_unstable();
    lags.dedup();
    lags
}

impl SeasonalArima {
    /// Create a model producing blocks of `horizon` values
    pub fn new(params: SarimaParams, horizon: usize) -> Result<Self> {
        let (_, _, _, period) = params.seasonal_order;
        let (sp, sd, sq, _) = params.seasonal_order;
        if period == 0 && (sp + sd + sq) > 0 {
            return Err(ForecastError::InvalidParameter(format!(
                "{} has seasonal terms but no period",
                params
            )));
        }
        if horizon == 0 {
            return Err(ForecastError::InvalidParameter(
                "Horizon must be positive".to_string(),
            ));
        }
        Ok(Self {
            name: params.to_string(),
            params,
            horizon,
        })
    }

    pub fn params(&self) -> SarimaParams {
        self.params
    }

    /// Estimate coefficients on a series
    pub fn fit(&self, series: &[f64]) -> Result<FittedSeasonalArima> {
        let (p, d, q) = self.params.order;
        let (sp, sd, sq, period) = self.params.seasonal_order;

        let poly = difference_polynomial(d, sd, period)?;
        let w = difference(series, &poly)?;
        let ar_lags = lags(p, sp, period);
        let ma_lags = lags(q, sq, period);
        let use_intercept = d + sd == 0;
        let max_lag = ar_lags.iter().chain(&ma_lags).copied().max().unwrap_or(0);

        let (residuals, burn_in) = if ma_lags.is_empty() {
            (vec![0.0; w.len()], max_lag)
        } else {
            let long_order = (ar_lags.last().copied().unwrap_or(0) + ma_lags.last().copied().unwrap_or(0))
                .min(w.len() / 3);
            (long_ar_residuals(&w, long_order)?, max_lag.max(long_order))
        };

        let cols = usize::from(use_intercept) + ar_lags.len() + ma_lags.len();
        let rows = w.len().saturating_sub(burn_in);
        if cols > 0 && rows <= cols {
            return Err(ForecastError::ModelError(format!(
                "{} needs more than {} usable observations, have {}",
                self.name, cols, rows
            )));
        }

        let coefficients = if cols == 0 {
            Vec::new()
        } else {
            let mut design = Array2::<f64>::zeros((rows, cols));
            for (r, t) in (burn_in..w.len()).enumerate() {
                let features: Array1<f64> = std::iter::repeat(1.0)
                    .take(usize::from(use_intercept))
                    .chain(ar_lags.iter().map(|&l| w[t - l]))
                    .chain(ma_lags.iter().map(|&l| residuals[t - l]))
                    .collect();
                design.row_mut(r).assign(&features);
            }
            let target = Array1::from(w[burn_in..].to_vec());
            least_squares(&design, &target, RIDGE)?.to_vec()
        };

        if coefficients.iter().any(|c| !c.is_finite()) {
            return Err(ForecastError::ModelError(format!(
                "{} produced non-finite coefficients",
                self.name
            )));
        }

        let mut iter = coefficients.into_iter();
        let intercept = if use_intercept {
            iter.next().unwrap_or(0.0)
        } else {
            0.0
        };
        let ar = ar_lags.iter().map(|&l| (l, iter.next().unwrap_or(0.0))).collect();
        let ma = ma_lags.iter().map(|&l| (l, iter.next().unwrap_or(0.0))).collect();

        Ok(FittedSeasonalArima {
            name: self.name.clone(),
            params: self.params,
            horizon: self.horizon,
            poly,
            intercept,
            ar,
            ma,
        })
    }
}

/// Residuals of a long autoregression, zero during its burn-in
fn long_ar_residuals(w: &[f64], order: usize) -> Result<Vec<f64>> {
    if order == 0 {
        let mean = w.iter().sum::<f64>() / w.len() as f64;
        return Ok(w.iter().map(|v| v - mean).collect());
    }
    if w.len() <= 2 * order + 1 {
        return Err(ForecastError::ModelError(format!(
            "Long autoregression of order {} needs more than {} observations, have {}",
            order,
            2 * order + 1,
            w.len()
        )));
    }

    let design = Array2::from_shape_fn((w.len() - order, order + 1), |(r, c)| {
        if c == 0 {
            1.0
        } else {
            w[order + r - c]
        }
    });
    let target = Array1::from(w[order..].to_vec());
    let coef = least_squares(&design, &target, RIDGE)?;
    let fitted = design.dot(&coef);

    let mut residuals = vec![0.0; w.len()];
    for (t, f) in (order..w.len()).zip(fitted.iter()) {
        residuals[t] = w[t] - f;
    }
    Ok(residuals)
}

impl FittedSeasonalArima {
    pub fn params(&self) -> SarimaParams {
        self.params
    }

    fn order(&self) -> usize {
        self.poly.len() - 1
    }

    fn max_lag(&self) -> usize {
        self.ar.iter().chain(&self.ma).map(|(l, _)| *l).max().unwrap_or(0)
    }

    /// Observations needed before a forecast can start
    pub fn min_history(&self) -> usize {
        self.order() + self.max_lag() + 1
    }

    fn one_step(&self, w: &[f64], e: &[f64], t: usize) -> f64 {
        self.intercept
            + self.ar.iter().map(|&(l, c)| c * w[t - l]).sum::<f64>()
            + self.ma.iter().map(|&(l, c)| c * e[t - l]).sum::<f64>()
    }

    /// Differenced history and its one-step residuals
    fn differenced_state(&self, history: &[f64]) -> Result<(Vec<f64>, Vec<f64>)> {
        if history.len() < self.min_history() {
            return Err(ForecastError::InsufficientData {
                needed: self.min_history(),
                available: history.len(),
            });
        }
        let w = difference(history, &self.poly)?;
        let max_lag = self.max_lag();
        let mut e = vec![0.0; w.len()];
        for t in max_lag..w.len() {
            e[t] = w[t] - self.one_step(&w, &e, t);
        }
        Ok((w, e))
    }

    /// Forecast `steps` values continuing `history`
    pub fn forecast(&self, history: &[f64], steps: usize) -> Result<Vec<f64>> {
        let (mut w, mut e) = self.differenced_state(history)?;
        let mut future = Vec::with_capacity(steps);
        for _ in 0..steps {
            let t = w.len();
            let next = self.one_step(&w, &e, t);
            w.push(next);
            e.push(0.0);
            future.push(next);
        }
        Ok(integrate(history, &future, &self.poly)?)
    }

    /// One-step-ahead in-sample predictions in levels, one per observation.
    ///
    /// Observations without enough lags to predict are returned unchanged.
    pub fn fitted_values(&self, history: &[f64]) -> Result<Vec<f64>> {
        let (w, e) = self.differenced_state(history)?;
        let order = self.order();
        let max_lag = self.max_lag();

        Ok((0..history.len())
            .map(|t| {
                if t < order + max_lag {
                    return history[t];
                }
                let j = t - order;
                let predicted_w = w[j] - e[j];
                let carried: f64 = (1..=order).map(|k| self.poly[k] * history[t - k]).sum();
                predicted_w - carried
            })
            .collect())
    }
}

impl TrainedForecastModel for FittedSeasonalArima {
    fn predict(&self, rows: &[Vec<f64>]) -> Result<Vec<Vec<f64>>> {
        rows.iter()
            .map(|history| self.forecast(history, self.horizon))
            .collect()
    }

    fn horizon(&self) -> usize {
        self.horizon
    }

    fn name(&self) -> &str {
        &self.name
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seasonal_series(n: usize) -> Vec<f64> {
        (0..n)
            .map(|t| 100.0 + 0.5 * t as f64 + 10.0 * ((t % 12) as f64 * std::f64::consts::PI / 6.0).sin())
            .collect()
    }

    #[test]
    fn test_grid_size() {
        let grid = SarimaGrid::default();
        assert_eq!(grid.total_combinations(), 324);
        let combos = grid.combinations();
        assert_eq!(combos.len(), 324);
        assert_eq!(combos[0], SarimaParams::new((0, 0, 0), (0, 0, 0, 12)));
        assert_eq!(combos[1], SarimaParams::new((0, 0, 0), (0, 0, 1, 12)));
    }

    #[test]
    fn test_seasonal_difference_tracks_pattern() {
        let series = seasonal_series(60);
        let model = SeasonalArima::new(SarimaParams::new((1, 0, 0), (0, 1, 0, 12)), 12).unwrap();
        let fitted = model.fit(&series[..48]).unwrap();
        let forecast = fitted.forecast(&series[..48], 12).unwrap();
        assert_eq!(forecast.len(), 12);
        for (f, a) in forecast.iter().zip(&series[48..]) {
            assert!((f - a).abs() < 5.0, "forecast {} too far from {}", f, a);
        }
    }

    #[test]
    fn test_fitted_values_length() {
        let series = seasonal_series(48);
        let model = SeasonalArima::new(SarimaParams::new((1, 1, 1), (0, 0, 0, 12)), 12).unwrap();
        let fitted = model.fit(&series).unwrap();
        let values = fitted.fitted_values(&series).unwrap();
        assert_eq!(values.len(), series.len());
        assert_eq!(values[0], series[0]);
    }

    #[test]
    fn test_too_many_terms_for_short_series() {
        let series = seasonal_series(20);
        let model = SeasonalArima::new(SarimaParams::new((2, 0, 2), (2, 1, 2, 12)), 12).unwrap();
        let err = model.fit(&series).unwrap_err();
        assert!(err.is_fit_failure());
    }
}
