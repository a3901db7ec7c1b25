//! Multi-output kernel ridge regression on lag windows

use crate::error::{ForecastError, Result};
use crate::models::{check_pair, ForecastModel, TrainedForecastModel};
use ndarray::Array2;
use serde::{Deserialize, Serialize};
use std::fmt;
use trade_math::kernels::{Gamma, GammaMode, Kernel, KernelKind};
use trade_math::linalg::{matrix_to_rows, rows_to_matrix, solve_multi};

/// Kernel regression hyperparameters
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct KernelParams {
    /// Inverse regularization strength
    pub c: f64,
    pub gamma: Gamma,
    pub kernel: KernelKind,
    /// Only used by the polynomial kernel
    pub degree: u32,
}

impl fmt::Display for KernelParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "KernelRegression(C={}, gamma={}, kernel={}, degree={})",
            self.c, self.gamma, self.kernel, self.degree
        )
    }
}

/// Candidate values for the regression search
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KernelGrid {
    pub c: Vec<f64>,
    pub degree: Vec<u32>,
    pub gamma: Vec<Gamma>,
    pub kernel: Vec<KernelKind>,
}

impl Default for KernelGrid {
    fn default() -> Self {
        let mut gamma: Vec<Gamma> = (0..10).map(|k| Gamma::Value(0.05 + 0.5 * k as f64)).collect();
        gamma.push(Gamma::Mode(GammaMode::Auto));
        gamma.push(Gamma::Mode(GammaMode::Scale));
        Self {
            c: vec![0.8, 0.9, 1.0, 1.1],
            degree: (2..=6).collect(),
            gamma,
            kernel: vec![
                KernelKind::Poly,
                KernelKind::Rbf,
                KernelKind::Linear,
                KernelKind::Sigmoid,
            ],
        }
    }
}

impl KernelGrid {
    pub fn total_combinations(&self) -> usize {
        self.c.len() * self.degree.len() * self.gamma.len() * self.kernel.len()
    }

    /// Every combination; `c` varies slowest and `kernel` fastest
    pub fn combinations(&self) -> Vec<KernelParams> {
        let mut combos = Vec::with_capacity(self.total_combinations());
        for &c in &self.c {
            for &degree in &self.degree {
                for &gamma in &self.gamma {
                    for &kernel in &self.kernel {
                        combos.push(KernelParams {
                            c,
                            gamma,
                            kernel,
                            degree,
                        });
                    }
                }
            }
        }
        combos
    }
}

/// Unfitted kernel regression
#[derive(Debug, Clone)]
pub struct KernelRegression {
    name: String,
    params: KernelParams,
}

impl KernelRegression {
    pub fn new(params: KernelParams) -> Result<Self> {
        if !(params.c > 0.0 && params.c.is_finite()) {
            return Err(ForecastError::InvalidParameter(format!(
                "C must be positive, got {}",
                params.c
            )));
        }
        if params.kernel == KernelKind::Poly && params.degree == 0 {
            return Err(ForecastError::InvalidParameter(
                "Polynomial degree must be positive".to_string(),
            ));
        }
        Ok(Self {
            name: params.to_string(),
            params,
        })
    }

    pub fn params(&self) -> KernelParams {
        self.params
    }
}

/// Kernel regression fitted on a set of support rows
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainedKernelRegression {
    name: String,
    kernel: Kernel,
    support: Array2<f64>,
    /// Dual coefficients, one row per support row and one column per output
    alpha: Array2<f64>,
    horizon: usize,
}

impl ForecastModel for KernelRegression {
    type Trained = TrainedKernelRegression;

    fn train(&self, x: &[Vec<f64>], y: &[Vec<f64>]) -> Result<Self::Trained> {
        check_pair(x, y)?;
        let support = rows_to_matrix(x)?;
        let targets = rows_to_matrix(y)?;

        let kernel = Kernel {
            kind: self.params.kernel,
            gamma: self.params.gamma.resolve(&support)?,
            degree: self.params.degree,
            coef0: 0.0,
        };
        let regularised = kernel.gram(&support) + Array2::<f64>::eye(support.nrows()) / self.params.c;
        let alpha = solve_multi(&regularised, &targets)?;

        if alpha.iter().any(|a| !a.is_finite()) {
            return Err(ForecastError::ModelError(format!(
                "{} produced non-finite coefficients",
                self.name
            )));
        }

        Ok(TrainedKernelRegression {
            name: self.name.clone(),
            kernel,
            horizon: targets.ncols(),
            support,
            alpha,
        })
    }

    fn name(&self) -> &str {
        &self.name
    }
}

impl TrainedKernelRegression {
    /// Width of the feature rows the model was fitted on
    pub fn lag(&self) -> usize {
        self.support.ncols()
    }
}

impl TrainedForecastModel for TrainedKernelRegression {
    fn predict(&self, rows: &[Vec<f64>]) -> Result<Vec<Vec<f64>>> {
        let lag = self.lag();
        if let Some(row) = rows.iter().find(|row| row.len() != lag) {
            return Err(ForecastError::InvalidParameter(format!(
                "Expected rows of {} values, got {}",
                lag,
                row.len()
            )));
        }
        if rows.is_empty() {
            return Ok(Vec::new());
        }
        let x = rows_to_matrix(rows)?;
        let blocks = self.kernel.cross(&x, &self.support).dot(&self.alpha);
        Ok(matrix_to_rows(&blocks))
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

    #[test]
    fn test_default_grid_size() {
        let grid = KernelGrid::default();
        assert_eq!(grid.gamma.len(), 12);
        assert_eq!(grid.total_combinations(), 4 * 5 * 12 * 4);
        assert_eq!(grid.combinations().len(), grid.total_combinations());
        assert!((grid.gamma.iter().filter_map(|g| match g {
            Gamma::Value(v) => Some(*v),
            _ => None,
        }).last().unwrap() - 4.55).abs() < 1e-12);
    }

    #[test]
    fn test_rejects_non_positive_c() {
        let params = KernelParams {
            c: 0.0,
            gamma: Gamma::Value(0.5),
            kernel: KernelKind::Rbf,
            degree: 3,
        };
        assert!(KernelRegression::new(params).is_err());
    }

    #[test]
    fn test_rbf_interpolates_training_rows() {
        let params = KernelParams {
            c: 1e6,
            gamma: Gamma::Value(1.0),
            kernel: KernelKind::Rbf,
            degree: 3,
        };
        let x = vec![vec![0.0, 0.1], vec![0.5, 0.6], vec![0.9, 1.0]];
        let y = vec![vec![0.2], vec![0.7], vec![0.1]];
        let model = KernelRegression::new(params).unwrap().train(&x, &y).unwrap();
        let predicted = model.predict(&x).unwrap();
        for (p, t) in predicted.iter().zip(&y) {
            assert!((p[0] - t[0]).abs() < 1e-3);
        }
        assert_eq!(model.horizon(), 1);
        assert!(model.predict(&[vec![0.0]]).is_err());
    }
}
