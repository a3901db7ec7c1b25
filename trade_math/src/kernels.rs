//! Kernel functions for kernel regression

use crate::{MathError, Result};
use ndarray::{Array2, ArrayView1};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Kernel family
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KernelKind {
    Linear,
    Poly,
    Rbf,
    Sigmoid,
}

impl fmt::Display for KernelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            KernelKind::Linear => "linear",
            KernelKind::Poly => "poly",
            KernelKind::Rbf => "rbf",
            KernelKind::Sigmoid => "sigmoid",
        };
        write!(f, "{}", name)
    }
}

/// Data-derived gamma heuristics
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GammaMode {
    /// `1 / (n_features * var(X))`
    Scale,
    /// `1 / n_features`
    Auto,
}

/// Kernel coefficient, either fixed or derived from the training rows
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Gamma {
    Value(f64),
    Mode(GammaMode),
}

impl Gamma {
    /// Resolve the coefficient against training rows
    pub fn resolve(&self, rows: &Array2<f64>) -> Result<f64> {
        let n_features = rows.ncols();
        if n_features == 0 || rows.nrows() == 0 {
            return Err(MathError::InsufficientData(
                "Cannot resolve gamma without feature rows".to_string(),
            ));
        }

        match *self {
            Gamma::Value(value) if value > 0.0 && value.is_finite() => Ok(value),
            Gamma::Value(value) => Err(MathError::InvalidInput(format!(
                "Gamma must be positive, got {}",
                value
            ))),
            Gamma::Mode(GammaMode::Auto) => Ok(1.0 / n_features as f64),
            Gamma::Mode(GammaMode::Scale) => {
                let count = rows.len() as f64;
                let mean = rows.sum() / count;
                let variance = rows.mapv(|x| (x - mean).powi(2)).sum() / count;
                if variance > 0.0 {
                    Ok(1.0 / (n_features as f64 * variance))
                } else {
                    Ok(1.0)
                }
            }
        }
    }
}

impl fmt::Display for Gamma {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Gamma::Value(v) => write!(f, "{}", v),
            Gamma::Mode(GammaMode::Scale) => write!(f, "scale"),
            Gamma::Mode(GammaMode::Auto) => write!(f, "auto"),
        }
    }
}

/// A fully resolved kernel function
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Kernel {
    pub kind: KernelKind,
    pub gamma: f64,
    pub degree: u32,
    pub coef0: f64,
}

impl Kernel {
    /// Evaluate the kernel between two feature rows
    pub fn eval(&self, a: ArrayView1<f64>, b: ArrayView1<f64>) -> f64 {
        match self.kind {
            KernelKind::Linear => a.dot(&b),
            KernelKind::Poly => (self.gamma * a.dot(&b) + self.coef0).powi(self.degree as i32),
            KernelKind::Rbf => {
                let diff = &a - &b;
                (-self.gamma * diff.dot(&diff)).exp()
            }
            KernelKind::Sigmoid => (self.gamma * a.dot(&b) + self.coef0).tanh(),
        }
    }

    /// Kernel values between every row of `x` and every row of `support`
    pub fn cross(&self, x: &Array2<f64>, support: &Array2<f64>) -> Array2<f64> {
        Array2::from_shape_fn((x.nrows(), support.nrows()), |(i, j)| {
            self.eval(x.row(i), support.row(j))
        })
    }

    /// Gram matrix over a set of rows
    pub fn gram(&self, rows: &Array2<f64>) -> Array2<f64> {
        let n = rows.nrows();
        let mut k = Array2::<f64>::zeros((n, n));
        for i in 0..n {
            for j in i..n {
                let v = self.eval(rows.row(i), rows.row(j));
                k[[i, j]] = v;
                k[[j, i]] = v;
            }
        }
        k
    }
}
