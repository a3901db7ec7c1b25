//! Walk-forward validation folds
//!
//! Each fold trains on an expanding prefix and tests on the block that
//! immediately follows it. Indices are row positions in time order, either
//! window rows or raw series observations.

use crate::error::{ForecastError, Result};
use serde::{Deserialize, Serialize};
use std::ops::Range;

/// One train/test split
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fold {
    pub train: Range<usize>,
    pub test: Range<usize>,
}

/// Expanding-window walk-forward splitter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WalkForward {
    /// Number of folds (K)
    pub splits: usize,
    /// Rows per test block (T)
    pub test_size: usize,
}

impl WalkForward {
    pub fn new(splits: usize, test_size: usize) -> Result<Self> {
        if splits == 0 || test_size == 0 {
            return Err(ForecastError::InvalidParameter(format!(
                "Walk-forward needs positive splits and test size, got K={} T={}",
                splits, test_size
            )));
        }
        Ok(Self { splits, test_size })
    }

    /// Folds over `rows` time-ordered rows.
    ///
    /// Fold `k` tests on `[R - (K-k)·T, R - (K-k-1)·T)` and trains on every
    /// row before that block.
    pub fn folds(&self, rows: usize) -> Result<Vec<Fold>> {
        let needed = self.splits * self.test_size + 1;
        if rows < needed {
            return Err(ForecastError::InsufficientData {
                needed,
                available: rows,
            });
        }

        let mut folds = Vec::with_capacity(self.splits);
        for k in 0..self.splits {
            let test_start = rows - (self.splits - k) * self.test_size;
            folds.push(Fold {
                train: 0..test_start,
                test: test_start..test_start + self.test_size,
            });
        }
        Ok(folds)
    }

    /// Mean of `score` over every fold, saturating at `f64::MAX`.
    ///
    /// The first error aborts the evaluation.
    pub fn mean_error<F>(&self, rows: usize, mut score: F) -> Result<f64>
    where
        F: FnMut(&Fold) -> Result<f64>,
    {
        let folds = self.folds(rows)?;
        let mut errors = Vec::with_capacity(folds.len());
        for fold in &folds {
            errors.push(score(fold)?);
        }
        let mean: f64 = errors.iter().map(|e| e / errors.len() as f64).sum();
        Ok(if mean.is_nan() { mean } else { mean.min(f64::MAX) })
    }
}
