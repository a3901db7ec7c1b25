//! Lagged feature / target windows
//!
//! Every model family consumes the same geometry: a lag window of `L`
//! consecutive values as input and the `H` values that immediately follow it
//! as target. Rows start at `N mod L` so that, when the stride divides the lag,
//! the final window ends on the last observation.

use crate::error::{ForecastError, Result};
use serde::{Deserialize, Serialize};

/// Lag, horizon and stride of a pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WindowGeometry {
    /// Number of lagged values per feature row (L)
    pub lag: usize,
    /// Number of target values per row (H)
    pub horizon: usize,
    /// Distance between consecutive row starts (S)
    pub stride: usize,
}

impl Default for WindowGeometry {
    fn default() -> Self {
        Self {
            lag: 12,
            horizon: 12,
            stride: 12,
        }
    }
}

impl WindowGeometry {
    /// Create a validated geometry
    pub fn new(lag: usize, horizon: usize, stride: usize) -> Result<Self> {
        let geometry = Self {
            lag,
            horizon,
            stride,
        };
        geometry.validate()?;
        Ok(geometry)
    }

    /// Check the `1 <= S <= L` and non-empty window constraints
    pub fn validate(&self) -> Result<()> {
        if self.lag == 0 || self.horizon == 0 {
            return Err(ForecastError::InvalidParameter(format!(
                "Lag and horizon must be positive, got L={} H={}",
                self.lag, self.horizon
            )));
        }
        if self.stride == 0 || self.stride > self.lag {
            return Err(ForecastError::InvalidParameter(format!(
                "Stride must satisfy 1 <= S <= L, got S={} L={}",
                self.stride, self.lag
            )));
        }
        Ok(())
    }

    /// Minimum series length that yields one complete row
    pub fn min_len(&self) -> usize {
        self.lag + self.horizon
    }

    /// Fail with `InsufficientData` when the series cannot hold one row
    pub fn ensure_len(&self, available: usize) -> Result<()> {
        if available < self.min_len() {
            return Err(ForecastError::InsufficientData {
                needed: self.min_len(),
                available,
            });
        }
        Ok(())
    }

    /// First row start for a series of length `n`
    pub fn offset(&self, n: usize) -> usize {
        n % self.lag
    }

    /// Start index of every row for a series of length `n`
    pub fn row_starts(&self, n: usize) -> Vec<usize> {
        let span = self.min_len();
        if n < span {
            return Vec::new();
        }
        (self.offset(n)..=n - span).step_by(self.stride).collect()
    }

    /// Number of rows for a series of length `n`
    pub fn row_count(&self, n: usize) -> usize {
        let span = self.min_len();
        let offset = self.offset(n);
        if n < span + offset {
            return 0;
        }
        (n - offset - span) / self.stride + 1
    }
}

/// Feature rows (X) with their aligned target rows (Y)
#[derive(Debug, Clone, PartialEq)]
pub struct WindowPair {
    pub x: Vec<Vec<f64>>,
    pub y: Vec<Vec<f64>>,
    /// Series index where each row's lag window starts
    pub starts: Vec<usize>,
}

impl WindowPair {
    /// Number of rows
    pub fn len(&self) -> usize {
        self.x.len()
    }

    pub fn is_empty(&self) -> bool {
        self.x.is_empty()
    }

    /// Rows in `range` as a new pair
    pub fn rows(&self, range: std::ops::Range<usize>) -> WindowPair {
        WindowPair {
            x: self.x[range.clone()].to_vec(),
            y: self.y[range.clone()].to_vec(),
            starts: self.starts[range].to_vec(),
        }
    }

    /// Split off the final `test_rows` rows
    pub fn split_tail(&self, test_rows: usize) -> Result<(WindowPair, WindowPair)> {
        if test_rows >= self.len() {
            return Err(ForecastError::InsufficientData {
                needed: test_rows + 1,
                available: self.len(),
            });
        }
        let cut = self.len() - test_rows;
        Ok((self.rows(0..cut), self.rows(cut..self.len())))
    }

    /// Targets flattened in row order
    pub fn flat_targets(&self) -> Vec<f64> {
        self.y.iter().flatten().copied().collect()
    }
}

/// Builds window pairs from flat series
#[derive(Debug, Clone, Copy)]
pub struct FeatureWindower {
    geometry: WindowGeometry,
}

impl FeatureWindower {
    pub fn new(geometry: WindowGeometry) -> Result<Self> {
        geometry.validate()?;
        Ok(Self { geometry })
    }

    pub fn geometry(&self) -> WindowGeometry {
        self.geometry
    }

    /// Lag windows and targets drawn from the same series
    pub fn windows(&self, series: &[f64]) -> Result<WindowPair> {
        self.paired(series, series)
    }

    /// Lag windows drawn from `features`, targets drawn from `targets`.
    ///
    /// Both series must cover the same time span.
    pub fn paired(&self, features: &[f64], targets: &[f64]) -> Result<WindowPair> {
        if features.len() != targets.len() {
            return Err(ForecastError::DataError(format!(
                "Feature series has {} values but target series has {}",
                features.len(),
                targets.len()
            )));
        }
        let n = targets.len();
        self.geometry.ensure_len(n)?;

        let (lag, horizon) = (self.geometry.lag, self.geometry.horizon);
        let starts = self.geometry.row_starts(n);
        if starts.is_empty() {
            return Err(ForecastError::InsufficientData {
                needed: self.geometry.min_len() + self.geometry.offset(n),
                available: n,
            });
        }
        let x = starts.iter().map(|&i| features[i..i + lag].to_vec()).collect();
        let y = starts
            .iter()
            .map(|&i| targets[i + lag..i + lag + horizon].to_vec())
            .collect();

        Ok(WindowPair { x, y, starts })
    }

    /// The lag window that precedes the final `horizon` values
    pub fn validation_window<'a>(&self, series: &'a [f64]) -> Result<(&'a [f64], &'a [f64])> {
        let n = series.len();
        self.geometry.ensure_len(n)?;
        let (lag, horizon) = (self.geometry.lag, self.geometry.horizon);
        Ok((&series[n - horizon - lag..n - horizon], &series[n - horizon..]))
    }

    /// The most recent lag window
    pub fn last_window<'a>(&self, series: &'a [f64]) -> Result<&'a [f64]> {
        let n = series.len();
        if n < self.geometry.lag {
            return Err(ForecastError::InsufficientData {
                needed: self.geometry.lag,
                available: n,
            });
        }
        Ok(&series[n - self.geometry.lag..])
    }
}
