//! Parallel grid search over a model family's parameter space
//!
//! The candidate list is cut into contiguous batches, one per worker. Each
//! worker scores its batch sequentially and keeps a local best; the local
//! bests are then folded in batch order into a single winner.

use crate::error::{ForecastError, Result};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// A candidate and its mean error across folds
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrialResult<P> {
    pub params: P,
    pub error: f64,
}

// NaN never wins a comparison, so it is ranked as +inf.
fn rank_key(error: f64) -> f64 {
    if error.is_nan() {
        f64::INFINITY
    } else {
        error
    }
}

/// Strictly lower error wins; ties keep the incumbent
fn improves(candidate: f64, incumbent: Option<f64>) -> bool {
    match incumbent {
        None => true,
        Some(best) => rank_key(candidate) < rank_key(best),
    }
}

/// Size of each contiguous batch for `combinations` candidates over `workers`
pub fn batch_size(combinations: usize, workers: usize) -> usize {
    (combinations / workers.max(1)).max(1)
}

/// Search engine settings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Parallel workers; 0 uses the available parallelism
    pub workers: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self { workers: 0 }
    }
}

/// Grid search over a fixed candidate list
#[derive(Debug, Clone, Copy)]
pub struct GridSearch {
    workers: usize,
}

impl GridSearch {
    /// Search with an explicit worker count
    pub fn new(workers: usize) -> Result<Self> {
        if workers == 0 {
            return Err(ForecastError::InvalidParameter(
                "Grid search needs at least one worker".to_string(),
            ));
        }
        Ok(Self { workers })
    }

    /// Search sized from configuration
    pub fn from_config(config: &SearchConfig) -> Result<Self> {
        if config.workers > 0 {
            return Self::new(config.workers);
        }
        let available = std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1);
        Self::new(available)
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Score every candidate and return the one with the lowest error.
    ///
    /// `score` returns the mean walk-forward error for one candidate. Any
    /// error it returns aborts the whole search.
    pub fn run<P, F>(&self, candidates: &[P], score: F) -> Result<TrialResult<P>>
    where
        P: Clone + Send + Sync + std::fmt::Debug,
        F: Fn(&P) -> Result<f64> + Sync,
    {
        if candidates.is_empty() {
            return Err(ForecastError::SearchError(
                "Parameter grid is empty".to_string(),
            ));
        }

        let size = batch_size(candidates.len(), self.workers);
        let batches: Vec<&[P]> = candidates.chunks(size).collect();
        info!(
            candidates = candidates.len(),
            batches = batches.len(),
            workers = self.workers,
            "starting grid search"
        );

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.workers)
            .build()
            .map_err(|e| ForecastError::SearchError(e.to_string()))?;

        // Results come back in submission order.
        let local_bests: Vec<Result<TrialResult<P>>> = pool.install(|| {
            batches
                .par_iter()
                .map(|batch| best_in_batch(batch, &score))
                .collect()
        });

        let mut best: Option<TrialResult<P>> = None;
        for local in local_bests {
            let local = local?;
            if improves(local.error, best.as_ref().map(|b| b.error)) {
                best = Some(local);
            }
        }

        let best = best.ok_or_else(|| {
            ForecastError::SearchError("No candidate produced a result".to_string())
        })?;
        info!(error = best.error, params = ?best.params, "grid search finished");
        Ok(best)
    }
}

fn best_in_batch<P, F>(batch: &[P], score: &F) -> Result<TrialResult<P>>
where
    P: Clone + std::fmt::Debug,
    F: Fn(&P) -> Result<f64>,
{
    let mut best: Option<TrialResult<P>> = None;
    for params in batch {
        let error = score(params)?;
        debug!(?params, error, "candidate scored");
        if improves(error, best.as_ref().map(|b| b.error)) {
            best = Some(TrialResult {
                params: params.clone(),
                error,
            });
        }
    }
    best.ok_or_else(|| ForecastError::SearchError("Empty batch".to_string()))
}

/// Cartesian product of two candidate lists, first list outermost
pub fn product<A: Clone, B: Clone>(a: &[A], b: &[B]) -> Vec<(A, B)> {
    a.iter()
        .flat_map(|x| b.iter().map(move |y| (x.clone(), y.clone())))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_batch_size() {
        assert_eq!(batch_size(10, 4), 2);
        assert_eq!(batch_size(3, 8), 1);
        assert_eq!(batch_size(0, 8), 1);
        assert_eq!(batch_size(7, 0), 7);
    }

    #[test]
    fn test_nan_never_wins() {
        assert!(improves(f64::NAN, None));
        assert!(improves(1.0, Some(f64::NAN)));
        assert!(!improves(f64::NAN, Some(1.0)));
        assert!(!improves(1.0, Some(1.0)));
    }

    #[test]
    fn test_product_order() {
        let pairs = product(&[1, 2], &['a', 'b']);
        assert_eq!(pairs, vec![(1, 'a'), (1, 'b'), (2, 'a'), (2, 'b')]);
    }
}
