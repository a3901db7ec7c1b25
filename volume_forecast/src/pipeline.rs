//! Per-dataset training runs
//!
//! The four families are trained in a fixed order; the hybrid reuses the
//! autoregressive stage fitted just before it.

use crate::config::PipelineConfig;
use crate::error::Result;
use crate::metrics::ErrorMetrics;
use crate::models::{MethodKind, ParameterSet};
use crate::store::ModelStore;
use crate::trainer::{ModelTrainer, TrainedMethod};
use serde::Serialize;
use std::fmt;
use tracing::info;

/// Summary of one trained method
#[derive(Debug, Clone, Serialize)]
pub struct MethodReport {
    pub method: MethodKind,
    pub params: ParameterSet,
    pub search_error: Option<f64>,
    pub train: ErrorMetrics,
    pub test: ErrorMetrics,
}

impl From<&TrainedMethod> for MethodReport {
    fn from(trained: &TrainedMethod) -> Self {
        Self {
            method: trained.kind(),
            params: trained.artifact.params.clone(),
            search_error: trained.search_error,
            train: trained.train_metrics,
            test: trained.test_metrics,
        }
    }
}

/// Summary of every method trained on one dataset
#[derive(Debug, Clone, Serialize)]
pub struct DatasetReport {
    pub dataset: String,
    pub observations: usize,
    pub methods: Vec<MethodReport>,
}

impl DatasetReport {
    /// Method with the lowest test MAE
    pub fn best_method(&self) -> Option<&MethodReport> {
        self.methods
            .iter()
            .filter(|m| m.test.mae.is_finite())
            .min_by(|a, b| a.test.mae.total_cmp(&b.test.mae))
    }
}

impl fmt::Display for DatasetReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Dataset {} ({} observations)", self.dataset, self.observations)?;
        writeln!(
            f,
            "{:<15} {:>12} {:>12} {:>8} {:>8} {:>12} {:>12} {:>8} {:>8}",
            "method", "train MAE", "train RMSE", "MAPE", "R2", "test MAE", "test RMSE", "MAPE", "R2"
        )?;
        for m in &self.methods {
            writeln!(
                f,
                "{:<15} {:>12.3} {:>12.3} {:>8.4} {:>8.4} {:>12.3} {:>12.3} {:>8.4} {:>8.4}",
                m.method.as_str(),
                m.train.mae,
                m.train.rmse,
                m.train.mape,
                m.train.r2,
                m.test.mae,
                m.test.rmse,
                m.test.mape,
                m.test.r2
            )?;
        }
        for m in &self.methods {
            writeln!(f, "  {}: {}", m.method, m.params)?;
        }
        Ok(())
    }
}

/// Trains every family on a dataset and persists the results
#[derive(Debug, Clone)]
pub struct ForecastPipeline {
    trainer: ModelTrainer,
}

impl ForecastPipeline {
    pub fn new(config: PipelineConfig, store: ModelStore) -> Result<Self> {
        Ok(Self {
            trainer: ModelTrainer::new(config, store)?,
        })
    }

    pub fn config(&self) -> &PipelineConfig {
        self.trainer.config()
    }

    /// Search, train, evaluate and persist all four methods
    pub fn run_dataset(&self, dataset: &str, series: &[f64]) -> Result<DatasetReport> {
        info!(dataset, observations = series.len(), "training dataset");
        self.config().window.ensure_len(series.len())?;
        let supplied = self.config().params_for(dataset);

        let (autoregressive, stage) = self
            .trainer
            .train_autoregressive(dataset, series, supplied.autoregressive)?;
        let regression = self.trainer.train_regression(dataset, series, supplied.regression)?;
        let sequence = self.trainer.train_sequence(dataset, series, supplied.sequence)?;
        let hybrid = self
            .trainer
            .train_hybrid(dataset, series, &stage, supplied.hybrid)?;

        let methods = [&autoregressive, &regression, &sequence, &hybrid]
            .into_iter()
            .map(MethodReport::from)
            .collect();
        Ok(DatasetReport {
            dataset: dataset.to_string(),
            observations: series.len(),
            methods,
        })
    }
}
