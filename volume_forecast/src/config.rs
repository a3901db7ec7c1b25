//! Pipeline configuration
//!
//! Every section has defaults, so an empty TOML document is a valid config.

use crate::error::{ForecastError, Result};
use crate::models::{KernelGrid, MethodParams, SarimaGrid, SequenceGrid};
use crate::search::SearchConfig;
use crate::validation::WalkForward;
use crate::window::WindowGeometry;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// Walk-forward settings for model selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidationConfig {
    /// Folds per candidate
    pub splits: usize,
    /// Window rows per fold test block, and rows held out for the final test
    pub test_rows: usize,
    /// Observations per fold test block for the autoregressive family
    pub autoregressive_test_size: usize,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            splits: 3,
            test_rows: 1,
            autoregressive_test_size: 12,
        }
    }
}

impl ValidationConfig {
    pub fn walk_forward(&self) -> Result<WalkForward> {
        WalkForward::new(self.splits, self.test_rows)
    }

    pub fn autoregressive_walk_forward(&self) -> Result<WalkForward> {
        WalkForward::new(self.splits, self.autoregressive_test_size)
    }
}

/// Search grids for each family
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GridConfig {
    pub autoregressive: SarimaGrid,
    /// Also used by the second stage of the hybrid
    pub regression: KernelGrid,
    pub sequence: SequenceGrid,
}

/// Complete configuration of a training run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub window: WindowGeometry,
    pub validation: ValidationConfig,
    pub search: SearchConfig,
    /// Seed of the sequence model's random weights
    pub seed: u64,
    pub grids: GridConfig,
    /// Supplied parameters per dataset
    pub datasets: BTreeMap<String, MethodParams>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            window: WindowGeometry::default(),
            validation: ValidationConfig::default(),
            search: SearchConfig::default(),
            seed: 42,
            grids: GridConfig::default(),
            datasets: BTreeMap::new(),
        }
    }
}

impl PipelineConfig {
    /// Parse and validate a TOML document
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: PipelineConfig = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    pub fn validate(&self) -> Result<()> {
        self.window.validate()?;
        self.validation.walk_forward()?;
        self.validation.autoregressive_walk_forward()?;
        if self.grids.autoregressive.total_combinations() == 0
            || self.grids.regression.total_combinations() == 0
            || self.grids.sequence.total_combinations() == 0
        {
            return Err(ForecastError::InvalidParameter(
                "Every search grid needs at least one candidate".to_string(),
            ));
        }
        Ok(())
    }

    /// Supplied parameters of a dataset, empty when none are configured
    pub fn params_for(&self, dataset: &str) -> MethodParams {
        self.datasets.get(dataset).cloned().unwrap_or_default()
    }
}
