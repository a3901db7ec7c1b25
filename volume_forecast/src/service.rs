//! Forecast requests against loaded models

use crate::data::SeriesLoader;
use crate::error::{ForecastError, Result};
use crate::models::MethodKind;
use crate::registry::ModelRegistry;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, warn};

fn default_steps() -> usize {
    12
}

/// A request for `steps` values of one dataset from one method
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForecastRequest {
    pub method_name: String,
    pub series_id: String,
    #[serde(default = "default_steps")]
    pub steps: usize,
}

impl ForecastRequest {
    pub fn new(method_name: impl Into<String>, series_id: impl Into<String>, steps: usize) -> Self {
        Self {
            method_name: method_name.into(),
            series_id: series_id.into(),
            steps,
        }
    }
}

/// Series available for forecasting, keyed by dataset name
#[derive(Debug, Clone, Default)]
pub struct SeriesRepository {
    series: BTreeMap<String, Vec<f64>>,
}

impl SeriesRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every CSV dataset of a directory; a missing directory yields an empty repository
    pub fn from_dir<P: AsRef<Path>>(dir: P) -> Result<Self> {
        if !dir.as_ref().exists() {
            warn!(dir = %dir.as_ref().display(), "data directory does not exist");
            return Ok(Self::new());
        }
        let series = SeriesLoader::from_dir(dir)?
            .into_iter()
            .map(|(name, s)| (name, s.into_values()))
            .collect();
        Ok(Self { series })
    }

    pub fn insert(&mut self, id: impl Into<String>, values: Vec<f64>) {
        self.series.insert(id.into(), values);
    }

    pub fn get(&self, id: &str) -> Option<&[f64]> {
        self.series.get(id).map(Vec::as_slice)
    }

    pub fn ids(&self) -> Vec<String> {
        self.series.keys().cloned().collect()
    }
}

/// Answers forecast requests from a read-only registry
#[derive(Debug, Clone)]
pub struct ForecastService {
    registry: Arc<ModelRegistry>,
    series: Arc<SeriesRepository>,
}

impl ForecastService {
    pub fn new(registry: Arc<ModelRegistry>, series: Arc<SeriesRepository>) -> Self {
        Self { registry, series }
    }

    pub fn registry(&self) -> &ModelRegistry {
        &self.registry
    }

    /// Forecast or residuals for a request.
    ///
    /// An unknown method is an error; a missing model or series yields an
    /// empty result.
    pub fn forecast(&self, request: &ForecastRequest) -> Result<Vec<f64>> {
        let kind = MethodKind::from_method_name(&request.method_name)?;
        if request.steps == 0 {
            return Err(ForecastError::InvalidParameter(
                "Steps must be positive".to_string(),
            ));
        }

        let Some(artifact) = self.registry.get_for(&request.series_id, kind) else {
            debug!(series = %request.series_id, method = %kind, "no model loaded");
            return Ok(Vec::new());
        };
        let Some(series) = self.series.get(&request.series_id) else {
            debug!(series = %request.series_id, "no series loaded");
            return Ok(Vec::new());
        };

        artifact.forecast(series, request.steps)
    }
}
