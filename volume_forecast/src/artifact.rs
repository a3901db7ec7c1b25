//! Persistable fitted models
//!
//! An artifact carries everything needed to forecast from a raw series: the
//! window geometry, the selected parameters, the fitted model and the scaler
//! its inputs were trained in.

use crate::error::{ForecastError, Result};
use crate::models::{
    FittedSeasonalArima, HybridModel, MethodKind, ParameterSet, TrainedForecastModel,
    TrainedKernelRegression, TrainedSequenceModel,
};
use crate::reconstruct::{BufferPolicy, ForecastMode, ForecastReconstructor};
use crate::window::{FeatureWindower, WindowGeometry};
use serde::{Deserialize, Serialize};
use trade_math::{IdentityScaler, MinMaxScaler, Scaler};

/// Fitted model of one family
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum FittedModel {
    Autoregressive {
        model: FittedSeasonalArima,
    },
    Regression {
        model: TrainedKernelRegression,
        scaler: MinMaxScaler,
    },
    Sequence {
        model: TrainedSequenceModel,
        scaler: MinMaxScaler,
    },
    Hybrid {
        model: HybridModel,
    },
}

impl FittedModel {
    pub fn kind(&self) -> MethodKind {
        match self {
            FittedModel::Autoregressive { .. } => MethodKind::Autoregressive,
            FittedModel::Regression { .. } => MethodKind::Regression,
            FittedModel::Sequence { .. } => MethodKind::Sequence,
            FittedModel::Hybrid { .. } => MethodKind::Hybrid,
        }
    }

    pub fn as_model(&self) -> &dyn TrainedForecastModel {
        match self {
            FittedModel::Autoregressive { model } => model,
            FittedModel::Regression { model, .. } => model,
            FittedModel::Sequence { model, .. } => model,
            FittedModel::Hybrid { model } => model,
        }
    }
}

/// A fitted model bound to its dataset, geometry and parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FittedArtifact {
    pub dataset: String,
    pub geometry: WindowGeometry,
    pub params: ParameterSet,
    pub model: FittedModel,
}

impl FittedArtifact {
    pub fn new(dataset: impl Into<String>, geometry: WindowGeometry, params: ParameterSet, model: FittedModel) -> Result<Self> {
        if params.kind() != model.kind() {
            return Err(ForecastError::InvalidParameter(format!(
                "{} parameters cannot describe a {} model",
                params.kind(),
                model.kind()
            )));
        }
        Ok(Self {
            dataset: dataset.into(),
            geometry,
            params,
            model,
        })
    }

    pub fn kind(&self) -> MethodKind {
        self.model.kind()
    }

    /// Registry key `<dataset>_<method>`
    pub fn key(&self) -> String {
        self.kind().registry_key(&self.dataset)
    }

    /// Answer a request for `steps` values continuing `series`.
    ///
    /// When `steps` equals the horizon the last `H` observations are held out
    /// and the residuals `forecast - actual` are returned; otherwise the
    /// forecast past the end of the series.
    pub fn forecast(&self, series: &[f64], steps: usize) -> Result<Vec<f64>> {
        let mode = ForecastMode::for_steps(steps, self.geometry.horizon)?;

        match &self.model {
            FittedModel::Autoregressive { model } => {
                let reconstructor = ForecastReconstructor::new(model, &IdentityScaler, BufferPolicy::Growing);
                match mode {
                    ForecastMode::Validation => {
                        self.geometry.ensure_len(series.len())?;
                        let split = series.len() - self.geometry.horizon;
                        reconstructor.validate(&series[..split], &series[split..])
                    }
                    ForecastMode::Extrapolation { .. } => reconstructor.extrapolate(series, steps),
                }
            }
            FittedModel::Regression { model, scaler } => {
                self.windowed(model, scaler, &scaler.transform(series), series, mode, steps)
            }
            FittedModel::Sequence { model, scaler } => {
                self.windowed(model, scaler, &scaler.transform(series), series, mode, steps)
            }
            FittedModel::Hybrid { model } => {
                let features = model.scaled_features(series)?;
                self.windowed(model, model.scaler(), &features, series, mode, steps)
            }
        }
    }

    fn windowed(
        &self,
        model: &dyn TrainedForecastModel,
        scaler: &dyn Scaler,
        features: &[f64],
        series: &[f64],
        mode: ForecastMode,
        steps: usize,
    ) -> Result<Vec<f64>> {
        let windower = FeatureWindower::new(self.geometry)?;
        let reconstructor = ForecastReconstructor::new(model, scaler, BufferPolicy::Sliding(self.geometry.lag));
        match mode {
            ForecastMode::Validation => {
                let (window, _) = windower.validation_window(features)?;
                let (_, actual) = windower.validation_window(series)?;
                reconstructor.validate(window, actual)
            }
            ForecastMode::Extrapolation { .. } => {
                reconstructor.extrapolate(windower.last_window(features)?, steps)
            }
        }
    }
}
