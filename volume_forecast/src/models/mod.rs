//! Forecasting model families
//!
//! Every fitted model maps input rows to blocks of `horizon()` values. For the
//! windowed families a row is a lag window; for the autoregressive family a
//! row is the full history the forecast continues from.

use crate::error::{ForecastError, Result};
use serde::{Deserialize, Serialize};
use std::fmt::{self, Debug};
use std::str::FromStr;

pub mod hybrid;
pub mod kernel_regression;
pub mod sarima;
pub mod sequence;

pub use hybrid::HybridModel;
pub use kernel_regression::{KernelGrid, KernelParams, KernelRegression, TrainedKernelRegression};
pub use sarima::{FittedSeasonalArima, SarimaGrid, SarimaParams, SeasonalArima};
pub use sequence::{SequenceGrid, SequenceModel, SequenceParams, TrainedSequenceModel};

/// Trained forecast model
pub trait TrainedForecastModel: Debug + Send + Sync {
    /// One block of `horizon()` values per input row
    fn predict(&self, rows: &[Vec<f64>]) -> Result<Vec<Vec<f64>>>;

    /// Length of one native prediction block
    fn horizon(&self) -> usize;

    /// Name of the model
    fn name(&self) -> &str;
}

/// Forecast model that can be trained on window pairs
pub trait ForecastModel: Debug + Clone + Send + Sync {
    /// The type of trained model produced
    type Trained: TrainedForecastModel;

    /// Fit on feature rows `x` and their target rows `y`
    fn train(&self, x: &[Vec<f64>], y: &[Vec<f64>]) -> Result<Self::Trained>;

    /// Get the name of the model
    fn name(&self) -> &str;
}

pub(crate) fn check_pair(x: &[Vec<f64>], y: &[Vec<f64>]) -> Result<()> {
    if x.is_empty() || x.len() != y.len() {
        return Err(ForecastError::DataError(format!(
            "Need matching non-empty feature and target rows, got {} and {}",
            x.len(),
            y.len()
        )));
    }
    let (width, horizon) = (x[0].len(), y[0].len());
    if width == 0 || horizon == 0 {
        return Err(ForecastError::DataError("Rows must not be empty".to_string()));
    }
    if x.iter().any(|r| r.len() != width) || y.iter().any(|r| r.len() != horizon) {
        return Err(ForecastError::DataError(
            "All rows of a window pair must share one length".to_string(),
        ));
    }
    Ok(())
}

/// The four competing model families
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MethodKind {
    Autoregressive,
    Regression,
    Sequence,
    Hybrid,
}

impl MethodKind {
    /// Every family in pipeline order
    pub const ALL: [MethodKind; 4] = [
        MethodKind::Autoregressive,
        MethodKind::Regression,
        MethodKind::Sequence,
        MethodKind::Hybrid,
    ];

    /// Canonical name, also the registry key suffix
    pub fn as_str(&self) -> &'static str {
        match self {
            MethodKind::Autoregressive => "autoregressive",
            MethodKind::Regression => "regression",
            MethodKind::Sequence => "sequence",
            MethodKind::Hybrid => "hybrid",
        }
    }

    /// Resolve a method name by its suffix.
    ///
    /// Hybrid names are matched before plain regression ones because the
    /// legacy hybrid alias `sarima_svr` also ends in `svr`.
    pub fn from_method_name(name: &str) -> Result<Self> {
        let lower = name.trim().to_ascii_lowercase();
        let suffixes: [(&str, MethodKind); 8] = [
            ("hybrid", MethodKind::Hybrid),
            ("sarima_svr", MethodKind::Hybrid),
            ("autoregressive", MethodKind::Autoregressive),
            ("sarima", MethodKind::Autoregressive),
            ("sequence", MethodKind::Sequence),
            ("lstm", MethodKind::Sequence),
            ("regression", MethodKind::Regression),
            ("svr", MethodKind::Regression),
        ];
        suffixes
            .iter()
            .find(|(suffix, _)| lower.ends_with(suffix))
            .map(|(_, kind)| *kind)
            .ok_or_else(|| ForecastError::UnknownMethod(name.to_string()))
    }

    /// Registry key for a dataset
    pub fn registry_key(&self, dataset: &str) -> String {
        format!("{}_{}", dataset, self.as_str())
    }
}

impl fmt::Display for MethodKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for MethodKind {
    type Err = ForecastError;

    fn from_str(s: &str) -> Result<Self> {
        Self::from_method_name(s)
    }
}

/// Hyperparameters of one model family
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "method", rename_all = "lowercase")]
pub enum ParameterSet {
    Autoregressive(SarimaParams),
    Regression(KernelParams),
    Sequence(SequenceParams),
    Hybrid(KernelParams),
}

impl ParameterSet {
    pub fn kind(&self) -> MethodKind {
        match self {
            ParameterSet::Autoregressive(_) => MethodKind::Autoregressive,
            ParameterSet::Regression(_) => MethodKind::Regression,
            ParameterSet::Sequence(_) => MethodKind::Sequence,
            ParameterSet::Hybrid(_) => MethodKind::Hybrid,
        }
    }
}

impl fmt::Display for ParameterSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParameterSet::Autoregressive(p) => write!(f, "{}", p),
            ParameterSet::Regression(p) | ParameterSet::Hybrid(p) => write!(f, "{}", p),
            ParameterSet::Sequence(p) => write!(f, "{}", p),
        }
    }
}

/// Externally supplied parameters for one dataset; a present entry skips the
/// search for that method
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MethodParams {
    pub autoregressive: Option<SarimaParams>,
    pub regression: Option<KernelParams>,
    pub sequence: Option<SequenceParams>,
    pub hybrid: Option<KernelParams>,
}
