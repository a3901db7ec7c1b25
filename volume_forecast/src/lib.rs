//! # Volume Forecast
//!
//! Model selection and recursive forecasting for monthly trade-volume series.
//!
//! ## Features
//!
//! - Lag/horizon windowing with a fixed stride
//! - Expanding-window walk-forward validation
//! - Parallel grid search over each model family's parameter space
//! - Four model families: seasonal ARIMA, kernel regression, a recurrent
//!   sequence model and an autoregressive/regression hybrid
//! - Recursive extrapolation past a model's native horizon
//! - JSON model artifacts and a read-only registry for serving
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use volume_forecast::{ForecastPipeline, ModelStore, PipelineConfig, SeriesLoader};
//!
//! fn main() -> volume_forecast::Result<()> {
//!     let series = SeriesLoader::from_csv("data/exports.csv")?;
//!     let pipeline = ForecastPipeline::new(PipelineConfig::default(), ModelStore::new("models"))?;
//!     let report = pipeline.run_dataset(series.name(), series.values())?;
//!     println!("{}", report);
//!     Ok(())
//! }
//! ```

pub mod artifact;
pub mod config;
pub mod data;
pub mod error;
pub mod metrics;
pub mod models;
pub mod pipeline;
pub mod reconstruct;
pub mod registry;
pub mod search;
pub mod service;
pub mod store;
pub mod trainer;
pub mod validation;
pub mod window;

// Re-export commonly used types
pub use crate::artifact::{FittedArtifact, FittedModel};
pub use crate::config::PipelineConfig;
pub use crate::data::{SeriesLoader, TimeSeries};
pub use crate::error::{ForecastError, Result};
pub use crate::metrics::ErrorMetrics;
pub use crate::models::{ForecastModel, MethodKind, ParameterSet, TrainedForecastModel};
pub use crate::pipeline::{DatasetReport, ForecastPipeline};
pub use crate::reconstruct::{ForecastMode, ForecastReconstructor};
pub use crate::registry::ModelRegistry;
pub use crate::search::GridSearch;
pub use crate::service::{ForecastRequest, ForecastService, SeriesRepository};
pub use crate::store::ModelStore;
pub use crate::window::{FeatureWindower, WindowGeometry};

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const NAME: &str = env!("CARGO_PKG_NAME");
