//! Recursive multi-horizon forecasting
//!
//! A fitted model predicts one block of `H` values at a time. Longer requests
//! are served by feeding each predicted block back into the input buffer in
//! the model's scaled units, while the caller receives the block in original
//! units.

use crate::error::{ForecastError, Result};
use crate::metrics::sanitize_forecast;
use crate::models::TrainedForecastModel;
use tracing::debug;
use trade_math::Scaler;

/// How a request for `steps` values is answered
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ForecastMode {
    /// One native block against known actuals, reported as residuals
    Validation,
    /// Recursive forecast past the end of the series
    Extrapolation { iterations: usize },
}

impl ForecastMode {
    /// `steps == horizon` selects validation; anything else extrapolates with
    /// `steps / horizon + 1` model calls
    pub fn for_steps(steps: usize, horizon: usize) -> Result<Self> {
        if steps == 0 || horizon == 0 {
            return Err(ForecastError::InvalidParameter(format!(
                "Steps and horizon must be positive, got steps={} H={}",
                steps, horizon
            )));
        }
        if steps == horizon {
            Ok(ForecastMode::Validation)
        } else {
            Ok(ForecastMode::Extrapolation {
                iterations: steps / horizon + 1,
            })
        }
    }
}

/// What happens to the input buffer after each predicted block
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BufferPolicy {
    /// Keep only the most recent `lag` values
    Sliding(usize),
    /// Keep everything; the model reads the full history
    Growing,
}

/// Drives a fitted model over validation and extrapolation requests
pub struct ForecastReconstructor<'a> {
    model: &'a dyn TrainedForecastModel,
    scaler: &'a dyn Scaler,
    policy: BufferPolicy,
}

impl<'a> ForecastReconstructor<'a> {
    pub fn new(model: &'a dyn TrainedForecastModel, scaler: &'a dyn Scaler, policy: BufferPolicy) -> Self {
        Self {
            model,
            scaler,
            policy,
        }
    }

    fn predict_block(&self, buffer: &[f64]) -> Result<Vec<f64>> {
        let horizon = self.model.horizon();
        let block = self
            .model
            .predict(&[buffer.to_vec()])?
            .into_iter()
            .next()
            .ok_or_else(|| ForecastError::ModelError(format!("{} returned no block", self.model.name())))?;
        if block.len() != horizon {
            return Err(ForecastError::ModelError(format!(
                "{} returned {} values instead of {}",
                self.model.name(),
                block.len(),
                horizon
            )));
        }
        Ok(block)
    }

    fn slide(&self, buffer: &mut Vec<f64>, block: &[f64]) {
        buffer.extend_from_slice(block);
        if let BufferPolicy::Sliding(lag) = self.policy {
            if buffer.len() > lag {
                buffer.drain(..buffer.len() - lag);
            }
        }
    }

    /// Forecast one block from a scaled window and return `forecast - actual`
    pub fn validate(&self, window: &[f64], actual: &[f64]) -> Result<Vec<f64>> {
        let block = self.predict_block(window)?;
        if actual.len() != block.len() {
            return Err(ForecastError::DataError(format!(
                "Expected {} actual values, got {}",
                block.len(),
                actual.len()
            )));
        }
        let forecast = sanitize_forecast(&self.scaler.inverse_transform(&block));
        Ok(forecast.iter().zip(actual).map(|(f, a)| f - a).collect())
    }

    /// Forecast `steps` values past a scaled starting buffer
    pub fn extrapolate(&self, buffer: &[f64], steps: usize) -> Result<Vec<f64>> {
        let horizon = self.model.horizon();
        let iterations = match ForecastMode::for_steps(steps, horizon)? {
            ForecastMode::Extrapolation { iterations } => iterations,
            ForecastMode::Validation => 1,
        };

        let mut buffer = buffer.to_vec();
        let mut output = Vec::with_capacity(iterations * horizon);
        for iteration in 0..iterations {
            let block = self.predict_block(&buffer)?;
            output.extend(self.scaler.inverse_transform(&block));
            self.slide(&mut buffer, &block);
            debug!(model = self.model.name(), iteration, "block predicted");
        }
        output.truncate(steps);
        Ok(output)
    }
}
