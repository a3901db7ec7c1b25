//! Model selection and final fitting per family
//!
//! Windowed families hold out the final `test_rows` window rows, search on
//! the rest with walk-forward folds, then fit once on every training row. The
//! autoregressive family does the same over raw observations with a test
//! block of `H` values.

use crate::artifact::{FittedArtifact, FittedModel};
use crate::config::PipelineConfig;
use crate::error::Result;
use crate::metrics::{evaluate_forecast, ranking_error, ErrorMetrics};
use crate::models::hybrid::auxiliary_series;
use crate::models::{
    FittedSeasonalArima, ForecastModel, HybridModel, KernelParams, KernelRegression, MethodKind,
    ParameterSet, SarimaParams, SeasonalArima, SequenceModel, SequenceParams, TrainedForecastModel,
};
use crate::search::GridSearch;
use crate::store::ModelStore;
use crate::validation::WalkForward;
use crate::window::{FeatureWindower, WindowPair};
use std::fmt::Debug;
use tracing::{debug, info};
use trade_math::{MinMaxScaler, Scaler};

/// Outcome of training one family on one dataset
#[derive(Debug, Clone)]
pub struct TrainedMethod {
    pub artifact: FittedArtifact,
    /// Mean walk-forward error of the winner; `None` for supplied parameters
    pub search_error: Option<f64>,
    pub train_metrics: ErrorMetrics,
    pub test_metrics: ErrorMetrics,
}

impl TrainedMethod {
    pub fn kind(&self) -> MethodKind {
        self.artifact.kind()
    }
}

/// Searches, fits, evaluates and persists models
#[derive(Debug, Clone)]
pub struct ModelTrainer {
    config: PipelineConfig,
    windower: FeatureWindower,
    walk_forward: WalkForward,
    autoregressive_walk_forward: WalkForward,
    search: GridSearch,
    store: ModelStore,
}

/// Mean fold error of one windowed candidate in original units. Fit failures
/// score as non-finite forecasts.
fn score_windowed<M: ForecastModel>(
    model: &M,
    pair: &WindowPair,
    scaler: &dyn Scaler,
    walk_forward: &WalkForward,
) -> Result<f64> {
    walk_forward.mean_error(pair.len(), |fold| {
        let train = pair.rows(fold.train.clone());
        let test = pair.rows(fold.test.clone());
        let actual = scaler.inverse_transform(&test.flat_targets());
        let predicted = match model.train(&train.x, &train.y).and_then(|m| m.predict(&test.x)) {
            Ok(blocks) => {
                let scaled: Vec<f64> = blocks.into_iter().flatten().collect();
                scaler.inverse_transform(&scaled)
            }
            Err(e) if e.is_fit_failure() => {
                debug!(model = model.name(), error = %e, "candidate failed to fit");
                vec![f64::NAN; actual.len()]
            }
            Err(e) => return Err(e),
        };
        Ok(ranking_error(&actual, &predicted))
    })
}

/// Metrics in original units for a model over window rows
fn evaluate_rows(model: &dyn TrainedForecastModel, pair: &WindowPair, scaler: &dyn Scaler) -> Result<ErrorMetrics> {
    let predicted: Vec<f64> = model.predict(&pair.x)?.into_iter().flatten().collect();
    evaluate_forecast(
        &scaler.inverse_transform(&predicted),
        &scaler.inverse_transform(&pair.flat_targets()),
    )
}

impl ModelTrainer {
    pub fn new(config: PipelineConfig, store: ModelStore) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            windower: FeatureWindower::new(config.window)?,
            walk_forward: config.validation.walk_forward()?,
            autoregressive_walk_forward: config.validation.autoregressive_walk_forward()?,
            search: GridSearch::from_config(&config.search)?,
            store,
            config,
        })
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Search unless parameters are supplied, then fit on the full training pair
    fn select_and_fit<P, M, B>(
        &self,
        pair: &WindowPair,
        scaler: &dyn Scaler,
        candidates: Vec<P>,
        supplied: Option<P>,
        build: B,
    ) -> Result<(P, Option<f64>, M::Trained)>
    where
        P: Clone + Send + Sync + Debug,
        M: ForecastModel,
        B: Fn(&P) -> Result<M> + Sync,
    {
        let (params, error) = match supplied {
            Some(params) => {
                info!(?params, "using supplied parameters");
                (params, None)
            }
            None => {
                let best = self.search.run(&candidates, |p| {
                    score_windowed(&build(p)?, pair, scaler, &self.walk_forward)
                })?;
                (best.params, Some(best.error))
            }
        };
        let fitted = build(&params)?.train(&pair.x, &pair.y)?;
        Ok((params, error, fitted))
    }

    fn finish(
        &self,
        dataset: &str,
        params: ParameterSet,
        model: FittedModel,
        search_error: Option<f64>,
        train_metrics: ErrorMetrics,
        test_metrics: ErrorMetrics,
    ) -> Result<TrainedMethod> {
        let artifact = FittedArtifact::new(dataset, self.config.window, params, model)?;
        self.store.save(&artifact)?;
        info!(dataset, method = %artifact.kind(), train = %train_metrics, test = %test_metrics, "model trained");
        Ok(TrainedMethod {
            artifact,
            search_error,
            train_metrics,
            test_metrics,
        })
    }

    /// Seasonal ARIMA trained on everything except the final `H` observations
    pub fn train_autoregressive(&self, dataset: &str, series: &[f64], supplied: Option<SarimaParams>) -> Result<(TrainedMethod, FittedSeasonalArima)> {
        let horizon = self.config.window.horizon;
        self.config.window.ensure_len(series.len())?;
        let (train, test) = series.split_at(series.len() - horizon);

        let (params, search_error) = match supplied {
            Some(params) => (params, None),
            None => {
                let candidates = self.config.grids.autoregressive.combinations();
                let best = self.search.run(&candidates, |p| {
                    let model = SeasonalArima::new(*p, horizon)?;
                    self.autoregressive_walk_forward.mean_error(train.len(), |fold| {
                        let history = &train[fold.train.clone()];
                        let actual = &train[fold.test.clone()];
                        let predicted = match model.fit(history).and_then(|m| m.forecast(history, actual.len())) {
                            Ok(values) => values,
                            Err(e) if e.is_fit_failure() => vec![f64::NAN; actual.len()],
                            Err(e) => return Err(e),
                        };
                        Ok(ranking_error(actual, &predicted))
                    })
                })?;
                (best.params, Some(best.error))
            }
        };

        let fitted = SeasonalArima::new(params, horizon)?.fit(train)?;
        let train_metrics = evaluate_forecast(&fitted.fitted_values(train)?, train)?;
        let test_metrics = evaluate_forecast(&fitted.forecast(train, horizon)?, test)?;
        let method = self.finish(
            dataset,
            ParameterSet::Autoregressive(params),
            FittedModel::Autoregressive { model: fitted.clone() },
            search_error,
            train_metrics,
            test_metrics,
        )?;
        Ok((method, fitted))
    }

    /// Kernel regression on `[0, 1]`-scaled windows
    pub fn train_regression(&self, dataset: &str, series: &[f64], supplied: Option<KernelParams>) -> Result<TrainedMethod> {
        let scaler = MinMaxScaler::unit(series)?;
        let pair = self.windower.windows(&scaler.transform(series))?;
        let (train, test) = pair.split_tail(self.config.validation.test_rows)?;

        let candidates = self.config.grids.regression.combinations();
        let (params, search_error, model) =
            self.select_and_fit(&train, &scaler, candidates, supplied, |p| KernelRegression::new(*p))?;

        let train_metrics = evaluate_rows(&model, &train, &scaler)?;
        let test_metrics = evaluate_rows(&model, &test, &scaler)?;
        self.finish(
            dataset,
            ParameterSet::Regression(params),
            FittedModel::Regression { model, scaler },
            search_error,
            train_metrics,
            test_metrics,
        )
    }

    /// Recurrent sequence model on `[-1, 1]`-scaled windows
    pub fn train_sequence(&self, dataset: &str, series: &[f64], supplied: Option<SequenceParams>) -> Result<TrainedMethod> {
        let scaler = MinMaxScaler::symmetric(series)?;
        let pair = self.windower.windows(&scaler.transform(series))?;
        let (train, test) = pair.split_tail(self.config.validation.test_rows)?;

        let seed = self.config.seed;
        let candidates = self.config.grids.sequence.combinations();
        let (params, search_error, model) =
            self.select_and_fit(&train, &scaler, candidates, supplied, |p| SequenceModel::new(*p, seed))?;

        let train_metrics = evaluate_rows(&model, &train, &scaler)?;
        let test_metrics = evaluate_rows(&model, &test, &scaler)?;
        self.finish(
            dataset,
            ParameterSet::Sequence(params),
            FittedModel::Sequence { model, scaler },
            search_error,
            train_metrics,
            test_metrics,
        )
    }

    /// Kernel regression reading windows of the autoregressive stage's output
    pub fn train_hybrid(
        &self,
        dataset: &str,
        series: &[f64],
        autoregressive: &FittedSeasonalArima,
        supplied: Option<KernelParams>,
    ) -> Result<TrainedMethod> {
        let aux = auxiliary_series(autoregressive, series, self.config.window.horizon)?;
        let combined: Vec<f64> = series.iter().chain(&aux).copied().collect();
        let scaler = MinMaxScaler::unit(&combined)?;
        let pair = self
            .windower
            .paired(&scaler.transform(&aux), &scaler.transform(series))?;
        let (train, test) = pair.split_tail(self.config.validation.test_rows)?;

        let candidates = self.config.grids.regression.combinations();
        let (params, search_error, regression) =
            self.select_and_fit(&train, &scaler, candidates, supplied, |p| KernelRegression::new(*p))?;

        let train_metrics = evaluate_rows(&regression, &train, &scaler)?;
        let test_metrics = evaluate_rows(&regression, &test, &scaler)?;
        let model = HybridModel::new(autoregressive.clone(), regression, scaler);
        self.finish(
            dataset,
            ParameterSet::Hybrid(params),
            FittedModel::Hybrid { model },
            search_error,
            train_metrics,
            test_metrics,
        )
    }
}
