use pretty_assertions::assert_eq;
use std::sync::Arc;
use trade_math::kernels::{Gamma, KernelKind};
use trade_math::{MinMaxScaler, Scaler};
use volume_forecast::models::{KernelParams, KernelRegression, SarimaParams, SeasonalArima};
use volume_forecast::{
    FeatureWindower, FittedArtifact, FittedModel, ForecastError, ForecastModel, ForecastRequest,
    ForecastService, ModelRegistry, ParameterSet, SeriesRepository, WindowGeometry,
};

fn series() -> Vec<f64> {
    (0..72)
        .map(|t| 900.0 + 3.0 * t as f64 + 120.0 * ((t % 12) as f64 * std::f64::consts::PI / 6.0).sin())
        .collect()
}

fn service() -> ForecastService {
    let series = series();
    let geometry = WindowGeometry::default();

    let scaler = MinMaxScaler::unit(&series).unwrap();
    let pair = FeatureWindower::new(geometry)
        .unwrap()
        .windows(&scaler.transform(&series))
        .unwrap();
    let params = KernelParams {
        c: 1.0,
        gamma: Gamma::Value(0.55),
        kernel: KernelKind::Rbf,
        degree: 3,
    };
    let model = KernelRegression::new(params).unwrap().train(&pair.x, &pair.y).unwrap();
    let regression = FittedArtifact::new(
        "exports",
        geometry,
        ParameterSet::Regression(params),
        FittedModel::Regression { model, scaler },
    )
    .unwrap();

    let ar = SeasonalArima::new(SarimaParams::new((1, 0, 0), (0, 1, 0, 12)), 12)
        .unwrap()
        .fit(&series[..60])
        .unwrap();
    let autoregressive = FittedArtifact::new(
        "exports",
        geometry,
        ParameterSet::Autoregressive(ar.params()),
        FittedModel::Autoregressive { model: ar },
    )
    .unwrap();

    let registry = ModelRegistry::from_artifacts(vec![regression, autoregressive]);
    let mut repository = SeriesRepository::new();
    repository.insert("exports", series);
    repository.insert("imports", vec![1.0; 48]);
    ForecastService::new(Arc::new(registry), Arc::new(repository))
}

#[test]
fn test_unknown_method_is_an_error_value() {
    let result = service().forecast(&ForecastRequest::new("foo", "exports", 12));
    assert!(matches!(result, Err(ForecastError::UnknownMethod(name)) if name == "foo"));
}

#[test]
fn test_missing_model_or_series_is_empty() {
    let service = service();
    let no_model = service
        .forecast(&ForecastRequest::new("imports_regression", "imports", 24))
        .unwrap();
    assert!(no_model.is_empty());

    let no_series = service
        .forecast(&ForecastRequest::new("regression", "unknown", 24))
        .unwrap();
    assert!(no_series.is_empty());
}

#[test]
fn test_horizon_request_returns_residuals() {
    let service = service();
    let residuals = service
        .forecast(&ForecastRequest::new("exports_sarima", "exports", 12))
        .unwrap();
    assert_eq!(residuals.len(), 12);
    // The seasonal difference of trend plus season is constant, so the
    // autoregressive stage reproduces the held-out year.
    assert!(residuals.iter().all(|r| r.abs() < 1.0), "{:?}", residuals);
}

#[test]
fn test_extrapolation_lengths() {
    let service = service();
    for steps in [1, 5, 13, 24, 25, 40] {
        for method in ["regression", "autoregressive"] {
            let values = service
                .forecast(&ForecastRequest::new(method, "exports", steps))
                .unwrap();
            assert_eq!(values.len(), steps);
            assert!(values.iter().all(|v| v.is_finite()));
        }
    }
}

#[test]
fn test_zero_steps_rejected() {
    let result = service().forecast(&ForecastRequest::new("regression", "exports", 0));
    assert!(matches!(result, Err(ForecastError::InvalidParameter(_))));
}

#[test]
fn test_request_defaults_to_one_year() {
    let request: ForecastRequest =
        serde_json::from_str(r#"{"method_name": "exports_hybrid", "series_id": "exports"}"#).unwrap();
    assert_eq!(request.steps, 12);
}
