use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use forecast_server::{router, AppState, ServerConfig};
use pretty_assertions::assert_eq;
use std::sync::Arc;
use tower::ServiceExt;
use volume_forecast::models::{SarimaParams, SeasonalArima};
use volume_forecast::{
    FittedArtifact, FittedModel, ModelRegistry, ModelStore, ParameterSet, SeriesRepository,
    WindowGeometry,
};

fn series() -> Vec<f64> {
    (0..60)
        .map(|t| 700.0 + 5.0 * t as f64 + 90.0 * ((t % 12) as f64 * std::f64::consts::PI / 6.0).sin())
        .collect()
}

fn artifacts() -> Vec<FittedArtifact> {
    let series = series();
    let model = SeasonalArima::new(SarimaParams::new((1, 0, 0), (0, 1, 0, 12)), 12)
        .unwrap()
        .fit(&series[..48])
        .unwrap();
    let artifact = FittedArtifact::new(
        "exports",
        WindowGeometry::default(),
        ParameterSet::Autoregressive(model.params()),
        FittedModel::Autoregressive { model },
    )
    .unwrap();
    let short = FittedArtifact {
        dataset: "short".to_string(),
        ..artifact.clone()
    };
    vec![artifact, short]
}

fn repository() -> SeriesRepository {
    let mut repository = SeriesRepository::new();
    repository.insert("exports", series());
    repository.insert("short", vec![1.0; 10]);
    repository
}

fn app() -> axum::Router {
    let registry = ModelRegistry::from_artifacts(artifacts());
    router(AppState::new(Arc::new(registry), Arc::new(repository())))
}

async fn post_forecast(body: serde_json::Value) -> (StatusCode, serde_json::Value) {
    let request = Request::builder()
        .method("POST")
        .uri("/forecast")
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    let response = app().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

#[tokio::test]
async fn test_unknown_method_returns_error_object() {
    let (status, body) = post_forecast(serde_json::json!({
        "method_name": "foo",
        "series_id": "exports",
        "steps": 12
    }))
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Unknown method: foo");
}

#[tokio::test]
async fn test_extrapolation() {
    let (status, body) = post_forecast(serde_json::json!({
        "method_name": "exports_autoregressive",
        "series_id": "exports",
        "steps": 25
    }))
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 25);
}

#[tokio::test]
async fn test_default_steps_give_residuals() {
    let (status, body) = post_forecast(serde_json::json!({
        "method_name": "sarima",
        "series_id": "exports"
    }))
    .await;
    assert_eq!(status, StatusCode::OK);
    let residuals = body.as_array().unwrap();
    assert_eq!(residuals.len(), 12);
    assert!(residuals.iter().all(|r| r.as_f64().unwrap().abs() < 1.0));
}

#[tokio::test]
async fn test_missing_model_is_empty() {
    let (status, body) = post_forecast(serde_json::json!({
        "method_name": "hybrid",
        "series_id": "exports",
        "steps": 24
    }))
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, serde_json::json!([]));
}

#[tokio::test]
async fn test_insufficient_data() {
    let (status, body) = post_forecast(serde_json::json!({
        "method_name": "autoregressive",
        "series_id": "short",
        "steps": 12
    }))
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(body["error"].as_str().unwrap().starts_with("Insufficient data"));
}

#[tokio::test]
async fn test_models_and_health() {
    let response = app()
        .oneshot(Request::builder().uri("/models").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let keys: Vec<String> = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(keys, vec!["exports_autoregressive", "short_autoregressive"]);

    let response = app()
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_serves_models_loaded_from_directory() {
    let dir = tempfile::tempdir().unwrap();
    let store = ModelStore::new(dir.path());
    for artifact in artifacts() {
        store.save(&artifact).unwrap();
    }

    let registry = ModelRegistry::load_dir(dir.path()).unwrap();
    assert_eq!(registry.keys(), vec!["exports_autoregressive", "short_autoregressive"]);

    let app = router(AppState::new(Arc::new(registry), Arc::new(repository())));
    let request = Request::builder()
        .method("POST")
        .uri("/forecast")
        .header("content-type", "application/json")
        .body(Body::from(
            serde_json::json!({
                "method_name": "autoregressive",
                "series_id": "exports",
                "steps": 18
            })
            .to_string(),
        ))
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let values: Vec<f64> = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(values.len(), 18);
    assert!(values.iter().all(|v| v.is_finite()));
}

#[test]
fn test_default_config() {
    let config = ServerConfig::default();
    assert_eq!(config.port, 8080);
    assert_eq!(config.addr().unwrap().to_string(), "0.0.0.0:8080");
}
