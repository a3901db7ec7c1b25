//! API route handlers

use crate::AppState;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use tracing::warn;
use volume_forecast::{ForecastError, ForecastRequest};

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// Forecast error mapped onto an HTTP status
pub struct ApiError(ForecastError);

impl From<ForecastError> for ApiError {
    fn from(err: ForecastError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match self.0 {
            ForecastError::UnknownMethod(_) | ForecastError::InvalidParameter(_) => StatusCode::BAD_REQUEST,
            ForecastError::InsufficientData { .. } | ForecastError::DataError(_) => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
            ForecastError::ModelNotFound(_) => StatusCode::NOT_FOUND,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        if status.is_server_error() {
            warn!(error = %self.0, "forecast failed");
        }
        let body = ErrorResponse {
            error: self.0.to_string(),
        };
        (status, Json(body)).into_response()
    }
}

/// Liveness probe
pub async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "alive",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

/// Loaded registry keys
pub async fn models(State(state): State<AppState>) -> Json<Vec<String>> {
    Json(state.service.registry().keys())
}

/// Forecast values, or residuals when `steps` equals the model horizon
pub async fn forecast(
    State(state): State<AppState>,
    Json(request): Json<ForecastRequest>,
) -> Result<Json<Vec<f64>>, ApiError> {
    // Forecasting is CPU-bound and runs on the blocking pool
    let service = state.service.clone();
    let values = tokio::task::spawn_blocking(move || service.forecast(&request))
        .await
        .map_err(|e| ForecastError::ModelError(format!("Forecast task failed: {}", e)))??;
    Ok(Json(values))
}
