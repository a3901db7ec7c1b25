//! # Forecast Server
//!
//! REST API over the trained models of a model directory.
//!
//! - `POST /forecast` with `{"method_name", "series_id", "steps"}`
//! - `GET /models` lists the loaded registry keys
//! - `GET /health` liveness probe

use axum::routing::{get, post};
use axum::Router;
use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use thiserror::Error;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use volume_forecast::{ForecastService, ModelRegistry, SeriesRepository};

pub mod routes;

/// Errors raised while configuring the server
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("Invalid configuration: {0}")]
    Config(String),
}

/// Server settings read from the environment
#[derive(Debug, Clone, PartialEq)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub models_dir: PathBuf,
    pub data_dir: PathBuf,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            models_dir: PathBuf::from("models"),
            data_dir: PathBuf::from("data"),
        }
    }
}

impl ServerConfig {
    /// `HOST`, `PORT`, `MODELS_DIR` and `DATA_DIR`, each with a default
    pub fn from_env() -> Result<Self, ServerError> {
        let defaults = Self::default();
        let port = match env::var("PORT") {
            Ok(port) => port
                .parse()
                .map_err(|_| ServerError::Config(format!("PORT must be a valid number, got {}", port)))?,
            Err(_) => defaults.port,
        };
        Ok(Self {
            host: env::var("HOST").unwrap_or(defaults.host),
            port,
            models_dir: env::var("MODELS_DIR").map(PathBuf::from).unwrap_or(defaults.models_dir),
            data_dir: env::var("DATA_DIR").map(PathBuf::from).unwrap_or(defaults.data_dir),
        })
    }

    pub fn addr(&self) -> Result<SocketAddr, ServerError> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .map_err(|_| ServerError::Config(format!("Invalid HOST:PORT {}:{}", self.host, self.port)))
    }
}

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub service: ForecastService,
}

impl AppState {
    pub fn new(registry: Arc<ModelRegistry>, series: Arc<SeriesRepository>) -> Self {
        Self {
            service: ForecastService::new(registry, series),
        }
    }
}

/// Router with every endpoint and the CORS and tracing middleware
pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(routes::health))
        .route("/models", get(routes::models))
        .route("/forecast", post(routes::forecast))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
