//! # forecast-server
//!
//! Loads every model artifact and dataset once, serves forecasts until
//! interrupted, then tears the registry down.

use anyhow::Context;
use forecast_server::{router, AppState, ServerConfig};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use volume_forecast::{ModelRegistry, SeriesRepository};

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "failed to listen for shutdown signal");
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file (optional - won't fail if missing)
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "forecast_server=info,volume_forecast=info,tower_http=info".into()),
        )
        .init();

    let config = ServerConfig::from_env()?;
    let registry = Arc::new(
        ModelRegistry::load_dir(&config.models_dir)
            .with_context(|| format!("loading models from {}", config.models_dir.display()))?,
    );
    let series = Arc::new(
        SeriesRepository::from_dir(&config.data_dir)
            .with_context(|| format!("loading datasets from {}", config.data_dir.display()))?,
    );

    let app = router(AppState::new(Arc::clone(&registry), series));

    let addr = config.addr()?;
    tracing::info!("forecast-server v{} listening on {}", env!("CARGO_PKG_VERSION"), addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    match Arc::try_unwrap(registry) {
        Ok(registry) => registry.teardown(),
        Err(_) => tracing::warn!("model registry still shared at shutdown"),
    }
    Ok(())
}
