//! # Train every method on every dataset of a directory
//! volume-forecast train --data data --models models --config config/pipeline.toml
//!
//! # Forecast from a trained model
//! volume-forecast forecast --data data --models models --dataset exports --method hybrid --steps 24

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::error;
use tracing_subscriber::EnvFilter;
use volume_forecast::{
    ForecastPipeline, ForecastRequest, ForecastService, ModelRegistry, ModelStore, PipelineConfig,
    SeriesLoader, SeriesRepository,
};

#[derive(Parser)]
#[command(name = "volume-forecast")]
#[command(about = "Trade volume model selection and forecasting")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Search, train and persist every method
    Train {
        /// Directory of monthly CSV datasets
        #[arg(short, long, default_value = "data")]
        data: PathBuf,

        /// Output directory for model artifacts
        #[arg(short, long, default_value = "models")]
        models: PathBuf,

        /// Pipeline configuration file
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Train only this dataset
        #[arg(long)]
        dataset: Option<String>,
    },

    /// Forecast a dataset with a trained method
    Forecast {
        /// Directory of monthly CSV datasets
        #[arg(short, long, default_value = "data")]
        data: PathBuf,

        /// Directory of model artifacts
        #[arg(short, long, default_value = "models")]
        models: PathBuf,

        /// Dataset name (CSV file stem)
        #[arg(long)]
        dataset: String,

        /// Method name, e.g. `hybrid` or `exports_sequence`
        #[arg(long)]
        method: String,

        /// Number of values; equal to the horizon returns validation residuals
        #[arg(long, default_value_t = 12)]
        steps: usize,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("volume_forecast=info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Train {
            data,
            models,
            config,
            dataset,
        } => {
            let config = match config {
                Some(path) => PipelineConfig::from_file(&path)
                    .with_context(|| format!("loading config {}", path.display()))?,
                None => PipelineConfig::default(),
            };
            let datasets = SeriesLoader::from_dir(&data)
                .with_context(|| format!("loading datasets from {}", data.display()))?;
            let pipeline = ForecastPipeline::new(config, ModelStore::new(models))?;

            for (name, series) in &datasets {
                if dataset.as_ref().map_or(false, |only| only != name) {
                    continue;
                }
                match pipeline.run_dataset(name, series.values()) {
                    Ok(report) => {
                        println!("{}", report);
                        if let Some(best) = report.best_method() {
                            println!("Best method: {} (test MAE {:.3})\n", best.method, best.test.mae);
                        }
                    }
                    Err(e) => error!(dataset = %name, error = %e, "training failed"),
                }
            }
        }
        Commands::Forecast {
            data,
            models,
            dataset,
            method,
            steps,
        } => {
            let registry = Arc::new(ModelRegistry::load(&ModelStore::new(models))?);
            let series = Arc::new(SeriesRepository::from_dir(&data)?);
            let service = ForecastService::new(registry, series);

            let values = service.forecast(&ForecastRequest::new(method, dataset, steps))?;
            println!("{}", serde_json::to_string(&values)?);
        }
    }

    Ok(())
}
