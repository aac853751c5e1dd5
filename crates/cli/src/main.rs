//! Incident Risk Predictor CLI
//!
//! A command-line tool for feeding telemetry to the incident agent,
//! training its model and inspecting predictions, alerts and backtests.

mod client;
mod commands;
mod config;
mod output;

use anyhow::Result;
use clap::{Parser, Subcommand};
use commands::{evaluation, pipeline, predictions};
use std::path::PathBuf;

/// Incident Risk Predictor CLI
#[derive(Parser)]
#[command(name = "irp")]
#[command(author, version, about = "CLI for the Incident Risk Predictor", long_about = None)]
pub struct Cli {
    /// API endpoint URL (can also be set via IRP_API_URL env var or ~/.config/irp/config.json)
    #[arg(long, env = "IRP_API_URL")]
    pub api_url: Option<String>,

    /// Output format
    #[arg(long, short, default_value = "table")]
    pub format: output::OutputFormat,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Ingest telemetry events from a JSON file
    Ingest {
        /// File holding an array of events or {"events": [...]}
        file: PathBuf,
    },

    /// Rebuild the feature store from buffered telemetry
    Etl {
        /// Bucket width in minutes (1-120)
        #[arg(long, default_value_t = 5)]
        bucket_minutes: u32,

        /// Lookback window in hours (1-168)
        #[arg(long, default_value_t = 24)]
        lookback_hours: u32,
    },

    /// Label the feature store and train the risk model
    Train {
        /// Label horizon in hours (1-48)
        #[arg(long, default_value_t = 6)]
        horizon_hours: u32,

        /// Error or timeout rate that marks a bucket as an incident
        #[arg(long, default_value_t = 0.2)]
        incident_threshold: f64,

        /// SGD learning rate
        #[arg(long, default_value_t = 0.05)]
        learning_rate: f64,

        /// Passes over the labeled rows (1-500)
        #[arg(long, default_value_t = 100)]
        epochs: u32,
    },

    /// Score streams with the current model
    #[command(subcommand)]
    Predict(PredictCommands),

    /// Evaluate preventive alerts on the latest predictions
    Alerts {
        /// Minimum risk score that raises an alert
        #[arg(long, default_value_t = 0.8)]
        threshold: f64,

        /// Emit the Alertmanager webhook payload instead
        #[arg(long)]
        alertmanager: bool,
    },

    /// Evaluate the current model against freshly built labels
    Backtest {
        /// Label horizon in hours (1-48)
        #[arg(long, default_value_t = 6)]
        horizon_hours: u32,

        /// Error or timeout rate that marks a bucket as an incident
        #[arg(long, default_value_t = 0.2)]
        incident_threshold: f64,

        /// Number of riskiest rows used for precision and recall
        #[arg(long, default_value_t = 20)]
        top_k: usize,
    },

    /// Show buffer and feature store counters
    Summary,

    /// Show model weights and scaler statistics
    Model,

    /// Clear telemetry, features and model
    Reset,
}

#[derive(Subcommand)]
pub enum PredictCommands {
    /// Score the latest bucket of each stream in the feature store
    Live {
        /// Filter by service
        #[arg(long, short)]
        service: Option<String>,

        /// Filter by route
        #[arg(long, short)]
        route: Option<String>,
    },

    /// Score feature rows from a JSON file
    Batch {
        /// File holding an array of rows or {"items": [...]}
        file: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Resolve endpoint: flag/env, then config file, then default
    let api_url = config::Config::load()?.resolve_api_url(cli.api_url);
    let client = client::ApiClient::new(&api_url)?;

    match cli.command {
        Commands::Ingest { file } => {
            pipeline::ingest(&client, &file, cli.format).await?;
        }
        Commands::Etl {
            bucket_minutes,
            lookback_hours,
        } => {
            pipeline::etl(&client, bucket_minutes, lookback_hours, cli.format).await?;
        }
        Commands::Train {
            horizon_hours,
            incident_threshold,
            learning_rate,
            epochs,
        } => {
            let request = client::TrainRequest {
                horizon_hours,
                incident_threshold,
                learning_rate,
                epochs,
            };
            pipeline::train(&client, request, cli.format).await?;
        }
        Commands::Predict(predict_cmd) => match predict_cmd {
            PredictCommands::Live { service, route } => {
                predictions::live(&client, service, route, cli.format).await?;
            }
            PredictCommands::Batch { file } => {
                predictions::batch(&client, &file, cli.format).await?;
            }
        },
        Commands::Alerts {
            threshold,
            alertmanager,
        } => {
            evaluation::alerts(&client, threshold, alertmanager, cli.format).await?;
        }
        Commands::Backtest {
            horizon_hours,
            incident_threshold,
            top_k,
        } => {
            let request = client::BacktestRequest {
                horizon_hours,
                incident_threshold,
                top_k,
            };
            evaluation::backtest(&client, request, cli.format).await?;
        }
        Commands::Summary => pipeline::summary(&client, cli.format).await?,
        Commands::Model => predictions::model(&client, cli.format).await?,
        Commands::Reset => pipeline::reset(&client, cli.format).await?,
    }

    Ok(())
}
