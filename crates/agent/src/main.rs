//! Incident Agent - online incident-risk prediction service
//!
//! Buffers request telemetry, rebuilds features on demand, trains the risk
//! model and serves predictions, alerts and backtests over HTTP.

use anyhow::Result;
use incident_agent::{api, config::AgentConfig};
use risk_lib::{
    engine::RiskEngine,
    observability::{EngineMetrics, StructuredLogger},
};
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

const AGENT_VERSION: &str = env!("CARGO_PKG_VERSION");

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing with JSON output and env filter
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(fmt::layer().json())
        .init();

    info!("Starting incident-agent");

    let config = AgentConfig::load()?;
    info!(
        instance = %config.instance_name,
        api_port = config.api_port,
        buffer_capacity = config.buffer_capacity,
        "Agent configured"
    );

    let metrics = EngineMetrics::new();
    let logger = StructuredLogger::new(&config.instance_name);
    logger.log_startup(AGENT_VERSION, config.buffer_capacity);

    let engine = RiskEngine::new(config.engine_config());
    let app_state = Arc::new(api::AppState::new(engine, metrics, logger.clone()));
    app_state.set_ready(true);

    let api_handle = tokio::spawn(api::serve(config.api_port, app_state));

    tokio::select! {
        result = api_handle => {
            match result {
                Ok(Err(e)) => error!(error = %e, "API server exited"),
                Err(e) => error!(error = %e, "API server task failed"),
                Ok(Ok(())) => {}
            }
            logger.log_shutdown("API server stopped");
        }
        signal = tokio::signal::ctrl_c() => {
            signal?;
            logger.log_shutdown("SIGINT received");
        }
    }

    info!("Shutting down");
    Ok(())
}
