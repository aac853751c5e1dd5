//! Data pipeline commands: ingest, ETL, training, summary and reset

use anyhow::Result;
use colored::Colorize;
use std::path::Path;
use tabled::Tabled;

use super::read_wrapped_array;
use crate::client::{
    ApiClient, EtlRequest, EtlResponse, IngestResponse, ResetResponse, Summary, TrainRequest,
    TrainingResponse,
};
use crate::output::{
    format_percent, format_timestamp, print_info, print_json, print_success, print_table,
    print_warning, OutputFormat,
};

/// Feature rows shown in table output before truncating
const MAX_TABLE_ROWS: usize = 20;

/// Row for the feature dataset table
#[derive(Tabled)]
struct FeatureTableRow {
    #[tabled(rename = "Service")]
    service: String,
    #[tabled(rename = "Route")]
    route: String,
    #[tabled(rename = "Bucket")]
    bucket_start: String,
    #[tabled(rename = "Requests")]
    total_requests: u64,
    #[tabled(rename = "Errors")]
    error_rate: String,
    #[tabled(rename = "Timeouts")]
    timeout_rate: String,
    #[tabled(rename = "p95 ms")]
    p95_latency_ms: String,
    #[tabled(rename = "CPU")]
    avg_cpu_pct: String,
}

/// Post a telemetry file to the buffer
pub async fn ingest(client: &ApiClient, file: &Path, format: OutputFormat) -> Result<()> {
    let body = read_wrapped_array(file, "events")?;
    let result: IngestResponse = client.post("api/v1/telemetry", &body).await?;

    match format {
        OutputFormat::Json => print_json(&result)?,
        OutputFormat::Table => {
            print_success(&format!(
                "Ingested {} events ({} buffered)",
                result.ingested, result.retained
            ));
            if result.evicted > 0 {
                print_warning(&format!(
                    "Buffer at capacity, {} oldest events evicted",
                    result.evicted
                ));
            }
        }
    }

    Ok(())
}

/// Rebuild the feature store
pub async fn etl(
    client: &ApiClient,
    bucket_minutes: u32,
    lookback_hours: u32,
    format: OutputFormat,
) -> Result<()> {
    let request = EtlRequest {
        bucket_minutes,
        lookback_hours,
    };
    let result: EtlResponse = client.post("api/v1/etl", &request).await?;

    match format {
        OutputFormat::Json => print_json(&result)?,
        OutputFormat::Table => {
            if result.generated_rows == 0 {
                print_warning("No feature rows generated; ingest telemetry inside the lookback window first");
                return Ok(());
            }

            let rows: Vec<FeatureTableRow> = result
                .dataset
                .iter()
                .rev()
                .take(MAX_TABLE_ROWS)
                .map(|r| FeatureTableRow {
                    service: r.service.clone(),
                    route: r.route.clone(),
                    bucket_start: format_timestamp(&r.bucket_start),
                    total_requests: r.total_requests,
                    error_rate: format_percent(r.error_rate),
                    timeout_rate: format_percent(r.timeout_rate),
                    p95_latency_ms: format!("{:.1}", r.p95_latency_ms),
                    avg_cpu_pct: format!("{:.1}%", r.avg_cpu_pct),
                })
                .collect();

            print_table(rows);
            if result.generated_rows > MAX_TABLE_ROWS {
                print_info(&format!(
                    "Showing latest {} of {} rows (use --format json for all)",
                    MAX_TABLE_ROWS, result.generated_rows
                ));
            }
            print_success(&format!("Generated {} feature rows", result.generated_rows));
        }
    }

    Ok(())
}

/// Label the feature store and continue training the model
pub async fn train(client: &ApiClient, request: TrainRequest, format: OutputFormat) -> Result<()> {
    let result: TrainingResponse = client.post("api/v1/train", &request).await?;

    match format {
        OutputFormat::Json => print_json(&result)?,
        OutputFormat::Table => {
            if result.trained_rows == 0 {
                print_warning("No labeled rows available, model unchanged; run etl first");
                return Ok(());
            }
            print_success(&format!(
                "Trained on {} rows ({} positive, {})",
                result.trained_rows,
                result.positives,
                format_percent(result.positives as f64 / result.trained_rows as f64)
            ));
        }
    }

    Ok(())
}

/// Show buffer and feature store counters
pub async fn summary(client: &ApiClient, format: OutputFormat) -> Result<()> {
    let result: Summary = client.get("api/v1/summary").await?;

    match format {
        OutputFormat::Json => print_json(&result)?,
        OutputFormat::Table => {
            println!("{}", "Engine Summary".bold());
            println!("{}", "=".repeat(40));
            println!("Buffered events: {}", result.telemetry.total.to_string().cyan());
            println!("Error rate:      {}", format_percent(result.telemetry.error_rate));
            println!("Timeout rate:    {}", format_percent(result.telemetry.timeout_rate));
            println!("Feature rows:    {}", result.feature_rows.to_string().cyan());
        }
    }

    Ok(())
}

/// Clear all engine state
pub async fn reset(client: &ApiClient, format: OutputFormat) -> Result<()> {
    let result: ResetResponse = client.post("api/v1/reset", &serde_json::json!({})).await?;

    match format {
        OutputFormat::Json => print_json(&result)?,
        OutputFormat::Table => print_success("Engine reset: telemetry, features and model cleared"),
    }

    Ok(())
}
