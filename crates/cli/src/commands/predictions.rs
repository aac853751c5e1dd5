//! Prediction and model inspection commands

use anyhow::Result;
use colored::Colorize;
use std::path::Path;
use tabled::Tabled;

use super::read_wrapped_array;
use crate::client::{ApiClient, ModelSnapshot, Prediction, PredictionList};
use crate::output::{
    color_risk, format_contribution, format_timestamp, print_json, print_table, print_warning,
    OutputFormat,
};

/// Row for predictions table
#[derive(Tabled)]
struct PredictionRow {
    #[tabled(rename = "Service")]
    service: String,
    #[tabled(rename = "Route")]
    route: String,
    #[tabled(rename = "Bucket")]
    bucket_start: String,
    #[tabled(rename = "Risk")]
    risk_score: String,
    #[tabled(rename = "Top Factors")]
    top_factors: String,
}

/// Row for model weights table
#[derive(Tabled)]
struct WeightRow {
    #[tabled(rename = "Feature")]
    feature: String,
    #[tabled(rename = "Weight")]
    weight: String,
    #[tabled(rename = "Mean")]
    mean: String,
    #[tabled(rename = "Std")]
    std: String,
}

/// Score the latest bucket of every matching stream
pub async fn live(
    client: &ApiClient,
    service: Option<String>,
    route: Option<String>,
    format: OutputFormat,
) -> Result<()> {
    let mut query = Vec::new();
    if let Some(s) = service.as_deref() {
        query.push(("service", s));
    }
    if let Some(r) = route.as_deref() {
        query.push(("route", r));
    }

    let result: PredictionList = client.get_with_query("api/v1/infer/live", &query).await?;
    show_predictions(&result, format)
}

/// Score feature rows from a file
pub async fn batch(client: &ApiClient, file: &Path, format: OutputFormat) -> Result<()> {
    let body = read_wrapped_array(file, "items")?;
    let result: PredictionList = client.post("api/v1/infer/batch", &body).await?;
    show_predictions(&result, format)
}

fn show_predictions(result: &PredictionList, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => print_json(result)?,
        OutputFormat::Table => {
            if result.predictions.is_empty() {
                print_warning("No predictions; run etl to populate the feature store");
                return Ok(());
            }

            let rows: Vec<PredictionRow> = result.predictions.iter().map(prediction_row).collect();
            print_table(rows);
            println!("\nTotal: {} predictions", result.predictions.len());
        }
    }
    Ok(())
}

fn prediction_row(p: &Prediction) -> PredictionRow {
    PredictionRow {
        service: p.service.clone(),
        route: p.route.clone(),
        bucket_start: format_timestamp(&p.bucket_start),
        risk_score: color_risk(p.risk_score),
        top_factors: p
            .top_factors
            .iter()
            .map(|f| format_contribution(&f.feature, f.contribution))
            .collect::<Vec<_>>()
            .join(", "),
    }
}

/// Show the current model weights and scaler statistics
pub async fn model(client: &ApiClient, format: OutputFormat) -> Result<()> {
    let result: ModelSnapshot = client.get("api/v1/model").await?;

    match format {
        OutputFormat::Json => print_json(&result)?,
        OutputFormat::Table => {
            println!("{}", "Risk Model".bold());
            println!("{}", "=".repeat(40));
            println!("Bias:          {:+.4}", result.bias);
            println!("Training runs: {}", result.training_runs.to_string().cyan());
            println!("Samples seen:  {}", result.samples_seen.to_string().cyan());
            println!();

            if result.training_runs == 0 {
                print_warning("Model untrained; every score is 0.5");
            }

            let rows: Vec<WeightRow> = result
                .weights
                .iter()
                .map(|(feature, weight)| WeightRow {
                    feature: feature.clone(),
                    weight: format!("{:+.4}", weight),
                    mean: format!("{:.3}", result.mean.get(feature).copied().unwrap_or(0.0)),
                    std: format!("{:.3}", result.std.get(feature).copied().unwrap_or(1.0)),
                })
                .collect();
            print_table(rows);
        }
    }

    Ok(())
}
