//! Alerting and backtest commands

use anyhow::Result;
use colored::Colorize;
use tabled::Tabled;

use crate::client::{
    AlertList, AlertRequest, AlertmanagerPayload, ApiClient, BacktestRequest, BacktestResponse,
};
use crate::output::{
    color_metric, color_risk, format_percent, format_timestamp, print_json, print_success,
    print_table, print_warning, OutputFormat,
};

/// Row for alerts table
#[derive(Tabled)]
struct AlertRow {
    #[tabled(rename = "Service")]
    service: String,
    #[tabled(rename = "Route")]
    route: String,
    #[tabled(rename = "Bucket")]
    bucket_start: String,
    #[tabled(rename = "Risk")]
    risk_score: String,
    #[tabled(rename = "Top Factor")]
    top_factor: String,
}

/// Evaluate alerts at `threshold`
pub async fn alerts(
    client: &ApiClient,
    threshold: f64,
    alertmanager: bool,
    format: OutputFormat,
) -> Result<()> {
    let request = AlertRequest { threshold };

    if alertmanager {
        // Webhook payloads are only meaningful as JSON
        let payload: AlertmanagerPayload = client.post("api/v1/alerts/alertmanager", &request).await?;
        return print_json(&payload);
    }

    let result: AlertList = client.post("api/v1/alerts/evaluate", &request).await?;

    match format {
        OutputFormat::Json => print_json(&result)?,
        OutputFormat::Table => {
            if result.alerts.is_empty() {
                print_success(&format!("No streams at or above risk {:.2}", threshold));
                return Ok(());
            }

            let rows: Vec<AlertRow> = result
                .alerts
                .iter()
                .map(|a| AlertRow {
                    service: a.prediction.service.clone(),
                    route: a.prediction.route.clone(),
                    bucket_start: format_timestamp(&a.prediction.bucket_start),
                    risk_score: color_risk(a.prediction.risk_score),
                    top_factor: a
                        .prediction
                        .top_factors
                        .first()
                        .map(|f| f.feature.clone())
                        .unwrap_or_default(),
                })
                .collect();

            print_table(rows);
            print_warning(&format!(
                "{} stream(s) at or above risk {:.2}",
                result.count, threshold
            ));
        }
    }

    Ok(())
}

/// Backtest the current model
pub async fn backtest(client: &ApiClient, request: BacktestRequest, format: OutputFormat) -> Result<()> {
    let top_k = request.top_k;
    let result: BacktestResponse = client.post("api/v1/backtest", &request).await?;

    match format {
        OutputFormat::Json => print_json(&result)?,
        OutputFormat::Table => {
            if result.support == 0 {
                print_warning("No labeled rows to evaluate; run etl first");
                return Ok(());
            }

            println!("{}", "Backtest".bold());
            println!("{}", "=".repeat(40));
            println!("Support:           {}", result.support);
            println!("AUC:               {}", color_metric(result.auc));
            println!("Precision@{:<8} {}", format!("{}:", top_k), color_metric(result.precision_at_k));
            println!("Incident recall:   {}", format_percent(result.recall_incidents));
        }
    }

    Ok(())
}
