//! Alert evaluation and formatting

use crate::models::PredictionResult;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Risk score at or above which an alert is reported as critical
pub const CRITICAL_RISK_SCORE: f64 = 0.95;

/// Alert type classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertKind {
    PreventiveIncidentRisk,
}

impl std::fmt::Display for AlertKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AlertKind::PreventiveIncidentRisk => write!(f, "preventive_incident_risk"),
        }
    }
}

/// Alert severity levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertSeverity {
    Warning,
    Critical,
}

impl AlertSeverity {
    pub fn for_score(risk_score: f64) -> Self {
        if risk_score >= CRITICAL_RISK_SCORE {
            AlertSeverity::Critical
        } else {
            AlertSeverity::Warning
        }
    }
}

impl std::fmt::Display for AlertSeverity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AlertSeverity::Warning => write!(f, "warning"),
            AlertSeverity::Critical => write!(f, "critical"),
        }
    }
}

/// A prediction that crossed the alert threshold
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskAlert {
    #[serde(flatten)]
    pub prediction: PredictionResult,
    pub alert: AlertKind,
}

/// Alertmanager webhook alert format
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AlertmanagerAlert {
    /// Alert status (always firing here)
    pub status: String,
    /// Alert labels for routing and grouping
    pub labels: HashMap<String, String>,
    /// Alert annotations with details
    pub annotations: HashMap<String, String>,
    /// Start time in RFC3339 format
    pub starts_at: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub generator_url: Option<String>,
}

/// Alertmanager webhook payload (array of alerts)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlertmanagerPayload {
    pub alerts: Vec<AlertmanagerAlert>,
}

/// Filters predictions against a risk threshold
#[derive(Debug, Clone)]
pub struct AlertEvaluator {
    threshold: f64,
}

impl AlertEvaluator {
    pub fn new(threshold: f64) -> Self {
        Self { threshold }
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /// Keep predictions with `risk_score >= threshold`, preserving order
    pub fn evaluate(&self, predictions: Vec<PredictionResult>) -> Vec<RiskAlert> {
        predictions
            .into_iter()
            .filter(|p| p.risk_score >= self.threshold)
            .map(|prediction| RiskAlert {
                prediction,
                alert: AlertKind::PreventiveIncidentRisk,
            })
            .collect()
    }

    /// Format one alert for the Alertmanager webhook
    pub fn to_alertmanager(&self, alert: &RiskAlert, source: &str) -> AlertmanagerAlert {
        let p = &alert.prediction;
        let severity = AlertSeverity::for_score(p.risk_score);

        let mut labels = HashMap::new();
        labels.insert("alertname".to_string(), "PreventiveIncidentRisk".to_string());
        labels.insert("alert".to_string(), alert.alert.to_string());
        labels.insert("severity".to_string(), severity.to_string());
        labels.insert("service".to_string(), p.service.clone());
        labels.insert("route".to_string(), p.route.clone());
        labels.insert("source".to_string(), source.to_string());

        let factors = p
            .top_factors
            .iter()
            .map(|f| format!("{} ({:+.3})", f.feature, f.contribution))
            .collect::<Vec<_>>()
            .join(", ");

        let mut annotations = HashMap::new();
        annotations.insert(
            "summary".to_string(),
            format!("Elevated incident risk for {} {}", p.service, p.route),
        );
        annotations.insert(
            "description".to_string(),
            format!(
                "Risk score {:.3} is at or above threshold {:.3}. Top factors: {}.",
                p.risk_score, self.threshold, factors
            ),
        );
        annotations.insert("risk_score".to_string(), format!("{:.4}", p.risk_score));
        annotations.insert("bucket_start".to_string(), rfc3339(&p.bucket_start));

        AlertmanagerAlert {
            status: "firing".to_string(),
            labels,
            annotations,
            starts_at: rfc3339(&p.bucket_start),
            generator_url: None,
        }
    }

    /// Create an Alertmanager payload from raised alerts
    pub fn alertmanager_payload(&self, alerts: &[RiskAlert], source: &str) -> AlertmanagerPayload {
        AlertmanagerPayload {
            alerts: alerts.iter().map(|a| self.to_alertmanager(a, source)).collect(),
        }
    }
}

fn rfc3339(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(chrono::SecondsFormat::Secs, true)
}
