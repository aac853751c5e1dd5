//! Request parameters and their validated bounds
//!
//! The engine trusts its inputs; callers run `validate()` on these types
//! before handing values to [`crate::engine::RiskEngine`].

use crate::models::{PartialFeatureRow, TelemetryEvent};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Rejected request parameter
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("{field} must be between {min} and {max}, got {value}")]
    OutOfRange {
        field: &'static str,
        min: f64,
        max: f64,
        value: f64,
    },

    #[error("{field} must contain at least one item")]
    Empty { field: &'static str },

    #[error("{field} must be a finite number")]
    NotFinite { field: String },

    #[error("{field} must not be blank")]
    Blank { field: String },
}

fn check_range(field: &'static str, value: f64, min: f64, max: f64) -> Result<(), ValidationError> {
    if value.is_finite() && (min..=max).contains(&value) {
        Ok(())
    } else {
        Err(ValidationError::OutOfRange {
            field,
            min,
            max,
            value,
        })
    }
}

fn check_finite(field: impl FnOnce() -> String, value: f64) -> Result<(), ValidationError> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(ValidationError::NotFinite { field: field() })
    }
}

fn default_bucket_minutes() -> u32 {
    5
}

fn default_lookback_hours() -> u32 {
    24
}

fn default_horizon_hours() -> u32 {
    6
}

fn default_incident_threshold() -> f64 {
    0.2
}

fn default_learning_rate() -> f64 {
    0.05
}

fn default_epochs() -> u32 {
    100
}

fn default_alert_threshold() -> f64 {
    0.8
}

fn default_top_k() -> usize {
    20
}

/// Batch of telemetry events to ingest
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestRequest {
    pub events: Vec<TelemetryEvent>,
}

impl IngestRequest {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.events.is_empty() {
            return Err(ValidationError::Empty { field: "events" });
        }
        for (i, event) in self.events.iter().enumerate() {
            if event.service.trim().is_empty() {
                return Err(ValidationError::Blank {
                    field: format!("events[{}].service", i),
                });
            }
            if event.route.trim().is_empty() {
                return Err(ValidationError::Blank {
                    field: format!("events[{}].route", i),
                });
            }
            check_range("latencyMs", event.latency_ms, 0.0, f64::MAX)?;
            check_range("memoryMb", event.memory_mb, 0.0, f64::MAX)?;
            check_range("cpuPct", event.cpu_pct, 0.0, 100.0)?;
        }
        Ok(())
    }
}

/// ETL window parameters
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EtlParams {
    #[serde(default = "default_bucket_minutes")]
    pub bucket_minutes: u32,
    #[serde(default = "default_lookback_hours")]
    pub lookback_hours: u32,
}

impl Default for EtlParams {
    fn default() -> Self {
        Self {
            bucket_minutes: default_bucket_minutes(),
            lookback_hours: default_lookback_hours(),
        }
    }
}

impl EtlParams {
    pub fn validate(&self) -> Result<(), ValidationError> {
        check_range("bucketMinutes", f64::from(self.bucket_minutes), 1.0, 120.0)?;
        check_range("lookbackHours", f64::from(self.lookback_hours), 1.0, 168.0)
    }
}

/// Training parameters
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrainParams {
    #[serde(default = "default_horizon_hours")]
    pub horizon_hours: u32,
    #[serde(default = "default_incident_threshold")]
    pub incident_threshold: f64,
    #[serde(default = "default_learning_rate")]
    pub learning_rate: f64,
    #[serde(default = "default_epochs")]
    pub epochs: u32,
}

impl Default for TrainParams {
    fn default() -> Self {
        Self {
            horizon_hours: default_horizon_hours(),
            incident_threshold: default_incident_threshold(),
            learning_rate: default_learning_rate(),
            epochs: default_epochs(),
        }
    }
}

impl TrainParams {
    pub fn validate(&self) -> Result<(), ValidationError> {
        check_range("horizonHours", f64::from(self.horizon_hours), 1.0, 48.0)?;
        check_range("incidentThreshold", self.incident_threshold, 0.01, 1.0)?;
        check_range("learningRate", self.learning_rate, 0.0001, 1.0)?;
        check_range("epochs", f64::from(self.epochs), 1.0, 500.0)
    }
}

/// Rows to score outside the feature store
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchRequest {
    pub items: Vec<PartialFeatureRow>,
}

impl BatchRequest {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.items.is_empty() {
            return Err(ValidationError::Empty { field: "items" });
        }
        for (i, item) in self.items.iter().enumerate() {
            for (key, value) in item.provided() {
                if let Some(v) = value {
                    check_finite(|| format!("items[{}].{}", i, key), v)?;
                }
            }
        }
        Ok(())
    }
}

/// Optional stream filter for live inference
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LiveQuery {
    pub service: Option<String>,
    pub route: Option<String>,
}

/// Alert threshold
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AlertParams {
    #[serde(default = "default_alert_threshold")]
    pub threshold: f64,
}

impl Default for AlertParams {
    fn default() -> Self {
        Self {
            threshold: default_alert_threshold(),
        }
    }
}

impl AlertParams {
    pub fn validate(&self) -> Result<(), ValidationError> {
        check_range("threshold", self.threshold, 0.0, 1.0)
    }
}

/// Backtest parameters, independent of those used at training time
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BacktestParams {
    #[serde(default = "default_horizon_hours")]
    pub horizon_hours: u32,
    #[serde(default = "default_incident_threshold")]
    pub incident_threshold: f64,
    #[serde(default = "default_top_k", rename = "topK")]
    pub top_k: usize,
}

impl Default for BacktestParams {
    fn default() -> Self {
        Self {
            horizon_hours: default_horizon_hours(),
            incident_threshold: default_incident_threshold(),
            top_k: default_top_k(),
        }
    }
}

impl BacktestParams {
    pub fn validate(&self) -> Result<(), ValidationError> {
        check_range("horizonHours", f64::from(self.horizon_hours), 1.0, 48.0)?;
        check_range("incidentThreshold", self.incident_threshold, 0.01, 1.0)?;
        check_range("topK", self.top_k as f64, 1.0, 1000.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn event() -> TelemetryEvent {
        TelemetryEvent {
            timestamp: Utc::now(),
            service: "api".to_string(),
            route: "/health".to_string(),
            status_code: 200,
            latency_ms: 12.0,
            memory_mb: 128.0,
            cpu_pct: 5.0,
            retries: 0,
            timeout: false,
        }
    }

    #[test]
    fn test_defaults_from_empty_body() {
        let etl: EtlParams = serde_json::from_str("{}").unwrap();
        assert_eq!(etl, EtlParams::default());
        assert_eq!(etl.bucket_minutes, 5);
        assert_eq!(etl.lookback_hours, 24);

        let train: TrainParams = serde_json::from_str("{}").unwrap();
        assert_eq!(train.horizon_hours, 6);
        assert_eq!(train.incident_threshold, 0.2);
        assert_eq!(train.learning_rate, 0.05);
        assert_eq!(train.epochs, 100);

        let alerts: AlertParams = serde_json::from_str("{}").unwrap();
        assert_eq!(alerts.threshold, 0.8);

        let backtest: BacktestParams = serde_json::from_str(r#"{"topK": 3}"#).unwrap();
        assert_eq!(backtest.top_k, 3);
        assert_eq!(backtest.horizon_hours, 6);
    }

    #[test]
    fn test_defaults_are_valid() {
        assert!(EtlParams::default().validate().is_ok());
        assert!(TrainParams::default().validate().is_ok());
        assert!(AlertParams::default().validate().is_ok());
        assert!(BacktestParams::default().validate().is_ok());
    }

    #[test]
    fn test_out_of_range_rejected() {
        let etl = EtlParams {
            bucket_minutes: 0,
            lookback_hours: 24,
        };
        assert!(matches!(
            etl.validate(),
            Err(ValidationError::OutOfRange { field: "bucketMinutes", .. })
        ));

        let train = TrainParams {
            epochs: 501,
            ..Default::default()
        };
        assert!(train.validate().is_err());

        let train = TrainParams {
            learning_rate: f64::NAN,
            ..Default::default()
        };
        assert!(train.validate().is_err());

        assert!(AlertParams { threshold: 1.01 }.validate().is_err());
        assert!(AlertParams { threshold: 0.0 }.validate().is_ok());

        let backtest = BacktestParams {
            top_k: 0,
            ..Default::default()
        };
        assert!(backtest.validate().is_err());
    }

    #[test]
    fn test_ingest_validation() {
        assert_eq!(
            IngestRequest { events: vec![] }.validate(),
            Err(ValidationError::Empty { field: "events" })
        );
        assert!(IngestRequest { events: vec![event()] }.validate().is_ok());

        let mut hot = event();
        hot.cpu_pct = 140.0;
        assert!(IngestRequest { events: vec![hot] }.validate().is_err());

        let mut negative = event();
        negative.latency_ms = -1.0;
        assert!(IngestRequest { events: vec![negative] }.validate().is_err());

        let mut blank = event();
        blank.route = "  ".to_string();
        let err = IngestRequest { events: vec![event(), blank] }.validate().unwrap_err();
        assert_eq!(err.to_string(), "events[1].route must not be blank");
    }

    #[test]
    fn test_batch_validation() {
        assert!(BatchRequest { items: vec![] }.validate().is_err());
        assert!(BatchRequest {
            items: vec![PartialFeatureRow::default()]
        }
        .validate()
        .is_ok());

        let bad = PartialFeatureRow {
            p99_latency_ms: Some(f64::INFINITY),
            ..Default::default()
        };
        let err = BatchRequest { items: vec![bad] }.validate().unwrap_err();
        assert_eq!(err.to_string(), "items[0].p99LatencyMs must be a finite number");
    }

    #[test]
    fn test_error_messages() {
        let err = AlertParams { threshold: 2.0 }.validate().unwrap_err();
        assert_eq!(err.to_string(), "threshold must be between 0 and 1, got 2");
    }
}
