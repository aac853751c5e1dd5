//! Preventive incident-risk alerts
//!
//! This module provides:
//! - Threshold filtering of the latest per-stream predictions
//! - Alertmanager webhook formatting for raised alerts

mod alerter;

pub use alerter::{
    AlertEvaluator, AlertKind, AlertSeverity, AlertmanagerAlert, AlertmanagerPayload, RiskAlert,
    CRITICAL_RISK_SCORE,
};
