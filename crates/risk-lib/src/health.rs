//! Health check infrastructure for the risk engine
//!
//! Component health is derived from engine state on every probe rather than
//! tracked separately, so it cannot drift from what the engine holds.

use crate::engine::RiskEngine;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Health status of a component
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ComponentStatus {
    /// Component is functioning normally
    Healthy,
    /// Component works but its output is incomplete
    Degraded,
}

/// Information about a component's health
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComponentHealth {
    pub status: ComponentStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub last_check_timestamp: i64,
}

impl ComponentHealth {
    pub fn healthy() -> Self {
        Self {
            status: ComponentStatus::Healthy,
            message: None,
            last_check_timestamp: chrono::Utc::now().timestamp(),
        }
    }

    pub fn degraded(message: impl Into<String>) -> Self {
        Self {
            status: ComponentStatus::Degraded,
            message: Some(message.into()),
            last_check_timestamp: chrono::Utc::now().timestamp(),
        }
    }
}

/// Component names for health reporting
pub mod components {
    pub const TELEMETRY: &str = "telemetry";
    pub const FEATURE_STORE: &str = "feature_store";
    pub const MODEL: &str = "model";
}

/// Overall health response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: ComponentStatus,
    pub components: BTreeMap<String, ComponentHealth>,
}

impl HealthResponse {
    /// Inspect the engine and report each component
    pub fn from_engine(engine: &RiskEngine) -> Self {
        let mut components = BTreeMap::new();

        let telemetry = engine.telemetry();
        let telemetry_health = if telemetry.is_saturated() {
            ComponentHealth::degraded(format!(
                "Buffer at capacity ({} events), oldest events are being evicted",
                telemetry.capacity()
            ))
        } else {
            ComponentHealth::healthy()
        };
        components.insert(components::TELEMETRY.to_string(), telemetry_health);

        let feature_health = if !telemetry.is_empty() && engine.feature_rows().is_empty() {
            ComponentHealth::degraded("Telemetry buffered but no feature rows, run ETL")
        } else {
            ComponentHealth::healthy()
        };
        components.insert(components::FEATURE_STORE.to_string(), feature_health);

        let model_health = if engine.model().is_trained() {
            ComponentHealth::healthy()
        } else {
            ComponentHealth::degraded("Model untrained, all scores are 0.5")
        };
        components.insert(components::MODEL.to_string(), model_health);

        let status = Self::compute_status(&components);
        Self { status, components }
    }

    /// Compute overall status from component statuses
    pub fn compute_status(components: &BTreeMap<String, ComponentHealth>) -> ComponentStatus {
        if components
            .values()
            .any(|health| health.status == ComponentStatus::Degraded)
        {
            ComponentStatus::Degraded
        } else {
            ComponentStatus::Healthy
        }
    }
}

/// Readiness response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReadinessResponse {
    pub ready: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl ReadinessResponse {
    pub fn ready() -> Self {
        Self {
            ready: true,
            reason: None,
        }
    }

    pub fn not_ready(reason: impl Into<String>) -> Self {
        Self {
            ready: false,
            reason: Some(reason.into()),
        }
    }
}
