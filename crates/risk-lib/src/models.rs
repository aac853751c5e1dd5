//! Core data models for the risk engine

use chrono::{DateTime, Utc};
use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};
use std::ops::{Index, IndexMut};

/// Number of model features
pub const NUM_FEATURES: usize = 8;

/// One observed request, as reported by a service
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TelemetryEvent {
    pub timestamp: DateTime<Utc>,
    pub service: String,
    pub route: String,
    pub status_code: u16,
    pub latency_ms: f64,
    pub memory_mb: f64,
    pub cpu_pct: f64,
    pub retries: u32,
    pub timeout: bool,
}

impl TelemetryEvent {
    pub fn is_server_error(&self) -> bool {
        self.status_code >= 500
    }
}

/// Identifier of a model feature
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FeatureKey {
    ErrorRate,
    P95LatencyMs,
    P99LatencyMs,
    AvgMemoryMb,
    AvgCpuPct,
    RetriesRate,
    TimeoutRate,
    TotalRequests,
}

impl FeatureKey {
    /// All features in model order
    pub const ALL: [FeatureKey; NUM_FEATURES] = [
        FeatureKey::ErrorRate,
        FeatureKey::P95LatencyMs,
        FeatureKey::P99LatencyMs,
        FeatureKey::AvgMemoryMb,
        FeatureKey::AvgCpuPct,
        FeatureKey::RetriesRate,
        FeatureKey::TimeoutRate,
        FeatureKey::TotalRequests,
    ];

    pub fn index(self) -> usize {
        self as usize
    }

    /// Wire name of the feature
    pub fn as_str(self) -> &'static str {
        match self {
            FeatureKey::ErrorRate => "errorRate",
            FeatureKey::P95LatencyMs => "p95LatencyMs",
            FeatureKey::P99LatencyMs => "p99LatencyMs",
            FeatureKey::AvgMemoryMb => "avgMemoryMb",
            FeatureKey::AvgCpuPct => "avgCpuPct",
            FeatureKey::RetriesRate => "retriesRate",
            FeatureKey::TimeoutRate => "timeoutRate",
            FeatureKey::TotalRequests => "totalRequests",
        }
    }
}

impl std::fmt::Display for FeatureKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Dense per-feature values indexed by [`FeatureKey`]
///
/// Used for raw feature vectors, standardized vectors, model weights and
/// scaler statistics alike. Serializes as a map keyed by feature name.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct FeatureValues(pub [f64; NUM_FEATURES]);

impl FeatureValues {
    pub const fn zeros() -> Self {
        Self([0.0; NUM_FEATURES])
    }

    pub const fn filled(value: f64) -> Self {
        Self([value; NUM_FEATURES])
    }

    pub fn dot(&self, other: &FeatureValues) -> f64 {
        self.0.iter().zip(other.0.iter()).map(|(a, b)| a * b).sum()
    }

    pub fn iter(&self) -> impl Iterator<Item = (FeatureKey, f64)> + '_ {
        FeatureKey::ALL.into_iter().map(move |k| (k, self[k]))
    }
}

impl Index<FeatureKey> for FeatureValues {
    type Output = f64;

    fn index(&self, key: FeatureKey) -> &f64 {
        &self.0[key.index()]
    }
}

impl IndexMut<FeatureKey> for FeatureValues {
    fn index_mut(&mut self, key: FeatureKey) -> &mut f64 {
        &mut self.0[key.index()]
    }
}

impl Serialize for FeatureValues {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(NUM_FEATURES))?;
        for (key, value) in self.iter() {
            map.serialize_entry(key.as_str(), &value)?;
        }
        map.end()
    }
}

/// Aggregated telemetry for one (service, route, bucket)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeatureRow {
    pub service: String,
    pub route: String,
    pub bucket_start: DateTime<Utc>,
    pub error_rate: f64,
    pub p95_latency_ms: f64,
    pub p99_latency_ms: f64,
    pub avg_memory_mb: f64,
    pub avg_cpu_pct: f64,
    pub retries_rate: f64,
    pub timeout_rate: f64,
    pub total_requests: u64,
}

impl FeatureRow {
    pub fn values(&self) -> FeatureValues {
        FeatureValues([
            self.error_rate,
            self.p95_latency_ms,
            self.p99_latency_ms,
            self.avg_memory_mb,
            self.avg_cpu_pct,
            self.retries_rate,
            self.timeout_rate,
            self.total_requests as f64,
        ])
    }

    /// Whether this bucket looks like an incident at the given threshold
    pub fn is_incident(&self, incident_threshold: f64) -> bool {
        self.error_rate >= incident_threshold || self.timeout_rate >= incident_threshold
    }

    pub fn stream_key(&self) -> StreamKey<'_> {
        StreamKey {
            service: &self.service,
            route: &self.route,
        }
    }
}

/// Borrowed (service, route) identity of a feature stream
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StreamKey<'a> {
    pub service: &'a str,
    pub route: &'a str,
}

/// Feature row with a forward-looking incident label
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TrainingRow {
    #[serde(flatten)]
    pub row: FeatureRow,
    pub label: u8,
}

impl TrainingRow {
    pub fn is_positive(&self) -> bool {
        self.label == 1
    }
}

/// Externally supplied row for batch scoring; missing numbers count as zero
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PartialFeatureRow {
    pub service: Option<String>,
    pub route: Option<String>,
    pub bucket_start: Option<DateTime<Utc>>,
    pub error_rate: Option<f64>,
    pub p95_latency_ms: Option<f64>,
    pub p99_latency_ms: Option<f64>,
    pub avg_memory_mb: Option<f64>,
    pub avg_cpu_pct: Option<f64>,
    pub retries_rate: Option<f64>,
    pub timeout_rate: Option<f64>,
    pub total_requests: Option<f64>,
}

impl PartialFeatureRow {
    pub fn values(&self) -> FeatureValues {
        FeatureValues([
            self.error_rate.unwrap_or(0.0),
            self.p95_latency_ms.unwrap_or(0.0),
            self.p99_latency_ms.unwrap_or(0.0),
            self.avg_memory_mb.unwrap_or(0.0),
            self.avg_cpu_pct.unwrap_or(0.0),
            self.retries_rate.unwrap_or(0.0),
            self.timeout_rate.unwrap_or(0.0),
            self.total_requests.unwrap_or(0.0),
        ])
    }

    pub(crate) fn provided(&self) -> [(FeatureKey, Option<f64>); NUM_FEATURES] {
        [
            (FeatureKey::ErrorRate, self.error_rate),
            (FeatureKey::P95LatencyMs, self.p95_latency_ms),
            (FeatureKey::P99LatencyMs, self.p99_latency_ms),
            (FeatureKey::AvgMemoryMb, self.avg_memory_mb),
            (FeatureKey::AvgCpuPct, self.avg_cpu_pct),
            (FeatureKey::RetriesRate, self.retries_rate),
            (FeatureKey::TimeoutRate, self.timeout_rate),
            (FeatureKey::TotalRequests, self.total_requests),
        ]
    }
}

/// Signed contribution of one feature to a risk score's logit
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FactorContribution {
    pub feature: FeatureKey,
    pub contribution: f64,
}

/// Scored feature row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PredictionResult {
    pub service: String,
    pub route: String,
    pub bucket_start: DateTime<Utc>,
    pub risk_score: f64,
    pub top_factors: Vec<FactorContribution>,
}
