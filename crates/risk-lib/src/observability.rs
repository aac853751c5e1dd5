//! Observability infrastructure for the risk engine
//!
//! Provides:
//! - Prometheus metrics (buffer occupancy, ETL/training latency, model and backtest quality)
//! - Structured JSON logging with tracing

use crate::backtest::BacktestReport;
use crate::etl::EtlReport;
use crate::predictor::TrainingReport;
use crate::telemetry::IngestReport;
use prometheus::{
    register_gauge, register_histogram, register_int_counter, register_int_gauge, Encoder, Gauge,
    Histogram, IntCounter, IntGauge, TextEncoder,
};
use std::sync::OnceLock;
use tracing::{info, warn};

/// Histogram buckets for ETL and training latency (in seconds)
const LATENCY_BUCKETS: &[f64] = &[
    0.0005, 0.001, 0.0025, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0,
];

/// Global metrics instance (registered once)
static GLOBAL_METRICS: OnceLock<EngineMetricsInner> = OnceLock::new();

struct EngineMetricsInner {
    buffer_events: IntGauge,
    evicted_events: IntCounter,
    feature_rows: IntGauge,
    etl_latency_seconds: Histogram,
    training_latency_seconds: Histogram,
    training_rows: IntGauge,
    training_positives: IntGauge,
    predictions: IntCounter,
    alerts: IntCounter,
    backtest_auc: Gauge,
    backtest_precision_at_k: Gauge,
}

impl EngineMetricsInner {
    fn new() -> Self {
        Self {
            buffer_events: register_int_gauge!(
                "incident_risk_buffer_events",
                "Telemetry events currently held in the buffer"
            )
            .expect("Failed to register buffer_events"),

            evicted_events: register_int_counter!(
                "incident_risk_evicted_events_total",
                "Telemetry events dropped from the buffer at capacity"
            )
            .expect("Failed to register evicted_events"),

            feature_rows: register_int_gauge!(
                "incident_risk_feature_rows",
                "Rows in the feature store after the last ETL run"
            )
            .expect("Failed to register feature_rows"),

            etl_latency_seconds: register_histogram!(
                "incident_risk_etl_latency_seconds",
                "Time spent rebuilding the feature store",
                LATENCY_BUCKETS.to_vec()
            )
            .expect("Failed to register etl_latency_seconds"),

            training_latency_seconds: register_histogram!(
                "incident_risk_training_latency_seconds",
                "Time spent labeling and training the model",
                LATENCY_BUCKETS.to_vec()
            )
            .expect("Failed to register training_latency_seconds"),

            training_rows: register_int_gauge!(
                "incident_risk_training_rows",
                "Labeled rows used by the last training run"
            )
            .expect("Failed to register training_rows"),

            training_positives: register_int_gauge!(
                "incident_risk_training_positives",
                "Positive labels in the last training run"
            )
            .expect("Failed to register training_positives"),

            predictions: register_int_counter!(
                "incident_risk_predictions_total",
                "Total number of risk predictions produced"
            )
            .expect("Failed to register predictions"),

            alerts: register_int_counter!(
                "incident_risk_alerts_total",
                "Total number of preventive alerts raised"
            )
            .expect("Failed to register alerts"),

            backtest_auc: register_gauge!(
                "incident_risk_backtest_auc",
                "AUC of the most recent backtest"
            )
            .expect("Failed to register backtest_auc"),

            backtest_precision_at_k: register_gauge!(
                "incident_risk_backtest_precision_at_k",
                "Precision@K of the most recent backtest"
            )
            .expect("Failed to register backtest_precision_at_k"),
        }
    }
}

/// Engine metrics for Prometheus exposition
///
/// A lightweight handle to the global metrics instance; clones share the
/// same underlying metrics.
#[derive(Clone)]
pub struct EngineMetrics {
    _private: (),
}

impl Default for EngineMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl EngineMetrics {
    /// Create a new metrics handle (initializes global metrics if needed)
    pub fn new() -> Self {
        GLOBAL_METRICS.get_or_init(EngineMetricsInner::new);
        Self { _private: () }
    }

    fn inner(&self) -> &EngineMetricsInner {
        GLOBAL_METRICS.get_or_init(EngineMetricsInner::new)
    }

    pub fn record_ingest(&self, report: &IngestReport) {
        self.inner().buffer_events.set(report.retained as i64);
        self.inner().evicted_events.inc_by(report.evicted as u64);
    }

    pub fn record_etl(&self, report: &EtlReport, duration_secs: f64) {
        self.inner().etl_latency_seconds.observe(duration_secs);
        self.inner().feature_rows.set(report.generated_rows as i64);
    }

    pub fn record_training(&self, report: &TrainingReport, duration_secs: f64) {
        self.inner().training_latency_seconds.observe(duration_secs);
        self.inner().training_rows.set(report.trained_rows as i64);
        self.inner().training_positives.set(report.positives as i64);
    }

    pub fn inc_predictions(&self, count: usize) {
        self.inner().predictions.inc_by(count as u64);
    }

    pub fn inc_alerts(&self, count: usize) {
        self.inner().alerts.inc_by(count as u64);
    }

    pub fn record_backtest(&self, report: &BacktestReport) {
        self.inner().backtest_auc.set(report.auc);
        self.inner().backtest_precision_at_k.set(report.precision_at_k);
    }

    /// Zero the state gauges after an engine reset; counters keep running
    pub fn record_reset(&self) {
        let inner = self.inner();
        inner.buffer_events.set(0);
        inner.feature_rows.set(0);
        inner.training_rows.set(0);
        inner.training_positives.set(0);
        inner.backtest_auc.set(0.0);
        inner.backtest_precision_at_k.set(0.0);
    }

    /// Render the default registry in the Prometheus text format
    pub fn render(&self) -> String {
        let encoder = TextEncoder::new();
        let metric_families = prometheus::gather();
        let mut buffer = Vec::new();
        if encoder.encode(&metric_families, &mut buffer).is_err() {
            return String::new();
        }
        String::from_utf8(buffer).unwrap_or_default()
    }
}

/// Structured logger for engine events
///
/// Provides consistent event-tagged logging for ingestion, training and
/// alerting so that JSON output can be filtered by `event`.
#[derive(Clone)]
pub struct StructuredLogger {
    instance: String,
}

impl StructuredLogger {
    pub fn new(instance: impl Into<String>) -> Self {
        Self {
            instance: instance.into(),
        }
    }

    pub fn instance(&self) -> &str {
        &self.instance
    }

    /// Log engine startup
    pub fn log_startup(&self, version: &str, buffer_capacity: usize) {
        info!(
            event = "engine_started",
            instance = %self.instance,
            version = %version,
            buffer_capacity = buffer_capacity,
            "Incident risk engine started"
        );
    }

    /// Log engine shutdown
    pub fn log_shutdown(&self, reason: &str) {
        info!(
            event = "engine_shutdown",
            instance = %self.instance,
            reason = %reason,
            "Incident risk engine shutting down"
        );
    }

    pub fn log_ingest(&self, report: &IngestReport) {
        if report.evicted > 0 {
            warn!(
                event = "telemetry_ingested",
                instance = %self.instance,
                ingested = report.ingested,
                retained = report.retained,
                evicted = report.evicted,
                "Telemetry buffer at capacity, oldest events evicted"
            );
        } else {
            info!(
                event = "telemetry_ingested",
                instance = %self.instance,
                ingested = report.ingested,
                retained = report.retained,
                "Telemetry ingested"
            );
        }
    }

    pub fn log_etl(&self, report: &EtlReport, bucket_minutes: u32, lookback_hours: u32) {
        info!(
            event = "etl_completed",
            instance = %self.instance,
            generated_rows = report.generated_rows,
            bucket_minutes = bucket_minutes,
            lookback_hours = lookback_hours,
            "Feature store rebuilt"
        );
    }

    pub fn log_training(&self, report: &TrainingReport, epochs: u32) {
        if report.trained_rows == 0 {
            warn!(
                event = "model_trained",
                instance = %self.instance,
                trained_rows = 0,
                "No labeled rows, model left unchanged"
            );
        } else {
            info!(
                event = "model_trained",
                instance = %self.instance,
                trained_rows = report.trained_rows,
                positives = report.positives,
                epochs = epochs,
                "Model training completed"
            );
        }
    }

    pub fn log_backtest(&self, report: &BacktestReport) {
        info!(
            event = "backtest_completed",
            instance = %self.instance,
            auc = report.auc,
            precision_at_k = report.precision_at_k,
            recall_incidents = report.recall_incidents,
            support = report.support,
            "Backtest completed"
        );
    }

    /// Log an alert evaluation; warns when any alert fired
    pub fn log_alerts(&self, threshold: f64, count: usize) {
        if count > 0 {
            warn!(
                event = "alerts_evaluated",
                instance = %self.instance,
                threshold = threshold,
                count = count,
                "Preventive incident-risk alerts raised"
            );
        } else {
            info!(
                event = "alerts_evaluated",
                instance = %self.instance,
                threshold = threshold,
                count = 0,
                "No streams above alert threshold"
            );
        }
    }

    pub fn log_reset(&self) {
        info!(
            event = "engine_reset",
            instance = %self.instance,
            "Engine state cleared"
        );
    }
}
