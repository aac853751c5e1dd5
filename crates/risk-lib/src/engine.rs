//! The incident-risk engine
//!
//! One owned instance holds the telemetry buffer, the feature store and the
//! model. Mutating operations take `&mut self`; the engine has no internal
//! locking, so callers that share it across requests must serialize access.

use crate::alerts::{AlertEvaluator, RiskAlert};
use crate::backtest::{self, BacktestReport};
use crate::etl::{EtlReport, FeatureBuilder};
use crate::models::{FeatureRow, PartialFeatureRow, PredictionResult, TelemetryEvent};
use crate::predictor::{
    build_training_rows, latest_per_stream, score_row, ModelSnapshot, RiskModel, TrainingReport,
    DEFAULT_TOP_FACTORS,
};
use crate::telemetry::{IngestReport, TelemetryBuffer, TelemetryStats, DEFAULT_CAPACITY};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Fallback service/route name for batch rows that omit one
pub const UNKNOWN_STREAM: &str = "unknown";

/// Engine sizing knobs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Maximum buffered telemetry events
    pub buffer_capacity: usize,
    /// Contributing factors reported per prediction
    pub top_factors: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            buffer_capacity: DEFAULT_CAPACITY,
            top_factors: DEFAULT_TOP_FACTORS,
        }
    }
}

/// Engine-wide counters
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EngineSummary {
    pub telemetry: TelemetryStats,
    pub feature_rows: usize,
}

/// In-memory incident-risk engine
#[derive(Debug, Clone)]
pub struct RiskEngine {
    config: EngineConfig,
    telemetry: TelemetryBuffer,
    features: Vec<FeatureRow>,
    model: RiskModel,
}

impl Default for RiskEngine {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}

impl RiskEngine {
    pub fn new(config: EngineConfig) -> Self {
        Self {
            config,
            telemetry: TelemetryBuffer::new(config.buffer_capacity),
            features: Vec::new(),
            model: RiskModel::new(),
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Append raw events to the bounded buffer
    pub fn ingest(&mut self, events: Vec<TelemetryEvent>) -> IngestReport {
        self.telemetry.ingest(events)
    }

    /// Rebuild the feature store from buffered telemetry
    pub fn run_etl(&mut self, bucket_minutes: u32, lookback_hours: u32) -> EtlReport {
        self.run_etl_at(Utc::now(), bucket_minutes, lookback_hours)
    }

    /// [`RiskEngine::run_etl`] with an explicit notion of "now"
    ///
    /// The previous feature store is discarded, not merged.
    pub fn run_etl_at(&mut self, now: DateTime<Utc>, bucket_minutes: u32, lookback_hours: u32) -> EtlReport {
        let builder = FeatureBuilder::new(bucket_minutes, lookback_hours);
        self.features = builder.build(self.telemetry.iter(), now);

        info!(
            bucket_minutes,
            lookback_hours,
            events = self.telemetry.len(),
            generated_rows = self.features.len(),
            "Feature ETL completed"
        );

        EtlReport {
            generated_rows: self.features.len(),
            dataset: self.features.clone(),
        }
    }

    /// Label the feature store and continue training from the current weights
    pub fn train(
        &mut self,
        horizon_hours: u32,
        incident_threshold: f64,
        learning_rate: f64,
        epochs: u32,
    ) -> TrainingReport {
        let rows = build_training_rows(&self.features, horizon_hours, incident_threshold);
        if rows.is_empty() {
            debug!("No training rows available, model left unchanged");
        }
        self.model.train(&rows, learning_rate, epochs)
    }

    /// Score the latest row of each stream in the feature store
    pub fn infer_latest(&self, service: Option<&str>, route: Option<&str>) -> Vec<PredictionResult> {
        latest_per_stream(&self.features, service, route)
            .into_iter()
            .map(|row| {
                score_row(
                    &self.model,
                    &row.service,
                    &row.route,
                    row.bucket_start,
                    &row.values(),
                    self.config.top_factors,
                )
            })
            .collect()
    }

    /// Score externally supplied rows, ignoring the feature store
    pub fn infer_batch(&self, items: &[PartialFeatureRow]) -> Vec<PredictionResult> {
        self.infer_batch_at(Utc::now(), items)
    }

    /// [`RiskEngine::infer_batch`] with the bucket start used for rows that omit one
    pub fn infer_batch_at(&self, now: DateTime<Utc>, items: &[PartialFeatureRow]) -> Vec<PredictionResult> {
        items
            .iter()
            .map(|item| {
                score_row(
                    &self.model,
                    item.service.as_deref().unwrap_or(UNKNOWN_STREAM),
                    item.route.as_deref().unwrap_or(UNKNOWN_STREAM),
                    item.bucket_start.unwrap_or(now),
                    &item.values(),
                    self.config.top_factors,
                )
            })
            .collect()
    }

    /// Latest predictions whose risk score reaches `threshold`
    pub fn evaluate_alerts(&self, threshold: f64) -> Vec<RiskAlert> {
        AlertEvaluator::new(threshold).evaluate(self.infer_latest(None, None))
    }

    /// Evaluate the current model on a freshly labeled copy of the feature store
    pub fn backtest(&self, horizon_hours: u32, incident_threshold: f64, top_k: usize) -> BacktestReport {
        let rows = build_training_rows(&self.features, horizon_hours, incident_threshold);
        let report = backtest::backtest(&self.model, &rows, top_k);
        debug!(
            support = report.support,
            auc = report.auc,
            precision_at_k = report.precision_at_k,
            "Backtest completed"
        );
        report
    }

    pub fn summary(&self) -> EngineSummary {
        EngineSummary {
            telemetry: self.telemetry.stats(),
            feature_rows: self.features.len(),
        }
    }

    pub fn model_snapshot(&self) -> ModelSnapshot {
        self.model.snapshot()
    }

    pub fn feature_rows(&self) -> &[FeatureRow] {
        &self.features
    }

    pub fn telemetry(&self) -> &TelemetryBuffer {
        &self.telemetry
    }

    pub fn model(&self) -> &RiskModel {
        &self.model
    }

    /// Drop all telemetry and features and return the model to zero
    pub fn reset(&mut self) {
        self.telemetry.clear();
        self.features.clear();
        self.model.reset();
        info!("Engine state reset");
    }
}
