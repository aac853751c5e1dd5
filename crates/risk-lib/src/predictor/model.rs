//! Online logistic-regression model
//!
//! A single weight vector and bias over standardized features, trained by
//! per-sample gradient descent. Training warm-starts from the current
//! weights; only [`RiskModel::reset`] returns the model to zero.

use super::scaler::Scaler;
use super::{sigmoid, RiskScorer};
use crate::models::{FeatureKey, FeatureValues, TrainingRow};
use serde::Serialize;
use tracing::debug;

/// Outcome of a training call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TrainingReport {
    pub trained_rows: usize,
    pub positives: usize,
}

/// Serializable view of the current model state
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelSnapshot {
    pub weights: FeatureValues,
    pub bias: f64,
    pub mean: FeatureValues,
    pub std: FeatureValues,
    pub training_runs: u64,
    pub samples_seen: u64,
}

/// Logistic model with its fitted scaler
#[derive(Debug, Clone, Default)]
pub struct RiskModel {
    weights: FeatureValues,
    bias: f64,
    scaler: Scaler,
    training_runs: u64,
    samples_seen: u64,
}

impl RiskModel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Continue training on a labeled set
    ///
    /// An empty set leaves weights, bias and scaler untouched. Otherwise the
    /// scaler is refit from `rows` and `epochs` ordered passes of SGD run
    /// from the current weights.
    pub fn train(&mut self, rows: &[TrainingRow], learning_rate: f64, epochs: u32) -> TrainingReport {
        if rows.is_empty() {
            return TrainingReport {
                trained_rows: 0,
                positives: 0,
            };
        }

        self.scaler = Scaler::fit(rows);
        let standardized: Vec<(FeatureValues, f64)> = rows
            .iter()
            .map(|r| (self.scaler.standardize(&r.row.values()), f64::from(r.label)))
            .collect();

        for _ in 0..epochs {
            for (z, label) in &standardized {
                let pred = sigmoid(self.bias + self.weights.dot(z));
                let error = pred - label;
                for key in FeatureKey::ALL {
                    self.weights[key] -= learning_rate * error * z[key];
                }
                self.bias -= learning_rate * error;
            }
        }

        self.training_runs += 1;
        self.samples_seen += rows.len() as u64 * u64::from(epochs);

        let positives = rows.iter().filter(|r| r.is_positive()).count();
        debug!(
            rows = rows.len(),
            positives,
            epochs,
            bias = self.bias,
            "Model training pass completed"
        );

        TrainingReport {
            trained_rows: rows.len(),
            positives,
        }
    }

    /// Zero the weights and bias and restore the default scaler
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn weights(&self) -> &FeatureValues {
        &self.weights
    }

    pub fn scaler(&self) -> &Scaler {
        &self.scaler
    }

    /// Whether any training run has touched the weights since the last reset
    pub fn is_trained(&self) -> bool {
        self.training_runs > 0
    }

    pub fn snapshot(&self) -> ModelSnapshot {
        ModelSnapshot {
            weights: self.weights,
            bias: self.bias,
            mean: self.scaler.mean,
            std: self.scaler.std,
            training_runs: self.training_runs,
            samples_seen: self.samples_seen,
        }
    }
}

impl RiskScorer for RiskModel {
    fn bias(&self) -> f64 {
        self.bias
    }

    fn contributions(&self, features: &FeatureValues) -> FeatureValues {
        let z = self.scaler.standardize(features);
        let mut out = FeatureValues::zeros();
        for key in FeatureKey::ALL {
            out[key] = self.weights[key] * z[key];
        }
        out
    }
}
