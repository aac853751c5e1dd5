//! Incident-risk prediction engine
//!
//! Labels historical feature rows, fits the scaler, trains the logistic
//! model and scores rows with per-feature attribution.

mod inference;
mod labels;
mod model;
mod scaler;

pub use inference::{latest_per_stream, score_row, top_factors, DEFAULT_TOP_FACTORS};
pub use labels::build_training_rows;
pub use model::{ModelSnapshot, RiskModel, TrainingReport};
pub use scaler::{Scaler, STD_EPSILON};

use crate::models::FeatureValues;

/// Trait for anything that can turn raw features into a risk score
pub trait RiskScorer {
    /// Bias term of the logit
    fn bias(&self) -> f64;

    /// Per-feature signed logit contributions for a raw feature vector
    fn contributions(&self, features: &FeatureValues) -> FeatureValues;

    /// Probability that the row precedes an incident
    fn risk_score(&self, features: &FeatureValues) -> f64 {
        let contributions = self.contributions(features);
        sigmoid(self.bias() + contributions.0.iter().sum::<f64>())
    }
}

/// Logistic function
pub fn sigmoid(x: f64) -> f64 {
    1.0 / (1.0 + (-x).exp())
}
