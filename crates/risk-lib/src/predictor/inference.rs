//! Risk scoring with feature attribution

use super::RiskScorer;
use crate::models::{FactorContribution, FeatureRow, FeatureValues, PredictionResult, StreamKey};
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;

/// Number of contributing factors reported per prediction
pub const DEFAULT_TOP_FACTORS: usize = 3;

/// The `n` features with the largest absolute contribution, largest first
///
/// Ties keep model feature order.
pub fn top_factors(contributions: &FeatureValues, n: usize) -> Vec<FactorContribution> {
    let mut factors: Vec<FactorContribution> = contributions
        .iter()
        .map(|(feature, contribution)| FactorContribution {
            feature,
            contribution,
        })
        .collect();
    factors.sort_by(|a, b| {
        b.contribution
            .abs()
            .partial_cmp(&a.contribution.abs())
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    factors.truncate(n);
    factors
}

/// Score one feature vector
pub fn score_row<S: RiskScorer + ?Sized>(
    scorer: &S,
    service: &str,
    route: &str,
    bucket_start: DateTime<Utc>,
    features: &FeatureValues,
    top_n: usize,
) -> PredictionResult {
    let contributions = scorer.contributions(features);
    let risk_score = super::sigmoid(scorer.bias() + contributions.0.iter().sum::<f64>());

    PredictionResult {
        service: service.to_string(),
        route: route.to_string(),
        bucket_start,
        risk_score,
        top_factors: top_factors(&contributions, top_n),
    }
}

/// Most recent row of every stream matching the optional filters
///
/// Results are ordered by (service, route).
pub fn latest_per_stream<'a>(
    rows: &'a [FeatureRow],
    service: Option<&str>,
    route: Option<&str>,
) -> Vec<&'a FeatureRow> {
    let mut latest: BTreeMap<StreamKey<'a>, &'a FeatureRow> = BTreeMap::new();
    for row in rows {
        if service.is_some_and(|s| s != row.service) || route.is_some_and(|r| r != row.route) {
            continue;
        }
        latest
            .entry(row.stream_key())
            .and_modify(|current| {
                if row.bucket_start > current.bucket_start {
                    *current = row;
                }
            })
            .or_insert(row);
    }
    latest.into_values().collect()
}
