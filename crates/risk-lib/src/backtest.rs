//! Model backtesting
//!
//! Scores a labeled set with the current model and reports ranking quality:
//! pairwise AUC, precision over the top-K riskiest rows, and the share of
//! incidents those K rows capture.

use crate::models::TrainingRow;
use crate::predictor::RiskScorer;
use serde::{Deserialize, Serialize};

/// Ranking metrics over one labeled set
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BacktestReport {
    pub auc: f64,
    pub precision_at_k: f64,
    pub recall_incidents: f64,
    pub support: usize,
}

/// Evaluate `scorer` against labeled rows
pub fn backtest<S: RiskScorer + ?Sized>(scorer: &S, rows: &[TrainingRow], top_k: usize) -> BacktestReport {
    if rows.is_empty() {
        return BacktestReport::default();
    }

    let scored: Vec<(f64, bool)> = rows
        .iter()
        .map(|r| (scorer.risk_score(&r.row.values()), r.is_positive()))
        .collect();

    let (auc, total_positives) = pairwise_auc(&scored);
    let (precision_at_k, recall_incidents) = top_k_metrics(&scored, top_k, total_positives);

    BacktestReport {
        auc,
        precision_at_k,
        recall_incidents,
        support: rows.len(),
    }
}

/// AUC as the fraction of (positive, negative) pairs ranked correctly
///
/// Ties earn half credit. Returns 0 when either class is empty, along with
/// the number of positives. O(P·N); a rank-sum formulation gives the same
/// value in O(n log n) if backtest sets grow large.
pub fn pairwise_auc(scored: &[(f64, bool)]) -> (f64, usize) {
    let positives: Vec<f64> = scored.iter().filter(|(_, y)| *y).map(|(s, _)| *s).collect();
    let negatives: Vec<f64> = scored.iter().filter(|(_, y)| !*y).map(|(s, _)| *s).collect();

    if positives.is_empty() || negatives.is_empty() {
        return (0.0, positives.len());
    }

    let mut credit = 0.0;
    for p in &positives {
        for n in &negatives {
            if p > n {
                credit += 1.0;
            } else if p == n {
                credit += 0.5;
            }
        }
    }

    let pairs = positives.len() as f64 * negatives.len() as f64;
    (credit / pairs, positives.len())
}

/// Precision and recall over the `top_k` highest scores
fn top_k_metrics(scored: &[(f64, bool)], top_k: usize, total_positives: usize) -> (f64, f64) {
    let mut ranked: Vec<&(f64, bool)> = scored.iter().collect();
    ranked.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(std::cmp::Ordering::Equal));

    let k = top_k.min(ranked.len());
    if k == 0 {
        return (0.0, 0.0);
    }
    let hits = ranked[..k].iter().filter(|(_, y)| *y).count();

    let precision = hits as f64 / k as f64;
    let recall = if total_positives == 0 {
        0.0
    } else {
        hits as f64 / total_positives as f64
    };
    (precision, recall)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{FeatureKey, FeatureRow, FeatureValues};
    use chrono::Utc;

    /// Scores rows by their error rate alone
    struct ErrorRateScorer;

    impl RiskScorer for ErrorRateScorer {
        fn bias(&self) -> f64 {
            0.0
        }

        fn contributions(&self, features: &FeatureValues) -> FeatureValues {
            let mut out = FeatureValues::zeros();
            out[FeatureKey::ErrorRate] = features[FeatureKey::ErrorRate];
            out
        }
    }

    fn labeled(error_rate: f64, label: u8) -> TrainingRow {
        TrainingRow {
            row: FeatureRow {
                service: "svc".to_string(),
                route: "/r".to_string(),
                bucket_start: Utc::now(),
                error_rate,
                p95_latency_ms: 0.0,
                p99_latency_ms: 0.0,
                avg_memory_mb: 0.0,
                avg_cpu_pct: 0.0,
                retries_rate: 0.0,
                timeout_rate: 0.0,
                total_requests: 1,
            },
            label,
        }
    }

    #[test]
    fn test_pairwise_auc_perfect_and_inverted() {
        let perfect = [(0.9, true), (0.8, true), (0.2, false), (0.1, false)];
        assert_eq!(pairwise_auc(&perfect), (1.0, 2));

        let inverted = [(0.1, true), (0.9, false)];
        assert_eq!(pairwise_auc(&inverted).0, 0.0);
    }

    #[test]
    fn test_pairwise_auc_ties_get_half_credit() {
        let tied = [(0.5, true), (0.5, false)];
        assert_eq!(pairwise_auc(&tied).0, 0.5);

        let mixed = [(0.7, true), (0.5, true), (0.5, false)];
        assert_eq!(pairwise_auc(&mixed).0, 0.75);
    }

    #[test]
    fn test_pairwise_auc_single_class() {
        assert_eq!(pairwise_auc(&[(0.4, true), (0.6, true)]), (0.0, 2));
        assert_eq!(pairwise_auc(&[(0.4, false)]), (0.0, 0));
    }

    #[test]
    fn test_empty_backtest_is_all_zero() {
        let report = backtest(&ErrorRateScorer, &[], 20);
        assert_eq!(report, BacktestReport::default());
        assert_eq!(report.support, 0);
    }

    #[test]
    fn test_precision_and_recall_at_k() {
        let rows = vec![
            labeled(0.9, 1),
            labeled(0.8, 0),
            labeled(0.7, 1),
            labeled(0.1, 0),
            labeled(0.05, 1),
        ];

        let report = backtest(&ErrorRateScorer, &rows, 2);

        assert_eq!(report.support, 5);
        assert_eq!(report.precision_at_k, 0.5);
        assert!((report.recall_incidents - 1.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_top_k_beyond_support() {
        let rows = vec![labeled(0.9, 1), labeled(0.2, 0), labeled(0.3, 0), labeled(0.6, 1)];

        let report = backtest(&ErrorRateScorer, &rows, 100);

        // precision equals the base rate, recall is complete
        assert_eq!(report.precision_at_k, 0.5);
        assert_eq!(report.recall_incidents, 1.0);
        assert_eq!(report.auc, 1.0);
    }

    #[test]
    fn test_no_positives_zero_recall() {
        let rows = vec![labeled(0.9, 0), labeled(0.2, 0)];
        let report = backtest(&ErrorRateScorer, &rows, 1);
        assert_eq!(report.precision_at_k, 0.0);
        assert_eq!(report.recall_incidents, 0.0);
        assert_eq!(report.auc, 0.0);
    }
}
