//! Feature standardization

use crate::models::{FeatureKey, FeatureValues, TrainingRow};

/// Standard deviations below this are treated as zero
pub const STD_EPSILON: f64 = 1e-9;

/// Per-feature mean and population standard deviation
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Scaler {
    pub mean: FeatureValues,
    pub std: FeatureValues,
}

impl Default for Scaler {
    fn default() -> Self {
        Self {
            mean: FeatureValues::zeros(),
            std: FeatureValues::filled(1.0),
        }
    }
}

impl Scaler {
    /// Fit from the current training set
    ///
    /// A feature with (near-)zero spread gets a standard deviation of 1.
    pub fn fit(rows: &[TrainingRow]) -> Self {
        if rows.is_empty() {
            return Self::default();
        }
        let n = rows.len() as f64;
        let values: Vec<FeatureValues> = rows.iter().map(|r| r.row.values()).collect();

        let mut mean = FeatureValues::zeros();
        for v in &values {
            for key in FeatureKey::ALL {
                mean[key] += v[key];
            }
        }
        for key in FeatureKey::ALL {
            mean[key] /= n;
        }

        let mut std = FeatureValues::zeros();
        for v in &values {
            for key in FeatureKey::ALL {
                std[key] += (v[key] - mean[key]).powi(2);
            }
        }
        for key in FeatureKey::ALL {
            let sd = (std[key] / n).sqrt();
            std[key] = if sd < STD_EPSILON { 1.0 } else { sd };
        }

        Self { mean, std }
    }

    pub fn standardize(&self, features: &FeatureValues) -> FeatureValues {
        let mut z = FeatureValues::zeros();
        for key in FeatureKey::ALL {
            z[key] = (features[key] - self.mean[key]) / self.std[key];
        }
        z
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::FeatureRow;
    use chrono::Utc;

    fn training_row(error_rate: f64, latency: f64) -> TrainingRow {
        TrainingRow {
            row: FeatureRow {
                service: "svc".to_string(),
                route: "/r".to_string(),
                bucket_start: Utc::now(),
                error_rate,
                p95_latency_ms: latency,
                p99_latency_ms: latency,
                avg_memory_mb: 100.0,
                avg_cpu_pct: 10.0,
                retries_rate: 0.0,
                timeout_rate: 0.0,
                total_requests: 10,
            },
            label: 0,
        }
    }

    #[test]
    fn test_fit_population_std() {
        let rows = vec![training_row(0.0, 2.0), training_row(0.0, 4.0), training_row(0.0, 6.0)];
        let scaler = Scaler::fit(&rows);

        assert!((scaler.mean[FeatureKey::P95LatencyMs] - 4.0).abs() < 1e-12);
        // population std of [2, 4, 6]
        let expected = (8.0_f64 / 3.0).sqrt();
        assert!((scaler.std[FeatureKey::P95LatencyMs] - expected).abs() < 1e-12);
    }

    #[test]
    fn test_constant_feature_gets_unit_std() {
        let rows = vec![training_row(0.1, 2.0), training_row(0.3, 4.0)];
        let scaler = Scaler::fit(&rows);

        assert_eq!(scaler.std[FeatureKey::AvgMemoryMb], 1.0);
        assert_eq!(scaler.std[FeatureKey::TotalRequests], 1.0);
        assert_eq!(scaler.mean[FeatureKey::AvgMemoryMb], 100.0);
    }

    #[test]
    fn test_standardize() {
        let rows = vec![training_row(0.0, 2.0), training_row(0.0, 6.0)];
        let scaler = Scaler::fit(&rows);
        let z = scaler.standardize(&rows[1].row.values());

        assert!((z[FeatureKey::P95LatencyMs] - 1.0).abs() < 1e-12);
        assert_eq!(z[FeatureKey::AvgMemoryMb], 0.0);
    }

    #[test]
    fn test_default_is_identity() {
        let scaler = Scaler::default();
        let values = FeatureValues([1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0]);
        assert_eq!(scaler.standardize(&values), values);
    }
}
