//! Forward-looking incident labels
//!
//! A row is positive when some later bucket of the same stream, within the
//! horizon, crosses the incident threshold. Rows at or before the labeled
//! bucket never influence its label.

use crate::models::{FeatureRow, StreamKey, TrainingRow};
use chrono::Duration;
use std::collections::BTreeMap;

/// Label every feature row by scanning forward within `horizon_hours`
///
/// Rows are grouped per (service, route) and emitted stream by stream in
/// key order, ascending in time within each stream. The forward window is
/// bounded by binary search and counted from a prefix sum of incident flags.
pub fn build_training_rows(
    rows: &[FeatureRow],
    horizon_hours: u32,
    incident_threshold: f64,
) -> Vec<TrainingRow> {
    let horizon = Duration::hours(i64::from(horizon_hours));

    let mut streams: BTreeMap<StreamKey<'_>, Vec<&FeatureRow>> = BTreeMap::new();
    for row in rows {
        streams.entry(row.stream_key()).or_default().push(row);
    }

    let mut training = Vec::with_capacity(rows.len());
    for stream in streams.values_mut() {
        stream.sort_by_key(|r| r.bucket_start);

        // incidents_before[j] = number of incident rows in stream[..j]
        let mut incidents_before = Vec::with_capacity(stream.len() + 1);
        incidents_before.push(0usize);
        for row in stream.iter() {
            let last = incidents_before.last().copied().unwrap_or(0);
            incidents_before.push(last + usize::from(row.is_incident(incident_threshold)));
        }

        for (i, row) in stream.iter().enumerate() {
            let start = row.bucket_start;
            let later = &stream[i + 1..];
            let in_horizon = later.partition_point(|r| r.bucket_start - start <= horizon);
            let end = i + 1 + in_horizon;
            let future_incidents = incidents_before[end] - incidents_before[i + 1];

            training.push(TrainingRow {
                row: (*row).clone(),
                label: u8::from(future_incidents > 0),
            });
        }
    }

    training
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, TimeZone, Utc};

    fn base_time() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 0, 0, 0).unwrap()
    }

    fn row(route: &str, minutes: i64, error_rate: f64, timeout_rate: f64) -> FeatureRow {
        FeatureRow {
            service: "orders".to_string(),
            route: route.to_string(),
            bucket_start: base_time() + Duration::minutes(minutes),
            error_rate,
            p95_latency_ms: 100.0,
            p99_latency_ms: 120.0,
            avg_memory_mb: 300.0,
            avg_cpu_pct: 20.0,
            retries_rate: 0.0,
            timeout_rate,
            total_requests: 10,
        }
    }

    fn labels(rows: &[TrainingRow]) -> Vec<u8> {
        rows.iter().map(|r| r.label).collect()
    }

    #[test]
    fn test_incident_labels_preceding_rows() {
        let rows = vec![
            row("/a", 0, 0.0, 0.0),
            row("/a", 60, 0.0, 0.0),
            row("/a", 120, 0.5, 0.0),
            row("/a", 180, 0.0, 0.0),
        ];

        let training = build_training_rows(&rows, 2, 0.2);

        // The incident row itself looks only forward, and nothing follows it
        assert_eq!(labels(&training), vec![1, 1, 0, 0]);
    }

    #[test]
    fn test_horizon_boundary_is_inclusive() {
        let rows = vec![row("/a", 0, 0.0, 0.0), row("/a", 120, 0.0, 0.9)];

        assert_eq!(labels(&build_training_rows(&rows, 2, 0.2)), vec![1, 0]);
        assert_eq!(labels(&build_training_rows(&rows, 1, 0.2)), vec![0, 0]);
    }

    #[test]
    fn test_past_incidents_never_leak_forward() {
        let rows = vec![
            row("/a", 0, 0.9, 0.9),
            row("/a", 10, 0.9, 0.9),
            row("/a", 20, 0.0, 0.0),
            row("/a", 30, 0.0, 0.0),
        ];

        let training = build_training_rows(&rows, 6, 0.2);

        assert_eq!(labels(&training), vec![1, 0, 0, 0]);
    }

    #[test]
    fn test_streams_are_labeled_independently() {
        let rows = vec![
            row("/b", 10, 0.9, 0.0),
            row("/a", 0, 0.0, 0.0),
            row("/b", 0, 0.0, 0.0),
            row("/a", 10, 0.0, 0.0),
        ];

        let training = build_training_rows(&rows, 6, 0.2);

        let routes: Vec<_> = training.iter().map(|r| r.row.route.as_str()).collect();
        assert_eq!(routes, vec!["/a", "/a", "/b", "/b"]);
        assert_eq!(labels(&training), vec![0, 0, 1, 0]);
    }

    #[test]
    fn test_unsorted_input_is_ordered_by_time() {
        let rows = vec![row("/a", 30, 0.0, 0.0), row("/a", 0, 0.0, 0.0), row("/a", 15, 0.5, 0.0)];

        let training = build_training_rows(&rows, 1, 0.2);

        let starts: Vec<_> = training.iter().map(|r| r.row.bucket_start).collect();
        assert!(starts.windows(2).all(|w| w[0] < w[1]));
        assert_eq!(labels(&training), vec![1, 0, 0]);
    }

    #[test]
    fn test_empty_input() {
        assert!(build_training_rows(&[], 6, 0.2).is_empty());
    }
}
