//! Feature ETL
//!
//! Buckets raw telemetry into fixed-width time windows and aggregates each
//! (service, route, bucket) group into a [`FeatureRow`].

use crate::models::{FeatureRow, TelemetryEvent};
use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use std::collections::BTreeMap;

const MS_PER_MINUTE: i64 = 60_000;

/// Result of one ETL run
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EtlReport {
    pub generated_rows: usize,
    pub dataset: Vec<FeatureRow>,
}

/// Builds feature rows from buffered telemetry
#[derive(Debug, Clone, Copy)]
pub struct FeatureBuilder {
    bucket_ms: i64,
    lookback: Duration,
}

/// Running aggregate for one group
#[derive(Debug, Default)]
struct BucketAccumulator {
    count: u64,
    errors: u64,
    timeouts: u64,
    latencies: Vec<f64>,
    memory_sum: f64,
    cpu_sum: f64,
    retries_sum: f64,
}

impl BucketAccumulator {
    fn add(&mut self, event: &TelemetryEvent) {
        self.count += 1;
        if event.is_server_error() {
            self.errors += 1;
        }
        if event.timeout {
            self.timeouts += 1;
        }
        self.latencies.push(event.latency_ms);
        self.memory_sum += event.memory_mb;
        self.cpu_sum += event.cpu_pct;
        self.retries_sum += f64::from(event.retries);
    }

    fn finish(mut self, service: String, route: String, bucket_start: DateTime<Utc>) -> FeatureRow {
        let n = self.count as f64;
        self.latencies
            .sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

        FeatureRow {
            service,
            route,
            bucket_start,
            error_rate: self.errors as f64 / n,
            p95_latency_ms: nearest_rank(&self.latencies, 95.0),
            p99_latency_ms: nearest_rank(&self.latencies, 99.0),
            avg_memory_mb: self.memory_sum / n,
            avg_cpu_pct: self.cpu_sum / n,
            retries_rate: self.retries_sum / n,
            timeout_rate: self.timeouts as f64 / n,
            total_requests: self.count,
        }
    }
}

impl FeatureBuilder {
    pub fn new(bucket_minutes: u32, lookback_hours: u32) -> Self {
        Self {
            bucket_ms: (i64::from(bucket_minutes) * MS_PER_MINUTE).max(1),
            lookback: Duration::hours(i64::from(lookback_hours)),
        }
    }

    /// Start of the bucket containing `timestamp`, in epoch milliseconds
    fn bucket_start_ms(&self, timestamp: &DateTime<Utc>) -> i64 {
        timestamp.timestamp_millis().div_euclid(self.bucket_ms) * self.bucket_ms
    }

    /// Aggregate events inside the lookback window ending at `now`
    ///
    /// Rows come back ordered by (service, route, bucket start), so every
    /// stream is ascending in time. Empty buckets are never produced.
    pub fn build<'a, I>(&self, events: I, now: DateTime<Utc>) -> Vec<FeatureRow>
    where
        I: IntoIterator<Item = &'a TelemetryEvent>,
    {
        // A lookback reaching past the representable range keeps everything
        let cutoff = now.checked_sub_signed(self.lookback);

        let mut groups: BTreeMap<(String, String, i64), BucketAccumulator> = BTreeMap::new();
        for event in events {
            if cutoff.is_some_and(|c| event.timestamp < c) {
                continue;
            }
            let key = (
                event.service.clone(),
                event.route.clone(),
                self.bucket_start_ms(&event.timestamp),
            );
            groups.entry(key).or_default().add(event);
        }

        groups
            .into_iter()
            .filter_map(|((service, route, start_ms), acc)| {
                let bucket_start = DateTime::<Utc>::from_timestamp_millis(start_ms)?;
                Some(acc.finish(service, route, bucket_start))
            })
            .collect()
    }
}

/// Nearest-rank percentile over an ascending slice
pub fn nearest_rank(sorted: &[f64], p: f64) -> f64 {
    if sorted.is_empty() {
        return 0.0;
    }
    let n = sorted.len();
    let rank = ((p / 100.0) * n as f64).ceil() as i64 - 1;
    let idx = rank.clamp(0, n as i64 - 1) as usize;
    sorted[idx]
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn base_time() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap()
    }

    fn create_test_event(route: &str, offset_secs: i64, status_code: u16, latency_ms: f64) -> TelemetryEvent {
        TelemetryEvent {
            timestamp: base_time() + Duration::seconds(offset_secs),
            service: "payments".to_string(),
            route: route.to_string(),
            status_code,
            latency_ms,
            memory_mb: 200.0,
            cpu_pct: 50.0,
            retries: 1,
            timeout: false,
        }
    }

    #[test]
    fn test_nearest_rank_percentile() {
        let values: Vec<f64> = (1..=10).map(f64::from).collect();
        assert_eq!(nearest_rank(&values, 95.0), 10.0);
        assert_eq!(nearest_rank(&values, 50.0), 5.0);
        assert_eq!(nearest_rank(&values, 0.0), 1.0);
        assert_eq!(nearest_rank(&[], 99.0), 0.0);

        let hundred: Vec<f64> = (1..=100).map(f64::from).collect();
        assert_eq!(nearest_rank(&hundred, 95.0), 95.0);
        assert_eq!(nearest_rank(&hundred, 99.0), 99.0);
    }

    #[test]
    fn test_single_bucket_aggregates() {
        let builder = FeatureBuilder::new(5, 24);
        let mut events = vec![
            create_test_event("/pay", 0, 200, 10.0),
            create_test_event("/pay", 30, 500, 20.0),
            create_test_event("/pay", 60, 503, 30.0),
            create_test_event("/pay", 90, 200, 40.0),
        ];
        events[3].timeout = true;
        events[3].retries = 5;

        let rows = builder.build(&events, base_time() + Duration::minutes(10));

        assert_eq!(rows.len(), 1);
        let row = &rows[0];
        assert_eq!(row.total_requests, 4);
        assert_eq!(row.error_rate, 0.5);
        assert_eq!(row.timeout_rate, 0.25);
        assert_eq!(row.p95_latency_ms, 40.0);
        assert_eq!(row.p99_latency_ms, 40.0);
        assert_eq!(row.avg_memory_mb, 200.0);
        assert_eq!(row.retries_rate, 2.0);
        assert_eq!(row.bucket_start, base_time());
    }

    #[test]
    fn test_buckets_split_by_route_and_time() {
        let builder = FeatureBuilder::new(10, 24);
        let events = vec![
            create_test_event("/b", 0, 200, 10.0),
            create_test_event("/a", 700, 200, 10.0),
            create_test_event("/a", 0, 200, 10.0),
            create_test_event("/a", 30, 500, 10.0),
        ];

        let rows = builder.build(&events, base_time() + Duration::hours(1));

        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0].route, "/a");
        assert_eq!(rows[0].total_requests, 2);
        assert_eq!(rows[1].route, "/a");
        assert_eq!(rows[1].bucket_start, base_time() + Duration::minutes(10));
        assert_eq!(rows[2].route, "/b");
        assert!(rows[0].bucket_start < rows[1].bucket_start);
    }

    #[test]
    fn test_lookback_excludes_old_events() {
        let builder = FeatureBuilder::new(5, 1);
        let events = vec![
            create_test_event("/pay", 0, 200, 10.0),
            create_test_event("/pay", 3 * 3600, 200, 10.0),
        ];

        let rows = builder.build(&events, base_time() + Duration::hours(3) + Duration::minutes(1));

        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].bucket_start, base_time() + Duration::hours(3));
    }

    #[test]
    fn test_error_rate_matches_counts() {
        let builder = FeatureBuilder::new(60, 24);
        let events: Vec<_> = (0..30)
            .map(|i| create_test_event("/pay", i * 10, if i % 3 == 0 { 500 } else { 200 }, 5.0))
            .collect();

        let rows = builder.build(&events, base_time() + Duration::hours(2));

        for row in &rows {
            assert!(row.total_requests > 0);
            assert!((0.0..=1.0).contains(&row.error_rate));
            assert!((0.0..=1.0).contains(&row.timeout_rate));
        }
        assert_eq!(rows[0].error_rate, 10.0 / 30.0);
    }

    #[test]
    fn test_no_events_no_rows() {
        let builder = FeatureBuilder::new(5, 24);
        let events: Vec<TelemetryEvent> = Vec::new();
        assert!(builder.build(&events, base_time()).is_empty());
    }
}
