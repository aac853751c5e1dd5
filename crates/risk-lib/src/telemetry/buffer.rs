//! Bounded telemetry buffer
//!
//! Append-only store of raw events with FIFO eviction once the fixed
//! capacity is exceeded.

use crate::models::TelemetryEvent;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use tracing::debug;

/// Default maximum number of buffered events
pub const DEFAULT_CAPACITY: usize = 20_000;

/// Outcome of an ingest call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngestReport {
    /// Number of events accepted by this call
    pub ingested: usize,
    /// Number of events held after eviction
    pub retained: usize,
    /// Number of oldest events dropped to stay within capacity
    #[serde(default)]
    pub evicted: usize,
}

/// Aggregate view over the buffered events
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TelemetryStats {
    pub total: usize,
    pub error_rate: f64,
    pub timeout_rate: f64,
}

/// Ring buffer of raw telemetry events
#[derive(Debug, Clone)]
pub struct TelemetryBuffer {
    events: VecDeque<TelemetryEvent>,
    capacity: usize,
}

impl TelemetryBuffer {
    /// Create a buffer holding at most `capacity` events
    pub fn new(capacity: usize) -> Self {
        Self {
            events: VecDeque::with_capacity(capacity.min(DEFAULT_CAPACITY)),
            capacity,
        }
    }

    /// Append events, evicting the oldest ones beyond capacity
    pub fn ingest(&mut self, events: Vec<TelemetryEvent>) -> IngestReport {
        let ingested = events.len();
        self.events.extend(events);

        let evicted = self.events.len().saturating_sub(self.capacity);
        if evicted > 0 {
            self.events.drain(..evicted);
        }

        debug!(ingested, evicted, retained = self.events.len(), "Telemetry buffered");

        IngestReport {
            ingested,
            retained: self.events.len(),
            evicted,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &TelemetryEvent> {
        self.events.iter()
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// True once the buffer is full and further ingests evict
    pub fn is_saturated(&self) -> bool {
        self.events.len() >= self.capacity
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }

    /// Server-error and timeout fractions over everything buffered
    pub fn stats(&self) -> TelemetryStats {
        let total = self.events.len();
        if total == 0 {
            return TelemetryStats {
                total: 0,
                error_rate: 0.0,
                timeout_rate: 0.0,
            };
        }

        let errors = self.events.iter().filter(|e| e.is_server_error()).count();
        let timeouts = self.events.iter().filter(|e| e.timeout).count();

        TelemetryStats {
            total,
            error_rate: errors as f64 / total as f64,
            timeout_rate: timeouts as f64 / total as f64,
        }
    }
}

impl Default for TelemetryBuffer {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};

    fn create_test_event(route: &str, offset_secs: i64, status_code: u16) -> TelemetryEvent {
        TelemetryEvent {
            timestamp: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()
                + Duration::seconds(offset_secs),
            service: "checkout".to_string(),
            route: route.to_string(),
            status_code,
            latency_ms: 100.0,
            memory_mb: 256.0,
            cpu_pct: 30.0,
            retries: 0,
            timeout: false,
        }
    }

    #[test]
    fn test_ingest_within_capacity() {
        let mut buffer = TelemetryBuffer::new(100);
        let report = buffer.ingest(vec![
            create_test_event("/a", 0, 200),
            create_test_event("/a", 1, 200),
        ]);

        assert_eq!(report.ingested, 2);
        assert_eq!(report.retained, 2);
        assert_eq!(report.evicted, 0);
        assert_eq!(buffer.len(), 2);
    }

    #[test]
    fn test_capacity_limit_evicts_oldest() {
        let mut buffer = TelemetryBuffer::new(5);

        for i in 0..10 {
            buffer.ingest(vec![create_test_event(&format!("/r{}", i), i, 200)]);
        }

        // Should only have 5 entries (capacity)
        assert_eq!(buffer.len(), 5);

        // Should have the last 5 entries
        let routes: Vec<_> = buffer.iter().map(|e| e.route.clone()).collect();
        assert_eq!(routes, vec!["/r5", "/r6", "/r7", "/r8", "/r9"]);
    }

    #[test]
    fn test_single_oversized_batch_keeps_tail() {
        let mut buffer = TelemetryBuffer::new(3);
        let events = (0..7)
            .map(|i| create_test_event(&format!("/r{}", i), i, 200))
            .collect();

        let report = buffer.ingest(events);

        assert_eq!(report.ingested, 7);
        assert_eq!(report.retained, 3);
        assert_eq!(report.evicted, 4);
        assert!(buffer.is_saturated());
        assert_eq!(buffer.iter().next().unwrap().route, "/r4");
    }

    #[test]
    fn test_default_capacity() {
        let buffer = TelemetryBuffer::default();
        assert_eq!(buffer.capacity(), 20_000);
        assert!(buffer.is_empty());
    }

    #[test]
    fn test_stats() {
        let mut buffer = TelemetryBuffer::new(100);
        let mut timed_out = create_test_event("/a", 2, 200);
        timed_out.timeout = true;
        buffer.ingest(vec![
            create_test_event("/a", 0, 200),
            create_test_event("/a", 1, 502),
            timed_out,
            create_test_event("/a", 3, 404),
        ]);

        let stats = buffer.stats();
        assert_eq!(stats.total, 4);
        assert!((stats.error_rate - 0.25).abs() < 1e-12);
        assert!((stats.timeout_rate - 0.25).abs() < 1e-12);
    }

    #[test]
    fn test_stats_empty_buffer() {
        let stats = TelemetryBuffer::new(10).stats();
        assert_eq!(stats.total, 0);
        assert_eq!(stats.error_rate, 0.0);
        assert_eq!(stats.timeout_rate, 0.0);
    }

    #[test]
    fn test_clear() {
        let mut buffer = TelemetryBuffer::new(10);
        buffer.ingest(vec![create_test_event("/a", 0, 200)]);
        buffer.clear();
        assert!(buffer.is_empty());
        assert_eq!(buffer.capacity(), 10);
    }
}
