//! Raw telemetry intake
//!
//! Holds the bounded event buffer that feeds the ETL stage.

mod buffer;

pub use buffer::{IngestReport, TelemetryBuffer, TelemetryStats, DEFAULT_CAPACITY};
