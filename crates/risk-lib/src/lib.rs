//! Engine library for incident-risk prediction
//!
//! This crate provides the core functionality for:
//! - Bounded telemetry buffering
//! - Feature ETL over fixed time buckets
//! - Forward-looking incident labeling and online logistic training
//! - Risk scoring with feature attribution, alerting and backtesting
//! - Health checks and observability

pub mod alerts;
pub mod backtest;
pub mod engine;
pub mod etl;
pub mod health;
pub mod models;
pub mod observability;
pub mod params;
pub mod predictor;
pub mod telemetry;

pub use backtest::BacktestReport;
pub use engine::{EngineConfig, EngineSummary, RiskEngine};
pub use health::{ComponentHealth, ComponentStatus, HealthResponse, ReadinessResponse};
pub use models::*;
pub use observability::{EngineMetrics, StructuredLogger};
pub use params::ValidationError;
