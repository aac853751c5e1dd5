//! HTTP service hosting one incident-risk engine
//!
//! Exposes the engine operations as a JSON API alongside health, readiness
//! and Prometheus endpoints.

pub mod api;
pub mod config;
