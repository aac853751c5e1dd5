//! Agent configuration

use anyhow::{Context, Result};
use risk_lib::engine::EngineConfig;
use serde::Deserialize;
use std::collections::HashMap;

const ENV_PREFIX: &str = "RISK";

/// Agent configuration
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct AgentConfig {
    /// Instance label attached to structured logs and alert sources
    #[serde(default = "default_instance_name")]
    pub instance_name: String,

    /// HTTP port for the engine API, health and metrics
    #[serde(default = "default_api_port")]
    pub api_port: u16,

    /// Maximum buffered telemetry events
    #[serde(default = "default_buffer_capacity")]
    pub buffer_capacity: usize,

    /// Contributing factors reported per prediction
    #[serde(default = "default_top_factors")]
    pub top_factors: usize,
}

fn default_instance_name() -> String {
    std::env::var("HOSTNAME").unwrap_or_else(|_| "incident-agent".to_string())
}

fn default_api_port() -> u16 {
    8080
}

fn default_buffer_capacity() -> usize {
    risk_lib::telemetry::DEFAULT_CAPACITY
}

fn default_top_factors() -> usize {
    risk_lib::predictor::DEFAULT_TOP_FACTORS
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            instance_name: default_instance_name(),
            api_port: default_api_port(),
            buffer_capacity: default_buffer_capacity(),
            top_factors: default_top_factors(),
        }
    }
}

impl AgentConfig {
    /// Load configuration from `RISK_*` environment variables
    pub fn load() -> Result<Self> {
        Self::from_env_source(None)
    }

    /// Load configuration from an explicit variable map instead of the process environment
    pub fn from_env_source(source: Option<HashMap<String, String>>) -> Result<Self> {
        let config = config::Config::builder()
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .try_parsing(true)
                    .source(source),
            )
            .build()
            .context("Failed to read agent configuration")?;

        config
            .try_deserialize()
            .context("Invalid agent configuration")
    }

    pub fn engine_config(&self) -> EngineConfig {
        EngineConfig {
            buffer_capacity: self.buffer_capacity,
            top_factors: self.top_factors,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vars(pairs: &[(&str, &str)]) -> Option<HashMap<String, String>> {
        Some(
            pairs
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        )
    }

    #[test]
    fn test_defaults_without_variables() {
        let config = AgentConfig::from_env_source(vars(&[])).unwrap();
        assert_eq!(config.api_port, 8080);
        assert_eq!(config.buffer_capacity, 20_000);
        assert_eq!(config.top_factors, 3);
    }

    #[test]
    fn test_prefixed_variables_override() {
        let config = AgentConfig::from_env_source(vars(&[
            ("RISK_INSTANCE_NAME", "edge-1"),
            ("RISK_API_PORT", "9100"),
            ("RISK_BUFFER_CAPACITY", "500"),
            ("RISK_TOP_FACTORS", "5"),
        ]))
        .unwrap();

        assert_eq!(config.instance_name, "edge-1");
        assert_eq!(config.api_port, 9100);
        assert_eq!(
            config.engine_config(),
            EngineConfig {
                buffer_capacity: 500,
                top_factors: 5,
            }
        );
    }

    #[test]
    fn test_invalid_port_is_rejected() {
        let result = AgentConfig::from_env_source(vars(&[("RISK_API_PORT", "not-a-port")]));
        assert!(result.is_err());
    }
}
