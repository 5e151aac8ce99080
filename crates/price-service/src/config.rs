//! # Price Service Configuration
//!
//! Reference values, overridable through `PRICE_*` environment variables.

use bulkhead_framework::tracing::{LogFormat, LoggingConfig};
use std::time::Duration;
use thiserror::Error;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PriceConfig {
    pub bind_address: String,
    /// Simulated cost of computing a price that is not cached.
    pub miss_delay: Duration,
    /// Inclusive range a computed price is drawn from.
    pub min: i64,
    pub max: i64,
    /// Ids below this are tagged `cluster1`, the rest `cluster2`.
    pub partition_threshold: i32,
    pub logging: LoggingConfig,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid environment override for `{key}`: `{value}`")]
    InvalidEnvOverride { key: String, value: String },
    #[error("configuration validation failed: {0}")]
    Validation(String),
}

impl Default for PriceConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8070".to_string(),
            miss_delay: Duration::from_millis(30),
            min: 100,
            max: 1000,
            partition_threshold: 100,
            logging: LoggingConfig::default(),
        }
    }
}

impl PriceConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();
        let read = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(value) = read("PRICE_BIND_ADDRESS") {
            config.bind_address = value;
        }
        if let Some(value) = read("PRICE_MISS_DELAY_MS") {
            config.miss_delay = Duration::from_millis(parse("PRICE_MISS_DELAY_MS", &value)?);
        }
        if let Some(value) = read("PRICE_MIN") {
            config.min = parse("PRICE_MIN", &value)?;
        }
        if let Some(value) = read("PRICE_MAX") {
            config.max = parse("PRICE_MAX", &value)?;
        }
        if let Some(value) = read("PRICE_PARTITION_THRESHOLD") {
            config.partition_threshold = parse("PRICE_PARTITION_THRESHOLD", &value)?;
        }
        if let Some(value) = read("PRICE_LOG_LEVEL") {
            config.logging.level = value;
        }
        if let Some(value) = read("PRICE_LOG_FORMAT") {
            config.logging.format = value.parse::<LogFormat>().map_err(ConfigError::Validation)?;
        }

        if config.min > config.max {
            return Err(ConfigError::Validation(format!(
                "price range is empty: min {} > max {}",
                config.min, config.max
            )));
        }
        Ok(config)
    }
}

fn parse<T: std::str::FromStr>(key: &str, value: &str) -> Result<T, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_reference_deployment() {
        let config = PriceConfig::from_lookup(|_| None).unwrap();
        assert_eq!(config.bind_address, "0.0.0.0:8070");
        assert_eq!(config.miss_delay, Duration::from_millis(30));
        assert_eq!((config.min, config.max), (100, 1000));
        assert_eq!(config.partition_threshold, 100);
    }

    #[test]
    fn inverted_range_is_rejected() {
        let result = PriceConfig::from_lookup(|key| match key {
            "PRICE_MIN" => Some("500".to_string()),
            "PRICE_MAX" => Some("10".to_string()),
            _ => None,
        });
        assert!(matches!(result, Err(ConfigError::Validation(_))));
    }

    #[test]
    fn malformed_number_is_rejected() {
        let result = PriceConfig::from_lookup(|key| (key == "PRICE_MISS_DELAY_MS").then(|| "soon".to_string()));
        assert!(matches!(result, Err(ConfigError::InvalidEnvOverride { .. })));
    }
}
