//! # Gateway Configuration
//!
//! Defaults reproduce the reference deployment. Every field can be overridden
//! through a `CATALOG_*` environment variable.

use bulkhead_framework::tracing::{LogFormat, LoggingConfig};
use bulkhead_framework::{BreakerConfig, BulkheadConfig};
use std::time::Duration;
use thiserror::Error;

/// Name of the price isolation boundary.
pub const PRICING: &str = "pricing";
/// Name of the products isolation boundary.
pub const PRODUCTS: &str = "products";

#[derive(Clone, Debug, PartialEq)]
pub struct GatewayConfig {
    pub bind_address: String,
    pub price_url: String,
    pub products_url: String,
    pub dependency_timeout: Duration,
    pub pool_size: usize,
    pub pool_queue: usize,
    pub breaker_threshold: u32,
    pub breaker_cooldown: Duration,
    pub pause_probability: f64,
    pub pause: Duration,
    pub notify_delay: Duration,
    pub processing: Duration,
    pub processor_queue: usize,
    pub shutdown_drain: Duration,
    pub logging: LoggingConfig,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid environment override for `{key}`: `{value}`")]
    InvalidEnvOverride { key: String, value: String },
    #[error("configuration validation failed: {0}")]
    Validation(String),
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
            price_url: "http://localhost:8070".to_string(),
            products_url: "http://localhost:8090".to_string(),
            dependency_timeout: Duration::from_millis(1000),
            pool_size: 10,
            pool_queue: 5,
            breaker_threshold: 20,
            breaker_cooldown: Duration::from_millis(5000),
            pause_probability: 0.5,
            pause: Duration::from_millis(3000),
            notify_delay: Duration::from_millis(1000),
            processing: Duration::from_millis(100),
            processor_queue: 10_000,
            shutdown_drain: Duration::from_millis(2000),
            logging: LoggingConfig::default(),
        }
    }
}

impl GatewayConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from defaults plus whatever `lookup` returns for each key.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();
        let read = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(value) = read("CATALOG_BIND_ADDRESS") {
            config.bind_address = value;
        }
        if let Some(value) = read("CATALOG_PRICE_URL") {
            config.price_url = value;
        }
        if let Some(value) = read("CATALOG_PRODUCTS_URL") {
            config.products_url = value;
        }
        if let Some(value) = read("CATALOG_DEPENDENCY_TIMEOUT_MS") {
            config.dependency_timeout = parse_millis("CATALOG_DEPENDENCY_TIMEOUT_MS", &value)?;
        }
        if let Some(value) = read("CATALOG_POOL_SIZE") {
            config.pool_size = parse("CATALOG_POOL_SIZE", &value)?;
        }
        if let Some(value) = read("CATALOG_POOL_QUEUE") {
            config.pool_queue = parse("CATALOG_POOL_QUEUE", &value)?;
        }
        if let Some(value) = read("CATALOG_BREAKER_THRESHOLD") {
            config.breaker_threshold = parse("CATALOG_BREAKER_THRESHOLD", &value)?;
        }
        if let Some(value) = read("CATALOG_BREAKER_COOLDOWN_MS") {
            config.breaker_cooldown = parse_millis("CATALOG_BREAKER_COOLDOWN_MS", &value)?;
        }
        if let Some(value) = read("CATALOG_PAUSE_PROBABILITY") {
            config.pause_probability = parse("CATALOG_PAUSE_PROBABILITY", &value)?;
        }
        if let Some(value) = read("CATALOG_PAUSE_MS") {
            config.pause = parse_millis("CATALOG_PAUSE_MS", &value)?;
        }
        if let Some(value) = read("CATALOG_NOTIFY_DELAY_MS") {
            config.notify_delay = parse_millis("CATALOG_NOTIFY_DELAY_MS", &value)?;
        }
        if let Some(value) = read("CATALOG_PROCESSING_MS") {
            config.processing = parse_millis("CATALOG_PROCESSING_MS", &value)?;
        }
        if let Some(value) = read("CATALOG_PROCESSOR_QUEUE") {
            config.processor_queue = parse("CATALOG_PROCESSOR_QUEUE", &value)?;
        }
        if let Some(value) = read("CATALOG_SHUTDOWN_DRAIN_MS") {
            config.shutdown_drain = parse_millis("CATALOG_SHUTDOWN_DRAIN_MS", &value)?;
        }
        if let Some(value) = read("CATALOG_LOG_LEVEL") {
            config.logging.level = value;
        }
        if let Some(value) = read("CATALOG_LOG_FORMAT") {
            config.logging.format = value.parse::<LogFormat>().map_err(ConfigError::Validation)?;
        }

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(0.0..=1.0).contains(&self.pause_probability) {
            return Err(ConfigError::Validation(format!(
                "pause probability must be within [0, 1], got {}",
                self.pause_probability
            )));
        }
        if self.pool_size == 0 || self.pool_queue == 0 || self.processor_queue == 0 {
            return Err(ConfigError::Validation(
                "pool size, pool queue and processor queue must be at least 1".to_string(),
            ));
        }
        if self.breaker_threshold == 0 {
            return Err(ConfigError::Validation(
                "breaker threshold must be at least 1".to_string(),
            ));
        }
        if self.price_url.trim().is_empty() || self.products_url.trim().is_empty() {
            return Err(ConfigError::Validation(
                "downstream URLs must not be empty".to_string(),
            ));
        }
        Ok(())
    }

    /// Boundary settings for one downstream. Both boundaries share sizing but never permits.
    pub fn bulkhead(&self, name: &str) -> BulkheadConfig {
        BulkheadConfig {
            name: name.to_string(),
            max_concurrency: self.pool_size,
            queue_capacity: self.pool_queue,
            timeout: self.dependency_timeout,
            breaker: BreakerConfig {
                failure_threshold: self.breaker_threshold,
                cooldown: self.breaker_cooldown,
            },
        }
    }
}

fn parse<T: std::str::FromStr>(key: &str, value: &str) -> Result<T, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn parse_millis(key: &str, value: &str) -> Result<Duration, ConfigError> {
    parse::<u64>(key, value).map(Duration::from_millis)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_match_reference_deployment() {
        let config = GatewayConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config, GatewayConfig::default());
        assert_eq!(config.price_url, "http://localhost:8070");
        assert_eq!(config.products_url, "http://localhost:8090");
        assert_eq!(config.pause, Duration::from_secs(3));
        assert_eq!(config.pause_probability, 0.5);
    }

    #[test]
    fn env_overrides_are_applied() {
        let config = GatewayConfig::from_lookup(lookup(&[
            ("CATALOG_PRICE_URL", "http://price:9000"),
            ("CATALOG_POOL_SIZE", "3"),
            ("CATALOG_PAUSE_PROBABILITY", "0"),
            ("CATALOG_LOG_FORMAT", "json"),
            ("CATALOG_PROCESSOR_QUEUE", "50"),
        ]))
        .unwrap();

        assert_eq!(config.price_url, "http://price:9000");
        assert_eq!(config.pool_size, 3);
        assert_eq!(config.pause_probability, 0.0);
        assert_eq!(config.logging.format, LogFormat::Json);
        assert_eq!(config.processor_queue, 50);

        let bulkhead = config.bulkhead(PRICING);
        assert_eq!(bulkhead.name, "pricing");
        assert_eq!(bulkhead.max_concurrency, 3);
    }

    #[test]
    fn invalid_values_are_rejected() {
        assert!(matches!(
            GatewayConfig::from_lookup(lookup(&[("CATALOG_POOL_SIZE", "many")])),
            Err(ConfigError::InvalidEnvOverride { .. })
        ));
        assert!(matches!(
            GatewayConfig::from_lookup(lookup(&[("CATALOG_PAUSE_PROBABILITY", "1.5")])),
            Err(ConfigError::Validation(_))
        ));
        assert!(matches!(
            GatewayConfig::from_lookup(lookup(&[("CATALOG_POOL_QUEUE", "0")])),
            Err(ConfigError::Validation(_))
        ));
    }
}
