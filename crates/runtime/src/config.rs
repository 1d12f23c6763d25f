//! Configuration loading
//!
//! A single JSON document configures the whole pipeline. Every section is
//! optional and falls back to its defaults:
//!
//! ```json
//! {
//!   "default_index": "docs",
//!   "queue": { "concurrent_limit": 5 },
//!   "breaker": { "failure_threshold": 5, "reset_timeout_ms": 30000 },
//!   "cache": { "base_ttl_secs": 3600, "retry": { "max_attempts": 3 } },
//!   "processors": { "time_based": { "utc_offset_minutes": 60 } },
//!   "routing": { "search": { "signal_types": ["search"], "required_fields": ["query"] } },
//!   "logging": { "filter": "info,pulse_cache=debug" }
//! }
//! ```

use pulse_cache::CacheConfig;
use pulse_core::SignalType;
use pulse_resilience::{CircuitBreakerConfig, QueueConfig};
use pulse_signals::{CoordinatorConfig, ProcessorCriteria, SearchProcessorConfig, TimeProcessorConfig};
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Failed to read config file '{path}': {error}")]
    Io { path: String, error: String },

    #[error("Failed to parse config: {0}")]
    Parse(String),

    #[error("Invalid config: {0}")]
    Invalid(String),
}

/// Root configuration of a pipeline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PulseConfig {
    /// Index assumed for search signals that do not name one
    pub default_index: String,
    pub coordinator: CoordinatorConfig,
    pub queue: QueueConfig,
    pub breaker: CircuitBreakerConfig,
    pub cache: CacheConfig,
    pub processors: ProcessorsConfig,
    pub routing: RoutingConfig,
    pub logging: LoggingConfig,
}

impl Default for PulseConfig {
    fn default() -> Self {
        Self {
            default_index: "default".to_string(),
            coordinator: CoordinatorConfig::default(),
            queue: QueueConfig::default(),
            breaker: CircuitBreakerConfig::default(),
            cache: CacheConfig::default(),
            processors: ProcessorsConfig::default(),
            routing: RoutingConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

/// Settings of the built-in processors
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProcessorsConfig {
    pub time_based: TimeProcessorConfig,
    pub search: SearchProcessorConfig,
}

/// Routing criteria of the built-in processors
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RoutingConfig {
    pub time_based: ProcessorCriteria,
    pub search: ProcessorCriteria,
}

impl Default for RoutingConfig {
    fn default() -> Self {
        Self {
            time_based: ProcessorCriteria::all_types(),
            search: ProcessorCriteria::for_types(&[SignalType::Search]).with_required_field("query"),
        }
    }
}

/// Log output settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Filter directives in `RUST_LOG` syntax; `RUST_LOG` itself wins when set
    pub filter: String,
    /// Prefix lines with millisecond timestamps
    pub timestamps: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "info".to_string(),
            timestamps: true,
        }
    }
}

impl PulseConfig {
    /// Load configuration from a JSON file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(|e| ConfigError::Io {
            path: path.as_ref().display().to_string(),
            error: e.to_string(),
        })?;

        Self::from_json(&content)
    }

    /// Parse and validate configuration from a JSON string
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Reject settings no component can run with
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.default_index.is_empty() {
            return Err(ConfigError::Invalid("default_index must not be empty".into()));
        }
        if self.queue.concurrent_limit == 0 {
            return Err(ConfigError::Invalid("queue.concurrent_limit must be at least 1".into()));
        }
        if self.breaker.failure_threshold == 0 {
            return Err(ConfigError::Invalid("breaker.failure_threshold must be at least 1".into()));
        }

        let cache = &self.cache;
        if cache.min_ttl_secs > cache.max_ttl_secs {
            return Err(ConfigError::Invalid(format!(
                "cache.min_ttl_secs ({}) exceeds cache.max_ttl_secs ({})",
                cache.min_ttl_secs, cache.max_ttl_secs
            )));
        }

        let time = &self.processors.time_based;
        if time.business_hours_start >= time.business_hours_end || time.business_hours_end > 24 {
            return Err(ConfigError::Invalid(format!(
                "business hours [{}, {}) are not a valid range",
                time.business_hours_start, time.business_hours_end
            )));
        }
        if time.utc_offset_minutes.abs() >= 24 * 60 {
            return Err(ConfigError::Invalid(format!(
                "utc_offset_minutes {} is out of range",
                time.utc_offset_minutes
            )));
        }

        for (name, criteria) in [("time_based", &self.routing.time_based), ("search", &self.routing.search)] {
            if criteria.min_strength > criteria.max_strength {
                return Err(ConfigError::Invalid(format!(
                    "routing.{}: min_strength {} exceeds max_strength {}",
                    name, criteria.min_strength, criteria.max_strength
                )));
            }
        }

        Ok(())
    }
}
