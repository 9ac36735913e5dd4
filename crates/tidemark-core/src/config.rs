//! Configuration loading and typed config structures for the consumer.
//!
//! The canonical configuration lives in `tidemark-config.yaml` in the
//! working directory. This module defines strongly-typed structs that
//! mirror the YAML structure, and provides a loader that reads the file
//! and applies environment overrides.

use std::path::Path;

use serde::Deserialize;

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read the configuration file from disk.
    #[error("failed to read config file: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// Failed to parse YAML content.
    #[error("failed to parse config YAML: {source}")]
    Yaml {
        /// The underlying YAML parse error.
        source: serde_yml::Error,
    },

    /// A required value is empty after the file and environment merge.
    #[error("missing required config value: {0}")]
    Missing(String),
}

impl From<serde_yml::Error> for ConfigError {
    fn from(source: serde_yml::Error) -> Self {
        Self::Yaml { source }
    }
}

/// Top-level consumer configuration.
///
/// Mirrors the structure of `tidemark-config.yaml`. All fields have
/// defaults; the two stream identifiers default to empty and must be
/// supplied by the file or the environment before [`validate`] passes.
///
/// [`validate`]: ConsumerConfig::validate
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ConsumerConfig {
    /// Which stream to consume and where it is served.
    #[serde(default)]
    pub source: SourceConfig,

    /// HTTP transport settings.
    #[serde(default)]
    pub transport: TransportConfig,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl ConsumerConfig {
    /// Load configuration from a YAML file at the given path.
    ///
    /// Environment variables override YAML values for the stream
    /// identity, so deployments can retarget the consumer without
    /// editing the file:
    /// - `DATASET_ID` overrides `source.dataset_id`
    /// - `LDES_ENDPOINT` overrides `source.endpoint_url`
    /// - `EVENT_ID` overrides `source.event_metric_id`
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read, or
    /// [`ConfigError::Yaml`] if the content is not valid YAML.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        let mut config: Self = serde_yml::from_str(&contents)?;
        config.source.apply_env_overrides();
        Ok(config)
    }

    /// Parse configuration from a YAML string.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Yaml`] if the string is not valid YAML.
    pub fn parse(yaml: &str) -> Result<Self, ConfigError> {
        let mut config: Self = serde_yml::from_str(yaml)?;
        config.source.apply_env_overrides();
        Ok(config)
    }

    /// Check that every required value is present.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Missing`] naming the first empty required
    /// field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.source.dataset_id.is_empty() {
            return Err(ConfigError::Missing("source.dataset_id".to_owned()));
        }
        if self.source.event_metric_id.is_empty() {
            return Err(ConfigError::Missing("source.event_metric_id".to_owned()));
        }
        if self.source.endpoint_url.is_empty() {
            return Err(ConfigError::Missing("source.endpoint_url".to_owned()));
        }
        Ok(())
    }
}

/// Stream identity and endpoint location.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SourceConfig {
    /// Identifier of the dataset being consumed. Required.
    #[serde(default)]
    pub dataset_id: String,

    /// SPARQL endpoint the stream is served from.
    #[serde(default = "default_endpoint_url")]
    pub endpoint_url: String,

    /// Metric id of the dataset's distinguished event stream. Required.
    #[serde(default)]
    pub event_metric_id: String,
}

impl SourceConfig {
    /// Override stream identity with environment variables when set.
    ///
    /// The environment wins over the file, so container deployments can
    /// point one image at different streams.
    pub fn apply_env_overrides(&mut self) {
        if let Ok(val) = std::env::var("DATASET_ID") {
            self.dataset_id = val;
        }
        if let Ok(val) = std::env::var("LDES_ENDPOINT") {
            self.endpoint_url = val;
        }
        if let Ok(val) = std::env::var("EVENT_ID") {
            self.event_metric_id = val;
        }
    }
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            dataset_id: String::new(),
            endpoint_url: default_endpoint_url(),
            event_metric_id: String::new(),
        }
    }
}

/// HTTP transport settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TransportConfig {
    /// Per-request timeout in milliseconds. A hung endpoint fails the
    /// page after this long instead of stalling the query.
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            request_timeout_ms: default_request_timeout_ms(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

// ---------------------------------------------------------------------------
// Default value functions (serde default requires named functions)
// ---------------------------------------------------------------------------

fn default_endpoint_url() -> String {
    "http://localhost:8081/sparql".to_owned()
}

const fn default_request_timeout_ms() -> u64 {
    30_000
}

fn default_log_level() -> String {
    "info".to_owned()
}
