//! Configuration loading and typed config structures for the fissure tracker.
//!
//! The canonical configuration lives in `fissure-config.yaml` at the project
//! root. This module defines strongly-typed structs that mirror the YAML
//! structure, and provides a loader that reads the file. Every field has a
//! default, so a partial (or empty) file is valid.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use fissure_types::Era;
use serde::Deserialize;

use crate::error::FissureError;
use crate::format::{DisplayMode, EraEmojiMap, FieldSpec};
use crate::registry::RegistryConfig;

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
}

impl From<serde_yml::Error> for ConfigError {
    fn from(source: serde_yml::Error) -> Self {
        Self::Yaml { source }
    }
}

/// Top-level tracker configuration.
///
/// Mirrors the structure of `fissure-config.yaml`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct FissureConfig {
    /// World-state feed settings.
    #[serde(default)]
    pub feed: FeedConfig,

    /// Reference data location.
    #[serde(default)]
    pub reference: ReferenceConfig,

    /// Registry behavior.
    #[serde(default)]
    pub registry: RegistryConfig,

    /// Output formatting.
    #[serde(default)]
    pub display: DisplayConfig,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl FissureConfig {
    /// Load configuration from a YAML file at the given path.
    ///
    /// Environment variables override YAML values:
    /// - `FEED_URL` overrides `feed.url`
    /// - `REFERENCE_DATA_PATH` overrides `reference.path`
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read, or
    /// [`ConfigError::Yaml`] if the content is not valid YAML.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::parse(&contents)
    }

    /// Parse configuration from a YAML string.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Yaml`] if the string is not valid YAML.
    pub fn parse(yaml: &str) -> Result<Self, ConfigError> {
        let mut config: Self = if yaml.trim().is_empty() {
            Self::default()
        } else {
            serde_yml::from_str(yaml)?
        };
        config.apply_env_overrides();
        Ok(config)
    }

    /// Override deployment-specific values with environment variables when set.
    pub fn apply_env_overrides(&mut self) {
        if let Ok(val) = std::env::var("FEED_URL") {
            self.feed.url = val;
        }
        if let Ok(val) = std::env::var("REFERENCE_DATA_PATH") {
            self.reference.path = PathBuf::from(val);
        }
    }
}

/// World-state feed configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct FeedConfig {
    /// World-state endpoint.
    #[serde(default = "default_feed_url")]
    pub url: String,

    /// Upper bound between polls, in seconds.
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,

    /// Lower bound between polls, in seconds. Refresh hints earlier than
    /// this are clamped.
    #[serde(default = "default_min_poll_interval_secs")]
    pub min_poll_interval_secs: u64,

    /// Per-request timeout in milliseconds.
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,

    /// Attempts per fetch before giving up.
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Ceiling for the exponential backoff between attempts, in seconds.
    #[serde(default = "default_max_backoff_secs")]
    pub max_backoff_secs: u64,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            url: default_feed_url(),
            poll_interval_secs: default_poll_interval_secs(),
            min_poll_interval_secs: default_min_poll_interval_secs(),
            request_timeout_ms: default_request_timeout_ms(),
            max_retries: default_max_retries(),
            max_backoff_secs: default_max_backoff_secs(),
        }
    }
}

/// Reference data configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ReferenceConfig {
    /// Path to the reference JSON, relative to the working directory.
    #[serde(default = "default_reference_path")]
    pub path: PathBuf,
}

impl Default for ReferenceConfig {
    fn default() -> Self {
        Self {
            path: default_reference_path(),
        }
    }
}

/// One configured output field.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct FieldConfig {
    /// Output field name.
    pub name: String,
    /// Template, e.g. `"{mission} - {node} ({planet})"` or `"expiry"`.
    pub template: String,
}

/// Output formatting configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct DisplayConfig {
    /// How expiries are rendered.
    #[serde(default)]
    pub mode: DisplayMode,

    /// Emoji shown before era names.
    #[serde(default)]
    pub era_emoji: BTreeMap<Era, String>,

    /// Fields rendered for each announced fissure.
    #[serde(default = "default_fields")]
    pub fields: Vec<FieldConfig>,
}

impl DisplayConfig {
    /// Parse the configured field templates.
    ///
    /// # Errors
    ///
    /// Returns [`FissureError::InvalidTemplate`] for the first template that
    /// names an unknown placeholder.
    pub fn field_specs(&self) -> Result<Vec<FieldSpec>, FissureError> {
        self.fields
            .iter()
            .map(|field| FieldSpec::parse(field.name.clone(), &field.template))
            .collect()
    }

    /// The era emoji map.
    pub const fn emoji(&self) -> &EraEmojiMap {
        &self.era_emoji
    }
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            mode: DisplayMode::default(),
            era_emoji: BTreeMap::new(),
            fields: default_fields(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error). `RUST_LOG` wins when set.
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
// Default value functions
// ---------------------------------------------------------------------------

fn default_feed_url() -> String {
    "https://content.warframe.com/dynamic/worldState.php".to_owned()
}

const fn default_poll_interval_secs() -> u64 {
    60
}

const fn default_min_poll_interval_secs() -> u64 {
    10
}

const fn default_request_timeout_ms() -> u64 {
    10_000
}

const fn default_max_retries() -> u32 {
    5
}

const fn default_max_backoff_secs() -> u64 {
    60
}

fn default_reference_path() -> PathBuf {
    PathBuf::from("data/reference.json")
}

fn default_fields() -> Vec<FieldConfig> {
    [
        ("Era", "{era}"),
        ("Mission", "{mission} - {node} ({planet})"),
        ("Ends", "expiry"),
    ]
    .into_iter()
    .map(|(name, template)| FieldConfig {
        name: name.to_owned(),
        template: template.to_owned(),
    })
    .collect()
}

fn default_log_level() -> String {
    "info".to_owned()
}
