//! Configuration loading — TOML file with environment variable overrides.
//!
//! Looks for `switchhub.toml` in the working directory unless another file is
//! given. Every field has a sensible default so the file is optional.
//! Environment variables take precedence over file values.

use std::path::{Path, PathBuf};

use serde::Deserialize;

use switchhub_app::bootstrap::DEFAULT_WEBHOOK_URL;
use switchhub_app::message_bus::DEFAULT_MAX_DISPATCH;

/// Default configuration file name.
pub const DEFAULT_CONFIG_FILE: &str = "switchhub.toml";

/// Top-level configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// User store settings.
    pub store: StoreConfig,
    /// Vendor webhook settings.
    pub webhook: WebhookConfig,
    /// Logging settings.
    pub logging: LoggingConfig,
    /// Message bus settings.
    pub bus: BusConfig,
    /// Simulated cloud settings.
    #[serde(rename = "virtual")]
    pub virtual_cloud: VirtualConfig,
}

/// JSON store configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Path of the live store file. The swap copy sits next to it.
    pub path: PathBuf,
}

/// Vendor webhook configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct WebhookConfig {
    /// URL change reports are delivered to.
    pub url: String,
}

/// Logging configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Filter directive (`RUST_LOG` syntax).
    pub filter: String,
}

/// Message bus configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct BusConfig {
    /// Maximum messages dispatched by a single command.
    pub max_dispatch: usize,
}

/// Simulated cloud configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct VirtualConfig {
    /// JSON catalog of devices and statuses; the demo catalog when unset.
    pub catalog: Option<PathBuf>,
}

impl Config {
    /// Load configuration from `path` (if present) then apply
    /// environment-variable overrides.
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML file exists but is malformed, an
    /// override is not a valid value, or the result fails validation.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let mut config = Self::from_file(path)?;
        config.apply_overrides(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    fn from_file(path: &Path) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(content) => toml::from_str(&content).map_err(ConfigError::Parse),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(err) => Err(ConfigError::Io(err)),
        }
    }

    fn apply_overrides(
        &mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<(), ConfigError> {
        if let Some(val) = lookup("SWITCHHUB_STORE") {
            self.store.path = PathBuf::from(val);
        }
        if let Some(val) = lookup("SWITCHHUB_WEBHOOK_URL") {
            self.webhook.url = val;
        }
        if let Some(val) = lookup("RUST_LOG") {
            self.logging.filter = val;
        }
        if let Some(val) = lookup("SWITCHHUB_LOG") {
            self.logging.filter = val;
        }
        if let Some(val) = lookup("SWITCHHUB_MAX_DISPATCH") {
            self.bus.max_dispatch = val.parse().map_err(|_| ConfigError::InvalidOverride {
                key: "SWITCHHUB_MAX_DISPATCH",
                value: val,
            })?;
        }
        if let Some(val) = lookup("SWITCHHUB_VIRTUAL_CATALOG") {
            self.virtual_cloud.catalog = Some(PathBuf::from(val));
        }
        Ok(())
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.store.path.as_os_str().is_empty() {
            return Err(ConfigError::Validation(
                "store path must not be empty".to_string(),
            ));
        }
        if self.bus.max_dispatch == 0 {
            return Err(ConfigError::Validation(
                "max dispatch must be non-zero".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from(".repository.json"),
        }
    }
}

impl Default for WebhookConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_WEBHOOK_URL.to_string(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "switchhub=info".to_string(),
        }
    }
}

impl Default for BusConfig {
    fn default() -> Self {
        Self {
            max_dispatch: DEFAULT_MAX_DISPATCH,
        }
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// TOML parse failure.
    #[error("failed to parse config file")]
    Parse(#[from] toml::de::Error),
    /// File I/O failure.
    #[error("failed to read config file")]
    Io(#[from] std::io::Error),
    /// An environment override could not be parsed.
    #[error("invalid value {value:?} for {key}")]
    InvalidOverride { key: &'static str, value: String },
    /// Semantic validation failure.
    #[error("invalid configuration: {0}")]
    Validation(String),
}
