//! Configuration loading for the rolling-median pipeline.
//!
//! Configuration is optional. When present it lives in
//! `paygraph-config.yaml` in the working directory, or wherever the
//! `PAYGRAPH_CONFIG` environment variable points. Every field has a
//! default, so an empty file or no file at all yields the standard
//! 60-second window.
//!
//! ```yaml
//! window:
//!   span_seconds: 60
//! logging:
//!   level: "info"
//! ```

use std::path::{Path, PathBuf};

use paygraph_types::Epoch;
use serde::Deserialize;

/// Default window span in seconds.
pub const DEFAULT_WINDOW_SPAN: Epoch = 60;

/// Default configuration file name, looked up in the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "paygraph-config.yaml";

/// Environment variable overriding the configuration file path.
pub const CONFIG_PATH_ENV: &str = "PAYGRAPH_CONFIG";

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

    /// The window span is not a positive number of seconds.
    #[error("window span must be at least 1 second, got {span_seconds}")]
    InvalidWindow {
        /// The rejected span.
        span_seconds: Epoch,
    },
}

impl From<serde_yml::Error> for ConfigError {
    fn from(source: serde_yml::Error) -> Self {
        Self::Yaml { source }
    }
}

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct PaygraphConfig {
    /// Sliding window settings.
    #[serde(default)]
    pub window: WindowConfig,

    /// Logging settings for the binaries.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl PaygraphConfig {
    /// Load configuration from a YAML file at the given path.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read,
    /// [`ConfigError::Yaml`] if it is not valid YAML, or
    /// [`ConfigError::InvalidWindow`] if the window span is not positive.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::parse(&contents)
    }

    /// Parse configuration from a YAML string.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Yaml`] if the string is not valid YAML, or
    /// [`ConfigError::InvalidWindow`] if the window span is not positive.
    pub fn parse(yaml: &str) -> Result<Self, ConfigError> {
        // An empty document deserializes to unit, not to a map.
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }
        let config: Self = serde_yml::from_str(yaml)?;
        config.window.validate()?;
        Ok(config)
    }

    /// Load configuration from the conventional location.
    ///
    /// Reads the file named by `PAYGRAPH_CONFIG` if set, else
    /// `paygraph-config.yaml` in the working directory if it exists, else
    /// returns defaults.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if a configuration file exists but cannot be
    /// loaded. A `PAYGRAPH_CONFIG` path that does not exist is an error.
    pub fn load() -> Result<Self, ConfigError> {
        match std::env::var_os(CONFIG_PATH_ENV) {
            Some(path) => Self::from_file(&PathBuf::from(path)),
            None => {
                let path = Path::new(DEFAULT_CONFIG_FILE);
                if path.exists() {
                    Self::from_file(path)
                } else {
                    Ok(Self::default())
                }
            }
        }
    }
}

/// Sliding window parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct WindowConfig {
    /// Width of the trailing window in seconds. An edge survives while
    /// `max_epoch - epoch < span_seconds`.
    #[serde(default = "default_span_seconds")]
    pub span_seconds: Epoch,
}

impl WindowConfig {
    /// Check that the span is a positive number of seconds.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidWindow`] otherwise.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.span_seconds < 1 {
            return Err(ConfigError::InvalidWindow {
                span_seconds: self.span_seconds,
            });
        }
        Ok(())
    }
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            span_seconds: default_span_seconds(),
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

const fn default_span_seconds() -> Epoch {
    DEFAULT_WINDOW_SPAN
}

fn default_log_level() -> String {
    "info".to_owned()
}
