//! Configuration loading for board-cli.
//!
//! Configuration is loaded from a TOML file (default: `board.toml`). Every
//! section and field is optional.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Root configuration for board-cli.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BoardConfig {
    /// Remote store configuration.
    #[serde(default)]
    pub gateway: GatewayConfig,
    /// Logging configuration.
    #[serde(default)]
    pub log: LogConfig,
}

/// Which remote store backs the board.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GatewayKind {
    /// Local JSON file.
    #[default]
    File,
    /// PostgREST endpoint.
    Http,
}

/// Remote store configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GatewayConfig {
    /// Backend kind (default: file).
    #[serde(default)]
    pub kind: GatewayKind,
    /// Data file for the file backend (default: board.json).
    #[serde(default = "default_data_path")]
    pub path: PathBuf,
    /// Project URL for the http backend.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    /// API key for the http backend.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogConfig {
    /// Default filter when `RUST_LOG` is unset (default: warn).
    #[serde(default = "default_log_level")]
    pub level: String,
}

// Default value functions
fn default_data_path() -> PathBuf {
    PathBuf::from("board.json")
}

fn default_log_level() -> String {
    "warn".to_string()
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            kind: GatewayKind::default(),
            path: default_data_path(),
            url: None,
            api_key: None,
        }
    }
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

impl BoardConfig {
    /// Load configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            source: e,
        })?;

        toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            source: e,
        })
    }

    /// Load configuration, falling back to defaults when the file is absent.
    pub fn load_or_default(path: &Path) -> Result<Self, ConfigError> {
        if path.exists() {
            Self::from_file(path)
        } else {
            Ok(Self::default())
        }
    }

    /// Write configuration as TOML.
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let content = toml::to_string_pretty(self).map_err(ConfigError::SerializeError)?;
        std::fs::write(path, content).map_err(|e| ConfigError::WriteError {
            path: path.to_path_buf(),
            source: e,
        })
    }

    /// Resolve the data file relative to the config file's directory.
    pub fn data_path(&self, config_path: &Path) -> PathBuf {
        if self.gateway.path.is_absolute() {
            return self.gateway.path.clone();
        }
        match config_path.parent() {
            Some(dir) => dir.join(&self.gateway.path),
            None => self.gateway.path.clone(),
        }
    }
}

/// Configuration error types.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read configuration file.
    #[error("failed to read config file {path}: {source}")]
    ReadError {
        /// Path to the configuration file.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },
    /// Failed to parse configuration file.
    #[error("failed to parse config file {path}: {source}")]
    ParseError {
        /// Path to the configuration file.
        path: PathBuf,
        /// Underlying TOML parse error.
        source: toml::de::Error,
    },
    /// Failed to encode configuration.
    #[error("failed to encode config: {0}")]
    SerializeError(toml::ser::Error),
    /// Failed to write configuration file.
    #[error("failed to write config file {path}: {source}")]
    WriteError {
        /// Path to the configuration file.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },
    /// The http backend was selected without a required field.
    #[error("gateway kind \"http\" requires `{0}` in [gateway]")]
    MissingField(&'static str),
}
