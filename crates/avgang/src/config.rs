//! Configuration management for avgang.
//!
//! This module provides configuration loading and validation using figment,
//! supporting TOML config files, environment variables, and defaults.

use std::path::{Path, PathBuf};

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::import::ImportPolicy;
use crate::rules::DEFAULT_UNIT_PATTERN;

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "config.toml";

/// Default data directory name.
const DATA_DIR_NAME: &str = "avgang";

/// Default JSON data file name.
const JSON_FILE_NAME: &str = "avganger.json";

/// Default `SQLite` database file name.
const DATABASE_FILE_NAME: &str = "avganger.db";

/// Prefix for environment overrides.
const ENV_PREFIX: &str = "AVGANG_";

/// Application configuration.
///
/// Configuration is loaded from (in order of precedence, highest first):
/// 1. Environment variables (prefixed with `AVGANG_`, sections split by `__`)
/// 2. TOML config file at `~/.config/avgang/config.toml`
/// 3. Default values
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Storage configuration.
    pub storage: StorageConfig,
    /// Validation configuration.
    pub validation: ValidationConfig,
    /// Import configuration.
    pub import: ImportConfig,
    /// Export configuration.
    pub export: ExportConfig,
}

/// Which persistence backend the registry uses.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    /// Pretty-printed JSON array file.
    #[default]
    Json,
    /// Single `SQLite` table.
    Sqlite,
    /// Nothing is written; records live for one process.
    Memory,
}

impl std::fmt::Display for StorageBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Json => write!(f, "json"),
            Self::Sqlite => write!(f, "sqlite"),
            Self::Memory => write!(f, "memory"),
        }
    }
}

/// Storage-related configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Backend kind.
    pub backend: StorageBackend,
    /// Path to the data file.
    /// Defaults to `~/.local/share/avgang/avganger.json` (or `avganger.db`).
    pub path: Option<PathBuf>,
}

/// Unit-number validation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidationConfig {
    /// Reject unit numbers that do not match `unit_pattern`.
    pub enforce_unit_pattern: bool,
    /// Regular expression checked against the uppercased unit number.
    pub unit_pattern: String,
}

/// Import behaviour.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImportConfig {
    /// Default policy when the caller does not pick one.
    pub policy: ImportPolicy,
}

/// CSV export options.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportConfig {
    /// Field delimiter.
    pub csv_delimiter: char,
    /// Write a UTF-8 byte order mark so spreadsheet tools detect the encoding.
    pub csv_bom: bool,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            enforce_unit_pattern: true,
            unit_pattern: DEFAULT_UNIT_PATTERN.to_string(),
        }
    }
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            csv_delimiter: ';',
            csv_bom: true,
        }
    }
}

impl ExportConfig {
    /// The delimiter as a single byte.
    ///
    /// # Errors
    ///
    /// Returns a validation error if the delimiter is not ASCII.
    pub fn delimiter_byte(&self) -> Result<u8> {
        u8::try_from(self.csv_delimiter)
            .ok()
            .filter(u8::is_ascii)
            .ok_or_else(|| Error::ConfigValidation {
                message: format!("csv_delimiter must be ASCII, got '{}'", self.csv_delimiter),
            })
    }
}

impl Config {
    /// Load configuration from all sources.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration loading or parsing fails.
    pub fn load() -> Result<Self> {
        Self::load_from(None)
    }

    /// Load configuration with an optional custom config path.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration loading or parsing fails.
    pub fn load_from(config_path: Option<PathBuf>) -> Result<Self> {
        let config_file = config_path.unwrap_or_else(Self::default_config_path);
        let config: Config = Self::figment(&config_file).extract()?;
        config.validate()?;
        Ok(config)
    }

    /// The layered provider used by [`Config::load_from`].
    fn figment(config_file: &Path) -> Figment {
        Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Toml::file(config_file))
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
    }

    /// Get the default configuration file path.
    #[must_use]
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from(".config"))
            .join(DATA_DIR_NAME)
            .join(CONFIG_FILE_NAME)
    }

    /// Get the default data directory path.
    #[must_use]
    pub fn default_data_dir() -> PathBuf {
        dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from(".local/share"))
            .join(DATA_DIR_NAME)
    }

    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if any configuration values are invalid.
    pub fn validate(&self) -> Result<()> {
        if regex::Regex::new(&self.validation.unit_pattern).is_err() {
            return Err(Error::ConfigValidation {
                message: format!("invalid unit pattern: {}", self.validation.unit_pattern),
            });
        }

        let delimiter = self.export.delimiter_byte()?;
        if matches!(delimiter, b'"' | b'\n' | b'\r') {
            return Err(Error::ConfigValidation {
                message: "csv_delimiter cannot be a quote or line break".to_string(),
            });
        }

        Ok(())
    }

    /// Get the data file path, resolving defaults if not set.
    #[must_use]
    pub fn data_path(&self) -> PathBuf {
        self.storage.path.clone().unwrap_or_else(|| {
            let file = match self.storage.backend {
                StorageBackend::Sqlite => DATABASE_FILE_NAME,
                StorageBackend::Json | StorageBackend::Memory => JSON_FILE_NAME,
            };
            Self::default_data_dir().join(file)
        })
    }
}
