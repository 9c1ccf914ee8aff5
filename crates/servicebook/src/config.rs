//! Configuration management for servicebook.
//!
//! This module provides configuration loading and validation using figment,
//! supporting TOML config files, environment variables, and defaults.

use std::collections::HashSet;
use std::path::PathBuf;

use chrono::Duration;
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::storage::DEFAULT_SERVICE_TYPES;

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "config.toml";

/// Default data directory name.
const DATA_DIR_NAME: &str = "servicebook";

/// Default database file name.
const DATABASE_FILE_NAME: &str = "app_data.db";

/// Default backup directory name, inside the data directory.
const BACKUP_DIR_NAME: &str = "backups";

/// Prefix for environment variable overrides.
const ENV_PREFIX: &str = "SERVICEBOOK_";

/// Application configuration.
///
/// Configuration is loaded from (in order of precedence, highest first):
/// 1. Environment variables (prefixed with `SERVICEBOOK_`, sections split by `__`)
/// 2. TOML config file at `~/.config/servicebook/config.toml`
/// 3. Default values
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Storage configuration.
    pub storage: StorageConfig,
    /// Backup configuration.
    pub backup: BackupConfig,
    /// Service type catalog configuration.
    pub catalog: CatalogConfig,
}

/// Storage-related configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Path to the database file.
    /// Defaults to `~/.local/share/servicebook/app_data.db`
    pub database_path: Option<PathBuf>,
}

/// Backup-related configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BackupConfig {
    /// Take automatic backups before changing data.
    pub enabled: bool,
    /// Directory that receives backup files.
    /// Defaults to `~/.local/share/servicebook/backups`
    pub directory: Option<PathBuf>,
    /// Minimum number of days between automatic backups.
    pub interval_days: u32,
    /// Number of backup files to keep. Set to 0 for unlimited.
    pub keep: usize,
}

/// Service type catalog configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CatalogConfig {
    /// Service types written into a new, empty database.
    pub default_service_types: Vec<String>,
}

impl Default for BackupConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            directory: None, // Will be resolved to default at runtime
            interval_days: 30,
            keep: 10,
        }
    }
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            default_service_types: DEFAULT_SERVICE_TYPES
                .iter()
                .map(ToString::to_string)
                .collect(),
        }
    }
}

impl Config {
    /// Load configuration from all sources.
    ///
    /// Configuration is loaded in this order (later sources override earlier):
    /// 1. Default values
    /// 2. TOML config file at `config_path`, or the default path (if it exists)
    /// 3. Environment variables (prefixed with `SERVICEBOOK_`)
    ///
    /// # Errors
    ///
    /// Returns an error if configuration loading or parsing fails.
    pub fn load_from(config_path: Option<PathBuf>) -> Result<Self> {
        let config_file = config_path.unwrap_or_else(Self::default_config_path);

        let figment = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Toml::file(&config_file))
            .merge(Env::prefixed(ENV_PREFIX).split("__"));

        let config: Config = figment.extract()?;
        config.validate()?;
        Ok(config)
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
        if self.backup.enabled && self.backup.interval_days == 0 {
            return Err(Error::ConfigValidation {
                message: "backup.interval_days must be greater than 0 when backups are enabled"
                    .to_string(),
            });
        }

        let mut seen = HashSet::new();
        for name in &self.catalog.default_service_types {
            let name = name.trim();
            if name.is_empty() {
                return Err(Error::ConfigValidation {
                    message: "catalog.default_service_types must not contain empty names"
                        .to_string(),
                });
            }
            if !seen.insert(name.to_lowercase()) {
                return Err(Error::ConfigValidation {
                    message: format!("duplicate default service type: {name}"),
                });
            }
        }

        Ok(())
    }

    /// Get the database path, resolving defaults if not set.
    #[must_use]
    pub fn database_path(&self) -> PathBuf {
        self.storage
            .database_path
            .clone()
            .unwrap_or_else(|| Self::default_data_dir().join(DATABASE_FILE_NAME))
    }

    /// Get the backup directory, resolving defaults if not set.
    #[must_use]
    pub fn backup_dir(&self) -> PathBuf {
        self.backup
            .directory
            .clone()
            .unwrap_or_else(|| Self::default_data_dir().join(BACKUP_DIR_NAME))
    }

    /// Get the backup interval as a Duration.
    #[must_use]
    pub fn backup_interval(&self) -> Duration {
        Duration::days(i64::from(self.backup.interval_days))
    }
}
