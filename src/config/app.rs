//! Main application configuration
//!
//! This module defines the configuration structures for the league tools,
//! including TOML file loading, environment variable loading and validation.

use crate::config::league::LeagueSettings;
use crate::rating::TableVersion;
use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::{Path, PathBuf};

/// Main application configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub service: ServiceSettings,
    pub league: LeagueSettings,
    pub storage: StorageSettings,
}

/// Service-level settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceSettings {
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,
}

/// Where ratings, backups and metrics live
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageSettings {
    /// Ratings JSON file
    pub ratings_path: PathBuf,
    /// Directory receiving pre-session backups
    pub backup_dir: PathBuf,
    /// Optional Prometheus text dump written after each run
    pub metrics_path: Option<PathBuf>,
}

impl Default for ServiceSettings {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
        }
    }
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            ratings_path: PathBuf::from("ratings.json"),
            backup_dir: PathBuf::from("backups"),
            metrics_path: None,
        }
    }
}

impl AppConfig {
    /// Load configuration from environment variables with fallback to defaults
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();
        config.apply_env()?;
        validate_config(&config)?;
        Ok(config)
    }

    /// Load configuration from a TOML file; missing keys take defaults
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let config = Self::from_toml(&text)
            .with_context(|| format!("Invalid config file {}", path.display()))?;
        Ok(config)
    }

    /// Parse and validate a TOML document
    pub fn from_toml(text: &str) -> Result<Self> {
        let config: Self = toml::from_str(text)?;
        validate_config(&config)?;
        Ok(config)
    }

    /// Override fields from environment variables that are set
    pub fn apply_env(&mut self) -> Result<()> {
        if let Ok(log_level) = env::var("LOG_LEVEL") {
            self.service.log_level = log_level;
        }
        if let Ok(days) = env::var("ACTIVE_DAYS") {
            self.league.active_days = days
                .parse()
                .map_err(|_| anyhow!("Invalid ACTIVE_DAYS value: {}", days))?;
        }
        if let Ok(version) = env::var("TABLE_VERSION") {
            self.league.table_version = version
                .parse::<TableVersion>()
                .map_err(|_| anyhow!("Invalid TABLE_VERSION value: {}", version))?;
        }
        if let Ok(path) = env::var("RATINGS_PATH") {
            self.storage.ratings_path = PathBuf::from(path);
        }
        if let Ok(dir) = env::var("BACKUP_DIR") {
            self.storage.backup_dir = PathBuf::from(dir);
        }
        if let Ok(path) = env::var("METRICS_PATH") {
            self.storage.metrics_path = Some(PathBuf::from(path));
        }
        Ok(())
    }
}

/// Validate configuration values
pub fn validate_config(config: &AppConfig) -> Result<()> {
    match config.service.log_level.to_lowercase().as_str() {
        "trace" | "debug" | "info" | "warn" | "error" => {}
        _ => return Err(anyhow!("Invalid log level: {}", config.service.log_level)),
    }

    config.league.validate()?;

    if config.storage.ratings_path.as_os_str().is_empty() {
        return Err(anyhow!("Ratings path cannot be empty"));
    }
    if config.storage.backup_dir.as_os_str().is_empty() {
        return Err(anyhow!("Backup directory cannot be empty"));
    }

    Ok(())
}
