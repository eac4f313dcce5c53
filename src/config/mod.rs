//! Configuration management for the league tools
//!
//! This module handles configuration loading from TOML files and environment
//! variables, validation, and default values.

pub mod app;
pub mod league;

// Re-export commonly used types
pub use app::{validate_config, AppConfig, ServiceSettings, StorageSettings};
pub use league::{LeagueSettings, DEFAULT_ACTIVE_DAYS};
