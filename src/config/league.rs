//! League rules configuration

use crate::error::{LeagueError, Result};
use crate::rating::TableVersion;
use serde::{Deserialize, Serialize};

/// Default window, in days, for a player to count as active
pub const DEFAULT_ACTIVE_DAYS: i64 = 60;

/// League-wide rating settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LeagueSettings {
    /// A player is active when last seen at most this many days ago
    pub active_days: i64,
    /// Which rating table to apply
    pub table_version: TableVersion,
}

impl Default for LeagueSettings {
    fn default() -> Self {
        Self {
            active_days: DEFAULT_ACTIVE_DAYS,
            table_version: TableVersion::default(),
        }
    }
}

impl LeagueSettings {
    pub fn validate(&self) -> Result<()> {
        if self.active_days < 0 {
            return Err(LeagueError::Configuration {
                message: format!("active days must not be negative, got {}", self.active_days),
            }
            .into());
        }
        Ok(())
    }
}
