//! JSON file ratings store
//!
//! Players are stored as an ordered JSON array of records. Backups go to
//! `<backup_dir>/ratings_before_<date>_<n>.json` using the first free `n`.

use crate::error::LeagueError;
use crate::rating::RatingsSnapshot;
use crate::store::RatingsStore;
use crate::types::PlayerRecord;
use anyhow::Context;
use async_trait::async_trait;
use chrono::NaiveDate;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Ratings store backed by a JSON file
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
    backup_dir: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl AsRef<Path>, backup_dir: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            backup_dir: backup_dir.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// First unused backup file name for a date
    async fn next_backup_path(&self, date: NaiveDate) -> crate::error::Result<PathBuf> {
        let stem = format!("ratings_before_{}_", date.format(crate::utils::DATE_FORMAT));
        let mut count = 0usize;
        loop {
            let candidate = self.backup_dir.join(format!("{}{}.json", stem, count));
            if !tokio::fs::try_exists(&candidate).await? {
                return Ok(candidate);
            }
            count += 1;
        }
    }
}

#[async_trait]
impl RatingsStore for JsonFileStore {
    async fn load(&self) -> crate::error::Result<RatingsSnapshot> {
        if !tokio::fs::try_exists(&self.path).await? {
            debug!("{} does not exist yet, starting empty", self.path.display());
            return Ok(RatingsSnapshot::default());
        }

        let text = tokio::fs::read_to_string(&self.path)
            .await
            .with_context(|| format!("Failed to read ratings from {}", self.path.display()))?;
        let players: Vec<PlayerRecord> =
            serde_json::from_str(&text).map_err(|e| LeagueError::Storage {
                message: format!("{} is not a valid ratings file: {}", self.path.display(), e),
            })?;

        let snapshot = RatingsSnapshot::new(players)?;
        info!(
            "Loaded {} players from {}",
            snapshot.len(),
            self.path.display()
        );
        Ok(snapshot)
    }

    async fn save(&self, snapshot: &RatingsSnapshot) -> crate::error::Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }

        let text = serde_json::to_string_pretty(snapshot.players())?;
        // Write next to the target and rename so a failed write leaves the old file
        let tmp = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp, text)
            .await
            .with_context(|| format!("Failed to write {}", tmp.display()))?;
        tokio::fs::rename(&tmp, &self.path)
            .await
            .with_context(|| format!("Failed to replace {}", self.path.display()))?;

        info!("Saved {} players to {}", snapshot.len(), self.path.display());
        Ok(())
    }

    async fn backup(&self, date: NaiveDate) -> crate::error::Result<Option<PathBuf>> {
        if !tokio::fs::try_exists(&self.path).await? {
            return Ok(None);
        }

        tokio::fs::create_dir_all(&self.backup_dir).await?;
        let target = self.next_backup_path(date).await?;
        tokio::fs::copy(&self.path, &target)
            .await
            .with_context(|| format!("Failed to back up ratings to {}", target.display()))?;

        info!("Backed up ratings to {}", target.display());
        Ok(Some(target))
    }
}
