//! Ratings store interface and implementations
//!
//! The store persists the ordered ratings snapshot between sessions. The
//! engine never talks to it directly: workflows load a snapshot, hand it to
//! the batch updater and save the result.

pub mod json;

use crate::error::LeagueError;
use crate::rating::RatingsSnapshot;
use async_trait::async_trait;
use chrono::NaiveDate;
use std::path::PathBuf;
use tokio::sync::RwLock;

pub use json::JsonFileStore;

/// Trait for ratings storage operations
#[async_trait]
pub trait RatingsStore: Send + Sync {
    /// Load every player in stored order
    async fn load(&self) -> crate::error::Result<RatingsSnapshot>;

    /// Replace the stored snapshot
    async fn save(&self, snapshot: &RatingsSnapshot) -> crate::error::Result<()>;

    /// Copy the current contents aside before a session is written.
    /// Returns where the copy went, if anywhere.
    async fn backup(&self, date: NaiveDate) -> crate::error::Result<Option<PathBuf>>;
}

/// Fail with `AlreadyProcessed` if any player is active on or after `date`
pub fn ensure_not_processed(snapshot: &RatingsSnapshot, date: NaiveDate) -> crate::error::Result<()> {
    match snapshot.latest_activity() {
        Some(latest) if latest >= date => {
            Err(LeagueError::AlreadyProcessed { date, latest }.into())
        }
        _ => Ok(()),
    }
}

/// In-memory ratings store for tests and dry runs
#[derive(Debug, Default)]
pub struct InMemoryStore {
    snapshot: RwLock<RatingsSnapshot>,
    backups: RwLock<Vec<(NaiveDate, RatingsSnapshot)>>,
}

impl InMemoryStore {
    pub fn new(snapshot: RatingsSnapshot) -> Self {
        Self {
            snapshot: RwLock::new(snapshot),
            backups: RwLock::new(Vec::new()),
        }
    }

    /// Backups taken so far (for testing)
    pub async fn backups(&self) -> Vec<(NaiveDate, RatingsSnapshot)> {
        self.backups.read().await.clone()
    }
}

#[async_trait]
impl RatingsStore for InMemoryStore {
    async fn load(&self) -> crate::error::Result<RatingsSnapshot> {
        Ok(self.snapshot.read().await.clone())
    }

    async fn save(&self, snapshot: &RatingsSnapshot) -> crate::error::Result<()> {
        *self.snapshot.write().await = snapshot.clone();
        Ok(())
    }

    async fn backup(&self, date: NaiveDate) -> crate::error::Result<Option<PathBuf>> {
        let current = self.snapshot.read().await.clone();
        self.backups.write().await.push((date, current));
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::PlayerRecord;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn sample() -> RatingsSnapshot {
        RatingsSnapshot::new(vec![
            PlayerRecord::new("alice", 1000.0, date("2024-01-01")),
            PlayerRecord::new("bob", 1100.0, date("2024-02-01")),
        ])
        .unwrap()
    }

    #[test]
    fn test_ensure_not_processed() {
        let snapshot = sample();
        assert!(ensure_not_processed(&snapshot, date("2024-02-02")).is_ok());

        let err = ensure_not_processed(&snapshot, date("2024-02-01")).unwrap_err();
        assert_eq!(
            err.downcast_ref::<LeagueError>(),
            Some(&LeagueError::AlreadyProcessed {
                date: date("2024-02-01"),
                latest: date("2024-02-01"),
            })
        );
        assert!(ensure_not_processed(&snapshot, date("2024-01-15")).is_err());
        assert!(ensure_not_processed(&RatingsSnapshot::default(), date("2000-01-01")).is_ok());
    }

    #[test]
    fn test_in_memory_round_trip() {
        tokio_test::block_on(async {
            let store = InMemoryStore::default();
            assert!(store.load().await.unwrap().is_empty());

            store.save(&sample()).await.unwrap();
            assert_eq!(store.load().await.unwrap().len(), 2);

            store.backup(date("2024-03-01")).await.unwrap();
            let backups = store.backups().await;
            assert_eq!(backups.len(), 1);
            assert_eq!(backups[0].1.len(), 2);
        });
    }
}
