//! Score feed interface and implementations
//!
//! A score feed delivers one session: its date, the division rosters and the
//! raw match rows `[player1, player2, g1s1, g1s2, g2s1, g2s2, ...]`.

pub mod json;

use crate::types::LeagueSession;
use async_trait::async_trait;

pub use json::{load_authoritative, parse_authoritative, parse_row, parse_session, JsonSessionFeed};

/// Trait for sources of league session scores
#[async_trait]
pub trait ScoreFeed: Send + Sync {
    /// Load the session with all of its match rows and divisions
    async fn load_session(&self) -> crate::error::Result<LeagueSession>;
}

/// Feed returning a session held in memory
#[derive(Debug, Clone)]
pub struct StaticScoreFeed {
    session: LeagueSession,
}

impl StaticScoreFeed {
    pub fn new(session: LeagueSession) -> Self {
        Self { session }
    }
}

#[async_trait]
impl ScoreFeed for StaticScoreFeed {
    async fn load_session(&self) -> crate::error::Result<LeagueSession> {
        Ok(self.session.clone())
    }
}
