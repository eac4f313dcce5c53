//! Error types for the league rating tools
//!
//! The rating engine reports typed `LeagueError`s so callers can tell a
//! drawn match from a missing rating. Collaborators and workflows use
//! anyhow for consistent propagation, as elsewhere in the crate.

use chrono::NaiveDate;

/// Result type alias for convenience
pub type Result<T> = anyhow::Result<T>;

/// Result type used by the pure rating engine
pub type LeagueResult<T> = std::result::Result<T, LeagueError>;

/// Custom error types for specific league scenarios
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum LeagueError {
    #[error("Invalid match result: {reason}")]
    InvalidMatchResult { reason: String },

    #[error("Missing rating for player: {name}")]
    MissingRating { name: String },

    #[error("Session on {date} has already been processed (latest activity {latest})")]
    AlreadyProcessed { date: NaiveDate, latest: NaiveDate },

    #[error("Rating for {name} is not a finite number: {value}")]
    NonFiniteRating { name: String, value: f64 },

    #[error("Player already exists: {name}")]
    DuplicatePlayer { name: String },

    #[error("Invalid score feed: {reason}")]
    InvalidScoreFeed { reason: String },

    #[error("Ratings store error: {message}")]
    Storage { message: String },

    #[error("Configuration error: {message}")]
    Configuration { message: String },

    #[error("Aborted: {reason}")]
    Aborted { reason: String },
}

impl LeagueError {
    /// Short label used for metrics and skip reports
    pub fn kind(&self) -> &'static str {
        match self {
            LeagueError::InvalidMatchResult { .. } => "invalid_match_result",
            LeagueError::MissingRating { .. } => "missing_rating",
            LeagueError::AlreadyProcessed { .. } => "already_processed",
            LeagueError::NonFiniteRating { .. } => "non_finite_rating",
            LeagueError::DuplicatePlayer { .. } => "duplicate_player",
            LeagueError::InvalidScoreFeed { .. } => "invalid_score_feed",
            LeagueError::Storage { .. } => "storage",
            LeagueError::Configuration { .. } => "configuration",
            LeagueError::Aborted { .. } => "aborted",
        }
    }
}
