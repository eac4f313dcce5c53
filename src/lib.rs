//! tt-league - Table-tennis league rating engine
//!
//! This crate computes rating changes for best-of-five table-tennis matches
//! from fixed rating-gap / game-margin lookup tables, aggregates them per
//! league session and applies them to an ordered ratings snapshot. Around
//! the engine sit a JSON score feed, a JSON ratings store with backups, an
//! operator console for seeding new players, and the command line workflows.

pub mod config;
pub mod error;
pub mod feed;
pub mod metrics;
pub mod rating;
pub mod seeding;
pub mod service;
pub mod store;
pub mod types;
pub mod utils;

// Re-export commonly used types and traits
pub use error::{LeagueError, LeagueResult, Result};
pub use types::*;

// Re-export key components
pub use feed::ScoreFeed;
pub use rating::{LeagueBatchUpdater, MatchProcessor, RatingChangeCalculator, RatingsSnapshot};
pub use store::RatingsStore;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
