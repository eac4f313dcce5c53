//! Table-driven rating engine
//!
//! This module provides the static rating tables, the per-match rating
//! change calculation and the session batch updater that produces a new,
//! ranked ratings snapshot.

pub mod batch;
pub mod calculator;
pub mod match_processor;
pub mod table;

// Re-export commonly used types
pub use batch::{
    delta_summary, DeltaSummary, LeagueBatchUpdater, RatingsSnapshot, SessionOutcome,
    SkippedMatch,
};
pub use calculator::{RatingCalculator, RatingChange, RatingChangeCalculator};
pub use match_processor::{MatchProcessor, MatchResult};
pub use table::{Outcome, RatingTable, TableVersion};
