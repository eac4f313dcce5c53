//! Rating calculator trait and the table-driven implementation
//!
//! A rating change is a pure function of the signed rating gap and the signed
//! net game margin of a best-of-five match. Evaluating the same match from the
//! opponent's side (gap and margin negated) always yields the exact negation.

use crate::error::{LeagueError, LeagueResult};
use crate::rating::table::{Outcome, RatingTable, TableVersion, MARGIN_CLASSES};
use serde::{Deserialize, Serialize};

/// Intermediate classification of one rating change, useful for reporting
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RatingChange {
    pub outcome: Outcome,
    pub bucket: usize,
    pub margin_class: usize,
    /// Signed delta for the side the change was computed for
    pub delta: f64,
}

/// Trait for calculating the rating change of one side of a match
pub trait RatingCalculator: Send + Sync {
    /// Calculate the signed delta for player A
    ///
    /// # Arguments
    /// * `rating_gap` - rating(A) - rating(B)
    /// * `net_game_margin` - games won by A minus games won by B
    fn rating_change(&self, rating_gap: f64, net_game_margin: i32) -> LeagueResult<f64>;

    /// Table version the calculator reads from
    fn table_version(&self) -> TableVersion;
}

/// Table-driven rating change calculator
#[derive(Debug, Clone, Copy)]
pub struct RatingChangeCalculator {
    table: &'static RatingTable,
}

impl RatingChangeCalculator {
    /// Create a calculator over the given table version
    pub fn new(version: TableVersion) -> Self {
        Self {
            table: RatingTable::get(version),
        }
    }

    pub fn table(&self) -> &'static RatingTable {
        self.table
    }

    /// Classify and price one side of a match
    pub fn classify(&self, rating_gap: f64, net_game_margin: i32) -> LeagueResult<RatingChange> {
        if !rating_gap.is_finite() {
            return Err(LeagueError::InvalidMatchResult {
                reason: format!("rating gap is not finite: {}", rating_gap),
            });
        }
        if net_game_margin == 0 {
            return Err(LeagueError::InvalidMatchResult {
                reason: "net game margin is zero, a best-of-five cannot be drawn".to_string(),
            });
        }

        let margin_class = (net_game_margin.unsigned_abs() - 1) as usize;
        if margin_class >= MARGIN_CLASSES {
            return Err(LeagueError::InvalidMatchResult {
                reason: format!(
                    "net game margin {} is outside a best-of-five",
                    net_game_margin
                ),
            });
        }

        let is_favorite = rating_gap >= 0.0;
        let is_winner = net_game_margin > 0;
        let outcome = if is_favorite == is_winner {
            Outcome::Expected
        } else {
            Outcome::Unexpected
        };

        let bucket = RatingTable::bucket(rating_gap);
        let magnitude = self
            .table
            .magnitude(outcome, bucket, margin_class)
            .ok_or_else(|| LeagueError::InvalidMatchResult {
                reason: format!(
                    "no table entry for bucket {} margin class {}",
                    bucket, margin_class
                ),
            })?;

        let delta = if is_winner { magnitude } else { -magnitude };

        Ok(RatingChange {
            outcome,
            bucket,
            margin_class,
            delta,
        })
    }
}

impl Default for RatingChangeCalculator {
    fn default() -> Self {
        Self::new(TableVersion::default())
    }
}

impl RatingCalculator for RatingChangeCalculator {
    fn rating_change(&self, rating_gap: f64, net_game_margin: i32) -> LeagueResult<f64> {
        self.classify(rating_gap, net_game_margin)
            .map(|change| change.delta)
    }

    fn table_version(&self) -> TableVersion {
        self.table.version()
    }
}
