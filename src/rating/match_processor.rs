//! Turns one recorded match into a pair of zero-sum rating deltas

use crate::error::{LeagueError, LeagueResult};
use crate::rating::calculator::{RatingCalculator, RatingChangeCalculator};
use crate::types::{MatchRow, PlayerName, RatingDelta, MAX_GAMES};
use crate::utils::rating_gap;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Result of processing a single match
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchResult {
    pub player1: PlayerName,
    pub player2: PlayerName,
    pub rating1: f64,
    pub rating2: f64,
    /// Point differential of each complete game from player 1's side
    pub differentials: Vec<i64>,
    pub games_won1: u32,
    pub games_won2: u32,
    /// Games won by player 1 minus games won by player 2
    pub net_game_margin: i32,
    pub delta1: f64,
    pub delta2: f64,
}

impl MatchResult {
    /// The two rating deltas of this match
    pub fn deltas(&self) -> [RatingDelta; 2] {
        [
            RatingDelta {
                player: self.player1.clone(),
                delta: self.delta1,
            },
            RatingDelta {
                player: self.player2.clone(),
                delta: self.delta2,
            },
        ]
    }

    /// One summary line per side:
    /// `name [old] : name [old]  =>  score list  =>  ±delta`
    pub fn summary_lines(&self) -> [String; 2] {
        let opposite: Vec<i64> = self.differentials.iter().map(|d| -d).collect();
        [
            summary_line(
                &self.player1,
                self.rating1,
                &self.player2,
                self.rating2,
                &self.differentials,
                self.delta1,
            ),
            summary_line(
                &self.player2,
                self.rating2,
                &self.player1,
                self.rating1,
                &opposite,
                self.delta2,
            ),
        ]
    }
}

fn summary_line(
    name: &str,
    rating: f64,
    opponent: &str,
    opponent_rating: f64,
    differentials: &[i64],
    delta: f64,
) -> String {
    let own = format!("{} [{:>7.2}]", name, rating);
    let other = format!("{} [{:>7.2}]", opponent, opponent_rating);
    let scores = differentials
        .iter()
        .map(|d| format!("{:>3}", d))
        .collect::<Vec<_>>()
        .join(", ");
    format!(
        "{:>30} : {:>30}  =>  {:<25}  =>  {:+.2}",
        own, other, scores, delta
    )
}

/// Processes match rows with a rating calculator
#[derive(Debug, Clone, Default)]
pub struct MatchProcessor<C = RatingChangeCalculator> {
    calculator: C,
}

impl<C: RatingCalculator> MatchProcessor<C> {
    pub fn new(calculator: C) -> Self {
        Self { calculator }
    }

    pub fn calculator(&self) -> &C {
        &self.calculator
    }

    /// Process one match given both players' current ratings.
    ///
    /// Returns `Ok(None)` when the row holds no complete game.
    pub fn process(
        &self,
        row: &MatchRow,
        rating1: f64,
        rating2: f64,
    ) -> LeagueResult<Option<MatchResult>> {
        if row.player1 == row.player2 {
            return Err(LeagueError::InvalidMatchResult {
                reason: format!("{} is listed against themselves", row.player1),
            });
        }
        for (name, rating) in [(&row.player1, rating1), (&row.player2, rating2)] {
            if !rating.is_finite() {
                return Err(LeagueError::NonFiniteRating {
                    name: name.clone(),
                    value: rating,
                });
            }
        }

        let differentials = complete_differentials(row);
        if differentials.is_empty() {
            debug!(
                "No complete games between {} and {}, skipping match",
                row.player1, row.player2
            );
            return Ok(None);
        }

        let mut games_won1 = 0u32;
        let mut games_won2 = 0u32;
        for &diff in &differentials {
            if diff > 0 {
                games_won1 += 1;
            } else {
                // A tied game counts for player 2
                if diff == 0 {
                    warn!(
                        "Tied game recorded between {} and {}, counting it as a loss for {}",
                        row.player1, row.player2, row.player1
                    );
                }
                games_won2 += 1;
            }
        }
        let net_game_margin = games_won1 as i32 - games_won2 as i32;

        let describe = |err: LeagueError| match err {
            LeagueError::InvalidMatchResult { reason } => LeagueError::InvalidMatchResult {
                reason: format!("{} vs {}: {}", row.player1, row.player2, reason),
            },
            other => other,
        };

        let delta1 = self
            .calculator
            .rating_change(rating_gap(rating1, rating2), net_game_margin)
            .map_err(describe)?;
        let delta2 = self
            .calculator
            .rating_change(rating_gap(rating2, rating1), -net_game_margin)
            .map_err(describe)?;

        if delta1 != -delta2 {
            return Err(LeagueError::InvalidMatchResult {
                reason: format!(
                    "{} vs {}: deltas {} and {} are not zero-sum",
                    row.player1, row.player2, delta1, delta2
                ),
            });
        }

        let result = MatchResult {
            player1: row.player1.clone(),
            player2: row.player2.clone(),
            rating1,
            rating2,
            differentials,
            games_won1,
            games_won2,
            net_game_margin,
            delta1,
            delta2,
        };

        for line in result.summary_lines() {
            debug!("{}", line);
        }

        Ok(Some(result))
    }
}

/// Point differentials of the leading complete games, player 1's side
fn complete_differentials(row: &MatchRow) -> Vec<i64> {
    if row.games.len() > MAX_GAMES {
        warn!(
            "{} vs {} has {} games recorded, only the first {} are used",
            row.player1,
            row.player2,
            row.games.len(),
            MAX_GAMES
        );
    }

    row.games
        .iter()
        .take(MAX_GAMES)
        .map_while(|game| game.differential())
        .collect()
}
