//! Session-level aggregation of rating deltas
//!
//! The batch updater runs every match of a session through the match
//! processor, sums the deltas per player and applies them to an ordered
//! ratings snapshot. The snapshot is an explicitly ordered sequence so the
//! ranking tie-break (previous rank, then name) is deterministic.

use crate::error::{LeagueError, LeagueResult};
use crate::rating::calculator::{RatingCalculator, RatingChangeCalculator};
use crate::rating::match_processor::{MatchProcessor, MatchResult};
use crate::rating::table::TableVersion;
use crate::types::{
    AuthoritativeRating, LeagueSession, PlayerName, PlayerRecord, RankedPlayer, RatingDelta,
    RatingPoint,
};
use crate::utils::round2;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::HashMap;
use std::fmt;
use tracing::{debug, info, warn};

/// Ordered collection of player records, highest rated first after ranking
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<PlayerRecord>", into = "Vec<PlayerRecord>")]
pub struct RatingsSnapshot {
    players: Vec<PlayerRecord>,
}

impl TryFrom<Vec<PlayerRecord>> for RatingsSnapshot {
    type Error = LeagueError;

    fn try_from(players: Vec<PlayerRecord>) -> LeagueResult<Self> {
        Self::new(players)
    }
}

impl From<RatingsSnapshot> for Vec<PlayerRecord> {
    fn from(snapshot: RatingsSnapshot) -> Self {
        snapshot.players
    }
}

impl RatingsSnapshot {
    /// Build a snapshot, rejecting duplicate names and non-finite ratings
    pub fn new(players: Vec<PlayerRecord>) -> LeagueResult<Self> {
        let mut snapshot = Self::default();
        for player in players {
            snapshot.insert(player)?;
        }
        Ok(snapshot)
    }

    pub fn players(&self) -> &[PlayerRecord] {
        &self.players
    }

    pub fn into_players(self) -> Vec<PlayerRecord> {
        self.players
    }

    pub fn len(&self) -> usize {
        self.players.len()
    }

    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }

    pub fn get(&self, name: &str) -> Option<&PlayerRecord> {
        self.players.iter().find(|p| p.name == name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Current rating of a player
    pub fn rating(&self, name: &str) -> LeagueResult<f64> {
        self.get(name)
            .map(|p| p.rating)
            .ok_or_else(|| LeagueError::MissingRating {
                name: name.to_string(),
            })
    }

    /// Append a record at the end of the snapshot order
    pub fn insert(&mut self, player: PlayerRecord) -> LeagueResult<()> {
        if !player.rating.is_finite() {
            return Err(LeagueError::NonFiniteRating {
                name: player.name,
                value: player.rating,
            });
        }
        if self.contains(&player.name) {
            return Err(LeagueError::DuplicatePlayer { name: player.name });
        }
        self.players.push(player);
        Ok(())
    }

    /// Insert a newly seeded player with an externally supplied rating
    pub fn seed_player(
        &mut self,
        name: impl Into<PlayerName>,
        rating: f64,
        email: Option<String>,
    ) -> LeagueResult<()> {
        self.insert(PlayerRecord::seeded(name, rating, email))
    }

    /// Names from `names` that have no rating in this snapshot
    pub fn unresolved<'a, I>(&self, names: I) -> Vec<PlayerName>
    where
        I: IntoIterator<Item = &'a PlayerName>,
    {
        let mut missing: Vec<PlayerName> = Vec::new();
        for name in names {
            if !name.is_empty() && !self.contains(name) && !missing.contains(name) {
                missing.push(name.clone());
            }
        }
        missing
    }

    /// Newest last-active date of any player
    pub fn latest_activity(&self) -> Option<NaiveDate> {
        self.players.iter().filter_map(|p| p.last_active).max()
    }

    /// Sort by descending rating.
    ///
    /// Equal ratings are ordered by previous rank: players already ranked (with
    /// a last-active date) keep their current relative order, and unranked
    /// players follow them sorted by name.
    pub fn sort_by_rating(&mut self) {
        let previous = self.clone();
        self.sort_against(&previous);
    }

    /// Sort by descending rating, breaking ties by rank in `previous`, then by name
    fn sort_against(&mut self, previous: &RatingsSnapshot) {
        let ranks: HashMap<&str, usize> = previous
            .players
            .iter()
            .filter(|p| p.last_active.is_some())
            .enumerate()
            .map(|(rank, p)| (p.name.as_str(), rank))
            .collect();

        self.players.sort_by(|a, b| {
            b.rating
                .partial_cmp(&a.rating)
                .unwrap_or(Ordering::Equal)
                .then_with(|| {
                    match (ranks.get(a.name.as_str()), ranks.get(b.name.as_str())) {
                        (Some(x), Some(y)) => x.cmp(y),
                        (Some(_), None) => Ordering::Less,
                        (None, Some(_)) => Ordering::Greater,
                        (None, None) => a.name.cmp(&b.name),
                    }
                })
        });
    }

    /// Ranked export as of a reference date
    pub fn ranking(&self, as_of: NaiveDate, active_days: i64) -> Vec<RankedPlayer> {
        let mut ordered = self.clone();
        ordered.sort_by_rating();
        ordered
            .players
            .iter()
            .enumerate()
            .map(|(index, player)| RankedPlayer {
                rank: index + 1,
                name: player.name.clone(),
                rating: player.rating,
                active: player.is_active(as_of, active_days),
            })
            .collect()
    }

    /// Average rating of the named players that are present
    pub fn average_rating<'a, I>(&self, names: I) -> f64
    where
        I: IntoIterator<Item = &'a str>,
    {
        let ratings: Vec<f64> = names
            .into_iter()
            .filter_map(|name| self.get(name).map(|p| p.rating))
            .collect();
        crate::utils::average(&ratings)
    }

    fn get_mut(&mut self, name: &str) -> Option<&mut PlayerRecord> {
        self.players.iter_mut().find(|p| p.name == name)
    }
}

/// Whether a player's rating went up or down in a session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeltaSummary {
    pub name: PlayerName,
    /// Signed change rounded to two decimals
    pub change: f64,
}

impl DeltaSummary {
    pub fn increased(&self) -> bool {
        self.change > 0.0
    }
}

impl fmt::Display for DeltaSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.increased() {
            write!(f, "{} increased by {:.2}", self.name, self.change)
        } else {
            write!(f, "{} decreased by {:.2}", self.name, self.change.abs())
        }
    }
}

/// Per-player changes between two snapshots, skipping unchanged players.
///
/// Players missing from `before` are new and not reported.
pub fn delta_summary(before: &RatingsSnapshot, after: &RatingsSnapshot) -> Vec<DeltaSummary> {
    after
        .players()
        .iter()
        .filter_map(|player| {
            let old = before.get(&player.name)?;
            let change = round2(player.rating - old.rating);
            (change != 0.0).then(|| DeltaSummary {
                name: player.name.clone(),
                change,
            })
        })
        .collect()
}

/// A match whose effect could not be applied
#[derive(Debug, Clone, PartialEq)]
pub struct SkippedMatch {
    /// Position of the row in the session
    pub index: usize,
    pub player1: PlayerName,
    pub player2: PlayerName,
    pub error: LeagueError,
}

/// Everything produced by applying one session
#[derive(Debug, Clone)]
pub struct SessionOutcome {
    pub date: NaiveDate,
    /// Updated snapshot, ordered by rank
    pub snapshot: RatingsSnapshot,
    /// Processed matches in session order
    pub matches: Vec<MatchResult>,
    /// Summed delta per player, in order of first appearance.
    ///
    /// Players in `already_processed` have a computed total that was not applied.
    pub totals: Vec<RatingDelta>,
    /// Rows without a single complete game
    pub empty_matches: Vec<usize>,
    /// Rows that failed and contributed nothing
    pub skipped: Vec<SkippedMatch>,
    /// Players whose last-active date was not before the session date; their
    /// records are carried over unchanged
    pub already_processed: Vec<PlayerName>,
}

impl SessionOutcome {
    /// Total delta for a player, 0 if untouched
    pub fn total_for(&self, name: &str) -> f64 {
        self.totals
            .iter()
            .find(|d| d.player == name)
            .map(|d| d.delta)
            .unwrap_or(0.0)
    }

    /// Sum of every computed delta
    pub fn net_change(&self) -> f64 {
        self.totals.iter().map(|d| d.delta).sum()
    }

    /// Delta actually applied to a player's rating
    pub fn applied_for(&self, name: &str) -> f64 {
        if self.already_processed.iter().any(|n| n == name) {
            0.0
        } else {
            self.total_for(name)
        }
    }

    /// Players referenced by matches but absent from the snapshot
    pub fn missing_players(&self) -> Vec<PlayerName> {
        let mut names: Vec<PlayerName> = Vec::new();
        for skipped in &self.skipped {
            if let LeagueError::MissingRating { name } = &skipped.error {
                if !names.contains(name) {
                    names.push(name.clone());
                }
            }
        }
        names
    }
}

/// Applies whole sessions to ratings snapshots
#[derive(Debug, Clone)]
pub struct LeagueBatchUpdater<C = RatingChangeCalculator> {
    processor: MatchProcessor<C>,
}

impl Default for LeagueBatchUpdater {
    fn default() -> Self {
        Self::with_table(TableVersion::default())
    }
}

impl LeagueBatchUpdater<RatingChangeCalculator> {
    /// Updater over a given table version
    pub fn with_table(version: TableVersion) -> Self {
        Self::new(RatingChangeCalculator::new(version))
    }
}

impl<C: RatingCalculator> LeagueBatchUpdater<C> {
    pub fn new(calculator: C) -> Self {
        Self {
            processor: MatchProcessor::new(calculator),
        }
    }

    pub fn processor(&self) -> &MatchProcessor<C> {
        &self.processor
    }

    /// Compute and apply the deltas of a session.
    ///
    /// Unresolved players and invalid matches are reported in the outcome and
    /// do not stop the rest of the batch. Ratings are read from `snapshot` as
    /// it was before the session, so match order does not matter.
    pub fn apply_session(
        &self,
        snapshot: &RatingsSnapshot,
        session: &LeagueSession,
    ) -> SessionOutcome {
        let mut matches = Vec::new();
        let mut empty_matches = Vec::new();
        let mut skipped = Vec::new();
        let mut totals: Vec<RatingDelta> = Vec::new();
        let mut positions: HashMap<PlayerName, usize> = HashMap::new();

        for (index, row) in session.rows.iter().enumerate() {
            let ratings = snapshot
                .rating(&row.player1)
                .and_then(|r1| snapshot.rating(&row.player2).map(|r2| (r1, r2)));

            let result = ratings.and_then(|(r1, r2)| self.processor.process(row, r1, r2));

            match result {
                Ok(Some(result)) => {
                    for delta in result.deltas() {
                        match positions.get(&delta.player) {
                            Some(&pos) => totals[pos].delta += delta.delta,
                            None => {
                                positions.insert(delta.player.clone(), totals.len());
                                totals.push(delta);
                            }
                        }
                    }
                    matches.push(result);
                }
                Ok(None) => empty_matches.push(index),
                Err(error) => {
                    warn!(
                        "Skipping match {} ({} vs {}): {}",
                        index + 1,
                        row.player1,
                        row.player2,
                        error
                    );
                    skipped.push(SkippedMatch {
                        index,
                        player1: row.player1.clone(),
                        player2: row.player2.clone(),
                        error,
                    });
                }
            }
        }

        let mut updated = snapshot.clone();
        let mut already_processed = Vec::new();

        for total in &totals {
            // Every player in `totals` was resolved against `snapshot`
            let Some(player) = updated.get_mut(&total.player) else {
                continue;
            };
            let is_new_session = player
                .last_active
                .map(|last| last < session.date)
                .unwrap_or(true);
            if is_new_session {
                player.rating += total.delta;
                player.last_active = Some(session.date);
                player.leagues_played += 1;
                player.history.push(RatingPoint {
                    rating: player.rating,
                    date: session.date,
                });
            } else {
                debug!(
                    "{} was already active on or after {}, record left unchanged",
                    player.name, session.date
                );
                already_processed.push(player.name.clone());
            }
        }

        updated.sort_against(snapshot);

        info!(
            "Applied session {}: {} matches, {} empty, {} skipped, {} players changed",
            session.date,
            matches.len(),
            empty_matches.len(),
            skipped.len(),
            totals.len()
        );

        SessionOutcome {
            date: session.date,
            snapshot: updated,
            matches,
            totals,
            empty_matches,
            skipped,
            already_processed,
        }
    }

    /// Like [`apply_session`](Self::apply_session) but fails on the first
    /// unresolved or invalid match.
    pub fn apply_session_strict(
        &self,
        snapshot: &RatingsSnapshot,
        session: &LeagueSession,
    ) -> LeagueResult<SessionOutcome> {
        let outcome = self.apply_session(snapshot, session);
        match outcome.skipped.first() {
            Some(skipped) => Err(skipped.error.clone()),
            None => Ok(outcome),
        }
    }

    /// Replace ratings with values from an authoritative source.
    ///
    /// Every supplied rating overwrites the current one and appends a history
    /// point dated `date`, with no last-active guard. Last-active dates are
    /// left alone for existing players; unknown names are inserted as new
    /// players active on `date`.
    pub fn overwrite_from_authoritative(
        &self,
        snapshot: &RatingsSnapshot,
        ratings: &[AuthoritativeRating],
        date: NaiveDate,
    ) -> LeagueResult<RatingsSnapshot> {
        let mut updated = snapshot.clone();

        for entry in ratings {
            if !entry.rating.is_finite() {
                return Err(LeagueError::NonFiniteRating {
                    name: entry.name.clone(),
                    value: entry.rating,
                });
            }

            match updated.get_mut(&entry.name) {
                Some(player) => {
                    player.rating = entry.rating;
                    player.history.push(RatingPoint {
                        rating: entry.rating,
                        date,
                    });
                }
                None => {
                    debug!("Adding {} from authoritative ratings", entry.name);
                    updated.insert(PlayerRecord::new(entry.name.clone(), entry.rating, date))?;
                }
            }
        }

        updated.sort_against(snapshot);
        Ok(updated)
    }
}
