//! Common types used throughout the league rating tools

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Players are keyed by their display name
pub type PlayerName = String;

/// One point in a player's rating history
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RatingPoint {
    pub rating: f64,
    pub date: NaiveDate,
}

/// A rated league player as held by the ratings store
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerRecord {
    pub name: PlayerName,
    pub rating: f64,
    /// Date of the last session the player took part in. `None` for players
    /// seeded but not yet processed in any session.
    #[serde(default)]
    pub last_active: Option<NaiveDate>,
    #[serde(default)]
    pub leagues_played: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default)]
    pub history: Vec<RatingPoint>,
}

impl PlayerRecord {
    /// Create a record for a player with a known rating and activity date
    pub fn new(name: impl Into<PlayerName>, rating: f64, last_active: NaiveDate) -> Self {
        Self {
            name: name.into(),
            rating,
            last_active: Some(last_active),
            leagues_played: 1,
            email: None,
            history: vec![RatingPoint {
                rating,
                date: last_active,
            }],
        }
    }

    /// Create a record for a newly seeded player. The first history point is
    /// added when the player's first session is applied.
    pub fn seeded(name: impl Into<PlayerName>, rating: f64, email: Option<String>) -> Self {
        Self {
            name: name.into(),
            rating,
            last_active: None,
            leagues_played: 0,
            email,
            history: Vec::new(),
        }
    }

    /// Whether the player has played within `active_days` of `as_of`
    pub fn is_active(&self, as_of: NaiveDate, active_days: i64) -> bool {
        self.last_active
            .map(|date| (as_of - date).num_days() <= active_days)
            .unwrap_or(false)
    }
}

/// Points scored by each side in a single game. A missing side means the
/// game was not played.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct GameScore {
    pub player1: Option<u32>,
    pub player2: Option<u32>,
}

impl GameScore {
    pub fn new(player1: u32, player2: u32) -> Self {
        Self {
            player1: Some(player1),
            player2: Some(player2),
        }
    }

    /// A game with no recorded scores
    pub fn unplayed() -> Self {
        Self::default()
    }

    /// Point differential from player 1's side, if both scores are present
    pub fn differential(&self) -> Option<i64> {
        match (self.player1, self.player2) {
            (Some(a), Some(b)) => Some(i64::from(a) - i64::from(b)),
            _ => None,
        }
    }
}

/// Maximum number of games in a best-of-five match
pub const MAX_GAMES: usize = 5;

/// One match of a session as delivered by the score feed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchRow {
    pub player1: PlayerName,
    pub player2: PlayerName,
    /// Up to five games; trailing games may be unplayed
    pub games: Vec<GameScore>,
}

impl MatchRow {
    pub fn new(
        player1: impl Into<PlayerName>,
        player2: impl Into<PlayerName>,
        games: Vec<GameScore>,
    ) -> Self {
        Self {
            player1: player1.into(),
            player2: player2.into(),
            games,
        }
    }

    /// Convenience constructor from complete `(score1, score2)` pairs
    pub fn from_scores(
        player1: impl Into<PlayerName>,
        player2: impl Into<PlayerName>,
        scores: &[(u32, u32)],
    ) -> Self {
        let games = scores.iter().map(|&(a, b)| GameScore::new(a, b)).collect();
        Self::new(player1, player2, games)
    }
}

/// Signed rating change for one player
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RatingDelta {
    pub player: PlayerName,
    pub delta: f64,
}

/// Players grouped into one division of a session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Division {
    /// 1-based division number
    pub number: usize,
    /// Roster slots; blank names are kept as empty slots
    pub players: Vec<PlayerName>,
}

impl Division {
    /// Named players in roster order, skipping empty slots
    pub fn named_players(&self) -> impl Iterator<Item = &str> {
        self.players
            .iter()
            .map(String::as_str)
            .filter(|name| !name.is_empty())
    }
}

/// One league date's batch of matches
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeagueSession {
    pub date: NaiveDate,
    pub rows: Vec<MatchRow>,
    pub divisions: Vec<Division>,
}

impl LeagueSession {
    /// All named players on the roster, in division order
    pub fn roster(&self) -> Vec<PlayerName> {
        let mut names: Vec<PlayerName> = Vec::new();
        for division in &self.divisions {
            for name in division.named_players() {
                if !names.iter().any(|n| n == name) {
                    names.push(name.to_string());
                }
            }
        }
        names
    }

    /// Every player referenced by the roster or by a match row
    pub fn involved_players(&self) -> Vec<PlayerName> {
        let mut names = self.roster();
        for row in &self.rows {
            for name in [&row.player1, &row.player2] {
                if !names.contains(name) {
                    names.push(name.clone());
                }
            }
        }
        names
    }

    /// Division a player is listed in, if any
    pub fn division_of(&self, name: &str) -> Option<&Division> {
        self.divisions
            .iter()
            .find(|division| division.named_players().any(|n| n == name))
    }
}

/// One line of the ranked export
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedPlayer {
    pub rank: usize,
    pub name: PlayerName,
    pub rating: f64,
    pub active: bool,
}

/// Authoritative rating supplied by an external source for overwrite mode
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthoritativeRating {
    pub name: PlayerName,
    pub rating: f64,
}
