//! Test fixtures and mock implementations for integration testing

#![allow(dead_code)]

use async_trait::async_trait;
use chrono::NaiveDate;
use mockall::mock;
use std::path::PathBuf;
use tt_league::error::Result;
use tt_league::rating::RatingsSnapshot;
use tt_league::store::RatingsStore;
use tt_league::types::{Division, LeagueSession, MatchRow, PlayerRecord};

// Store double for checking what a workflow writes
mock! {
    pub Store {}

    #[async_trait]
    impl RatingsStore for Store {
        async fn load(&self) -> Result<RatingsSnapshot>;
        async fn save(&self, snapshot: &RatingsSnapshot) -> Result<()>;
        async fn backup(&self, date: NaiveDate) -> Result<Option<PathBuf>>;
    }
}

pub fn date(value: &str) -> NaiveDate {
    NaiveDate::parse_from_str(value, "%Y-%m-%d").unwrap()
}

/// Snapshot of players last active on 2024-01-01
pub fn snapshot(players: &[(&str, f64)]) -> RatingsSnapshot {
    RatingsSnapshot::new(
        players
            .iter()
            .map(|(name, rating)| PlayerRecord::new(*name, *rating, date("2024-01-01")))
            .collect(),
    )
    .unwrap()
}

/// The standard test club: two divisions of three
pub fn club() -> RatingsSnapshot {
    snapshot(&[
        ("alice", 1200.0),
        ("bob", 1150.0),
        ("carol", 1100.0),
        ("dan", 1000.0),
        ("erin", 980.0),
        ("frank", 950.0),
    ])
}

/// A round-robin league night for [`club`], optionally with a newcomer in division 2
pub fn league_night(on: &str, with_newcomer: bool) -> LeagueSession {
    let mut division2 = vec!["dan".to_string(), "erin".to_string(), "frank".to_string()];
    let mut rows = vec![
        MatchRow::from_scores("alice", "bob", &[(11, 7), (11, 9), (11, 5)]),
        MatchRow::from_scores("alice", "carol", &[(9, 11), (11, 8), (7, 11), (11, 13)]),
        MatchRow::from_scores("bob", "carol", &[(11, 9), (9, 11), (11, 7), (8, 11), (11, 9)]),
        MatchRow::from_scores("dan", "erin", &[(11, 6), (11, 4), (11, 2)]),
        MatchRow::from_scores("dan", "frank", &[(5, 11), (11, 9), (6, 11), (9, 11)]),
        MatchRow::from_scores("erin", "frank", &[(11, 8), (11, 8)]),
    ];
    if with_newcomer {
        division2.push("gina".to_string());
        rows.push(MatchRow::from_scores("gina", "dan", &[(11, 3), (11, 4), (11, 5)]));
    }

    LeagueSession {
        date: date(on),
        rows,
        divisions: vec![
            Division {
                number: 1,
                players: vec!["alice".to_string(), "bob".to_string(), "carol".to_string()],
            },
            Division {
                number: 2,
                players: division2,
            },
        ],
    }
}

/// The same league night as a JSON session file
pub fn league_night_json(on: &str) -> String {
    format!(
        r#"{{
  "date": "{}",
  "divisions": [["alice", "bob", "carol"], ["dan", "erin", "frank", ""]],
  "rows": [
    ["alice", "bob", 11, 7, 11, 9, 11, 5],
    ["alice", "carol", 9, 11, 11, 8, 7, 11, 11, 13, "", ""],
    ["bob", "carol", 11, 9, 9, 11, 11, 7, 8, 11, 11, 9],
    ["dan", "erin", "11", "6", "11", "4", "11", "2"],
    ["dan", "frank", 5, 11, 11, 9, 6, 11, 9, 11],
    ["erin", "frank", 11, 8, 11, 8, null, null],
    ["", ""]
  ]
}}"#,
        on
    )
}
