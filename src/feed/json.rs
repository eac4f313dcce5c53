//! JSON session files
//!
//! ```json
//! { "date": "2024-03-14",
//!   "divisions": [["Alice", "Bob", ""], ["Carol", "Dan"]],
//!   "rows": [["Alice", "Bob", 11, 7, "9", 11, "", ""]] }
//! ```
//!
//! Cells may be strings, numbers or null. Empty score cells mean the game was
//! not played; rows with a blank player name are layout filler.

use crate::error::{LeagueError, LeagueResult};
use crate::feed::ScoreFeed;
use crate::types::{AuthoritativeRating, Division, GameScore, LeagueSession, MatchRow};
use anyhow::Context;
use async_trait::async_trait;
use chrono::NaiveDate;
use serde::Deserialize;
use serde_json::Value;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

#[derive(Debug, Deserialize)]
struct RawSession {
    date: NaiveDate,
    #[serde(default)]
    divisions: Vec<Vec<String>>,
    #[serde(default)]
    rows: Vec<Vec<Value>>,
}

/// Parse a whole session file
pub fn parse_session(text: &str) -> LeagueResult<LeagueSession> {
    let raw: RawSession =
        serde_json::from_str(text).map_err(|e| LeagueError::InvalidScoreFeed {
            reason: format!("malformed session file: {}", e),
        })?;

    let mut rows = Vec::new();
    for (index, cells) in raw.rows.iter().enumerate() {
        if let Some(row) = parse_row(cells, index)? {
            rows.push(row);
        }
    }

    let divisions = raw
        .divisions
        .into_iter()
        .enumerate()
        .map(|(index, players)| Division {
            number: index + 1,
            players: players.iter().map(|p| p.trim().to_string()).collect(),
        })
        .collect();

    Ok(LeagueSession {
        date: raw.date,
        rows,
        divisions,
    })
}

/// Parse one ragged feed row. Returns `Ok(None)` for filler rows.
pub fn parse_row(cells: &[Value], index: usize) -> LeagueResult<Option<MatchRow>> {
    if cells.len() < 2 {
        return Ok(None);
    }

    let player1 = parse_name(&cells[0], index)?;
    let player2 = parse_name(&cells[1], index)?;
    if player1.is_empty() || player2.is_empty() {
        debug!("Row {} has a blank player name, ignoring", index + 1);
        return Ok(None);
    }

    let mut games = Vec::new();
    for pair in cells[2..].chunks(2) {
        let player1_score = parse_score(&pair[0], index)?;
        let player2_score = match pair.get(1) {
            Some(cell) => parse_score(cell, index)?,
            None => None,
        };
        games.push(GameScore {
            player1: player1_score,
            player2: player2_score,
        });
    }

    Ok(Some(MatchRow::new(player1, player2, games)))
}

fn parse_name(cell: &Value, index: usize) -> LeagueResult<String> {
    match cell {
        Value::Null => Ok(String::new()),
        Value::String(name) => Ok(name.trim().to_string()),
        other => Err(LeagueError::InvalidScoreFeed {
            reason: format!("row {}: player name must be text, got {}", index + 1, other),
        }),
    }
}

fn parse_score(cell: &Value, index: usize) -> LeagueResult<Option<u32>> {
    let invalid = || LeagueError::InvalidScoreFeed {
        reason: format!("row {}: invalid score {}", index + 1, cell),
    };

    match cell {
        Value::Null => Ok(None),
        Value::String(text) if text.trim().is_empty() => Ok(None),
        Value::String(text) => text
            .trim()
            .parse::<f64>()
            .ok()
            .and_then(points)
            .map(Some)
            .ok_or_else(invalid),
        Value::Number(number) => number
            .as_f64()
            .and_then(points)
            .map(Some)
            .ok_or_else(invalid),
        _ => Err(invalid()),
    }
}

/// Whole, non-negative point count
fn points(value: f64) -> Option<u32> {
    (value.is_finite() && value >= 0.0 && value.fract() == 0.0 && value <= f64::from(u32::MAX))
        .then(|| value as u32)
}

/// Parse an authoritative ratings file: `[{"name": "...", "rating": 1234.5}]`
pub fn parse_authoritative(text: &str) -> LeagueResult<Vec<AuthoritativeRating>> {
    let entries: Vec<AuthoritativeRating> =
        serde_json::from_str(text).map_err(|e| LeagueError::InvalidScoreFeed {
            reason: format!("authoritative ratings: {}", e),
        })?;

    entries
        .into_iter()
        .filter_map(|entry| {
            let name = entry.name.trim().to_string();
            if name.is_empty() {
                return None;
            }
            if !entry.rating.is_finite() {
                return Some(Err(LeagueError::NonFiniteRating {
                    name,
                    value: entry.rating,
                }));
            }
            Some(Ok(AuthoritativeRating {
                name,
                rating: entry.rating,
            }))
        })
        .collect()
}

/// Read an authoritative ratings file from disk
pub async fn load_authoritative(path: impl AsRef<Path>) -> crate::error::Result<Vec<AuthoritativeRating>> {
    let path = path.as_ref();
    let text = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read authoritative ratings {}", path.display()))?;
    let ratings = parse_authoritative(&text)?;
    debug!("Read {} authoritative ratings from {}", ratings.len(), path.display());
    Ok(ratings)
}

/// Score feed reading a JSON session file from disk
#[derive(Debug, Clone)]
pub struct JsonSessionFeed {
    path: PathBuf,
}

impl JsonSessionFeed {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }
}

#[async_trait]
impl ScoreFeed for JsonSessionFeed {
    async fn load_session(&self) -> crate::error::Result<LeagueSession> {
        let text = tokio::fs::read_to_string(&self.path)
            .await
            .with_context(|| format!("Failed to read session file {}", self.path.display()))?;
        let session = parse_session(&text)?;
        info!(
            "Loaded session {} from {}: {} matches in {} divisions",
            session.date,
            self.path.display(),
            session.rows.len(),
            session.divisions.len()
        );
        Ok(session)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_ragged_row() {
        let cells = vec![
            json!(" alice "),
            json!("bob"),
            json!(11),
            json!("7"),
            json!(9),
            json!(11),
            json!(""),
            json!(null),
        ];
        let row = parse_row(&cells, 0).unwrap().unwrap();

        assert_eq!(row.player1, "alice");
        assert_eq!(row.player2, "bob");
        assert_eq!(row.games.len(), 3);
        assert_eq!(row.games[0], GameScore::new(11, 7));
        assert_eq!(row.games[1], GameScore::new(9, 11));
        assert_eq!(row.games[2], GameScore::unplayed());
    }

    #[test]
    fn test_odd_trailing_cell() {
        let cells = vec![json!("alice"), json!("bob"), json!(11), json!(3), json!(11)];
        let row = parse_row(&cells, 0).unwrap().unwrap();
        assert_eq!(
            row.games[1],
            GameScore {
                player1: Some(11),
                player2: None
            }
        );
    }

    #[test]
    fn test_filler_rows() {
        assert!(parse_row(&[], 0).unwrap().is_none());
        assert!(parse_row(&[json!("alice")], 0).unwrap().is_none());
        assert!(parse_row(&[json!(""), json!("bob")], 0).unwrap().is_none());
        assert!(parse_row(&[json!("alice"), json!(null)], 0)
            .unwrap()
            .is_none());
    }

    #[test]
    fn test_invalid_scores() {
        let bad = [json!("eleven"), json!(-3), json!(10.5), json!(true)];
        for cell in bad {
            let cells = vec![json!("alice"), json!("bob"), cell, json!(5)];
            let err = parse_row(&cells, 4).unwrap_err();
            match err {
                LeagueError::InvalidScoreFeed { reason } => assert!(reason.starts_with("row 5")),
                other => panic!("unexpected error: {:?}", other),
            }
        }
    }

    #[test]
    fn test_parse_session() {
        let text = r#"{
            "date": "2024-03-14",
            "divisions": [["alice", "bob", ""], [" carol ", "dan"]],
            "rows": [
                ["alice", "bob", 11, 5, 11, 7, 11, 9],
                ["", ""],
                ["carol", "dan", 11, 5, 5, 11]
            ]
        }"#;
        let session = parse_session(text).unwrap();

        assert_eq!(session.date, NaiveDate::from_ymd_opt(2024, 3, 14).unwrap());
        assert_eq!(session.rows.len(), 2);
        assert_eq!(session.divisions.len(), 2);
        assert_eq!(session.divisions[1].number, 2);
        assert_eq!(session.divisions[1].players[0], "carol");
        assert_eq!(session.roster().len(), 4);
    }

    #[test]
    fn test_malformed_session() {
        assert!(parse_session("{}").is_err());
        assert!(parse_session(r#"{"date": "14/03/2024"}"#).is_err());
        assert!(parse_session("not json").is_err());
    }

    #[tokio::test]
    async fn test_json_feed_reads_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");
        std::fs::write(
            &path,
            r#"{"date": "2024-03-14", "rows": [["alice", "bob", 11, 5]]}"#,
        )
        .unwrap();

        let session = JsonSessionFeed::new(&path).load_session().await.unwrap();
        assert_eq!(session.rows.len(), 1);
        assert!(session.divisions.is_empty());
    }

    #[tokio::test]
    async fn test_json_feed_missing_file() {
        let feed = JsonSessionFeed::new("/nonexistent/session.json");
        assert!(feed.load_session().await.is_err());
    }

    #[test]
    fn test_parse_authoritative() {
        let ratings = parse_authoritative(
            r#"[{"name": " alice ", "rating": 1210.5}, {"name": "", "rating": 1}, {"name": "bob", "rating": 990}]"#,
        )
        .unwrap();
        assert_eq!(
            ratings,
            vec![
                AuthoritativeRating { name: "alice".to_string(), rating: 1210.5 },
                AuthoritativeRating { name: "bob".to_string(), rating: 990.0 },
            ]
        );

        assert!(matches!(
            parse_authoritative(r#"[{"name": "x"}]"#),
            Err(LeagueError::InvalidScoreFeed { .. })
        ));
    }
}
