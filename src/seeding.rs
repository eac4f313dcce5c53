//! Operator interaction: roster confirmation and seeding of new players
//!
//! Players that appear in a session without a rating must be given an
//! initial rating before the session can be applied. The console either
//! asks an operator on a terminal or answers from a prepared seeds file.

use crate::error::{LeagueError, Result};
use crate::rating::RatingsSnapshot;
use crate::types::{LeagueSession, PlayerName};
use crate::utils::round2;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::io::{BufRead, Write};
use tracing::info;

/// What the operator is asked when seeding a player
#[derive(Debug, Clone, PartialEq)]
pub struct SeedRequest {
    pub name: PlayerName,
    /// Division the player is listed in, if any
    pub division: Option<usize>,
    /// Average current rating of the division, as a hint
    pub division_average: f64,
}

/// Initial rating and contact for a new player
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeedEntry {
    pub rating: f64,
    #[serde(default)]
    pub email: Option<String>,
}

/// Operator-facing interaction used by the workflows
pub trait Console {
    /// Ask a yes/no question; only an explicit yes confirms
    fn confirm(&mut self, question: &str) -> Result<bool>;

    /// Initial rating for a player without one
    fn seed_rating(&mut self, request: &SeedRequest) -> Result<f64>;

    /// Contact email for a new player
    fn email(&mut self, name: &str) -> Result<String>;

    /// Show a line of output to the operator
    fn report(&mut self, line: &str) -> Result<()>;
}

/// Interactive console over any reader/writer pair
pub struct TerminalConsole<R, W> {
    reader: R,
    writer: W,
}

impl TerminalConsole<std::io::StdinLock<'static>, std::io::Stdout> {
    /// Console on the process's stdin/stdout
    pub fn stdio() -> Self {
        Self::new(std::io::stdin().lock(), std::io::stdout())
    }
}

impl<R: BufRead, W: Write> TerminalConsole<R, W> {
    pub fn new(reader: R, writer: W) -> Self {
        Self { reader, writer }
    }

    /// Writer half (for testing)
    pub fn writer(&self) -> &W {
        &self.writer
    }

    fn ask(&mut self, prompt: &str) -> Result<String> {
        write!(self.writer, "{}", prompt)?;
        self.writer.flush()?;

        let mut line = String::new();
        if self.reader.read_line(&mut line)? == 0 {
            return Err(LeagueError::Aborted {
                reason: "input closed".to_string(),
            }
            .into());
        }
        Ok(line.trim().to_string())
    }
}

impl<R: BufRead, W: Write> Console for TerminalConsole<R, W> {
    fn confirm(&mut self, question: &str) -> Result<bool> {
        let answer = self.ask(&format!("{} [y/N] ", question))?;
        Ok(answer.eq_ignore_ascii_case("y"))
    }

    fn seed_rating(&mut self, request: &SeedRequest) -> Result<f64> {
        let prompt = match request.division {
            Some(division) => format!(
                "Missing rating for \"{}\", average rating for division {} is {:.2}. Please enter initial rating: ",
                request.name,
                division,
                round2(request.division_average)
            ),
            None => format!(
                "Missing rating for \"{}\". Please enter initial rating: ",
                request.name
            ),
        };

        loop {
            let answer = self.ask(&prompt)?;
            match answer.parse::<f64>() {
                Ok(rating) if rating.is_finite() => return Ok(rating),
                _ => writeln!(self.writer, "Rating must be a number, please try again.")?,
            }
        }
    }

    fn email(&mut self, name: &str) -> Result<String> {
        let answer = self.ask(&format!("Please enter an email address for \"{}\": ", name))?;
        Ok(answer.to_lowercase())
    }

    fn report(&mut self, line: &str) -> Result<()> {
        writeln!(self.writer, "{}", line)?;
        Ok(())
    }
}

/// Non-interactive console answering from prepared data
#[derive(Debug, Default)]
pub struct ScriptedConsole {
    confirm_all: bool,
    echo: bool,
    seeds: HashMap<PlayerName, SeedEntry>,
    lines: Vec<String>,
}

impl ScriptedConsole {
    /// Console that answers every confirmation with `confirm_all`
    pub fn new(confirm_all: bool) -> Self {
        Self {
            confirm_all,
            ..Self::default()
        }
    }

    pub fn with_seeds(mut self, seeds: HashMap<PlayerName, SeedEntry>) -> Self {
        self.seeds = seeds;
        self
    }

    /// Also print every line to stdout as it is reported
    pub fn with_echo(mut self) -> Self {
        self.echo = true;
        self
    }

    /// Everything reported so far (for testing)
    pub fn lines(&self) -> &[String] {
        &self.lines
    }
}

impl Console for ScriptedConsole {
    fn confirm(&mut self, question: &str) -> Result<bool> {
        let line = format!(
            "{} [y/N] {}",
            question,
            if self.confirm_all { "y" } else { "n" }
        );
        self.report(&line)?;
        Ok(self.confirm_all)
    }

    fn seed_rating(&mut self, request: &SeedRequest) -> Result<f64> {
        self.seeds
            .get(&request.name)
            .map(|seed| seed.rating)
            .ok_or_else(|| {
                LeagueError::MissingRating {
                    name: request.name.clone(),
                }
                .into()
            })
    }

    fn email(&mut self, name: &str) -> Result<String> {
        Ok(self
            .seeds
            .get(name)
            .and_then(|seed| seed.email.clone())
            .map(|email| email.trim().to_lowercase())
            .unwrap_or_default())
    }

    fn report(&mut self, line: &str) -> Result<()> {
        if self.echo {
            println!("{}", line);
        }
        self.lines.push(line.to_string());
        Ok(())
    }
}

/// Parse a seeds file: `{ "name": { "rating": 1000, "email": "..." } }`
pub fn parse_seeds(text: &str) -> Result<HashMap<PlayerName, SeedEntry>> {
    let seeds: HashMap<PlayerName, SeedEntry> = serde_json::from_str(text)?;
    for (name, seed) in &seeds {
        if !seed.rating.is_finite() {
            return Err(LeagueError::NonFiniteRating {
                name: name.clone(),
                value: seed.rating,
            }
            .into());
        }
    }
    Ok(seeds)
}

/// Seed every session player missing from `snapshot`.
///
/// Hints are computed from the ratings known before any seeding. Returns the
/// names that were seeded, in roster order.
pub fn seed_missing_players(
    session: &LeagueSession,
    snapshot: &mut RatingsSnapshot,
    console: &mut dyn Console,
) -> Result<Vec<PlayerName>> {
    let involved = session.involved_players();
    let missing = snapshot.unresolved(&involved);

    let requests: Vec<SeedRequest> = missing
        .iter()
        .map(|name| {
            let division = session.division_of(name);
            SeedRequest {
                name: name.clone(),
                division: division.map(|d| d.number),
                division_average: division
                    .map(|d| snapshot.average_rating(d.named_players()))
                    .unwrap_or(0.0),
            }
        })
        .collect();

    for request in &requests {
        let rating = console.seed_rating(request)?;
        let email = console.email(&request.name)?;
        let email = (!email.is_empty()).then_some(email);
        snapshot.seed_player(request.name.clone(), rating, email)?;
        info!("Seeded {} with initial rating {:.2}", request.name, rating);
    }

    Ok(missing)
}
