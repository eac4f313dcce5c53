//! League workflows
//!
//! `LeagueService` ties the engine to its collaborators: a score feed, a
//! ratings store and an operator console. Nothing is written to the store
//! unless the caller asked for execution and the operator confirmed it.

use crate::config::AppConfig;
use crate::error::{LeagueError, Result};
use crate::feed::ScoreFeed;
use crate::metrics::EngineMetrics;
use crate::rating::{delta_summary, DeltaSummary, LeagueBatchUpdater, RatingsSnapshot, SessionOutcome};
use crate::seeding::{seed_missing_players, Console};
use crate::store::{ensure_not_processed, RatingsStore};
use crate::types::{AuthoritativeRating, LeagueSession, PlayerName, RankedPlayer};
use chrono::NaiveDate;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Flags for the new-league workflow
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NewLeagueOptions {
    /// Save the result (after confirmation) instead of a dry run
    pub execute: bool,
    /// Report the per-match summary lines
    pub print_out: bool,
    /// Refuse a session whose date differs from this one
    pub expected_date: Option<NaiveDate>,
}

/// How a workflow run ended
#[derive(Debug, Clone, PartialEq)]
pub enum RunStatus {
    /// The session had no match rows
    NoMatches,
    /// The operator answered no to a confirmation
    Declined,
    /// Computed but not saved
    DryRun,
    /// Saved, with the backup location if the store made one
    Saved { backup: Option<PathBuf> },
}

/// Result of the new-league workflow
#[derive(Debug, Clone)]
pub struct NewLeagueReport {
    pub date: NaiveDate,
    pub status: RunStatus,
    /// Players seeded before the session was applied
    pub seeded: Vec<PlayerName>,
    pub outcome: Option<SessionOutcome>,
    pub summaries: Vec<DeltaSummary>,
    /// Ranked ratings after the session, active as of the session date
    pub ranking: Vec<RankedPlayer>,
}

/// Result of an authoritative sync
#[derive(Debug, Clone)]
pub struct SyncReport {
    pub status: RunStatus,
    pub snapshot: RatingsSnapshot,
    pub summaries: Vec<DeltaSummary>,
    /// Ranked ratings after the overwrite, active as of the sync date
    pub ranking: Vec<RankedPlayer>,
}

/// Runs league workflows against a ratings store
pub struct LeagueService {
    config: AppConfig,
    store: Arc<dyn RatingsStore>,
    metrics: EngineMetrics,
    updater: LeagueBatchUpdater,
}

impl LeagueService {
    pub fn new(config: AppConfig, store: Arc<dyn RatingsStore>) -> Result<Self> {
        Ok(Self::with_metrics(config, store, EngineMetrics::new()?))
    }

    pub fn with_metrics(
        config: AppConfig,
        store: Arc<dyn RatingsStore>,
        metrics: EngineMetrics,
    ) -> Self {
        let updater = LeagueBatchUpdater::with_table(config.league.table_version);
        Self {
            config,
            store,
            metrics,
            updater,
        }
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn metrics(&self) -> &EngineMetrics {
        &self.metrics
    }

    /// Process one league session from a score feed
    pub async fn new_league(
        &self,
        feed: &dyn ScoreFeed,
        console: &mut dyn Console,
        options: NewLeagueOptions,
    ) -> Result<NewLeagueReport> {
        let session = feed.load_session().await?;
        if let Some(expected) = options.expected_date.filter(|d| *d != session.date) {
            return Err(LeagueError::InvalidScoreFeed {
                reason: format!("session is dated {}, expected {}", session.date, expected),
            }
            .into());
        }
        let mut report = NewLeagueReport {
            date: session.date,
            status: RunStatus::NoMatches,
            seeded: Vec::new(),
            outcome: None,
            summaries: Vec::new(),
            ranking: Vec::new(),
        };

        if session.rows.is_empty() {
            console.report(&format!("No matches found for {}", session.date))?;
            return Ok(report);
        }

        let mut snapshot = self.store.load().await?;
        ensure_not_processed(&snapshot, session.date)?;

        for division in &session.divisions {
            let names: Vec<&str> = division.named_players().collect();
            console.report(&format!("Division {}: {}", division.number, names.join(", ")))?;
        }
        if !console.confirm("Are these divisions correct?")? {
            info!("Divisions for {} rejected by operator", session.date);
            report.status = RunStatus::Declined;
            return Ok(report);
        }

        report.seeded = seed_missing_players(&session, &mut snapshot, console)?;

        let timer = self.metrics.start_timer();
        let outcome = self.updater.apply_session(&snapshot, &session);
        self.metrics.record_session(&outcome, timer.stop());

        if options.print_out {
            for result in &outcome.matches {
                for line in result.summary_lines() {
                    console.report(&line)?;
                }
            }
        }
        for skipped in &outcome.skipped {
            console.report(&format!(
                "Skipped match {} ({} vs {}): {}",
                skipped.index + 1,
                skipped.player1,
                skipped.player2,
                skipped.error
            ))?;
        }
        for name in &outcome.already_processed {
            console.report(&format!(
                "{} already has results on or after {}, rating left unchanged",
                name, session.date
            ))?;
        }

        report_division_changes(console, &session, &snapshot, &outcome)?;

        report.summaries = delta_summary(&snapshot, &outcome.snapshot);
        report.ranking = outcome
            .snapshot
            .ranking(session.date, self.config.league.active_days);
        report_results(console, session.date, &report.ranking, &report.summaries)?;

        report.status = self
            .persist(console, &outcome.snapshot, session.date, options.execute)
            .await?;
        report.outcome = Some(outcome);
        Ok(report)
    }

    /// Overwrite ratings from an authoritative list
    pub async fn sync(
        &self,
        ratings: &[AuthoritativeRating],
        date: NaiveDate,
        console: &mut dyn Console,
        execute: bool,
    ) -> Result<SyncReport> {
        let snapshot = self.store.load().await?;
        let updated = self
            .updater
            .overwrite_from_authoritative(&snapshot, ratings, date)?;
        self.metrics.record_overwrite(updated.len());

        for entry in ratings {
            let active = updated
                .get(&entry.name)
                .map(|p| p.is_active(date, self.config.league.active_days))
                .unwrap_or(false);
            let status = if active { "active" } else { "inactive" };
            let line = match snapshot.get(&entry.name) {
                Some(old) => format!(
                    "{}: {:.2} => {:.2} ({})",
                    entry.name, old.rating, entry.rating, status
                ),
                None => format!("{}: new player => {:.2} ({})", entry.name, entry.rating, status),
            };
            console.report(&line)?;
        }

        let summaries = delta_summary(&snapshot, &updated);
        let ranking = updated.ranking(date, self.config.league.active_days);
        report_results(console, date, &ranking, &summaries)?;

        let status = self.persist(console, &updated, date, execute).await?;

        Ok(SyncReport {
            status,
            snapshot: updated,
            summaries,
            ranking,
        })
    }

    /// Report stored ratings for `names`, or every player when a name is `all`.
    ///
    /// With `current` only the latest rating and active flag are shown,
    /// otherwise the full history, latest first.
    pub async fn show(
        &self,
        names: &[String],
        current: bool,
        as_of: NaiveDate,
        console: &mut dyn Console,
    ) -> Result<()> {
        let snapshot = self.store.load().await?;
        let active_days = self.config.league.active_days;

        if names.iter().any(|n| n.eq_ignore_ascii_case("all")) {
            if current {
                for ranked in snapshot.ranking(as_of, active_days) {
                    console.report(&ranking_line(&ranked))?;
                }
                return Ok(());
            }
            let all: Vec<String> = snapshot.players().iter().map(|p| p.name.clone()).collect();
            return self.show_history(&snapshot, &all, console);
        }

        if !current {
            return self.show_history(&snapshot, names, console);
        }

        for name in names {
            match snapshot.get(name) {
                Some(player) => console.report(&format!(
                    "{}: {:.2} ({})",
                    player.name,
                    player.rating,
                    if player.is_active(as_of, active_days) {
                        "active"
                    } else {
                        "inactive"
                    }
                ))?,
                None => console.report(&format!("No ratings found for {}", name))?,
            }
        }
        Ok(())
    }

    fn show_history(
        &self,
        snapshot: &RatingsSnapshot,
        names: &[String],
        console: &mut dyn Console,
    ) -> Result<()> {
        for name in names {
            let Some(player) = snapshot.get(name) else {
                console.report(&format!("No ratings found for {}", name))?;
                continue;
            };
            console.report(&format!("{}:", player.name))?;
            for point in player.history.iter().rev() {
                console.report(&format!(
                    "  {}  {:.2}",
                    point.date.format(crate::utils::DATE_FORMAT),
                    point.rating
                ))?;
            }
        }
        Ok(())
    }

    /// Write the metrics text dump if a path is configured
    pub async fn write_metrics(&self) -> Result<()> {
        if let Some(path) = &self.config.storage.metrics_path {
            tokio::fs::write(path, self.metrics.render()?).await?;
            debug!("Wrote metrics to {}", path.display());
        }
        Ok(())
    }

    async fn persist(
        &self,
        console: &mut dyn Console,
        snapshot: &RatingsSnapshot,
        date: NaiveDate,
        execute: bool,
    ) -> Result<RunStatus> {
        if !execute {
            console.report("Dry run, ratings not saved. Re-run with --execute to save.")?;
            return Ok(RunStatus::DryRun);
        }
        if !console.confirm("Save updated ratings?")? {
            warn!("Save for {} declined by operator", date);
            return Ok(RunStatus::Declined);
        }

        let backup = self.store.backup(date).await?;
        self.store.save(snapshot).await.map_err(|e| {
            anyhow::Error::from(LeagueError::Storage {
                message: format!("failed to save ratings for {}: {}", date, e),
            })
        })?;
        console.report(&format!("Saved ratings for {}", date))?;
        info!("Saved {} players for {}", snapshot.len(), date);
        Ok(RunStatus::Saved { backup })
    }
}

/// `name: old => +delta => new` for every changed player, grouped by division
fn report_division_changes(
    console: &mut dyn Console,
    session: &LeagueSession,
    before: &RatingsSnapshot,
    outcome: &SessionOutcome,
) -> Result<()> {
    let mut reported: Vec<&str> = Vec::new();

    for division in &session.divisions {
        console.report(&format!("Division {}", division.number))?;
        for name in division.named_players() {
            if let Some(line) = change_line(before, outcome, name) {
                console.report(&line)?;
                reported.push(name);
            }
        }
    }

    let others: Vec<&str> = outcome
        .totals
        .iter()
        .map(|d| d.player.as_str())
        .filter(|name| !reported.contains(name))
        .collect();
    if !others.is_empty() {
        console.report("Not in a division")?;
        for line in others
            .into_iter()
            .filter_map(|name| change_line(before, outcome, name))
        {
            console.report(&line)?;
        }
    }
    Ok(())
}

fn change_line(before: &RatingsSnapshot, outcome: &SessionOutcome, name: &str) -> Option<String> {
    if !outcome.totals.iter().any(|d| d.player == name)
        || outcome.already_processed.iter().any(|n| n == name)
    {
        return None;
    }
    let old = before.get(name)?;
    let new = outcome.snapshot.get(name)?;
    Some(format!(
        "{}: {:.2} => {:+.2} => {:.2}",
        name,
        old.rating,
        outcome.applied_for(name),
        new.rating
    ))
}

/// `rank. name rating status` row of a ranked export
fn ranking_line(ranked: &RankedPlayer) -> String {
    format!(
        "{:>4}. {:<30} {:>8.2}  {}",
        ranked.rank,
        ranked.name,
        ranked.rating,
        if ranked.active { "active" } else { "inactive" }
    )
}

/// Ranked export followed by the increased/decreased summaries
fn report_results(
    console: &mut dyn Console,
    date: NaiveDate,
    ranking: &[RankedPlayer],
    summaries: &[DeltaSummary],
) -> Result<()> {
    console.report(&format!("Ratings as of {}", date))?;
    for ranked in ranking {
        console.report(&ranking_line(ranked))?;
    }
    for summary in summaries {
        debug!("{}", summary);
        console.report(&summary.to_string())?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feed::StaticScoreFeed;
    use crate::seeding::ScriptedConsole;
    use crate::store::InMemoryStore;
    use crate::types::{Division, MatchRow, PlayerRecord};

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn store() -> Arc<InMemoryStore> {
        Arc::new(InMemoryStore::new(
            RatingsSnapshot::new(vec![
                PlayerRecord::new("alice", 1000.0, date("2024-01-01")),
                PlayerRecord::new("bob", 1000.0, date("2024-01-01")),
            ])
            .unwrap(),
        ))
    }

    fn feed() -> StaticScoreFeed {
        StaticScoreFeed::new(LeagueSession {
            date: date("2024-02-01"),
            rows: vec![MatchRow::from_scores(
                "alice",
                "bob",
                &[(11, 5), (11, 7), (11, 9)],
            )],
            divisions: vec![Division {
                number: 1,
                players: vec!["alice".to_string(), "bob".to_string()],
            }],
        })
    }

    #[tokio::test]
    async fn test_dry_run_does_not_save() {
        let store = store();
        let service = LeagueService::new(AppConfig::default(), store.clone()).unwrap();
        let mut console = ScriptedConsole::new(true);

        let report = service
            .new_league(&feed(), &mut console, NewLeagueOptions::default())
            .await
            .unwrap();

        assert_eq!(report.status, RunStatus::DryRun);
        assert_eq!(store.load().await.unwrap().rating("alice").unwrap(), 1000.0);
        assert!(console
            .lines()
            .iter()
            .any(|l| l == "alice: 1000.00 => +10.00 => 1010.00"));
    }

    #[tokio::test]
    async fn test_execute_saves_after_backup() {
        let store = store();
        let service = LeagueService::new(AppConfig::default(), store.clone()).unwrap();
        let mut console = ScriptedConsole::new(true);
        let options = NewLeagueOptions {
            execute: true,
            print_out: true,
            expected_date: Some(date("2024-02-01")),
        };

        let report = service.new_league(&feed(), &mut console, options).await.unwrap();

        assert_eq!(report.status, RunStatus::Saved { backup: None });
        let saved = store.load().await.unwrap();
        assert_eq!(saved.rating("alice").unwrap(), 1010.0);
        assert_eq!(saved.rating("bob").unwrap(), 990.0);
        assert_eq!(store.backups().await.len(), 1);
        assert_eq!(service.metrics().matches_processed_total.get(), 1);
        assert_eq!(
            report.summaries.iter().map(|s| s.to_string()).collect::<Vec<_>>(),
            vec!["alice increased by 10.00", "bob decreased by 10.00"]
        );
        assert_eq!(report.ranking.len(), 2);
        assert_eq!(report.ranking[0].name, "alice");
        assert!(report.ranking[0].active);

        let lines = console.lines();
        let header = lines
            .iter()
            .position(|l| l == "Ratings as of 2024-02-01")
            .unwrap();
        assert_eq!(lines[header + 1], ranking_line(&report.ranking[0]));
        assert!(lines[header + 1].ends_with("1010.00  active"));
        assert_eq!(lines[header + 3], "alice increased by 10.00");
        assert_eq!(lines[header + 4], "bob decreased by 10.00");
    }

    #[tokio::test]
    async fn test_sync_reports_ranking_and_summaries() {
        let service = LeagueService::new(AppConfig::default(), store()).unwrap();
        let mut console = ScriptedConsole::new(true);
        let ratings = vec![AuthoritativeRating {
            name: "bob".to_string(),
            rating: 1050.0,
        }];

        let report = service
            .sync(&ratings, date("2024-02-01"), &mut console, false)
            .await
            .unwrap();

        assert_eq!(report.status, RunStatus::DryRun);
        assert_eq!(report.ranking[0].name, "bob");
        assert_eq!(report.ranking[0].rank, 1);
        assert!(console.lines().iter().any(|l| l == "bob increased by 50.00"));
        assert!(console
            .lines()
            .iter()
            .any(|l| l == &ranking_line(&report.ranking[1])));
    }

    #[tokio::test]
    async fn test_declined_divisions_stop_workflow() {
        let store = store();
        let service = LeagueService::new(AppConfig::default(), store.clone()).unwrap();
        let mut console = ScriptedConsole::new(false);
        let options = NewLeagueOptions {
            execute: true,
            ..NewLeagueOptions::default()
        };

        let report = service.new_league(&feed(), &mut console, options).await.unwrap();
        assert_eq!(report.status, RunStatus::Declined);
        assert!(report.outcome.is_none());
        assert!(store.backups().await.is_empty());
    }

    #[tokio::test]
    async fn test_processed_session_is_refused() {
        let service = LeagueService::new(AppConfig::default(), store()).unwrap();
        let mut console = ScriptedConsole::new(true);
        let stale = StaticScoreFeed::new(LeagueSession {
            date: date("2024-01-01"),
            rows: vec![MatchRow::from_scores("alice", "bob", &[(11, 5)])],
            divisions: vec![],
        });

        let err = service
            .new_league(&stale, &mut console, NewLeagueOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<LeagueError>(),
            Some(LeagueError::AlreadyProcessed { .. })
        ));
    }

    #[tokio::test]
    async fn test_session_date_must_match() {
        let service = LeagueService::new(AppConfig::default(), store()).unwrap();
        let mut console = ScriptedConsole::new(true);
        let options = NewLeagueOptions {
            expected_date: Some(date("2024-02-08")),
            ..NewLeagueOptions::default()
        };

        let err = service
            .new_league(&feed(), &mut console, options)
            .await
            .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<LeagueError>(),
            Some(LeagueError::InvalidScoreFeed { .. })
        ));
    }

    #[tokio::test]
    async fn test_show_current_and_history() {
        let service = LeagueService::new(AppConfig::default(), store()).unwrap();
        let mut console = ScriptedConsole::new(true);

        service
            .show(
                &["alice".to_string(), "zed".to_string()],
                true,
                date("2024-02-15"),
                &mut console,
            )
            .await
            .unwrap();
        assert_eq!(
            console.lines(),
            &["alice: 1000.00 (active)", "No ratings found for zed"]
        );

        let mut console = ScriptedConsole::new(true);
        service
            .show(&["all".to_string()], false, date("2024-02-15"), &mut console)
            .await
            .unwrap();
        assert_eq!(console.lines()[0], "alice:");
        assert_eq!(console.lines()[1], "  2024-01-01  1000.00");
    }

    #[tokio::test]
    async fn test_write_metrics_dump() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = AppConfig::default();
        config.storage.metrics_path = Some(dir.path().join("metrics.prom"));
        let service = LeagueService::new(config, store()).unwrap();

        service.write_metrics().await.unwrap();
        let text = std::fs::read_to_string(dir.path().join("metrics.prom")).unwrap();
        assert!(text.contains("tt_league_matches_processed_total 0"));
    }
}
