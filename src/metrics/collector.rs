//! Metrics collection using Prometheus
//!
//! Counters cover the rating engine's work per run: matches processed and
//! skipped, sessions applied and the size of the rating changes handed out.

use crate::rating::SessionOutcome;
use anyhow::Result;
use prometheus::{
    Encoder, Histogram, HistogramOpts, IntCounter, IntCounterVec, IntGauge, Opts, Registry,
    TextEncoder,
};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Metrics collector for the league rating tools
#[derive(Clone)]
pub struct EngineMetrics {
    registry: Arc<Registry>,

    /// Matches that produced rating deltas
    pub matches_processed_total: IntCounter,

    /// Matches that contributed nothing, by reason
    pub matches_skipped_total: IntCounterVec,

    /// Sessions applied, by mode (session / authoritative)
    pub sessions_applied_total: IntCounterVec,

    /// Absolute per-match rating change
    pub rating_delta_magnitude: Histogram,

    /// Players in the last saved snapshot
    pub players_rated: IntGauge,

    /// Time spent applying a session
    pub session_duration: Histogram,
}

impl EngineMetrics {
    /// Create a new collector with its own registry
    pub fn new() -> Result<Self> {
        Self::with_registry(Arc::new(Registry::new()))
    }

    /// Create a new collector with a custom registry
    pub fn with_registry(registry: Arc<Registry>) -> Result<Self> {
        let matches_processed_total = IntCounter::new(
            "tt_league_matches_processed_total",
            "Matches that produced rating deltas",
        )?;
        registry.register(Box::new(matches_processed_total.clone()))?;

        let matches_skipped_total = IntCounterVec::new(
            Opts::new(
                "tt_league_matches_skipped_total",
                "Matches that contributed no rating change",
            ),
            &["reason"],
        )?;
        registry.register(Box::new(matches_skipped_total.clone()))?;

        let sessions_applied_total = IntCounterVec::new(
            Opts::new("tt_league_sessions_applied_total", "Sessions applied"),
            &["mode"],
        )?;
        registry.register(Box::new(sessions_applied_total.clone()))?;

        let rating_delta_magnitude = Histogram::with_opts(
            HistogramOpts::new(
                "tt_league_rating_delta_magnitude",
                "Absolute rating change per match",
            )
            .buckets(vec![2.0, 5.0, 10.0, 20.0, 40.0, 60.0, 80.0, 100.0, 120.0]),
        )?;
        registry.register(Box::new(rating_delta_magnitude.clone()))?;

        let players_rated = IntGauge::new(
            "tt_league_players_rated",
            "Players in the last saved snapshot",
        )?;
        registry.register(Box::new(players_rated.clone()))?;

        let session_duration = Histogram::with_opts(
            HistogramOpts::new(
                "tt_league_session_duration_seconds",
                "Time spent applying a session",
            )
            .buckets(vec![0.0001, 0.001, 0.01, 0.1, 1.0]),
        )?;
        registry.register(Box::new(session_duration.clone()))?;

        Ok(Self {
            registry,
            matches_processed_total,
            matches_skipped_total,
            sessions_applied_total,
            rating_delta_magnitude,
            players_rated,
            session_duration,
        })
    }

    /// Get the Prometheus registry
    pub fn registry(&self) -> Arc<Registry> {
        self.registry.clone()
    }

    /// Record the result of applying a session
    pub fn record_session(&self, outcome: &SessionOutcome, duration: Duration) {
        self.matches_processed_total
            .inc_by(outcome.matches.len() as u64);

        for result in &outcome.matches {
            self.rating_delta_magnitude.observe(result.delta1.abs());
        }

        if !outcome.empty_matches.is_empty() {
            self.matches_skipped_total
                .with_label_values(&["empty"])
                .inc_by(outcome.empty_matches.len() as u64);
        }
        for skipped in &outcome.skipped {
            self.matches_skipped_total
                .with_label_values(&[skipped.error.kind()])
                .inc();
        }

        self.sessions_applied_total
            .with_label_values(&["session"])
            .inc();
        self.session_duration.observe(duration.as_secs_f64());
        self.players_rated.set(outcome.snapshot.len() as i64);
    }

    /// Record an authoritative overwrite
    pub fn record_overwrite(&self, players: usize) {
        self.sessions_applied_total
            .with_label_values(&["authoritative"])
            .inc();
        self.players_rated.set(players as i64);
    }

    /// Create a timer for measuring operation duration
    pub fn start_timer(&self) -> MetricsTimer {
        MetricsTimer::new()
    }

    /// Render all metrics in the Prometheus text format
    pub fn render(&self) -> Result<String> {
        let mut buffer = Vec::new();
        TextEncoder::new().encode(&self.registry.gather(), &mut buffer)?;
        Ok(String::from_utf8(buffer)?)
    }
}

/// Timer for measuring operation durations
pub struct MetricsTimer {
    start: Instant,
}

impl MetricsTimer {
    fn new() -> Self {
        Self {
            start: Instant::now(),
        }
    }

    /// Stop the timer and return the duration
    pub fn stop(self) -> Duration {
        self.start.elapsed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rating::{LeagueBatchUpdater, RatingsSnapshot};
    use crate::types::{LeagueSession, MatchRow, PlayerRecord};
    use chrono::NaiveDate;

    #[test]
    fn test_record_session() {
        let day = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let snapshot = RatingsSnapshot::new(vec![
            PlayerRecord::new("alice", 1000.0, day),
            PlayerRecord::new("bob", 1000.0, day),
        ])
        .unwrap();
        let session = LeagueSession {
            date: NaiveDate::from_ymd_opt(2024, 2, 1).unwrap(),
            rows: vec![
                MatchRow::from_scores("alice", "bob", &[(11, 3), (11, 3), (11, 3)]),
                MatchRow::from_scores("alice", "carol", &[(11, 3)]),
                MatchRow::new("alice", "bob", vec![]),
            ],
            divisions: vec![],
        };
        let outcome = LeagueBatchUpdater::default().apply_session(&snapshot, &session);

        let metrics = EngineMetrics::new().unwrap();
        metrics.record_session(&outcome, Duration::from_millis(1));

        assert_eq!(metrics.matches_processed_total.get(), 1);
        assert_eq!(
            metrics
                .matches_skipped_total
                .with_label_values(&["missing_rating"])
                .get(),
            1
        );
        assert_eq!(
            metrics
                .matches_skipped_total
                .with_label_values(&["empty"])
                .get(),
            1
        );
        assert_eq!(metrics.players_rated.get(), 2);
    }

    #[test]
    fn test_render_text_format() {
        let metrics = EngineMetrics::new().unwrap();
        metrics.record_overwrite(12);

        let text = metrics.render().unwrap();
        assert!(text.contains("tt_league_sessions_applied_total{mode=\"authoritative\"} 1"));
        assert!(text.contains("tt_league_players_rated 12"));
    }

    #[test]
    fn test_metrics_timer() {
        let metrics = EngineMetrics::new().unwrap();
        let timer = metrics.start_timer();
        std::thread::sleep(Duration::from_millis(5));
        assert!(timer.stop() >= Duration::from_millis(5));
    }
}
