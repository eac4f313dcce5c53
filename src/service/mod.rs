//! Service layer for the league tools
//!
//! This module contains the workflows driven by the command line: applying a
//! new league session, syncing from authoritative ratings and showing ratings.

pub mod league;

pub use league::{LeagueService, NewLeagueOptions, NewLeagueReport, RunStatus, SyncReport};
