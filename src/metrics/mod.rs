//! Metrics for the league rating tools
//!
//! This module provides Prometheus counters for the rating engine. They are
//! dumped in text format after a run when a metrics path is configured.

pub mod collector;

pub use collector::{EngineMetrics, MetricsTimer};
