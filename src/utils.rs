//! Utility functions for the league rating tools

use anyhow::{anyhow, Result};
use chrono::{Local, NaiveDate};

/// Date format used on the command line and in session files
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Parse a `yyyy-mm-dd` date
pub fn parse_date(value: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), DATE_FORMAT)
        .map_err(|_| anyhow!("Date must be in the format of yyyy-mm-dd: {}", value))
}

/// Today's date in local time
pub fn today() -> NaiveDate {
    Local::now().date_naive()
}

/// Round a rating value to two decimals for display
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Calculate the signed difference between two ratings
pub fn rating_gap(rating1: f64, rating2: f64) -> f64 {
    rating1 - rating2
}

/// Mean of the given ratings, 0 when empty
pub fn average(ratings: &[f64]) -> f64 {
    if ratings.is_empty() {
        return 0.0;
    }
    ratings.iter().sum::<f64>() / ratings.len() as f64
}
