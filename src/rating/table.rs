//! Static rating lookup tables
//!
//! Rating changes are read from two 33x3 tables indexed by a rating-gap
//! bucket and a margin class. The tables are versioned data: any change to a
//! value changes every future rating outcome, so each version is kept as an
//! immutable constant and never recomputed.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Upper bounds (inclusive) of the first 32 rating-gap buckets
pub const THRESHOLDS: [f64; 32] = [
    14.0, 27.75, 41.25, 54.5, 67.5, 80.25, 92.75, 105.0, 117.0, 128.75, 140.25, 151.5, 162.5,
    173.25, 183.75, 194.0, 204.0, 213.75, 223.25, 232.5, 241.5, 250.25, 258.75, 267.0, 275.0,
    282.75, 290.25, 297.5, 304.5, 311.25, 317.75, 324.0,
];

/// Number of buckets: one per threshold plus the clamp bucket
pub const BUCKET_COUNT: usize = THRESHOLDS.len() + 1;

/// Number of margin classes in a best-of-five (3-2, 3-1, 3-0)
pub const MARGIN_CLASSES: usize = 3;

type Table = [[f64; MARGIN_CLASSES]; BUCKET_COUNT];

// Standard rows 0..=10 are the league's published values. Rows 11..=31 are
// derived, not historical: expected row k is [-22-3j, -11-2j, -j] with
// j = k - 10, and unexpected rows run linearly from row 10 to [96, 106, 116]
// at row 31, rounded to the nearest quarter point. The last two rows are
// equal: a gap of exactly 324 rates the same as any larger gap.
const STANDARD_EXPECTED: Table = [
    [6.0, 8.0, 10.0],
    [5.0, 7.0, 9.0],
    [2.0, 5.0, 8.0],
    [-1.0, 3.0, 7.0],
    [-4.0, 1.0, 6.0],
    [-7.0, -1.0, 5.0],
    [-10.0, -4.0, 4.0],
    [-13.0, -5.0, 3.0],
    [-16.0, -7.0, 2.0],
    [-19.0, -9.0, 1.0],
    [-22.0, -11.0, 0.0],
    [-25.0, -13.0, -1.0],
    [-28.0, -15.0, -2.0],
    [-31.0, -17.0, -3.0],
    [-34.0, -19.0, -4.0],
    [-37.0, -21.0, -5.0],
    [-40.0, -23.0, -6.0],
    [-43.0, -25.0, -7.0],
    [-46.0, -27.0, -8.0],
    [-49.0, -29.0, -9.0],
    [-52.0, -31.0, -10.0],
    [-55.0, -33.0, -11.0],
    [-58.0, -35.0, -12.0],
    [-61.0, -37.0, -13.0],
    [-64.0, -39.0, -14.0],
    [-67.0, -41.0, -15.0],
    [-70.0, -43.0, -16.0],
    [-73.0, -45.0, -17.0],
    [-76.0, -47.0, -18.0],
    [-79.0, -49.0, -19.0],
    [-82.0, -51.0, -20.0],
    [-85.0, -53.0, -21.0],
    [-85.0, -53.0, -21.0],
];

const STANDARD_UNEXPECTED: Table = [
    [6.0, 8.0, 10.0],
    [8.0, 10.0, 12.0],
    [11.0, 14.0, 17.0],
    [15.0, 19.0, 23.0],
    [20.0, 25.0, 30.0],
    [26.0, 32.0, 38.0],
    [33.0, 40.0, 47.0],
    [41.0, 49.0, 57.0],
    [50.0, 59.0, 68.0],
    [60.0, 70.0, 80.0],
    [71.0, 82.0, 93.0],
    [72.25, 83.25, 94.0],
    [73.5, 84.25, 95.25],
    [74.5, 85.5, 96.25],
    [75.75, 86.5, 97.5],
    [77.0, 87.75, 98.5],
    [78.25, 88.75, 99.5],
    [79.25, 90.0, 100.75],
    [80.5, 91.25, 101.75],
    [81.75, 92.25, 102.75],
    [83.0, 93.5, 104.0],
    [84.0, 94.5, 105.0],
    [85.25, 95.75, 106.25],
    [86.5, 96.75, 107.25],
    [87.75, 98.0, 108.25],
    [88.75, 99.25, 109.5],
    [90.0, 100.25, 110.5],
    [91.25, 101.5, 111.5],
    [92.5, 102.5, 112.75],
    [93.5, 103.75, 113.75],
    [94.75, 104.75, 115.0],
    [96.0, 106.0, 116.0],
    [96.0, 106.0, 116.0],
];

const LONG_FORM_EXPECTED: Table = [
    [4.0, 6.0, 8.0],
    [3.25, 5.5, 7.75],
    [2.5, 5.0, 7.5],
    [1.75, 4.5, 7.25],
    [1.0, 4.0, 7.0],
    [0.25, 3.5, 6.75],
    [-0.5, 3.0, 6.5],
    [-1.25, 2.5, 6.25],
    [-2.0, 2.0, 6.0],
    [-2.75, 1.5, 5.75],
    [-3.5, 1.0, 5.5],
    [-4.25, 0.5, 5.25],
    [-5.0, 0.0, 5.0],
    [-5.75, -0.5, 4.75],
    [-6.5, -1.0, 4.5],
    [-7.25, -1.5, 4.25],
    [-8.0, -2.0, 4.0],
    [-8.75, -2.5, 3.75],
    [-9.5, -3.0, 3.5],
    [-10.25, -3.5, 3.25],
    [-11.0, -4.0, 3.0],
    [-11.75, -4.5, 2.75],
    [-12.5, -5.0, 2.5],
    [-13.25, -5.5, 2.25],
    [-14.0, -6.0, 2.0],
    [-14.75, -6.5, 1.75],
    [-15.5, -7.0, 1.5],
    [-16.25, -7.5, 1.25],
    [-17.0, -8.0, 1.0],
    [-17.75, -8.5, 0.75],
    [-18.5, -9.0, 0.5],
    [-19.25, -9.5, 0.25],
    [-20.0, -10.0, 0.0],
];

const LONG_FORM_UNEXPECTED: Table = [
    [4.0, 6.0, 8.0],
    [5.0, 7.25, 9.5],
    [6.0, 8.5, 11.0],
    [7.25, 10.0, 12.75],
    [8.5, 11.5, 14.5],
    [10.0, 13.25, 16.5],
    [11.5, 15.0, 18.5],
    [13.25, 17.0, 20.75],
    [15.0, 19.0, 23.0],
    [17.0, 21.25, 25.5],
    [19.0, 23.5, 28.0],
    [21.25, 26.0, 30.75],
    [23.5, 28.5, 33.5],
    [26.0, 31.25, 36.5],
    [28.5, 34.0, 39.5],
    [31.25, 37.0, 42.75],
    [34.0, 40.0, 46.0],
    [37.0, 43.25, 49.5],
    [40.0, 46.5, 53.0],
    [43.25, 50.0, 56.75],
    [46.5, 53.5, 60.5],
    [50.0, 57.25, 64.5],
    [53.5, 61.0, 68.5],
    [57.25, 65.0, 72.75],
    [61.0, 69.0, 77.0],
    [65.0, 73.25, 81.5],
    [69.0, 77.5, 86.0],
    [73.25, 82.0, 90.75],
    [77.5, 86.5, 95.5],
    [82.0, 91.25, 100.5],
    [86.5, 96.0, 105.5],
    [91.25, 101.0, 110.75],
    [96.0, 106.0, 116.0],
];

/// Whether a match result agreed with the rating order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Outcome {
    /// The favourite won (ties count as favourite for both sides)
    Expected,
    /// The lower-rated side won
    Unexpected,
}

/// Published versions of the lookup tables
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TableVersion {
    /// Current league tables
    #[default]
    Standard,
    /// Long-form tables of the historical tool, kept for reproducing old results
    LongForm,
}

impl fmt::Display for TableVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TableVersion::Standard => write!(f, "standard"),
            TableVersion::LongForm => write!(f, "long_form"),
        }
    }
}

impl FromStr for TableVersion {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('-', "_").as_str() {
            "standard" => Ok(TableVersion::Standard),
            "long_form" | "longform" => Ok(TableVersion::LongForm),
            other => Err(format!("Unknown rating table version: {}", other)),
        }
    }
}

/// Immutable rating lookup data for one table version
#[derive(Debug, PartialEq)]
pub struct RatingTable {
    version: TableVersion,
    expected: &'static Table,
    unexpected: &'static Table,
}

static STANDARD: RatingTable = RatingTable {
    version: TableVersion::Standard,
    expected: &STANDARD_EXPECTED,
    unexpected: &STANDARD_UNEXPECTED,
};

static LONG_FORM: RatingTable = RatingTable {
    version: TableVersion::LongForm,
    expected: &LONG_FORM_EXPECTED,
    unexpected: &LONG_FORM_UNEXPECTED,
};

impl RatingTable {
    /// The process-lifetime table for a version
    pub fn get(version: TableVersion) -> &'static RatingTable {
        match version {
            TableVersion::Standard => &STANDARD,
            TableVersion::LongForm => &LONG_FORM,
        }
    }

    /// The default table
    pub fn standard() -> &'static RatingTable {
        &STANDARD
    }

    pub fn version(&self) -> TableVersion {
        self.version
    }

    /// Smallest bucket whose threshold covers `|gap|`, clamped to the last bucket
    pub fn bucket(gap: f64) -> usize {
        let gap = gap.abs();
        THRESHOLDS
            .iter()
            .position(|&threshold| gap <= threshold)
            .unwrap_or(BUCKET_COUNT - 1)
    }

    /// Magnitude for an outcome, bucket and margin class.
    ///
    /// Returns `None` if either index is outside the table.
    pub fn magnitude(&self, outcome: Outcome, bucket: usize, margin_class: usize) -> Option<f64> {
        let table = match outcome {
            Outcome::Expected => self.expected,
            Outcome::Unexpected => self.unexpected,
        };
        table
            .get(bucket)
            .and_then(|row| row.get(margin_class))
            .copied()
    }

    /// Full row for an outcome and bucket
    pub fn row(&self, outcome: Outcome, bucket: usize) -> Option<[f64; MARGIN_CLASSES]> {
        let table = match outcome {
            Outcome::Expected => self.expected,
            Outcome::Unexpected => self.unexpected,
        };
        table.get(bucket).copied()
    }
}
