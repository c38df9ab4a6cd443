//! Quarter-coded reporting periods
//!
//! Observations are labelled with quarters (`"2024-Q3"`). The label set must be
//! totally ordered and support "next period" arithmetic with year rollover
//! (Q4 → Q1 of the following year). Forecast and projection labels are derived
//! from the last observed period through this type.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Errors raised while parsing or constructing a period
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PeriodError {
    #[error("Malformed period label '{0}' (expected YYYY-Qn)")]
    Malformed(String),

    #[error("Quarter {0} outside 1..=4")]
    InvalidQuarter(u8),
}

/// A calendar quarter
///
/// Ordering is chronological: year first, then quarter.
///
/// # Example
/// ```
/// use kpi_forecast_core_rs::Period;
///
/// let q4: Period = "2024-Q4".parse().unwrap();
/// assert_eq!(q4.next().to_string(), "2025-Q1");
/// assert!(q4 < q4.next());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Period {
    /// Calendar year
    year: i32,
    /// Quarter within the year (1-4)
    quarter: u8,
}

impl Period {
    /// Create a period, rejecting quarters outside 1..=4
    pub fn new(year: i32, quarter: u8) -> Result<Self, PeriodError> {
        if !(1..=4).contains(&quarter) {
            return Err(PeriodError::InvalidQuarter(quarter));
        }
        Ok(Self { year, quarter })
    }

    /// Calendar year
    pub fn year(&self) -> i32 {
        self.year
    }

    /// Quarter within the year (1-4)
    pub fn quarter(&self) -> u8 {
        self.quarter
    }

    /// Linear index of the quarter (`year * 4 + quarter - 1`)
    ///
    /// Consecutive quarters have consecutive ordinals, which makes gap
    /// arithmetic trivial.
    pub fn ordinal(&self) -> i64 {
        self.year as i64 * 4 + (self.quarter as i64 - 1)
    }

    /// Inverse of [`Period::ordinal`]
    pub fn from_ordinal(ordinal: i64) -> Self {
        let year = ordinal.div_euclid(4) as i32;
        let quarter = ordinal.rem_euclid(4) as u8 + 1;
        Self { year, quarter }
    }

    /// The following quarter, rolling Q4 over into Q1 of the next year
    pub fn next(&self) -> Self {
        self.advance(1)
    }

    /// Move `steps` quarters forward (negative steps move backwards)
    ///
    /// # Example
    /// ```
    /// use kpi_forecast_core_rs::Period;
    ///
    /// let p = Period::new(2024, 3).unwrap();
    /// assert_eq!(p.advance(6).to_string(), "2026-Q1");
    /// assert_eq!(p.advance(-3).to_string(), "2023-Q4");
    /// ```
    pub fn advance(&self, steps: i64) -> Self {
        Self::from_ordinal(self.ordinal() + steps)
    }

    /// Number of quarters from `self` to `other` (negative when `other` is earlier)
    pub fn quarters_until(&self, other: &Period) -> i64 {
        other.ordinal() - self.ordinal()
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-Q{}", self.year, self.quarter)
    }
}

impl FromStr for Period {
    type Err = PeriodError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let (year_part, quarter_part) = trimmed
            .split_once('-')
            .ok_or_else(|| PeriodError::Malformed(s.to_string()))?;

        if year_part.len() != 4 {
            return Err(PeriodError::Malformed(s.to_string()));
        }
        let year: i32 = year_part
            .parse()
            .map_err(|_| PeriodError::Malformed(s.to_string()))?;

        let quarter_digits = quarter_part
            .strip_prefix('Q')
            .or_else(|| quarter_part.strip_prefix('q'))
            .ok_or_else(|| PeriodError::Malformed(s.to_string()))?;
        let quarter: u8 = quarter_digits
            .parse()
            .map_err(|_| PeriodError::Malformed(s.to_string()))?;

        Period::new(year, quarter)
    }
}

impl TryFrom<String> for Period {
    type Error = PeriodError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Period> for String {
    fn from(value: Period) -> Self {
        value.to_string()
    }
}
