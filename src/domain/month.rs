//! Month-granularity dates
//!
//! Every subscription date is a calendar month. `MonthValue` stores it as the
//! first day of that month (UTC) and is exchanged as `MM-YYYY`.

use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, Months, NaiveDate, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

/// Input was not a valid `MM-YYYY` month.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid date format, expected MM-YYYY (e.g., 01-2024), got: {input}")]
pub struct MonthParseError {
    input: String,
}

impl MonthParseError {
    pub fn new(input: impl Into<String>) -> Self {
        Self {
            input: input.into(),
        }
    }
}

/// A date truncated to the first day of its calendar month.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MonthValue(NaiveDate);

impl MonthValue {
    /// Build from a year and a 1-based month.
    pub fn new(year: i32, month: u32) -> Option<Self> {
        NaiveDate::from_ymd_opt(year, month, 1).map(Self)
    }

    /// Truncate any date to its month.
    pub fn from_date(date: NaiveDate) -> Self {
        // Day 1 exists in every month, so this cannot fail.
        Self(date.with_day(1).unwrap_or(date))
    }

    /// First day of the current month in UTC.
    pub fn current() -> Self {
        Self::from_date(Utc::now().date_naive())
    }

    /// Parse a strict `MM-YYYY` string.
    pub fn parse(input: &str) -> Result<Self, MonthParseError> {
        let err = || MonthParseError::new(input);

        let (month, year) = input.split_once('-').ok_or_else(err)?;
        if month.len() != 2 || year.len() != 4 {
            return Err(err());
        }
        if !month.bytes().all(|b| b.is_ascii_digit()) || !year.bytes().all(|b| b.is_ascii_digit()) {
            return Err(err());
        }

        let month: u32 = month.parse().map_err(|_| err())?;
        let year: i32 = year.parse().map_err(|_| err())?;
        if !(1..=12).contains(&month) {
            return Err(err());
        }

        Self::new(year, month).ok_or_else(err)
    }

    pub fn date(&self) -> NaiveDate {
        self.0
    }

    pub fn year(&self) -> i32 {
        self.0.year()
    }

    pub fn month(&self) -> u32 {
        self.0.month()
    }

    pub fn is_before(&self, other: &MonthValue) -> bool {
        self < other
    }

    /// Shift by `n` months; `None` past the supported calendar range.
    pub fn add_months(&self, n: u32) -> Option<Self> {
        self.0.checked_add_months(Months::new(n)).map(Self)
    }

    /// Number of calendar months from `start` to `end`, both included.
    ///
    /// `months_between(01-2024, 01-2024) == Some(1)`,
    /// `months_between(01-2024, 03-2024) == Some(3)`.
    /// Returns `None` when `start` is after `end`.
    pub fn months_between(start: MonthValue, end: MonthValue) -> Option<u32> {
        if start > end {
            return None;
        }
        let span = end.ordinal_month() - start.ordinal_month();
        u32::try_from(span + 1).ok()
    }

    fn ordinal_month(&self) -> i64 {
        i64::from(self.year()) * 12 + i64::from(self.month()) - 1
    }
}

impl fmt::Display for MonthValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}-{:04}", self.month(), self.year())
    }
}

impl FromStr for MonthValue {
    type Err = MonthParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl From<MonthValue> for NaiveDate {
    fn from(m: MonthValue) -> Self {
        m.0
    }
}

impl Serialize for MonthValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for MonthValue {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Self::parse(&raw).map_err(serde::de::Error::custom)
    }
}

// ── Tests ──────────────────────────────────────────────────────
