//! Calendar month values in `YYYY-MM` form

use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, Months, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::pipeline::PipelineError;

/// A calendar month, ordered chronologically
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct YearMonth {
    year: i32,
    month: u32,
}

impl YearMonth {
    /// Create a month; `month` must be in `1..=12`
    pub fn new(year: i32, month: u32) -> Result<Self, PipelineError> {
        if !(1..=12).contains(&month) {
            return Err(PipelineError::Validation(format!(
                "month must be between 1 and 12, got {month}"
            )));
        }
        if !(0..=9999).contains(&year) {
            return Err(PipelineError::Validation(format!(
                "year must have four digits, got {year}"
            )));
        }
        Ok(Self { year, month })
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn month(&self) -> u32 {
        self.month
    }

    /// The following calendar month, rolling over into the next year
    pub fn succ(&self) -> Option<Self> {
        let next = self.first_day()?.checked_add_months(Months::new(1))?;
        Self::new(next.year(), next.month()).ok()
    }

    /// Every month from `start` to `end` inclusive; empty if `start > end`
    pub fn range_inclusive(start: Self, end: Self) -> impl Iterator<Item = Self> {
        std::iter::successors(Some(start), |m| m.succ()).take_while(move |m| *m <= end)
    }

    fn first_day(&self) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(self.year, self.month, 1)
    }
}

impl FromStr for YearMonth {
    type Err = PipelineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let invalid = || PipelineError::Validation(format!("expected YYYY-MM, got '{s}'"));

        let (year, month) = s.split_once('-').ok_or_else(invalid)?;
        if year.len() != 4 || month.len() != 2 {
            return Err(invalid());
        }
        let year: i32 = year.parse().map_err(|_| invalid())?;
        let month: u32 = month.parse().map_err(|_| invalid())?;
        Self::new(year, month)
    }
}

impl TryFrom<String> for YearMonth {
    type Error = PipelineError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<YearMonth> for String {
    fn from(value: YearMonth) -> Self {
        value.to_string()
    }
}

impl fmt::Display for YearMonth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}
