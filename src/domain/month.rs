//! Month-year keys for the monthly metrics.

use std::cmp::Ordering;
use std::fmt;
use std::ops::RangeInclusive;
use std::str::FromStr;

use chrono::{Datelike, Month, NaiveDate};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::domain::error::{DomainError, DomainResult};

/// Years a [`MonthKey`] may refer to.
pub const SUPPORTED_YEARS: RangeInclusive<i32> = 1900..=2100;

/// A calendar month of a given year, written `"March 2021"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MonthKey {
    month: Month,
    year: i32,
}

impl MonthKey {
    pub fn new(month: Month, year: i32) -> DomainResult<Self> {
        if !SUPPORTED_YEARS.contains(&year) {
            return Err(DomainError::InvalidMonthKey {
                key: format!("{} {}", month.name(), year),
                reason: format!(
                    "year outside {}..={}",
                    SUPPORTED_YEARS.start(),
                    SUPPORTED_YEARS.end()
                ),
            });
        }
        Ok(Self { month, year })
    }

    /// Key for a numeric year and month (1-12).
    pub fn from_ym(year: i32, month: u32) -> DomainResult<Self> {
        let invalid = || DomainError::InvalidMonthKey {
            key: format!("{:04}-{:02}", year, month),
            reason: "month number outside 1..=12".to_string(),
        };
        let month = u8::try_from(month).map_err(|_| invalid())?;
        let month = Month::try_from(month).map_err(|_| invalid())?;
        Self::new(month, year)
    }

    /// Key of the month a `YYYY-MM-DD` date falls in.
    pub fn from_date(date: &str) -> DomainResult<Self> {
        let malformed = || DomainError::MalformedDate {
            value: date.to_string(),
        };
        let parsed = NaiveDate::parse_from_str(date.trim(), "%Y-%m-%d").map_err(|_| malformed())?;
        Self::from_ym(parsed.year(), parsed.month()).map_err(|_| malformed())
    }

    pub fn month(&self) -> Month {
        self.month
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    fn ordinal(&self) -> (i32, u32) {
        (self.year, self.month.number_from_month())
    }

    /// The following month, `None` past the supported range.
    pub fn succ(&self) -> Option<Self> {
        let year = if self.month == Month::December {
            self.year + 1
        } else {
            self.year
        };
        Self::new(self.month.succ(), year).ok()
    }

    /// All months from `start` to `end`, both included. Empty if `end < start`.
    pub fn range(start: MonthKey, end: MonthKey) -> Vec<MonthKey> {
        std::iter::successors(Some(start), MonthKey::succ)
            .take_while(|key| *key <= end)
            .collect()
    }
}

impl Ord for MonthKey {
    fn cmp(&self, other: &Self) -> Ordering {
        self.ordinal().cmp(&other.ordinal())
    }
}

impl PartialOrd for MonthKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for MonthKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.month.name(), self.year)
    }
}

impl FromStr for MonthKey {
    type Err = DomainError;

    /// Parse `"<month name> <year>"`, month name case-insensitive.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = |reason: &str| DomainError::InvalidMonthKey {
            key: s.to_string(),
            reason: reason.to_string(),
        };

        let mut parts = s.split_whitespace();
        let (Some(month), Some(year), None) = (parts.next(), parts.next(), parts.next()) else {
            return Err(invalid("expected '<month> <year>'"));
        };
        let month = month
            .parse::<Month>()
            .map_err(|_| invalid("unknown month name"))?;
        if year.len() != 4 {
            return Err(invalid("expected a four-digit year"));
        }
        let year = year
            .parse::<i32>()
            .map_err(|_| invalid("expected a four-digit year"))?;

        Self::new(month, year)
    }
}

impl Serialize for MonthKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for MonthKey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}
