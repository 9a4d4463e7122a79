//! ISO-8601 week identifiers.

use crate::error::{ForecastError, Result};
use chrono::{Datelike, Duration, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// An ISO-8601 week of an ISO week-numbering year.
///
/// Ordering is chronological. Labels render as `Wk19 2025`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct IsoWeek {
    year: i32,
    week: u32,
}

impl IsoWeek {
    /// Create a week, validating that it exists in the given ISO year.
    pub fn new(year: i32, week: u32) -> Result<Self> {
        NaiveDate::from_isoywd_opt(year, week, Weekday::Mon)
            .map(|_| Self { year, week })
            .ok_or_else(|| {
                ForecastError::WeekError(format!("week {} does not exist in {}", week, year))
            })
    }

    /// The ISO week containing `date`.
    pub fn from_date(date: NaiveDate) -> Self {
        let iso = date.iso_week();
        Self {
            year: iso.year(),
            week: iso.week(),
        }
    }

    /// Parse a label such as `Wk19 2025`, `Wk 1 2026` or `wk05 2024`.
    pub fn parse(label: &str) -> Result<Self> {
        let invalid = || ForecastError::WeekError(format!("unrecognized week label '{}'", label));

        let trimmed = label.trim();
        match trimmed.get(..2) {
            Some(prefix) if prefix.eq_ignore_ascii_case("wk") => {}
            _ => return Err(invalid()),
        }
        let rest = trimmed[2..].trim_start();

        let week_end = rest
            .find(|c: char| !c.is_ascii_digit())
            .ok_or_else(invalid)?;
        let week: u32 = rest[..week_end].parse().map_err(|_| invalid())?;

        let year_part = rest[week_end..].trim();
        if year_part.len() != 4 || !year_part.chars().all(|c| c.is_ascii_digit()) {
            return Err(invalid());
        }
        let year: i32 = year_part.parse().map_err(|_| invalid())?;

        Self::new(year, week)
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn week(&self) -> u32 {
        self.week
    }

    /// Monday of this week.
    pub fn monday(&self) -> NaiveDate {
        // Validated at construction.
        NaiveDate::from_isoywd_opt(self.year, self.week, Weekday::Mon).unwrap_or_default()
    }

    /// The following week, crossing ISO year boundaries.
    pub fn next(&self) -> Self {
        self.plus(1)
    }

    /// The week `n` weeks later.
    pub fn plus(&self, n: u32) -> Self {
        Self::from_date(self.monday() + Duration::weeks(i64::from(n)))
    }

    /// The `n` weeks following this one.
    pub fn following(&self, n: usize) -> Vec<IsoWeek> {
        (1..=n as u32).map(|i| self.plus(i)).collect()
    }
}

impl fmt::Display for IsoWeek {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Wk{:02} {}", self.week, self.year)
    }
}

impl FromStr for IsoWeek {
    type Err = ForecastError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl TryFrom<String> for IsoWeek {
    type Error = ForecastError;

    fn try_from(value: String) -> Result<Self> {
        Self::parse(&value)
    }
}

impl From<IsoWeek> for String {
    fn from(week: IsoWeek) -> Self {
        week.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_common_label_shapes() {
        assert_eq!(IsoWeek::parse("Wk19 2025").unwrap(), IsoWeek::new(2025, 19).unwrap());
        assert_eq!(IsoWeek::parse("Wk 1 2026").unwrap(), IsoWeek::new(2026, 1).unwrap());
        assert_eq!(IsoWeek::parse("  wk05 2024 ").unwrap(), IsoWeek::new(2024, 5).unwrap());
    }

    #[test]
    fn rejects_malformed_labels() {
        assert!(IsoWeek::parse("Week 5").is_err());
        assert!(IsoWeek::parse("Wk5").is_err());
        assert!(IsoWeek::parse("Wk5 25").is_err());
        assert!(IsoWeek::parse("Wk54 2025").is_err());
        // 2025 has 52 ISO weeks, 2026 has 53.
        assert!(IsoWeek::parse("Wk53 2025").is_err());
        assert!(IsoWeek::parse("Wk53 2026").is_ok());
    }

    #[test]
    fn formats_with_zero_padding() {
        let week = IsoWeek::new(2026, 3).unwrap();
        assert_eq!(week.to_string(), "Wk03 2026");
    }

    #[test]
    fn next_crosses_year_boundary() {
        let last = IsoWeek::new(2025, 52).unwrap();
        assert_eq!(last.next(), IsoWeek::new(2026, 1).unwrap());

        let long_year_end = IsoWeek::new(2026, 52).unwrap();
        assert_eq!(long_year_end.next(), IsoWeek::new(2026, 53).unwrap());
        assert_eq!(long_year_end.plus(2), IsoWeek::new(2027, 1).unwrap());
    }

    #[test]
    fn following_returns_consecutive_weeks() {
        let start = IsoWeek::new(2025, 50).unwrap();
        let weeks = start.following(4);
        assert_eq!(weeks.len(), 4);
        assert_eq!(weeks[0], IsoWeek::new(2025, 51).unwrap());
        assert_eq!(weeks[3], IsoWeek::new(2026, 2).unwrap());
        assert!(weeks.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn from_date_matches_monday() {
        let date = NaiveDate::from_ymd_opt(2025, 5, 8).unwrap(); // Thursday
        let week = IsoWeek::from_date(date);
        assert_eq!(week, IsoWeek::new(2025, 19).unwrap());
        assert_eq!(week.monday(), NaiveDate::from_ymd_opt(2025, 5, 5).unwrap());
    }

    #[test]
    fn ordering_is_chronological() {
        let a = IsoWeek::new(2025, 52).unwrap();
        let b = IsoWeek::new(2026, 1).unwrap();
        assert!(a < b);
    }

    #[test]
    fn serde_uses_label_form() {
        let week = IsoWeek::new(2025, 7).unwrap();
        assert_eq!(serde_json::to_string(&week).unwrap(), "\"Wk07 2025\"");
        let back: IsoWeek = serde_json::from_str("\"Wk 7 2025\"").unwrap();
        assert_eq!(back, week);
        assert!(serde_json::from_str::<IsoWeek>("\"July\"").is_err());
    }
}
