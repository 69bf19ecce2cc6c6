//! [`MonthDay`]: a recurring calendar day without a year, and
//! [`MonthDayRange`]: an inclusive run of them.
//!
//! Birthdays and anniversaries recur annually, so only the month and day are
//! meaningful. Storage layers that insist on a full date use the sentinel year
//! [`SENTINEL_YEAR`]; it is a leap year, so 29 February is representable.

use std::{fmt, str::FromStr};

use chrono::{Datelike, FixedOffset, NaiveDate, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::{Error, Result};

/// The fixed year used when a month-day must be stored as a full date.
pub const SENTINEL_YEAR: i32 = 2000;

/// A validated month/day pair. Ordered by month, then day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MonthDay {
  month: u32,
  day:   u32,
}

impl MonthDay {
  pub fn new(month: u32, day: u32) -> Result<Self> {
    if NaiveDate::from_ymd_opt(SENTINEL_YEAR, month, day).is_none() {
      return Err(Error::InvalidMonthDay(format!("{month:02}-{day:02}")));
    }
    Ok(Self { month, day })
  }

  /// Project a full date onto its recurring month-day.
  pub fn from_date(date: NaiveDate) -> Self {
    Self { month: date.month(), day: date.day() }
  }

  /// Today's month-day as observed at `offset` from UTC.
  pub fn today(offset: FixedOffset) -> Self {
    Self::from_date(Utc::now().with_timezone(&offset).date_naive())
  }

  pub fn month(&self) -> u32 { self.month }

  pub fn day(&self) -> u32 { self.day }

  /// The `YYYY-MM-DD` form with the sentinel year, as stored by the record
  /// store.
  pub fn to_sentinel_string(&self) -> String {
    format!("{SENTINEL_YEAR}-{:02}-{:02}", self.month, self.day)
  }

  /// Zero-based day of the sentinel year.
  fn ordinal0(&self) -> u32 {
    NaiveDate::from_ymd_opt(SENTINEL_YEAR, self.month, self.day).map_or(0, |d| d.ordinal0())
  }

  /// Human form for headings, e.g. `14 March`.
  pub fn long_form(&self) -> String {
    NaiveDate::from_ymd_opt(SENTINEL_YEAR, self.month, self.day)
      .map_or_else(|| self.to_string(), |d| d.format("%-d %B").to_string())
  }
}

impl fmt::Display for MonthDay {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{:02}-{:02}", self.month, self.day)
  }
}

/// Accepts `MM-DD`, `--MM-DD` and `YYYY-MM-DD` (any year; the year is
/// discarded).
impl FromStr for MonthDay {
  type Err = Error;

  fn from_str(s: &str) -> Result<Self> {
    let invalid = || Error::InvalidMonthDay(s.to_owned());
    let trimmed = s.trim();
    let trimmed = trimmed.strip_prefix("--").unwrap_or(trimmed);

    let parts: Vec<&str> = trimmed.split('-').collect();
    let (month, day) = match parts.as_slice() {
      [month, day] => (*month, *day),
      [year, month, day] => {
        year.parse::<i32>().map_err(|_| invalid())?;
        (*month, *day)
      }
      _ => return Err(invalid()),
    };

    let month = month.parse::<u32>().map_err(|_| invalid())?;
    let day = day.parse::<u32>().map_err(|_| invalid())?;
    Self::new(month, day).map_err(|_| invalid())
  }
}

// ─── Ranges ──────────────────────────────────────────────────────────────────

/// Days in the sentinel (leap) year.
const YEAR_DAYS: u32 = 366;

/// An inclusive run of month-days. When `to` comes before `from` the range
/// wraps past 31 December, so `12-20..01-10` covers the turn of the year.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MonthDayRange {
  pub from: MonthDay,
  pub to:   MonthDay,
}

impl MonthDayRange {
  pub fn new(from: MonthDay, to: MonthDay) -> Self { Self { from, to } }

  pub fn single(day: MonthDay) -> Self { Self { from: day, to: day } }

  /// From `from` to the same day of the following month, or that month's
  /// last day when it is shorter.
  pub fn month_from(from: MonthDay) -> Self {
    let month = from.month % 12 + 1;
    let to = (1..=from.day)
      .rev()
      .find_map(|day| MonthDay::new(month, day).ok())
      .unwrap_or(MonthDay { month, day: 1 });
    Self { from, to }
  }

  pub fn wraps(&self) -> bool { self.to < self.from }

  /// Days from `from` forward to `day`, going round the year if needed.
  pub fn days_after_start(&self, day: MonthDay) -> u32 {
    (day.ordinal0() + YEAR_DAYS - self.from.ordinal0()) % YEAR_DAYS
  }

  pub fn contains(&self, day: MonthDay) -> bool {
    self.days_after_start(day) <= self.days_after_start(self.to)
  }
}

impl fmt::Display for MonthDayRange {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}..{}", self.from, self.to)
  }
}

impl Serialize for MonthDay {
  fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.collect_str(self)
  }
}

impl<'de> Deserialize<'de> for MonthDay {
  fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
    let raw = String::deserialize(deserializer)?;
    raw.parse().map_err(serde::de::Error::custom)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn parses_all_accepted_forms() {
    let expected = MonthDay::new(5, 14).unwrap();
    assert_eq!("05-14".parse::<MonthDay>().unwrap(), expected);
    assert_eq!("--05-14".parse::<MonthDay>().unwrap(), expected);
    assert_eq!("2000-05-14".parse::<MonthDay>().unwrap(), expected);
    assert_eq!("1987-5-14".parse::<MonthDay>().unwrap(), expected);
  }

  #[test]
  fn long_form_names_the_month() {
    assert_eq!(MonthDay::new(3, 14).unwrap().long_form(), "14 March");
    assert_eq!(MonthDay::new(12, 1).unwrap().long_form(), "1 December");
  }

  #[test]
  fn leap_day_is_valid() {
    let leap = MonthDay::new(2, 29).unwrap();
    assert_eq!(leap.to_sentinel_string(), "2000-02-29");
  }

  #[test]
  fn rejects_impossible_days() {
    assert!(MonthDay::new(2, 30).is_err());
    assert!(MonthDay::new(13, 1).is_err());
    assert!("april-1".parse::<MonthDay>().is_err());
    assert!("".parse::<MonthDay>().is_err());
  }

  #[test]
  fn range_wraps_past_new_year() {
    let range = MonthDayRange::new(MonthDay::new(12, 20).unwrap(), MonthDay::new(1, 10).unwrap());
    assert!(range.wraps());
    assert!(range.contains(MonthDay::new(12, 31).unwrap()));
    assert!(range.contains(MonthDay::new(1, 1).unwrap()));
    assert!(range.contains(MonthDay::new(1, 10).unwrap()));
    assert!(!range.contains(MonthDay::new(1, 11).unwrap()));
    assert!(!range.contains(MonthDay::new(6, 1).unwrap()));
    assert!(
      range.days_after_start(MonthDay::new(12, 31).unwrap())
        < range.days_after_start(MonthDay::new(1, 1).unwrap())
    );
  }

  #[test]
  fn plain_range_is_inclusive() {
    let range = MonthDayRange::new(MonthDay::new(3, 1).unwrap(), MonthDay::new(3, 31).unwrap());
    assert!(!range.wraps());
    assert!(range.contains(MonthDay::new(3, 1).unwrap()));
    assert!(range.contains(MonthDay::new(3, 31).unwrap()));
    assert!(!range.contains(MonthDay::new(2, 29).unwrap()));
    assert!(!range.contains(MonthDay::new(4, 1).unwrap()));

    let single = MonthDayRange::single(MonthDay::new(2, 29).unwrap());
    assert!(single.contains(MonthDay::new(2, 29).unwrap()));
    assert!(!single.contains(MonthDay::new(3, 1).unwrap()));
  }

  #[test]
  fn month_from_clamps_to_month_end() {
    let md = |m, d| MonthDay::new(m, d).unwrap();
    assert_eq!(MonthDayRange::month_from(md(3, 14)).to, md(4, 14));
    assert_eq!(MonthDayRange::month_from(md(1, 31)).to, md(2, 29));
    assert_eq!(MonthDayRange::month_from(md(12, 15)).to, md(1, 15));
    assert!(MonthDayRange::month_from(md(12, 15)).wraps());
  }

  #[test]
  fn serde_uses_display_form() {
    let md = MonthDay::new(12, 3).unwrap();
    let json = serde_json::to_string(&md).unwrap();
    assert_eq!(json, "\"12-03\"");
    let back: MonthDay = serde_json::from_str("\"2000-12-03\"").unwrap();
    assert_eq!(back, md);
  }
}
