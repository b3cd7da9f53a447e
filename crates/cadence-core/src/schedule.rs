//! Repeat rules and the occurrence indexer.
//!
//! An *occurrence index* is the ordinal of a scheduled day: the Nth day, counted
//! from the habit's start date inclusive, on which the habit's repeat rule
//! applies. Streak intervals are expressed in occurrence indices rather than
//! calendar dates, so a Monday/Wednesday habit completed on both days of two
//! consecutive weeks has an unbroken run of four.

use std::{collections::BTreeSet, fmt, str::FromStr};

use chrono::{Datelike, Month, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

// ─── Day tokens ──────────────────────────────────────────────────────────────

/// A day of the week. Ordered Sunday first, which is also the display order.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  PartialOrd,
  Ord,
  Hash,
  Serialize,
  Deserialize,
  Display,
  EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(ascii_case_insensitive)]
pub enum DayOfWeek {
  Sun,
  Mon,
  Tue,
  Wed,
  Thu,
  Fri,
  Sat,
}

impl From<Weekday> for DayOfWeek {
  fn from(day: Weekday) -> Self {
    match day {
      Weekday::Sun => Self::Sun,
      Weekday::Mon => Self::Mon,
      Weekday::Tue => Self::Tue,
      Weekday::Wed => Self::Wed,
      Weekday::Thu => Self::Thu,
      Weekday::Fri => Self::Fri,
      Weekday::Sat => Self::Sat,
    }
  }
}

/// A calendar day that recurs every year, e.g. "March 3".
///
/// Serialised as its display form so stored rules stay human-readable.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(try_from = "String", into = "String")]
pub struct MonthDay {
  month: u32,
  day:   u32,
}

impl MonthDay {
  /// Returns `None` unless the pair names a real day in a leap year, so
  /// February 29 is accepted.
  pub fn new(month: u32, day: u32) -> Option<Self> {
    NaiveDate::from_ymd_opt(2000, month, day).map(|_| Self { month, day })
  }

  pub fn month(&self) -> u32 { self.month }

  pub fn day(&self) -> u32 { self.day }

  pub fn matches(&self, date: NaiveDate) -> bool {
    date.month() == self.month && date.day() == self.day
  }
}

impl From<NaiveDate> for MonthDay {
  fn from(date: NaiveDate) -> Self {
    Self {
      month: date.month(),
      day:   date.day(),
    }
  }
}

impl fmt::Display for MonthDay {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let name = u8::try_from(self.month)
      .ok()
      .and_then(|m| Month::try_from(m).ok())
      .map_or("?", |m| m.name());
    write!(f, "{name} {}", self.day)
  }
}

impl FromStr for MonthDay {
  type Err = String;

  /// Parses `"January 5"` or `"jan 5"`.
  fn from_str(s: &str) -> Result<Self, Self::Err> {
    let (month, day) = s
      .trim()
      .split_once(char::is_whitespace)
      .ok_or_else(|| format!("expected \"<month> <day>\", got {s:?}"))?;
    let month: Month = month
      .parse()
      .map_err(|_| format!("unknown month {month:?}"))?;
    let day: u32 = day
      .trim()
      .parse()
      .map_err(|_| format!("invalid day {day:?}"))?;
    Self::new(month.number_from_month(), day)
      .ok_or_else(|| format!("{s:?} is not a calendar day"))
  }
}

impl TryFrom<String> for MonthDay {
  type Error = String;

  fn try_from(s: String) -> Result<Self, Self::Error> { s.parse() }
}

impl From<MonthDay> for String {
  fn from(md: MonthDay) -> Self { md.to_string() }
}

// ─── RepeatRule ──────────────────────────────────────────────────────────────

/// When a habit is scheduled. Fixed at creation time: changing it would
/// re-number every occurrence index already recorded in the streak history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "days", rename_all = "snake_case")]
pub enum RepeatRule {
  /// A one-off task; its single occurrence is index 1.
  NoRepeat,
  EveryDay,
  DaysOfWeek(BTreeSet<DayOfWeek>),
  /// Days of the month, `1..=31`. Months without a listed day simply have no
  /// occurrence on it.
  DaysOfMonth(BTreeSet<u32>),
  DaysOfYear(BTreeSet<MonthDay>),
}

impl RepeatRule {
  /// Whether `date` falls on this rule's schedule, ignoring start/end bounds.
  pub fn is_scheduled(&self, date: NaiveDate) -> bool {
    match self {
      Self::NoRepeat | Self::EveryDay => true,
      Self::DaysOfWeek(days) => days.contains(&DayOfWeek::from(date.weekday())),
      Self::DaysOfMonth(days) => days.contains(&date.day()),
      Self::DaysOfYear(days) => days.contains(&MonthDay::from(date)),
    }
  }

  /// Check the rule's day set. Set-based rules must name at least one day,
  /// and days of the month must lie in `1..=31`.
  pub fn validate(&self) -> Result<(), String> {
    let empty = match self {
      Self::NoRepeat | Self::EveryDay => false,
      Self::DaysOfWeek(days) => days.is_empty(),
      Self::DaysOfMonth(days) => {
        if let Some(bad) = days.iter().find(|d| !(1..=31).contains(*d)) {
          return Err(format!("day of month {bad} is out of range"));
        }
        days.is_empty()
      }
      Self::DaysOfYear(days) => days.is_empty(),
    };
    if empty {
      return Err("repeat rule must select at least one day".to_owned());
    }
    Ok(())
  }

  /// The occurrence index of `date` for a habit starting on `start`.
  ///
  /// `date` must not precede `start`; callers guard against that.
  pub fn occurrence_index(&self, start: NaiveDate, date: NaiveDate) -> i64 {
    debug_assert!(date >= start, "{date} precedes start date {start}");
    match self {
      Self::NoRepeat => 1,
      Self::EveryDay => (date - start).num_days() + 1,
      _ => start
        .iter_days()
        .take_while(|day| *day <= date)
        .filter(|day| self.is_scheduled(*day))
        .count() as i64,
    }
  }
}

impl fmt::Display for RepeatRule {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    fn join<T: fmt::Display>(items: &BTreeSet<T>, sep: &str) -> String {
      items
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(sep)
    }

    match self {
      Self::NoRepeat => f.write_str("Not repeated"),
      Self::EveryDay => f.write_str("Every day"),
      Self::DaysOfWeek(days) => f.write_str(&join(days, "-")),
      Self::DaysOfMonth(days) => {
        write!(f, "Days of the month: {}", join(days, ", "))
      }
      Self::DaysOfYear(days) => f.write_str(&join(days, ", ")),
    }
  }
}

/// Free-function form of [`RepeatRule::occurrence_index`].
pub fn occurrence_index(
  date: NaiveDate,
  start: NaiveDate,
  rule: &RepeatRule,
) -> i64 {
  rule.occurrence_index(start, date)
}

#[cfg(test)]
mod tests {
  use super::*;

  fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
  }

  fn weekdays(days: &[DayOfWeek]) -> RepeatRule {
    RepeatRule::DaysOfWeek(days.iter().copied().collect())
  }

  #[test]
  fn no_repeat_is_always_one() {
    let start = date(2024, 1, 1);
    assert_eq!(occurrence_index(start, start, &RepeatRule::NoRepeat), 1);
    assert_eq!(
      occurrence_index(date(2024, 6, 1), start, &RepeatRule::NoRepeat),
      1
    );
  }

  #[test]
  fn every_day_counts_elapsed_days() {
    let start = date(2024, 1, 1);
    assert_eq!(occurrence_index(start, start, &RepeatRule::EveryDay), 1);
    assert_eq!(
      occurrence_index(date(2024, 1, 5), start, &RepeatRule::EveryDay),
      5
    );
    // Across a leap day.
    assert_eq!(
      occurrence_index(date(2024, 3, 1), date(2024, 2, 28), &RepeatRule::EveryDay),
      3
    );
  }

  #[test]
  fn weekday_rule_counts_matching_days_inclusive() {
    // 2024-01-01 is a Monday; the second Wednesday is 2024-01-10.
    let rule = weekdays(&[DayOfWeek::Mon, DayOfWeek::Wed]);
    let start = date(2024, 1, 1);
    assert_eq!(rule.occurrence_index(start, start), 1);
    assert_eq!(rule.occurrence_index(start, date(2024, 1, 3)), 2);
    assert_eq!(rule.occurrence_index(start, date(2024, 1, 8)), 3);
    assert_eq!(rule.occurrence_index(start, date(2024, 1, 10)), 4);
  }

  #[test]
  fn weekday_rule_on_unscheduled_day_counts_previous_occurrences() {
    let rule = weekdays(&[DayOfWeek::Mon, DayOfWeek::Wed]);
    let start = date(2024, 1, 1);
    // Friday 2024-01-05: Mon 1 and Wed 3 have elapsed.
    assert_eq!(rule.occurrence_index(start, date(2024, 1, 5)), 2);
  }

  #[test]
  fn day_of_month_rule() {
    let rule = RepeatRule::DaysOfMonth([1, 15].into_iter().collect());
    let start = date(2024, 1, 1);
    assert_eq!(rule.occurrence_index(start, date(2024, 3, 15)), 6);
    assert!(rule.is_scheduled(date(2024, 2, 15)));
    assert!(!rule.is_scheduled(date(2024, 2, 16)));
  }

  #[test]
  fn day_of_month_rule_skips_short_months() {
    let rule = RepeatRule::DaysOfMonth([31].into_iter().collect());
    let start = date(2024, 1, 1);
    // Jan 31 and Mar 31; February has none.
    assert_eq!(rule.occurrence_index(start, date(2024, 3, 31)), 2);
  }

  #[test]
  fn day_of_year_rule_spans_years() {
    let rule = RepeatRule::DaysOfYear(
      [MonthDay::new(1, 5).unwrap(), MonthDay::new(3, 3).unwrap()]
        .into_iter()
        .collect(),
    );
    let start = date(2023, 1, 1);
    assert_eq!(rule.occurrence_index(start, date(2024, 3, 3)), 4);
    assert_eq!(rule.occurrence_index(start, date(2024, 3, 2)), 3);
  }

  #[test]
  fn month_day_parses_long_and_short_names() {
    assert_eq!("January 5".parse::<MonthDay>(), Ok(MonthDay::new(1, 5).unwrap()));
    assert_eq!("mar 3".parse::<MonthDay>(), Ok(MonthDay::new(3, 3).unwrap()));
    assert!("February 30".parse::<MonthDay>().is_err());
    assert!("Smarch 1".parse::<MonthDay>().is_err());
    assert_eq!(MonthDay::new(2, 29).unwrap().to_string(), "February 29");
  }

  #[test]
  fn validate_rejects_empty_and_out_of_range_sets() {
    assert!(RepeatRule::EveryDay.validate().is_ok());
    assert!(RepeatRule::DaysOfWeek(BTreeSet::new()).validate().is_err());
    assert!(
      RepeatRule::DaysOfMonth([0].into_iter().collect())
        .validate()
        .is_err()
    );
    assert!(
      RepeatRule::DaysOfMonth([32].into_iter().collect())
        .validate()
        .is_err()
    );
  }

  #[test]
  fn display_matches_repeat_descriptions() {
    assert_eq!(RepeatRule::NoRepeat.to_string(), "Not repeated");
    assert_eq!(RepeatRule::EveryDay.to_string(), "Every day");
    assert_eq!(
      weekdays(&[DayOfWeek::Wed, DayOfWeek::Mon]).to_string(),
      "Mon-Wed"
    );
    assert_eq!(
      RepeatRule::DaysOfMonth([15, 1].into_iter().collect()).to_string(),
      "Days of the month: 1, 15"
    );
    assert_eq!(
      RepeatRule::DaysOfYear(
        [MonthDay::new(3, 3).unwrap(), MonthDay::new(1, 5).unwrap()]
          .into_iter()
          .collect()
      )
      .to_string(),
      "January 5, March 3"
    );
  }

  #[test]
  fn serde_shape() {
    let rule = weekdays(&[DayOfWeek::Mon, DayOfWeek::Wed]);
    let json = serde_json::to_value(&rule).unwrap();
    assert_eq!(
      json,
      serde_json::json!({ "type": "days_of_week", "days": ["mon", "wed"] })
    );

    let every: RepeatRule =
      serde_json::from_value(serde_json::json!({ "type": "every_day" })).unwrap();
    assert_eq!(every, RepeatRule::EveryDay);

    let yearly: RepeatRule = serde_json::from_value(serde_json::json!({
      "type": "days_of_year",
      "days": ["March 3"],
    }))
    .unwrap();
    assert!(yearly.is_scheduled(date(2030, 3, 3)));
  }
}
