//! Habit records.
//!
//! A habit (or a one-off task) couples a repeat schedule with a goal of some
//! kind. Its analytics, the [`StreakHistory`], travel with the record and are
//! updated in place whenever progress is logged.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString, IntoStaticStr};
use uuid::Uuid;

use crate::{Error, Result, schedule::RepeatRule, streak::StreakHistory};

// ─── Goals ───────────────────────────────────────────────────────────────────

/// How a logged value is compared against a numeric or timed goal.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Default,
  Serialize,
  Deserialize,
  Display,
  EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Comparison {
  #[default]
  AtLeast,
  LessThan,
  Exactly,
  /// Any logged value counts.
  AnyValue,
}

impl Comparison {
  pub fn holds(self, value: f64, goal: f64) -> bool {
    match self {
      Self::AtLeast => value >= goal,
      Self::LessThan => value < goal,
      Self::Exactly => value == goal,
      Self::AnyValue => true,
    }
  }
}

/// What "done" means for a habit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, IntoStaticStr)]
#[serde(tag = "type", rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum HabitKind {
  /// Done or not done.
  YesOrNo,
  /// Reach a number, e.g. 8 glasses of water.
  Numeric {
    goal:       f64,
    #[serde(default)]
    unit:       String,
    #[serde(default)]
    comparison: Comparison,
  },
  /// Spend an amount of time, in seconds.
  Timer {
    goal_seconds: u32,
    #[serde(default)]
    comparison:   Comparison,
  },
  /// Tick off every item of a list.
  Checklist { items: Vec<String> },
}

impl HabitKind {
  /// The discriminant as a static string, e.g. `"yes_or_no"`.
  pub fn name(&self) -> &'static str { self.into() }

  fn validate(&self) -> Result<()> {
    match self {
      Self::YesOrNo => Ok(()),
      Self::Numeric { goal, .. } if !(*goal > 0.0) => {
        Err(Error::Validation("numeric goal must be positive".to_owned()))
      }
      Self::Timer { goal_seconds: 0, .. } => {
        Err(Error::Validation("timer goal must be non-zero".to_owned()))
      }
      Self::Checklist { items } if items.is_empty() => {
        Err(Error::Validation("checklist must have at least one item".to_owned()))
      }
      _ => Ok(()),
    }
  }
}

// ─── Habit ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Habit {
  pub habit_id:    Uuid,
  pub created_at:  DateTime<Utc>,
  pub name:        String,
  pub description: String,
  pub kind:        HabitKind,
  pub category_id: Option<Uuid>,
  /// Immutable once created.
  pub repeat:      RepeatRule,
  /// Anchor for occurrence counting; immutable once created.
  pub start_date:  NaiveDate,
  pub end_date:    Option<NaiveDate>,
  /// Higher sorts first.
  pub priority:    i32,
  /// One-off tasks are listed separately from habits.
  pub is_task:     bool,
  pub archived:    bool,
  pub analytics:   StreakHistory,
}

impl Habit {
  /// Occurrence index of `date` under this habit's schedule.
  pub fn occurrence_index(&self, date: NaiveDate) -> i64 {
    self.repeat.occurrence_index(self.start_date, date)
  }

  /// Check that progress may be logged for `date`: within the habit's date
  /// range, not after `today`, and on a scheduled day.
  pub fn check_loggable(&self, date: NaiveDate, today: NaiveDate) -> Result<()> {
    if date < self.start_date {
      return Err(Error::DateBeforeStart {
        date,
        start: self.start_date,
      });
    }
    if let Some(end) = self.end_date
      && date > end
    {
      return Err(Error::DateAfterEnd { date, end });
    }
    if date > today {
      return Err(Error::DateInFuture(date));
    }
    if !self.repeat.is_scheduled(date) {
      return Err(Error::DateNotScheduled(date));
    }
    Ok(())
  }

  /// Whether a calendar cell for `date` accepts input.
  pub fn is_open(&self, date: NaiveDate, today: NaiveDate) -> bool {
    self.check_loggable(date, today).is_ok()
  }
}

// ─── NewHabit ────────────────────────────────────────────────────────────────

fn default_priority() -> i32 { 1 }

/// Input to [`crate::tracker::Tracker::create_habit`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewHabit {
  pub name:        String,
  #[serde(default)]
  pub description: String,
  pub kind:        HabitKind,
  #[serde(default)]
  pub category_id: Option<Uuid>,
  pub repeat:      RepeatRule,
  pub start_date:  NaiveDate,
  #[serde(default)]
  pub end_date:    Option<NaiveDate>,
  #[serde(default = "default_priority")]
  pub priority:    i32,
  #[serde(default)]
  pub is_task:     bool,
}

impl NewHabit {
  /// Convenience constructor: a yes-or-no habit repeated every day.
  pub fn daily(name: impl Into<String>, start_date: NaiveDate) -> Self {
    Self {
      name: name.into(),
      description: String::new(),
      kind: HabitKind::YesOrNo,
      category_id: None,
      repeat: RepeatRule::EveryDay,
      start_date,
      end_date: None,
      priority: default_priority(),
      is_task: false,
    }
  }

  pub fn validate(&self) -> Result<()> {
    if self.name.trim().is_empty() {
      return Err(Error::Validation("name must not be empty".to_owned()));
    }
    self.kind.validate()?;
    self.repeat.validate().map_err(Error::Validation)?;
    if let Some(end) = self.end_date
      && end < self.start_date
    {
      return Err(Error::Validation(format!(
        "end date {end} precedes start date {}",
        self.start_date
      )));
    }
    Ok(())
  }

  /// Validate and build the stored record. A non-repeating task ends on the
  /// day it starts.
  pub fn into_habit(self) -> Result<Habit> {
    self.validate()?;
    let end_date = match self.repeat {
      RepeatRule::NoRepeat => Some(self.start_date),
      _ => self.end_date,
    };
    Ok(Habit {
      habit_id: Uuid::new_v4(),
      created_at: Utc::now(),
      name: self.name.trim().to_owned(),
      description: self.description,
      kind: self.kind,
      category_id: self.category_id,
      repeat: self.repeat,
      start_date: self.start_date,
      end_date,
      priority: self.priority,
      is_task: self.is_task,
      archived: false,
      analytics: StreakHistory::new(),
    })
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::schedule::DayOfWeek;

  fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
  }

  #[test]
  fn comparison_rules() {
    assert!(Comparison::AtLeast.holds(5.0, 5.0));
    assert!(!Comparison::AtLeast.holds(4.0, 5.0));
    assert!(Comparison::LessThan.holds(4.0, 5.0));
    assert!(!Comparison::LessThan.holds(5.0, 5.0));
    assert!(Comparison::Exactly.holds(5.0, 5.0));
    assert!(!Comparison::Exactly.holds(6.0, 5.0));
    assert!(Comparison::AnyValue.holds(0.0, 5.0));
  }

  #[test]
  fn new_habit_validation() {
    let start = date(2024, 1, 1);
    assert!(NewHabit::daily("Read", start).validate().is_ok());
    assert!(NewHabit::daily("  ", start).validate().is_err());

    let mut numeric = NewHabit::daily("Water", start);
    numeric.kind = HabitKind::Numeric {
      goal:       0.0,
      unit:       "glasses".into(),
      comparison: Comparison::AtLeast,
    };
    assert!(matches!(numeric.validate(), Err(Error::Validation(_))));

    let mut list = NewHabit::daily("Morning", start);
    list.kind = HabitKind::Checklist { items: vec![] };
    assert!(list.validate().is_err());

    let mut weekly = NewHabit::daily("Gym", start);
    weekly.repeat = RepeatRule::DaysOfWeek(Default::default());
    assert!(weekly.validate().is_err());

    let mut backwards = NewHabit::daily("Read", start);
    backwards.end_date = Some(date(2023, 12, 31));
    assert!(backwards.validate().is_err());
  }

  #[test]
  fn task_ends_on_its_start_date() {
    let start = date(2024, 2, 10);
    let mut task = NewHabit::daily("File taxes", start);
    task.repeat = RepeatRule::NoRepeat;
    task.is_task = true;
    task.end_date = Some(date(2024, 3, 1));
    let habit = task.into_habit().unwrap();
    assert_eq!(habit.end_date, Some(start));
    assert!(habit.analytics.is_empty());
  }

  #[test]
  fn loggable_dates() {
    let mut new = NewHabit::daily("Gym", date(2024, 1, 1));
    new.repeat = RepeatRule::DaysOfWeek([DayOfWeek::Mon].into_iter().collect());
    new.end_date = Some(date(2024, 1, 31));
    let habit = new.into_habit().unwrap();
    let today = date(2024, 1, 20);

    assert!(habit.is_open(date(2024, 1, 15), today));
    assert!(matches!(
      habit.check_loggable(date(2023, 12, 25), today),
      Err(Error::DateBeforeStart { .. })
    ));
    assert!(matches!(
      habit.check_loggable(date(2024, 1, 16), today),
      Err(Error::DateNotScheduled(_))
    ));
    assert!(matches!(
      habit.check_loggable(date(2024, 1, 22), today),
      Err(Error::DateInFuture(_))
    ));
    assert!(matches!(
      habit.check_loggable(date(2024, 2, 5), date(2024, 3, 1)),
      Err(Error::DateAfterEnd { .. })
    ));
  }

  #[test]
  fn kind_serde_shape() {
    let kind = HabitKind::Timer {
      goal_seconds: 1800,
      comparison:   Comparison::AtLeast,
    };
    assert_eq!(kind.name(), "timer");
    assert_eq!(
      serde_json::to_value(&kind).unwrap(),
      serde_json::json!({ "type": "timer", "goal_seconds": 1800, "comparison": "at_least" })
    );
  }
}
