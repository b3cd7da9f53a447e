//! Daily progress entries and the rules that decide whether a day counts as
//! completed.

use std::collections::BTreeSet;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use strum::IntoStaticStr;
use uuid::Uuid;

use crate::{
  Error, Result,
  habit::{Comparison, HabitKind},
};

/// The value logged for one habit on one day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum Progress {
  Done,
  Count(f64),
  /// Seconds.
  Time(u32),
  /// Indices of the ticked checklist items, ascending.
  Checklist(Vec<usize>),
}

/// What the user submitted for a day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, IntoStaticStr)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ProgressInput {
  /// Yes-or-no habits cycle unset → done → missed → unset.
  Toggle,
  Count(f64),
  /// Replace the logged time, in seconds.
  Time(u32),
  /// Add to the time already logged that day, in seconds.
  AddTime(u32),
  Checklist(Vec<usize>),
}

/// One habit's record for one date.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DayEntry {
  pub date:      NaiveDate,
  pub habit_id:  Uuid,
  pub progress:  Option<Progress>,
  pub completed: bool,
}

/// Result of applying a [`ProgressInput`] to a day.
#[derive(Debug, Clone, PartialEq)]
pub enum Evaluation {
  /// Store this entry.
  Keep(DayEntry),
  /// Remove the day's entry altogether.
  Clear,
}

impl Evaluation {
  /// The completion flag fed to the streak accumulator.
  pub fn completed(&self) -> bool {
    match self {
      Self::Keep(entry) => entry.completed,
      Self::Clear => false,
    }
  }
}

/// `AnyValue` timers need some time logged; the rest compare against the goal.
fn timer_met(comparison: Comparison, seconds: u32, goal_seconds: u32) -> bool {
  match comparison {
    Comparison::AnyValue => seconds != 0,
    other => other.holds(f64::from(seconds), f64::from(goal_seconds)),
  }
}

/// Apply `input` to the day described by `previous` (if any entry exists)
/// for a habit of the given `kind`.
pub fn evaluate(
  kind: &HabitKind,
  habit_id: Uuid,
  date: NaiveDate,
  previous: Option<&DayEntry>,
  input: ProgressInput,
) -> Result<Evaluation> {
  let keep = |progress: Option<Progress>, completed: bool| {
    Ok(Evaluation::Keep(DayEntry {
      date,
      habit_id,
      progress,
      completed,
    }))
  };

  match (kind, input) {
    (HabitKind::YesOrNo, ProgressInput::Toggle) => match previous {
      None => keep(Some(Progress::Done), true),
      Some(entry) if entry.completed => keep(None, false),
      Some(_) => Ok(Evaluation::Clear),
    },

    (HabitKind::Numeric { goal, comparison, .. }, ProgressInput::Count(value)) => {
      if !value.is_finite() {
        return Err(Error::InvalidProgress(format!("{value} is not a number")));
      }
      keep(Some(Progress::Count(value)), comparison.holds(value, *goal))
    }

    (HabitKind::Timer { goal_seconds, comparison }, ProgressInput::Time(seconds)) => {
      keep(
        Some(Progress::Time(seconds)),
        timer_met(*comparison, seconds, *goal_seconds),
      )
    }

    (HabitKind::Timer { goal_seconds, comparison }, ProgressInput::AddTime(extra)) => {
      let logged = match previous.and_then(|e| e.progress.as_ref()) {
        Some(Progress::Time(secs)) => *secs,
        _ => 0,
      };
      let seconds = logged.saturating_add(extra);
      keep(
        Some(Progress::Time(seconds)),
        timer_met(*comparison, seconds, *goal_seconds),
      )
    }

    (HabitKind::Checklist { items }, ProgressInput::Checklist(ticked)) => {
      if let Some(bad) = ticked.iter().find(|&&i| i >= items.len()) {
        return Err(Error::InvalidProgress(format!(
          "checklist item {bad} does not exist (list has {})",
          items.len()
        )));
      }
      let ticked: BTreeSet<usize> = ticked.into_iter().collect();
      let completed = ticked.len() == items.len();
      keep(Some(Progress::Checklist(ticked.into_iter().collect())), completed)
    }

    (kind, input) => Err(Error::ProgressMismatch {
      kind:  kind.name(),
      input: (&input).into(),
    }),
  }
}
