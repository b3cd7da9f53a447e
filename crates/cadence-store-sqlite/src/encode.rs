//! Encoding and decoding helpers between Cadence domain types and the
//! plain-text representations stored in SQLite columns.
//!
//! Timestamps are RFC 3339 strings, calendar dates `YYYY-MM-DD`. Structured
//! fields (habit kind, repeat rule, streak intervals, progress) are compact
//! JSON. UUIDs are hyphenated lowercase strings.

use cadence_core::{
  category::Category,
  habit::Habit,
  progress::DayEntry,
  streak::{StreakHistory, StreakSpan},
};
use chrono::{DateTime, NaiveDate, Utc};
use uuid::Uuid;

use crate::{Error, Result};

// ─── Scalars ─────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> { Ok(Uuid::parse_str(s)?) }

pub fn encode_dt(dt: DateTime<Utc>) -> String { dt.to_rfc3339() }

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

const DATE_FORMAT: &str = "%Y-%m-%d";

pub fn encode_date(date: NaiveDate) -> String { date.format(DATE_FORMAT).to_string() }

pub fn decode_date(s: &str) -> Result<NaiveDate> {
  NaiveDate::parse_from_str(s, DATE_FORMAT)
    .map_err(|e| Error::DateParse(format!("{s:?}: {e}")))
}

// ─── Habits ──────────────────────────────────────────────────────────────────

/// Column values of one `habits` row, in both directions.
pub struct RawHabit {
  pub habit_id:         String,
  pub created_at:       String,
  pub name:             String,
  pub description:      String,
  pub kind:             String,
  pub category_id:      Option<String>,
  pub repeat_rule:      String,
  pub start_date:       String,
  pub end_date:         Option<String>,
  pub priority:         i32,
  pub is_task:          bool,
  pub archived:         bool,
  pub streak:           i64,
  pub streak_intervals: String,
}

impl RawHabit {
  pub const COLUMNS: &'static str = "habit_id, created_at, name, description, kind, \
     category_id, repeat_rule, start_date, end_date, priority, is_task, archived, \
     streak, streak_intervals";

  pub fn from_habit(habit: &Habit) -> Result<Self> {
    Ok(Self {
      habit_id:         encode_uuid(habit.habit_id),
      created_at:       encode_dt(habit.created_at),
      name:             habit.name.clone(),
      description:      habit.description.clone(),
      kind:             serde_json::to_string(&habit.kind)?,
      category_id:      habit.category_id.map(encode_uuid),
      repeat_rule:      serde_json::to_string(&habit.repeat)?,
      start_date:       encode_date(habit.start_date),
      end_date:         habit.end_date.map(encode_date),
      priority:         habit.priority,
      is_task:          habit.is_task,
      archived:         habit.archived,
      streak:           habit.analytics.streak(),
      streak_intervals: habit.analytics.intervals_json()?,
    })
  }

  /// Read a row selected with [`Self::COLUMNS`].
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      habit_id:         row.get(0)?,
      created_at:       row.get(1)?,
      name:             row.get(2)?,
      description:      row.get(3)?,
      kind:             row.get(4)?,
      category_id:      row.get(5)?,
      repeat_rule:      row.get(6)?,
      start_date:       row.get(7)?,
      end_date:         row.get(8)?,
      priority:         row.get(9)?,
      is_task:          row.get(10)?,
      archived:         row.get(11)?,
      streak:           row.get(12)?,
      streak_intervals: row.get(13)?,
    })
  }

  /// Decode into a [`Habit`]. The interval list is re-validated and the
  /// streak recomputed from it; the `streak` column is only a cache.
  pub fn into_habit(self) -> Result<Habit> {
    let spans: Vec<StreakSpan> = serde_json::from_str(&self.streak_intervals)?;
    let analytics = StreakHistory::from_intervals(spans)?;
    if analytics.streak() != self.streak {
      tracing::warn!(
        habit_id = %self.habit_id,
        stored = self.streak,
        computed = analytics.streak(),
        "cached streak disagrees with intervals"
      );
    }

    Ok(Habit {
      habit_id: decode_uuid(&self.habit_id)?,
      created_at: decode_dt(&self.created_at)?,
      name: self.name,
      description: self.description,
      kind: serde_json::from_str(&self.kind)?,
      category_id: self.category_id.as_deref().map(decode_uuid).transpose()?,
      repeat: serde_json::from_str(&self.repeat_rule)?,
      start_date: decode_date(&self.start_date)?,
      end_date: self.end_date.as_deref().map(decode_date).transpose()?,
      priority: self.priority,
      is_task: self.is_task,
      archived: self.archived,
      analytics,
    })
  }
}

// ─── Categories ──────────────────────────────────────────────────────────────

pub struct RawCategory {
  pub category_id: String,
  pub name:        String,
  pub icon:        String,
  pub color:       String,
  pub is_custom:   bool,
}

impl RawCategory {
  pub fn from_category(c: Category) -> Self {
    Self {
      category_id: encode_uuid(c.category_id),
      name:        c.name,
      icon:        c.icon,
      color:       c.color,
      is_custom:   c.is_custom,
    }
  }

  pub fn into_category(self) -> Result<Category> {
    Ok(Category {
      category_id: decode_uuid(&self.category_id)?,
      name:        self.name,
      icon:        self.icon,
      color:       self.color,
      is_custom:   self.is_custom,
    })
  }
}

// ─── History ─────────────────────────────────────────────────────────────────

pub struct RawEntry {
  pub date:      String,
  pub habit_id:  String,
  pub progress:  Option<String>,
  pub completed: bool,
}

impl RawEntry {
  pub fn from_entry(entry: &DayEntry) -> Result<Self> {
    Ok(Self {
      date:      encode_date(entry.date),
      habit_id:  encode_uuid(entry.habit_id),
      progress:  entry
        .progress
        .as_ref()
        .map(serde_json::to_string)
        .transpose()?,
      completed: entry.completed,
    })
  }

  pub fn into_entry(self) -> Result<DayEntry> {
    Ok(DayEntry {
      date:      decode_date(&self.date)?,
      habit_id:  decode_uuid(&self.habit_id)?,
      progress:  self
        .progress
        .as_deref()
        .map(serde_json::from_str)
        .transpose()?,
      completed: self.completed,
    })
  }
}
