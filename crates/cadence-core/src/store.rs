//! The `HabitStore` trait and supporting query types.
//!
//! Implemented by storage backends (`cadence-store-sqlite`, and the in-process
//! [`crate::memory::MemoryStore`]). The [`crate::tracker::Tracker`] and
//! everything above it depend on this abstraction only.

use std::future::Future;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{category::Category, habit::Habit, progress::DayEntry};

// ─── Query type ──────────────────────────────────────────────────────────────

/// Filters for [`HabitStore::find_habits`]. `None` means "don't filter".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HabitQuery {
  pub archived:    Option<bool>,
  pub is_task:     Option<bool>,
  pub category_id: Option<Uuid>,
}

impl HabitQuery {
  /// Unarchived habits and tasks, the default listing.
  pub fn active() -> Self {
    Self {
      archived: Some(false),
      ..Self::default()
    }
  }

  pub fn matches(&self, habit: &Habit) -> bool {
    self.archived.is_none_or(|a| a == habit.archived)
      && self.is_task.is_none_or(|t| t == habit.is_task)
      && self.category_id.is_none_or(|c| habit.category_id == Some(c))
  }
}

// ─── Trait ───────────────────────────────────────────────────────────────────

/// Abstraction over a habit store backend.
///
/// All methods return `Send` futures so the trait can be used behind `axum`
/// on a multi-threaded tokio runtime.
pub trait HabitStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  // ── Habits ────────────────────────────────────────────────────────────

  fn insert_habit(
    &self,
    habit: Habit,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  /// Returns `None` if not found.
  fn get_habit(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<Habit>, Self::Error>> + Send + '_;

  /// Replace the stored record with the same `habit_id`. Returns `false` if
  /// no such habit exists.
  fn update_habit(
    &self,
    habit: Habit,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  /// Returns `false` if no such habit exists.
  fn remove_habit(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  /// Habits matching `query`, in no particular order.
  fn find_habits<'a>(
    &'a self,
    query: &'a HabitQuery,
  ) -> impl Future<Output = Result<Vec<Habit>, Self::Error>> + Send + 'a;

  // ── Categories ────────────────────────────────────────────────────────

  fn insert_category(
    &self,
    category: Category,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  fn list_categories(
    &self,
  ) -> impl Future<Output = Result<Vec<Category>, Self::Error>> + Send + '_;

  // ── History ───────────────────────────────────────────────────────────

  fn get_entry(
    &self,
    date: NaiveDate,
    habit_id: Uuid,
  ) -> impl Future<Output = Result<Option<DayEntry>, Self::Error>> + Send + '_;

  /// Insert or replace the entry keyed by `(date, habit_id)`.
  fn put_entry(
    &self,
    entry: DayEntry,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  /// Returns `false` if there was nothing to remove.
  fn remove_entry(
    &self,
    date: NaiveDate,
    habit_id: Uuid,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  /// Entries with `from <= date <= to`, ordered by date.
  fn entries_between(
    &self,
    from: NaiveDate,
    to: NaiveDate,
  ) -> impl Future<Output = Result<Vec<DayEntry>, Self::Error>> + Send + '_;

  /// Replace `habit` and, in the same write, store `entry` (or remove the
  /// habit's entry for `date` when `entry` is `None`). Either both land or
  /// neither does. Returns `false`, having written nothing, if no such habit
  /// exists.
  fn save_progress(
    &self,
    habit: Habit,
    date: NaiveDate,
    entry: Option<DayEntry>,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  /// Drop every entry of one habit; returns how many were removed.
  fn remove_entries_for(
    &self,
    habit_id: Uuid,
  ) -> impl Future<Output = Result<usize, Self::Error>> + Send + '_;
}
