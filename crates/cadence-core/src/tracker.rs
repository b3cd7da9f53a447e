//! The `Tracker` service: habit management and progress logging over any
//! [`HabitStore`].
//!
//! Logging progress is a read-modify-write of the habit's streak history, so
//! all writes go through a single async mutex held for the whole update.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::{
  Error, Result,
  category::Category,
  events::{EventBus, HabitEvent},
  habit::{Habit, NewHabit},
  progress::{self, DayEntry, Evaluation, ProgressInput},
  schedule::RepeatRule,
  store::{HabitQuery, HabitStore},
  streak::StreakHistory,
};

/// What changed after a call to [`Tracker::record_progress`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressOutcome {
  /// The stored entry, or `None` if the day was cleared.
  pub entry:      Option<DayEntry>,
  /// Occurrence index of the logged date.
  pub occurrence: i64,
  pub analytics:  StreakHistory,
}

pub struct Tracker<S> {
  store:  S,
  events: EventBus,
  writes: Mutex<()>,
}

impl<S: HabitStore> Tracker<S> {
  pub fn new(store: S) -> Self { Self::with_events(store, EventBus::default()) }

  pub fn with_events(store: S, events: EventBus) -> Self {
    Self {
      store,
      events,
      writes: Mutex::new(()),
    }
  }

  pub fn store(&self) -> &S { &self.store }

  pub fn events(&self) -> &EventBus { &self.events }

  // ── Habits ────────────────────────────────────────────────────────────

  pub async fn create_habit(&self, input: NewHabit) -> Result<Habit> {
    let habit = input.into_habit()?;
    let _guard = self.writes.lock().await;
    self
      .store
      .insert_habit(habit.clone())
      .await
      .map_err(Error::store)?;
    tracing::info!(habit_id = %habit.habit_id, name = %habit.name, "habit created");
    self.events.publish(HabitEvent::HabitAdded {
      habit_id: habit.habit_id,
    });
    Ok(habit)
  }

  pub async fn get_habit(&self, id: Uuid) -> Result<Habit> {
    self
      .store
      .get_habit(id)
      .await
      .map_err(Error::store)?
      .ok_or(Error::HabitNotFound(id))
  }

  /// Habits matching `query`, highest priority first, oldest first among
  /// equals.
  pub async fn list_habits(&self, query: &HabitQuery) -> Result<Vec<Habit>> {
    let mut habits = self.store.find_habits(query).await.map_err(Error::store)?;
    habits.sort_by(|a, b| {
      b.priority
        .cmp(&a.priority)
        .then_with(|| a.created_at.cmp(&b.created_at))
    });
    Ok(habits)
  }

  pub async fn set_archived(&self, id: Uuid, archived: bool) -> Result<Habit> {
    let _guard = self.writes.lock().await;
    let mut habit = self.get_habit(id).await?;
    if habit.archived == archived {
      return Ok(habit);
    }
    habit.archived = archived;
    self.save_habit(&habit).await?;
    tracing::info!(habit_id = %id, archived, "habit archive state changed");
    self
      .events
      .publish(HabitEvent::HabitUpdated { habit_id: id });
    Ok(habit)
  }

  /// Remove a habit together with all of its day entries.
  pub async fn delete_habit(&self, id: Uuid) -> Result<()> {
    let _guard = self.writes.lock().await;
    if !self.store.remove_habit(id).await.map_err(Error::store)? {
      return Err(Error::HabitNotFound(id));
    }
    let entries = self
      .store
      .remove_entries_for(id)
      .await
      .map_err(Error::store)?;
    tracing::info!(habit_id = %id, entries, "habit deleted");
    self
      .events
      .publish(HabitEvent::HabitRemoved { habit_id: id });
    Ok(())
  }

  pub async fn streak(&self, id: Uuid) -> Result<StreakHistory> {
    Ok(self.get_habit(id).await?.analytics)
  }

  // ── Progress ──────────────────────────────────────────────────────────

  /// Log `input` for `habit_id` on `date`, updating the day entry and the
  /// habit's streak history together.
  pub async fn record_progress(
    &self,
    habit_id: Uuid,
    date: NaiveDate,
    input: ProgressInput,
    today: NaiveDate,
  ) -> Result<ProgressOutcome> {
    let _guard = self.writes.lock().await;
    let mut habit = self.get_habit(habit_id).await?;
    habit.check_loggable(date, today)?;

    let previous = self
      .store
      .get_entry(date, habit_id)
      .await
      .map_err(Error::store)?;
    let evaluation =
      progress::evaluate(&habit.kind, habit_id, date, previous.as_ref(), input)?;

    let occurrence = habit.occurrence_index(date);
    let streak = habit.analytics.apply(occurrence, evaluation.completed());

    let entry = match evaluation {
      Evaluation::Keep(entry) => Some(entry),
      Evaluation::Clear => None,
    };
    if !self
      .store
      .save_progress(habit.clone(), date, entry.clone())
      .await
      .map_err(Error::store)?
    {
      return Err(Error::HabitNotFound(habit_id));
    }

    tracing::debug!(
      %habit_id,
      %date,
      occurrence,
      streak,
      completed = entry.as_ref().is_some_and(|e| e.completed),
      "progress recorded"
    );
    self
      .events
      .publish(HabitEvent::HistoryUpdated { habit_id, date });
    if habit.repeat == RepeatRule::NoRepeat {
      self
        .events
        .publish(HabitEvent::SingleTaskUpdated { habit_id });
    }

    Ok(ProgressOutcome {
      entry,
      occurrence,
      analytics: habit.analytics,
    })
  }

  /// Every day entry between `from` and `to` inclusive.
  pub async fn history(&self, from: NaiveDate, to: NaiveDate) -> Result<Vec<DayEntry>> {
    if from > to {
      return Err(Error::Validation(format!("{from} is after {to}")));
    }
    self
      .store
      .entries_between(from, to)
      .await
      .map_err(Error::store)
  }

  // ── Categories ────────────────────────────────────────────────────────

  pub async fn list_categories(&self) -> Result<Vec<Category>> {
    self.store.list_categories().await.map_err(Error::store)
  }

  pub async fn add_category(
    &self,
    name: String,
    icon: String,
    color: String,
  ) -> Result<Category> {
    let name = name.trim().to_owned();
    if name.is_empty() {
      return Err(Error::Validation("category name must not be empty".to_owned()));
    }
    let category = Category::custom(name, icon, color);
    self
      .store
      .insert_category(category.clone())
      .await
      .map_err(Error::store)?;
    tracing::info!(category_id = %category.category_id, name = %category.name, "category added");
    Ok(category)
  }

  async fn save_habit(&self, habit: &Habit) -> Result<()> {
    if self
      .store
      .update_habit(habit.clone())
      .await
      .map_err(Error::store)?
    {
      Ok(())
    } else {
      Err(Error::HabitNotFound(habit.habit_id))
    }
  }
}
