//! An in-process [`HabitStore`], used by tests and by anything that doesn't
//! need durability.

use std::{
  collections::{BTreeMap, HashMap},
  convert::Infallible,
  sync::Arc,
};

use chrono::NaiveDate;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::{
  category::{Category, stock_categories},
  habit::Habit,
  progress::DayEntry,
  store::{HabitQuery, HabitStore},
};

#[derive(Debug, Default)]
struct Inner {
  habits:     HashMap<Uuid, Habit>,
  categories: Vec<Category>,
  history:    BTreeMap<(NaiveDate, Uuid), DayEntry>,
}

/// Cheaply cloneable; clones share the same data.
#[derive(Debug, Clone)]
pub struct MemoryStore {
  inner: Arc<RwLock<Inner>>,
}

impl MemoryStore {
  /// An empty store seeded with the stock categories.
  pub fn new() -> Self {
    let inner = Inner {
      categories: stock_categories(),
      ..Inner::default()
    };
    Self {
      inner: Arc::new(RwLock::new(inner)),
    }
  }
}

impl Default for MemoryStore {
  fn default() -> Self { Self::new() }
}

impl HabitStore for MemoryStore {
  type Error = Infallible;

  async fn insert_habit(&self, habit: Habit) -> Result<(), Self::Error> {
    self.inner.write().await.habits.insert(habit.habit_id, habit);
    Ok(())
  }

  async fn get_habit(&self, id: Uuid) -> Result<Option<Habit>, Self::Error> {
    Ok(self.inner.read().await.habits.get(&id).cloned())
  }

  async fn update_habit(&self, habit: Habit) -> Result<bool, Self::Error> {
    let mut inner = self.inner.write().await;
    match inner.habits.get_mut(&habit.habit_id) {
      Some(slot) => {
        *slot = habit;
        Ok(true)
      }
      None => Ok(false),
    }
  }

  async fn remove_habit(&self, id: Uuid) -> Result<bool, Self::Error> {
    Ok(self.inner.write().await.habits.remove(&id).is_some())
  }

  async fn find_habits<'a>(
    &'a self,
    query: &'a HabitQuery,
  ) -> Result<Vec<Habit>, Self::Error> {
    let inner = self.inner.read().await;
    Ok(
      inner
        .habits
        .values()
        .filter(|h| query.matches(h))
        .cloned()
        .collect(),
    )
  }

  async fn insert_category(&self, category: Category) -> Result<(), Self::Error> {
    self.inner.write().await.categories.push(category);
    Ok(())
  }

  async fn list_categories(&self) -> Result<Vec<Category>, Self::Error> {
    Ok(self.inner.read().await.categories.clone())
  }

  async fn get_entry(
    &self,
    date: NaiveDate,
    habit_id: Uuid,
  ) -> Result<Option<DayEntry>, Self::Error> {
    Ok(self.inner.read().await.history.get(&(date, habit_id)).cloned())
  }

  async fn put_entry(&self, entry: DayEntry) -> Result<(), Self::Error> {
    self
      .inner
      .write()
      .await
      .history
      .insert((entry.date, entry.habit_id), entry);
    Ok(())
  }

  async fn remove_entry(
    &self,
    date: NaiveDate,
    habit_id: Uuid,
  ) -> Result<bool, Self::Error> {
    Ok(
      self
        .inner
        .write()
        .await
        .history
        .remove(&(date, habit_id))
        .is_some(),
    )
  }

  async fn save_progress(
    &self,
    habit: Habit,
    date: NaiveDate,
    entry: Option<DayEntry>,
  ) -> Result<bool, Self::Error> {
    let mut inner = self.inner.write().await;
    let habit_id = habit.habit_id;
    match inner.habits.get_mut(&habit_id) {
      Some(slot) => *slot = habit,
      None => return Ok(false),
    }
    match entry {
      Some(entry) => {
        inner.history.insert((date, habit_id), entry);
      }
      None => {
        inner.history.remove(&(date, habit_id));
      }
    }
    Ok(true)
  }

  async fn entries_between(
    &self,
    from: NaiveDate,
    to: NaiveDate,
  ) -> Result<Vec<DayEntry>, Self::Error> {
    let inner = self.inner.read().await;
    Ok(
      inner
        .history
        .range((from, Uuid::nil())..)
        .take_while(|((date, _), _)| *date <= to)
        .map(|(_, entry)| entry.clone())
        .collect(),
    )
  }

  async fn remove_entries_for(&self, habit_id: Uuid) -> Result<usize, Self::Error> {
    let mut inner = self.inner.write().await;
    let before = inner.history.len();
    inner.history.retain(|(_, id), _| *id != habit_id);
    Ok(before - inner.history.len())
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::habit::NewHabit;

  fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
  }

  fn entry(date: NaiveDate, habit_id: Uuid) -> DayEntry {
    DayEntry {
      date,
      habit_id,
      progress: None,
      completed: true,
    }
  }

  #[tokio::test]
  async fn seeded_with_stock_categories() {
    let store = MemoryStore::new();
    let cats = store.list_categories().await.unwrap();
    assert_eq!(cats.len(), 15);
    assert!(cats.iter().all(|c| !c.is_custom));
  }

  #[tokio::test]
  async fn find_habits_filters() {
    let store = MemoryStore::new();
    let mut a = NewHabit::daily("Read", date(2024, 1, 1)).into_habit().unwrap();
    a.archived = true;
    let b = NewHabit::daily("Walk", date(2024, 1, 1)).into_habit().unwrap();
    store.insert_habit(a.clone()).await.unwrap();
    store.insert_habit(b.clone()).await.unwrap();

    let active = store.find_habits(&HabitQuery::active()).await.unwrap();
    assert_eq!(active, vec![b]);
    let all = store.find_habits(&HabitQuery::default()).await.unwrap();
    assert_eq!(all.len(), 2);
  }

  #[tokio::test]
  async fn save_progress_writes_habit_and_entry_together() {
    let store = MemoryStore::new();
    let mut habit = NewHabit::daily("Read", date(2024, 1, 1)).into_habit().unwrap();
    let day = date(2024, 1, 2);

    assert!(
      !store
        .save_progress(habit.clone(), day, Some(entry(day, habit.habit_id)))
        .await
        .unwrap()
    );
    assert!(store.get_entry(day, habit.habit_id).await.unwrap().is_none());

    store.insert_habit(habit.clone()).await.unwrap();
    habit.analytics.apply(2, true);
    assert!(
      store
        .save_progress(habit.clone(), day, Some(entry(day, habit.habit_id)))
        .await
        .unwrap()
    );
    let stored = store.get_habit(habit.habit_id).await.unwrap().unwrap();
    assert_eq!(stored.analytics.streak(), 1);
    assert!(store.get_entry(day, habit.habit_id).await.unwrap().is_some());

    habit.analytics.apply(2, false);
    assert!(store.save_progress(habit.clone(), day, None).await.unwrap());
    assert!(store.get_entry(day, habit.habit_id).await.unwrap().is_none());
  }

  #[tokio::test]
  async fn history_range_and_removal() {
    let store = MemoryStore::new();
    let (h1, h2) = (Uuid::new_v4(), Uuid::new_v4());
    for d in 1..=5 {
      store.put_entry(entry(date(2024, 3, d), h1)).await.unwrap();
    }
    store.put_entry(entry(date(2024, 3, 2), h2)).await.unwrap();

    let range = store
      .entries_between(date(2024, 3, 2), date(2024, 3, 4))
      .await
      .unwrap();
    assert_eq!(range.len(), 4);
    assert!(range.windows(2).all(|w| w[0].date <= w[1].date));

    assert!(store.remove_entry(date(2024, 3, 5), h1).await.unwrap());
    assert!(!store.remove_entry(date(2024, 3, 5), h1).await.unwrap());
    assert_eq!(store.remove_entries_for(h1).await.unwrap(), 4);
    assert!(store.get_entry(date(2024, 3, 2), h2).await.unwrap().is_some());
  }
}
