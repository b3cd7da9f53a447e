//! [`SqliteStore`], the SQLite implementation of [`HabitStore`].

use std::path::Path;

use cadence_core::{
  category::{Category, stock_categories},
  habit::Habit,
  progress::DayEntry,
  store::{HabitQuery, HabitStore},
};
use chrono::NaiveDate;
use rusqlite::OptionalExtension as _;
use uuid::Uuid;

use crate::{
  Error, Result,
  encode::{RawCategory, RawEntry, RawHabit, encode_date, encode_uuid},
  schema::{SCHEMA, SCHEMA_VERSION},
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// A Cadence habit store backed by a single SQLite file.
///
/// Cloning is cheap; the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  pub(crate) conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store; useful for testing.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    let stock: Vec<RawCategory> = stock_categories()
      .into_iter()
      .map(RawCategory::from_category)
      .collect();

    let version: i64 = self
      .conn
      .call(move |conn| {
        let version: i64 =
          conn.query_row("PRAGMA user_version", [], |r| r.get(0))?;
        if version > SCHEMA_VERSION {
          return Ok(version);
        }
        conn.execute_batch(SCHEMA)?;
        if version == 0 {
          let tx = conn.transaction()?;
          for c in &stock {
            tx.execute(
              "INSERT INTO categories (category_id, name, icon, color, is_custom)
               VALUES (?1, ?2, ?3, ?4, ?5)",
              rusqlite::params![c.category_id, c.name, c.icon, c.color, c.is_custom],
            )?;
          }
          tx.pragma_update(None, "user_version", SCHEMA_VERSION)?;
          tx.commit()?;
        }
        Ok(version)
      })
      .await?;

    if version > SCHEMA_VERSION {
      return Err(Error::UnsupportedSchema(version));
    }
    if version == 0 {
      tracing::info!("initialised new habit database");
    }
    Ok(())
  }
}

// ─── HabitStore impl ─────────────────────────────────────────────────────────

impl HabitStore for SqliteStore {
  type Error = Error;

  // ── Habits ────────────────────────────────────────────────────────────────

  async fn insert_habit(&self, habit: Habit) -> Result<()> {
    let raw = RawHabit::from_habit(&habit)?;

    self
      .conn
      .call(move |conn| {
        conn.execute(
          &format!(
            "INSERT INTO habits ({}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)",
            RawHabit::COLUMNS
          ),
          rusqlite::params![
            raw.habit_id,
            raw.created_at,
            raw.name,
            raw.description,
            raw.kind,
            raw.category_id,
            raw.repeat_rule,
            raw.start_date,
            raw.end_date,
            raw.priority,
            raw.is_task,
            raw.archived,
            raw.streak,
            raw.streak_intervals,
          ],
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn get_habit(&self, id: Uuid) -> Result<Option<Habit>> {
    let id_str = encode_uuid(id);

    let raw: Option<RawHabit> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!("SELECT {} FROM habits WHERE habit_id = ?1", RawHabit::COLUMNS),
              rusqlite::params![id_str],
              RawHabit::from_row,
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawHabit::into_habit).transpose()
  }

  async fn update_habit(&self, habit: Habit) -> Result<bool> {
    let raw = RawHabit::from_habit(&habit)?;
    let changed = self
      .conn
      .call(move |conn| Ok(update_habit_row(conn, &raw)?))
      .await?;
    Ok(changed > 0)
  }

  async fn remove_habit(&self, id: Uuid) -> Result<bool> {
    let id_str = encode_uuid(id);
    let changed = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "DELETE FROM habits WHERE habit_id = ?1",
          rusqlite::params![id_str],
        )?)
      })
      .await?;
    Ok(changed > 0)
  }

  async fn find_habits<'a>(&'a self, query: &'a HabitQuery) -> Result<Vec<Habit>> {
    let archived = query.archived;
    let is_task = query.is_task;
    let category = query.category_id.map(encode_uuid);

    let raws: Vec<RawHabit> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {} FROM habits
           WHERE (?1 IS NULL OR archived = ?1)
             AND (?2 IS NULL OR is_task = ?2)
             AND (?3 IS NULL OR category_id = ?3)",
          RawHabit::COLUMNS
        ))?;
        let rows = stmt
          .query_map(
            rusqlite::params![archived, is_task, category],
            RawHabit::from_row,
          )?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawHabit::into_habit).collect()
  }

  // ── Categories ────────────────────────────────────────────────────────────

  async fn insert_category(&self, category: Category) -> Result<()> {
    let raw = RawCategory::from_category(category);
    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO categories (category_id, name, icon, color, is_custom)
           VALUES (?1, ?2, ?3, ?4, ?5)",
          rusqlite::params![raw.category_id, raw.name, raw.icon, raw.color, raw.is_custom],
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn list_categories(&self) -> Result<Vec<Category>> {
    let raws: Vec<RawCategory> = self
      .conn
      .call(|conn| {
        let mut stmt = conn.prepare(
          "SELECT category_id, name, icon, color, is_custom FROM categories
           ORDER BY is_custom, rowid",
        )?;
        let rows = stmt
          .query_map([], |row| {
            Ok(RawCategory {
              category_id: row.get(0)?,
              name:        row.get(1)?,
              icon:        row.get(2)?,
              color:       row.get(3)?,
              is_custom:   row.get(4)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawCategory::into_category).collect()
  }

  // ── History ───────────────────────────────────────────────────────────────

  async fn get_entry(&self, date: NaiveDate, habit_id: Uuid) -> Result<Option<DayEntry>> {
    let date_str = encode_date(date);
    let id_str = encode_uuid(habit_id);

    let raw: Option<RawEntry> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              "SELECT date, habit_id, progress, completed FROM history
               WHERE date = ?1 AND habit_id = ?2",
              rusqlite::params![date_str, id_str],
              raw_entry,
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawEntry::into_entry).transpose()
  }

  async fn put_entry(&self, entry: DayEntry) -> Result<()> {
    let raw = RawEntry::from_entry(&entry)?;
    self
      .conn
      .call(move |conn| Ok(upsert_entry_row(conn, &raw)?))
      .await?;
    Ok(())
  }

  async fn remove_entry(&self, date: NaiveDate, habit_id: Uuid) -> Result<bool> {
    let date_str = encode_date(date);
    let id_str = encode_uuid(habit_id);
    let changed = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "DELETE FROM history WHERE date = ?1 AND habit_id = ?2",
          rusqlite::params![date_str, id_str],
        )?)
      })
      .await?;
    Ok(changed > 0)
  }

  async fn save_progress(
    &self,
    habit: Habit,
    date: NaiveDate,
    entry: Option<DayEntry>,
  ) -> Result<bool> {
    let raw_habit = RawHabit::from_habit(&habit)?;
    let raw_entry = entry.as_ref().map(RawEntry::from_entry).transpose()?;
    let date_str = encode_date(date);

    let saved = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        // Dropping `tx` without committing rolls it back.
        if update_habit_row(&tx, &raw_habit)? == 0 {
          return Ok(false);
        }
        match raw_entry {
          Some(raw) => upsert_entry_row(&tx, &raw)?,
          None => tx.execute(
            "DELETE FROM history WHERE date = ?1 AND habit_id = ?2",
            rusqlite::params![date_str, raw_habit.habit_id],
          )?,
        };
        tx.commit()?;
        Ok(true)
      })
      .await?;
    Ok(saved)
  }

  async fn entries_between(&self, from: NaiveDate, to: NaiveDate) -> Result<Vec<DayEntry>> {
    let from_str = encode_date(from);
    let to_str = encode_date(to);

    let raws: Vec<RawEntry> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT date, habit_id, progress, completed FROM history
           WHERE date BETWEEN ?1 AND ?2
           ORDER BY date, habit_id",
        )?;
        let rows = stmt
          .query_map(rusqlite::params![from_str, to_str], raw_entry)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawEntry::into_entry).collect()
  }

  async fn remove_entries_for(&self, habit_id: Uuid) -> Result<usize> {
    let id_str = encode_uuid(habit_id);
    let removed = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "DELETE FROM history WHERE habit_id = ?1",
          rusqlite::params![id_str],
        )?)
      })
      .await?;
    Ok(removed)
  }
}

fn update_habit_row(conn: &rusqlite::Connection, raw: &RawHabit) -> rusqlite::Result<usize> {
  conn.execute(
    "UPDATE habits SET
       name = ?2, description = ?3, kind = ?4, category_id = ?5,
       repeat_rule = ?6, start_date = ?7, end_date = ?8, priority = ?9,
       is_task = ?10, archived = ?11, streak = ?12, streak_intervals = ?13
     WHERE habit_id = ?1",
    rusqlite::params![
      raw.habit_id,
      raw.name,
      raw.description,
      raw.kind,
      raw.category_id,
      raw.repeat_rule,
      raw.start_date,
      raw.end_date,
      raw.priority,
      raw.is_task,
      raw.archived,
      raw.streak,
      raw.streak_intervals,
    ],
  )
}

fn upsert_entry_row(conn: &rusqlite::Connection, raw: &RawEntry) -> rusqlite::Result<usize> {
  conn.execute(
    "INSERT INTO history (date, habit_id, progress, completed)
     VALUES (?1, ?2, ?3, ?4)
     ON CONFLICT (date, habit_id) DO UPDATE SET
       progress  = excluded.progress,
       completed = excluded.completed",
    rusqlite::params![raw.date, raw.habit_id, raw.progress, raw.completed],
  )
}

fn raw_entry(row: &rusqlite::Row<'_>) -> rusqlite::Result<RawEntry> {
  Ok(RawEntry {
    date:      row.get(0)?,
    habit_id:  row.get(1)?,
    progress:  row.get(2)?,
    completed: row.get(3)?,
  })
}
