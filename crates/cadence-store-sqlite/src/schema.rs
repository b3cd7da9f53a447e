//! SQL schema for the Cadence SQLite store.
//!
//! Executed at connection startup. `PRAGMA user_version` records which
//! version a file was created with; stock categories are seeded only when a
//! file is initialised for the first time.

pub const SCHEMA_VERSION: i64 = 1;

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;

CREATE TABLE IF NOT EXISTS habits (
    habit_id         TEXT PRIMARY KEY,
    created_at       TEXT NOT NULL,     -- RFC 3339 UTC
    name             TEXT NOT NULL,
    description      TEXT NOT NULL DEFAULT '',
    kind             TEXT NOT NULL,     -- JSON HabitKind
    category_id      TEXT,
    repeat_rule      TEXT NOT NULL,     -- JSON RepeatRule
    start_date       TEXT NOT NULL,     -- YYYY-MM-DD
    end_date         TEXT,
    priority         INTEGER NOT NULL DEFAULT 1,
    is_task          INTEGER NOT NULL DEFAULT 0,
    archived         INTEGER NOT NULL DEFAULT 0,
    streak           INTEGER NOT NULL DEFAULT 0,
    streak_intervals TEXT NOT NULL DEFAULT '[]'  -- JSON [[start, end, count], ...]
);

CREATE TABLE IF NOT EXISTS categories (
    category_id TEXT PRIMARY KEY,
    name        TEXT NOT NULL,
    icon        TEXT NOT NULL,
    color       TEXT NOT NULL,
    is_custom   INTEGER NOT NULL
);

-- One row per habit per logged day.
CREATE TABLE IF NOT EXISTS history (
    date      TEXT NOT NULL,   -- YYYY-MM-DD
    habit_id  TEXT NOT NULL,
    progress  TEXT,            -- JSON Progress or NULL
    completed INTEGER NOT NULL,
    PRIMARY KEY (date, habit_id)
);

CREATE INDEX IF NOT EXISTS history_habit_idx ON history(habit_id);
CREATE INDEX IF NOT EXISTS habits_archived_idx ON habits(archived);
";
