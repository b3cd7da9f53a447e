//! Error types for `cadence-core`.

use chrono::NaiveDate;
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum Error {
  #[error("habit not found: {0}")]
  HabitNotFound(Uuid),

  #[error("invalid habit: {0}")]
  Validation(String),

  #[error("{date} is before the habit start date {start}")]
  DateBeforeStart { date: NaiveDate, start: NaiveDate },

  #[error("{date} is after the habit end date {end}")]
  DateAfterEnd { date: NaiveDate, end: NaiveDate },

  #[error("{0} is in the future")]
  DateInFuture(NaiveDate),

  #[error("{0} is not a scheduled day for this habit")]
  DateNotScheduled(NaiveDate),

  #[error("{input} progress cannot be logged against a {kind} habit")]
  ProgressMismatch {
    kind:  &'static str,
    input: &'static str,
  },

  #[error("invalid progress: {0}")]
  InvalidProgress(String),

  #[error("corrupt streak history: {0}")]
  CorruptStreakHistory(String),

  #[error("serialization error: {0}")]
  Serialization(#[from] serde_json::Error),

  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl Error {
  /// Box any store backend error into [`Error::Store`].
  pub fn store<E>(err: E) -> Self
  where
    E: std::error::Error + Send + Sync + 'static,
  {
    Self::Store(Box::new(err))
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
