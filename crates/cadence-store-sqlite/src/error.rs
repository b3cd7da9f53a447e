//! Error type for `cadence-store-sqlite`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  /// A stored row decoded into something the core types reject, e.g.
  /// overlapping streak intervals.
  #[error("core error: {0}")]
  Core(#[from] cadence_core::Error),

  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("json error: {0}")]
  Json(#[from] serde_json::Error),

  #[error("uuid parse error: {0}")]
  Uuid(#[from] uuid::Error),

  #[error("date/time parse error: {0}")]
  DateParse(String),

  #[error("schema version {0} is newer than this build supports")]
  UnsupportedSchema(i64),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
