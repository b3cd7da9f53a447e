//! API error type and [`axum::response::IntoResponse`] implementation.

use axum::{
  Json,
  http::StatusCode,
  response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

/// An error returned by an API handler.
#[derive(Debug, Error)]
pub enum ApiError {
  #[error("not found: {0}")]
  NotFound(String),

  #[error("bad request: {0}")]
  BadRequest(String),

  /// Well-formed request the tracker refuses, e.g. logging a future date.
  #[error("unprocessable: {0}")]
  Unprocessable(String),

  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl From<cadence_core::Error> for ApiError {
  fn from(err: cadence_core::Error) -> Self {
    use cadence_core::Error as E;
    match err {
      E::HabitNotFound(_) => Self::NotFound(err.to_string()),
      E::Validation(_) => Self::BadRequest(err.to_string()),
      E::DateBeforeStart { .. }
      | E::DateAfterEnd { .. }
      | E::DateInFuture(_)
      | E::DateNotScheduled(_)
      | E::ProgressMismatch { .. }
      | E::InvalidProgress(_) => Self::Unprocessable(err.to_string()),
      E::CorruptStreakHistory(_) | E::Serialization(_) | E::Store(_) => {
        tracing::error!(error = %err, "tracker failure");
        Self::Store(Box::new(err))
      }
    }
  }
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    let (status, message) = match &self {
      ApiError::NotFound(m) => (StatusCode::NOT_FOUND, m.clone()),
      ApiError::BadRequest(m) => (StatusCode::BAD_REQUEST, m.clone()),
      ApiError::Unprocessable(m) => (StatusCode::UNPROCESSABLE_ENTITY, m.clone()),
      ApiError::Store(e) => (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()),
    };
    (status, Json(json!({ "error": message }))).into_response()
  }
}
