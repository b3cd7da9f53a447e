//! Handlers for `/habits` endpoints.
//!
//! | Method   | Path | Notes |
//! |----------|------|-------|
//! | `GET`    | `/habits` | Optional `?archived`, `?is_task`, `?category_id`; unarchived by default |
//! | `POST`   | `/habits` | Body: [`NewHabit`]; returns 201 + stored habit |
//! | `GET`    | `/habits/{id}` | 404 if not found |
//! | `DELETE` | `/habits/{id}` | 204; also drops the habit's history |
//! | `POST`   | `/habits/{id}/archive` | |
//! | `POST`   | `/habits/{id}/unarchive` | |
//! | `POST`   | `/habits/{id}/progress` | Body: `{"date":"2024-01-05","input":{"type":"toggle"}}` |
//! | `GET`    | `/habits/{id}/streak` | Streak and interval history |

use std::sync::Arc;

use axum::{
  Json,
  extract::{Path, Query, State},
  http::StatusCode,
  response::IntoResponse,
};
use cadence_core::{
  habit::{Habit, NewHabit},
  progress::ProgressInput,
  store::{HabitQuery, HabitStore},
  streak::StreakHistory,
  tracker::{ProgressOutcome, Tracker},
};
use chrono::{Local, NaiveDate};
use serde::Deserialize;
use uuid::Uuid;

use crate::error::ApiError;

// ─── List ────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct ListParams {
  /// `true` lists only archived habits. Defaults to `false`.
  pub archived:    Option<bool>,
  pub is_task:     Option<bool>,
  pub category_id: Option<Uuid>,
}

/// `GET /habits[?archived=..][&is_task=..][&category_id=..]`
pub async fn list<S: HabitStore>(
  State(tracker): State<Arc<Tracker<S>>>,
  Query(params): Query<ListParams>,
) -> Result<Json<Vec<Habit>>, ApiError> {
  let query = HabitQuery {
    archived:    Some(params.archived.unwrap_or(false)),
    is_task:     params.is_task,
    category_id: params.category_id,
  };
  Ok(Json(tracker.list_habits(&query).await?))
}

// ─── Create ──────────────────────────────────────────────────────────────────

/// `POST /habits`
pub async fn create<S: HabitStore>(
  State(tracker): State<Arc<Tracker<S>>>,
  Json(body): Json<NewHabit>,
) -> Result<impl IntoResponse, ApiError> {
  let habit = tracker.create_habit(body).await?;
  Ok((StatusCode::CREATED, Json(habit)))
}

// ─── Single habit ────────────────────────────────────────────────────────────

/// `GET /habits/{id}`
pub async fn get_one<S: HabitStore>(
  State(tracker): State<Arc<Tracker<S>>>,
  Path(id): Path<Uuid>,
) -> Result<Json<Habit>, ApiError> {
  Ok(Json(tracker.get_habit(id).await?))
}

/// `DELETE /habits/{id}`
pub async fn delete_one<S: HabitStore>(
  State(tracker): State<Arc<Tracker<S>>>,
  Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
  tracker.delete_habit(id).await?;
  Ok(StatusCode::NO_CONTENT)
}

/// `POST /habits/{id}/archive`
pub async fn archive<S: HabitStore>(
  State(tracker): State<Arc<Tracker<S>>>,
  Path(id): Path<Uuid>,
) -> Result<Json<Habit>, ApiError> {
  Ok(Json(tracker.set_archived(id, true).await?))
}

/// `POST /habits/{id}/unarchive`
pub async fn unarchive<S: HabitStore>(
  State(tracker): State<Arc<Tracker<S>>>,
  Path(id): Path<Uuid>,
) -> Result<Json<Habit>, ApiError> {
  Ok(Json(tracker.set_archived(id, false).await?))
}

/// `GET /habits/{id}/streak`
pub async fn streak<S: HabitStore>(
  State(tracker): State<Arc<Tracker<S>>>,
  Path(id): Path<Uuid>,
) -> Result<Json<StreakHistory>, ApiError> {
  Ok(Json(tracker.streak(id).await?))
}

// ─── Progress ────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct ProgressBody {
  pub date:  NaiveDate,
  pub input: ProgressInput,
}

/// `POST /habits/{id}/progress`
///
/// "Today" is the server's local date; anything later is rejected.
pub async fn progress<S: HabitStore>(
  State(tracker): State<Arc<Tracker<S>>>,
  Path(id): Path<Uuid>,
  Json(body): Json<ProgressBody>,
) -> Result<Json<ProgressOutcome>, ApiError> {
  let today = Local::now().date_naive();
  let outcome = tracker
    .record_progress(id, body.date, body.input, today)
    .await?;
  Ok(Json(outcome))
}
