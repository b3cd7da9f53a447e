//! Handler for `GET /history?from=YYYY-MM-DD&to=YYYY-MM-DD`.

use std::sync::Arc;

use axum::{
  Json,
  extract::{Query, State},
};
use cadence_core::{progress::DayEntry, store::HabitStore, tracker::Tracker};
use chrono::NaiveDate;
use serde::Deserialize;

use crate::error::ApiError;

#[derive(Debug, Deserialize)]
pub struct HistoryParams {
  pub from: NaiveDate,
  pub to:   NaiveDate,
}

pub async fn handler<S: HabitStore>(
  State(tracker): State<Arc<Tracker<S>>>,
  Query(params): Query<HistoryParams>,
) -> Result<Json<Vec<DayEntry>>, ApiError> {
  Ok(Json(tracker.history(params.from, params.to).await?))
}
