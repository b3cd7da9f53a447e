//! Handlers for `/categories` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/categories` | Stock categories first, then custom ones |
//! | `POST` | `/categories` | Body: `{"name":"Music","icon":"music","color":"plum"}` |

use std::sync::Arc;

use axum::{
  Json,
  extract::State,
  http::StatusCode,
  response::IntoResponse,
};
use cadence_core::{category::Category, store::HabitStore, tracker::Tracker};
use serde::Deserialize;

use crate::error::ApiError;

/// `GET /categories`
pub async fn list<S: HabitStore>(
  State(tracker): State<Arc<Tracker<S>>>,
) -> Result<Json<Vec<Category>>, ApiError> {
  Ok(Json(tracker.list_categories().await?))
}

#[derive(Debug, Deserialize)]
pub struct CreateBody {
  pub name:  String,
  #[serde(default = "default_icon")]
  pub icon:  String,
  #[serde(default = "default_color")]
  pub color: String,
}

fn default_icon() -> String { "apps".to_owned() }

fn default_color() -> String { "slateblue".to_owned() }

/// `POST /categories`
pub async fn create<S: HabitStore>(
  State(tracker): State<Arc<Tracker<S>>>,
  Json(body): Json<CreateBody>,
) -> Result<impl IntoResponse, ApiError> {
  let category = tracker
    .add_category(body.name, body.icon, body.color)
    .await?;
  Ok((StatusCode::CREATED, Json(category)))
}
