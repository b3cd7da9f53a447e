//! JSON REST API for Cadence.
//!
//! Exposes an axum [`Router`] backed by a [`Tracker`] over any
//! [`cadence_core::store::HabitStore`]. Auth, TLS, and transport concerns are
//! the caller's responsibility.
//!
//! # Mounting
//!
//! ```rust,ignore
//! .nest("/api", cadence_api::api_router(tracker.clone()))
//! ```

pub mod categories;
pub mod error;
pub mod habits;
pub mod history;

use std::sync::Arc;

use axum::{
  Router,
  routing::{get, post},
};
use cadence_core::{store::HabitStore, tracker::Tracker};

pub use error::ApiError;

/// Build a fully-materialised API router for `tracker`.
///
/// The returned `Router<()>` can be nested into any parent router regardless
/// of its own state type.
pub fn api_router<S>(tracker: Arc<Tracker<S>>) -> Router<()>
where
  S: HabitStore + 'static,
{
  Router::new()
    // Habits
    .route("/habits", get(habits::list::<S>).post(habits::create::<S>))
    .route(
      "/habits/{id}",
      get(habits::get_one::<S>).delete(habits::delete_one::<S>),
    )
    .route("/habits/{id}/archive", post(habits::archive::<S>))
    .route("/habits/{id}/unarchive", post(habits::unarchive::<S>))
    .route("/habits/{id}/progress", post(habits::progress::<S>))
    .route("/habits/{id}/streak", get(habits::streak::<S>))
    // History
    .route("/history", get(history::handler::<S>))
    // Categories
    .route(
      "/categories",
      get(categories::list::<S>).post(categories::create::<S>),
    )
    .with_state(tracker)
}
