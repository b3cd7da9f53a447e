//! HTTP server for Cadence.
//!
//! Mounts the JSON API from `cadence-api` under `/api`, guarded by HTTP Basic
//! auth, and logs every request and tracker event through `tracing`.

pub mod auth;
pub mod error;

pub use error::Error;

use std::{
  path::{Path, PathBuf},
  sync::Arc,
};

use axum::{Router, middleware, routing::get};
use cadence_core::{events::EventBus, store::HabitStore, tracker::Tracker};
use serde::Deserialize;
use tokio::{sync::broadcast::error::RecvError, task::JoinHandle};
use tower_http::trace::TraceLayer;

use auth::{AuthConfig, require_auth};

// ─── Configuration ───────────────────────────────────────────────────────────

fn default_host() -> String { "127.0.0.1".to_string() }

fn default_port() -> u16 { 7420 }

/// Runtime server configuration, deserialised from `cadence.toml` and
/// `CADENCE_*` environment variables.
#[derive(Deserialize, Clone)]
pub struct ServerConfig {
  #[serde(default = "default_host")]
  pub host:               String,
  #[serde(default = "default_port")]
  pub port:               u16,
  pub store_path:         PathBuf,
  pub auth_username:      String,
  pub auth_password_hash: String,
}

impl ServerConfig {
  /// Read the TOML file at `path`, if it exists, with `CADENCE_*` environment
  /// variables layered on top.
  pub fn load(path: &Path) -> Result<Self, config::ConfigError> {
    config::Config::builder()
      .add_source(config::File::from(path).required(false))
      .add_source(config::Environment::with_prefix("CADENCE"))
      .build()?
      .try_deserialize()
  }
}

// ─── Application state ───────────────────────────────────────────────────────

pub struct AppState<S> {
  pub tracker: Arc<Tracker<S>>,
  pub auth:    Arc<AuthConfig>,
}

impl<S> Clone for AppState<S> {
  fn clone(&self) -> Self {
    Self {
      tracker: self.tracker.clone(),
      auth:    self.auth.clone(),
    }
  }
}

// ─── Router ──────────────────────────────────────────────────────────────────

/// Build the server's axum [`Router`].
pub fn router<S>(state: AppState<S>) -> Router
where
  S: HabitStore + 'static,
{
  let api = cadence_api::api_router(state.tracker)
    .route_layer(middleware::from_fn_with_state(state.auth, require_auth));

  Router::new()
    .route("/health", get(|| async { "ok" }))
    .nest("/api", api)
    .layer(TraceLayer::new_for_http())
}

// ─── Event log ───────────────────────────────────────────────────────────────

/// Log every event published on `events` until the bus is dropped.
pub fn spawn_event_logger(events: &EventBus) -> JoinHandle<()> {
  let mut rx = events.subscribe();
  tokio::spawn(async move {
    loop {
      match rx.recv().await {
        Ok(event) => tracing::info!(?event, "habit event"),
        Err(RecvError::Lagged(skipped)) => {
          tracing::warn!(skipped, "event logger fell behind");
        }
        Err(RecvError::Closed) => break,
      }
    }
  })
}

// ─── Integration tests ───────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
  use super::*;

  use axum::{
    body::Body,
    http::{Request, StatusCode, header},
  };
  use base64::Engine as _;
  use base64::engine::general_purpose::STANDARD as B64;
  use cadence_store_sqlite::SqliteStore;
  use serde_json::json;
  use tower::ServiceExt as _;

  async fn make_state(password: &str) -> AppState<SqliteStore> {
    let store = SqliteStore::open_in_memory().await.unwrap();
    AppState {
      tracker: Arc::new(Tracker::new(store)),
      auth:    Arc::new(AuthConfig {
        username:      "user".to_string(),
        password_hash: auth::hash_password(password).unwrap(),
      }),
    }
  }

  fn auth_header(user: &str, pass: &str) -> String {
    format!("Basic {}", B64.encode(format!("{user}:{pass}")))
  }

  async fn oneshot(
    state: AppState<SqliteStore>,
    method: &str,
    uri: &str,
    auth: Option<&str>,
    body: Option<serde_json::Value>,
  ) -> axum::response::Response {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(auth) = auth {
      builder = builder.header(header::AUTHORIZATION, auth);
    }
    let body = match body {
      Some(v) => {
        builder = builder.header(header::CONTENT_TYPE, "application/json");
        Body::from(v.to_string())
      }
      None => Body::empty(),
    };
    router(state).oneshot(builder.body(body).unwrap()).await.unwrap()
  }

  #[tokio::test]
  async fn health_needs_no_auth() {
    let state = make_state("secret").await;
    let resp = oneshot(state, "GET", "/health", None, None).await;
    assert_eq!(resp.status(), StatusCode::OK);
  }

  #[tokio::test]
  async fn api_without_credentials_is_401() {
    let state = make_state("secret").await;
    let resp = oneshot(state, "GET", "/api/habits", None, None).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    let challenge = resp.headers().get(header::WWW_AUTHENTICATE).unwrap();
    assert!(challenge.to_str().unwrap().starts_with("Basic"));
  }

  #[tokio::test]
  async fn api_with_wrong_password_is_401() {
    let state = make_state("secret").await;
    let auth = auth_header("user", "nope");
    let resp = oneshot(state, "GET", "/api/habits", Some(&auth), None).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
  }

  #[tokio::test]
  async fn authenticated_create_and_list() {
    let state = make_state("secret").await;
    let auth = auth_header("user", "secret");

    let resp = oneshot(
      state.clone(),
      "POST",
      "/api/habits",
      Some(&auth),
      Some(json!({
        "name": "Meditate",
        "kind": { "type": "timer", "goal_seconds": 600 },
        "repeat": { "type": "every_day" },
        "start_date": "2024-01-01",
      })),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::CREATED);

    let resp = oneshot(state, "GET", "/api/habits", Some(&auth), None).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    let habits: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(habits[0]["name"], "Meditate");
    assert_eq!(habits[0]["kind"]["comparison"], "at_least");
  }

  #[tokio::test]
  async fn api_writes_publish_events() {
    let state = make_state("secret").await;
    let mut rx = state.tracker.events().subscribe();
    let logger = spawn_event_logger(state.tracker.events());

    let auth = auth_header("user", "secret");
    let resp = oneshot(
      state,
      "POST",
      "/api/habits",
      Some(&auth),
      Some(json!({
        "name": "Journal",
        "kind": { "type": "yes_or_no" },
        "repeat": { "type": "every_day" },
        "start_date": "2024-01-01",
      })),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::CREATED);

    let event = rx.recv().await.unwrap();
    assert!(matches!(
      event,
      cadence_core::events::HabitEvent::HabitAdded { .. }
    ));
    logger.abort();
  }

  #[test]
  fn config_file_fills_in_defaults() {
    let path = std::env::temp_dir().join(format!("cadence-config-{}.toml", std::process::id()));
    std::fs::write(
      &path,
      "store_path = \"/var/lib/cadence/habits.db\"\n\
       auth_username = \"me\"\n\
       auth_password_hash = \"$argon2id$stub\"\n",
    )
    .unwrap();

    let cfg = ServerConfig::load(&path).unwrap();
    std::fs::remove_file(&path).ok();

    assert_eq!(cfg.host, "127.0.0.1");
    assert_eq!(cfg.port, 7420);
    assert_eq!(cfg.store_path, PathBuf::from("/var/lib/cadence/habits.db"));
    assert_eq!(cfg.auth_username, "me");
  }

  #[test]
  fn missing_required_settings_are_an_error() {
    let path = std::env::temp_dir().join(format!("cadence-empty-{}.toml", std::process::id()));
    std::fs::write(&path, "port = 9000\n").unwrap();
    let result = ServerConfig::load(&path);
    std::fs::remove_file(&path).ok();
    assert!(result.is_err());
  }
}
