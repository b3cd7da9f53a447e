//! Async HTTP client wrapping the Cadence JSON API.

use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use cadence_core::{
  category::Category,
  habit::{Habit, NewHabit},
  progress::{DayEntry, ProgressInput},
  streak::StreakHistory,
  tracker::ProgressOutcome,
};
use chrono::NaiveDate;
use reqwest::{Client, Response};
use serde::{Deserialize, de::DeserializeOwned};
use serde_json::json;
use uuid::Uuid;

/// Connection settings for the Cadence API.
#[derive(Debug, Clone)]
pub struct ApiConfig {
  pub base_url: String,
  pub username: String,
  pub password: String,
}

/// Async HTTP client for the Cadence JSON REST API.
#[derive(Clone)]
pub struct ApiClient {
  client: Client,
  config: ApiConfig,
}

/// The `{"error": "..."}` body the server sends with failures.
#[derive(Deserialize)]
struct ErrorBody {
  error: String,
}

/// Turn a non-2xx response into an error naming the request and the server's
/// message.
async fn check(resp: Response, what: &str) -> Result<Response> {
  let status = resp.status();
  if status.is_success() {
    return Ok(resp);
  }
  let message = resp
    .json::<ErrorBody>()
    .await
    .map(|b| b.error)
    .unwrap_or_default();
  if message.is_empty() {
    Err(anyhow!("{what} → {status}"))
  } else {
    Err(anyhow!("{what} → {status}: {message}"))
  }
}

impl ApiClient {
  pub fn new(config: ApiConfig) -> Result<Self> {
    let client = Client::builder()
      .timeout(Duration::from_secs(30))
      .build()
      .context("failed to build HTTP client")?;
    Ok(Self { client, config })
  }

  fn url(&self, path: &str) -> String {
    format!("{}/api{}", self.config.base_url.trim_end_matches('/'), path)
  }

  fn auth(&self, req: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
    if self.config.username.is_empty() {
      req
    } else {
      req.basic_auth(&self.config.username, Some(&self.config.password))
    }
  }

  async fn get<T: DeserializeOwned>(&self, path: &str, query: &[(&str, String)]) -> Result<T> {
    let what = format!("GET {path}");
    let resp = self
      .auth(self.client.get(self.url(path)))
      .query(query)
      .send()
      .await
      .with_context(|| format!("{what} failed"))?;
    check(resp, &what)
      .await?
      .json()
      .await
      .with_context(|| format!("deserialising {path}"))
  }

  async fn post<T: DeserializeOwned>(&self, path: &str, body: serde_json::Value) -> Result<T> {
    let what = format!("POST {path}");
    let resp = self
      .auth(self.client.post(self.url(path)))
      .json(&body)
      .send()
      .await
      .with_context(|| format!("{what} failed"))?;
    check(resp, &what)
      .await?
      .json()
      .await
      .with_context(|| format!("deserialising {path}"))
  }

  // ── Habits ────────────────────────────────────────────────────────────────

  /// `GET /api/habits`
  pub async fn list_habits(&self, archived: bool, tasks: Option<bool>) -> Result<Vec<Habit>> {
    let mut query = vec![("archived", archived.to_string())];
    if let Some(tasks) = tasks {
      query.push(("is_task", tasks.to_string()));
    }
    self.get("/habits", &query).await
  }

  /// `POST /api/habits`
  pub async fn create_habit(&self, habit: &NewHabit) -> Result<Habit> {
    self.post("/habits", serde_json::to_value(habit)?).await
  }

  /// `DELETE /api/habits/{id}`
  pub async fn delete_habit(&self, id: Uuid) -> Result<()> {
    let what = format!("DELETE /habits/{id}");
    let resp = self
      .auth(self.client.delete(self.url(&format!("/habits/{id}"))))
      .send()
      .await
      .with_context(|| format!("{what} failed"))?;
    check(resp, &what).await?;
    Ok(())
  }

  /// `POST /api/habits/{id}/archive` or `/unarchive`
  pub async fn set_archived(&self, id: Uuid, archived: bool) -> Result<Habit> {
    let action = if archived { "archive" } else { "unarchive" };
    self
      .post(&format!("/habits/{id}/{action}"), json!({}))
      .await
  }

  /// `POST /api/habits/{id}/progress`
  pub async fn record_progress(
    &self,
    id: Uuid,
    date: NaiveDate,
    input: ProgressInput,
  ) -> Result<ProgressOutcome> {
    self
      .post(
        &format!("/habits/{id}/progress"),
        json!({ "date": date, "input": input }),
      )
      .await
  }

  /// `GET /api/habits/{id}/streak`
  pub async fn streak(&self, id: Uuid) -> Result<StreakHistory> {
    self.get(&format!("/habits/{id}/streak"), &[]).await
  }

  // ── History & categories ──────────────────────────────────────────────────

  /// `GET /api/history?from=..&to=..`
  pub async fn history(&self, from: NaiveDate, to: NaiveDate) -> Result<Vec<DayEntry>> {
    self
      .get("/history", &[("from", from.to_string()), ("to", to.to_string())])
      .await
  }

  /// `GET /api/categories`
  pub async fn list_categories(&self) -> Result<Vec<Category>> {
    self.get("/categories", &[]).await
  }

  /// `POST /api/categories`
  pub async fn add_category(&self, name: &str, icon: &str, color: &str) -> Result<Category> {
    self
      .post(
        "/categories",
        json!({ "name": name, "icon": icon, "color": color }),
      )
      .await
  }
}
