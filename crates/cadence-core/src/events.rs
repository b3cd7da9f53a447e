//! Change notifications published by the [`crate::tracker::Tracker`].
//!
//! Any number of listeners may [`EventBus::subscribe`]; a listener that falls
//! behind loses the oldest events (see [`tokio::sync::broadcast`]).

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum HabitEvent {
  HabitAdded { habit_id: Uuid },
  HabitUpdated { habit_id: Uuid },
  HabitRemoved { habit_id: Uuid },
  HistoryUpdated { habit_id: Uuid, date: NaiveDate },
  /// Progress was logged against a one-off task.
  SingleTaskUpdated { habit_id: Uuid },
}

#[derive(Debug, Clone)]
pub struct EventBus {
  sender: broadcast::Sender<HabitEvent>,
}

impl EventBus {
  pub fn new(capacity: usize) -> Self {
    let (sender, _) = broadcast::channel(capacity);
    Self { sender }
  }

  pub fn subscribe(&self) -> broadcast::Receiver<HabitEvent> { self.sender.subscribe() }

  /// Send `event` to every current subscriber. Having none is fine.
  pub fn publish(&self, event: HabitEvent) {
    tracing::debug!(?event, "publishing");
    let _ = self.sender.send(event);
  }
}

impl Default for EventBus {
  fn default() -> Self { Self::new(64) }
}
