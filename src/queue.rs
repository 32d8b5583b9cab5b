/* src/queue.rs */

//! Offline queue payloads and an in-memory queue

use crate::error::QueueError;
use crate::ports::OfflineQueue;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tokio::sync::Mutex;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActionKind {
    Spark,
    Unspark,
}

/// An action handed off for later delivery.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueuedAction {
    pub id: Uuid,
    #[serde(rename = "type")]
    pub kind: ActionKind,
    pub payload: serde_json::Value,
    pub created_at: DateTime<Utc>,
}

impl QueuedAction {
    pub fn new(kind: ActionKind, user_id: &str, post_id: &str) -> Self {
        Self {
            id: Uuid::new_v4(),
            kind,
            payload: json!({ "post_id": post_id, "user_id": user_id }),
            created_at: Utc::now(),
        }
    }

    pub fn post_id(&self) -> Option<&str> {
        self.payload.get("post_id").and_then(|v| v.as_str())
    }

    pub fn user_id(&self) -> Option<&str> {
        self.payload.get("user_id").and_then(|v| v.as_str())
    }
}

/// Queue that keeps actions in memory; for tests and demos.
#[derive(Debug, Default)]
pub struct InMemoryQueue {
    items: Mutex<Vec<QueuedAction>>,
    capacity: Option<usize>,
}

impl InMemoryQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            items: Mutex::new(Vec::new()),
            capacity: Some(capacity),
        }
    }

    pub async fn len(&self) -> usize {
        self.items.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.items.lock().await.is_empty()
    }

    pub async fn snapshot(&self) -> Vec<QueuedAction> {
        self.items.lock().await.clone()
    }

    /// Removes and returns everything queued so far, oldest first.
    pub async fn drain(&self) -> Vec<QueuedAction> {
        std::mem::take(&mut *self.items.lock().await)
    }
}

#[async_trait]
impl OfflineQueue for InMemoryQueue {
    async fn enqueue(&self, action: QueuedAction) -> Result<(), QueueError> {
        let mut items = self.items.lock().await;
        if let Some(capacity) = self.capacity {
            if items.len() >= capacity {
                return Err(QueueError::Full { capacity });
            }
        }
        items.push(action);
        Ok(())
    }
}
