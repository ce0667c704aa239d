//! Quick-todo domain model.
//!
//! # Invariants
//! - `text` is non-empty after trim.
//! - New todos start as not completed.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Opaque todo identifier.
pub type TodoId = String;

/// One quick-todo entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Todo {
    pub id: TodoId,
    pub text: String,
    pub completed: bool,
    /// Unix epoch milliseconds.
    pub created_at: i64,
}

impl Todo {
    /// Builds an open todo. Returns `None` when `text` is blank after trim.
    pub fn new(text: &str, now: i64) -> Option<Self> {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return None;
        }
        Some(Self {
            id: Uuid::new_v4().to_string(),
            text: trimmed.to_string(),
            completed: false,
            created_at: now,
        })
    }
}
