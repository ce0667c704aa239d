//! Notes panel domain model.
//!
//! # Invariants
//! - `updated_at >= created_at`.
//! - Title and content are free-form; blank values are allowed.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Opaque note identifier.
pub type NoteId = String;

/// Title given to freshly created notes.
pub const UNTITLED_NOTE_TITLE: &str = "Untitled";

/// One note in the notes panel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Note {
    pub id: NoteId,
    pub title: String,
    pub content: String,
    /// Unix epoch milliseconds.
    pub created_at: i64,
    /// Unix epoch milliseconds.
    pub updated_at: i64,
}

impl Note {
    /// Builds an empty untitled note.
    pub fn untitled(now: i64) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            title: UNTITLED_NOTE_TITLE.to_string(),
            content: String::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Applies a patch and refreshes `updated_at`. Returns whether any field
    /// was given.
    pub fn apply(&mut self, patch: &NotePatch, now: i64) -> bool {
        if patch.is_empty() {
            return false;
        }
        if let Some(title) = &patch.title {
            self.title.clone_from(title);
        }
        if let Some(content) = &patch.content {
            self.content.clone_from(content);
        }
        self.updated_at = self.updated_at.max(now).max(self.created_at);
        true
    }
}

/// Partial update for [`Note`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NotePatch {
    pub title: Option<String>,
    pub content: Option<String>,
}

impl NotePatch {
    pub fn title(value: impl Into<String>) -> Self {
        Self {
            title: Some(value.into()),
            content: None,
        }
    }

    pub fn content(value: impl Into<String>) -> Self {
        Self {
            title: None,
            content: Some(value.into()),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.content.is_none()
    }

    /// Folds a newer patch on top of this one; newer fields win.
    pub fn merge(&mut self, newer: NotePatch) {
        if newer.title.is_some() {
            self.title = newer.title;
        }
        if newer.content.is_some() {
            self.content = newer.content;
        }
    }
}
