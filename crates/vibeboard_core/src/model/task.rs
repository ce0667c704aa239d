//! Kanban task domain model.
//!
//! # Responsibility
//! - Define the canonical task record shared by board, list and drag flows.
//! - Own the closed vocabularies for columns, priorities and sort modes.
//!
//! # Invariants
//! - `id` is stable and never reused for another task.
//! - `title` is non-empty after trim.
//! - `updated_at >= created_at`.
//! - A task belongs to exactly one column at a time.

use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// Opaque task identifier.
///
/// Client-created tasks use UUIDv4 text, but ids loaded from storage are
/// accepted as-is.
pub type TaskId = String;

/// Workflow stage a task currently sits in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ColumnId {
    Todo,
    InProgress,
    Completed,
}

impl ColumnId {
    /// Board columns in display order.
    pub const ALL: [ColumnId; 3] = [ColumnId::Todo, ColumnId::InProgress, ColumnId::Completed];

    /// Stable wire name (`todo|in-progress|completed`).
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Todo => "todo",
            Self::InProgress => "in-progress",
            Self::Completed => "completed",
        }
    }

    /// Parses a wire name. Returns `None` for anything else, which lets drag
    /// targets fall through to task lookup.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "todo" => Some(Self::Todo),
            "in-progress" => Some(Self::InProgress),
            "completed" => Some(Self::Completed),
            _ => None,
        }
    }

    /// Human-facing column heading.
    pub fn title(self) -> &'static str {
        match self {
            Self::Todo => "Todo",
            Self::InProgress => "In Progress",
            Self::Completed => "Completed",
        }
    }
}

impl Display for ColumnId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Task priority. Declaration order is rank order (`Urgent` first).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    Urgent,
    High,
    #[default]
    Medium,
    Low,
}

impl Priority {
    /// Sort rank: `urgent=0`, `high=1`, `medium=2`, `low=3`.
    pub fn rank(self) -> u8 {
        match self {
            Self::Urgent => 0,
            Self::High => 1,
            Self::Medium => 2,
            Self::Low => 3,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Urgent => "urgent",
            Self::High => "high",
            Self::Medium => "medium",
            Self::Low => "low",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "urgent" => Some(Self::Urgent),
            "high" => Some(Self::High),
            "medium" => Some(Self::Medium),
            "low" => Some(Self::Low),
            _ => None,
        }
    }
}

impl Display for Priority {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Validation errors for task content.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskValidationError {
    /// Title is blank after trim.
    EmptyTitle,
    /// `updated_at` is earlier than `created_at`.
    UpdatedBeforeCreated { created_at: i64, updated_at: i64 },
}

impl Display for TaskValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyTitle => write!(f, "task title must not be blank"),
            Self::UpdatedBeforeCreated {
                created_at,
                updated_at,
            } => write!(
                f,
                "task updated_at ({updated_at}) is earlier than created_at ({created_at})"
            ),
        }
    }
}

impl Error for TaskValidationError {}

/// Canonical kanban task record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: TaskId,
    /// Trimmed, non-empty.
    pub title: String,
    /// Trimmed; empty input is stored as `None`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub priority: Priority,
    /// Unix epoch milliseconds, day-granularity semantics.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due_date: Option<i64>,
    pub column_id: ColumnId,
    /// Ordering key within `column_id`.
    pub order: i64,
    /// Unix epoch milliseconds.
    pub created_at: i64,
    /// Unix epoch milliseconds. Never earlier than `created_at`.
    pub updated_at: i64,
}

impl Task {
    /// Builds a task with a generated id.
    ///
    /// Returns `None` when the title is blank after trim.
    pub fn new(
        title: &str,
        column_id: ColumnId,
        order: i64,
        now: i64,
    ) -> Option<Self> {
        let title = normalize_title(title)?;
        Some(Self {
            id: Uuid::new_v4().to_string(),
            title,
            description: None,
            priority: Priority::default(),
            due_date: None,
            column_id,
            order,
            created_at: now,
            updated_at: now,
        })
    }

    /// Validates content invariants.
    pub fn validate(&self) -> Result<(), TaskValidationError> {
        if self.title.trim().is_empty() {
            return Err(TaskValidationError::EmptyTitle);
        }
        if self.updated_at < self.created_at {
            return Err(TaskValidationError::UpdatedBeforeCreated {
                created_at: self.created_at,
                updated_at: self.updated_at,
            });
        }
        Ok(())
    }

    /// Refreshes `updated_at` without ever moving it backwards.
    pub fn touch(&mut self, now: i64) {
        self.updated_at = self.updated_at.max(now).max(self.created_at);
    }
}

/// Partial field update for [`Task`].
///
/// Outer `None` means "leave unchanged"; for nullable fields the inner
/// `None` clears the value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskPatch {
    pub title: Option<String>,
    pub description: Option<Option<String>>,
    pub priority: Option<Priority>,
    pub due_date: Option<Option<i64>>,
}

impl TaskPatch {
    pub fn title(value: impl Into<String>) -> Self {
        Self {
            title: Some(value.into()),
            ..Self::default()
        }
    }

    pub fn priority(value: Priority) -> Self {
        Self {
            priority: Some(value),
            ..Self::default()
        }
    }

    pub fn due_date(value: Option<i64>) -> Self {
        Self {
            due_date: Some(value),
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.priority.is_none()
            && self.due_date.is_none()
    }
}

/// Trims a title; `None` when nothing remains.
pub fn normalize_title(value: &str) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// Trims an optional description; blank collapses to `None`.
pub fn normalize_description(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::{normalize_description, ColumnId, Priority, Task, TaskValidationError};

    #[test]
    fn new_trims_title_and_rejects_blank() {
        let task = Task::new("  ship it  ", ColumnId::Todo, 0, 10).unwrap();
        assert_eq!(task.title, "ship it");
        assert_eq!(task.priority, Priority::Medium);
        assert_eq!(task.created_at, task.updated_at);
        assert!(Task::new(" \t\n", ColumnId::Todo, 0, 10).is_none());
    }

    #[test]
    fn column_wire_names_round_trip() {
        for column in ColumnId::ALL {
            assert_eq!(ColumnId::parse(column.as_str()), Some(column));
        }
        assert_eq!(ColumnId::parse("done"), None);
        let json = serde_json::to_string(&ColumnId::InProgress).unwrap();
        assert_eq!(json, "\"in-progress\"");
    }

    #[test]
    fn priority_rank_follows_urgency() {
        assert!(Priority::Urgent.rank() < Priority::High.rank());
        assert!(Priority::High.rank() < Priority::Medium.rank());
        assert!(Priority::Medium.rank() < Priority::Low.rank());
    }

    #[test]
    fn touch_never_moves_backwards() {
        let mut task = Task::new("a", ColumnId::Todo, 0, 100).unwrap();
        task.touch(50);
        assert_eq!(task.updated_at, 100);
        task.touch(150);
        assert_eq!(task.updated_at, 150);
        assert!(task.validate().is_ok());
    }

    #[test]
    fn validate_reports_time_inversion() {
        let mut task = Task::new("a", ColumnId::Todo, 0, 100).unwrap();
        task.updated_at = 10;
        assert_eq!(
            task.validate(),
            Err(TaskValidationError::UpdatedBeforeCreated {
                created_at: 100,
                updated_at: 10
            })
        );
    }

    #[test]
    fn blank_description_collapses_to_none() {
        assert_eq!(normalize_description(Some("   ")), None);
        assert_eq!(normalize_description(Some(" x ")), Some("x".to_string()));
        assert_eq!(normalize_description(None), None);
    }
}
