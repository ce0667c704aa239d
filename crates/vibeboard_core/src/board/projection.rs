//! Sort/filter projection of one board column.
//!
//! # Invariants
//! - Output is fully deterministic: every comparator ends in an `order`
//!   tie-break and the sort is stable over canonical insertion order.
//! - Input is never mutated; callers receive cloned tasks.

use crate::model::task::{ColumnId, Priority, Task};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt::{Display, Formatter};

/// Column sort mode selected in the board toolbar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SortBy {
    /// Ascending `order` (user-arranged).
    #[default]
    Manual,
    /// Ascending due date; undated tasks last.
    DueDate,
    /// Ascending creation time.
    DateAdded,
    /// Urgent first.
    Priority,
}

impl SortBy {
    pub const ALL: [SortBy; 4] = [
        SortBy::Manual,
        SortBy::DueDate,
        SortBy::DateAdded,
        SortBy::Priority,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Manual => "manual",
            Self::DueDate => "due-date",
            Self::DateAdded => "date-added",
            Self::Priority => "priority",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim() {
            "manual" => Some(Self::Manual),
            "due-date" => Some(Self::DueDate),
            "date-added" => Some(Self::DateAdded),
            "priority" => Some(Self::Priority),
            _ => None,
        }
    }
}

impl Display for SortBy {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Derives the displayed sequence for `column_id`.
pub fn project(
    tasks: &[Task],
    column_id: ColumnId,
    sort_by: SortBy,
    filter_priority: Option<Priority>,
) -> Vec<Task> {
    let mut column: Vec<Task> = tasks
        .iter()
        .filter(|task| task.column_id == column_id)
        .cloned()
        .collect();

    column.sort_by(|a, b| compare(a, b, sort_by));

    if let Some(priority) = filter_priority {
        column.retain(|task| task.priority == priority);
    }
    column
}

fn compare(a: &Task, b: &Task, sort_by: SortBy) -> Ordering {
    let primary = match sort_by {
        SortBy::Manual => Ordering::Equal,
        SortBy::DueDate => match (a.due_date, b.due_date) {
            (Some(left), Some(right)) => left.cmp(&right),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        },
        SortBy::DateAdded => a.created_at.cmp(&b.created_at),
        SortBy::Priority => a.priority.rank().cmp(&b.priority.rank()),
    };
    primary.then_with(|| a.order.cmp(&b.order))
}
