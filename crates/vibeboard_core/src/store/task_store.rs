//! Canonical kanban task collection.
//!
//! # Responsibility
//! - Own every task of the signed-in user.
//! - Apply add/update/delete/move/reorder locally, then emit one sync
//!   intent per written row.
//!
//! # Invariants
//! - Within a column, ascending `order` reproduces the intended sequence.
//! - `updated_at` never moves backwards, even if the clock does.
//! - Moves and reorders emit writes only for tasks whose placement
//!   changed, plus the moved task itself.
//! - Remote failures never roll back local state.

use crate::board::order::{insert_at, next_order, position_in_column, sorted_column};
use crate::board::projection::{project, SortBy};
use crate::model::task::{
    normalize_description, normalize_title, ColumnId, Priority, Task, TaskPatch,
};
use crate::repo::record_store::Table;
use crate::repo::rows::{task_patch_row, task_placement_row, task_to_row};
use crate::session::Session;
use crate::sync::intent::SyncOp;
use log::debug;
use std::collections::HashMap;

/// Single-writer owner of the canonical task set.
#[derive(Debug)]
pub struct TaskStore {
    session: Session,
    tasks: Vec<Task>,
}

impl TaskStore {
    /// Creates an empty store.
    pub fn new(session: Session) -> Self {
        Self::hydrate(session, Vec::new())
    }

    /// Creates a store seeded with already persisted tasks.
    ///
    /// `tasks` should arrive in ascending `order`; equal orders keep the
    /// given sequence.
    pub fn hydrate(session: Session, tasks: Vec<Task>) -> Self {
        Self { session, tasks }
    }

    /// Appends a new task to the end of `column_id`.
    ///
    /// Returns `None` without side effects when `title` trims empty.
    pub fn add(
        &mut self,
        title: &str,
        column_id: ColumnId,
        description: Option<&str>,
        priority: Priority,
        due_date: Option<i64>,
    ) -> Option<Task> {
        let now = self.session.now();
        let order = next_order(&sorted_column(&self.tasks, column_id));
        let mut task = Task::new(title, column_id, order, now)?;
        task.description = normalize_description(description);
        task.priority = priority;
        task.due_date = due_date;

        self.tasks.push(task.clone());
        self.session.emit(
            Table::Tasks,
            SyncOp::Insert {
                row: task_to_row(&task, self.session.owner_id()),
            },
        );
        Some(task)
    }

    /// Merges the given fields into task `id`.
    ///
    /// No-op when the task is missing, the patch is empty, or the patch
    /// carries a title that trims empty.
    pub fn update(&mut self, id: &str, patch: TaskPatch) -> bool {
        if patch.is_empty() {
            return false;
        }
        let title = match &patch.title {
            Some(raw) => match normalize_title(raw) {
                Some(title) => Some(title),
                None => return false,
            },
            None => None,
        };
        let now = self.session.now();
        let Some(task) = self.tasks.iter_mut().find(|task| task.id == id) else {
            return false;
        };

        if let Some(title) = title {
            task.title = title;
        }
        if let Some(description) = &patch.description {
            task.description = normalize_description(description.as_deref());
        }
        if let Some(priority) = patch.priority {
            task.priority = priority;
        }
        if let Some(due_date) = patch.due_date {
            task.due_date = due_date;
        }
        task.touch(now);

        let op = SyncOp::Update {
            id: task.id.clone(),
            patch: task_patch_row(&patch, task),
        };
        self.session.emit(Table::Tasks, op);
        true
    }

    /// Removes task `id`. No-op when absent.
    pub fn delete(&mut self, id: &str) -> bool {
        let Some(index) = self.tasks.iter().position(|task| task.id == id) else {
            return false;
        };
        let removed = self.tasks.remove(index);
        self.session
            .emit(Table::Tasks, SyncOp::Delete { id: removed.id });
        true
    }

    /// Places task `id` at `target_index` of `target_column`.
    ///
    /// The target column is densely renumbered; the source column keeps its
    /// remaining order values.
    pub fn move_to_column(&mut self, id: &str, target_column: ColumnId, target_index: usize) -> bool {
        let Some(task) = self.get(id) else {
            return false;
        };
        let mut moved = task.clone();
        moved.column_id = target_column;

        let target = sorted_column(&self.tasks, target_column);
        let placed = insert_at(target, moved, target_index);
        let written = self.write_back(placed, Some(id));
        debug!(
            "event=task_move module=store status=ok column={} writes={}",
            target_column, written
        );
        true
    }

    /// Moves `active_id` to the prior index of `over_id` inside `column_id`.
    ///
    /// No-op when the ids are equal or either is not in the column.
    pub fn reorder_within_column(&mut self, column_id: ColumnId, active_id: &str, over_id: &str) -> bool {
        if active_id == over_id {
            return false;
        }
        let Some(over_index) = position_in_column(&self.tasks, column_id, over_id) else {
            return false;
        };
        let column = sorted_column(&self.tasks, column_id);
        let Some(active) = column.iter().find(|task| task.id == active_id).cloned() else {
            return false;
        };

        let placed = insert_at(column, active, over_index);
        let written = self.write_back(placed, None);
        debug!(
            "event=task_reorder module=store status=ok column={} writes={}",
            column_id, written
        );
        written > 0
    }

    /// All tasks in canonical insertion order.
    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn get(&self, id: &str) -> Option<&Task> {
        self.tasks.iter().find(|task| task.id == id)
    }

    /// Displayed sequence of one column.
    pub fn column(&self, column_id: ColumnId, sort_by: SortBy, filter: Option<Priority>) -> Vec<Task> {
        project(&self.tasks, column_id, sort_by, filter)
    }

    pub fn column_len(&self, column_id: ColumnId) -> usize {
        self.tasks
            .iter()
            .filter(|task| task.column_id == column_id)
            .count()
    }

    /// Copies placement from `placed` into the canonical set.
    ///
    /// A task is written when its column or order changed, or when it is
    /// `always`. Returns the number of rows written.
    fn write_back(&mut self, placed: Vec<Task>, always: Option<&str>) -> usize {
        let now = self.session.now();
        let index_by_id: HashMap<&str, usize> = self
            .tasks
            .iter()
            .enumerate()
            .map(|(index, task)| (task.id.as_str(), index))
            .collect();

        let mut updates = Vec::new();
        for candidate in placed {
            let Some(&index) = index_by_id.get(candidate.id.as_str()) else {
                continue;
            };
            let current = &self.tasks[index];
            let changed = current.order != candidate.order
                || current.column_id != candidate.column_id
                || always == Some(candidate.id.as_str());
            if changed {
                updates.push((index, candidate.column_id, candidate.order));
            }
        }
        drop(index_by_id);

        let written = updates.len();
        for (index, column_id, order) in updates {
            let task = &mut self.tasks[index];
            task.column_id = column_id;
            task.order = order;
            task.touch(now);
            let op = SyncOp::Update {
                id: task.id.clone(),
                patch: task_placement_row(task),
            };
            self.session.emit(Table::Tasks, op);
        }
        written
    }
}
