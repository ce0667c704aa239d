//! Drag-and-drop interaction controller.
//!
//! Receives already classified drag events and turns them into task store
//! mutations.
//!
//! # Invariants
//! - `drag_over` only moves tasks across columns.
//! - `drag_end` only reorders within a column and always returns to `Idle`.
//! - Dropping a task on itself never mutates the store.

use crate::board::order::position_in_column;
use crate::model::task::{ColumnId, TaskId};
use crate::store::task_store::TaskStore;

/// Controller state.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum DragState {
    #[default]
    Idle,
    Dragging { active_id: TaskId },
}

/// What a drag event did to the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DragOutcome {
    /// The active task changed column.
    Moved,
    /// The active task changed position inside its column.
    Reordered,
    /// Nothing was written.
    Ignored,
}

/// Drop target resolved against the store.
enum Target {
    Column(ColumnId),
    Task { column_id: ColumnId },
}

#[derive(Debug, Default)]
pub struct DragController {
    state: DragState,
}

impl DragController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &DragState {
        &self.state
    }

    /// Id of the task being dragged, if any.
    pub fn active_id(&self) -> Option<&str> {
        match &self.state {
            DragState::Idle => None,
            DragState::Dragging { active_id } => Some(active_id),
        }
    }

    /// Starts dragging `active_id`. Unknown ids leave the controller idle.
    pub fn drag_start(&mut self, store: &TaskStore, active_id: &str) -> bool {
        if store.get(active_id).is_none() {
            return false;
        }
        self.state = DragState::Dragging {
            active_id: active_id.to_string(),
        };
        true
    }

    /// Hover over a column or a task; moves the active task across columns.
    pub fn drag_over(&mut self, store: &mut TaskStore, active_id: &str, over_id: &str) -> DragOutcome {
        if self.active_id() != Some(active_id) {
            return DragOutcome::Ignored;
        }
        let Some(active_column) = store.get(active_id).map(|task| task.column_id) else {
            return DragOutcome::Ignored;
        };

        let (column_id, index) = match resolve_target(store, over_id) {
            Some(Target::Column(column_id)) if column_id != active_column => {
                (column_id, store.column_len(column_id))
            }
            Some(Target::Task { column_id }) if column_id != active_column => {
                let Some(index) = position_in_column(store.tasks(), column_id, over_id) else {
                    return DragOutcome::Ignored;
                };
                (column_id, index)
            }
            _ => return DragOutcome::Ignored,
        };

        if store.move_to_column(active_id, column_id, index) {
            DragOutcome::Moved
        } else {
            DragOutcome::Ignored
        }
    }

    /// Drop; reorders inside the shared column and returns to `Idle`.
    pub fn drag_end(
        &mut self,
        store: &mut TaskStore,
        active_id: &str,
        over_id: Option<&str>,
    ) -> DragOutcome {
        self.state = DragState::Idle;
        let Some(over_id) = over_id else {
            return DragOutcome::Ignored;
        };
        if active_id == over_id {
            return DragOutcome::Ignored;
        }
        let Some(active_column) = store.get(active_id).map(|task| task.column_id) else {
            return DragOutcome::Ignored;
        };
        let Some(Target::Task { column_id }) = resolve_target(store, over_id) else {
            return DragOutcome::Ignored;
        };
        if column_id == active_column && store.reorder_within_column(column_id, active_id, over_id) {
            DragOutcome::Reordered
        } else {
            DragOutcome::Ignored
        }
    }

    /// Abandons the drag without touching the store.
    pub fn drag_cancel(&mut self) {
        self.state = DragState::Idle;
    }
}

fn resolve_target(store: &TaskStore, over_id: &str) -> Option<Target> {
    if let Some(column_id) = ColumnId::parse(over_id) {
        return Some(Target::Column(column_id));
    }
    store.get(over_id).map(|task| Target::Task {
        column_id: task.column_id,
    })
}
