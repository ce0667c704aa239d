//! Column order model.
//!
//! # Responsibility
//! - Compute append positions for new tasks.
//! - Relocate one task inside a column and densely renumber the column.
//!
//! # Invariants
//! - After `insert_at`, orders are exactly `0..len` in sequence order.
//! - Ties on `order` keep canonical insertion order (stable sort).
//! - Functions here are pure; they never touch `updated_at`.

use crate::model::task::{ColumnId, Task};

/// Returns the order key that appends after every task in `column_tasks`.
///
/// `max(order) + 1`, or `0` for an empty column.
pub fn next_order(column_tasks: &[Task]) -> i64 {
    column_tasks
        .iter()
        .map(|task| task.order)
        .max()
        .map_or(0, |max| max + 1)
}

/// Moves `task` to `index` within `column_tasks` and renumbers densely.
///
/// Any element with the same id as `task` is removed first; `index` is
/// clamped to `[0, len]` after that removal.
pub fn insert_at(mut column_tasks: Vec<Task>, task: Task, index: usize) -> Vec<Task> {
    column_tasks.retain(|existing| existing.id != task.id);
    let index = index.min(column_tasks.len());
    column_tasks.insert(index, task);
    for (position, task) in column_tasks.iter_mut().enumerate() {
        task.order = position as i64;
    }
    column_tasks
}

/// Collects one column's tasks in manual order.
pub fn sorted_column(tasks: &[Task], column_id: ColumnId) -> Vec<Task> {
    let mut column: Vec<Task> = tasks
        .iter()
        .filter(|task| task.column_id == column_id)
        .cloned()
        .collect();
    column.sort_by_key(|task| task.order);
    column
}

/// Index of `task_id` in the manual order of `column_id`.
pub fn position_in_column(tasks: &[Task], column_id: ColumnId, task_id: &str) -> Option<usize> {
    let mut column: Vec<&Task> = tasks
        .iter()
        .filter(|task| task.column_id == column_id)
        .collect();
    column.sort_by_key(|task| task.order);
    column.iter().position(|task| task.id == task_id)
}

#[cfg(test)]
mod tests {
    use super::{insert_at, next_order, position_in_column, sorted_column};
    use crate::model::task::{ColumnId, Task};

    fn task(id: &str, column_id: ColumnId, order: i64) -> Task {
        let mut task = Task::new(id, column_id, order, 0).unwrap();
        task.id = id.to_string();
        task
    }

    fn ids(tasks: &[Task]) -> Vec<&str> {
        tasks.iter().map(|task| task.id.as_str()).collect()
    }

    #[test]
    fn next_order_is_zero_for_empty_column() {
        assert_eq!(next_order(&[]), 0);
    }

    #[test]
    fn next_order_follows_max_not_len() {
        let tasks = vec![
            task("a", ColumnId::Todo, 4),
            task("b", ColumnId::Todo, 1),
        ];
        assert_eq!(next_order(&tasks), 5);
    }

    #[test]
    fn insert_at_relocates_existing_task() {
        let column = vec![
            task("a", ColumnId::Todo, 0),
            task("b", ColumnId::Todo, 1),
            task("c", ColumnId::Todo, 2),
        ];
        let moved = column[2].clone();
        let result = insert_at(column, moved, 0);
        assert_eq!(ids(&result), vec!["c", "a", "b"]);
        let orders: Vec<i64> = result.iter().map(|task| task.order).collect();
        assert_eq!(orders, vec![0, 1, 2]);
    }

    #[test]
    fn insert_at_clamps_index_past_end() {
        let column = vec![task("a", ColumnId::Todo, 7), task("b", ColumnId::Todo, 9)];
        let incoming = task("x", ColumnId::Todo, 0);
        let result = insert_at(column, incoming, 42);
        assert_eq!(ids(&result), vec!["a", "b", "x"]);
        assert_eq!(result[2].order, 2);
    }

    #[test]
    fn insert_at_own_index_keeps_sequence() {
        let column = vec![task("a", ColumnId::Todo, 0), task("b", ColumnId::Todo, 1)];
        let same = column[1].clone();
        let result = insert_at(column.clone(), same, 1);
        assert_eq!(result, column);
    }

    #[test]
    fn sorted_column_breaks_ties_by_insertion_order() {
        let tasks = vec![
            task("late", ColumnId::Todo, 1),
            task("first", ColumnId::Todo, 0),
            task("tie", ColumnId::Todo, 1),
            task("other", ColumnId::Completed, 0),
        ];
        let column = sorted_column(&tasks, ColumnId::Todo);
        assert_eq!(ids(&column), vec!["first", "late", "tie"]);
        assert_eq!(position_in_column(&tasks, ColumnId::Todo, "tie"), Some(2));
        assert_eq!(position_in_column(&tasks, ColumnId::Todo, "other"), None);
    }
}
