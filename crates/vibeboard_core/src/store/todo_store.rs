//! Quick-todo list store.
//!
//! # Invariants
//! - Newest todo first.
//! - `clear_completed` emits at most one batched delete.

use crate::model::todo::Todo;
use crate::repo::record_store::Table;
use crate::repo::rows::{todo_completed_row, todo_to_row};
use crate::session::Session;
use crate::sync::intent::SyncOp;

#[derive(Debug)]
pub struct TodoStore {
    session: Session,
    todos: Vec<Todo>,
}

impl TodoStore {
    pub fn new(session: Session) -> Self {
        Self::hydrate(session, Vec::new())
    }

    /// Seeds the store; `todos` should already be newest first.
    pub fn hydrate(session: Session, todos: Vec<Todo>) -> Self {
        Self { session, todos }
    }

    /// Prepends a todo. Returns `None` when `text` trims empty.
    pub fn add(&mut self, text: &str) -> Option<Todo> {
        let todo = Todo::new(text, self.session.now())?;
        self.todos.insert(0, todo.clone());
        self.session.emit(
            Table::Todos,
            SyncOp::Insert {
                row: todo_to_row(&todo, self.session.owner_id()),
            },
        );
        Some(todo)
    }

    /// Flips the completion flag of `id`.
    pub fn toggle(&mut self, id: &str) -> bool {
        let Some(todo) = self.todos.iter_mut().find(|todo| todo.id == id) else {
            return false;
        };
        todo.completed = !todo.completed;
        let op = SyncOp::Update {
            id: todo.id.clone(),
            patch: todo_completed_row(todo.completed),
        };
        self.session.emit(Table::Todos, op);
        true
    }

    pub fn delete(&mut self, id: &str) -> bool {
        let Some(index) = self.todos.iter().position(|todo| todo.id == id) else {
            return false;
        };
        let removed = self.todos.remove(index);
        self.session
            .emit(Table::Todos, SyncOp::Delete { id: removed.id });
        true
    }

    /// Drops every completed todo and returns how many were removed.
    pub fn clear_completed(&mut self) -> usize {
        let ids: Vec<String> = self
            .todos
            .iter()
            .filter(|todo| todo.completed)
            .map(|todo| todo.id.clone())
            .collect();
        if ids.is_empty() {
            return 0;
        }
        self.todos.retain(|todo| !todo.completed);
        let removed = ids.len();
        self.session.emit(Table::Todos, SyncOp::DeleteMany { ids });
        removed
    }

    pub fn todos(&self) -> &[Todo] {
        &self.todos
    }

    pub fn get(&self, id: &str) -> Option<&Todo> {
        self.todos.iter().find(|todo| todo.id == id)
    }

    /// Number of todos not yet completed.
    pub fn remaining_count(&self) -> usize {
        self.todos.iter().filter(|todo| !todo.completed).count()
    }
}
