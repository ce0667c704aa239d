//! Entity <-> storage row translation.
//!
//! # Responsibility
//! - Translate model field names to column names (`order` -> `sort_order`,
//!   `columnId` -> `column_id`, `dueDate` -> `due_date`).
//! - Serialize epoch-millisecond instants as RFC 3339 UTC text and back.
//!
//! # Invariants
//! - Rows produced here only use columns listed in `Table::columns()`.
//! - Parsing rejects malformed rows instead of masking them.

use crate::model::note::{Note, NotePatch};
use crate::model::task::{ColumnId, Priority, Task, TaskPatch};
use crate::model::todo::Todo;
use crate::repo::record_store::{RecordRow, Table, ID_COLUMN, OWNER_COLUMN};
use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::Value;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Row parsing failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowError {
    pub table: Table,
    pub column: &'static str,
    pub message: String,
}

impl RowError {
    fn new(table: Table, column: &'static str, message: impl Into<String>) -> Self {
        Self {
            table,
            column,
            message: message.into(),
        }
    }
}

impl Display for RowError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "invalid row data in `{}.{}`: {}",
            self.table, self.column, self.message
        )
    }
}

impl Error for RowError {}

/// Formats epoch milliseconds as RFC 3339 UTC with millisecond precision.
pub fn format_timestamp(epoch_ms: i64) -> String {
    DateTime::<Utc>::from_timestamp_millis(epoch_ms)
        .unwrap_or_default()
        .to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Parses RFC 3339 text into epoch milliseconds.
pub fn parse_timestamp(value: &str) -> Option<i64> {
    DateTime::parse_from_rfc3339(value.trim())
        .ok()
        .map(|parsed| parsed.timestamp_millis())
}

fn timestamp_value(epoch_ms: i64) -> Value {
    Value::String(format_timestamp(epoch_ms))
}

fn optional_timestamp_value(epoch_ms: Option<i64>) -> Value {
    epoch_ms.map_or(Value::Null, timestamp_value)
}

fn optional_text_value(value: Option<&str>) -> Value {
    value.map_or(Value::Null, |text| Value::String(text.to_string()))
}

/// Full insert row for a task.
pub fn task_to_row(task: &Task, owner_id: &str) -> RecordRow {
    let mut row = RecordRow::new();
    row.insert(ID_COLUMN.into(), Value::String(task.id.clone()));
    row.insert(OWNER_COLUMN.into(), Value::String(owner_id.to_string()));
    row.insert("title".into(), Value::String(task.title.clone()));
    row.insert(
        "description".into(),
        optional_text_value(task.description.as_deref()),
    );
    row.insert("priority".into(), Value::String(task.priority.as_str().into()));
    row.insert("due_date".into(), optional_timestamp_value(task.due_date));
    row.insert(
        "column_id".into(),
        Value::String(task.column_id.as_str().into()),
    );
    row.insert("sort_order".into(), Value::from(task.order));
    row.insert("created_at".into(), timestamp_value(task.created_at));
    row.insert("updated_at".into(), timestamp_value(task.updated_at));
    row
}

/// Update row for the fields a patch touched, plus `updated_at`.
pub fn task_patch_row(patch: &TaskPatch, task: &Task) -> RecordRow {
    let mut row = RecordRow::new();
    if patch.title.is_some() {
        row.insert("title".into(), Value::String(task.title.clone()));
    }
    if patch.description.is_some() {
        row.insert(
            "description".into(),
            optional_text_value(task.description.as_deref()),
        );
    }
    if patch.priority.is_some() {
        row.insert("priority".into(), Value::String(task.priority.as_str().into()));
    }
    if patch.due_date.is_some() {
        row.insert("due_date".into(), optional_timestamp_value(task.due_date));
    }
    row.insert("updated_at".into(), timestamp_value(task.updated_at));
    row
}

/// Update row for a column/order write-back.
pub fn task_placement_row(task: &Task) -> RecordRow {
    let mut row = RecordRow::new();
    row.insert(
        "column_id".into(),
        Value::String(task.column_id.as_str().into()),
    );
    row.insert("sort_order".into(), Value::from(task.order));
    row.insert("updated_at".into(), timestamp_value(task.updated_at));
    row
}

/// Parses one stored task row.
pub fn task_from_row(row: &RecordRow) -> Result<Task, RowError> {
    let table = Table::Tasks;
    let priority_text = required_text(table, row, "priority")?;
    let priority = Priority::parse(&priority_text).ok_or_else(|| {
        RowError::new(table, "priority", format!("unknown priority `{priority_text}`"))
    })?;
    let column_text = required_text(table, row, "column_id")?;
    let column_id = ColumnId::parse(&column_text).ok_or_else(|| {
        RowError::new(table, "column_id", format!("unknown column `{column_text}`"))
    })?;

    let title = required_text(table, row, "title")?;
    if title.trim().is_empty() {
        return Err(RowError::new(table, "title", "title must not be blank"));
    }

    let created_at = required_timestamp(table, row, "created_at")?;
    let updated_at = required_timestamp(table, row, "updated_at")?;

    Ok(Task {
        id: required_text(table, row, ID_COLUMN)?,
        title,
        description: optional_text(table, row, "description")?,
        priority,
        due_date: optional_timestamp(table, row, "due_date")?,
        column_id,
        order: required_integer(table, row, "sort_order")?,
        created_at,
        updated_at: updated_at.max(created_at),
    })
}

/// Full insert row for a todo.
pub fn todo_to_row(todo: &Todo, owner_id: &str) -> RecordRow {
    let mut row = RecordRow::new();
    row.insert(ID_COLUMN.into(), Value::String(todo.id.clone()));
    row.insert(OWNER_COLUMN.into(), Value::String(owner_id.to_string()));
    row.insert("text".into(), Value::String(todo.text.clone()));
    row.insert("completed".into(), Value::Bool(todo.completed));
    row.insert("created_at".into(), timestamp_value(todo.created_at));
    row
}

/// Update row for a completion toggle.
pub fn todo_completed_row(completed: bool) -> RecordRow {
    let mut row = RecordRow::new();
    row.insert("completed".into(), Value::Bool(completed));
    row
}

/// Parses one stored todo row.
pub fn todo_from_row(row: &RecordRow) -> Result<Todo, RowError> {
    let table = Table::Todos;
    // SQLite hands booleans back as 0/1 integers.
    let completed = match row.get("completed") {
        Some(Value::Bool(value)) => *value,
        Some(Value::Number(number)) => match number.as_i64() {
            Some(0) => false,
            Some(1) => true,
            _ => {
                return Err(RowError::new(
                    table,
                    "completed",
                    format!("invalid flag `{number}`"),
                ))
            }
        },
        _ => return Err(RowError::new(table, "completed", "missing flag")),
    };
    Ok(Todo {
        id: required_text(table, row, ID_COLUMN)?,
        text: required_text(table, row, "text")?,
        completed,
        created_at: required_timestamp(table, row, "created_at")?,
    })
}

/// Full insert row for a note.
pub fn note_to_row(note: &Note, owner_id: &str) -> RecordRow {
    let mut row = RecordRow::new();
    row.insert(ID_COLUMN.into(), Value::String(note.id.clone()));
    row.insert(OWNER_COLUMN.into(), Value::String(owner_id.to_string()));
    row.insert("title".into(), Value::String(note.title.clone()));
    row.insert("content".into(), Value::String(note.content.clone()));
    row.insert("created_at".into(), timestamp_value(note.created_at));
    row.insert("updated_at".into(), timestamp_value(note.updated_at));
    row
}

/// Update row for the fields a patch touched, plus `updated_at`.
pub fn note_patch_row(patch: &NotePatch, updated_at: i64) -> RecordRow {
    let mut row = RecordRow::new();
    if let Some(title) = &patch.title {
        row.insert("title".into(), Value::String(title.clone()));
    }
    if let Some(content) = &patch.content {
        row.insert("content".into(), Value::String(content.clone()));
    }
    row.insert("updated_at".into(), timestamp_value(updated_at));
    row
}

/// Parses one stored note row.
pub fn note_from_row(row: &RecordRow) -> Result<Note, RowError> {
    let table = Table::Notes;
    let created_at = required_timestamp(table, row, "created_at")?;
    let updated_at = required_timestamp(table, row, "updated_at")?;
    Ok(Note {
        id: required_text(table, row, ID_COLUMN)?,
        title: required_text(table, row, "title")?,
        content: optional_text(table, row, "content")?.unwrap_or_default(),
        created_at,
        updated_at: updated_at.max(created_at),
    })
}

fn required_text(table: Table, row: &RecordRow, column: &'static str) -> Result<String, RowError> {
    match row.get(column) {
        Some(Value::String(value)) => Ok(value.clone()),
        Some(other) => Err(RowError::new(
            table,
            column,
            format!("expected text, got `{other}`"),
        )),
        None => Err(RowError::new(table, column, "missing value")),
    }
}

fn optional_text(
    table: Table,
    row: &RecordRow,
    column: &'static str,
) -> Result<Option<String>, RowError> {
    match row.get(column) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(value)) => Ok(Some(value.clone())),
        Some(other) => Err(RowError::new(
            table,
            column,
            format!("expected text, got `{other}`"),
        )),
    }
}

fn required_integer(table: Table, row: &RecordRow, column: &'static str) -> Result<i64, RowError> {
    row.get(column)
        .and_then(Value::as_i64)
        .ok_or_else(|| RowError::new(table, column, "expected integer"))
}

fn required_timestamp(
    table: Table,
    row: &RecordRow,
    column: &'static str,
) -> Result<i64, RowError> {
    let text = required_text(table, row, column)?;
    parse_timestamp(&text)
        .ok_or_else(|| RowError::new(table, column, format!("invalid timestamp `{text}`")))
}

fn optional_timestamp(
    table: Table,
    row: &RecordRow,
    column: &'static str,
) -> Result<Option<i64>, RowError> {
    optional_text(table, row, column)?
        .map(|text| {
            parse_timestamp(&text).ok_or_else(|| {
                RowError::new(table, column, format!("invalid timestamp `{text}`"))
            })
        })
        .transpose()
}

#[cfg(test)]
mod tests {
    use super::{
        format_timestamp, parse_timestamp, task_from_row, task_to_row, todo_from_row,
        todo_to_row,
    };
    use crate::model::task::{ColumnId, Priority, Task};
    use crate::model::todo::Todo;
    use serde_json::json;

    #[test]
    fn timestamps_use_rfc3339_millis_utc() {
        assert_eq!(format_timestamp(0), "1970-01-01T00:00:00.000Z");
        assert_eq!(
            format_timestamp(1_700_000_000_123),
            "2023-11-14T22:13:20.123Z"
        );
        assert_eq!(parse_timestamp("2023-11-14T22:13:20.123Z"), Some(1_700_000_000_123));
        assert_eq!(
            parse_timestamp("2023-11-15T00:13:20.123+02:00"),
            Some(1_700_000_000_123)
        );
        assert_eq!(parse_timestamp("yesterday"), None);
    }

    #[test]
    fn task_row_translates_field_names() {
        let mut task = Task::new("Write docs", ColumnId::InProgress, 3, 1_000).unwrap();
        task.priority = Priority::Urgent;
        task.due_date = Some(86_400_000);

        let row = task_to_row(&task, "user-1");
        assert_eq!(row["sort_order"], json!(3));
        assert_eq!(row["column_id"], json!("in-progress"));
        assert_eq!(row["due_date"], json!("1970-01-02T00:00:00.000Z"));
        assert_eq!(row["owner_id"], json!("user-1"));
        assert!(!row.contains_key("order"));

        let parsed = task_from_row(&row).unwrap();
        assert_eq!(parsed, task);
    }

    #[test]
    fn task_row_with_unknown_column_value_is_rejected() {
        let task = Task::new("x", ColumnId::Todo, 0, 0).unwrap();
        let mut row = task_to_row(&task, "u");
        row.insert("column_id".into(), json!("backlog"));
        let err = task_from_row(&row).unwrap_err();
        assert_eq!(err.column, "column_id");
    }

    #[test]
    fn todo_row_accepts_integer_flags() {
        let todo = Todo::new("milk", 5).unwrap();
        let mut row = todo_to_row(&todo, "u");
        row.insert("completed".into(), json!(1));
        assert!(todo_from_row(&row).unwrap().completed);
        row.insert("completed".into(), json!(2));
        assert!(todo_from_row(&row).is_err());
    }
}
