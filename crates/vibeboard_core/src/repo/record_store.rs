//! Durable record store contract.
//!
//! # Responsibility
//! - Describe the generic per-table CRUD surface the core writes through.
//! - Keep table/column vocabulary in one place so every backend validates
//!   row keys against the same whitelist.
//!
//! # Invariants
//! - Every call is scoped by `owner_id`; a backend must never return or
//!   modify another owner's rows.
//! - Row keys are snake_case column names; timestamps are RFC 3339 text.

use crate::db::DbError;
use crate::repo::key_value::KeyValueError;
use serde_json::{Map, Value};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Storage row: column name to JSON value.
pub type RecordRow = Map<String, Value>;

/// Result type used by record store operations.
pub type StoreResult<T> = Result<T, RecordStoreError>;

/// Owner column present on every table.
pub const OWNER_COLUMN: &str = "owner_id";
/// Primary key column present on every table.
pub const ID_COLUMN: &str = "id";

/// Tables backing the three entity kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Table {
    Tasks,
    Todos,
    Notes,
}

impl Table {
    pub const ALL: [Table; 3] = [Table::Tasks, Table::Todos, Table::Notes];

    pub fn name(self) -> &'static str {
        match self {
            Self::Tasks => "tasks",
            Self::Todos => "todos",
            Self::Notes => "notes",
        }
    }

    /// Known columns, in schema order.
    pub fn columns(self) -> &'static [&'static str] {
        match self {
            Self::Tasks => &[
                "id",
                "owner_id",
                "title",
                "description",
                "priority",
                "due_date",
                "column_id",
                "sort_order",
                "created_at",
                "updated_at",
            ],
            Self::Todos => &["id", "owner_id", "text", "completed", "created_at"],
            Self::Notes => &[
                "id",
                "owner_id",
                "title",
                "content",
                "created_at",
                "updated_at",
            ],
        }
    }

    /// Fixed local-persistence key holding the full serialized collection.
    pub fn storage_key(self) -> &'static str {
        match self {
            Self::Tasks => "vibe-coder-tasks",
            Self::Todos => "vibe-coder-todos",
            Self::Notes => "vibe-coder-notes",
        }
    }

    /// Returns the static column name when `column` belongs to this table.
    pub fn column(self, column: &str) -> Option<&'static str> {
        self.columns()
            .iter()
            .copied()
            .find(|candidate| *candidate == column)
    }
}

impl Display for Table {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Ordering clause for owner listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrderBy {
    pub column: &'static str,
    pub descending: bool,
}

impl OrderBy {
    pub const fn asc(column: &'static str) -> Self {
        Self {
            column,
            descending: false,
        }
    }

    pub const fn desc(column: &'static str) -> Self {
        Self {
            column,
            descending: true,
        }
    }
}

/// Errors from record store backends.
#[derive(Debug)]
pub enum RecordStoreError {
    /// Underlying SQLite/bootstrap error.
    Db(DbError),
    /// Local key-value persistence failed.
    Storage(KeyValueError),
    /// No row with `id` exists for the owner.
    NotFound { table: Table, id: String },
    /// A row with `id` already exists.
    Duplicate { table: Table, id: String },
    /// Row or ordering references a column the table does not have.
    UnknownColumn { table: Table, column: String },
    /// Value cannot be stored in the target column.
    InvalidValue {
        table: Table,
        column: String,
        message: String,
    },
    /// Backend refused the write.
    Rejected(String),
}

impl Display for RecordStoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::Storage(err) => write!(f, "{err}"),
            Self::NotFound { table, id } => write!(f, "{table} row not found: {id}"),
            Self::Duplicate { table, id } => write!(f, "{table} row already exists: {id}"),
            Self::UnknownColumn { table, column } => {
                write!(f, "unknown column `{column}` for table `{table}`")
            }
            Self::InvalidValue {
                table,
                column,
                message,
            } => write!(f, "invalid value for `{table}.{column}`: {message}"),
            Self::Rejected(message) => write!(f, "write rejected: {message}"),
        }
    }
}

impl Error for RecordStoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::Storage(err) => Some(err),
            _ => None,
        }
    }
}

impl From<DbError> for RecordStoreError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RecordStoreError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

impl From<KeyValueError> for RecordStoreError {
    fn from(value: KeyValueError) -> Self {
        Self::Storage(value)
    }
}

/// Generic per-table CRUD interface of the durable backend.
pub trait RecordStore {
    /// Lists every row owned by `owner_id`, ordered by `order_by`.
    fn select_for_owner(
        &self,
        table: Table,
        owner_id: &str,
        order_by: OrderBy,
    ) -> StoreResult<Vec<RecordRow>>;
    /// Inserts one row for `owner_id` and returns the stored row.
    fn insert(&mut self, table: Table, owner_id: &str, row: RecordRow) -> StoreResult<RecordRow>;
    /// Overwrites the given columns of one row.
    fn update_by_id(
        &mut self,
        table: Table,
        owner_id: &str,
        id: &str,
        patch: RecordRow,
    ) -> StoreResult<()>;
    /// Deletes one row.
    fn delete_by_id(&mut self, table: Table, owner_id: &str, id: &str) -> StoreResult<()>;
    /// Deletes every listed row that exists; missing ids are ignored.
    fn delete_by_ids(&mut self, table: Table, owner_id: &str, ids: &[String]) -> StoreResult<()>;
}

impl<S: RecordStore + ?Sized> RecordStore for Box<S> {
    fn select_for_owner(
        &self,
        table: Table,
        owner_id: &str,
        order_by: OrderBy,
    ) -> StoreResult<Vec<RecordRow>> {
        (**self).select_for_owner(table, owner_id, order_by)
    }

    fn insert(&mut self, table: Table, owner_id: &str, row: RecordRow) -> StoreResult<RecordRow> {
        (**self).insert(table, owner_id, row)
    }

    fn update_by_id(
        &mut self,
        table: Table,
        owner_id: &str,
        id: &str,
        patch: RecordRow,
    ) -> StoreResult<()> {
        (**self).update_by_id(table, owner_id, id, patch)
    }

    fn delete_by_id(&mut self, table: Table, owner_id: &str, id: &str) -> StoreResult<()> {
        (**self).delete_by_id(table, owner_id, id)
    }

    fn delete_by_ids(&mut self, table: Table, owner_id: &str, ids: &[String]) -> StoreResult<()> {
        (**self).delete_by_ids(table, owner_id, ids)
    }
}

/// Rejects rows carrying columns the table does not define.
pub fn ensure_known_columns(table: Table, row: &RecordRow) -> StoreResult<()> {
    for key in row.keys() {
        if table.column(key).is_none() {
            return Err(RecordStoreError::UnknownColumn {
                table,
                column: key.clone(),
            });
        }
    }
    Ok(())
}

/// Reads the text `id` column of a row.
pub fn row_id(table: Table, row: &RecordRow) -> StoreResult<String> {
    match row.get(ID_COLUMN) {
        Some(Value::String(id)) if !id.trim().is_empty() => Ok(id.clone()),
        _ => Err(RecordStoreError::InvalidValue {
            table,
            column: ID_COLUMN.to_string(),
            message: "row id must be a non-empty string".to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::{ensure_known_columns, row_id, RecordRow, RecordStoreError, Table};
    use serde_json::json;

    #[test]
    fn every_table_has_id_and_owner() {
        for table in Table::ALL {
            assert!(table.column("id").is_some());
            assert!(table.column("owner_id").is_some());
        }
    }

    #[test]
    fn unknown_columns_are_rejected() {
        let mut row = RecordRow::new();
        row.insert("order".to_string(), json!(1));
        let err = ensure_known_columns(Table::Tasks, &row).unwrap_err();
        assert!(matches!(err, RecordStoreError::UnknownColumn { column, .. } if column == "order"));
    }

    #[test]
    fn row_id_requires_text() {
        let mut row = RecordRow::new();
        row.insert("id".to_string(), json!(7));
        assert!(row_id(Table::Notes, &row).is_err());
        row.insert("id".to_string(), json!("n-1"));
        assert_eq!(row_id(Table::Notes, &row).unwrap(), "n-1");
    }
}
