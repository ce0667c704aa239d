//! SQLite-backed record store.
//!
//! # Responsibility
//! - Map generic row CRUD onto the migrated `tasks`/`todos`/`notes` tables.
//! - Keep SQL text inside the persistence boundary.
//!
//! # Invariants
//! - Column names in SQL come only from `Table::columns()`, never from
//!   caller strings, so row keys cannot inject SQL.
//! - Every statement filters by `owner_id`.
//! - `delete_by_ids` runs in one transaction.

use crate::db::migrations::latest_version;
use crate::repo::record_store::{
    ensure_known_columns, row_id, OrderBy, RecordRow, RecordStore, RecordStoreError, StoreResult,
    Table, ID_COLUMN, OWNER_COLUMN,
};
use log::debug;
use rusqlite::types::{Value as SqlValue, ValueRef};
use rusqlite::{params, params_from_iter, Connection, Row, TransactionBehavior};
use serde_json::{Number, Value};

/// Record store owning one migrated SQLite connection.
///
/// Owning (rather than borrowing) the connection lets the persistence
/// worker move the store onto its own thread.
pub struct SqliteRecordStore {
    conn: Connection,
}

impl SqliteRecordStore {
    /// Wraps a migrated connection.
    ///
    /// Fails with `RecordStoreError::Rejected` when the schema version does
    /// not match this binary.
    pub fn try_new(conn: Connection) -> StoreResult<Self> {
        let expected = latest_version();
        let actual: u32 = conn.query_row("PRAGMA user_version;", [], |row| row.get(0))?;
        if actual != expected {
            return Err(RecordStoreError::Rejected(format!(
                "record store requires schema version {expected}, got {actual}"
            )));
        }
        Ok(Self { conn })
    }

    /// Read-only access for diagnostics and tests.
    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    fn load_row(&self, table: Table, owner_id: &str, id: &str) -> StoreResult<RecordRow> {
        let sql = format!(
            "SELECT {} FROM {} WHERE {ID_COLUMN} = ?1 AND {OWNER_COLUMN} = ?2;",
            table.columns().join(", "),
            table.name()
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query(params![id, owner_id])?;
        if let Some(row) = rows.next()? {
            return parse_row(table, row);
        }
        Err(RecordStoreError::NotFound {
            table,
            id: id.to_string(),
        })
    }
}

impl RecordStore for SqliteRecordStore {
    fn select_for_owner(
        &self,
        table: Table,
        owner_id: &str,
        order_by: OrderBy,
    ) -> StoreResult<Vec<RecordRow>> {
        let order_column =
            table
                .column(order_by.column)
                .ok_or_else(|| RecordStoreError::UnknownColumn {
                    table,
                    column: order_by.column.to_string(),
                })?;
        let direction = if order_by.descending { "DESC" } else { "ASC" };
        let sql = format!(
            "SELECT {} FROM {} WHERE {OWNER_COLUMN} = ?1 ORDER BY {order_column} {direction}, rowid ASC;",
            table.columns().join(", "),
            table.name()
        );

        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query([owner_id])?;
        let mut items = Vec::new();
        while let Some(row) = rows.next()? {
            items.push(parse_row(table, row)?);
        }
        Ok(items)
    }

    fn insert(&mut self, table: Table, owner_id: &str, mut row: RecordRow) -> StoreResult<RecordRow> {
        row.insert(OWNER_COLUMN.to_string(), Value::String(owner_id.to_string()));
        ensure_known_columns(table, &row)?;
        let id = row_id(table, &row)?;

        let mut columns = Vec::with_capacity(row.len());
        let mut values = Vec::with_capacity(row.len());
        for &column in table.columns() {
            if let Some(value) = row.get(column) {
                columns.push(column);
                values.push(to_sql_value(table, column, value)?);
            }
        }
        let placeholders = (1..=columns.len())
            .map(|index| format!("?{index}"))
            .collect::<Vec<_>>()
            .join(", ");
        let sql = format!(
            "INSERT INTO {} ({}) VALUES ({placeholders});",
            table.name(),
            columns.join(", ")
        );

        match self.conn.execute(&sql, params_from_iter(values)) {
            Ok(_) => {}
            Err(rusqlite::Error::SqliteFailure(err, _))
                if err.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_PRIMARYKEY =>
            {
                return Err(RecordStoreError::Duplicate { table, id });
            }
            Err(err) => return Err(err.into()),
        }
        debug!(
            "event=record_insert module=repo status=ok table={} columns={}",
            table,
            columns.len()
        );
        self.load_row(table, owner_id, &id)
    }

    fn update_by_id(
        &mut self,
        table: Table,
        owner_id: &str,
        id: &str,
        patch: RecordRow,
    ) -> StoreResult<()> {
        ensure_known_columns(table, &patch)?;
        if patch.contains_key(ID_COLUMN) || patch.contains_key(OWNER_COLUMN) {
            return Err(RecordStoreError::InvalidValue {
                table,
                column: ID_COLUMN.to_string(),
                message: "identity columns cannot be updated".to_string(),
            });
        }
        if patch.is_empty() {
            self.load_row(table, owner_id, id)?;
            return Ok(());
        }

        let mut assignments = Vec::with_capacity(patch.len());
        let mut values = Vec::with_capacity(patch.len() + 2);
        for &column in table.columns() {
            if let Some(value) = patch.get(column) {
                values.push(to_sql_value(table, column, value)?);
                assignments.push(format!("{column} = ?{}", values.len()));
            }
        }
        values.push(SqlValue::Text(id.to_string()));
        let id_index = values.len();
        values.push(SqlValue::Text(owner_id.to_string()));
        let owner_index = values.len();

        let sql = format!(
            "UPDATE {} SET {} WHERE {ID_COLUMN} = ?{id_index} AND {OWNER_COLUMN} = ?{owner_index};",
            table.name(),
            assignments.join(", ")
        );
        let changed = self.conn.execute(&sql, params_from_iter(values))?;
        if changed == 0 {
            return Err(RecordStoreError::NotFound {
                table,
                id: id.to_string(),
            });
        }
        Ok(())
    }

    fn delete_by_id(&mut self, table: Table, owner_id: &str, id: &str) -> StoreResult<()> {
        let sql = format!(
            "DELETE FROM {} WHERE {ID_COLUMN} = ?1 AND {OWNER_COLUMN} = ?2;",
            table.name()
        );
        let changed = self.conn.execute(&sql, params![id, owner_id])?;
        if changed == 0 {
            return Err(RecordStoreError::NotFound {
                table,
                id: id.to_string(),
            });
        }
        Ok(())
    }

    fn delete_by_ids(&mut self, table: Table, owner_id: &str, ids: &[String]) -> StoreResult<()> {
        if ids.is_empty() {
            return Ok(());
        }
        let sql = format!(
            "DELETE FROM {} WHERE {ID_COLUMN} = ?1 AND {OWNER_COLUMN} = ?2;",
            table.name()
        );
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;
        {
            let mut stmt = tx.prepare(&sql)?;
            for id in ids {
                stmt.execute(params![id, owner_id])?;
            }
        }
        tx.commit()?;
        Ok(())
    }
}

fn to_sql_value(table: Table, column: &str, value: &Value) -> StoreResult<SqlValue> {
    match value {
        Value::Null => Ok(SqlValue::Null),
        Value::Bool(flag) => Ok(SqlValue::Integer(i64::from(*flag))),
        Value::Number(number) => {
            if let Some(integer) = number.as_i64() {
                Ok(SqlValue::Integer(integer))
            } else if let Some(real) = number.as_f64() {
                Ok(SqlValue::Real(real))
            } else {
                Err(invalid_value(table, column, "number out of range"))
            }
        }
        Value::String(text) => Ok(SqlValue::Text(text.clone())),
        Value::Array(_) | Value::Object(_) => {
            Err(invalid_value(table, column, "nested values are not storable"))
        }
    }
}

fn invalid_value(table: Table, column: &str, message: &str) -> RecordStoreError {
    RecordStoreError::InvalidValue {
        table,
        column: column.to_string(),
        message: message.to_string(),
    }
}

fn parse_row(table: Table, row: &Row<'_>) -> StoreResult<RecordRow> {
    let mut record = RecordRow::new();
    for (index, &column) in table.columns().iter().enumerate() {
        let value = match row.get_ref(index)? {
            ValueRef::Null => Value::Null,
            ValueRef::Integer(integer) => Value::from(integer),
            ValueRef::Real(real) => Number::from_f64(real)
                .map(Value::Number)
                .ok_or_else(|| invalid_value(table, column, "non-finite real"))?,
            ValueRef::Text(bytes) => Value::String(
                std::str::from_utf8(bytes)
                    .map_err(|_| invalid_value(table, column, "text is not utf-8"))?
                    .to_string(),
            ),
            ValueRef::Blob(_) => return Err(invalid_value(table, column, "unexpected blob")),
        };
        record.insert(column.to_string(), value);
    }
    Ok(record)
}

#[cfg(test)]
mod tests {
    use super::SqliteRecordStore;
    use crate::db::open_db_in_memory;
    use crate::repo::record_store::{RecordStore, RecordStoreError, Table};
    use rusqlite::Connection;

    #[test]
    fn try_new_rejects_unmigrated_connection() {
        let conn = Connection::open_in_memory().unwrap();
        let err = SqliteRecordStore::try_new(conn).err().unwrap();
        assert!(matches!(err, RecordStoreError::Rejected(_)));
    }

    #[test]
    fn delete_of_missing_row_is_not_found() {
        let mut store = SqliteRecordStore::try_new(open_db_in_memory().unwrap()).unwrap();
        let err = store.delete_by_id(Table::Todos, "u", "missing").unwrap_err();
        assert!(matches!(err, RecordStoreError::NotFound { .. }));
    }
}
