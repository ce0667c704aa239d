//! In-memory record tables and the in-memory record store fake.
//!
//! # Responsibility
//! - Implement owner-scoped row CRUD over plain vectors.
//! - Back `KeyValueRecordStore` (local persistence) and tests.
//!
//! # Invariants
//! - Rows keep insertion order until a listing sorts a copy.
//! - Failure injection only affects writes; reads keep working.

use crate::repo::record_store::{
    ensure_known_columns, row_id, OrderBy, RecordRow, RecordStore, RecordStoreError, StoreResult,
    Table, ID_COLUMN, OWNER_COLUMN,
};
use parking_lot::Mutex;
use serde_json::Value;
use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Plain row tables keyed by [`Table`].
#[derive(Debug, Clone, Default)]
pub struct MemoryTables {
    tables: BTreeMap<Table, Vec<RecordRow>>,
}

impl MemoryTables {
    pub fn new() -> Self {
        Self::default()
    }

    /// All rows of `table`, every owner included.
    pub fn rows(&self, table: Table) -> &[RecordRow] {
        self.tables.get(&table).map_or(&[], Vec::as_slice)
    }

    /// Replaces every row of `table`.
    pub fn replace(&mut self, table: Table, rows: Vec<RecordRow>) {
        self.tables.insert(table, rows);
    }

    pub fn select_for_owner(
        &self,
        table: Table,
        owner_id: &str,
        order_by: OrderBy,
    ) -> StoreResult<Vec<RecordRow>> {
        let column = table
            .column(order_by.column)
            .ok_or_else(|| RecordStoreError::UnknownColumn {
                table,
                column: order_by.column.to_string(),
            })?;

        let mut rows: Vec<RecordRow> = self
            .rows(table)
            .iter()
            .filter(|row| is_owned_by(row, owner_id))
            .cloned()
            .collect();
        rows.sort_by(|a, b| {
            let ordering = compare_json(a.get(column), b.get(column));
            if order_by.descending {
                ordering.reverse()
            } else {
                ordering
            }
        });
        Ok(rows)
    }

    pub fn insert(&mut self, table: Table, owner_id: &str, mut row: RecordRow) -> StoreResult<RecordRow> {
        row.insert(OWNER_COLUMN.to_string(), Value::String(owner_id.to_string()));
        ensure_known_columns(table, &row)?;
        let id = row_id(table, &row)?;

        let rows = self.tables.entry(table).or_default();
        if rows.iter().any(|existing| has_id(existing, &id)) {
            return Err(RecordStoreError::Duplicate { table, id });
        }
        rows.push(row.clone());
        Ok(row)
    }

    pub fn update_by_id(
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

        let row = self
            .tables
            .entry(table)
            .or_default()
            .iter_mut()
            .find(|row| has_id(row, id) && is_owned_by(row, owner_id))
            .ok_or_else(|| RecordStoreError::NotFound {
                table,
                id: id.to_string(),
            })?;
        for (column, value) in patch {
            row.insert(column, value);
        }
        Ok(())
    }

    pub fn delete_by_id(&mut self, table: Table, owner_id: &str, id: &str) -> StoreResult<()> {
        let rows = self.tables.entry(table).or_default();
        let before = rows.len();
        rows.retain(|row| !(has_id(row, id) && is_owned_by(row, owner_id)));
        if rows.len() == before {
            return Err(RecordStoreError::NotFound {
                table,
                id: id.to_string(),
            });
        }
        Ok(())
    }

    pub fn delete_by_ids(&mut self, table: Table, owner_id: &str, ids: &[String]) -> StoreResult<()> {
        let rows = self.tables.entry(table).or_default();
        rows.retain(|row| {
            !(is_owned_by(row, owner_id) && ids.iter().any(|id| has_id(row, id)))
        });
        Ok(())
    }
}

fn has_id(row: &RecordRow, id: &str) -> bool {
    row.get(ID_COLUMN).and_then(Value::as_str) == Some(id)
}

fn is_owned_by(row: &RecordRow, owner_id: &str) -> bool {
    row.get(OWNER_COLUMN).and_then(Value::as_str) == Some(owner_id)
}

/// Orders JSON scalars the way SQLite orders the stored values:
/// null < numbers < text.
fn compare_json(left: Option<&Value>, right: Option<&Value>) -> Ordering {
    fn class(value: Option<&Value>) -> u8 {
        match value {
            None | Some(Value::Null) => 0,
            Some(Value::Bool(_)) | Some(Value::Number(_)) => 1,
            Some(Value::String(_)) => 2,
            Some(_) => 3,
        }
    }

    fn number(value: &Value) -> f64 {
        match value {
            Value::Bool(flag) => f64::from(u8::from(*flag)),
            Value::Number(number) => number.as_f64().unwrap_or(0.0),
            _ => 0.0,
        }
    }

    match (left, right) {
        (Some(Value::String(a)), Some(Value::String(b))) => a.cmp(b),
        (Some(a @ (Value::Number(_) | Value::Bool(_))), Some(b @ (Value::Number(_) | Value::Bool(_)))) => {
            number(a).partial_cmp(&number(b)).unwrap_or(Ordering::Equal)
        }
        _ => class(left).cmp(&class(right)),
    }
}

#[derive(Debug, Default)]
struct MemoryState {
    tables: MemoryTables,
    reject_writes: Option<String>,
    write_count: usize,
}

/// Shared in-memory [`RecordStore`].
///
/// Clones share state, so a test can keep one handle for inspection while
/// the persistence worker owns another.
#[derive(Debug, Clone, Default)]
pub struct InMemoryRecordStore {
    state: Arc<Mutex<MemoryState>>,
}

impl InMemoryRecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every following write fail with `RecordStoreError::Rejected`.
    pub fn reject_writes(&self, message: impl Into<String>) {
        self.state.lock().reject_writes = Some(message.into());
    }

    /// Restores normal write behavior.
    pub fn accept_writes(&self) {
        self.state.lock().reject_writes = None;
    }

    /// Snapshot of every row in `table`, all owners, insertion order.
    pub fn rows(&self, table: Table) -> Vec<RecordRow> {
        self.state.lock().tables.rows(table).to_vec()
    }

    /// Number of writes that reached the tables.
    pub fn write_count(&self) -> usize {
        self.state.lock().write_count
    }

    fn write<T>(
        &self,
        apply: impl FnOnce(&mut MemoryTables) -> StoreResult<T>,
    ) -> StoreResult<T> {
        let mut state = self.state.lock();
        if let Some(message) = &state.reject_writes {
            return Err(RecordStoreError::Rejected(message.clone()));
        }
        let result = apply(&mut state.tables)?;
        state.write_count += 1;
        Ok(result)
    }
}

impl RecordStore for InMemoryRecordStore {
    fn select_for_owner(
        &self,
        table: Table,
        owner_id: &str,
        order_by: OrderBy,
    ) -> StoreResult<Vec<RecordRow>> {
        self.state
            .lock()
            .tables
            .select_for_owner(table, owner_id, order_by)
    }

    fn insert(&mut self, table: Table, owner_id: &str, row: RecordRow) -> StoreResult<RecordRow> {
        self.write(|tables| tables.insert(table, owner_id, row))
    }

    fn update_by_id(
        &mut self,
        table: Table,
        owner_id: &str,
        id: &str,
        patch: RecordRow,
    ) -> StoreResult<()> {
        self.write(|tables| tables.update_by_id(table, owner_id, id, patch))
    }

    fn delete_by_id(&mut self, table: Table, owner_id: &str, id: &str) -> StoreResult<()> {
        self.write(|tables| tables.delete_by_id(table, owner_id, id))
    }

    fn delete_by_ids(&mut self, table: Table, owner_id: &str, ids: &[String]) -> StoreResult<()> {
        self.write(|tables| tables.delete_by_ids(table, owner_id, ids))
    }
}
