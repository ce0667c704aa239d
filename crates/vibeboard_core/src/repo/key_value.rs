//! Local scoped persistence.
//!
//! # Responsibility
//! - Provide a key-value read/write pair (file or memory backed).
//! - Expose it as a [`RecordStore`] that keeps one serialized collection
//!   per table under a fixed key.
//!
//! # Invariants
//! - Each table key is read once when the store is opened.
//! - Every successful mutation rewrites the whole collection for its table.
//! - File writes go through a temp file + rename so a crash never leaves a
//!   half-written collection behind.

use crate::repo::memory_store::MemoryTables;
use crate::repo::record_store::{OrderBy, RecordRow, RecordStore, StoreResult, Table};
use parking_lot::Mutex;
use std::collections::BTreeMap;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Errors from local key-value persistence.
#[derive(Debug)]
pub enum KeyValueError {
    /// Filesystem failure for `key`.
    Io { key: String, source: io::Error },
    /// Stored value for `key` cannot be decoded.
    Corrupt { key: String, message: String },
}

impl Display for KeyValueError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io { key, source } => write!(f, "local storage io error for `{key}`: {source}"),
            Self::Corrupt { key, message } => {
                write!(f, "local storage value for `{key}` is corrupt: {message}")
            }
        }
    }
}

impl Error for KeyValueError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::Corrupt { .. } => None,
        }
    }
}

/// Minimal string key-value persistence.
pub trait KeyValueStorage {
    fn read(&self, key: &str) -> Result<Option<String>, KeyValueError>;
    fn write(&mut self, key: &str, value: &str) -> Result<(), KeyValueError>;
}

/// One `<key>.json` file per key inside a directory.
#[derive(Debug, Clone)]
pub struct FileKeyValueStorage {
    dir: PathBuf,
}

impl FileKeyValueStorage {
    /// Creates the directory when missing.
    pub fn open(dir: impl AsRef<Path>) -> Result<Self, KeyValueError> {
        let dir = dir.as_ref().to_path_buf();
        std::fs::create_dir_all(&dir).map_err(|source| KeyValueError::Io {
            key: dir.display().to_string(),
            source,
        })?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }
}

impl KeyValueStorage for FileKeyValueStorage {
    fn read(&self, key: &str) -> Result<Option<String>, KeyValueError> {
        match std::fs::read_to_string(self.path_for(key)) {
            Ok(value) => Ok(Some(value)),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(source) => Err(KeyValueError::Io {
                key: key.to_string(),
                source,
            }),
        }
    }

    fn write(&mut self, key: &str, value: &str) -> Result<(), KeyValueError> {
        let target = self.path_for(key);
        let staging = self.dir.join(format!(".{key}.json.tmp"));
        let io_error = |source| KeyValueError::Io {
            key: key.to_string(),
            source,
        };
        std::fs::write(&staging, value).map_err(io_error)?;
        std::fs::rename(&staging, &target).map_err(io_error)
    }
}

/// Shared in-memory key-value map. Clones share contents.
#[derive(Debug, Clone, Default)]
pub struct MemoryKeyValueStorage {
    values: Arc<Mutex<BTreeMap<String, String>>>,
}

impl MemoryKeyValueStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<String> {
        self.values.lock().get(key).cloned()
    }
}

impl KeyValueStorage for MemoryKeyValueStorage {
    fn read(&self, key: &str) -> Result<Option<String>, KeyValueError> {
        Ok(self.get(key))
    }

    fn write(&mut self, key: &str, value: &str) -> Result<(), KeyValueError> {
        self.values.lock().insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// [`RecordStore`] persisting each table as one JSON array under
/// `Table::storage_key()`.
#[derive(Debug)]
pub struct KeyValueRecordStore<S: KeyValueStorage> {
    storage: S,
    tables: MemoryTables,
}

impl<S: KeyValueStorage> KeyValueRecordStore<S> {
    /// Loads every table collection once.
    pub fn open(storage: S) -> StoreResult<Self> {
        let mut tables = MemoryTables::new();
        for table in Table::ALL {
            let key = table.storage_key();
            let Some(raw) = storage.read(key)? else {
                continue;
            };
            if raw.trim().is_empty() {
                continue;
            }
            let rows: Vec<RecordRow> =
                serde_json::from_str(&raw).map_err(|err| KeyValueError::Corrupt {
                    key: key.to_string(),
                    message: err.to_string(),
                })?;
            tables.replace(table, rows);
        }
        Ok(Self { storage, tables })
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    fn persist(&mut self, table: Table) -> StoreResult<()> {
        let key = table.storage_key();
        let encoded =
            serde_json::to_string(self.tables.rows(table)).map_err(|err| KeyValueError::Corrupt {
                key: key.to_string(),
                message: err.to_string(),
            })?;
        self.storage.write(key, &encoded)?;
        Ok(())
    }
}

impl<S: KeyValueStorage> RecordStore for KeyValueRecordStore<S> {
    fn select_for_owner(
        &self,
        table: Table,
        owner_id: &str,
        order_by: OrderBy,
    ) -> StoreResult<Vec<RecordRow>> {
        self.tables.select_for_owner(table, owner_id, order_by)
    }

    fn insert(&mut self, table: Table, owner_id: &str, row: RecordRow) -> StoreResult<RecordRow> {
        let stored = self.tables.insert(table, owner_id, row)?;
        self.persist(table)?;
        Ok(stored)
    }

    fn update_by_id(
        &mut self,
        table: Table,
        owner_id: &str,
        id: &str,
        patch: RecordRow,
    ) -> StoreResult<()> {
        self.tables.update_by_id(table, owner_id, id, patch)?;
        self.persist(table)
    }

    fn delete_by_id(&mut self, table: Table, owner_id: &str, id: &str) -> StoreResult<()> {
        self.tables.delete_by_id(table, owner_id, id)?;
        self.persist(table)
    }

    fn delete_by_ids(&mut self, table: Table, owner_id: &str, ids: &[String]) -> StoreResult<()> {
        self.tables.delete_by_ids(table, owner_id, ids)?;
        self.persist(table)
    }
}

#[cfg(test)]
mod tests {
    use super::{KeyValueRecordStore, KeyValueStorage, MemoryKeyValueStorage};
    use crate::repo::record_store::{RecordStore, RecordStoreError, Table};
    use crate::repo::rows::todo_to_row;
    use crate::model::todo::Todo;

    #[test]
    fn every_write_rewrites_the_table_key() {
        let storage = MemoryKeyValueStorage::new();
        let mut store = KeyValueRecordStore::open(storage.clone()).unwrap();
        let todo = Todo::new("buy milk", 1).unwrap();
        store
            .insert(Table::Todos, "u", todo_to_row(&todo, "u"))
            .unwrap();

        let raw = storage.get("vibe-coder-todos").unwrap();
        assert!(raw.contains("buy milk"));
        assert!(storage.get("vibe-coder-tasks").is_none());

        store.delete_by_id(Table::Todos, "u", &todo.id).unwrap();
        assert_eq!(storage.get("vibe-coder-todos").unwrap(), "[]");
    }

    #[test]
    fn corrupt_collection_fails_open() {
        let mut storage = MemoryKeyValueStorage::new();
        storage.write("vibe-coder-notes", "{not json").unwrap();
        let err = KeyValueRecordStore::open(storage).unwrap_err();
        assert!(matches!(err, RecordStoreError::Storage(_)));
    }
}
