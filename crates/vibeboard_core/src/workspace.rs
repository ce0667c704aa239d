//! Signed-in workspace: hydrated stores plus their persistence worker.
//!
//! # Responsibility
//! - Gate store construction on a present user.
//! - Load the owner's rows once, then hand the record store to the worker.
//! - Flush and join everything on close.
//!
//! # Invariants
//! - A malformed stored row is skipped, never fatal to hydration.
//! - After `close` returns, every emitted intent has been applied or
//!   counted as failed.

use crate::auth::{IdentityProvider, User};
use crate::clock::{Clock, SystemClock};
use crate::config::{CoreConfig, StorageMode};
use crate::db::open_db;
use crate::repo::key_value::{FileKeyValueStorage, KeyValueRecordStore};
use crate::repo::record_store::{OrderBy, RecordRow, RecordStore, RecordStoreError, Table};
use crate::repo::rows::{note_from_row, task_from_row, todo_from_row, RowError};
use crate::repo::sqlite_store::SqliteRecordStore;
use crate::session::Session;
use crate::store::note_store::NoteStore;
use crate::store::task_store::TaskStore;
use crate::store::todo_store::TodoStore;
use crate::sync::debounce::DEFAULT_DEBOUNCE_MS;
use crate::sync::intent::SyncOutbox;
use crate::sync::worker::{spawn_persistence_worker, SyncStats, WorkerHandle};
use log::{info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::Arc;

/// Workspace lifecycle failure.
#[derive(Debug)]
pub enum WorkspaceError {
    /// The identity provider has no current user.
    NotSignedIn,
    /// Opening or reading the record store failed.
    Store(RecordStoreError),
    /// The persistence worker thread could not start.
    Spawn(std::io::Error),
    /// The persistence worker panicked before draining.
    WorkerPanicked,
}

impl Display for WorkspaceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotSignedIn => write!(f, "no signed-in user"),
            Self::Store(err) => write!(f, "{err}"),
            Self::Spawn(err) => write!(f, "failed to start persistence worker: {err}"),
            Self::WorkerPanicked => write!(f, "persistence worker panicked"),
        }
    }
}

impl Error for WorkspaceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Store(err) => Some(err),
            Self::Spawn(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RecordStoreError> for WorkspaceError {
    fn from(value: RecordStoreError) -> Self {
        Self::Store(value)
    }
}

/// Tunables for [`Workspace::open`].
#[derive(Clone)]
pub struct WorkspaceOptions {
    pub note_debounce_ms: i64,
    pub clock: Arc<dyn Clock>,
}

impl Default for WorkspaceOptions {
    fn default() -> Self {
        Self {
            note_debounce_ms: DEFAULT_DEBOUNCE_MS,
            clock: Arc::new(SystemClock),
        }
    }
}

impl WorkspaceOptions {
    pub fn from_config(config: &CoreConfig) -> Self {
        Self {
            note_debounce_ms: config.note_debounce_ms,
            ..Self::default()
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }
}

/// Type-erased record store usable by the worker thread.
pub type BoxedRecordStore = Box<dyn RecordStore + Send>;

/// Opens the backend selected by `config.storage_mode`.
pub fn open_record_store(config: &CoreConfig) -> Result<BoxedRecordStore, WorkspaceError> {
    let store: BoxedRecordStore = match config.storage_mode {
        StorageMode::Sqlite => {
            let conn = open_db(&config.db_path).map_err(RecordStoreError::from)?;
            Box::new(SqliteRecordStore::try_new(conn)?)
        }
        StorageMode::Local => {
            let storage =
                FileKeyValueStorage::open(&config.local_dir).map_err(RecordStoreError::from)?;
            Box::new(KeyValueRecordStore::open(storage)?)
        }
    };
    info!(
        "event=record_store_open module=workspace status=ok mode={}",
        config.storage_mode.as_str()
    );
    Ok(store)
}

/// Stores of one signed-in user, backed by a running persistence worker.
pub struct Workspace<S> {
    user: User,
    tasks: TaskStore,
    todos: TodoStore,
    notes: NoteStore,
    worker: WorkerHandle<S>,
}

impl<S> Workspace<S>
where
    S: RecordStore + Send + 'static,
{
    /// Hydrates the current user's data from `store` and starts syncing.
    pub fn open<I>(identity: &I, store: S, options: WorkspaceOptions) -> Result<Self, WorkspaceError>
    where
        I: IdentityProvider + ?Sized,
    {
        let user = identity.current_user().ok_or(WorkspaceError::NotSignedIn)?;
        let owner_id = user.id.as_str();

        let tasks = hydrate(&store, Table::Tasks, owner_id, OrderBy::asc("sort_order"), task_from_row)?;
        let todos = hydrate(&store, Table::Todos, owner_id, OrderBy::desc("created_at"), todo_from_row)?;
        let notes = hydrate(&store, Table::Notes, owner_id, OrderBy::desc("updated_at"), note_from_row)?;

        let (outbox, receiver) = SyncOutbox::channel();
        let worker = spawn_persistence_worker(store, receiver).map_err(WorkspaceError::Spawn)?;
        let session = Session::new(user.clone(), outbox, options.clock);

        info!(
            "event=workspace_open module=workspace status=ok tasks={} todos={} notes={}",
            tasks.len(),
            todos.len(),
            notes.len()
        );

        Ok(Self {
            tasks: TaskStore::hydrate(session.clone(), tasks),
            todos: TodoStore::hydrate(session.clone(), todos),
            notes: NoteStore::hydrate(session, notes, options.note_debounce_ms),
            user,
            worker,
        })
    }

    pub fn user(&self) -> &User {
        &self.user
    }

    pub fn tasks(&self) -> &TaskStore {
        &self.tasks
    }

    pub fn tasks_mut(&mut self) -> &mut TaskStore {
        &mut self.tasks
    }

    pub fn todos(&self) -> &TodoStore {
        &self.todos
    }

    pub fn todos_mut(&mut self) -> &mut TodoStore {
        &mut self.todos
    }

    pub fn notes(&self) -> &NoteStore {
        &self.notes
    }

    pub fn notes_mut(&mut self) -> &mut NoteStore {
        &mut self.notes
    }

    /// Flushes pending note writes, waits for the worker and returns its
    /// counters.
    pub fn close(self) -> Result<SyncStats, WorkspaceError> {
        self.shutdown().map(|(stats, _)| stats)
    }

    /// Like [`Workspace::close`], but also hands back the record store.
    pub fn shutdown(self) -> Result<(SyncStats, S), WorkspaceError> {
        let Self {
            tasks,
            todos,
            mut notes,
            worker,
            ..
        } = self;
        let flushed = notes.flush_all();
        // Dropping the stores drops every outbox clone, which ends the worker.
        drop(tasks);
        drop(todos);
        drop(notes);

        let (stats, store) = worker.join().map_err(|_| WorkspaceError::WorkerPanicked)?;
        info!(
            "event=workspace_close module=workspace status=ok flushed_notes={} applied={} failed={}",
            flushed, stats.applied, stats.failed
        );
        Ok((stats, store))
    }
}

fn hydrate<S, T>(
    store: &S,
    table: Table,
    owner_id: &str,
    order_by: OrderBy,
    parse: fn(&RecordRow) -> Result<T, RowError>,
) -> Result<Vec<T>, WorkspaceError>
where
    S: RecordStore + ?Sized,
{
    let rows = store.select_for_owner(table, owner_id, order_by)?;
    let mut items = Vec::with_capacity(rows.len());
    for row in &rows {
        match parse(row) {
            Ok(item) => items.push(item),
            Err(err) => warn!(
                "event=hydrate_row_skipped module=workspace status=error table={} column={}",
                err.table, err.column
            ),
        }
    }
    Ok(items)
}
