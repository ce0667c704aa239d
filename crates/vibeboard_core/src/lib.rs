//! Core domain logic for VibeBoard: kanban board, quick todos and notes.
//! This crate is the single source of truth for ordering and sync invariants.

pub mod auth;
pub mod board;
pub mod clock;
pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod session;
pub mod store;
pub mod sync;
pub mod workspace;

pub use auth::{AuthError, IdentityProvider, InMemoryIdentityProvider, User};
pub use board::drag::{DragController, DragOutcome, DragState};
pub use board::order::{insert_at, next_order, sorted_column};
pub use board::projection::{project, SortBy};
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{ConfigError, CoreConfig, StorageMode};
pub use db::{open_db, open_db_in_memory, DbError, DbResult};
pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use model::note::{Note, NoteId, NotePatch};
pub use model::task::{ColumnId, Priority, Task, TaskId, TaskPatch, TaskValidationError};
pub use model::todo::{Todo, TodoId};
pub use repo::key_value::{
    FileKeyValueStorage, KeyValueError, KeyValueRecordStore, KeyValueStorage,
    MemoryKeyValueStorage,
};
pub use repo::memory_store::InMemoryRecordStore;
pub use repo::record_store::{OrderBy, RecordRow, RecordStore, RecordStoreError, StoreResult, Table};
pub use repo::sqlite_store::SqliteRecordStore;
pub use session::Session;
pub use store::note_store::NoteStore;
pub use store::task_store::TaskStore;
pub use store::todo_store::TodoStore;
pub use sync::intent::{SyncIntent, SyncOp, SyncOutbox};
pub use sync::worker::SyncStats;
pub use workspace::{open_record_store, Workspace, WorkspaceError, WorkspaceOptions};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
