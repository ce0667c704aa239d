//! Session-scoped in-memory stores.
//!
//! # Responsibility
//! - Own the canonical collections the UI reads from.
//! - Turn every local mutation into sync intents on the session outbox.
//!
//! # Invariants
//! - Validation failures and unknown ids are silent no-ops.
//! - Stores are single-writer; reads always observe the latest write.

pub mod note_store;
pub mod task_store;
pub mod todo_store;
