//! Durable record store contract and its backends.
//!
//! # Responsibility
//! - Define the owner-scoped CRUD surface used by the persistence worker.
//! - Translate board entities to storage rows and back.
//! - Isolate SQLite and local key-value details from stores and services.
//!
//! # Invariants
//! - Backends validate row keys against `Table::columns()`.
//! - Backends return semantic errors (`NotFound`, `Duplicate`) in addition
//!   to transport errors.

pub mod key_value;
pub mod memory_store;
pub mod record_store;
pub mod rows;
pub mod sqlite_store;
