//! Domain model for the board, quick-todo list and notes panel.
//!
//! # Responsibility
//! - Define canonical records owned by the stores.
//! - Keep serialization names aligned with the local snapshot format
//!   (camelCase fields, kebab-case column ids).
//!
//! # Invariants
//! - Every record is identified by a stable opaque string id.
//! - Deletion is a hard removal; nothing cascades.

pub mod note;
pub mod task;
pub mod todo;
