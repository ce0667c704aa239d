//! Optimistic-write plumbing between stores and the record store.
//!
//! # Responsibility
//! - Carry row-level writes from stores to a persistence worker.
//! - Coalesce rapid edits (debounce) before they become writes.
//!
//! # Invariants
//! - Local state is applied before an intent is emitted.
//! - Remote failures never roll back local state.

pub mod debounce;
pub mod intent;
pub mod worker;
