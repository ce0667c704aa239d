//! Explicit per-user session context handed to every store.
//!
//! # Invariants
//! - A session always carries a signed-in user.
//! - Every intent a store emits is scoped to `user.id`.

use crate::auth::User;
use crate::clock::Clock;
use crate::repo::record_store::Table;
use crate::sync::intent::{SyncIntent, SyncOp, SyncOutbox};
use std::sync::Arc;

/// User, outbound sync channel and clock shared by the stores of one
/// workspace.
#[derive(Clone)]
pub struct Session {
    user: User,
    outbox: SyncOutbox,
    clock: Arc<dyn Clock>,
}

impl Session {
    pub fn new(user: User, outbox: SyncOutbox, clock: Arc<dyn Clock>) -> Self {
        Self {
            user,
            outbox,
            clock,
        }
    }

    pub fn user(&self) -> &User {
        &self.user
    }

    pub fn owner_id(&self) -> &str {
        &self.user.id
    }

    /// Current time in Unix epoch milliseconds.
    pub fn now(&self) -> i64 {
        self.clock.now_ms()
    }

    /// Queues one write for `table` scoped to this session's owner.
    pub fn emit(&self, table: Table, op: SyncOp) -> bool {
        self.outbox
            .send(SyncIntent::new(table, self.user.id.clone(), op))
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("owner_id", &self.user.id)
            .finish_non_exhaustive()
    }
}
