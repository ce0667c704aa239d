//! Sync intents and the outbound channel stores write them to.
//!
//! # Responsibility
//! - Describe one pending remote write as plain data.
//! - Hand intents to the persistence worker without blocking the caller.
//!
//! # Invariants
//! - Sending never fails loudly: a closed channel is logged and ignored,
//!   local state stays authoritative.
//! - Intents are applied in send order per outbox.

use crate::repo::record_store::{RecordRow, RecordStore, StoreResult, Table};
use log::warn;
use std::sync::mpsc::{channel, Receiver, Sender};

/// Row-level write operation.
#[derive(Debug, Clone, PartialEq)]
pub enum SyncOp {
    Insert { row: RecordRow },
    Update { id: String, patch: RecordRow },
    Delete { id: String },
    DeleteMany { ids: Vec<String> },
}

impl SyncOp {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Insert { .. } => "insert",
            Self::Update { .. } => "update",
            Self::Delete { .. } => "delete",
            Self::DeleteMany { .. } => "delete_many",
        }
    }
}

/// One remote write emitted by a store after its local apply.
#[derive(Debug, Clone, PartialEq)]
pub struct SyncIntent {
    pub table: Table,
    pub owner_id: String,
    pub op: SyncOp,
}

impl SyncIntent {
    pub fn new(table: Table, owner_id: impl Into<String>, op: SyncOp) -> Self {
        Self {
            table,
            owner_id: owner_id.into(),
            op,
        }
    }

    /// Id of the single row this intent targets, if any.
    pub fn target_id(&self) -> Option<&str> {
        match &self.op {
            SyncOp::Insert { row } => row.get("id").and_then(|value| value.as_str()),
            SyncOp::Update { id, .. } | SyncOp::Delete { id } => Some(id.as_str()),
            SyncOp::DeleteMany { .. } => None,
        }
    }

    /// Executes the write against `store`.
    pub fn apply_to<S: RecordStore + ?Sized>(self, store: &mut S) -> StoreResult<()> {
        let Self {
            table,
            owner_id,
            op,
        } = self;
        match op {
            SyncOp::Insert { row } => store.insert(table, &owner_id, row).map(|_| ()),
            SyncOp::Update { id, patch } => store.update_by_id(table, &owner_id, &id, patch),
            SyncOp::Delete { id } => store.delete_by_id(table, &owner_id, &id),
            SyncOp::DeleteMany { ids } => store.delete_by_ids(table, &owner_id, &ids),
        }
    }
}

/// Sending half of the sync channel. Cheap to clone; one per store.
#[derive(Debug, Clone)]
pub struct SyncOutbox {
    sender: Sender<SyncIntent>,
}

impl SyncOutbox {
    /// Creates a connected outbox/receiver pair.
    pub fn channel() -> (Self, Receiver<SyncIntent>) {
        let (sender, receiver) = channel();
        (Self { sender }, receiver)
    }

    /// Queues an intent. Returns `false` when the worker is gone.
    pub fn send(&self, intent: SyncIntent) -> bool {
        let table = intent.table;
        let op = intent.op.label();
        match self.sender.send(intent) {
            Ok(()) => true,
            Err(_) => {
                warn!(
                    "event=sync_enqueue module=sync status=dropped table={} op={} reason=worker_closed",
                    table, op
                );
                false
            }
        }
    }
}
