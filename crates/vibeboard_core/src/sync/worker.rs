//! Persistence worker draining sync intents into a record store.
//!
//! # Responsibility
//! - Own the record store for the lifetime of a session.
//! - Apply intents in arrival order, fire-and-forget.
//!
//! # Invariants
//! - A failed write is logged and counted, never retried, never reported
//!   back to the stores.
//! - The worker stops once every `SyncOutbox` clone has been dropped.

use crate::repo::record_store::RecordStore;
use crate::sync::intent::SyncIntent;
use log::{debug, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::io;
use std::sync::mpsc::Receiver;
use std::thread::{Builder, JoinHandle};

const WORKER_THREAD_NAME: &str = "vibeboard-sync";

/// Counters reported when a worker finishes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncStats {
    /// Intents the store accepted.
    pub applied: usize,
    /// Intents the store rejected.
    pub failed: usize,
}

/// Applies queued intents to `S`.
pub struct PersistenceWorker<S: RecordStore> {
    store: S,
    receiver: Receiver<SyncIntent>,
    stats: SyncStats,
}

impl<S: RecordStore> PersistenceWorker<S> {
    pub fn new(store: S, receiver: Receiver<SyncIntent>) -> Self {
        Self {
            store,
            receiver,
            stats: SyncStats::default(),
        }
    }

    /// Applies one intent. Returns whether the store accepted it.
    pub fn apply(&mut self, intent: SyncIntent) -> bool {
        let table = intent.table;
        let op = intent.op.label();
        match intent.apply_to(&mut self.store) {
            Ok(()) => {
                self.stats.applied += 1;
                debug!(
                    "event=sync_write module=sync status=ok table={} op={}",
                    table, op
                );
                true
            }
            Err(err) => {
                self.stats.failed += 1;
                warn!(
                    "event=sync_write module=sync status=error table={} op={} error={}",
                    table, op, err
                );
                false
            }
        }
    }

    /// Applies every intent already queued, without blocking.
    pub fn drain(&mut self) -> usize {
        let mut processed = 0;
        while let Ok(intent) = self.receiver.try_recv() {
            self.apply(intent);
            processed += 1;
        }
        processed
    }

    /// Blocks applying intents until all senders are dropped.
    pub fn run(mut self) -> (SyncStats, S) {
        while let Ok(intent) = self.receiver.recv() {
            self.apply(intent);
        }
        (self.stats, self.store)
    }

    pub fn stats(&self) -> SyncStats {
        self.stats
    }

    pub fn store(&self) -> &S {
        &self.store
    }
}

/// The worker thread panicked; the store is lost.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkerPanicked;

impl Display for WorkerPanicked {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "persistence worker panicked")
    }
}

impl Error for WorkerPanicked {}

/// Handle to a worker running on its own thread.
pub struct WorkerHandle<S> {
    join: JoinHandle<(SyncStats, S)>,
}

impl<S> WorkerHandle<S> {
    /// Waits for the worker to finish draining.
    ///
    /// Only returns once every outbox clone is dropped.
    pub fn join(self) -> Result<(SyncStats, S), WorkerPanicked> {
        self.join.join().map_err(|_| WorkerPanicked)
    }
}

/// Starts a named worker thread owning `store`.
pub fn spawn_persistence_worker<S>(
    store: S,
    receiver: Receiver<SyncIntent>,
) -> io::Result<WorkerHandle<S>>
where
    S: RecordStore + Send + 'static,
{
    let worker = PersistenceWorker::new(store, receiver);
    let join = Builder::new()
        .name(WORKER_THREAD_NAME.to_string())
        .spawn(move || worker.run())?;
    Ok(WorkerHandle { join })
}

#[cfg(test)]
mod tests {
    use super::{spawn_persistence_worker, PersistenceWorker, SyncStats};
    use crate::repo::memory_store::InMemoryRecordStore;
    use crate::repo::record_store::{RecordRow, Table};
    use crate::sync::intent::{SyncIntent, SyncOp, SyncOutbox};
    use serde_json::json;

    fn todo_row(id: &str) -> RecordRow {
        let mut row = RecordRow::new();
        row.insert("id".into(), json!(id));
        row.insert("text".into(), json!("x"));
        row.insert("completed".into(), json!(false));
        row.insert("created_at".into(), json!("2024-01-01T00:00:00.000Z"));
        row
    }

    #[test]
    fn drain_counts_failures_without_stopping() {
        let store = InMemoryRecordStore::new();
        let (outbox, receiver) = SyncOutbox::channel();
        let mut worker = PersistenceWorker::new(store.clone(), receiver);

        outbox.send(SyncIntent::new(
            Table::Todos,
            "u",
            SyncOp::Delete { id: "missing".into() },
        ));
        outbox.send(SyncIntent::new(
            Table::Todos,
            "u",
            SyncOp::Insert { row: todo_row("a") },
        ));

        assert_eq!(worker.drain(), 2);
        assert_eq!(
            worker.stats(),
            SyncStats {
                applied: 1,
                failed: 1
            }
        );
        assert_eq!(store.rows(Table::Todos).len(), 1);
    }

    #[test]
    fn spawned_worker_exits_when_outbox_dropped() {
        let store = InMemoryRecordStore::new();
        let (outbox, receiver) = SyncOutbox::channel();
        let handle = spawn_persistence_worker(store.clone(), receiver).unwrap();

        outbox.send(SyncIntent::new(
            Table::Todos,
            "u",
            SyncOp::Insert { row: todo_row("a") },
        ));
        drop(outbox);

        let (stats, _) = handle.join().unwrap();
        assert_eq!(stats.applied, 1);
        assert_eq!(store.rows(Table::Todos).len(), 1);
    }
}
