//! Notes panel store with debounced remote writes.
//!
//! # Responsibility
//! - Own the signed-in user's notes, newest first.
//! - Apply every edit locally at once; coalesce remote writes per note.
//!
//! # Invariants
//! - At most one pending remote write per note; a newer edit replaces it
//!   and its fields are merged on top of the pending ones.
//! - Deleting a note cancels its pending write.
//! - An immediate update absorbs any pending write for the same note.

use crate::model::note::{Note, NoteId, NotePatch};
use crate::repo::record_store::Table;
use crate::repo::rows::{note_patch_row, note_to_row};
use crate::session::Session;
use crate::sync::debounce::Debouncer;
use crate::sync::intent::SyncOp;
use log::debug;

#[derive(Debug)]
pub struct NoteStore {
    session: Session,
    notes: Vec<Note>,
    pending: Debouncer<NoteId, NotePatch>,
}

impl NoteStore {
    /// Creates an empty store whose debounced writes wait `debounce_ms`.
    pub fn new(session: Session, debounce_ms: i64) -> Self {
        Self::hydrate(session, Vec::new(), debounce_ms)
    }

    /// Seeds the store; `notes` should already be ordered newest first.
    pub fn hydrate(session: Session, notes: Vec<Note>, debounce_ms: i64) -> Self {
        Self {
            session,
            notes,
            pending: Debouncer::new(debounce_ms),
        }
    }

    /// Prepends an untitled empty note and returns it.
    pub fn add(&mut self) -> Note {
        let note = Note::untitled(self.session.now());
        self.notes.insert(0, note.clone());
        self.session.emit(
            Table::Notes,
            SyncOp::Insert {
                row: note_to_row(&note, self.session.owner_id()),
            },
        );
        note
    }

    /// Applies `patch` and writes it through immediately.
    pub fn update(&mut self, id: &str, patch: NotePatch) -> bool {
        let now = self.session.now();
        let Some(note) = self.notes.iter_mut().find(|note| note.id == id) else {
            return false;
        };
        if !note.apply(&patch, now) {
            return false;
        }
        let updated_at = note.updated_at;

        let mut combined = self.pending.cancel(&id.to_string()).unwrap_or_default();
        combined.merge(patch);
        self.emit_update(id.to_string(), &combined, updated_at);
        true
    }

    /// Applies `patch` locally and schedules the remote write.
    pub fn update_debounced(&mut self, id: &str, patch: NotePatch) -> bool {
        let now = self.session.now();
        let Some(note) = self.notes.iter_mut().find(|note| note.id == id) else {
            return false;
        };
        if !note.apply(&patch, now) {
            return false;
        }
        self.pending.schedule_with(id.to_string(), now, |previous| {
            let mut combined = previous.unwrap_or_default();
            combined.merge(patch);
            combined
        });
        true
    }

    /// Emits every pending write whose quiet period has elapsed.
    pub fn flush_due(&mut self) -> usize {
        let due = self.pending.take_due(self.session.now());
        self.emit_pending(due)
    }

    /// Emits every pending write regardless of deadline.
    pub fn flush_all(&mut self) -> usize {
        let pending = self.pending.take_all();
        self.emit_pending(pending)
    }

    /// Removes note `id` and drops its pending write.
    pub fn delete(&mut self, id: &str) -> bool {
        let Some(index) = self.notes.iter().position(|note| note.id == id) else {
            return false;
        };
        if self.pending.cancel(&id.to_string()).is_some() {
            debug!("event=note_write_cancelled module=store status=ok reason=deleted");
        }
        let removed = self.notes.remove(index);
        self.session
            .emit(Table::Notes, SyncOp::Delete { id: removed.id });
        true
    }

    pub fn notes(&self) -> &[Note] {
        &self.notes
    }

    pub fn get(&self, id: &str) -> Option<&Note> {
        self.notes.iter().find(|note| note.id == id)
    }

    /// Number of notes with a write still waiting for its quiet period.
    pub fn pending_writes(&self) -> usize {
        self.pending.len()
    }

    pub fn is_pending(&self, id: &str) -> bool {
        self.pending.is_pending(&id.to_string())
    }

    /// Deadline of the earliest pending write.
    pub fn next_flush_at(&self) -> Option<i64> {
        self.pending.next_deadline()
    }

    fn emit_pending(&mut self, entries: Vec<(NoteId, NotePatch)>) -> usize {
        let mut emitted = 0;
        for (id, patch) in entries {
            let Some(updated_at) = self.get(&id).map(|note| note.updated_at) else {
                continue;
            };
            self.emit_update(id, &patch, updated_at);
            emitted += 1;
        }
        emitted
    }

    fn emit_update(&self, id: NoteId, patch: &NotePatch, updated_at: i64) {
        self.session.emit(
            Table::Notes,
            SyncOp::Update {
                id,
                patch: note_patch_row(patch, updated_at),
            },
        );
    }
}
