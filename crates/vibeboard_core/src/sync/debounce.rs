//! Keyed debouncer for coalescing rapid edits into one remote write.
//!
//! # Invariants
//! - At most one pending entry per key.
//! - Scheduling an existing key replaces its token and pushes its deadline
//!   to `now + delay`.
//! - Time is passed in by the caller; nothing here sleeps.

use std::collections::BTreeMap;

/// Default quiet period for note edits, in milliseconds.
pub const DEFAULT_DEBOUNCE_MS: i64 = 500;

/// Identifies one scheduled write; a replaced write gets a new token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DebounceToken(u64);

#[derive(Debug)]
struct Pending<V> {
    token: DebounceToken,
    due_at: i64,
    value: V,
}

/// Map from key to the latest pending value and its deadline.
#[derive(Debug)]
pub struct Debouncer<K: Ord + Clone, V> {
    delay_ms: i64,
    next_token: u64,
    pending: BTreeMap<K, Pending<V>>,
}

impl<K: Ord + Clone, V> Debouncer<K, V> {
    pub fn new(delay_ms: i64) -> Self {
        Self {
            delay_ms: delay_ms.max(0),
            next_token: 0,
            pending: BTreeMap::new(),
        }
    }

    pub fn delay_ms(&self) -> i64 {
        self.delay_ms
    }

    /// Cancels any pending value for `key` and schedules `value`.
    pub fn schedule(&mut self, key: K, value: V, now: i64) -> DebounceToken {
        self.schedule_with(key, now, |_| value)
    }

    /// Like [`Debouncer::schedule`], but builds the new value from the one
    /// being replaced.
    pub fn schedule_with(
        &mut self,
        key: K,
        now: i64,
        build: impl FnOnce(Option<V>) -> V,
    ) -> DebounceToken {
        let previous = self.pending.remove(&key).map(|pending| pending.value);
        let token = DebounceToken(self.next_token);
        self.next_token += 1;
        self.pending.insert(
            key,
            Pending {
                token,
                due_at: now.saturating_add(self.delay_ms),
                value: build(previous),
            },
        );
        token
    }

    /// Drops the pending value for `key`.
    pub fn cancel(&mut self, key: &K) -> Option<V> {
        self.pending.remove(key).map(|pending| pending.value)
    }

    pub fn is_pending(&self, key: &K) -> bool {
        self.pending.contains_key(key)
    }

    /// Token currently scheduled for `key`.
    pub fn token(&self, key: &K) -> Option<DebounceToken> {
        self.pending.get(key).map(|pending| pending.token)
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Earliest deadline among pending entries.
    pub fn next_deadline(&self) -> Option<i64> {
        self.pending.values().map(|pending| pending.due_at).min()
    }

    /// Removes and returns every entry whose deadline is `<= now`, earliest
    /// deadline first.
    pub fn take_due(&mut self, now: i64) -> Vec<(K, V)> {
        let due_keys: Vec<K> = self
            .pending
            .iter()
            .filter(|(_, pending)| pending.due_at <= now)
            .map(|(key, _)| key.clone())
            .collect();

        let mut due: Vec<(i64, DebounceToken, K, V)> = due_keys
            .into_iter()
            .filter_map(|key| {
                self.pending
                    .remove(&key)
                    .map(|pending| (pending.due_at, pending.token, key, pending.value))
            })
            .collect();
        due.sort_by_key(|(due_at, token, _, _)| (*due_at, *token));
        due.into_iter().map(|(_, _, key, value)| (key, value)).collect()
    }

    /// Removes and returns every pending entry regardless of deadline.
    pub fn take_all(&mut self) -> Vec<(K, V)> {
        self.take_due(i64::MAX)
    }
}
