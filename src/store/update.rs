//! Update paths
//!
//! Two ways to change a stored record:
//!
//! - In place (`update_data`): the slot's payload is swapped for the new
//!   value and every tree entry is re-pointed at it, so one copy is held.
//!   The caller promises not to change any field an index orders by. If the
//!   new value orders differently under any index, the trees keep the key
//!   captured at insert time instead, so a broken promise cannot corrupt a
//!   tree; the record simply stays where its old key put it.
//! - With indexes (`update_with_indexes`): the old record is removed from
//!   every tree and the new value is inserted into every tree as a fresh
//!   record. This is the only safe way to change ordering fields.
//!
//! Caller closures always see a copy and run before anything is modified,
//! so a declined or panicking closure leaves the store untouched.

use std::cmp::Ordering;
use std::sync::Arc;

use super::memstore::{MemStore, StoreState};
use super::record::{IndexedRecord, RecordHandle};
use crate::observability::{log_debug, log_trace, Event};

impl<R: IndexedRecord> StoreState<R> {
    /// Swap the payload of a live slot.
    ///
    /// Tree entries share the new payload when it orders exactly like the
    /// old key under every index. Otherwise they keep the old key.
    fn replace_payload(&mut self, handle: &RecordHandle<R>, payload: R) -> bool {
        if !self.slots.contains_key(&handle.slot) {
            return false;
        }
        let payload = Arc::new(payload);

        let same_order = self
            .trees
            .iter()
            .all(|tree| payload.compare(tree.index(), &handle.key) == Ordering::Equal);
        if same_order {
            let repointed = RecordHandle {
                slot: handle.slot,
                key: Arc::clone(&payload),
            };
            for tree in &mut self.trees {
                let replaced = tree.insert_or_replace(&repointed);
                debug_assert_eq!(replaced.map(|h| h.slot), Some(handle.slot));
            }
        }

        self.slots.insert(handle.slot, payload);
        true
    }
}

impl<R: IndexedRecord> MemStore<R> {
    /// Replace the record matching `query` under `index` without reordering.
    ///
    /// `modify` receives a copy of the stored record and returns the new
    /// value, or `None` to leave the store untouched. The change is visible
    /// through every index at once.
    ///
    /// `modify` must not change fields any index orders by; use
    /// [`update_with_indexes`](Self::update_with_indexes) for that. If it
    /// does, the indexes keep ordering the record by its insert-time value,
    /// which stays alive alongside the new payload.
    pub fn update_data<F>(&self, query: &R, index: R::Index, modify: F) -> Option<R>
    where
        F: FnOnce(R) -> Option<R>,
    {
        let pos = self.position(index)?;
        let query = Arc::new(query.clone());

        let mut state = self.write();
        self.update_locked(&mut state, pos, &query, modify)
    }

    /// Run `run` against a copy of the record matching `query` under `index`.
    ///
    /// Returns the copy if `run` accepts it. Never mutates.
    pub fn apply_data<F>(&self, query: &R, index: R::Index, run: F) -> Option<R>
    where
        F: FnOnce(&R) -> bool,
    {
        let pos = self.position(index)?;
        let query = Arc::new(query.clone());

        let state = self.read();
        self.apply_locked(&state, pos, &query, run)
    }

    /// [`update_data`](Self::update_data) for each query in turn.
    ///
    /// Results line up with `queries`. Elements are independent: a miss or
    /// a declined update on one does not affect the others.
    pub fn update_data_subset<F>(&self, queries: &[R], index: R::Index, mut modify: F) -> Vec<Option<R>>
    where
        F: FnMut(R) -> Option<R>,
    {
        let Some(pos) = self.position(index) else {
            return queries.iter().map(|_| None).collect();
        };

        let mut state = self.write();
        queries
            .iter()
            .map(|query| {
                let query = Arc::new(query.clone());
                self.update_locked(&mut state, pos, &query, &mut modify)
            })
            .collect()
    }

    /// [`apply_data`](Self::apply_data) for each query in turn.
    pub fn apply_data_subset<F>(&self, queries: &[R], index: R::Index, mut run: F) -> Vec<Option<R>>
    where
        F: FnMut(&R) -> bool,
    {
        let Some(pos) = self.position(index) else {
            return queries.iter().map(|_| None).collect();
        };

        let state = self.read();
        queries
            .iter()
            .map(|query| {
                let query = Arc::new(query.clone());
                self.apply_locked(&state, pos, &query, &mut run)
            })
            .collect()
    }

    /// Replace the record matching `query` under `index`, reordering it in
    /// every index.
    ///
    /// The old record is removed from every index and the value returned by
    /// `modify` is inserted into every index as a new record. If the new
    /// value collides with other records, they are replaced as by
    /// [`add`](Self::add). Returns the new value, or `None` on a miss or
    /// when `modify` declines.
    pub fn update_with_indexes<F>(&self, query: &R, index: R::Index, modify: F) -> Option<R>
    where
        F: FnOnce(R) -> Option<R>,
    {
        let pos = self.position(index)?;
        let query = Arc::new(query.clone());

        let mut state = self.write();
        let handle = self.locate(&state, pos, &query)?;
        let current = R::clone(state.payload(handle.slot)?);

        let Some(updated) = modify(current) else {
            self.note_rejected(index);
            return None;
        };

        state.unlink(&handle);
        let evicted = state.insert_everywhere(Arc::new(updated.clone()));
        drop(state);

        self.metrics.increment_updates_applied();
        self.metrics.increment_reindexes();
        if !evicted.is_empty() {
            self.metrics.add_evictions(evicted.len() as u64);
            log_debug!(event = %Event::RecordEvicted, store = %self.name, count = evicted.len());
        }
        log_debug!(event = %Event::RecordReindexed, store = %self.name, index = ?index);
        Some(updated)
    }

    fn update_locked<F>(&self, state: &mut StoreState<R>, pos: usize, query: &Arc<R>, modify: F) -> Option<R>
    where
        F: FnOnce(R) -> Option<R>,
    {
        let handle = self.locate(state, pos, query)?;
        let current = R::clone(state.payload(handle.slot)?);

        let Some(updated) = modify(current) else {
            self.note_rejected(self.indexes()[pos]);
            return None;
        };

        if !state.replace_payload(&handle, updated.clone()) {
            return None;
        }
        self.metrics.increment_updates_applied();
        log_trace!(event = %Event::RecordUpdated, store = %self.name);
        Some(updated)
    }

    fn apply_locked<F>(&self, state: &StoreState<R>, pos: usize, query: &Arc<R>, run: F) -> Option<R>
    where
        F: FnOnce(&R) -> bool,
    {
        let handle = self.locate(state, pos, query)?;
        let current = R::clone(state.payload(handle.slot)?);
        run(&current).then_some(current)
    }

    fn note_rejected(&self, index: R::Index) {
        self.metrics.increment_updates_rejected();
        log_trace!(event = %Event::UpdateRejected, store = %self.name, index = ?index);
    }
}
