//! Store coordinator
//!
//! Owns one `IndexTree` per declared index plus the slot arena holding
//! record payloads, all behind a single reader/writer lock.
//!
//! # Invariants
//!
//! - Every tree holds exactly the same set of slots
//! - A logical record has one slot, referenced by every tree
//! - A record's position in every tree matches its ordering key; any change
//!   to ordering fields removes the record from every tree and reinserts it
//!
//! # Locking
//!
//! - Exclusive: `add`, `add_or_get`, `delete`, `update_data`,
//!   `update_data_subset`, `update_with_indexes`
//! - Shared: `get`, `get_range`, `range`, `min`, `max`, `len`, `count`,
//!   `apply_data`, `apply_data_subset`
//!
//! Closures passed to the store run while the lock is held and must not call
//! back into the same store.

use std::collections::HashMap;
use std::ops::ControlFlow;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use super::config::StoreConfig;
use super::errors::StoreResult;
use super::record::{IndexedRecord, RecordHandle, SlotId};
use super::tree::IndexTree;
use crate::observability::{log_debug, log_trace, log_warn, Event, MetricsSnapshot, StoreMetrics};

/// Everything guarded by the store lock.
pub(super) struct StoreState<R: IndexedRecord> {
    /// One tree per index, in declaration order
    pub(super) trees: Vec<IndexTree<R>>,
    /// Current payload of every live record
    pub(super) slots: HashMap<SlotId, Arc<R>>,
    /// Next slot id to hand out
    next_slot: u64,
}

impl<R: IndexedRecord> StoreState<R> {
    fn new(indexes: &[R::Index]) -> Self {
        Self {
            trees: indexes.iter().map(|index| IndexTree::new(*index)).collect(),
            slots: HashMap::new(),
            next_slot: 0,
        }
    }

    fn allocate(&mut self, key: Arc<R>) -> RecordHandle<R> {
        let slot = SlotId::new(self.next_slot);
        self.next_slot += 1;
        RecordHandle { slot, key }
    }

    /// Current payload of `slot`
    pub(super) fn payload(&self, slot: SlotId) -> Option<&Arc<R>> {
        self.slots.get(&slot)
    }

    /// First record found equal to `key` under any index, in declaration order.
    fn find_any(&self, key: &Arc<R>) -> Option<RecordHandle<R>> {
        self.trees.iter().find_map(|tree| tree.get(key))
    }

    /// Insert a fresh record into every tree.
    ///
    /// Records that compare equal to `key` under any index are removed from
    /// every tree first, so the trees keep identical membership. Returns the
    /// evicted payloads.
    pub(super) fn insert_everywhere(&mut self, key: Arc<R>) -> Vec<Arc<R>> {
        let mut colliding: Vec<RecordHandle<R>> = Vec::new();
        for tree in &self.trees {
            if let Some(existing) = tree.get(&key) {
                if !colliding.iter().any(|h| h.slot == existing.slot) {
                    colliding.push(existing);
                }
            }
        }

        let evicted = colliding
            .iter()
            .filter_map(|handle| self.unlink(handle))
            .collect();

        let handle = self.allocate(key);
        for tree in &mut self.trees {
            let replaced = tree.insert_or_replace(&handle);
            debug_assert!(replaced.is_none(), "collisions are evicted before insert");
        }
        self.slots.insert(handle.slot, Arc::clone(&handle.key));

        evicted
    }

    /// Remove `handle` from every tree and drop its slot.
    ///
    /// Uses the handle's canonical key, so each tree locates the entry with
    /// its own ordering.
    pub(super) fn unlink(&mut self, handle: &RecordHandle<R>) -> Option<Arc<R>> {
        for tree in &mut self.trees {
            let removed = tree.remove(&handle.key);
            debug_assert_eq!(removed.map(|h| h.slot), Some(handle.slot));
        }
        self.slots.remove(&handle.slot)
    }

    /// Remove the record matching `query` in tree `pos`, then from every other tree.
    fn remove_via(&mut self, pos: usize, query: &Arc<R>) -> Option<Arc<R>> {
        let handle = self.trees[pos].remove(query)?;
        for (i, tree) in self.trees.iter_mut().enumerate() {
            if i != pos {
                tree.remove(&handle.key);
            }
        }
        self.slots.remove(&handle.slot)
    }

    /// Whether every tree holds exactly the slots of the arena.
    pub(super) fn is_consistent(&self) -> bool {
        self.trees.iter().all(|tree| {
            tree.len() == self.slots.len() && tree.slots().all(|slot| self.slots.contains_key(&slot))
        })
    }
}

/// An in-memory record store kept consistent across several ordered indexes.
///
/// Every operation that names an index the store does not declare returns
/// `None` (or visits nothing) instead of failing.
pub struct MemStore<R: IndexedRecord> {
    /// Name used in log events
    pub(super) name: String,
    /// Declared indexes, in declaration order
    indexes: Vec<R::Index>,
    /// Index to tree position
    positions: HashMap<R::Index, usize>,
    pub(super) state: RwLock<StoreState<R>>,
    pub(super) metrics: StoreMetrics,
}

impl<R: IndexedRecord> MemStore<R> {
    /// Create a store maintaining `indexes`.
    ///
    /// Fails if `indexes` is empty or repeats an index.
    pub fn new(indexes: impl IntoIterator<Item = R::Index>) -> StoreResult<Self> {
        Self::from_config(StoreConfig::new(indexes))
    }

    /// Create a store from a configuration.
    pub fn from_config(config: StoreConfig<R::Index>) -> StoreResult<Self> {
        config.validate()?;

        let StoreConfig { name, indexes } = config;
        let positions = indexes
            .iter()
            .enumerate()
            .map(|(pos, index)| (*index, pos))
            .collect();
        let state = StoreState::new(&indexes);

        log_debug!(
            event = %Event::StoreCreated,
            store = %name,
            indexes = ?indexes,
        );

        Ok(Self {
            name,
            indexes,
            positions,
            state: RwLock::new(state),
            metrics: StoreMetrics::new(),
        })
    }

    /// Store name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Declared indexes, in declaration order
    pub fn indexes(&self) -> &[R::Index] {
        &self.indexes
    }

    /// Whether `index` was declared
    pub fn contains_index(&self, index: R::Index) -> bool {
        self.positions.contains_key(&index)
    }

    /// Counters since the store was created
    pub fn metrics(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }

    pub(super) fn read(&self) -> RwLockReadGuard<'_, StoreState<R>> {
        self.state.read().unwrap_or_else(|poisoned| {
            log_warn!(event = %Event::LockRecovered, store = %self.name);
            PoisonError::into_inner(poisoned)
        })
    }

    pub(super) fn write(&self) -> RwLockWriteGuard<'_, StoreState<R>> {
        self.state.write().unwrap_or_else(|poisoned| {
            log_warn!(event = %Event::LockRecovered, store = %self.name);
            PoisonError::into_inner(poisoned)
        })
    }

    /// Tree position of `index`, or `None` if it was never declared.
    pub(super) fn position(&self, index: R::Index) -> Option<usize> {
        let pos = self.positions.get(&index).copied();
        if pos.is_none() {
            self.metrics.increment_unknown_index();
            log_trace!(event = %Event::UnknownIndex, store = %self.name, index = ?index);
        }
        pos
    }

    /// Point lookup in tree `pos`, counted in the metrics.
    pub(super) fn locate(
        &self,
        state: &StoreState<R>,
        pos: usize,
        query: &Arc<R>,
    ) -> Option<RecordHandle<R>> {
        let found = state.trees[pos].get(query);
        self.metrics.record_lookup(found.is_some());
        found
    }

    /// Insert `record` into every index.
    ///
    /// A stored record comparing equal to `record` under any index is
    /// replaced: it is removed from every index, so all indexes keep holding
    /// the same records. Returns the replaced records.
    pub fn add(&self, record: R) -> Vec<R> {
        let key = Arc::new(record);

        let evicted = self.write().insert_everywhere(key);

        self.metrics.increment_inserts();
        log_trace!(event = %Event::RecordInserted, store = %self.name);
        self.note_evictions(evicted.len());
        evicted.iter().map(|payload| R::clone(payload)).collect()
    }

    /// Return the stored record equal to `record` under some index, or
    /// insert `record` if there is none.
    ///
    /// Indexes are searched in declaration order and the first match wins.
    /// The search and the insert happen under one exclusive lock.
    pub fn add_or_get(&self, record: R) -> R {
        let key = Arc::new(record);
        let mut state = self.write();

        if let Some(existing) = state.find_any(&key) {
            let stored = state.payload(existing.slot).unwrap_or(&existing.key);
            return R::clone(stored);
        }

        let evicted = state.insert_everywhere(Arc::clone(&key));
        debug_assert!(evicted.is_empty());
        drop(state);

        self.metrics.increment_inserts();
        log_trace!(event = %Event::RecordInserted, store = %self.name);
        R::clone(&key)
    }

    /// Look up the record matching `query` under `index`.
    ///
    /// Only `index`'s ordering fields of `query` are read.
    pub fn get(&self, query: &R, index: R::Index) -> Option<R> {
        let pos = self.position(index)?;
        let query = Arc::new(query.clone());

        let state = self.read();
        let handle = self.locate(&state, pos, &query)?;
        state.payload(handle.slot).map(|payload| R::clone(payload))
    }

    /// Remove the record matching `query` under `index` from every index.
    ///
    /// Returns the removed record.
    pub fn delete(&self, query: &R, index: R::Index) -> Option<R> {
        let pos = self.position(index)?;
        let query = Arc::new(query.clone());

        let removed = self.write().remove_via(pos, &query)?;

        self.metrics.increment_deletes();
        log_debug!(event = %Event::RecordDeleted, store = %self.name, index = ?index);
        Some(R::clone(&removed))
    }

    /// Visit the records with `from <= key < to` under `index`, ascending.
    ///
    /// Return `ControlFlow::Break(())` from `visit` to stop early. An
    /// unknown index or an empty range visits nothing.
    pub fn get_range<F>(&self, from: &R, to: &R, index: R::Index, mut visit: F)
    where
        F: FnMut(&R) -> ControlFlow<()>,
    {
        let Some(pos) = self.position(index) else {
            return;
        };
        let from = Arc::new(from.clone());
        let to = Arc::new(to.clone());

        let state = self.read();
        let StoreState { trees, slots, .. } = &*state;
        trees[pos].ascend_range(&from, &to, |slot| match slots.get(&slot) {
            Some(payload) => visit(payload.as_ref()),
            None => ControlFlow::Continue(()),
        });
    }

    /// Collect the records with `from <= key < to` under `index`, ascending.
    pub fn range(&self, from: &R, to: &R, index: R::Index) -> Vec<R> {
        let mut out = Vec::new();
        self.get_range(from, to, index, |record| {
            out.push(record.clone());
            ControlFlow::Continue(())
        });
        out
    }

    /// Smallest record under `index`
    pub fn min(&self, index: R::Index) -> Option<R> {
        let pos = self.position(index)?;
        let state = self.read();
        let slot = state.trees[pos].min()?;
        state.payload(slot).map(|payload| R::clone(payload))
    }

    /// Largest record under `index`
    pub fn max(&self, index: R::Index) -> Option<R> {
        let pos = self.position(index)?;
        let state = self.read();
        let slot = state.trees[pos].max()?;
        state.payload(slot).map(|payload| R::clone(payload))
    }

    /// Number of records
    pub fn len(&self) -> usize {
        self.read().trees[0].len()
    }

    /// Whether the store holds no records
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of records held by `index`'s tree.
    ///
    /// Equal to [`len`](Self::len) for every declared index.
    pub fn count(&self, index: R::Index) -> Option<usize> {
        let pos = self.position(index)?;
        Some(self.read().trees[pos].len())
    }

    /// Whether every index holds exactly the same records.
    pub fn is_consistent(&self) -> bool {
        let state = self.read();
        let consistent = state.is_consistent();
        if !consistent {
            let lens: Vec<_> = state.trees.iter().map(|t| (t.index(), t.len())).collect();
            log_warn!(store = %self.name, slots = state.slots.len(), trees = ?lens, "index membership diverged");
        }
        consistent
    }

    fn note_evictions(&self, count: usize) {
        if count > 0 {
            self.metrics.add_evictions(count as u64);
            log_debug!(event = %Event::RecordEvicted, store = %self.name, count);
        }
    }
}
