//! BTreeSet-based index structures
//!
//! Each declared index owns one `IndexTree`: an ordered set of entries that
//! name arena slots. The tree never holds record payloads, only the shared
//! ordering key of each record.

use std::cmp::Ordering;
use std::collections::BTreeSet;
use std::ops::{Bound, ControlFlow};
use std::sync::Arc;

use super::record::{IndexEntry, IndexedRecord, RecordHandle, SlotId};

/// A single ordered index over record handles.
pub(crate) struct IndexTree<R: IndexedRecord> {
    /// Ordering this tree is bound to
    index: R::Index,
    /// Entries ordered by `index`
    entries: BTreeSet<IndexEntry<R>>,
}

impl<R: IndexedRecord> IndexTree<R> {
    /// Creates a new empty tree bound to `index`
    pub(crate) fn new(index: R::Index) -> Self {
        Self {
            index,
            entries: BTreeSet::new(),
        }
    }

    pub(crate) fn index(&self) -> R::Index {
        self.index
    }

    /// Insert `handle`, replacing any entry that compares equal.
    ///
    /// Returns the handle that was replaced, if any.
    pub(crate) fn insert_or_replace(&mut self, handle: &RecordHandle<R>) -> Option<RecordHandle<R>> {
        self.entries
            .replace(IndexEntry::stored(self.index, handle))
            .and_then(|old| old.handle())
    }

    /// Remove the entry whose key compares equal to `key`.
    pub(crate) fn remove(&mut self, key: &Arc<R>) -> Option<RecordHandle<R>> {
        self.entries
            .take(&IndexEntry::probe(self.index, key))
            .and_then(|old| old.handle())
    }

    /// Lookup the entry whose key compares equal to `key`.
    pub(crate) fn get(&self, key: &Arc<R>) -> Option<RecordHandle<R>> {
        self.entries
            .get(&IndexEntry::probe(self.index, key))
            .and_then(IndexEntry::handle)
    }

    /// Smallest entry under this tree's ordering
    pub(crate) fn min(&self) -> Option<SlotId> {
        self.entries.first().and_then(IndexEntry::slot)
    }

    /// Largest entry under this tree's ordering
    pub(crate) fn max(&self) -> Option<SlotId> {
        self.entries.last().and_then(IndexEntry::slot)
    }

    /// Visit every entry with `from <= key < to` in ascending order.
    ///
    /// Stops as soon as `visit` breaks. An empty or inverted range visits
    /// nothing.
    pub(crate) fn ascend_range<F>(&self, from: &Arc<R>, to: &Arc<R>, mut visit: F)
    where
        F: FnMut(SlotId) -> ControlFlow<()>,
    {
        // BTreeSet::range panics on inverted bounds
        if from.compare(self.index, to) != Ordering::Less {
            return;
        }

        let lower = IndexEntry::probe(self.index, from);
        let upper = IndexEntry::probe(self.index, to);
        for entry in self
            .entries
            .range((Bound::Included(lower), Bound::Excluded(upper)))
        {
            if let Some(slot) = entry.slot() {
                if visit(slot).is_break() {
                    break;
                }
            }
        }
    }

    /// Every slot in ascending order
    pub(crate) fn slots(&self) -> impl Iterator<Item = SlotId> + '_ {
        self.entries.iter().filter_map(IndexEntry::slot)
    }

    /// Returns the number of entries
    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }
}
