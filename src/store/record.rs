//! Record contract and the handle shared by every index
//!
//! A logical record is stored once, in a slot of the store's arena. Each
//! index holds an [`IndexEntry`] that names the slot and shares one
//! reference-counted ordering key with the entries of every other index.

use std::cmp::Ordering;
use std::fmt;
use std::hash::Hash;
use std::sync::Arc;

/// A record that can be ordered under each of its indexes.
///
/// `Index` is usually a fieldless enum naming the orderings the record
/// supports. `compare` must be a total order for every index a store
/// declares; it only needs to read the fields that index orders by, so a
/// query record may leave every other field at a placeholder value.
///
/// # Example
///
/// ```
/// use std::cmp::Ordering;
/// use multistore::IndexedRecord;
///
/// #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
/// enum By {
///     Id,
///     Name,
/// }
///
/// #[derive(Debug, Clone, Default)]
/// struct User {
///     id: u64,
///     name: String,
/// }
///
/// impl IndexedRecord for User {
///     type Index = By;
///
///     fn compare(&self, index: By, other: &Self) -> Ordering {
///         match index {
///             By::Id => self.id.cmp(&other.id),
///             By::Name => self.name.cmp(&other.name),
///         }
///     }
/// }
/// ```
pub trait IndexedRecord: Clone + Send + Sync + 'static {
    /// Names one ordering over records.
    type Index: Copy + Eq + Hash + fmt::Debug + Send + Sync + 'static;

    /// Compare `self` with `other` under `index`.
    fn compare(&self, index: Self::Index, other: &Self) -> Ordering;
}

/// Identifies one logical record in the store's arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub(crate) struct SlotId(u64);

impl SlotId {
    pub(crate) fn new(raw: u64) -> Self {
        SlotId(raw)
    }
}

/// The single handle for one logical record.
///
/// Cloning a handle clones the `Arc`, never the record: every index entry
/// built from it points at the same slot and the same ordering key.
#[derive(Debug)]
pub(crate) struct RecordHandle<R> {
    pub(crate) slot: SlotId,
    pub(crate) key: Arc<R>,
}

impl<R> Clone for RecordHandle<R> {
    fn clone(&self) -> Self {
        Self {
            slot: self.slot,
            key: Arc::clone(&self.key),
        }
    }
}

/// An element of one index's ordered set.
///
/// Ordering delegates to [`IndexedRecord::compare`] under `index`. Two
/// entries are equal when their keys compare equal, whatever their slots.
/// Probe entries built from caller queries carry no slot and are never
/// stored.
pub(crate) struct IndexEntry<R: IndexedRecord> {
    index: R::Index,
    key: Arc<R>,
    slot: Option<SlotId>,
}

impl<R: IndexedRecord> IndexEntry<R> {
    /// Entry for `handle` in the index named `index`.
    pub(crate) fn stored(index: R::Index, handle: &RecordHandle<R>) -> Self {
        Self {
            index,
            key: Arc::clone(&handle.key),
            slot: Some(handle.slot),
        }
    }

    /// Lookup-only entry carrying a query key.
    pub(crate) fn probe(index: R::Index, key: &Arc<R>) -> Self {
        Self {
            index,
            key: Arc::clone(key),
            slot: None,
        }
    }

    /// The handle this entry was stored for. `None` for probes.
    pub(crate) fn handle(&self) -> Option<RecordHandle<R>> {
        self.slot.map(|slot| RecordHandle {
            slot,
            key: Arc::clone(&self.key),
        })
    }

    pub(crate) fn slot(&self) -> Option<SlotId> {
        self.slot
    }
}

impl<R: IndexedRecord> Ord for IndexEntry<R> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.key.compare(self.index, &other.key)
    }
}

impl<R: IndexedRecord> PartialOrd for IndexEntry<R> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<R: IndexedRecord> PartialEq for IndexEntry<R> {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl<R: IndexedRecord> Eq for IndexEntry<R> {}

impl<R: IndexedRecord + fmt::Debug> fmt::Debug for IndexEntry<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IndexEntry")
            .field("index", &self.index)
            .field("slot", &self.slot)
            .field("key", &self.key)
            .finish()
    }
}
