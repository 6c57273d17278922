//! Operation counters for a store
//!
//! - Counters only, monotonic
//! - Reset only when the store is created
//! - Thread-safe, lock-free

use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

/// Operational counters for one store
///
/// All counters use `Relaxed` ordering. Shared-lock operations such as
/// `get` bump them concurrently with `snapshot`, so counters in one
/// snapshot may be read at slightly different moments.
#[derive(Debug, Default)]
pub struct StoreMetrics {
    /// Records inserted into every index
    inserts: AtomicU64,
    /// Records displaced by colliding inserts
    evictions: AtomicU64,
    /// Records removed through `delete`
    deletes: AtomicU64,
    /// Point lookups, including those made by updates
    lookups: AtomicU64,
    /// Point lookups that found nothing
    lookup_misses: AtomicU64,
    /// In-place and index-changing updates applied
    updates_applied: AtomicU64,
    /// Updates declined by the caller's closure
    updates_rejected: AtomicU64,
    /// Index-changing updates applied
    reindexes: AtomicU64,
    /// Requests naming an undeclared index
    unknown_index: AtomicU64,
}

impl StoreMetrics {
    /// Create a registry with all counters at zero
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn increment_inserts(&self) {
        self.inserts.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn add_evictions(&self, count: u64) {
        self.evictions.fetch_add(count, Ordering::Relaxed);
    }

    pub(crate) fn increment_deletes(&self) {
        self.deletes.fetch_add(1, Ordering::Relaxed);
    }

    /// Record one lookup and whether it hit
    pub(crate) fn record_lookup(&self, hit: bool) {
        self.lookups.fetch_add(1, Ordering::Relaxed);
        if !hit {
            self.lookup_misses.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub(crate) fn increment_updates_applied(&self) {
        self.updates_applied.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn increment_updates_rejected(&self) {
        self.updates_rejected.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn increment_reindexes(&self) {
        self.reindexes.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn increment_unknown_index(&self) {
        self.unknown_index.fetch_add(1, Ordering::Relaxed);
    }

    /// Get all counters as a snapshot
    pub fn snapshot(&self) -> MetricsSnapshot {
        // Misses are bumped after lookups, so read them first
        let lookup_misses = self.lookup_misses.load(Ordering::Relaxed);
        MetricsSnapshot {
            inserts: self.inserts.load(Ordering::Relaxed),
            evictions: self.evictions.load(Ordering::Relaxed),
            deletes: self.deletes.load(Ordering::Relaxed),
            lookup_misses,
            lookups: self.lookups.load(Ordering::Relaxed),
            updates_applied: self.updates_applied.load(Ordering::Relaxed),
            updates_rejected: self.updates_rejected.load(Ordering::Relaxed),
            reindexes: self.reindexes.load(Ordering::Relaxed),
            unknown_index: self.unknown_index.load(Ordering::Relaxed),
        }
    }
}

/// A point-in-time copy of every counter
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MetricsSnapshot {
    /// Records inserted into every index
    pub inserts: u64,
    /// Records displaced by colliding inserts
    pub evictions: u64,
    /// Records removed through `delete`
    pub deletes: u64,
    /// Point lookups, including those made by updates
    pub lookups: u64,
    /// Point lookups that found nothing
    pub lookup_misses: u64,
    /// In-place and index-changing updates applied
    pub updates_applied: u64,
    /// Updates declined by the caller's closure
    pub updates_rejected: u64,
    /// Index-changing updates applied
    pub reindexes: u64,
    /// Requests naming an undeclared index
    pub unknown_index: u64,
}

impl MetricsSnapshot {
    /// Lookups that found a record
    ///
    /// Saturates at zero when the snapshot raced a concurrent miss.
    pub fn lookup_hits(&self) -> u64 {
        self.lookups.saturating_sub(self.lookup_misses)
    }
}
