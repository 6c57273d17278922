//! Observable events for multistore
//!
//! Events are explicit and typed. Each log line carries exactly one.

use std::fmt;

/// Observable events in a store's lifetime
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    /// Store constructed with its declared indexes
    StoreCreated,
    /// Record inserted into every index
    RecordInserted,
    /// Existing record displaced by a colliding insert
    RecordEvicted,
    /// Record removed from every index
    RecordDeleted,
    /// Record payload replaced without reordering
    RecordUpdated,
    /// Record removed and reinserted under a new key
    RecordReindexed,
    /// Caller closure declined an update
    UpdateRejected,
    /// Operation named an index the store does not declare
    UnknownIndex,
    /// Store lock was poisoned by a panicking caller and taken over
    LockRecovered,
}

impl Event {
    /// Returns the event name
    pub fn as_str(&self) -> &'static str {
        match self {
            Event::StoreCreated => "STORE_CREATED",
            Event::RecordInserted => "RECORD_INSERTED",
            Event::RecordEvicted => "RECORD_EVICTED",
            Event::RecordDeleted => "RECORD_DELETED",
            Event::RecordUpdated => "RECORD_UPDATED",
            Event::RecordReindexed => "RECORD_REINDEXED",
            Event::UpdateRejected => "UPDATE_REJECTED",
            Event::UnknownIndex => "UNKNOWN_INDEX",
            Event::LockRecovered => "LOCK_RECOVERED",
        }
    }

    /// Whether the event changes which records the indexes hold
    pub fn is_structural(&self) -> bool {
        matches!(
            self,
            Event::RecordInserted
                | Event::RecordEvicted
                | Event::RecordDeleted
                | Event::RecordReindexed
        )
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
