//! Multi-index record store
//!
//! A record is stored once and reachable through every declared index.
//!
//! # Design Principles
//!
//! - One slot per logical record; trees hold slot ids, never copies
//! - One typed comparator per index, bound when the tree is created
//! - One reader/writer lock over all trees, so no cross-tree deadlock
//!
//! # Invariants
//!
//! - Every tree holds the same records
//! - Deletes and index-changing updates touch every tree or none
//! - Lookups with an undeclared index report nothing instead of failing

mod config;
mod errors;
mod memstore;
mod record;
mod tree;
mod update;

pub use config::{StoreConfig, DEFAULT_STORE_NAME};
pub use errors::{StoreError, StoreErrorCode, StoreResult};
pub use memstore::MemStore;
pub use record::IndexedRecord;
