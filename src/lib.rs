//! multistore - An in-memory record store kept consistent across several ordered indexes
//!
//! Every logical record lives once in the store and is reachable through each
//! declared index. Inserts, deletes and index-changing updates are applied to
//! all indexes under one lock, so every index always holds the same records.

pub mod observability;
pub mod store;

pub use store::{IndexedRecord, MemStore, StoreConfig, StoreError, StoreErrorCode, StoreResult};
