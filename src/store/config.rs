//! Store configuration
//!
//! A store is configured by the ordered list of indexes it maintains and a
//! name used in log events and errors. The index type is the caller's, so a
//! configuration can be loaded from any serde format the caller's index enum
//! deserializes from.

use std::collections::HashSet;
use std::fmt;
use std::hash::Hash;

use serde::Deserialize;

use super::errors::{StoreError, StoreResult};

/// Name used when a configuration does not give one.
pub const DEFAULT_STORE_NAME: &str = "memstore";

fn default_name() -> String {
    DEFAULT_STORE_NAME.to_string()
}

/// Configuration for a [`MemStore`](super::MemStore).
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct StoreConfig<I> {
    /// Name carried into log events and errors.
    #[serde(default = "default_name")]
    pub name: String,
    /// Declared indexes, in declaration order.
    pub indexes: Vec<I>,
}

impl<I> StoreConfig<I> {
    /// Create an unnamed configuration for the given indexes.
    pub fn new(indexes: impl IntoIterator<Item = I>) -> Self {
        Self {
            name: default_name(),
            indexes: indexes.into_iter().collect(),
        }
    }

    /// Set the store name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }
}

impl<I> StoreConfig<I>
where
    I: Copy + Eq + Hash + fmt::Debug,
{
    /// Check the configuration without building a store.
    ///
    /// Fails if no index is declared or if an index is declared twice.
    pub fn validate(&self) -> StoreResult<()> {
        if self.indexes.is_empty() {
            return Err(StoreError::NoIndexes {
                store: self.name.clone(),
            });
        }

        let mut seen = HashSet::with_capacity(self.indexes.len());
        for index in &self.indexes {
            if !seen.insert(*index) {
                return Err(StoreError::DuplicateIndex {
                    store: self.name.clone(),
                    index: format!("{:?}", index),
                });
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::StoreErrorCode;

    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
    #[serde(rename_all = "snake_case")]
    enum Field {
        Id,
        Name,
    }

    #[test]
    fn test_default_name() {
        let config = StoreConfig::new([Field::Id]);
        assert_eq!(config.name, DEFAULT_STORE_NAME);
        assert_eq!(config.with_name("tasks").name, "tasks");
    }

    #[test]
    fn test_validate_ok() {
        let config = StoreConfig::new([Field::Id, Field::Name]);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_empty() {
        let config: StoreConfig<Field> = StoreConfig::new([]);
        let err = config.validate().unwrap_err();
        assert_eq!(err.code(), StoreErrorCode::NoIndexes);
    }

    #[test]
    fn test_validate_duplicate() {
        let config = StoreConfig::new([Field::Id, Field::Name, Field::Id]).with_name("dupes");
        let err = config.validate().unwrap_err();
        assert_eq!(
            err,
            StoreError::DuplicateIndex {
                store: "dupes".to_string(),
                index: "Id".to_string(),
            }
        );
    }

    #[test]
    fn test_deserialize_from_json() {
        let config: StoreConfig<Field> =
            serde_json::from_str(r#"{"name": "people", "indexes": ["name", "id"]}"#).unwrap();
        assert_eq!(config.name, "people");
        assert_eq!(config.indexes, vec![Field::Name, Field::Id]);
    }

    #[test]
    fn test_deserialize_without_name() {
        let config: StoreConfig<Field> = serde_json::from_str(r#"{"indexes": ["id"]}"#).unwrap();
        assert_eq!(config.name, DEFAULT_STORE_NAME);
    }

    #[test]
    fn test_deserialize_unknown_index_rejected() {
        let result: Result<StoreConfig<Field>, _> =
            serde_json::from_str(r#"{"indexes": ["importance"]}"#);
        assert!(result.is_err());
    }
}
