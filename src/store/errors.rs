//! Store error types
//!
//! Error codes:
//! - STORE_NO_INDEXES
//! - STORE_DUPLICATE_INDEX
//!
//! Both are construction errors. Once a store exists, no operation fails:
//! misses, unknown indexes and declined updates report `None`.

use std::fmt;

use thiserror::Error;

/// Result type for store construction
pub type StoreResult<T> = Result<T, StoreError>;

/// Store error codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreErrorCode {
    /// No index was declared
    NoIndexes,
    /// The same index was declared more than once
    DuplicateIndex,
}

impl StoreErrorCode {
    /// Returns the stable string code
    pub fn code(&self) -> &'static str {
        match self {
            StoreErrorCode::NoIndexes => "STORE_NO_INDEXES",
            StoreErrorCode::DuplicateIndex => "STORE_DUPLICATE_INDEX",
        }
    }
}

impl fmt::Display for StoreErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Errors raised while building a store
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// A store needs at least one index
    #[error("[STORE_NO_INDEXES] store '{store}' declares no indexes")]
    NoIndexes {
        /// Store name from configuration
        store: String,
    },

    /// Each index may be declared once
    #[error("[STORE_DUPLICATE_INDEX] store '{store}' declares index {index} more than once")]
    DuplicateIndex {
        /// Store name from configuration
        store: String,
        /// Debug rendering of the repeated index
        index: String,
    },
}

impl StoreError {
    /// Returns the error code
    pub fn code(&self) -> StoreErrorCode {
        match self {
            StoreError::NoIndexes { .. } => StoreErrorCode::NoIndexes,
            StoreError::DuplicateIndex { .. } => StoreErrorCode::DuplicateIndex,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        assert_eq!(StoreErrorCode::NoIndexes.code(), "STORE_NO_INDEXES");
        assert_eq!(StoreErrorCode::DuplicateIndex.code(), "STORE_DUPLICATE_INDEX");
    }

    #[test]
    fn test_error_display() {
        let err = StoreError::DuplicateIndex {
            store: "tasks".to_string(),
            index: "Id".to_string(),
        };
        let display = err.to_string();
        assert!(display.contains("STORE_DUPLICATE_INDEX"));
        assert!(display.contains("tasks"));
        assert!(display.contains("Id"));
        assert_eq!(err.code(), StoreErrorCode::DuplicateIndex);
    }

    #[test]
    fn test_no_indexes_display() {
        let err = StoreError::NoIndexes {
            store: "empty".to_string(),
        };
        assert_eq!(err.to_string(), "[STORE_NO_INDEXES] store 'empty' declares no indexes");
    }
}
