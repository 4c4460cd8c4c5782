//! Storage error types.

use thiserror::Error;

/// Store error types.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A unique key is already taken
    #[error("{entity} already exists: {key}")]
    Duplicate {
        /// Kind of record
        entity: String,
        /// Conflicting key
        key: String,
    },

    /// No record with the given key
    #[error("{entity} not found: {key}")]
    NotFound {
        /// Kind of record
        entity: String,
        /// Missing key
        key: String,
    },

    /// Backend failure (connection, query, serialization)
    #[error("Storage backend error: {0}")]
    Backend(String),
}

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

impl StoreError {
    pub fn duplicate(entity: impl Into<String>, key: impl Into<String>) -> Self {
        StoreError::Duplicate {
            entity: entity.into(),
            key: key.into(),
        }
    }

    pub fn not_found(entity: impl Into<String>, key: impl Into<String>) -> Self {
        StoreError::NotFound {
            entity: entity.into(),
            key: key.into(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::NotFound { .. })
    }
}

#[cfg(feature = "surreal")]
impl From<surrealdb::Error> for StoreError {
    fn from(err: surrealdb::Error) -> Self {
        StoreError::Backend(err.to_string())
    }
}
