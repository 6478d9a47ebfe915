//! Profile store error types.

use thiserror::Error;

/// Errors that can occur during profile store operations.
#[derive(Debug, Error)]
pub enum ProfileStoreError {
    /// Entity not found.
    #[error("{entity_type} not found: {id}")]
    NotFound {
        entity_type: &'static str,
        id: String,
    },

    /// Duplicate entity (uniqueness violation on insert).
    #[error("{entity_type} already exists: {id}")]
    AlreadyExists {
        entity_type: &'static str,
        id: String,
    },

    /// A query failed.
    #[error("error {operation}: {source}")]
    Query {
        operation: &'static str,
        #[source]
        source: sqlx::Error,
    },

    /// Database error outside of a specific operation (connect, schema).
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl ProfileStoreError {
    /// Creates a not found error.
    pub fn not_found(entity_type: &'static str, id: impl Into<String>) -> Self {
        Self::NotFound {
            entity_type,
            id: id.into(),
        }
    }

    /// Creates an already exists error.
    pub fn already_exists(entity_type: &'static str, id: impl Into<String>) -> Self {
        Self::AlreadyExists {
            entity_type,
            id: id.into(),
        }
    }

    /// Wraps a query error with the operation that issued it.
    pub fn query(operation: &'static str, source: sqlx::Error) -> Self {
        Self::Query { operation, source }
    }

    /// Returns true for [`ProfileStoreError::NotFound`].
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Returns true for [`ProfileStoreError::AlreadyExists`].
    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::AlreadyExists { .. })
    }
}

/// Result type for profile store operations.
pub type ProfileStoreResult<T> = Result<T, ProfileStoreError>;
