//! Error types for organization lifecycle operations.

use tenancy_auth::AuthError;
use tenancy_store::StoreError;
use thiserror::Error;

/// Lifecycle error types.
#[derive(Debug, Error)]
pub enum OrgError {
    /// Organization name, admin email or tenant collection already taken
    #[error("{entity} already exists: {key}")]
    Duplicate {
        /// Kind of record
        entity: String,
        /// Conflicting key
        key: String,
    },

    /// No organization or admin with the given key
    #[error("{entity} not found: {key}")]
    NotFound {
        /// Kind of record
        entity: String,
        /// Missing key
        key: String,
    },

    /// Authentication or authorization failure
    #[error(transparent)]
    Auth(#[from] AuthError),

    /// Malformed input
    #[error("Validation failed: {0}")]
    Validation(String),

    /// Storage backend failure
    #[error("Storage error: {0}")]
    Storage(String),
}

/// Result type for lifecycle operations.
pub type OrgResult<T> = Result<T, OrgError>;

impl From<StoreError> for OrgError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Duplicate { entity, key } => OrgError::Duplicate { entity, key },
            StoreError::NotFound { entity, key } => OrgError::NotFound { entity, key },
            StoreError::Backend(message) => OrgError::Storage(message),
        }
    }
}

impl OrgError {
    pub fn validation(message: impl Into<String>) -> Self {
        OrgError::Validation(message.into())
    }

    /// Check if this error should be logged at error level.
    pub fn is_server_error(&self) -> bool {
        match self {
            OrgError::Storage(_) => true,
            OrgError::Auth(e) => e.is_server_error(),
            _ => false,
        }
    }

    /// Get HTTP status code for this error.
    pub fn status_code(&self) -> u16 {
        match self {
            OrgError::Duplicate { .. } => 409,
            OrgError::NotFound { .. } => 404,
            OrgError::Auth(e) => e.status_code(),
            OrgError::Validation(_) => 422,
            OrgError::Storage(_) => 500,
        }
    }

    /// Get error code for API responses.
    pub fn error_code(&self) -> &'static str {
        match self {
            OrgError::Duplicate { .. } => "DUPLICATE",
            OrgError::NotFound { .. } => "NOT_FOUND",
            OrgError::Auth(e) => e.error_code(),
            OrgError::Validation(_) => "VALIDATION_ERROR",
            OrgError::Storage(_) => "STORAGE_ERROR",
        }
    }
}
