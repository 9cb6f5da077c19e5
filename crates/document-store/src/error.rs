use common::UserId;
use thiserror::Error;

use crate::Version;

/// Errors that can occur when interacting with the document store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The document changed since the caller read it.
    #[error(
        "Concurrency conflict for user {user_id}: expected version {expected}, found {actual}"
    )]
    ConcurrencyConflict {
        user_id: UserId,
        expected: Version,
        actual: Version,
    },

    /// No user document matched the update target.
    #[error("User not found: {0}")]
    UserNotFound(UserId),

    /// A unique key (id, email, phone) is already taken.
    #[error("Duplicate key: {0}")]
    DuplicateKey(String),

    /// The update request itself was malformed.
    #[error("Invalid update: {0}")]
    InvalidUpdate(String),

    /// A database error occurred.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A database migration error occurred.
    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// A stored document could not be (de)serialized.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// An accumulated value does not fit in 64 bits.
    #[error("Numeric overflow: {0}")]
    Overflow(String),

    /// The backend refused the operation.
    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

impl StoreError {
    /// True when stored data was read but could not be decoded into the
    /// expected shape.
    pub fn is_decode_failure(&self) -> bool {
        match self {
            StoreError::Serialization(_) | StoreError::Overflow(_) => true,
            StoreError::Database(e) => matches!(
                e,
                sqlx::Error::ColumnDecode { .. }
                    | sqlx::Error::Decode(_)
                    | sqlx::Error::ColumnNotFound(_)
            ),
            _ => false,
        }
    }
}

/// Result type for document store operations.
pub type Result<T> = std::result::Result<T, StoreError>;
