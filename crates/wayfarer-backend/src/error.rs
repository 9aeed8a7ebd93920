use thiserror::Error;
use wayfarer_shared::{AuthError, ClientError};

/// Errors produced by the backend collaborators.
#[derive(Error, Debug)]
pub enum BackendError {
    /// SQLite error from the embedded document store.
    #[error("Database error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// Generic I/O error (blob directory, database file).
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Document body could not be (de)serialized.
    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),

    /// A lookup expected exactly one record but found none.
    #[error("Record not found")]
    NotFound,

    /// Authentication failure.
    #[error("Auth error: {0}")]
    Auth(#[from] AuthError),

    /// Blob storage failure.
    #[error("Blob storage error: {0}")]
    Blob(String),

    /// Blob exceeds the configured size cap.
    #[error("Blob too large: {size} bytes (max {max})")]
    BlobTooLarge { size: usize, max: usize },

    /// Migration failure.
    #[error("Migration error: {0}")]
    Migration(String),

    /// A shared connection lock was poisoned by a panicking holder.
    #[error("Connection lock poisoned")]
    Poisoned,
}

/// How collaborator failures surface to state holders: auth and not-found
/// keep their kind, everything else degrades to a network failure carrying
/// the collaborator's message.
impl From<BackendError> for ClientError {
    fn from(err: BackendError) -> Self {
        match err {
            BackendError::NotFound => ClientError::NotFound,
            BackendError::Auth(auth) => ClientError::Auth(auth),
            other => ClientError::Network(other.to_string()),
        }
    }
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, BackendError>;
