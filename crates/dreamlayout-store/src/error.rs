use rusqlite::ErrorCode;
use thiserror::Error;

/// Errors produced by the store layer.
#[derive(Error, Debug)]
pub enum StoreError {
    /// SQLite error.
    #[error("Database error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// Failed to determine a platform data directory.
    #[error("Could not determine application data directory")]
    NoDataDir,

    /// Generic I/O error (e.g. creating the database directory).
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A query expected exactly one row but found none.
    #[error("Record not found")]
    NotFound,

    /// The record exists but belongs to another user.
    #[error("Access denied")]
    AccessDenied,

    /// A unique or foreign-key constraint rejected the write.
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Schema creation or migration failure. Fatal at startup.
    #[error("Schema error: {0}")]
    Schema(String),

    /// The floor payload could not be encoded.
    #[error("Floor payload error: {0}")]
    Payload(#[from] serde_json::Error),
}

impl StoreError {
    /// Map a write error, turning constraint violations into [`StoreError::Conflict`].
    pub(crate) fn from_write(err: rusqlite::Error) -> Self {
        match err {
            rusqlite::Error::SqliteFailure(ref failure, ref msg)
                if failure.code == ErrorCode::ConstraintViolation =>
            {
                StoreError::Conflict(
                    msg.clone()
                        .unwrap_or_else(|| "constraint violation".to_string()),
                )
            }
            other => StoreError::Sqlite(other),
        }
    }

    /// Map a single-row read error, turning "no rows" into [`StoreError::NotFound`].
    pub(crate) fn from_read(err: rusqlite::Error) -> Self {
        match err {
            rusqlite::Error::QueryReturnedNoRows => StoreError::NotFound,
            other => StoreError::Sqlite(other),
        }
    }
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, StoreError>;
