//! Error types for storage operations.

use rusqlite::ErrorCode;
use std::io;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Errors that can occur during storage operations.
#[derive(Debug, Error)]
pub enum StorageError {
    /// An I/O error occurred.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The SQLite engine reported an error.
    #[error("sqlite error: {0}")]
    Sqlite(#[source] rusqlite::Error),

    /// The backend could not be reached (cannot open, not a database, I/O failure).
    #[error("backend unavailable: {0}")]
    Unavailable(String),

    /// A lock could not be acquired within the busy timeout.
    #[error("backend busy: {0}")]
    Busy(String),

    /// No reader connection became free within the timeout.
    #[error("timed out after {timeout:?} waiting for a reader connection")]
    PoolTimeout {
        /// How long the caller waited.
        timeout: Duration,
    },

    /// The database file does not exist and creation was not requested.
    #[error("database not found: {}", path.display())]
    NotFound {
        /// Path that was looked up.
        path: PathBuf,
    },

    /// The on-disk schema is newer than this build understands.
    #[error("unsupported schema version {found}, this build supports up to {supported}")]
    InvalidFormat {
        /// Schema version found in the file.
        found: i64,
        /// Highest schema version this build can open.
        supported: i64,
    },

    /// A stored row violates an invariant.
    #[error("storage corrupted: {0}")]
    Corrupted(String),

    /// The storage is closed.
    #[error("storage is closed")]
    Closed,
}

impl StorageError {
    /// Returns true if the error means the backend cannot be reached at all.
    #[must_use]
    pub fn is_unavailable(&self) -> bool {
        matches!(
            self,
            Self::Unavailable(_) | Self::NotFound { .. } | Self::Io(_)
        )
    }

    /// Returns true if the error was caused by a lock or pool wait timing out.
    #[must_use]
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Busy(_) | Self::PoolTimeout { .. })
    }
}

impl From<rusqlite::Error> for StorageError {
    fn from(err: rusqlite::Error) -> Self {
        match err.sqlite_error_code() {
            Some(ErrorCode::DatabaseBusy | ErrorCode::DatabaseLocked) => {
                Self::Busy(err.to_string())
            }
            Some(
                ErrorCode::CannotOpen
                | ErrorCode::NotADatabase
                | ErrorCode::SystemIoFailure
                | ErrorCode::PermissionDenied,
            ) => Self::Unavailable(err.to_string()),
            Some(ErrorCode::DatabaseCorrupt) => Self::Corrupted(err.to_string()),
            _ => Self::Sqlite(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn failure(code: i32) -> rusqlite::Error {
        rusqlite::Error::SqliteFailure(rusqlite::ffi::Error::new(code), None)
    }

    #[test]
    fn busy_maps_to_timeout() {
        let err = StorageError::from(failure(rusqlite::ffi::SQLITE_BUSY));
        assert!(matches!(err, StorageError::Busy(_)));
        assert!(err.is_timeout());
    }

    #[test]
    fn cannot_open_maps_to_unavailable() {
        let err = StorageError::from(failure(rusqlite::ffi::SQLITE_CANTOPEN));
        assert!(err.is_unavailable());
    }

    #[test]
    fn other_errors_stay_sqlite() {
        let err = StorageError::from(rusqlite::Error::QueryReturnedNoRows);
        assert!(matches!(err, StorageError::Sqlite(_)));
        assert!(!err.is_unavailable());
        assert!(!err.is_timeout());
    }
}
