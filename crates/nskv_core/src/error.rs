//! Error types for the NSKV engine.

use crate::types::Version;
use nskv_storage::StorageError;
use std::fmt;
use thiserror::Error;

/// Result type for engine operations.
pub type KvResult<T> = Result<T, KvError>;

/// Stable, programmatic classification of a [`KvError`].
///
/// Callers branch on the kind, never on the message text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// CAS supplied but the key is absent or expired.
    CasKeyAbsent,
    /// CAS supplied but the live version differs.
    CasVersionMismatch,
    /// The guarded update matched no row after the version check passed.
    CasConcurrentUpdate,
    /// A pagination cursor could not be decoded.
    InvalidCursor,
    /// The backend could not be reached.
    BackendUnavailable,
    /// The store was closed.
    Closed,
    /// An argument failed validation.
    InvalidArgument,
    /// A JSON helper could not encode or decode a payload.
    Serialization,
    /// Any other backend failure.
    Backend,
}

impl ErrorKind {
    /// Returns the stable code for this kind.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::CasKeyAbsent => "CAS_KEY_ABSENT",
            Self::CasVersionMismatch => "CAS_VERSION_MISMATCH",
            Self::CasConcurrentUpdate => "CAS_CONCURRENT_UPDATE",
            Self::InvalidCursor => "INVALID_CURSOR",
            Self::BackendUnavailable => "BACKEND_UNAVAILABLE",
            Self::Closed => "CLOSED",
            Self::InvalidArgument => "INVALID_ARGUMENT",
            Self::Serialization => "SERIALIZATION",
            Self::Backend => "BACKEND",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Errors returned by [`crate::KvStore`] operations.
#[derive(Debug, Error)]
pub enum KvError {
    /// CAS write against a key that does not exist or has expired.
    #[error("CAS failed: {namespace}/{key} does not exist")]
    CasKeyAbsent {
        /// Namespace of the write.
        namespace: String,
        /// Key of the write.
        key: String,
    },

    /// CAS write whose expected version is not the current one.
    #[error("CAS failed: {namespace}/{key} is at {actual}, expected {expected}")]
    CasVersionMismatch {
        /// Namespace of the write.
        namespace: String,
        /// Key of the write.
        key: String,
        /// Version supplied by the caller.
        expected: Version,
        /// Version currently stored.
        actual: Version,
    },

    /// CAS write that lost a race inside the backend.
    #[error("CAS failed: {namespace}/{key} changed concurrently")]
    CasConcurrentUpdate {
        /// Namespace of the write.
        namespace: String,
        /// Key of the write.
        key: String,
    },

    /// Pagination cursor could not be decoded.
    #[error("invalid cursor: {reason}")]
    InvalidCursor {
        /// Why decoding failed.
        reason: String,
    },

    /// Backend connectivity failure.
    #[error("backend unavailable: {0}")]
    BackendUnavailable(#[source] StorageError),

    /// Operation attempted after `close()`.
    #[error("store is closed")]
    Closed,

    /// An argument failed validation.
    #[error("invalid argument: {message}")]
    InvalidArgument {
        /// Description of the problem.
        message: String,
    },

    /// JSON encoding or decoding failed.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Any other backend failure, including lock-wait timeouts.
    #[error("backend error: {0}")]
    Backend(#[source] StorageError),
}

impl KvError {
    /// Returns the programmatic kind of this error.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::CasKeyAbsent { .. } => ErrorKind::CasKeyAbsent,
            Self::CasVersionMismatch { .. } => ErrorKind::CasVersionMismatch,
            Self::CasConcurrentUpdate { .. } => ErrorKind::CasConcurrentUpdate,
            Self::InvalidCursor { .. } => ErrorKind::InvalidCursor,
            Self::BackendUnavailable(_) => ErrorKind::BackendUnavailable,
            Self::Closed => ErrorKind::Closed,
            Self::InvalidArgument { .. } => ErrorKind::InvalidArgument,
            Self::Serialization(_) => ErrorKind::Serialization,
            Self::Backend(_) => ErrorKind::Backend,
        }
    }

    /// Returns true for any CAS failure.
    ///
    /// All three CAS kinds mean the same thing to a caller: re-read the
    /// entry and retry with its current version.
    #[must_use]
    pub fn is_cas_conflict(&self) -> bool {
        matches!(
            self.kind(),
            ErrorKind::CasKeyAbsent | ErrorKind::CasVersionMismatch | ErrorKind::CasConcurrentUpdate
        )
    }

    /// Creates an invalid argument error.
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument {
            message: message.into(),
        }
    }

    /// Creates an invalid cursor error.
    pub fn invalid_cursor(reason: impl Into<String>) -> Self {
        Self::InvalidCursor {
            reason: reason.into(),
        }
    }
}

impl From<StorageError> for KvError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::Closed => Self::Closed,
            err if err.is_unavailable() => Self::BackendUnavailable(err),
            err => Self::Backend(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds_have_stable_codes() {
        let err = KvError::CasVersionMismatch {
            namespace: "builds".into(),
            key: "u1:active".into(),
            expected: Version::new(1),
            actual: Version::new(2),
        };
        assert_eq!(err.kind(), ErrorKind::CasVersionMismatch);
        assert_eq!(err.kind().code(), "CAS_VERSION_MISMATCH");
        assert_eq!(
            err.to_string(),
            "CAS failed: builds/u1:active is at v2, expected v1"
        );
    }

    #[test]
    fn cas_kinds_are_conflicts() {
        let absent = KvError::CasKeyAbsent {
            namespace: "n".into(),
            key: "k".into(),
        };
        let raced = KvError::CasConcurrentUpdate {
            namespace: "n".into(),
            key: "k".into(),
        };
        assert!(absent.is_cas_conflict());
        assert!(raced.is_cas_conflict());
        assert!(!KvError::Closed.is_cas_conflict());
        assert!(!KvError::invalid_cursor("bad").is_cas_conflict());
    }

    #[test]
    fn storage_errors_are_classified() {
        assert_eq!(KvError::from(StorageError::Closed).kind(), ErrorKind::Closed);
        assert_eq!(
            KvError::from(StorageError::Unavailable("gone".into())).kind(),
            ErrorKind::BackendUnavailable
        );
        assert_eq!(
            KvError::from(StorageError::Busy("locked".into())).kind(),
            ErrorKind::Backend
        );
    }
}
