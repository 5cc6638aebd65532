//! Storage backend trait definition.

use crate::error::StorageResult;
use crate::record::{PutOutcome, PutRequest, ScanRequest, StoredEntry};

/// A transactional, key-ordered backend for the NSKV engine.
///
/// Backends store rows keyed by `(namespace, key)` and know nothing about
/// cursors, default page sizes, or error kinds. Every method takes the
/// caller's clock reading (`now`, epoch millis) so that liveness is decided
/// against a single instant per operation.
///
/// # Invariants
///
/// - Reads never return a row whose `expires_at <= now`
/// - `put` is atomic: the version check and the write happen in one
///   transaction, and the write itself is guarded by the checked version
/// - `scan` returns keys in ascending byte-wise order
/// - Backends must be `Send + Sync` for concurrent access
///
/// # Implementors
///
/// - [`super::SqliteBackend`] - durable reference backend
/// - [`super::InMemoryBackend`] - for testing
pub trait KvBackend: Send + Sync {
    /// Reads the live row for `(namespace, key)`.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot be read.
    fn get(&self, namespace: &str, key: &str, now: u64) -> StorageResult<Option<StoredEntry>>;

    /// Writes a row, optionally guarded by an expected version.
    ///
    /// An absent or expired row is (re)created at version 1. A live row is
    /// replaced and its version incremented by one.
    ///
    /// # Errors
    ///
    /// Returns an error if the transaction cannot be started or committed.
    /// CAS failures are reported through [`PutOutcome`], not as errors.
    fn put(&self, request: &PutRequest<'_>, now: u64) -> StorageResult<PutOutcome>;

    /// Removes the row for `(namespace, key)`.
    ///
    /// Returns true only if a live row was removed. An expired row is removed
    /// as well but reported as absent.
    ///
    /// # Errors
    ///
    /// Returns an error if the delete fails.
    fn delete(&self, namespace: &str, key: &str, now: u64) -> StorageResult<bool>;

    /// Returns up to `request.limit` live keys of `namespace` in order.
    ///
    /// # Errors
    ///
    /// Returns an error if the scan fails.
    fn scan(&self, namespace: &str, request: &ScanRequest<'_>, now: u64)
        -> StorageResult<Vec<String>>;

    /// Physically removes every row whose expiry has passed.
    ///
    /// Returns the number of rows removed.
    ///
    /// # Errors
    ///
    /// Returns an error if the delete fails.
    fn purge_expired(&self, now: u64) -> StorageResult<u64>;

    /// Returns the number of live rows per namespace, ordered by namespace.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot be read.
    fn namespace_counts(&self, now: u64) -> StorageResult<Vec<(String, u64)>>;

    /// Checks that the backend answers without touching stored rows.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend is unreachable or closed.
    fn ping(&self) -> StorageResult<()>;

    /// Releases connections and file handles.
    ///
    /// After this returns every other method fails with
    /// [`crate::StorageError::Closed`].
    ///
    /// # Errors
    ///
    /// Returns an error if a connection could not be closed cleanly.
    fn close(&self) -> StorageResult<()>;
}
