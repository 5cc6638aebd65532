//! Store statistics.
//!
//! Provides counters for monitoring store activity.
//!
//! # Usage
//!
//! ```rust
//! use nskv_core::KvStore;
//!
//! let store = KvStore::open_in_memory().unwrap();
//! store.set("ns", "k", b"{}").unwrap();
//! store.get("ns", "k").unwrap();
//!
//! let stats = store.stats().snapshot();
//! assert_eq!(stats.writes, 1);
//! assert_eq!(stats.hits, 1);
//! ```

use crate::error::ErrorKind;
use std::sync::atomic::{AtomicU64, Ordering};

/// Store statistics.
///
/// All counters are atomic and can be read while operations are in progress.
/// Values only ever increase.
#[derive(Debug, Default)]
pub struct StoreStats {
    /// Total number of `get` calls that reached the backend.
    reads: AtomicU64,
    /// Reads that returned an entry.
    hits: AtomicU64,
    /// Successful writes.
    writes: AtomicU64,
    /// Deletes that removed a live entry.
    deletes: AtomicU64,
    /// Pages served by `list`.
    lists: AtomicU64,
    /// CAS writes rejected because the key was absent.
    cas_key_absent: AtomicU64,
    /// CAS writes rejected on version mismatch.
    cas_version_mismatch: AtomicU64,
    /// CAS writes that lost a race inside the backend.
    cas_concurrent_update: AtomicU64,
    /// Rows removed by sweeps.
    expired_purged: AtomicU64,
    /// Total bytes written.
    bytes_written: AtomicU64,
    /// Total bytes read.
    bytes_read: AtomicU64,
    /// Backend failures.
    errors: AtomicU64,
}

impl StoreStats {
    /// Creates a new stats instance.
    pub fn new() -> Self {
        Self::default()
    }

    // === Increment methods (internal use) ===

    pub(crate) fn record_read(&self, hit_bytes: Option<usize>) {
        self.reads.fetch_add(1, Ordering::Relaxed);
        if let Some(bytes) = hit_bytes {
            self.hits.fetch_add(1, Ordering::Relaxed);
            self.bytes_read.fetch_add(bytes as u64, Ordering::Relaxed);
        }
    }

    pub(crate) fn record_write(&self, bytes: usize) {
        self.writes.fetch_add(1, Ordering::Relaxed);
        self.bytes_written.fetch_add(bytes as u64, Ordering::Relaxed);
    }

    pub(crate) fn record_delete(&self) {
        self.deletes.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_list(&self) {
        self.lists.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_cas_conflict(&self, kind: ErrorKind) {
        let counter = match kind {
            ErrorKind::CasKeyAbsent => &self.cas_key_absent,
            ErrorKind::CasVersionMismatch => &self.cas_version_mismatch,
            ErrorKind::CasConcurrentUpdate => &self.cas_concurrent_update,
            _ => return,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_purged(&self, rows: u64) {
        self.expired_purged.fetch_add(rows, Ordering::Relaxed);
    }

    pub(crate) fn record_error(&self) {
        self.errors.fetch_add(1, Ordering::Relaxed);
    }

    // === Getter methods (public API) ===

    /// Returns the total number of reads.
    pub fn reads(&self) -> u64 {
        self.reads.load(Ordering::Relaxed)
    }

    /// Returns the number of reads that found an entry.
    pub fn hits(&self) -> u64 {
        self.hits.load(Ordering::Relaxed)
    }

    /// Returns the total number of successful writes.
    pub fn writes(&self) -> u64 {
        self.writes.load(Ordering::Relaxed)
    }

    /// Returns the total number of deletes that removed an entry.
    pub fn deletes(&self) -> u64 {
        self.deletes.load(Ordering::Relaxed)
    }

    /// Returns the total number of pages listed.
    pub fn lists(&self) -> u64 {
        self.lists.load(Ordering::Relaxed)
    }

    /// Returns the total number of rejected CAS writes, all kinds.
    pub fn cas_conflicts(&self) -> u64 {
        self.cas_key_absent.load(Ordering::Relaxed)
            + self.cas_version_mismatch.load(Ordering::Relaxed)
            + self.cas_concurrent_update.load(Ordering::Relaxed)
    }

    /// Returns the number of expired rows removed by sweeps.
    pub fn expired_purged(&self) -> u64 {
        self.expired_purged.load(Ordering::Relaxed)
    }

    /// Returns the total number of backend errors.
    pub fn errors(&self) -> u64 {
        self.errors.load(Ordering::Relaxed)
    }

    /// Returns a snapshot of all stats.
    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            reads: self.reads(),
            hits: self.hits(),
            writes: self.writes(),
            deletes: self.deletes(),
            lists: self.lists(),
            cas_key_absent: self.cas_key_absent.load(Ordering::Relaxed),
            cas_version_mismatch: self.cas_version_mismatch.load(Ordering::Relaxed),
            cas_concurrent_update: self.cas_concurrent_update.load(Ordering::Relaxed),
            expired_purged: self.expired_purged(),
            bytes_written: self.bytes_written.load(Ordering::Relaxed),
            bytes_read: self.bytes_read.load(Ordering::Relaxed),
            errors: self.errors(),
        }
    }
}

/// A point-in-time snapshot of store statistics.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct StatsSnapshot {
    /// Total number of reads.
    pub reads: u64,
    /// Reads that found an entry.
    pub hits: u64,
    /// Successful writes.
    pub writes: u64,
    /// Deletes that removed an entry.
    pub deletes: u64,
    /// Pages listed.
    pub lists: u64,
    /// CAS writes rejected because the key was absent.
    pub cas_key_absent: u64,
    /// CAS writes rejected on version mismatch.
    pub cas_version_mismatch: u64,
    /// CAS writes that lost a backend race.
    pub cas_concurrent_update: u64,
    /// Expired rows removed by sweeps.
    pub expired_purged: u64,
    /// Total bytes written.
    pub bytes_written: u64,
    /// Total bytes read.
    pub bytes_read: u64,
    /// Backend errors.
    pub errors: u64,
}
