//! In-memory storage backend for testing.

use crate::backend::KvBackend;
use crate::error::{StorageError, StorageResult};
use crate::record::{is_live, PutOutcome, PutRequest, ScanRequest, StoredEntry};
use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::ops::Bound;
use std::sync::atomic::{AtomicBool, Ordering};

type RowKey = (String, String);

/// An in-memory storage backend.
///
/// This backend keeps every row in a `BTreeMap` ordered by
/// `(namespace, key)` and is suitable for:
/// - Unit tests
/// - Integration tests
/// - Ephemeral stores that don't need persistence
///
/// # Thread Safety
///
/// Writes hold the map's write lock for the whole check-and-write, so a
/// conditional put can never observe [`PutOutcome::Raced`].
///
/// # Example
///
/// ```rust
/// use nskv_storage::{InMemoryBackend, KvBackend, PutOutcome, PutRequest};
///
/// let backend = InMemoryBackend::new();
/// let request = PutRequest {
///     namespace: "ns",
///     key: "k",
///     value: b"v",
///     content_type: "text/plain",
///     expires_at: None,
///     expected_version: None,
/// };
/// assert_eq!(backend.put(&request, 0).unwrap(), PutOutcome::Written(1));
/// assert_eq!(backend.get("ns", "k", 0).unwrap().unwrap().value, b"v");
/// ```
#[derive(Debug, Default)]
pub struct InMemoryBackend {
    rows: RwLock<BTreeMap<RowKey, StoredEntry>>,
    closed: AtomicBool,
}

impl InMemoryBackend {
    /// Creates a new empty in-memory backend.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of physical rows, including expired ones.
    ///
    /// Useful for testing that sweeps reclaim space.
    #[must_use]
    pub fn row_count(&self) -> usize {
        self.rows.read().len()
    }

    fn ensure_open(&self) -> StorageResult<()> {
        if self.closed.load(Ordering::Acquire) {
            return Err(StorageError::Closed);
        }
        Ok(())
    }
}

fn row_key(namespace: &str, key: &str) -> RowKey {
    (namespace.to_owned(), key.to_owned())
}

impl KvBackend for InMemoryBackend {
    fn get(&self, namespace: &str, key: &str, now: u64) -> StorageResult<Option<StoredEntry>> {
        self.ensure_open()?;
        let rows = self.rows.read();
        Ok(rows
            .get(&row_key(namespace, key))
            .filter(|entry| entry.is_live(now))
            .cloned())
    }

    fn put(&self, request: &PutRequest<'_>, now: u64) -> StorageResult<PutOutcome> {
        self.ensure_open()?;
        let mut rows = self.rows.write();
        let id = row_key(request.namespace, request.key);
        let current = rows
            .get(&id)
            .filter(|entry| entry.is_live(now))
            .map(|entry| entry.version);

        let version = match (request.expected_version, current) {
            (Some(_), None) => return Ok(PutOutcome::Absent),
            (Some(expected), Some(actual)) if expected != actual => {
                return Ok(PutOutcome::VersionMismatch { current: actual });
            }
            (_, Some(actual)) => actual + 1,
            (None, None) => 1,
        };

        rows.insert(
            id,
            StoredEntry {
                value: request.value.to_vec(),
                content_type: request.content_type.to_owned(),
                version,
                expires_at: request.expires_at,
                updated_at: now,
            },
        );
        Ok(PutOutcome::Written(version))
    }

    fn delete(&self, namespace: &str, key: &str, now: u64) -> StorageResult<bool> {
        self.ensure_open()?;
        let removed = self.rows.write().remove(&row_key(namespace, key));
        Ok(removed.is_some_and(|entry| entry.is_live(now)))
    }

    fn scan(
        &self,
        namespace: &str,
        request: &ScanRequest<'_>,
        now: u64,
    ) -> StorageResult<Vec<String>> {
        self.ensure_open()?;
        let lower = match request.after {
            Some(after) if after >= request.prefix => Bound::Excluded(row_key(namespace, after)),
            _ => Bound::Included(row_key(namespace, request.prefix)),
        };

        let rows = self.rows.read();
        Ok(rows
            .range((lower, Bound::Unbounded))
            .take_while(|((ns, key), _)| ns == namespace && key.starts_with(request.prefix))
            .filter(|(_, entry)| entry.is_live(now))
            .take(request.limit)
            .map(|((_, key), _)| key.clone())
            .collect())
    }

    fn purge_expired(&self, now: u64) -> StorageResult<u64> {
        self.ensure_open()?;
        let mut rows = self.rows.write();
        let before = rows.len();
        rows.retain(|_, entry| entry.is_live(now));
        Ok((before - rows.len()) as u64)
    }

    fn namespace_counts(&self, now: u64) -> StorageResult<Vec<(String, u64)>> {
        self.ensure_open()?;
        let rows = self.rows.read();
        let mut counts: BTreeMap<&str, u64> = BTreeMap::new();
        for ((ns, _), entry) in rows.iter() {
            if is_live(entry.expires_at, now) {
                *counts.entry(ns.as_str()).or_default() += 1;
            }
        }
        Ok(counts
            .into_iter()
            .map(|(ns, count)| (ns.to_owned(), count))
            .collect())
    }

    fn ping(&self) -> StorageResult<()> {
        self.ensure_open()
    }

    fn close(&self) -> StorageResult<()> {
        self.closed.store(true, Ordering::Release);
        self.rows.write().clear();
        Ok(())
    }
}
