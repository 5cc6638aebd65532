//! Store facade.

use crate::clock::{Clock, SystemClock};
use crate::config::Config;
use crate::cursor::Cursor;
use crate::entry::{
    validate_key, validate_namespace, Entry, GetOptions, ListOptions, ListPage, SetOptions,
};
use crate::error::{KvError, KvResult};
use crate::stats::StoreStats;
use crate::sweeper::Sweeper;
use crate::types::{Timestamp, Version};
use nskv_storage::{
    InMemoryBackend, KvBackend, PutOutcome, PutRequest, ScanRequest, SqliteBackend,
    StorageError, StorageResult,
};
use parking_lot::{Mutex, RwLock};
use std::path::Path;
use std::sync::{Arc, Weak};
use tracing::{debug, info, warn};

/// State shared with the sweeper thread.
struct Shared {
    backend: Box<dyn KvBackend>,
    clock: Arc<dyn Clock>,
    stats: StoreStats,
}

impl Shared {
    fn now(&self) -> Timestamp {
        self.clock.now()
    }

    fn storage<T>(&self, result: StorageResult<T>) -> KvResult<T> {
        result.map_err(|err| {
            self.stats.record_error();
            KvError::from(err)
        })
    }

    fn purge_expired(&self) -> KvResult<u64> {
        let now = self.now();
        let purged = self.storage(self.backend.purge_expired(now.as_millis()))?;
        self.stats.record_purged(purged);
        debug!(purged, now = now.as_millis(), "purged expired entries");
        Ok(purged)
    }
}

/// A namespaced key-value store.
///
/// `KvStore` is the entry point for all reads and writes. It is `Send + Sync`
/// and meant to be shared between threads, typically behind an `Arc`.
///
/// # Versions and CAS
///
/// Every successful write returns the entry's new [`Version`]. Passing that
/// version back through [`SetOptions::cas`] makes the next write conditional:
/// it only succeeds if nobody else wrote in between.
///
/// ```rust
/// use nskv_core::{KvStore, SetOptions};
///
/// let store = KvStore::open_in_memory().unwrap();
/// let v1 = store.set("builds", "u1:active", br#"{"id":1}"#).unwrap();
///
/// let v2 = store
///     .set_with("builds", "u1:active", br#"{"id":2}"#, &SetOptions::new().cas(v1))
///     .unwrap();
/// assert_eq!(v2.as_u64(), 2);
///
/// // A stale version is rejected.
/// let err = store
///     .set_with("builds", "u1:active", br#"{"id":3}"#, &SetOptions::new().cas(v1))
///     .unwrap_err();
/// assert!(err.is_cas_conflict());
/// ```
///
/// # Expiry
///
/// Entries written with a TTL disappear from reads and listings as soon as
/// the TTL elapses. Physical removal happens on `delete`, through
/// [`KvStore::cleanup_all_expired`], or by the background sweeper when
/// [`Config::sweep_interval`] is non-zero.
pub struct KvStore {
    config: Config,
    shared: Arc<Shared>,
    sweeper: Mutex<Option<Sweeper>>,
    is_open: RwLock<bool>,
}

impl KvStore {
    /// Opens (or creates) a SQLite-backed store with default configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened or has a newer schema.
    pub fn open(path: impl AsRef<Path>) -> KvResult<Self> {
        Self::open_with_config(path, Config::default())
    }

    /// Opens a SQLite-backed store with custom configuration.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` for an unusable configuration,
    /// `BackendUnavailable` if the file is missing and `create_if_missing`
    /// is false, or another backend error if the file cannot be opened.
    pub fn open_with_config(path: impl AsRef<Path>, config: Config) -> KvResult<Self> {
        config.validate()?;
        let path = path.as_ref();
        let backend = SqliteBackend::open(path, config.sqlite_options())?;
        info!(path = %path.display(), "opened store");
        Self::with_clock(Box::new(backend), config, Arc::new(SystemClock))
    }

    /// Creates a store that keeps everything in memory.
    ///
    /// # Errors
    ///
    /// Only fails if the background sweeper cannot be started.
    pub fn open_in_memory() -> KvResult<Self> {
        Self::with_backend(Box::new(InMemoryBackend::new()), Config::default())
    }

    /// Creates a store over an existing backend.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` for an unusable configuration.
    pub fn with_backend(backend: Box<dyn KvBackend>, config: Config) -> KvResult<Self> {
        Self::with_clock(backend, config, Arc::new(SystemClock))
    }

    /// Creates a store over an existing backend with an explicit time source.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` for an unusable configuration, or `Backend`
    /// if the sweeper thread cannot be spawned.
    pub fn with_clock(
        backend: Box<dyn KvBackend>,
        config: Config,
        clock: Arc<dyn Clock>,
    ) -> KvResult<Self> {
        config.validate()?;
        let shared = Arc::new(Shared {
            backend,
            clock,
            stats: StoreStats::new(),
        });

        let sweeper = if config.sweep_interval.is_zero() {
            None
        } else {
            Some(spawn_sweeper(&shared, &config)?)
        };

        Ok(Self {
            config,
            shared,
            sweeper: Mutex::new(sweeper),
            is_open: RwLock::new(true),
        })
    }

    // ========================================================================
    // Reads
    // ========================================================================

    /// Returns the live entry for `(namespace, key)`.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` for an empty namespace or key, `Closed`
    /// after [`KvStore::close`], or a backend error.
    pub fn get(&self, namespace: &str, key: &str) -> KvResult<Option<Entry>> {
        self.get_with(namespace, key, &GetOptions::default())
    }

    /// Returns the live entry, filtered by `options`.
    ///
    /// An entry whose content type does not match the filter is reported as
    /// absent.
    ///
    /// # Errors
    ///
    /// Same as [`KvStore::get`].
    pub fn get_with(
        &self,
        namespace: &str,
        key: &str,
        options: &GetOptions,
    ) -> KvResult<Option<Entry>> {
        self.ensure_open()?;
        validate_key(namespace, key)?;

        let now = self.shared.now();
        let stored = self
            .shared
            .storage(self.shared.backend.get(namespace, key, now.as_millis()))?
            .filter(|stored| {
                options
                    .content_type
                    .as_deref()
                    .map_or(true, |wanted| stored.content_type == wanted)
            });

        self.shared
            .stats
            .record_read(stored.as_ref().map(|s| s.value.len()));
        Ok(stored.map(|stored| Entry::from_stored(namespace, key, stored)))
    }

    /// Returns true if a live entry exists for `(namespace, key)`.
    ///
    /// # Errors
    ///
    /// Same as [`KvStore::get`].
    pub fn exists(&self, namespace: &str, key: &str) -> KvResult<bool> {
        self.get(namespace, key).map(|entry| entry.is_some())
    }

    /// Lists live keys of a namespace in ascending order, one page at a time.
    ///
    /// ```rust
    /// use nskv_core::{KvStore, ListOptions};
    ///
    /// let store = KvStore::open_in_memory().unwrap();
    /// for key in ["a", "b", "c"] {
    ///     store.set("ns", key, b"1").unwrap();
    /// }
    ///
    /// let first = store.list("ns", &ListOptions::new().limit(2)).unwrap();
    /// assert_eq!(first.keys, ["a", "b"]);
    ///
    /// let cursor = first.next_cursor.unwrap();
    /// let second = store.list("ns", &ListOptions::new().limit(2).cursor(cursor)).unwrap();
    /// assert_eq!(second.keys, ["c"]);
    /// assert!(second.is_last());
    /// ```
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` for an empty namespace or a zero limit,
    /// `InvalidCursor` for a malformed cursor, `Closed`, or a backend error.
    pub fn list(&self, namespace: &str, options: &ListOptions) -> KvResult<ListPage> {
        self.ensure_open()?;
        validate_namespace(namespace)?;
        let limit = self.config.page_limit(options.limit)?;
        let cursor = options.cursor.as_deref().map(Cursor::decode).transpose()?;

        let request = ScanRequest {
            prefix: options.prefix.as_deref().unwrap_or(""),
            after: cursor.as_ref().map(Cursor::key),
            // One extra key tells us whether another page exists.
            limit: limit.saturating_add(1),
        };
        let now = self.shared.now();
        let mut keys = self
            .shared
            .storage(self.shared.backend.scan(namespace, &request, now.as_millis()))?;

        let next_cursor = if keys.len() > limit {
            keys.truncate(limit);
            keys.last().map(|last| Cursor::after(last.as_str()).encode())
        } else {
            None
        };

        self.shared.stats.record_list();
        Ok(ListPage { keys, next_cursor })
    }

    /// Returns the number of live entries in each namespace.
    ///
    /// # Errors
    ///
    /// Returns `Closed` or a backend error.
    pub fn namespaces(&self) -> KvResult<Vec<(String, u64)>> {
        self.ensure_open()?;
        let now = self.shared.now();
        self.shared
            .storage(self.shared.backend.namespace_counts(now.as_millis()))
    }

    // ========================================================================
    // Writes
    // ========================================================================

    /// Unconditionally writes `value` with the default content type and no
    /// expiry. Returns the new version.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` for an empty namespace or key, `Closed`, or
    /// a backend error.
    pub fn set(&self, namespace: &str, key: &str, value: &[u8]) -> KvResult<Version> {
        self.set_with(namespace, key, value, &SetOptions::default())
    }

    /// Writes `value` with explicit TTL, content type and CAS options.
    ///
    /// # Errors
    ///
    /// In addition to the errors of [`KvStore::set`], a CAS write fails with
    /// `CasKeyAbsent`, `CasVersionMismatch` or `CasConcurrentUpdate`. The
    /// stored entry is unchanged after any failure.
    pub fn set_with(
        &self,
        namespace: &str,
        key: &str,
        value: &[u8],
        options: &SetOptions,
    ) -> KvResult<Version> {
        self.ensure_open()?;
        validate_key(namespace, key)?;
        let content_type = options
            .content_type
            .as_deref()
            .unwrap_or(&self.config.default_content_type);
        if content_type.is_empty() {
            return Err(KvError::invalid_argument("content type must not be empty"));
        }

        let now = self.shared.now();
        let request = PutRequest {
            namespace,
            key,
            value,
            content_type,
            expires_at: options.expires_at(now).map(Timestamp::as_millis),
            expected_version: options.cas.map(Version::as_u64),
        };
        let outcome = self
            .shared
            .storage(self.shared.backend.put(&request, now.as_millis()))?;

        let err = match outcome {
            PutOutcome::Written(version) => {
                self.shared.stats.record_write(value.len());
                debug!(namespace, key, version, "wrote entry");
                return Ok(Version::new(version));
            }
            PutOutcome::Absent => KvError::CasKeyAbsent {
                namespace: namespace.to_owned(),
                key: key.to_owned(),
            },
            PutOutcome::VersionMismatch { current } => match options.cas {
                Some(expected) => KvError::CasVersionMismatch {
                    namespace: namespace.to_owned(),
                    key: key.to_owned(),
                    expected,
                    actual: Version::new(current),
                },
                None => {
                    self.shared.stats.record_error();
                    return Err(KvError::Backend(StorageError::Corrupted(format!(
                        "unconditional write to {namespace}/{key} reported a version mismatch"
                    ))));
                }
            },
            PutOutcome::Raced => KvError::CasConcurrentUpdate {
                namespace: namespace.to_owned(),
                key: key.to_owned(),
            },
        };

        self.shared.stats.record_cas_conflict(err.kind());
        debug!(namespace, key, kind = %err.kind(), "CAS write rejected");
        Err(err)
    }

    /// Deletes the entry. Returns true only if a live entry was removed.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` for an empty namespace or key, `Closed`, or
    /// a backend error.
    pub fn delete(&self, namespace: &str, key: &str) -> KvResult<bool> {
        self.ensure_open()?;
        validate_key(namespace, key)?;

        let now = self.shared.now();
        let removed = self
            .shared
            .storage(self.shared.backend.delete(namespace, key, now.as_millis()))?;
        if removed {
            self.shared.stats.record_delete();
            debug!(namespace, key, "deleted entry");
        }
        Ok(removed)
    }

    /// Physically removes every expired entry in every namespace.
    ///
    /// Returns the number of rows removed. Running it again right away
    /// removes nothing.
    ///
    /// # Errors
    ///
    /// Returns `Closed` or a backend error.
    pub fn cleanup_all_expired(&self) -> KvResult<u64> {
        self.ensure_open()?;
        self.shared.purge_expired()
    }

    // ========================================================================
    // Lifecycle
    // ========================================================================

    /// Liveness probe. Never errors; returns false after `close` or on any
    /// backend failure.
    #[must_use]
    pub fn healthcheck(&self) -> bool {
        if !self.is_open() {
            return false;
        }
        match self.shared.backend.ping() {
            Ok(()) => true,
            Err(err) => {
                warn!(error = %err, "healthcheck failed");
                false
            }
        }
    }

    /// Closes the store.
    ///
    /// Stops the sweeper and releases backend connections. Every later
    /// operation fails with `Closed`. Closing twice is a no-op.
    ///
    /// # Errors
    ///
    /// Returns a backend error if connections could not be released cleanly.
    pub fn close(&self) -> KvResult<()> {
        let mut is_open = self.is_open.write();
        if !*is_open {
            return Ok(());
        }
        *is_open = false;

        if let Some(mut sweeper) = self.sweeper.lock().take() {
            sweeper.stop();
        }
        self.shared.storage(self.shared.backend.close())?;
        info!("closed store");
        Ok(())
    }

    /// Checks if the store is open.
    #[must_use]
    pub fn is_open(&self) -> bool {
        *self.is_open.read()
    }

    fn ensure_open(&self) -> KvResult<()> {
        if *self.is_open.read() {
            Ok(())
        } else {
            Err(KvError::Closed)
        }
    }

    /// Returns the current time as seen by the store.
    #[must_use]
    pub fn now(&self) -> Timestamp {
        self.shared.now()
    }

    /// Returns store statistics.
    #[must_use]
    pub fn stats(&self) -> &StoreStats {
        &self.shared.stats
    }

    /// Returns store configuration.
    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }
}

fn spawn_sweeper(shared: &Arc<Shared>, config: &Config) -> KvResult<Sweeper> {
    let weak: Weak<Shared> = Arc::downgrade(shared);
    Sweeper::spawn(config.sweep_interval, move || {
        let Some(shared) = weak.upgrade() else {
            return;
        };
        if let Err(err) = shared.purge_expired() {
            warn!(error = %err, "background sweep failed");
        }
    })
    .map_err(|err| KvError::Backend(StorageError::Io(err)))
}

impl std::fmt::Debug for KvStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KvStore")
            .field("is_open", &self.is_open())
            .field("clock", &self.shared.clock)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl Drop for KvStore {
    fn drop(&mut self) {
        let _ = self.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::error::ErrorKind;
    use std::time::Duration;

    fn create_store() -> (KvStore, ManualClock) {
        let clock = ManualClock::new(Timestamp::from_millis(1_000_000));
        let store = KvStore::with_clock(
            Box::new(InMemoryBackend::new()),
            Config::default(),
            Arc::new(clock.clone()),
        )
        .unwrap();
        (store, clock)
    }

    #[test]
    fn open_in_memory() {
        let store = KvStore::open_in_memory().unwrap();
        assert!(store.is_open());
        assert!(store.healthcheck());
    }

    #[test]
    fn set_then_get() {
        let (store, clock) = create_store();
        let version = store.set("builds", "u1:active", br#"{"id":1}"#).unwrap();
        assert_eq!(version, Version::INITIAL);

        let entry = store.get("builds", "u1:active").unwrap().unwrap();
        assert_eq!(entry.value, br#"{"id":1}"#);
        assert_eq!(entry.content_type, "application/json");
        assert_eq!(entry.version, Version::INITIAL);
        assert_eq!(entry.expires_at, None);
        assert_eq!(entry.updated_at, clock.now());
    }

    #[test]
    fn versions_increase_by_one() {
        let (store, _clock) = create_store();
        for expected in 1..=5 {
            let version = store.set("ns", "k", b"x").unwrap();
            assert_eq!(version.as_u64(), expected);
        }
    }

    #[test]
    fn cas_success_and_failures() {
        let (store, _clock) = create_store();
        let v1 = store.set("ns", "k", b"one").unwrap();

        let v2 = store
            .set_with("ns", "k", b"two", &SetOptions::new().cas(v1))
            .unwrap();
        assert_eq!(v2, v1.next());

        let err = store
            .set_with("ns", "k", b"three", &SetOptions::new().cas(v1))
            .unwrap_err();
        match err {
            KvError::CasVersionMismatch {
                expected, actual, ..
            } => {
                assert_eq!(expected, v1);
                assert_eq!(actual, v2);
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(store.get("ns", "k").unwrap().unwrap().value, b"two");

        let err = store
            .set_with("ns", "missing", b"x", &SetOptions::new().cas(Version::INITIAL))
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::CasKeyAbsent);
        assert!(store.get("ns", "missing").unwrap().is_none());

        assert_eq!(store.stats().snapshot().cas_version_mismatch, 1);
        assert_eq!(store.stats().snapshot().cas_key_absent, 1);
    }

    #[test]
    fn ttl_hides_entry_at_expiry() {
        let (store, clock) = create_store();
        store
            .set_with("ns", "temp", b"1", &SetOptions::new().ttl_seconds(1))
            .unwrap();
        assert!(store.exists("ns", "temp").unwrap());

        clock.advance(Duration::from_millis(999));
        assert!(store.exists("ns", "temp").unwrap());

        clock.advance(Duration::from_millis(1));
        assert!(store.get("ns", "temp").unwrap().is_none());
        assert!(store.list("ns", &ListOptions::new()).unwrap().keys.is_empty());
    }

    #[test]
    fn expired_key_is_recreated_at_version_one() {
        let (store, clock) = create_store();
        store.set("ns", "k", b"a").unwrap();
        store
            .set_with("ns", "k", b"b", &SetOptions::new().ttl_seconds(1))
            .unwrap();
        clock.advance(Duration::from_secs(2));

        let err = store
            .set_with("ns", "k", b"c", &SetOptions::new().cas(Version::new(2)))
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::CasKeyAbsent);
        assert_eq!(store.set("ns", "k", b"d").unwrap(), Version::INITIAL);
    }

    #[test]
    fn overwrite_clears_ttl() {
        let (store, clock) = create_store();
        store
            .set_with("ns", "k", b"a", &SetOptions::new().ttl_seconds(1))
            .unwrap();
        store.set("ns", "k", b"b").unwrap();
        clock.advance(Duration::from_secs(10));
        assert_eq!(store.get("ns", "k").unwrap().unwrap().value, b"b");
    }

    #[test]
    fn content_type_filter() {
        let (store, _clock) = create_store();
        store
            .set_with(
                "ns",
                "k",
                b"hello",
                &SetOptions::new().content_type("text/plain"),
            )
            .unwrap();

        let text = GetOptions::new().content_type("text/plain");
        let json = GetOptions::new().content_type("application/json");
        assert!(store.get_with("ns", "k", &text).unwrap().is_some());
        assert!(store.get_with("ns", "k", &json).unwrap().is_none());
    }

    #[test]
    fn delete_is_idempotent() {
        let (store, _clock) = create_store();
        store.set("ns", "k", b"v").unwrap();
        assert!(store.delete("ns", "k").unwrap());
        assert!(!store.delete("ns", "k").unwrap());
        assert!(store.get("ns", "k").unwrap().is_none());
        assert_eq!(store.set("ns", "k", b"v").unwrap(), Version::INITIAL);
    }

    #[test]
    fn delete_of_expired_entry_reports_false() {
        let (store, clock) = create_store();
        store
            .set_with("ns", "k", b"v", &SetOptions::new().ttl_seconds(1))
            .unwrap();
        clock.advance(Duration::from_secs(1));
        assert!(!store.delete("ns", "k").unwrap());
        assert_eq!(store.cleanup_all_expired().unwrap(), 0);
    }

    #[test]
    fn namespaces_are_isolated() {
        let (store, _clock) = create_store();
        store.set("a", "k", b"1").unwrap();
        store.set("b", "k", b"2").unwrap();
        assert_eq!(store.get("a", "k").unwrap().unwrap().value, b"1");
        assert!(store.delete("a", "k").unwrap());
        assert!(store.get("b", "k").unwrap().is_some());
        assert_eq!(store.namespaces().unwrap(), vec![("b".to_owned(), 1)]);
    }

    #[test]
    fn list_pages_with_prefix() {
        let (store, _clock) = create_store();
        for key in ["u1:a", "u1:b", "u1:c", "u2:a"] {
            store.set("ns", key, b"1").unwrap();
        }

        let options = ListOptions::new().prefix("u1:").limit(2);
        let first = store.list("ns", &options).unwrap();
        assert_eq!(first.keys, ["u1:a", "u1:b"]);

        let second = store
            .list("ns", &options.clone().cursor(first.next_cursor.unwrap()))
            .unwrap();
        assert_eq!(second.keys, ["u1:c"]);
        assert!(second.is_last());
    }

    #[test]
    fn exact_page_has_no_cursor() {
        let (store, _clock) = create_store();
        for key in ["a", "b"] {
            store.set("ns", key, b"1").unwrap();
        }
        let page = store.list("ns", &ListOptions::new().limit(2)).unwrap();
        assert_eq!(page.keys.len(), 2);
        assert!(page.next_cursor.is_none());
    }

    #[test]
    fn list_validates_arguments() {
        let (store, _clock) = create_store();
        let err = store.list("ns", &ListOptions::new().limit(0)).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);

        let err = store
            .list("ns", &ListOptions::new().cursor("***"))
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidCursor);

        let err = store.list("", &ListOptions::new()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);
    }

    #[test]
    fn limit_is_clamped() {
        let clock = ManualClock::new(Timestamp::from_millis(1));
        let store = KvStore::with_clock(
            Box::new(InMemoryBackend::new()),
            Config::new().default_page_size(2).max_page_size(3),
            Arc::new(clock),
        )
        .unwrap();
        for key in ["a", "b", "c", "d"] {
            store.set("ns", key, b"1").unwrap();
        }
        assert_eq!(store.list("ns", &ListOptions::new()).unwrap().keys.len(), 2);
        let page = store.list("ns", &ListOptions::new().limit(50)).unwrap();
        assert_eq!(page.keys, ["a", "b", "c"]);
        assert!(page.next_cursor.is_some());
    }

    #[test]
    fn empty_identifiers_rejected() {
        let (store, _clock) = create_store();
        assert_eq!(
            store.set("", "k", b"v").unwrap_err().kind(),
            ErrorKind::InvalidArgument
        );
        assert_eq!(
            store.get("ns", "").unwrap_err().kind(),
            ErrorKind::InvalidArgument
        );
    }

    #[test]
    fn cleanup_removes_only_expired() {
        let (store, clock) = create_store();
        store.set("a", "keep", b"1").unwrap();
        store
            .set_with("a", "gone", b"1", &SetOptions::new().ttl_seconds(1))
            .unwrap();
        store
            .set_with("b", "gone", b"1", &SetOptions::new().ttl_seconds(1))
            .unwrap();
        clock.advance(Duration::from_secs(5));

        assert_eq!(store.cleanup_all_expired().unwrap(), 2);
        assert_eq!(store.cleanup_all_expired().unwrap(), 0);
        assert!(store.exists("a", "keep").unwrap());
        assert_eq!(store.stats().expired_purged(), 2);
    }

    #[test]
    fn operations_after_close_fail() {
        let (store, _clock) = create_store();
        store.set("ns", "k", b"v").unwrap();
        store.close().unwrap();
        store.close().unwrap();

        assert!(!store.is_open());
        assert!(!store.healthcheck());
        assert_eq!(store.get("ns", "k").unwrap_err().kind(), ErrorKind::Closed);
        assert_eq!(
            store.set("ns", "k", b"v").unwrap_err().kind(),
            ErrorKind::Closed
        );
        assert_eq!(
            store.list("ns", &ListOptions::new()).unwrap_err().kind(),
            ErrorKind::Closed
        );
        assert_eq!(
            store.cleanup_all_expired().unwrap_err().kind(),
            ErrorKind::Closed
        );
    }

    #[test]
    fn sqlite_store_persists() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("store.db");

        {
            let store = KvStore::open(&path).unwrap();
            store.set("ns", "k", b"persisted").unwrap();
            store.close().unwrap();
        }

        let store = KvStore::open(&path).unwrap();
        let entry = store.get("ns", "k").unwrap().unwrap();
        assert_eq!(entry.value, b"persisted");
        assert_eq!(entry.version, Version::INITIAL);
    }

    #[test]
    fn missing_file_without_create_is_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        let err = KvStore::open_with_config(
            dir.path().join("absent.db"),
            Config::new().create_if_missing(false),
        )
        .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::BackendUnavailable);
    }

    #[test]
    fn background_sweeper_purges() {
        let clock = ManualClock::new(Timestamp::from_millis(1_000));
        let store = KvStore::with_clock(
            Box::new(InMemoryBackend::new()),
            Config::new().sweep_interval(Duration::from_millis(5)),
            Arc::new(clock.clone()),
        )
        .unwrap();
        store
            .set_with("ns", "k", b"v", &SetOptions::new().ttl_seconds(1))
            .unwrap();
        clock.advance(Duration::from_secs(2));

        let deadline = std::time::Instant::now() + Duration::from_secs(5);
        while store.stats().expired_purged() == 0 && std::time::Instant::now() < deadline {
            std::thread::sleep(Duration::from_millis(5));
        }
        assert_eq!(store.stats().expired_purged(), 1);
        store.close().unwrap();
    }

    #[test]
    fn list_with_unbounded_page_size() {
        let store = KvStore::with_backend(
            Box::new(InMemoryBackend::new()),
            Config::new().max_page_size(usize::MAX),
        )
        .unwrap();
        store.set("ns", "a", b"1").unwrap();
        store.set("ns", "b", b"2").unwrap();

        let page = store
            .list("ns", &ListOptions::new().limit(usize::MAX))
            .unwrap();
        assert_eq!(page.keys, ["a", "b"]);
        assert!(page.is_last());
    }

    /// Backend whose conditional update always loses to another writer.
    struct RacingBackend(InMemoryBackend);

    impl KvBackend for RacingBackend {
        fn get(
            &self,
            namespace: &str,
            key: &str,
            now: u64,
        ) -> StorageResult<Option<nskv_storage::StoredEntry>> {
            self.0.get(namespace, key, now)
        }

        fn put(&self, request: &PutRequest<'_>, now: u64) -> StorageResult<PutOutcome> {
            match request.expected_version {
                Some(_) => Ok(PutOutcome::Raced),
                None => self.0.put(request, now),
            }
        }

        fn delete(&self, namespace: &str, key: &str, now: u64) -> StorageResult<bool> {
            self.0.delete(namespace, key, now)
        }

        fn scan(
            &self,
            namespace: &str,
            request: &ScanRequest<'_>,
            now: u64,
        ) -> StorageResult<Vec<String>> {
            self.0.scan(namespace, request, now)
        }

        fn purge_expired(&self, now: u64) -> StorageResult<u64> {
            self.0.purge_expired(now)
        }

        fn namespace_counts(&self, now: u64) -> StorageResult<Vec<(String, u64)>> {
            self.0.namespace_counts(now)
        }

        fn ping(&self) -> StorageResult<()> {
            self.0.ping()
        }

        fn close(&self) -> StorageResult<()> {
            self.0.close()
        }
    }

    #[test]
    fn raced_cas_reports_concurrent_update() {
        let store = KvStore::with_backend(
            Box::new(RacingBackend(InMemoryBackend::new())),
            Config::default(),
        )
        .unwrap();
        let v1 = store.set("ns", "k", b"old").unwrap();

        let err = store
            .set_with("ns", "k", b"new", &SetOptions::new().cas(v1))
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::CasConcurrentUpdate);
        assert!(err.is_cas_conflict());
        assert_eq!(store.stats().snapshot().cas_concurrent_update, 1);
        assert_eq!(store.get("ns", "k").unwrap().unwrap().value, b"old");
    }

    #[test]
    fn stats_track_operations() {
        let (store, _clock) = create_store();
        store.set("ns", "k", b"abc").unwrap();
        store.get("ns", "k").unwrap();
        store.get("ns", "missing").unwrap();
        store.list("ns", &ListOptions::new()).unwrap();
        store.delete("ns", "k").unwrap();

        let snap = store.stats().snapshot();
        assert_eq!(snap.writes, 1);
        assert_eq!(snap.bytes_written, 3);
        assert_eq!(snap.reads, 2);
        assert_eq!(snap.hits, 1);
        assert_eq!(snap.lists, 1);
        assert_eq!(snap.deletes, 1);
    }
}
