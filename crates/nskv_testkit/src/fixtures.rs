//! Test fixtures and store helpers.
//!
//! Provides convenience functions for setting up test stores
//! and common test scenarios.

use nskv_core::{Config, InMemoryBackend, KvStore, ManualClock, Timestamp};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::TempDir;

/// Instant a fresh [`ManualClock`] fixture starts at (2024-01-01T00:00:00Z).
pub const TEST_EPOCH: Timestamp = Timestamp::from_millis(1_704_067_200_000);

/// A test store with automatic cleanup.
pub struct TestStore {
    /// The store instance.
    pub store: KvStore,
    /// Handle on the store's clock, when it was built with one.
    pub clock: Option<ManualClock>,
    /// The temporary directory (kept alive to prevent cleanup).
    _temp_dir: Option<TempDir>,
}

impl TestStore {
    /// Creates a new in-memory test store.
    pub fn memory() -> Self {
        Self {
            store: KvStore::open_in_memory().expect("Failed to open in-memory store"),
            clock: None,
            _temp_dir: None,
        }
    }

    /// Creates a new SQLite-backed test store in a temporary directory.
    pub fn file() -> Self {
        Self::file_with_config(Config::default())
    }

    /// Creates a SQLite-backed test store with custom configuration.
    pub fn file_with_config(config: Config) -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let store = KvStore::open_with_config(temp_dir.path().join("test.nskv"), config)
            .expect("Failed to open file store");

        Self {
            store,
            clock: None,
            _temp_dir: Some(temp_dir),
        }
    }

    /// Creates an in-memory store driven by a [`ManualClock`] at [`TEST_EPOCH`].
    pub fn with_manual_clock() -> Self {
        let clock = ManualClock::new(TEST_EPOCH);
        let store = KvStore::with_clock(
            Box::new(InMemoryBackend::new()),
            Config::default(),
            Arc::new(clock.clone()),
        )
        .expect("Failed to open store with manual clock");

        Self {
            store,
            clock: Some(clock),
            _temp_dir: None,
        }
    }

    /// Returns the database path if file-based, None if in-memory.
    pub fn path(&self) -> Option<PathBuf> {
        self._temp_dir.as_ref().map(|d| d.path().join("test.nskv"))
    }

    /// Returns the manual clock.
    ///
    /// # Panics
    ///
    /// Panics if the store was not built with [`TestStore::with_manual_clock`].
    pub fn clock(&self) -> &ManualClock {
        self.clock
            .as_ref()
            .expect("store was not built with a manual clock")
    }
}

impl std::ops::Deref for TestStore {
    type Target = KvStore;

    fn deref(&self) -> &Self::Target {
        &self.store
    }
}

/// Runs a test with a temporary in-memory store.
///
/// # Example
///
/// ```rust
/// use nskv_testkit::with_temp_store;
///
/// with_temp_store(|store| {
///     store.set("ns", "key", b"{}").unwrap();
///     assert!(store.exists("ns", "key").unwrap());
/// });
/// ```
pub fn with_temp_store<F, R>(f: F) -> R
where
    F: FnOnce(&KvStore) -> R,
{
    let test_store = TestStore::memory();
    f(&test_store.store)
}

/// Runs a test with a temporary SQLite-backed store.
pub fn with_file_store<F, R>(f: F) -> R
where
    F: FnOnce(&KvStore, &Path) -> R,
{
    let test_store = TestStore::file();
    let path = test_store.path().expect("File store should have a path");
    f(&test_store.store, &path)
}

/// Test scenario helpers.
pub mod scenarios {
    use super::*;
    use nskv_core::SetOptions;

    /// Creates a store with `count` JSON entries `key-0000`, `key-0001`, ...
    /// in namespace `test`.
    pub fn populated_store(count: usize) -> TestStore {
        let test_store = TestStore::memory();
        for i in 0..count {
            test_store
                .set_json(
                    "test",
                    &format!("key-{i:04}"),
                    &serde_json::json!({ "index": i }),
                    SetOptions::new(),
                )
                .expect("Failed to set entry");
        }
        test_store
    }

    /// Creates a store with one entry in each of `count` namespaces.
    pub fn multi_namespace_store(count: usize) -> (TestStore, Vec<String>) {
        let test_store = TestStore::memory();
        let mut namespaces = Vec::with_capacity(count);

        for i in 0..count {
            let namespace = format!("namespace_{i}");
            test_store
                .set(&namespace, "only", format!(r#"{{"namespace":{i}}}"#).as_bytes())
                .expect("Failed to set entry");
            namespaces.push(namespace);
        }

        (test_store, namespaces)
    }

    /// Creates a clock-driven store holding `live` entries without TTL and
    /// `expiring` entries that expire after `ttl_secs`.
    pub fn expiring_store(live: usize, expiring: usize, ttl_secs: u64) -> TestStore {
        let test_store = TestStore::with_manual_clock();
        for i in 0..live {
            test_store
                .set("ttl", &format!("live-{i:04}"), b"1")
                .expect("Failed to set entry");
        }
        let options = SetOptions::new().ttl_seconds(ttl_secs);
        for i in 0..expiring {
            test_store
                .set_with("ttl", &format!("temp-{i:04}"), b"1", &options)
                .expect("Failed to set entry");
        }
        test_store
    }
}
