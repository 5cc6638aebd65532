//! # NSKV Core
//!
//! Namespaced key-value engine for NSKV.
//!
//! This crate provides:
//! - [`KvStore`], the store facade over a pluggable [`KvBackend`]
//! - Optimistic concurrency through per-entry versions and CAS writes
//! - Per-entry TTL, enforced lazily on every read
//! - Ordered, prefix-filtered key listing with opaque cursors
//! - Typed JSON helpers
//!
//! ```rust
//! use nskv_core::{KvStore, SetOptions};
//!
//! let store = KvStore::open_in_memory().unwrap();
//! let version = store
//!     .set_with("sessions", "abc", b"{}", &SetOptions::new().ttl_seconds(60))
//!     .unwrap();
//! assert_eq!(version.as_u64(), 1);
//! assert!(store.exists("sessions", "abc").unwrap());
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod clock;
mod config;
mod cursor;
mod entry;
mod error;
mod json;
mod stats;
mod store;
mod sweeper;
mod types;

pub use clock::{Clock, ManualClock, SystemClock};
pub use config::Config;
pub use cursor::Cursor;
pub use entry::{Entry, GetOptions, ListOptions, ListPage, SetOptions, JSON_CONTENT_TYPE};
pub use error::{ErrorKind, KvError, KvResult};
pub use json::JsonEntry;
pub use stats::{StatsSnapshot, StoreStats};
pub use store::KvStore;
pub use types::{Timestamp, Version};

pub use nskv_storage::{
    InMemoryBackend, KvBackend, SqliteBackend, SqliteOptions, StorageError,
    Synchronous,
};

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
