//! # NSKV Storage
//!
//! Storage backend trait and implementations for NSKV.
//!
//! This crate provides the lowest-level storage abstraction for NSKV.
//! Backends store rows keyed by `(namespace, key)` and provide ordered
//! scans and guarded writes. They do not interpret payloads, encode
//! cursors, or pick page sizes.
//!
//! ## Design Principles
//!
//! - One narrow trait, [`KvBackend`], one method per engine operation
//! - Liveness is always evaluated against the caller's `now`
//! - Conditional writes are atomic inside the backend
//! - Must be `Send + Sync` for concurrent access
//!
//! ## Available Backends
//!
//! - [`SqliteBackend`] - Durable storage in a SQLite file using WAL
//! - [`InMemoryBackend`] - For testing and ephemeral storage
//!
//! ## Example
//!
//! ```rust
//! use nskv_storage::{InMemoryBackend, KvBackend, ScanRequest};
//!
//! let backend = InMemoryBackend::new();
//! let request = ScanRequest { prefix: "", after: None, limit: 10 };
//! assert!(backend.scan("ns", &request, 0).unwrap().is_empty());
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod backend;
mod error;
mod memory;
mod pool;
mod record;
mod sqlite;

pub use backend::KvBackend;
pub use error::{StorageError, StorageResult};
pub use memory::InMemoryBackend;
pub use record::{is_live, prefix_upper_bound, PutOutcome, PutRequest, ScanRequest, StoredEntry};
pub use sqlite::{SqliteBackend, SqliteOptions, Synchronous, SCHEMA_VERSION};
