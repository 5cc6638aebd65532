//! SQLite storage backend for persistent storage.

use crate::backend::KvBackend;
use crate::error::{StorageError, StorageResult};
use crate::pool::ReaderPool;
use crate::record::{prefix_upper_bound, PutOutcome, PutRequest, ScanRequest, StoredEntry};
use parking_lot::Mutex;
use rusqlite::{params, Connection, OpenFlags, OptionalExtension, TransactionBehavior};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tracing::{debug, info};

/// Schema version written to `PRAGMA user_version`.
pub const SCHEMA_VERSION: i64 = 1;

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS kv (
    ns           TEXT    NOT NULL,
    key          TEXT    NOT NULL,
    value        BLOB    NOT NULL,
    content_type TEXT    NOT NULL DEFAULT 'application/json',
    version      INTEGER NOT NULL DEFAULT 1,
    expires_at   INTEGER,
    updated_at   INTEGER NOT NULL,
    PRIMARY KEY (ns, key)
);
CREATE INDEX IF NOT EXISTS idx_kv_ns_key ON kv (ns, key);
CREATE INDEX IF NOT EXISTS idx_kv_expires_at ON kv (expires_at) WHERE expires_at IS NOT NULL;
";

const LIVE: &str = "(expires_at IS NULL OR expires_at > ?)";

/// How aggressively SQLite syncs the WAL to disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Synchronous {
    /// Sync at checkpoints only. Durable against application crashes.
    #[default]
    Normal,
    /// Sync on every commit. Durable against power loss.
    Full,
}

impl Synchronous {
    fn as_pragma(self) -> &'static str {
        match self {
            Self::Normal => "NORMAL",
            Self::Full => "FULL",
        }
    }
}

/// Options for opening a [`SqliteBackend`].
#[derive(Debug, Clone)]
pub struct SqliteOptions {
    /// Create the database file if it does not exist.
    pub create_if_missing: bool,
    /// Upper bound on lock waits and reader checkouts.
    pub busy_timeout: Duration,
    /// Number of read connections kept open.
    pub reader_pool_size: usize,
    /// WAL sync level.
    pub synchronous: Synchronous,
}

impl Default for SqliteOptions {
    fn default() -> Self {
        Self {
            create_if_missing: true,
            busy_timeout: Duration::from_secs(5),
            reader_pool_size: 4,
            synchronous: Synchronous::Normal,
        }
    }
}

/// A SQLite-backed store using write-ahead logging.
///
/// One writer connection serializes all writes; a pool of reader
/// connections serves `get`, `scan`, and `ping` concurrently with the writer.
///
/// # Durability
///
/// - Journal mode is `WAL`, so readers never block on a committing writer
/// - Every write runs in a `BEGIN IMMEDIATE` transaction
/// - `synchronous` decides whether commits survive power loss
///
/// # Example
///
/// ```no_run
/// use nskv_storage::{KvBackend, SqliteBackend, SqliteOptions};
/// use std::path::Path;
///
/// let backend = SqliteBackend::open(Path::new("store.db"), SqliteOptions::default()).unwrap();
/// backend.ping().unwrap();
/// ```
pub struct SqliteBackend {
    path: PathBuf,
    writer: Mutex<Option<Connection>>,
    readers: ReaderPool,
    busy_timeout: Duration,
}

impl std::fmt::Debug for SqliteBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqliteBackend")
            .field("path", &self.path)
            .finish_non_exhaustive()
    }
}

impl SqliteBackend {
    /// Opens or creates a store at the given path.
    ///
    /// Parent directories are created when `create_if_missing` is set.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The file is missing and `create_if_missing` is false
    /// - The file is not a database or has a newer schema
    /// - An I/O error occurs
    pub fn open(path: &Path, options: SqliteOptions) -> StorageResult<Self> {
        if !path.exists() {
            if !options.create_if_missing {
                return Err(StorageError::NotFound {
                    path: path.to_path_buf(),
                });
            }
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let mut writer = Connection::open(path)?;
        writer.busy_timeout(options.busy_timeout)?;
        let mode: String = writer.pragma_update_and_check(None, "journal_mode", "WAL", |row| {
            row.get(0)
        })?;
        writer.pragma_update(None, "synchronous", options.synchronous.as_pragma())?;
        migrate(&mut writer)?;

        let readers = (0..options.reader_pool_size.max(1))
            .map(|_| open_reader(path, options.busy_timeout))
            .collect::<StorageResult<Vec<_>>>()?;

        info!(
            path = %path.display(),
            journal_mode = %mode,
            readers = readers.len(),
            "opened sqlite store"
        );

        Ok(Self {
            path: path.to_path_buf(),
            writer: Mutex::new(Some(writer)),
            readers: ReaderPool::new(readers, options.busy_timeout),
            busy_timeout: options.busy_timeout,
        })
    }

    /// Returns the path to the underlying database file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Runs `f` on the writer connection.
    ///
    /// Waiting for the writer mutex and waiting on SQLite's file lock share
    /// one `busy_timeout` budget, so queued writers never wait longer than
    /// the configured bound.
    fn with_writer<T>(&self, f: impl FnOnce(&mut Connection) -> StorageResult<T>) -> StorageResult<T> {
        let started = Instant::now();
        let mut guard = self
            .writer
            .try_lock_for(self.busy_timeout)
            .ok_or_else(|| self.writer_busy())?;
        let conn = guard.as_mut().ok_or(StorageError::Closed)?;

        let remaining = self.busy_timeout.saturating_sub(started.elapsed());
        if remaining.is_zero() {
            return Err(self.writer_busy());
        }
        conn.busy_timeout(remaining)?;
        f(conn)
    }

    fn writer_busy(&self) -> StorageError {
        StorageError::Busy(format!(
            "writer not available within {:?}",
            self.busy_timeout
        ))
    }
}

fn open_reader(path: &Path, busy_timeout: Duration) -> StorageResult<Connection> {
    let flags = OpenFlags::SQLITE_OPEN_READ_WRITE
        | OpenFlags::SQLITE_OPEN_NO_MUTEX
        | OpenFlags::SQLITE_OPEN_URI;
    let conn = Connection::open_with_flags(path, flags)?;
    conn.busy_timeout(busy_timeout)?;
    conn.pragma_update(None, "query_only", true)?;
    Ok(conn)
}

fn migrate(conn: &mut Connection) -> StorageResult<()> {
    let found: i64 = conn.pragma_query_value(None, "user_version", |row| row.get(0))?;
    if found > SCHEMA_VERSION {
        return Err(StorageError::InvalidFormat {
            found,
            supported: SCHEMA_VERSION,
        });
    }
    if found == SCHEMA_VERSION {
        return Ok(());
    }

    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
    tx.execute_batch(SCHEMA)?;
    tx.pragma_update(None, "user_version", SCHEMA_VERSION)?;
    tx.commit()?;
    debug!(from = found, to = SCHEMA_VERSION, "migrated schema");
    Ok(())
}

fn to_sql(value: u64) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}

fn from_sql(value: i64, column: &str) -> StorageResult<u64> {
    u64::try_from(value)
        .map_err(|_| StorageError::Corrupted(format!("negative {column}: {value}")))
}

impl KvBackend for SqliteBackend {
    fn get(&self, namespace: &str, key: &str, now: u64) -> StorageResult<Option<StoredEntry>> {
        let conn = self.readers.acquire()?;
        let sql = format!(
            "SELECT value, content_type, version, expires_at, updated_at
             FROM kv WHERE ns = ? AND key = ? AND {LIVE}"
        );
        let row = conn
            .prepare_cached(&sql)?
            .query_row(params![namespace, key, to_sql(now)], |row| {
                Ok((
                    row.get::<_, Vec<u8>>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, i64>(2)?,
                    row.get::<_, Option<i64>>(3)?,
                    row.get::<_, i64>(4)?,
                ))
            })
            .optional()?;

        row.map(|(value, content_type, version, expires_at, updated_at)| {
            Ok(StoredEntry {
                value,
                content_type,
                version: from_sql(version, "version")?,
                expires_at: expires_at
                    .map(|at| from_sql(at, "expires_at"))
                    .transpose()?,
                updated_at: from_sql(updated_at, "updated_at")?,
            })
        })
        .transpose()
    }

    fn put(&self, request: &PutRequest<'_>, now: u64) -> StorageResult<PutOutcome> {
        self.with_writer(|conn| {
            let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
            let now_sql = to_sql(now);
            let expires_at = request.expires_at.map(to_sql);

            let current = tx
                .prepare_cached(&format!(
                    "SELECT version FROM kv WHERE ns = ? AND key = ? AND {LIVE}"
                ))?
                .query_row(params![request.namespace, request.key, now_sql], |row| {
                    row.get::<_, i64>(0)
                })
                .optional()?
                .map(|version| from_sql(version, "version"))
                .transpose()?;

            let guard = match (request.expected_version, current) {
                (Some(_), None) => return Ok(PutOutcome::Absent),
                (Some(expected), Some(actual)) if expected != actual => {
                    return Ok(PutOutcome::VersionMismatch { current: actual });
                }
                (_, Some(actual)) => Some(actual),
                (None, None) => None,
            };

            let outcome = match guard {
                Some(version) => tx
                    .prepare_cached(&format!(
                        "UPDATE kv
                         SET value = ?, content_type = ?, version = version + 1,
                             expires_at = ?, updated_at = ?
                         WHERE ns = ? AND key = ? AND version = ? AND {LIVE}
                         RETURNING version"
                    ))?
                    .query_row(
                        params![
                            request.value,
                            request.content_type,
                            expires_at,
                            now_sql,
                            request.namespace,
                            request.key,
                            to_sql(version),
                            now_sql,
                        ],
                        |row| row.get::<_, i64>(0),
                    )
                    .optional()?
                    .map(|version| from_sql(version, "version"))
                    .transpose()?
                    .map_or(PutOutcome::Raced, PutOutcome::Written),
                None => {
                    tx.prepare_cached(
                        "INSERT INTO kv (ns, key, value, content_type, version, expires_at, updated_at)
                         VALUES (?1, ?2, ?3, ?4, 1, ?5, ?6)
                         ON CONFLICT (ns, key) DO UPDATE SET
                             value = excluded.value,
                             content_type = excluded.content_type,
                             version = 1,
                             expires_at = excluded.expires_at,
                             updated_at = excluded.updated_at",
                    )?
                    .execute(params![
                        request.namespace,
                        request.key,
                        request.value,
                        request.content_type,
                        expires_at,
                        now_sql,
                    ])?;
                    PutOutcome::Written(1)
                }
            };

            if let PutOutcome::Written(version) = outcome {
                tx.commit()?;
                debug!(
                    ns = request.namespace,
                    key = request.key,
                    version,
                    "committed write"
                );
            }
            Ok(outcome)
        })
    }

    fn delete(&self, namespace: &str, key: &str, now: u64) -> StorageResult<bool> {
        self.with_writer(|conn| {
            let removed = conn
                .prepare_cached("DELETE FROM kv WHERE ns = ?1 AND key = ?2 RETURNING expires_at")?
                .query_row(params![namespace, key], |row| row.get::<_, Option<i64>>(0))
                .optional()?;
            Ok(match removed {
                Some(expires_at) => expires_at.map_or(true, |at| at > to_sql(now)),
                None => false,
            })
        })
    }

    fn scan(
        &self,
        namespace: &str,
        request: &ScanRequest<'_>,
        now: u64,
    ) -> StorageResult<Vec<String>> {
        let upper = prefix_upper_bound(request.prefix);
        let conn = self.readers.acquire()?;
        let sql = format!(
            "SELECT key FROM kv
             WHERE ns = ?
               AND key >= ?
               AND (? IS NULL OR key < ?)
               AND (? IS NULL OR key > ?)
               AND {LIVE}
             ORDER BY key ASC
             LIMIT ?"
        );
        let mut stmt = conn.prepare_cached(&sql)?;
        let keys = stmt
            .query_map(
                params![
                    namespace,
                    request.prefix,
                    upper,
                    upper,
                    request.after,
                    request.after,
                    to_sql(now),
                    to_sql(request.limit as u64),
                ],
                |row| row.get::<_, String>(0),
            )?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(keys)
    }

    fn purge_expired(&self, now: u64) -> StorageResult<u64> {
        self.with_writer(|conn| {
            let removed = conn
                .prepare_cached("DELETE FROM kv WHERE expires_at IS NOT NULL AND expires_at <= ?1")?
                .execute(params![to_sql(now)])?;
            Ok(removed as u64)
        })
    }

    fn namespace_counts(&self, now: u64) -> StorageResult<Vec<(String, u64)>> {
        let conn = self.readers.acquire()?;
        let sql = format!("SELECT ns, COUNT(*) FROM kv WHERE {LIVE} GROUP BY ns ORDER BY ns");
        let mut stmt = conn.prepare_cached(&sql)?;
        let rows = stmt
            .query_map(params![to_sql(now)], |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?))
            })?
            .collect::<Result<Vec<_>, _>>()?;
        rows.into_iter()
            .map(|(ns, count)| Ok((ns, from_sql(count, "count")?)))
            .collect()
    }

    fn ping(&self) -> StorageResult<()> {
        let conn = self.readers.acquire()?;
        conn.query_row("SELECT 1", [], |row| row.get::<_, i64>(0))?;
        Ok(())
    }

    fn close(&self) -> StorageResult<()> {
        self.readers.close();
        let writer = self
            .writer
            .try_lock_for(self.busy_timeout)
            .ok_or_else(|| self.writer_busy())?
            .take();
        if let Some(conn) = writer {
            conn.close().map_err(|(_, err)| StorageError::from(err))?;
            info!(path = %self.path.display(), "closed sqlite store");
        }
        Ok(())
    }
}
