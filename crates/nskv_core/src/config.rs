//! Store configuration.

use crate::entry::JSON_CONTENT_TYPE;
use crate::error::{KvError, KvResult};
use nskv_storage::{SqliteOptions, Synchronous};
use std::time::Duration;

/// Configuration for opening a store.
#[derive(Debug, Clone)]
pub struct Config {
    /// Whether to create the database file if it doesn't exist.
    pub create_if_missing: bool,

    /// Upper bound on backend lock waits and reader checkouts.
    pub busy_timeout: Duration,

    /// Number of read connections kept open by the SQLite backend.
    pub reader_pool_size: usize,

    /// How aggressively commits are synced to disk.
    pub synchronous: Synchronous,

    /// Page size used by `list` when the caller gives no limit.
    pub default_page_size: usize,

    /// Largest page `list` will return; bigger limits are clamped.
    pub max_page_size: usize,

    /// How often to sweep expired entries in the background (0 = never).
    pub sweep_interval: Duration,

    /// Content type stored when a write does not name one.
    pub default_content_type: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            create_if_missing: true,
            busy_timeout: Duration::from_secs(5),
            reader_pool_size: 4,
            synchronous: Synchronous::Normal,
            default_page_size: 100,
            max_page_size: 1_000,
            sweep_interval: Duration::ZERO, // disabled
            default_content_type: JSON_CONTENT_TYPE.to_owned(),
        }
    }
}

impl Config {
    /// Creates a new configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets whether to create the database if missing.
    #[must_use]
    pub const fn create_if_missing(mut self, value: bool) -> Self {
        self.create_if_missing = value;
        self
    }

    /// Sets the backend busy timeout.
    #[must_use]
    pub const fn busy_timeout(mut self, timeout: Duration) -> Self {
        self.busy_timeout = timeout;
        self
    }

    /// Sets the number of reader connections.
    #[must_use]
    pub const fn reader_pool_size(mut self, size: usize) -> Self {
        self.reader_pool_size = size;
        self
    }

    /// Sets the sync level.
    #[must_use]
    pub const fn synchronous(mut self, value: Synchronous) -> Self {
        self.synchronous = value;
        self
    }

    /// Sets the default `list` page size.
    #[must_use]
    pub const fn default_page_size(mut self, size: usize) -> Self {
        self.default_page_size = size;
        self
    }

    /// Sets the maximum `list` page size.
    #[must_use]
    pub const fn max_page_size(mut self, size: usize) -> Self {
        self.max_page_size = size;
        self
    }

    /// Sets the background sweep interval.
    #[must_use]
    pub const fn sweep_interval(mut self, interval: Duration) -> Self {
        self.sweep_interval = interval;
        self
    }

    /// Sets the content type used when a write does not name one.
    #[must_use]
    pub fn default_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.default_content_type = content_type.into();
        self
    }

    /// Checks that the values can be used to open a store.
    pub(crate) fn validate(&self) -> KvResult<()> {
        if self.default_page_size == 0 || self.max_page_size == 0 {
            return Err(KvError::invalid_argument("page sizes must be positive"));
        }
        if self.default_page_size > self.max_page_size {
            return Err(KvError::invalid_argument(format!(
                "default page size {} exceeds maximum {}",
                self.default_page_size, self.max_page_size
            )));
        }
        if self.default_content_type.is_empty() {
            return Err(KvError::invalid_argument("default content type is empty"));
        }
        Ok(())
    }

    /// Resolves a caller-supplied page limit.
    pub(crate) fn page_limit(&self, requested: Option<usize>) -> KvResult<usize> {
        match requested {
            None => Ok(self.default_page_size),
            Some(0) => Err(KvError::invalid_argument("limit must be positive")),
            Some(limit) => Ok(limit.min(self.max_page_size)),
        }
    }

    pub(crate) fn sqlite_options(&self) -> SqliteOptions {
        SqliteOptions {
            create_if_missing: self.create_if_missing,
            busy_timeout: self.busy_timeout,
            reader_pool_size: self.reader_pool_size,
            synchronous: self.synchronous,
        }
    }
}
