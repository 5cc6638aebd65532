//! Entries and per-operation options.

use crate::error::{KvError, KvResult};
use crate::types::{Timestamp, Version};
use nskv_storage::StoredEntry;
use std::time::Duration;

/// Content type for structured (JSON) payloads, and the default tag.
pub const JSON_CONTENT_TYPE: &str = "application/json";

/// A live entry as returned by [`crate::KvStore::get`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    /// Logical partition the entry lives in.
    pub namespace: String,
    /// Key within the namespace.
    pub key: String,
    /// Opaque payload; `content_type` says how to read it.
    pub value: Vec<u8>,
    /// Encoding tag, always read together with `value`.
    pub content_type: String,
    /// Current version.
    pub version: Version,
    /// Absolute expiry, `None` if the entry never expires.
    pub expires_at: Option<Timestamp>,
    /// Instant of the most recent write.
    pub updated_at: Timestamp,
}

impl Entry {
    pub(crate) fn from_stored(namespace: &str, key: &str, stored: StoredEntry) -> Self {
        Self {
            namespace: namespace.to_owned(),
            key: key.to_owned(),
            value: stored.value,
            content_type: stored.content_type,
            version: Version::new(stored.version),
            expires_at: stored.expires_at.map(Timestamp::from_millis),
            updated_at: Timestamp::from_millis(stored.updated_at),
        }
    }

    /// Returns true if the payload is tagged as JSON.
    #[must_use]
    pub fn is_json(&self) -> bool {
        self.content_type == JSON_CONTENT_TYPE
    }

    /// Time left before the entry expires, measured from `now`.
    #[must_use]
    pub fn ttl_remaining(&self, now: Timestamp) -> Option<Duration> {
        self.expires_at
            .map(|at| Duration::from_millis(at.as_millis().saturating_sub(now.as_millis())))
    }
}

/// Options for [`crate::KvStore::get_with`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GetOptions {
    /// When set, an entry with another content type is reported as absent.
    pub content_type: Option<String>,
}

impl GetOptions {
    /// Creates options with no filter.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Only return the entry if it carries this content type.
    #[must_use]
    pub fn content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }
}

/// Options for [`crate::KvStore::set_with`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SetOptions {
    /// Expire the entry this long after the write. Zero means never.
    pub ttl: Option<Duration>,
    /// Content type to store; the store's default when `None`.
    pub content_type: Option<String>,
    /// Version the caller expects to replace.
    pub cas: Option<Version>,
}

impl SetOptions {
    /// Creates options for an unconditional write that never expires.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the time-to-live.
    #[must_use]
    pub fn ttl(mut self, ttl: Duration) -> Self {
        self.ttl = Some(ttl);
        self
    }

    /// Sets the time-to-live in whole seconds.
    #[must_use]
    pub fn ttl_seconds(self, seconds: u64) -> Self {
        self.ttl(Duration::from_secs(seconds))
    }

    /// Sets the content type.
    #[must_use]
    pub fn content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    /// Makes the write conditional on the current version.
    #[must_use]
    pub fn cas(mut self, expected: impl Into<Version>) -> Self {
        self.cas = Some(expected.into());
        self
    }

    /// Computes the absolute expiry for a write at `now`.
    ///
    /// Expiry has millisecond granularity; a non-zero TTL is rounded up to
    /// the next whole millisecond.
    pub(crate) fn expires_at(&self, now: Timestamp) -> Option<Timestamp> {
        self.ttl.filter(|ttl| !ttl.is_zero()).map(|ttl| {
            let millis = u64::try_from(ttl.as_nanos().div_ceil(1_000_000)).unwrap_or(u64::MAX);
            now.saturating_add(Duration::from_millis(millis))
        })
    }
}

/// Options for [`crate::KvStore::list`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListOptions {
    /// Maximum keys per page; the store default when `None`.
    pub limit: Option<usize>,
    /// Continue after the key encoded in this cursor.
    pub cursor: Option<String>,
    /// Only list keys starting with this prefix.
    pub prefix: Option<String>,
}

impl ListOptions {
    /// Creates options for the first page of a full listing.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the page size.
    #[must_use]
    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Continues from a previous page.
    #[must_use]
    pub fn cursor(mut self, cursor: impl Into<String>) -> Self {
        self.cursor = Some(cursor.into());
        self
    }

    /// Restricts the listing to keys with this prefix.
    #[must_use]
    pub fn prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = Some(prefix.into());
        self
    }
}

/// One page of keys from [`crate::KvStore::list`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListPage {
    /// Live keys in ascending order.
    pub keys: Vec<String>,
    /// Present iff more matching keys follow this page.
    pub next_cursor: Option<String>,
}

impl ListPage {
    /// Returns true if this is the last page.
    #[must_use]
    pub fn is_last(&self) -> bool {
        self.next_cursor.is_none()
    }
}

pub(crate) fn validate_namespace(namespace: &str) -> KvResult<()> {
    if namespace.is_empty() {
        return Err(KvError::invalid_argument("namespace must not be empty"));
    }
    Ok(())
}

pub(crate) fn validate_key(namespace: &str, key: &str) -> KvResult<()> {
    validate_namespace(namespace)?;
    if key.is_empty() {
        return Err(KvError::invalid_argument("key must not be empty"));
    }
    Ok(())
}
