//! Row, request, and outcome types exchanged with a backend.

/// A stored row as returned by a backend read.
///
/// Timestamps are milliseconds since the Unix epoch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredEntry {
    /// Opaque payload.
    pub value: Vec<u8>,
    /// Encoding tag written together with `value`.
    pub content_type: String,
    /// Current version (starts at 1).
    pub version: u64,
    /// Absolute expiry, `None` for entries that never expire.
    pub expires_at: Option<u64>,
    /// Instant of the last successful write.
    pub updated_at: u64,
}

impl StoredEntry {
    /// Returns true if the row is still live at `now`.
    ///
    /// A row whose expiry equals `now` is already expired.
    #[must_use]
    pub fn is_live(&self, now: u64) -> bool {
        is_live(self.expires_at, now)
    }
}

/// Shared liveness rule used by every backend.
#[must_use]
pub fn is_live(expires_at: Option<u64>, now: u64) -> bool {
    expires_at.map_or(true, |at| at > now)
}

/// A write submitted to [`crate::KvBackend::put`].
#[derive(Debug, Clone, Copy)]
pub struct PutRequest<'a> {
    /// Namespace of the entry.
    pub namespace: &'a str,
    /// Key within the namespace.
    pub key: &'a str,
    /// Payload to store.
    pub value: &'a [u8],
    /// Encoding tag stored with the payload.
    pub content_type: &'a str,
    /// Absolute expiry in epoch millis, `None` to never expire.
    pub expires_at: Option<u64>,
    /// Version the caller expects to replace. `None` for an unconditional upsert.
    pub expected_version: Option<u64>,
}

/// Result of a conditional or unconditional write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PutOutcome {
    /// The write committed with this new version.
    Written(u64),
    /// An expected version was supplied but no live row exists.
    Absent,
    /// An expected version was supplied but the live row has another version.
    VersionMismatch {
        /// The version currently stored.
        current: u64,
    },
    /// The guarded update matched no row even though the version check passed.
    Raced,
}

/// Parameters for one page of an ordered key scan.
#[derive(Debug, Clone, Copy)]
pub struct ScanRequest<'a> {
    /// Only keys starting with this prefix are returned.
    pub prefix: &'a str,
    /// Only keys strictly greater than this one are returned.
    pub after: Option<&'a str>,
    /// Maximum number of keys to return.
    pub limit: usize,
}

/// Smallest string that is greater than every string starting with `prefix`.
///
/// Returns `None` when no such bound exists (empty prefix, or a prefix made
/// only of `char::MAX`), in which case the scan is unbounded above.
#[must_use]
pub fn prefix_upper_bound(prefix: &str) -> Option<String> {
    let mut chars: Vec<char> = prefix.chars().collect();
    while let Some(last) = chars.pop() {
        if let Some(next) = next_char(last) {
            chars.push(next);
            return Some(chars.into_iter().collect());
        }
    }
    None
}

fn next_char(c: char) -> Option<char> {
    let mut code = u32::from(c) + 1;
    // Skip the surrogate range, which has no `char` values.
    if (0xD800..=0xDFFF).contains(&code) {
        code = 0xE000;
    }
    char::from_u32(code)
}
