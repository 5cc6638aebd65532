//! Pagination cursor codec.
//!
//! A cursor marks the last live key of a page. On the wire it is a tag
//! plus the raw key, encoded as unpadded URL-safe base64, so any key
//! (including ones containing the tag delimiter) round-trips exactly.

use crate::error::{KvError, KvResult};
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;

/// Tag prepended to the boundary key before encoding.
const TAG: &str = "k1:";

/// A decoded pagination boundary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cursor {
    after: String,
}

impl Cursor {
    /// Creates a cursor that resumes after `key`.
    #[must_use]
    pub fn after(key: impl Into<String>) -> Self {
        Self { after: key.into() }
    }

    /// Returns the key the next page starts after.
    #[must_use]
    pub fn key(&self) -> &str {
        &self.after
    }

    /// Encodes the cursor as a printable, URL-safe token.
    #[must_use]
    pub fn encode(&self) -> String {
        let mut raw = String::with_capacity(TAG.len() + self.after.len());
        raw.push_str(TAG);
        raw.push_str(&self.after);
        URL_SAFE_NO_PAD.encode(raw)
    }

    /// Decodes a token produced by [`Cursor::encode`].
    ///
    /// # Errors
    ///
    /// Returns [`KvError::InvalidCursor`] if the token is not valid base64,
    /// not UTF-8, carries an unknown tag, or names an empty key.
    pub fn decode(token: &str) -> KvResult<Self> {
        let bytes = URL_SAFE_NO_PAD
            .decode(token)
            .map_err(|err| KvError::invalid_cursor(format!("not base64: {err}")))?;
        let raw = String::from_utf8(bytes)
            .map_err(|_| KvError::invalid_cursor("boundary key is not UTF-8"))?;
        let key = raw
            .strip_prefix(TAG)
            .ok_or_else(|| KvError::invalid_cursor("unrecognized cursor tag"))?;
        if key.is_empty() {
            return Err(KvError::invalid_cursor("empty boundary key"));
        }
        Ok(Self::after(key))
    }
}
