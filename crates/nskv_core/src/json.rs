//! Typed JSON helpers on top of the byte-level store.
//!
//! The store itself never looks inside values. These helpers pin the
//! content type to `application/json` and run the payload through
//! `serde_json`.

use crate::entry::{GetOptions, SetOptions, JSON_CONTENT_TYPE};
use crate::error::KvResult;
use crate::store::KvStore;
use crate::types::{Timestamp, Version};
use serde::de::DeserializeOwned;
use serde::Serialize;

/// A decoded JSON entry.
#[derive(Debug, Clone, PartialEq)]
pub struct JsonEntry<T> {
    /// Decoded payload.
    pub value: T,
    /// Version to pass to [`SetOptions::cas`] for a conditional update.
    pub version: Version,
    /// Absolute expiry, if any.
    pub expires_at: Option<Timestamp>,
}

impl KvStore {
    /// Reads and decodes a JSON entry.
    ///
    /// Entries stored under another content type are reported as absent.
    ///
    /// # Errors
    ///
    /// Returns `Serialization` if the payload is not valid JSON for `T`, or
    /// any error [`KvStore::get`] can return.
    pub fn get_json<T: DeserializeOwned>(
        &self,
        namespace: &str,
        key: &str,
    ) -> KvResult<Option<JsonEntry<T>>> {
        let options = GetOptions::new().content_type(JSON_CONTENT_TYPE);
        let Some(entry) = self.get_with(namespace, key, &options)? else {
            return Ok(None);
        };
        Ok(Some(JsonEntry {
            value: serde_json::from_slice(&entry.value)?,
            version: entry.version,
            expires_at: entry.expires_at,
        }))
    }

    /// Encodes `value` as JSON and writes it.
    ///
    /// Any content type in `options` is replaced with `application/json`.
    ///
    /// # Errors
    ///
    /// Returns `Serialization` if `value` cannot be encoded, or any error
    /// [`KvStore::set_with`] can return.
    pub fn set_json<T: Serialize + ?Sized>(
        &self,
        namespace: &str,
        key: &str,
        value: &T,
        options: SetOptions,
    ) -> KvResult<Version> {
        let bytes = serde_json::to_vec(value)?;
        let options = options.content_type(JSON_CONTENT_TYPE);
        self.set_with(namespace, key, &bytes, &options)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use serde::Deserialize;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Build {
        id: u32,
        status: String,
    }

    #[test]
    fn json_roundtrip_with_cas() {
        let store = KvStore::open_in_memory().unwrap();
        let build = Build {
            id: 7,
            status: "running".into(),
        };
        let v1 = store
            .set_json("builds", "u1:active", &build, SetOptions::new())
            .unwrap();

        let mut read: JsonEntry<Build> = store.get_json("builds", "u1:active").unwrap().unwrap();
        assert_eq!(read.value, build);
        assert_eq!(read.version, v1);

        read.value.status = "done".into();
        let v2 = store
            .set_json("builds", "u1:active", &read.value, SetOptions::new().cas(read.version))
            .unwrap();
        assert_eq!(v2, v1.next());
    }

    #[test]
    fn non_json_entries_are_ignored() {
        let store = KvStore::open_in_memory().unwrap();
        store
            .set_with(
                "ns",
                "k",
                b"plain",
                &SetOptions::new().content_type("text/plain"),
            )
            .unwrap();
        let read: Option<JsonEntry<String>> = store.get_json("ns", "k").unwrap();
        assert!(read.is_none());
    }

    #[test]
    fn content_type_is_pinned() {
        let store = KvStore::open_in_memory().unwrap();
        store
            .set_json("ns", "k", &[1, 2, 3], SetOptions::new().content_type("text/csv"))
            .unwrap();
        let entry = store.get("ns", "k").unwrap().unwrap();
        assert!(entry.is_json());
        assert_eq!(entry.value, b"[1,2,3]");
    }

    #[test]
    fn malformed_payload_is_serialization_error() {
        let store = KvStore::open_in_memory().unwrap();
        store.set("ns", "k", b"{not json").unwrap();
        let err = store.get_json::<Build>("ns", "k").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Serialization);
    }
}
