//! Reference-model harness.
//!
//! Mirrors every write into an in-memory model and checks that the store
//! agrees with it, including versions and listing order.

use crate::generators::KvOperation;
use nskv_core::{KvStore, ListOptions, Version};
use std::collections::BTreeMap;

/// A test harness that tracks expected contents of one namespace.
pub struct ModelHarness<'a> {
    store: &'a KvStore,
    namespace: String,
    model: BTreeMap<String, (Vec<u8>, Version)>,
}

impl<'a> ModelHarness<'a> {
    /// Creates a harness over `namespace` of an empty store.
    pub fn new(store: &'a KvStore, namespace: impl Into<String>) -> Self {
        Self {
            store,
            namespace: namespace.into(),
            model: BTreeMap::new(),
        }
    }

    /// Writes a value and checks the returned version against the model.
    pub fn set(&mut self, key: &str, value: Vec<u8>) {
        let expected = self
            .model
            .get(key)
            .map_or(Version::INITIAL, |(_, version)| version.next());
        let version = self
            .store
            .set(&self.namespace, key, &value)
            .expect("Failed to set entry");
        assert_eq!(version, expected, "Version mismatch for {key:?}");
        self.model.insert(key.to_owned(), (value, version));
    }

    /// Deletes a key and checks the reported outcome against the model.
    pub fn delete(&mut self, key: &str) {
        let removed = self
            .store
            .delete(&self.namespace, key)
            .expect("Failed to delete entry");
        assert_eq!(
            removed,
            self.model.remove(key).is_some(),
            "Delete outcome mismatch for {key:?}"
        );
    }

    /// Reads a key and checks it matches the model.
    pub fn get_and_verify(&self, key: &str) {
        let actual = self
            .store
            .get(&self.namespace, key)
            .expect("Failed to get entry")
            .map(|entry| (entry.value, entry.version));
        assert_eq!(actual.as_ref(), self.model.get(key), "Entry mismatch for {key:?}");
    }

    /// Applies one generated operation.
    pub fn apply(&mut self, op: &KvOperation) {
        match op {
            KvOperation::Set { key, value } => self.set(key, value.clone()),
            KvOperation::Delete { key } => self.delete(key),
            KvOperation::Get { key } => self.get_and_verify(key),
        }
    }

    /// Verifies every tracked entry and the full listing, page by page.
    pub fn verify_all(&self, page_size: usize) {
        for key in self.model.keys() {
            self.get_and_verify(key);
        }

        let mut listed = Vec::new();
        let mut options = ListOptions::new().limit(page_size);
        loop {
            let page = self
                .store
                .list(&self.namespace, &options)
                .expect("Failed to list");
            listed.extend(page.keys);
            match page.next_cursor {
                Some(cursor) => options = options.cursor(cursor),
                None => break,
            }
        }
        let expected: Vec<&String> = self.model.keys().collect();
        let listed: Vec<&String> = listed.iter().collect();
        assert_eq!(listed, expected, "Listing mismatch");
    }

    /// Returns the count of tracked entries.
    pub fn tracked_count(&self) -> usize {
        self.model.len()
    }
}
