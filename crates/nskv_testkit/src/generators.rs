//! Property-based test generators using proptest.
//!
//! Provides strategies for generating random test data
//! that maintains required invariants.

use proptest::prelude::*;

/// Strategy for generating valid namespace names.
pub fn namespace_strategy() -> impl Strategy<Value = String> {
    prop::string::string_regex("[a-z][a-z0-9_]{0,15}").expect("Invalid regex")
}

/// Strategy for generating valid keys.
///
/// Mixes plain ASCII, `prefix:suffix` keys that exercise prefix listing,
/// keys that embed the cursor tag, and arbitrary printable Unicode.
pub fn key_strategy() -> impl Strategy<Value = String> {
    prop_oneof![
        4 => prop::string::string_regex("[a-z0-9]{1,12}").expect("Invalid regex"),
        3 => prop::string::string_regex("u[0-9]{1,2}:[a-z]{1,8}").expect("Invalid regex"),
        1 => prop::string::string_regex("k1:[a-z:]{0,6}").expect("Invalid regex"),
        1 => prop::string::string_regex("\\PC{1,8}").expect("Invalid regex"),
    ]
}

/// Strategy for generating values (arbitrary bytes).
pub fn value_strategy() -> impl Strategy<Value = Vec<u8>> {
    prop::collection::vec(any::<u8>(), 0..1024)
}

/// Strategy for generating small JSON object payloads.
pub fn json_value_strategy() -> impl Strategy<Value = Vec<u8>> {
    prop::collection::btree_map(
        prop::string::string_regex("[a-z]{1,10}").expect("Invalid regex"),
        any::<i32>(),
        1..5,
    )
    .prop_map(|fields| serde_json::to_vec(&fields).unwrap_or_default())
}

/// Strategy for generating TTLs in seconds; `None` means no expiry.
pub fn ttl_strategy() -> impl Strategy<Value = Option<u64>> {
    prop_oneof![
        3 => Just(None),
        1 => (1u64..=3600).prop_map(Some),
    ]
}

/// A single store operation against a fixed namespace.
#[derive(Debug, Clone)]
pub enum KvOperation {
    /// Unconditional write.
    Set {
        /// Key
        key: String,
        /// Value
        value: Vec<u8>,
    },
    /// Delete a key.
    Delete {
        /// Key
        key: String,
    },
    /// Read a key.
    Get {
        /// Key
        key: String,
    },
}

impl KvOperation {
    /// Returns the key the operation touches.
    pub fn key(&self) -> &str {
        match self {
            Self::Set { key, .. } | Self::Delete { key } | Self::Get { key } => key,
        }
    }
}

/// Strategy for generating operations over a small key space, so that
/// writes, deletes and reads collide often.
pub fn kv_operation_strategy() -> impl Strategy<Value = KvOperation> {
    let key = || prop::string::string_regex("[a-d]{1,2}").expect("Invalid regex");
    prop_oneof![
        3 => (key(), value_strategy())
            .prop_map(|(key, value)| KvOperation::Set { key, value }),
        1 => key().prop_map(|key| KvOperation::Delete { key }),
        2 => key().prop_map(|key| KvOperation::Get { key }),
    ]
}

/// Strategy for generating a sequence of operations.
pub fn operation_sequence_strategy(
    min_ops: usize,
    max_ops: usize,
) -> impl Strategy<Value = Vec<KvOperation>> {
    prop::collection::vec(kv_operation_strategy(), min_ops..max_ops)
}

/// Configuration for property tests.
#[derive(Debug, Clone)]
pub struct PropTestConfig {
    /// Number of test cases to run.
    pub cases: u32,
    /// Maximum shrink iterations.
    pub max_shrink_iters: u32,
}

impl Default for PropTestConfig {
    fn default() -> Self {
        Self {
            cases: 256,
            max_shrink_iters: 1000,
        }
    }
}

impl PropTestConfig {
    /// Creates a configuration for quick tests.
    #[must_use]
    pub fn quick() -> Self {
        Self {
            cases: 32,
            max_shrink_iters: 100,
        }
    }

    /// Creates a configuration for thorough tests.
    #[must_use]
    pub fn thorough() -> Self {
        Self {
            cases: 1024,
            max_shrink_iters: 10000,
        }
    }

    /// Converts to proptest config.
    #[must_use]
    pub fn to_proptest_config(&self) -> ProptestConfig {
        ProptestConfig {
            cases: self.cases,
            max_shrink_iters: self.max_shrink_iters,
            ..ProptestConfig::default()
        }
    }
}
