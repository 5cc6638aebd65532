//! Benchmark utilities for NSKV.

#![deny(unsafe_code)]
#![warn(missing_docs)]

use rand::Rng;

/// Generate random value bytes of the specified size.
pub fn random_data(size: usize) -> Vec<u8> {
    let mut rng = rand::thread_rng();
    (0..size).map(|_| rng.gen()).collect()
}

/// Generate `count` sorted keys of the form `key-000042`.
pub fn sequential_keys(count: usize) -> Vec<String> {
    (0..count).map(|i| format!("key-{i:06}")).collect()
}

/// Generate `count` keys spread over `prefixes` groups (`g03:key-000042`).
pub fn grouped_keys(count: usize, prefixes: usize) -> Vec<String> {
    let prefixes = prefixes.max(1);
    (0..count)
        .map(|i| format!("g{:02}:key-{i:06}", i % prefixes))
        .collect()
}

/// Pick a random key from `keys`.
pub fn random_key(keys: &[String]) -> &str {
    let idx = rand::thread_rng().gen_range(0..keys.len());
    &keys[idx]
}
