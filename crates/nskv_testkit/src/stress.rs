//! Stress tests for NSKV.
//!
//! These tests verify behavior under heavy load and concurrent access.

use nskv_core::{KvStore, ListOptions, SetOptions};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

/// Result of a stress test run.
#[derive(Debug, Clone)]
pub struct StressTestResult {
    /// Total operations performed.
    pub total_ops: usize,
    /// Successful operations.
    pub successful_ops: usize,
    /// Failed operations.
    pub failed_ops: usize,
    /// Total duration.
    pub duration: Duration,
    /// Operations per second.
    pub ops_per_second: f64,
}

impl StressTestResult {
    /// Creates a new result.
    pub fn new(successful: usize, failed: usize, duration: Duration) -> Self {
        let total = successful + failed;
        let ops_per_second = if duration.as_secs_f64() > 0.0 {
            total as f64 / duration.as_secs_f64()
        } else {
            0.0
        };

        Self {
            total_ops: total,
            successful_ops: successful,
            failed_ops: failed,
            duration,
            ops_per_second,
        }
    }

    /// Prints a summary of the test.
    pub fn print_summary(&self, name: &str) {
        println!("\n=== {} ===", name);
        println!("Total operations: {}", self.total_ops);
        println!("Successful: {}", self.successful_ops);
        println!("Failed: {}", self.failed_ops);
        println!("Duration: {:?}", self.duration);
        println!("Throughput: {:.2} ops/sec", self.ops_per_second);
    }
}

/// Configuration for stress tests.
#[derive(Debug, Clone)]
pub struct StressConfig {
    /// Number of operations to perform.
    pub operations: usize,
    /// Number of concurrent threads (for concurrent tests).
    pub threads: usize,
    /// Size of each value in bytes.
    pub value_size: usize,
    /// Number of distinct keys.
    pub key_count: usize,
}

impl Default for StressConfig {
    fn default() -> Self {
        Self {
            operations: 10_000,
            threads: 4,
            value_size: 256,
            key_count: 1_000,
        }
    }
}

const NAMESPACE: &str = "stress";

fn key(i: usize) -> String {
    format!("key-{i:06}")
}

fn populate(store: &KvStore, config: &StressConfig) {
    let value = vec![0xABu8; config.value_size];
    for i in 0..config.key_count {
        store
            .set(NAMESPACE, &key(i), &value)
            .expect("Failed to seed");
    }
}

/// Run a sequential write stress test.
pub fn stress_sequential_writes(store: &KvStore, config: &StressConfig) -> StressTestResult {
    let value = vec![0xABu8; config.value_size];

    let start = Instant::now();
    let mut successful = 0usize;
    let mut failed = 0usize;

    for i in 0..config.operations {
        match store.set(NAMESPACE, &key(i % config.key_count), &value) {
            Ok(_) => successful += 1,
            Err(_) => failed += 1,
        }
    }

    StressTestResult::new(successful, failed, start.elapsed())
}

/// Run a sequential read stress test.
pub fn stress_sequential_reads(store: &KvStore, config: &StressConfig) -> StressTestResult {
    populate(store, config);

    let start = Instant::now();
    let mut successful = 0usize;
    let mut failed = 0usize;

    for i in 0..config.operations {
        match store.get(NAMESPACE, &key(i % config.key_count)) {
            Ok(_) => successful += 1, // Not found is still a successful read
            Err(_) => failed += 1,
        }
    }

    StressTestResult::new(successful, failed, start.elapsed())
}

/// Run a mixed read/write/delete/list stress test.
pub fn stress_mixed_operations(store: &KvStore, config: &StressConfig) -> StressTestResult {
    let value = vec![0xABu8; config.value_size];
    let page = ListOptions::new().limit(50);

    let start = Instant::now();
    let mut successful = 0usize;
    let mut failed = 0usize;

    for i in 0..config.operations {
        let key = key(i % config.key_count);

        let result = match i % 4 {
            0 => store.set(NAMESPACE, &key, &value).map(|_| ()),
            1 => store.get(NAMESPACE, &key).map(|_| ()),
            2 => store.delete(NAMESPACE, &key).map(|_| ()),
            _ => store.list(NAMESPACE, &page).map(|_| ()),
        };

        match result {
            Ok(()) => successful += 1,
            Err(_) => failed += 1,
        }
    }

    StressTestResult::new(successful, failed, start.elapsed())
}

/// Run a concurrent read stress test.
pub fn stress_concurrent_reads(store: Arc<KvStore>, config: &StressConfig) -> StressTestResult {
    populate(&store, config);

    let successful = Arc::new(AtomicUsize::new(0));
    let failed = Arc::new(AtomicUsize::new(0));
    let ops_per_thread = config.operations / config.threads;

    let start = Instant::now();

    let handles: Vec<_> = (0..config.threads)
        .map(|t| {
            let store = Arc::clone(&store);
            let successful = Arc::clone(&successful);
            let failed = Arc::clone(&failed);
            let key_count = config.key_count;

            thread::spawn(move || {
                for i in 0..ops_per_thread {
                    let idx = (t * ops_per_thread + i) % key_count;
                    match store.get(NAMESPACE, &key(idx)) {
                        Ok(_) => {
                            successful.fetch_add(1, Ordering::Relaxed);
                        }
                        Err(_) => {
                            failed.fetch_add(1, Ordering::Relaxed);
                        }
                    }
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().expect("Thread panicked");
    }

    StressTestResult::new(
        successful.load(Ordering::Relaxed),
        failed.load(Ordering::Relaxed),
        start.elapsed(),
    )
}

/// Result of a concurrent CAS counter run.
#[derive(Debug, Clone)]
pub struct CasCounterResult {
    /// Increments that committed.
    pub committed: usize,
    /// CAS attempts that lost and were retried.
    pub conflicts: usize,
    /// Counter value read back at the end.
    pub final_value: u64,
}

/// Increments a shared counter from `config.threads` threads using CAS
/// read-modify-write loops, `config.operations / config.threads` times each.
///
/// With correct CAS semantics `final_value == committed` and no increment
/// is lost.
pub fn stress_cas_counter(store: Arc<KvStore>, config: &StressConfig) -> CasCounterResult {
    store
        .set(NAMESPACE, "counter", b"0")
        .expect("Failed to seed counter");

    let committed = Arc::new(AtomicUsize::new(0));
    let conflicts = Arc::new(AtomicUsize::new(0));
    let per_thread = config.operations / config.threads;

    let handles: Vec<_> = (0..config.threads)
        .map(|_| {
            let store = Arc::clone(&store);
            let committed = Arc::clone(&committed);
            let conflicts = Arc::clone(&conflicts);

            thread::spawn(move || {
                let mut done = 0;
                while done < per_thread {
                    let entry = store
                        .get(NAMESPACE, "counter")
                        .expect("Failed to read counter")
                        .expect("Counter missing");
                    let current = parse_counter(&entry.value);
                    let next = (current + 1).to_string();
                    let options = SetOptions::new().cas(entry.version);

                    match store.set_with(NAMESPACE, "counter", next.as_bytes(), &options) {
                        Ok(_) => {
                            done += 1;
                            committed.fetch_add(1, Ordering::Relaxed);
                        }
                        Err(err) if err.is_cas_conflict() => {
                            conflicts.fetch_add(1, Ordering::Relaxed);
                        }
                        Err(err) => panic!("unexpected error: {err}"),
                    }
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().expect("Thread panicked");
    }

    let entry = store
        .get(NAMESPACE, "counter")
        .expect("Failed to read counter")
        .expect("Counter missing");

    CasCounterResult {
        committed: committed.load(Ordering::Relaxed),
        conflicts: conflicts.load(Ordering::Relaxed),
        final_value: parse_counter(&entry.value),
    }
}

fn parse_counter(bytes: &[u8]) -> u64 {
    std::str::from_utf8(bytes)
        .ok()
        .and_then(|s| s.parse().ok())
        .expect("Counter is not a decimal number")
}
