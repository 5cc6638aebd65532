//! Storage backend benchmarks.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use nskv_bench::{random_data, sequential_keys};
use nskv_storage::{
    InMemoryBackend, KvBackend, PutRequest, ScanRequest, SqliteBackend, SqliteOptions,
    Synchronous,
};
use tempfile::TempDir;

fn put(backend: &dyn KvBackend, key: &str, value: &[u8], expires_at: Option<u64>, now: u64) {
    let request = PutRequest {
        namespace: "bench",
        key,
        value,
        content_type: "application/octet-stream",
        expires_at,
        expected_version: None,
    };
    backend.put(&request, now).unwrap();
}

/// Benchmark upserts under each sync level.
fn bench_sqlite_put(c: &mut Criterion) {
    let mut group = c.benchmark_group("sqlite_put");
    group.sample_size(50);

    for (name, synchronous) in [("normal", Synchronous::Normal), ("full", Synchronous::Full)] {
        group.bench_function(name, |b| {
            let dir = TempDir::new().unwrap();
            let options = SqliteOptions {
                synchronous,
                ..SqliteOptions::default()
            };
            let backend = SqliteBackend::open(&dir.path().join("bench.db"), options).unwrap();
            let data = random_data(256);
            let mut i = 0u64;

            b.iter(|| {
                i += 1;
                put(&backend, &format!("key-{}", i % 1_000), black_box(&data), None, i);
            });
        });
    }
    group.finish();
}

/// Benchmark ordered scans on both backends.
fn bench_scan(c: &mut Criterion) {
    let mut group = c.benchmark_group("scan");
    let keys = sequential_keys(10_000);

    let memory = InMemoryBackend::new();
    let dir = TempDir::new().unwrap();
    let sqlite = SqliteBackend::open(&dir.path().join("scan.db"), SqliteOptions::default()).unwrap();
    for key in &keys {
        put(&memory, key, b"1", None, 1);
        put(&sqlite, key, b"1", None, 1);
    }

    for limit in [10usize, 100, 1_000] {
        let request = ScanRequest {
            prefix: "key-00",
            after: Some("key-000500"),
            limit,
        };
        group.bench_with_input(BenchmarkId::new("memory", limit), &request, |b, request| {
            b.iter(|| black_box(memory.scan("bench", request, 2).unwrap()));
        });
        group.bench_with_input(BenchmarkId::new("sqlite", limit), &request, |b, request| {
            b.iter(|| black_box(sqlite.scan("bench", request, 2).unwrap()));
        });
    }
    group.finish();
}

/// Benchmark purging a batch of expired rows.
fn bench_purge_expired(c: &mut Criterion) {
    let mut group = c.benchmark_group("purge_expired");
    group.sample_size(20);

    group.bench_function("sqlite_1000", |b| {
        let dir = TempDir::new().unwrap();
        let backend =
            SqliteBackend::open(&dir.path().join("purge.db"), SqliteOptions::default()).unwrap();
        let keys = sequential_keys(1_000);

        b.iter(|| {
            for key in &keys {
                put(&backend, key, b"1", Some(10), 1);
            }
            black_box(backend.purge_expired(10).unwrap());
        });
    });
    group.finish();
}

criterion_group!(benches, bench_sqlite_put, bench_scan, bench_purge_expired);
criterion_main!(benches);
