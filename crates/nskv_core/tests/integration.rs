//! End-to-end scenarios against both backends.

use nskv_core::{
    Config, ErrorKind, InMemoryBackend, KvStore, ListOptions, ManualClock, SetOptions, SqliteBackend,
    SqliteOptions, Timestamp, Version,
};
use std::collections::HashSet;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

fn memory_store(clock: &ManualClock) -> KvStore {
    KvStore::with_clock(
        Box::new(InMemoryBackend::new()),
        Config::default(),
        Arc::new(clock.clone()),
    )
    .unwrap()
}

fn collect_all(store: &KvStore, namespace: &str, options: ListOptions) -> Vec<String> {
    let mut keys = Vec::new();
    let mut options = options;
    loop {
        let page = store.list(namespace, &options).unwrap();
        keys.extend(page.keys);
        match page.next_cursor {
            Some(cursor) => options = options.cursor(cursor),
            None => return keys,
        }
    }
}

#[test]
fn create_update_retrieve_build() {
    let dir = tempfile::tempdir().unwrap();
    let store = KvStore::open(dir.path().join("builds.db")).unwrap();

    let v1 = store
        .set("builds", "u1:active", br#"{"id":1,"status":"queued"}"#)
        .unwrap();
    assert_eq!(v1, Version::INITIAL);

    let v2 = store
        .set_with(
            "builds",
            "u1:active",
            br#"{"id":1,"status":"running"}"#,
            &SetOptions::new().cas(v1),
        )
        .unwrap();
    assert_eq!(v2.as_u64(), 2);

    let entry = store.get("builds", "u1:active").unwrap().unwrap();
    assert_eq!(entry.value, br#"{"id":1,"status":"running"}"#);
    assert_eq!(entry.version, v2);
    assert!(entry.is_json());
}

#[test]
fn ttl_roundtrip_on_sqlite() {
    let dir = tempfile::tempdir().unwrap();
    let clock = ManualClock::new(Timestamp::from_millis(10_000));
    let backend = SqliteBackend::open(&dir.path().join("ttl.db"), SqliteOptions::default()).unwrap();
    let store = KvStore::with_clock(Box::new(backend), Config::default(), Arc::new(clock.clone()))
        .unwrap();

    store
        .set_with("sessions", "s1", b"token", &SetOptions::new().ttl_seconds(1))
        .unwrap();
    store.set("sessions", "s2", b"token").unwrap();

    let entry = store.get("sessions", "s1").unwrap().unwrap();
    assert_eq!(entry.expires_at, Some(Timestamp::from_millis(11_000)));
    assert_eq!(collect_all(&store, "sessions", ListOptions::new()), ["s1", "s2"]);

    clock.advance(Duration::from_secs(1));
    assert!(store.get("sessions", "s1").unwrap().is_none());
    assert_eq!(collect_all(&store, "sessions", ListOptions::new()), ["s2"]);

    assert_eq!(store.cleanup_all_expired().unwrap(), 1);
    assert_eq!(store.namespaces().unwrap(), vec![("sessions".to_owned(), 1)]);
}

#[test]
fn expired_keys_do_not_leak_into_cursors() {
    let clock = ManualClock::new(Timestamp::from_millis(1));
    let store = memory_store(&clock);
    for key in ["a", "b", "c", "d"] {
        let options = if key == "c" || key == "d" {
            SetOptions::new().ttl(Duration::from_millis(10))
        } else {
            SetOptions::new()
        };
        store.set_with("ns", key, b"1", &options).unwrap();
    }
    clock.advance(Duration::from_millis(10));

    let page = store.list("ns", &ListOptions::new().limit(2)).unwrap();
    assert_eq!(page.keys, ["a", "b"]);
    assert!(page.next_cursor.is_none());
}

#[test]
fn keys_with_delimiters_paginate() {
    let clock = ManualClock::new(Timestamp::from_millis(1));
    let store = memory_store(&clock);
    let keys = ["k1:", "k1:a", "k1:k1:", "u1:active", "u1:active:x", "\u{e9}t\u{e9}"];
    for key in keys {
        store.set("ns", key, b"1").unwrap();
    }

    let mut expected: Vec<String> = keys.iter().map(|k| (*k).to_owned()).collect();
    expected.sort();
    assert_eq!(
        collect_all(&store, "ns", ListOptions::new().limit(1)),
        expected
    );
    assert_eq!(
        collect_all(&store, "ns", ListOptions::new().prefix("k1:").limit(1)),
        ["k1:", "k1:a", "k1:k1:"]
    );
}

#[test]
fn concurrent_cas_increments_lose_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let store = Arc::new(KvStore::open(dir.path().join("counter.db")).unwrap());
    store.set("counters", "hits", b"0").unwrap();

    let threads = 4;
    let per_thread = 25;
    let handles: Vec<_> = (0..threads)
        .map(|_| {
            let store = Arc::clone(&store);
            thread::spawn(move || {
                let mut done = 0;
                while done < per_thread {
                    let entry = store.get("counters", "hits").unwrap().unwrap();
                    let n: u64 = std::str::from_utf8(&entry.value).unwrap().parse().unwrap();
                    let next = (n + 1).to_string();
                    match store.set_with(
                        "counters",
                        "hits",
                        next.as_bytes(),
                        &SetOptions::new().cas(entry.version),
                    ) {
                        Ok(_) => done += 1,
                        Err(err) if err.is_cas_conflict() => continue,
                        Err(err) => panic!("unexpected error: {err}"),
                    }
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }

    let entry = store.get("counters", "hits").unwrap().unwrap();
    let total = threads * per_thread;
    assert_eq!(entry.value, total.to_string().as_bytes());
    assert_eq!(entry.version.as_u64(), total as u64 + 1);
}

#[test]
fn concurrent_readers_and_writers() {
    let dir = tempfile::tempdir().unwrap();
    let store = Arc::new(
        KvStore::open_with_config(
            dir.path().join("mixed.db"),
            Config::new().reader_pool_size(2),
        )
        .unwrap(),
    );

    let writers: Vec<_> = (0..3)
        .map(|w| {
            let store = Arc::clone(&store);
            thread::spawn(move || {
                for i in 0..50 {
                    store.set("mixed", &format!("w{w}:{i:03}"), b"x").unwrap();
                }
            })
        })
        .collect();
    let readers: Vec<_> = (0..4)
        .map(|_| {
            let store = Arc::clone(&store);
            thread::spawn(move || {
                for _ in 0..50 {
                    let page = store.list("mixed", &ListOptions::new().limit(10)).unwrap();
                    assert!(page.keys.windows(2).all(|w| w[0] < w[1]));
                }
            })
        })
        .collect();

    for handle in writers.into_iter().chain(readers) {
        handle.join().unwrap();
    }

    let keys: HashSet<String> = collect_all(&store, "mixed", ListOptions::new())
        .into_iter()
        .collect();
    assert_eq!(keys.len(), 150);
}

#[test]
fn closed_sqlite_store_rejects_operations() {
    let dir = tempfile::tempdir().unwrap();
    let store = KvStore::open(dir.path().join("closed.db")).unwrap();
    assert!(store.healthcheck());
    store.close().unwrap();

    assert!(!store.healthcheck());
    assert_eq!(store.get("ns", "k").unwrap_err().kind(), ErrorKind::Closed);
    assert_eq!(store.delete("ns", "k").unwrap_err().kind(), ErrorKind::Closed);
    assert_eq!(store.namespaces().unwrap_err().kind(), ErrorKind::Closed);
}
