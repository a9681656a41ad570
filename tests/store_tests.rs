//! Recommendation store paging, persistence and concurrent writers.
//!
//! Run with: cargo test --test store_tests

use std::sync::Arc;
use std::thread;

use game_scout::{MemoryRecommendationStore, RecommendationStore, SqliteRecommendationStore};
use tempfile::TempDir;

fn sqlite_store(dir: &TempDir) -> SqliteRecommendationStore {
    SqliteRecommendationStore::open(dir.path().join("scout.db")).expect("Failed to open store")
}

fn check_paging(store: &dyn RecommendationStore) {
    let ids: Vec<u64> = (1..=25).collect();
    store.put("user", &ids).unwrap();

    for (limit, offset) in [(10, 0), (10, 10), (10, 20), (5, 24), (0, 3), (10, 25), (10, 1000)] {
        let start = offset.min(ids.len());
        let end = (offset + limit).min(ids.len());
        assert_eq!(
            store.get("user", limit, offset).unwrap(),
            ids[start..end].to_vec(),
            "limit={} offset={}",
            limit,
            offset
        );
    }
    assert!(store.get("unknown", 10, 0).unwrap().is_empty());
}

#[test]
fn test_memory_store_paging() {
    check_paging(&MemoryRecommendationStore::new());
}

#[test]
fn test_sqlite_store_paging() {
    let dir = TempDir::new().expect("Failed to create temp dir");
    check_paging(&sqlite_store(&dir));
}

#[test]
fn test_sqlite_store_survives_reopen() {
    let dir = TempDir::new().expect("Failed to create temp dir");
    {
        let store = sqlite_store(&dir);
        store.put("user", &[3, 1, 2]).unwrap();
        store.put("user", &[7, 8]).unwrap();
    }

    let reopened = sqlite_store(&dir);
    assert_eq!(reopened.get("user", 10, 0).unwrap(), vec![7, 8]);
}

#[test]
fn test_sqlite_store_empty_list() {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let store = sqlite_store(&dir);
    store.put("user", &[]).unwrap();

    assert!(store.get("user", 10, 0).unwrap().is_empty());
}

fn concurrent_users(store: Arc<dyn RecommendationStore>) {
    let handles: Vec<_> = (0..8u64)
        .map(|user| {
            let store = Arc::clone(&store);
            thread::spawn(move || {
                for round in 0..20u64 {
                    let ids: Vec<u64> = (0..10).map(|i| user * 1000 + round * 10 + i).collect();
                    store.put(&format!("user-{}", user), &ids).unwrap();
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().expect("writer panicked");
    }

    for user in 0..8u64 {
        let expected: Vec<u64> = (0..10).map(|i| user * 1000 + 190 + i).collect();
        assert_eq!(store.get(&format!("user-{}", user), 100, 0).unwrap(), expected);
    }
}

#[test]
fn test_memory_store_concurrent_users() {
    concurrent_users(Arc::new(MemoryRecommendationStore::new()));
}

#[test]
fn test_sqlite_store_concurrent_users() {
    let dir = TempDir::new().expect("Failed to create temp dir");
    concurrent_users(Arc::new(sqlite_store(&dir)));
}

#[test]
fn test_reader_sees_whole_list() {
    let store: Arc<dyn RecommendationStore> = Arc::new(MemoryRecommendationStore::new());
    let short: Vec<u64> = vec![1; 5];
    let long: Vec<u64> = vec![2; 50];
    store.put("user", &short).unwrap();

    let writer = {
        let store = Arc::clone(&store);
        let (short, long) = (short.clone(), long.clone());
        thread::spawn(move || {
            for i in 0..200 {
                let ids = if i % 2 == 0 { &long } else { &short };
                store.put("user", ids).unwrap();
            }
        })
    };

    for _ in 0..200 {
        let seen = store.get("user", 100, 0).unwrap();
        assert!(seen == short || seen == long, "partial list observed");
    }
    writer.join().expect("writer panicked");
}
