//! Tests for Store
//!
//! These tests verify:
//! - Basic set/get/delete operations
//! - Command ordering from a single caller
//! - Per-key and whole-store TTLs
//! - Concurrent access from many threads
//! - Store lifecycle (shutdown)

use std::collections::HashSet;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use kvcache::{KvError, Store};

// =============================================================================
// Helper Functions
// =============================================================================

fn new_store() -> Store<String, String> {
    Store::new()
}

fn key(i: usize) -> String {
    format!("key_{}", i)
}

// =============================================================================
// Basic Operations Tests
// =============================================================================

#[test]
fn test_set_then_get() {
    let store = new_store();

    store.set("a".into(), "1".into()).unwrap();

    assert_eq!(store.get("a".into()).unwrap(), Some("1".to_string()));
}

#[test]
fn test_get_missing_key() {
    let store = new_store();
    assert_eq!(store.get("missing".into()).unwrap(), None);
}

#[test]
fn test_set_overwrites() {
    let store = new_store();

    store.set("a".into(), "1".into()).unwrap();
    store.set("a".into(), "2".into()).unwrap();

    assert_eq!(store.get("a".into()).unwrap(), Some("2".to_string()));
    assert_eq!(store.len().unwrap(), 1);
}

#[test]
fn test_delete() {
    let store = new_store();

    store.set("a".into(), "1".into()).unwrap();
    store.delete("a".into()).unwrap();

    assert_eq!(store.get("a".into()).unwrap(), None);
    assert!(store.is_empty().unwrap());
}

#[test]
fn test_delete_missing_is_noop() {
    let store = new_store();
    store.set("a".into(), "1".into()).unwrap();

    store.delete("b".into()).unwrap();

    assert_eq!(store.len().unwrap(), 1);
}

#[test]
fn test_keys_and_values() {
    let store = new_store();
    for i in 0..10 {
        store.set(key(i), format!("value_{}", i)).unwrap();
    }

    let keys: HashSet<String> = store.keys().unwrap().into_iter().collect();
    let values: HashSet<String> = store.values().unwrap().into_iter().collect();

    assert_eq!(keys.len(), 10);
    assert_eq!(values.len(), 10);
    assert!(keys.contains("key_3"));
    assert!(values.contains("value_7"));
}

#[test]
fn test_clones_share_state() {
    let store = new_store();
    let other = store.clone();

    store.set("a".into(), "1".into()).unwrap();

    assert_eq!(other.get("a".into()).unwrap(), Some("1".to_string()));
}

// =============================================================================
// Ordering Tests
// =============================================================================

#[test]
fn test_writes_apply_in_call_order() {
    let store = new_store();

    for i in 0..1000 {
        store.set("counter".into(), i.to_string()).unwrap();
    }

    assert_eq!(store.get("counter".into()).unwrap(), Some("999".to_string()));
}

#[test]
fn test_set_delete_set_sequence() {
    let store = new_store();

    store.set("a".into(), "1".into()).unwrap();
    store.delete("a".into()).unwrap();
    store.set("a".into(), "2".into()).unwrap();
    store.delete("a".into()).unwrap();

    assert_eq!(store.get("a".into()).unwrap(), None);
}

// =============================================================================
// Per-Key TTL Tests
// =============================================================================

#[test]
fn test_key_expires() {
    let store = new_store();
    store.set("a".into(), "1".into()).unwrap();
    store.set("b".into(), "2".into()).unwrap();

    store.expire_key("a".into(), Duration::from_millis(100)).unwrap();
    thread::sleep(Duration::from_millis(250));

    assert_eq!(store.get("a".into()).unwrap(), None);
    assert_eq!(store.get("b".into()).unwrap(), Some("2".to_string()));
    assert_eq!(store.keys().unwrap(), vec!["b".to_string()]);
    assert_eq!(store.len().unwrap(), 1);
}

#[test]
fn test_key_alive_before_ttl() {
    let store = new_store();
    store.set("a".into(), "1".into()).unwrap();

    store.expire_key("a".into(), Duration::from_secs(5)).unwrap();

    assert_eq!(store.get("a".into()).unwrap(), Some("1".to_string()));
    assert_eq!(store.ttl_key("a".into()).unwrap(), Duration::from_secs(5));
}

#[test]
fn test_set_restarts_key_countdown() {
    let store = new_store();
    store.set("a".into(), "1".into()).unwrap();
    store.expire_key("a".into(), Duration::from_millis(400)).unwrap();

    thread::sleep(Duration::from_millis(200));
    store.set("a".into(), "2".into()).unwrap();
    thread::sleep(Duration::from_millis(250));

    assert_eq!(store.get("a".into()).unwrap(), Some("2".to_string()));
}

#[test]
fn test_set_after_expiry_starts_fresh() {
    let store = new_store();
    store.set("a".into(), "1".into()).unwrap();
    store.expire_key("a".into(), Duration::from_millis(50)).unwrap();
    thread::sleep(Duration::from_millis(150));

    store.set("a".into(), "2".into()).unwrap();
    thread::sleep(Duration::from_millis(100));

    assert_eq!(store.get("a".into()).unwrap(), Some("2".to_string()));
    assert_eq!(store.ttl_key("a".into()).unwrap(), Duration::ZERO);
}

#[test]
fn test_zero_ttl_clears_expiry() {
    let store = new_store();
    store.set("a".into(), "1".into()).unwrap();
    store.expire_key("a".into(), Duration::from_millis(100)).unwrap();

    store.expire_key("a".into(), Duration::ZERO).unwrap();
    thread::sleep(Duration::from_millis(200));

    assert_eq!(store.get("a".into()).unwrap(), Some("1".to_string()));
}

#[test]
fn test_expire_missing_key_is_noop() {
    let store = new_store();

    store.expire_key("ghost".into(), Duration::from_secs(1)).unwrap();

    assert_eq!(store.ttl_key("ghost".into()).unwrap(), Duration::ZERO);
    assert!(store.is_empty().unwrap());
}

#[test]
fn test_sweep_evicts_expired_keys() {
    let store: Store<String, String> = Store::with_sweep_interval(Duration::from_millis(20));
    for i in 0..50 {
        store.set(key(i), "v".into()).unwrap();
        store.expire_key(key(i), Duration::from_millis(30)).unwrap();
    }
    store.set("keep".into(), "v".into()).unwrap();

    thread::sleep(Duration::from_millis(200));

    assert_eq!(store.keys().unwrap(), vec!["keep".to_string()]);
}

#[test]
fn test_zero_sweep_interval_still_serves() {
    let store: Store<String, String> = Store::with_sweep_interval(Duration::ZERO);
    store.set("a".into(), "1".into()).unwrap();
    store.expire_key("a".into(), Duration::from_millis(20)).unwrap();
    store.set("b".into(), "2".into()).unwrap();

    thread::sleep(Duration::from_millis(100));

    assert_eq!(store.keys().unwrap(), vec!["b".to_string()]);
    store.shutdown();
}

// =============================================================================
// Whole-Store TTL Tests
// =============================================================================

#[test]
fn test_store_expires() {
    let store = new_store();
    store.set("a".into(), "1".into()).unwrap();
    store.set("b".into(), "2".into()).unwrap();

    store.expire(Duration::from_millis(100)).unwrap();
    assert_eq!(store.ttl().unwrap(), Duration::from_millis(100));
    thread::sleep(Duration::from_millis(250));

    assert!(store.is_expired().unwrap());
    assert!(store.is_empty().unwrap());
    assert_eq!(store.ttl().unwrap(), Duration::ZERO);
}

#[test]
fn test_store_ttl_is_one_shot() {
    let store = new_store();
    store.set("a".into(), "1".into()).unwrap();
    store.expire(Duration::from_millis(50)).unwrap();
    thread::sleep(Duration::from_millis(150));

    assert_eq!(store.get("a".into()).unwrap(), None);

    store.set("b".into(), "2".into()).unwrap();
    thread::sleep(Duration::from_millis(150));

    assert!(!store.is_expired().unwrap());
    assert_eq!(store.get("b".into()).unwrap(), Some("2".to_string()));
}

#[test]
fn test_store_not_expired_without_ttl() {
    let store = new_store();
    store.set("a".into(), "1".into()).unwrap();

    assert!(!store.is_expired().unwrap());
    assert_eq!(store.ttl().unwrap(), Duration::ZERO);
}

// =============================================================================
// Concurrency Tests
// =============================================================================

#[test]
fn test_concurrent_writers() {
    let store: Store<String, usize> = Store::with_sweep_interval(Duration::from_millis(1));
    let threads = 1000;

    let handles: Vec<_> = (0..threads)
        .map(|i| {
            let store = store.clone();
            thread::spawn(move || {
                store.set(key(i), i).unwrap();
                assert_eq!(store.get(key(i)).unwrap(), Some(i));
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }

    assert_eq!(store.len().unwrap(), threads);
    store.shutdown();
}

#[test]
fn test_concurrent_writers_with_expiry() {
    let sweep = Duration::from_millis(100);
    let store: Store<String, usize> = Store::with_sweep_interval(sweep);

    let handles: Vec<_> = (0..1000)
        .map(|i| {
            let store = store.clone();
            thread::spawn(move || {
                store.set(key(i), i).unwrap();
                store.expire_key(key(i), Duration::from_secs(1)).unwrap();
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }

    assert_eq!(store.len().unwrap(), 1000);

    thread::sleep(Duration::from_secs(1) + sweep * 3);

    assert_eq!(store.len().unwrap(), 0);
    assert!(store.keys().unwrap().is_empty());
}

#[test]
fn test_concurrent_readers_and_writers() {
    let store = Arc::new(new_store());
    store.set("shared".into(), "initial".into()).unwrap();

    let writers: Vec<_> = (0..4)
        .map(|t| {
            let store = Arc::clone(&store);
            thread::spawn(move || {
                for i in 0..100 {
                    store.set(format!("w{}_{}", t, i), "v".into()).unwrap();
                }
            })
        })
        .collect();

    let readers: Vec<_> = (0..4)
        .map(|_| {
            let store = Arc::clone(&store);
            thread::spawn(move || {
                for _ in 0..100 {
                    assert_eq!(store.get("shared".into()).unwrap(), Some("initial".to_string()));
                }
            })
        })
        .collect();

    for handle in writers.into_iter().chain(readers) {
        handle.join().unwrap();
    }

    assert_eq!(store.len().unwrap(), 401);
}

// =============================================================================
// Lifecycle Tests
// =============================================================================

#[test]
fn test_shutdown_closes_every_clone() {
    let store = new_store();
    let observer = store.clone();

    store.set("a".into(), "1".into()).unwrap();
    store.shutdown();

    assert!(matches!(observer.get("a".into()), Err(KvError::StoreClosed)));
}

#[test]
fn test_calls_after_shutdown_fail() {
    let store = new_store();
    store.shutdown();

    assert!(matches!(store.set("a".into(), "1".into()), Err(KvError::StoreClosed)));
    assert!(matches!(store.len(), Err(KvError::StoreClosed)));
}

#[test]
fn test_shutdown_twice() {
    let store = new_store();
    store.shutdown();
    store.shutdown();
}
