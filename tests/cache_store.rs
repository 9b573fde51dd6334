// tests/cache_store.rs

use std::fs;

use tempfile::TempDir;

use workdag::engine::{CacheStore, FileCacheStore, MemoryCacheStore};

#[test]
fn test_file_cache_round_trip_and_prune() {
    let tmp = TempDir::new().unwrap();
    let mut store = FileCacheStore::new(tmp.path().to_path_buf());

    assert_eq!(store.load("A").unwrap(), None);

    store.save("B", "bbb").unwrap();
    store.save("A", "aaa").unwrap();
    store.save("A", "aaa2").unwrap();

    // A fresh store sees what was written.
    let reopened = FileCacheStore::new(tmp.path().to_path_buf());
    assert_eq!(reopened.load("A").unwrap().as_deref(), Some("aaa2"));
    assert_eq!(reopened.load("B").unwrap().as_deref(), Some("bbb"));

    // Entries are written sorted by task name.
    let contents = fs::read_to_string(store.path()).unwrap();
    assert_eq!(contents, "A aaa2\nB bbb\n");

    store.prune(&["A"]).unwrap();
    assert_eq!(store.load("B").unwrap(), None);
    assert_eq!(store.load("A").unwrap().as_deref(), Some("aaa2"));
}

#[test]
fn test_file_cache_skips_blank_lines() {
    let tmp = TempDir::new().unwrap();
    let store = FileCacheStore::new(tmp.path().to_path_buf());
    fs::create_dir_all(store.path().parent().unwrap()).unwrap();
    fs::write(store.path(), "\nA   abc\n\n").unwrap();

    assert_eq!(store.load("A").unwrap().as_deref(), Some("abc"));
}

#[test]
fn test_memory_cache_prune() {
    let mut store = MemoryCacheStore::new();
    store.save("A", "1").unwrap();
    store.save("B", "2").unwrap();

    store.prune(&["B"]).unwrap();
    assert_eq!(store.load("A").unwrap(), None);
    assert_eq!(store.load("B").unwrap().as_deref(), Some("2"));
}

#[test]
fn test_boxed_store_forwards() {
    let mut store: Box<dyn CacheStore> = Box::new(MemoryCacheStore::new());
    store.save("A", "1").unwrap();
    assert_eq!(store.load("A").unwrap().as_deref(), Some("1"));
}
