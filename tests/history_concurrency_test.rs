use std::sync::Arc;
use std::thread;

use carbonpost::history::model::HistoryEntry;
use carbonpost::history::store::HistoryStore;
use chrono::Utc;
use tempfile::TempDir;

fn create_dummy_entry(id: String) -> HistoryEntry {
    HistoryEntry {
        id,
        timestamp: Utc::now(),
        method: "GET".to_string(),
        url: "https://example.com".to_string(),
        backend: "client".to_string(),
        repeat: 1,
        is_green: false,
        total_bytes: 150,
        estimated_co2: 0.000041,
        error: None,
    }
}

#[test]
fn test_concurrent_appends_never_exceed_capacity() {
    let capacity = 50;
    let store = Arc::new(HistoryStore::new(capacity));

    let thread_count = 10;
    let entries_per_thread = 50;

    let mut handles = vec![];
    for i in 0..thread_count {
        let store = store.clone();
        handles.push(thread::spawn(move || {
            for j in 0..entries_per_thread {
                store.append(create_dummy_entry(format!("{}-{}", i, j)));
            }
        }));
    }

    for handle in handles {
        handle.join().unwrap();
    }

    // Trim is atomic with append: no reader state can exceed the bound.
    assert_eq!(store.len(), capacity);
    assert_eq!(store.list(capacity * 2).len(), capacity);
}

#[test]
fn test_concurrent_appends_with_flush_file() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("history.jsonl");

    let capacity = 20;
    let store = Arc::new(HistoryStore::with_flush_path(capacity, path.clone()));

    let mut handles = vec![];
    for i in 0..5 {
        let store = store.clone();
        handles.push(thread::spawn(move || {
            for j in 0..20 {
                store.append(create_dummy_entry(format!("{}-{}", i, j)));
            }
        }));
    }
    for handle in handles {
        handle.join().unwrap();
    }

    assert_eq!(store.len(), capacity);

    // The flushed window restores to exactly the retained entries.
    let restored = HistoryStore::load(capacity, path);
    assert_eq!(restored.len(), capacity);

    let live_ids: Vec<String> = store.list(capacity).into_iter().map(|e| e.id).collect();
    let restored_ids: Vec<String> = restored.list(capacity).into_iter().map(|e| e.id).collect();
    assert_eq!(live_ids, restored_ids);
}

#[test]
fn test_readers_see_consistent_windows_during_writes() {
    let capacity = 10;
    let store = Arc::new(HistoryStore::new(capacity));

    let writer = {
        let store = store.clone();
        thread::spawn(move || {
            for i in 0..500 {
                store.append(create_dummy_entry(i.to_string()));
            }
        })
    };

    let reader = {
        let store = store.clone();
        thread::spawn(move || {
            for _ in 0..200 {
                let seen = store.list(capacity * 2);
                assert!(seen.len() <= capacity, "observed a torn window");
            }
        })
    };

    writer.join().unwrap();
    reader.join().unwrap();
}
