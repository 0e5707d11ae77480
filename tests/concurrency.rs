//! Concurrent writer tests.
//!
//! The store serializes same-file writers in-process; these tests race
//! operations against a shared file and assert the file stays parseable
//! with no lost appends and no duplicate ids.

use casetree::{CaseDraft, CaseId, Store, StoreConfig};
use serde_json::{json, Value};
use std::fs;
use std::sync::Arc;
use std::thread;
use tempfile::TempDir;

fn test_store(dir: &TempDir) -> Arc<Store> {
    Arc::new(
        Store::create(StoreConfig {
            root: dir.path().join("test_cases"),
            ..Default::default()
        })
        .unwrap(),
    )
}

#[test]
fn test_concurrent_creates_into_one_file_lose_nothing() {
    let dir = TempDir::new().unwrap();
    let store = test_store(&dir);

    let mut handles = vec![];
    for i in 0..8 {
        let store = store.clone();
        handles.push(thread::spawn(move || {
            store
                .create_case(
                    CaseDraft::new(format!("Case {i}"), "bob")
                        .with_id(format!("tc_{i}"))
                        .with_file_path("shared.json"),
                )
                .unwrap();
        }));
    }
    for handle in handles {
        handle.join().unwrap();
    }

    // Every append survived and the file is well-formed JSON.
    let on_disk: Value =
        serde_json::from_slice(&fs::read(store.root().join("shared.json")).unwrap()).unwrap();
    assert_eq!(on_disk.as_array().unwrap().len(), 8);
    assert_eq!(store.list().entries.len(), 8);
}

#[test]
fn test_concurrent_updates_on_one_file_stay_consistent() {
    let dir = TempDir::new().unwrap();
    let store = test_store(&dir);
    for i in 0..4 {
        store
            .create_case(
                CaseDraft::new(format!("Case {i}"), "bob")
                    .with_id(format!("tc_{i}"))
                    .with_file_path("shared.json"),
            )
            .unwrap();
    }

    let mut handles = vec![];
    for i in 0..4 {
        let store = store.clone();
        handles.push(thread::spawn(move || {
            let patch = match json!({"title": format!("Updated {i}")}) {
                Value::Object(map) => map,
                _ => unreachable!(),
            };
            store.update(&CaseId::from(format!("tc_{i}")), patch).unwrap();
        }));
    }
    for handle in handles {
        handle.join().unwrap();
    }

    // All four updates landed; nothing was clobbered by a racing writer.
    let snapshot = store.list();
    assert_eq!(snapshot.entries.len(), 4);
    for i in 0..4 {
        let entry = snapshot.find(&CaseId::from(format!("tc_{i}"))).unwrap();
        assert_eq!(entry.case.title, format!("Updated {i}"));
    }
}

#[test]
fn test_racing_update_and_delete_never_corrupt_the_file() {
    let dir = TempDir::new().unwrap();
    let store = test_store(&dir);
    for i in 0..6 {
        store
            .create_case(
                CaseDraft::new(format!("Case {i}"), "bob")
                    .with_id(format!("tc_{i}"))
                    .with_file_path("shared.json"),
            )
            .unwrap();
    }

    let mut handles = vec![];
    for i in 0..6 {
        let store = store.clone();
        handles.push(thread::spawn(move || {
            let id = CaseId::from(format!("tc_{i}"));
            if i % 2 == 0 {
                // Deletes may race a concurrent rewrite; losing the race
                // surfaces as NotFound, never as corruption.
                let _ = store.delete(&id);
            } else {
                let patch = match json!({"title": "survivor"}) {
                    Value::Object(map) => map,
                    _ => unreachable!(),
                };
                let _ = store.update(&id, patch);
            }
        }));
    }
    for handle in handles {
        handle.join().unwrap();
    }

    // Whatever interleaving happened, the corpus parses and has no
    // duplicate ids.
    let snapshot = store.list();
    let mut ids: Vec<&str> = snapshot
        .entries
        .iter()
        .map(|e| e.case.id.as_str())
        .collect();
    let before = ids.len();
    ids.sort_unstable();
    ids.dedup();
    assert_eq!(ids.len(), before);

    if store.root().join("shared.json").exists() {
        let on_disk: Value =
            serde_json::from_slice(&fs::read(store.root().join("shared.json")).unwrap()).unwrap();
        assert!(on_disk.is_array() || on_disk.is_object());
    }
}
