//! Per-file write serialization.
//!
//! Every mutation is a whole-file read-modify-write, so two writers racing
//! on the same document can lose an update. Reads re-scan and need no
//! locks; writers take a per-path mutex for the duration of the
//! load-mutate-save cycle. Cross-process writers remain unguarded
//! (last writer wins).

use parking_lot::{Mutex, RwLock};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Registry of per-path mutexes keyed by store-relative file path.
pub struct PathLockManager {
    locks: RwLock<HashMap<PathBuf, Arc<Mutex<()>>>>,
}

impl PathLockManager {
    pub fn new() -> Self {
        Self {
            locks: RwLock::new(HashMap::new()),
        }
    }

    /// Get or create the lock for a document path.
    pub fn lock_for(&self, path: &Path) -> Arc<Mutex<()>> {
        {
            let map = self.locks.read();
            if let Some(lock) = map.get(path) {
                return lock.clone();
            }
        }

        // Re-check under the write lock; another thread may have won.
        let mut map = self.locks.write();
        map.entry(path.to_path_buf())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }
}

impl Default for PathLockManager {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::thread;

    #[test]
    fn test_same_path_writes_are_serialized() {
        let manager = Arc::new(PathLockManager::new());
        let counter = Arc::new(AtomicUsize::new(0));

        let mut handles = vec![];
        for _ in 0..5 {
            let manager = manager.clone();
            let counter = counter.clone();
            handles.push(thread::spawn(move || {
                let lock = manager.lock_for(Path::new("a.json"));
                let _guard = lock.lock();
                let current = counter.load(Ordering::SeqCst);
                thread::yield_now();
                counter.store(current + 1, Ordering::SeqCst);
            }));
        }
        for handle in handles {
            handle.join().unwrap();
        }

        // No lost increments under the lock.
        assert_eq!(counter.load(Ordering::SeqCst), 5);
    }

    #[test]
    fn test_different_paths_dont_block() {
        let manager = Arc::new(PathLockManager::new());
        let counter = Arc::new(AtomicUsize::new(0));

        let mut handles = vec![];
        for i in 0..6 {
            let manager = manager.clone();
            let counter = counter.clone();
            let path = if i % 2 == 0 { "a.json" } else { "b/c.json" };
            handles.push(thread::spawn(move || {
                let lock = manager.lock_for(Path::new(path));
                let _guard = lock.lock();
                counter.fetch_add(1, Ordering::SeqCst);
            }));
        }
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(counter.load(Ordering::SeqCst), 6);
    }

    #[test]
    fn test_lock_identity_is_stable_per_path() {
        let manager = PathLockManager::new();
        let first = manager.lock_for(Path::new("x.json"));
        let second = manager.lock_for(Path::new("x.json"));
        assert!(Arc::ptr_eq(&first, &second));
    }
}
