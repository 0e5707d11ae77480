//! Read-modify-write primitives for a single document file.
//!
//! Each mutation is a whole-file rewrite: a failed write leaves the prior
//! content intact, there is no partial in-file corruption. Load/save pairs
//! are not transactional; callers serialize writers per path (see
//! [`crate::locks`]).

use crate::docfile::shape::DocumentShape;
use crate::error::{Result, StoreError};
use crate::types::{CaseId, TestCase};
use std::fs;
use std::path::Path;
use tracing::debug;

/// Load a document file. Returns `None` when the file does not exist.
///
/// Malformed JSON here is fatal: unlike the best-effort corpus scan, the
/// caller is about to mutate this specific file.
pub fn load(path: &Path) -> Result<Option<DocumentShape>> {
    let bytes = match fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e.into()),
    };

    let shape = serde_json::from_slice(&bytes).map_err(|e| StoreError::MalformedDocument {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;
    Ok(Some(shape))
}

/// Write a document file, creating parent directories as needed.
pub fn save(path: &Path, shape: &DocumentShape) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let bytes = serde_json::to_vec_pretty(shape)?;
    fs::write(path, bytes)?;
    Ok(())
}

/// Append a case, creating the file when absent and promoting an
/// object-shaped file to an array.
pub fn append_case(path: &Path, case: TestCase) -> Result<()> {
    let shape = load(path)?.unwrap_or_else(DocumentShape::empty);
    save(path, &shape.push(case))
}

/// Replace the case matching `id` in place.
pub fn replace_case(path: &Path, id: &CaseId, replacement: TestCase) -> Result<()> {
    let Some(mut shape) = load(path)? else {
        return Err(StoreError::CaseNotFound(id.clone()));
    };
    if !shape.replace(id, replacement) {
        return Err(StoreError::CaseNotFound(id.clone()));
    }
    save(path, &shape)
}

/// Remove the case matching `id`.
///
/// A file that would hold zero cases is deleted from disk rather than
/// rewritten as an empty array. Returns whether the file was deleted.
pub fn remove_case(path: &Path, id: &CaseId) -> Result<bool> {
    let Some(shape) = load(path)? else {
        return Err(StoreError::CaseNotFound(id.clone()));
    };

    let (remaining, removed) = shape.remove(id);
    if !removed {
        return Err(StoreError::CaseNotFound(id.clone()));
    }

    match remaining {
        Some(shape) => {
            save(path, &shape)?;
            Ok(false)
        }
        None => {
            fs::remove_file(path)?;
            debug!(path = %path.display(), "removed emptied document file");
            Ok(true)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};
    use tempfile::TempDir;

    fn case(id: &str) -> TestCase {
        serde_json::from_value(json!({"id": id, "title": id})).unwrap()
    }

    #[test]
    fn test_load_missing_file() {
        let dir = TempDir::new().unwrap();
        let loaded = load(&dir.path().join("missing.json")).unwrap();
        assert!(loaded.is_none());
    }

    #[test]
    fn test_append_creates_one_element_array() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("suites").join("a.json");

        append_case(&path, case("tc_1")).unwrap();

        let value: Value = serde_json::from_slice(&fs::read(&path).unwrap()).unwrap();
        assert_eq!(value, json!([{"id": "tc_1", "title": "tc_1", "status": "Draft",
            "author": "", "tags": [], "levels": [], "actions": []}]));
    }

    #[test]
    fn test_append_promotes_object_shaped_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("a.json");
        fs::write(&path, serde_json::to_vec(&json!({"id": "tc_1"})).unwrap()).unwrap();

        append_case(&path, case("tc_2")).unwrap();

        let value: Value = serde_json::from_slice(&fs::read(&path).unwrap()).unwrap();
        let cases = value.as_array().unwrap();
        assert_eq!(cases.len(), 2);
        assert_eq!(cases[0]["id"], "tc_1");
        assert_eq!(cases[1]["id"], "tc_2");
    }

    #[test]
    fn test_remove_last_case_deletes_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("a.json");
        fs::write(&path, serde_json::to_vec(&json!({"id": "tc_1"})).unwrap()).unwrap();

        let deleted = remove_case(&path, &"tc_1".into()).unwrap();
        assert!(deleted);
        assert!(!path.exists());
    }

    #[test]
    fn test_remove_keeps_shrunken_collection() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("a.json");
        save(
            &path,
            &DocumentShape::Collection(vec![case("tc_1"), case("tc_2")]),
        )
        .unwrap();

        let deleted = remove_case(&path, &"tc_1".into()).unwrap();
        assert!(!deleted);

        let value: Value = serde_json::from_slice(&fs::read(&path).unwrap()).unwrap();
        assert_eq!(value.as_array().unwrap().len(), 1);
    }

    #[test]
    fn test_replace_missing_id() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("a.json");
        save(&path, &DocumentShape::Single(case("tc_1"))).unwrap();

        let result = replace_case(&path, &"tc_9".into(), case("tc_9"));
        assert!(matches!(result, Err(StoreError::CaseNotFound(_))));
    }

    #[test]
    fn test_malformed_target_file_is_fatal() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("bad.json");
        fs::write(&path, b"{ not json").unwrap();

        let result = load(&path);
        assert!(matches!(
            result,
            Err(StoreError::MalformedDocument { .. })
        ));
    }
}
