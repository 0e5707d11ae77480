//! Main Store struct tying all components together.

use crate::docfile;
use crate::error::{Result, StoreError};
use crate::index::{scan, Snapshot};
use crate::locks::PathLockManager;
use crate::types::{
    CaseDraft, CaseEntry, CaseId, CreatedCase, DeleteOutcome, MoveOutcome, TestCase, COPY_SUFFIX,
    DOCUMENT_EXTENSION,
};
use chrono::Utc;
use serde_json::{Map, Value};
use std::fs;
use std::path::{Component, Path, PathBuf};
use tracing::debug;

/// Store configuration.
#[derive(Clone, Debug)]
pub struct StoreConfig {
    /// Root directory holding the document tree.
    pub root: PathBuf,

    /// File that `create` targets when the caller names none,
    /// relative to the root.
    pub default_file: PathBuf,

    /// Whether to create the root if it doesn't exist.
    pub create_if_missing: bool,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("./test_cases"),
            default_file: PathBuf::from("new_test_cases.json"),
            create_if_missing: true,
        }
    }
}

/// The main test case store.
///
/// Provides a unified interface for:
/// - Listing and searching the corpus
/// - Creating, updating, deleting, and duplicating cases
/// - Moving cases between files and reordering their steps
/// - Creating directories under the root
///
/// Every operation re-derives a fresh snapshot of the directory tree
/// before acting; there is no persistent cache to go stale.
pub struct Store {
    /// Store configuration.
    config: StoreConfig,

    /// Serializes same-file writers within this process.
    locks: PathLockManager,
}

impl Store {
    /// Open an existing store or create a new one.
    pub fn open_or_create(config: StoreConfig) -> Result<Self> {
        if config.root.is_dir() {
            Self::open(config)
        } else if config.create_if_missing {
            Self::create(config)
        } else {
            Err(StoreError::NotInitialized)
        }
    }

    /// Create a new store, materializing the root directory.
    pub fn create(config: StoreConfig) -> Result<Self> {
        fs::create_dir_all(&config.root)?;
        Ok(Self {
            config,
            locks: PathLockManager::new(),
        })
    }

    /// Open an existing store.
    pub fn open(config: StoreConfig) -> Result<Self> {
        if !config.root.is_dir() {
            return Err(StoreError::NotInitialized);
        }
        Ok(Self {
            config,
            locks: PathLockManager::new(),
        })
    }

    pub fn root(&self) -> &Path {
        &self.config.root
    }

    // --- Read Operations ---

    /// Scan the corpus: flat entries plus the directory tree.
    ///
    /// Best-effort: unreadable or unparsable files are skipped with a
    /// warning rather than failing the scan.
    pub fn list(&self) -> Snapshot {
        scan(&self.config.root)
    }

    /// Get a case by id, together with its owning file.
    pub fn get(&self, id: &CaseId) -> Result<CaseEntry> {
        self.list()
            .find(id)
            .cloned()
            .ok_or_else(|| StoreError::CaseNotFound(id.clone()))
    }

    /// Case-insensitive substring search over id, title, and tags.
    ///
    /// An empty query returns an empty result set, not the full corpus.
    pub fn search(&self, query: &str) -> Vec<CaseEntry> {
        let needle = query.trim().to_lowercase();
        if needle.is_empty() {
            return Vec::new();
        }
        self.list()
            .entries
            .into_iter()
            .filter(|entry| entry.case.matches(&needle))
            .collect()
    }

    // --- Case Mutations ---

    /// Create a new case from a draft.
    ///
    /// `title` and `author` are required. A missing id is synthesized and
    /// checked against the current corpus; a caller-supplied id that
    /// collides anywhere in the store is rejected.
    pub fn create_case(&self, draft: CaseDraft) -> Result<CreatedCase> {
        let title = required_field(draft.title, "title")?;
        let author = required_field(draft.author, "author")?;

        let snapshot = self.list();
        let id = match draft.id {
            Some(id) => {
                if snapshot.contains_id(&id) {
                    return Err(StoreError::DuplicateId(id));
                }
                id
            }
            None => Self::generate_unique_id(&snapshot),
        };

        let now = Utc::now();
        let case = TestCase {
            id,
            title,
            author,
            status: draft.status.unwrap_or_default(),
            tags: draft.tags.unwrap_or_default(),
            levels: draft.levels.unwrap_or_default(),
            actions: draft.actions.unwrap_or_default(),
            created_at: Some(now),
            updated_at: Some(now),
            extra: draft.extra,
        };

        let file_path = match draft.file_path.as_deref() {
            Some(path) => self.document_path(path)?,
            None => self.config.default_file.clone(),
        };

        let lock = self.locks.lock_for(&file_path);
        let _guard = lock.lock();
        docfile::append_case(&self.resolve(&file_path), case.clone())?;

        debug!(id = %case.id, path = %file_path.display(), "created test case");
        Ok(CreatedCase { case, file_path })
    }

    /// Shallow-merge `patch` over the existing case and persist it into
    /// its original file. Update never relocates a case.
    pub fn update(&self, id: &CaseId, patch: Map<String, Value>) -> Result<TestCase> {
        let entry = self.get(id)?;

        let lock = self.locks.lock_for(&entry.file_path);
        let _guard = lock.lock();

        let mut merged = serde_json::to_value(&entry.case)?;
        if let Value::Object(fields) = &mut merged {
            for (key, value) in patch {
                fields.insert(key, value);
            }
        }
        let mut case: TestCase = serde_json::from_value(merged)?;
        case.updated_at = Some(Utc::now());

        docfile::replace_case(&self.resolve(&entry.file_path), id, case.clone())?;
        debug!(id = %id, path = %entry.file_path.display(), "updated test case");
        Ok(case)
    }

    /// Delete a case. An emptied backing file is removed from disk.
    pub fn delete(&self, id: &CaseId) -> Result<DeleteOutcome> {
        let entry = self.get(id)?;

        let lock = self.locks.lock_for(&entry.file_path);
        let _guard = lock.lock();

        let file_removed = docfile::remove_case(&self.resolve(&entry.file_path), id)?;
        debug!(id = %id, path = %entry.file_path.display(), file_removed, "deleted test case");
        Ok(DeleteOutcome { file_removed })
    }

    /// Clone a case under a fresh id into the same file.
    ///
    /// The copy gets a fixed title marker and both timestamps reset to
    /// the duplication time.
    pub fn duplicate(&self, id: &CaseId) -> Result<CreatedCase> {
        let snapshot = self.list();
        let entry = snapshot
            .find(id)
            .cloned()
            .ok_or_else(|| StoreError::CaseNotFound(id.clone()))?;

        let now = Utc::now();
        let mut copy = entry.case;
        copy.id = Self::generate_unique_id(&snapshot);
        copy.title = format!("{}{}", copy.title, COPY_SUFFIX);
        copy.created_at = Some(now);
        copy.updated_at = Some(now);

        let lock = self.locks.lock_for(&entry.file_path);
        let _guard = lock.lock();
        docfile::append_case(&self.resolve(&entry.file_path), copy.clone())?;

        debug!(source = %id, copy = %copy.id, "duplicated test case");
        Ok(CreatedCase {
            case: copy,
            file_path: entry.file_path,
        })
    }

    /// Move a case into another file, creating directories as needed.
    ///
    /// Two-phase: remove from the source (cleanup invariant applies),
    /// then append to the destination. A same-path move short-circuits to
    /// a no-op before touching disk.
    pub fn move_case(&self, id: &CaseId, destination: &str) -> Result<MoveOutcome> {
        if destination.trim().is_empty() {
            return Err(StoreError::Validation(
                "destination file path is required".to_string(),
            ));
        }
        let destination = self.document_path(destination.trim())?;

        let CaseEntry {
            file_path: source,
            case,
        } = self.get(id)?;

        if source == destination {
            return Ok(MoveOutcome {
                previous_file: source,
                new_file: destination,
            });
        }

        // Stable lock order across the two files to avoid deadlock.
        let (first, second) = if source < destination {
            (&source, &destination)
        } else {
            (&destination, &source)
        };
        let first_lock = self.locks.lock_for(first);
        let _first_guard = first_lock.lock();
        let second_lock = self.locks.lock_for(second);
        let _second_guard = second_lock.lock();

        docfile::remove_case(&self.resolve(&source), id)?;
        docfile::append_case(&self.resolve(&destination), case)?;

        debug!(id = %id, from = %source.display(), to = %destination.display(), "moved test case");
        Ok(MoveOutcome {
            previous_file: source,
            new_file: destination,
        })
    }

    /// Replace the case's ordered steps, in its current file.
    pub fn reorder_steps(&self, id: &CaseId, steps: Value) -> Result<TestCase> {
        let Value::Array(steps) = steps else {
            return Err(StoreError::Validation(
                "steps must be an array".to_string(),
            ));
        };

        let entry = self.get(id)?;

        let lock = self.locks.lock_for(&entry.file_path);
        let _guard = lock.lock();

        let mut case = entry.case;
        case.actions = steps;
        case.updated_at = Some(Utc::now());

        docfile::replace_case(&self.resolve(&entry.file_path), id, case.clone())?;
        debug!(id = %id, steps = case.actions.len(), "reordered test case steps");
        Ok(case)
    }

    /// Create a directory under the store root.
    pub fn create_directory(&self, name: &str) -> Result<PathBuf> {
        let name = name.trim();
        if name.is_empty() {
            return Err(StoreError::Validation(
                "directory name is required".to_string(),
            ));
        }
        let rel = self.relative_path(name)?;
        let full = self.resolve(&rel);
        if full.exists() {
            return Err(StoreError::DirectoryExists(name.to_string()));
        }
        fs::create_dir_all(&full)?;

        debug!(path = %rel.display(), "created directory");
        Ok(rel)
    }

    // --- Helpers ---

    fn resolve(&self, rel: &Path) -> PathBuf {
        self.config.root.join(rel)
    }

    /// Synthesize an id that is absent from the given snapshot.
    fn generate_unique_id(snapshot: &Snapshot) -> CaseId {
        loop {
            let id = CaseId::generate();
            if !snapshot.contains_id(&id) {
                return id;
            }
        }
    }

    /// Validate a caller-supplied path: relative, and no `.`/`..`
    /// components, so no operation can escape the store root.
    fn relative_path(&self, raw: &str) -> Result<PathBuf> {
        let path = Path::new(raw);
        if path.is_absolute() {
            return Err(StoreError::Validation(format!(
                "path must be relative to the store root: {raw}"
            )));
        }
        if !path.components().all(|c| matches!(c, Component::Normal(_))) {
            return Err(StoreError::Validation(format!(
                "path may not contain '.' or '..' components: {raw}"
            )));
        }
        Ok(path.to_path_buf())
    }

    /// As [`Self::relative_path`], additionally forcing the document
    /// extension so the file stays visible to the indexer.
    fn document_path(&self, raw: &str) -> Result<PathBuf> {
        let suffix = format!(".{DOCUMENT_EXTENSION}");
        let normalized = if raw.ends_with(&suffix) {
            raw.to_string()
        } else {
            format!("{raw}{suffix}")
        };
        self.relative_path(&normalized)
    }
}

fn required_field(value: Option<String>, name: &str) -> Result<String> {
    match value {
        Some(value) if !value.trim().is_empty() => Ok(value),
        _ => Err(StoreError::Validation(format!(
            "field \"{name}\" is required"
        ))),
    }
}
