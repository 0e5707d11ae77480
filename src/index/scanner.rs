//! Recursive corpus scanning.
//!
//! Every store operation re-walks the directory tree from scratch; there
//! is no persistent index or cache, so a snapshot always reflects the
//! filesystem at the moment of the scan. Files that fail to read or parse
//! are skipped with a warning and the walk continues.

use crate::types::{CaseEntry, CaseId, TestCase, DOCUMENT_EXTENSION};
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::warn;
use walkdir::WalkDir;

/// A node in the tree mirroring the store's directory layout.
///
/// Serializes with a `type` tag so a transport layer can ship it verbatim.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DirNode {
    Folder {
        children: BTreeMap<String, DirNode>,
    },
    File {
        /// Path relative to the store root.
        path: PathBuf,
        /// Identifiers of the cases found in this file.
        case_ids: Vec<CaseId>,
    },
}

impl DirNode {
    pub fn folder() -> Self {
        DirNode::Folder {
            children: BTreeMap::new(),
        }
    }

    /// Accumulate `rel`'s path segments into folder nodes, placing a file
    /// leaf at the terminal segment.
    fn insert_file(&mut self, rel: &Path, case_ids: Vec<CaseId>) {
        let DirNode::Folder { children } = self else {
            return;
        };
        let segments: Vec<&str> = rel.iter().filter_map(|s| s.to_str()).collect();
        let Some((file_name, folders)) = segments.split_last() else {
            return;
        };

        let mut current = children;
        for segment in folders {
            let node = current
                .entry((*segment).to_string())
                .or_insert_with(DirNode::folder);
            match node {
                DirNode::Folder { children } => current = children,
                // A file and a folder sharing a name cannot both exist on disk.
                DirNode::File { .. } => return,
            }
        }
        current.insert(
            (*file_name).to_string(),
            DirNode::File {
                path: rel.to_path_buf(),
                case_ids,
            },
        );
    }
}

/// A point-in-time view of the whole corpus.
#[derive(Clone, Debug)]
pub struct Snapshot {
    /// Every indexed case, paired with its owning file.
    pub entries: Vec<CaseEntry>,

    /// Tree mirroring the directory hierarchy under the root.
    pub tree: DirNode,
}

impl Snapshot {
    /// Locate a case by id: linear scan, first match.
    pub fn find(&self, id: &CaseId) -> Option<&CaseEntry> {
        self.entries.iter().find(|entry| &entry.case.id == id)
    }

    pub fn contains_id(&self, id: &CaseId) -> bool {
        self.find(id).is_some()
    }
}

/// Recursively scan `root`, returning a best-effort snapshot.
///
/// Only files with the document extension participate. Array-shaped files
/// contribute one entry per object element carrying an `id`; an
/// object-shaped file with an `id` contributes one entry. Files that parse
/// but contain no id-bearing cases still appear as empty file leaves.
pub fn scan(root: &Path) -> Snapshot {
    let mut entries = Vec::new();
    let mut tree = DirNode::folder();

    let walker = WalkDir::new(root).sort_by_file_name().into_iter();
    for entry in walker.filter_map(|e| match e {
        Ok(e) => Some(e),
        Err(err) => {
            warn!(error = %err, "skipping unreadable directory entry");
            None
        }
    }) {
        let path = entry.path();
        if !entry.file_type().is_file() {
            continue;
        }
        if path.extension().and_then(|e| e.to_str()) != Some(DOCUMENT_EXTENSION) {
            continue;
        }
        let Ok(rel) = path.strip_prefix(root) else {
            continue;
        };

        let bytes = match fs::read(path) {
            Ok(bytes) => bytes,
            Err(err) => {
                warn!(path = %rel.display(), error = %err, "skipping unreadable file");
                continue;
            }
        };
        let value: Value = match serde_json::from_slice(&bytes) {
            Ok(value) => value,
            Err(err) => {
                warn!(path = %rel.display(), error = %err, "skipping unparsable file");
                continue;
            }
        };

        let mut case_ids = Vec::new();
        match value {
            Value::Array(elements) => {
                for element in elements {
                    collect_case(rel, element, &mut entries, &mut case_ids);
                }
            }
            object @ Value::Object(_) => collect_case(rel, object, &mut entries, &mut case_ids),
            _ => {}
        }
        tree.insert_file(rel, case_ids);
    }

    Snapshot { entries, tree }
}

/// Index one candidate value when it is an object carrying an `id`.
fn collect_case(rel: &Path, value: Value, entries: &mut Vec<CaseEntry>, case_ids: &mut Vec<CaseId>) {
    let has_id = value
        .as_object()
        .map_or(false, |object| object.contains_key("id"));
    if !has_id {
        return;
    }

    match serde_json::from_value::<TestCase>(value) {
        Ok(case) => {
            case_ids.push(case.id.clone());
            entries.push(CaseEntry {
                file_path: rel.to_path_buf(),
                case,
            });
        }
        Err(err) => {
            warn!(path = %rel.display(), error = %err, "skipping malformed case entry");
        }
    }
}
