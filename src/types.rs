//! Core types for the test case store.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::path::PathBuf;
use uuid::Uuid;

/// File extension (without dot) the store treats as documents.
pub const DOCUMENT_EXTENSION: &str = "json";

/// Prefix for synthesized case identifiers.
pub const GENERATED_ID_PREFIX: &str = "tc_";

/// Title marker appended by `duplicate`.
pub const COPY_SUFFIX: &str = " (copy)";

/// Unique identifier for a test case.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CaseId(pub String);

impl CaseId {
    /// Synthesize a fresh identifier: `tc_` plus an eight-character token.
    ///
    /// The prefix keeps generated ids from colliding with natural-language
    /// identifiers callers pick by hand.
    pub fn generate() -> Self {
        let token = Uuid::new_v4().simple().to_string();
        CaseId(format!("{}{}", GENERATED_ID_PREFIX, &token[..8]))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for CaseId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CaseId({})", self.0)
    }
}

impl fmt::Display for CaseId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for CaseId {
    fn from(s: &str) -> Self {
        CaseId(s.to_string())
    }
}

impl From<String> for CaseId {
    fn from(s: String) -> Self {
        CaseId(s)
    }
}

/// Workflow status of a test case.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum CaseStatus {
    Draft,
    Ready,
    InReview,
    Passed,
    Failed,
    Deprecated,

    /// Statuses outside the core vocabulary round-trip as-is.
    #[serde(untagged)]
    Other(String),
}

impl Default for CaseStatus {
    fn default() -> Self {
        CaseStatus::Draft
    }
}

/// A single test case document.
///
/// Only `id` must be present on disk; every other field defaults so the
/// best-effort scan tolerates sparse documents. Fields outside the core
/// schema land in `extra` and round-trip untouched.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TestCase {
    /// Globally unique identifier across the whole store.
    pub id: CaseId,

    #[serde(default)]
    pub title: String,

    #[serde(default)]
    pub author: String,

    #[serde(default)]
    pub status: CaseStatus,

    #[serde(default)]
    pub tags: Vec<String>,

    #[serde(default)]
    pub levels: Vec<Value>,

    /// Ordered step objects.
    #[serde(default)]
    pub actions: Vec<Value>,

    /// Set once at creation, never changed afterwards.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,

    /// Refreshed on every mutation of this case.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,

    /// Opaque caller-supplied fields outside the core schema.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl TestCase {
    /// Case-insensitive substring match over id, title, and tags.
    ///
    /// `needle` must already be lowercased.
    pub fn matches(&self, needle: &str) -> bool {
        self.id.as_str().to_lowercase().contains(needle)
            || self.title.to_lowercase().contains(needle)
            || self.tags.iter().any(|tag| tag.to_lowercase().contains(needle))
    }
}

/// Input for creating a new test case (before id and defaults are applied).
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct CaseDraft {
    #[serde(default)]
    pub id: Option<CaseId>,

    #[serde(default)]
    pub title: Option<String>,

    #[serde(default)]
    pub author: Option<String>,

    #[serde(default)]
    pub status: Option<CaseStatus>,

    #[serde(default)]
    pub tags: Option<Vec<String>>,

    #[serde(default)]
    pub levels: Option<Vec<Value>>,

    #[serde(default)]
    pub actions: Option<Vec<Value>>,

    /// Target file relative to the store root. Steers placement only and is
    /// never persisted inside the record.
    #[serde(default, skip_serializing)]
    pub file_path: Option<String>,

    /// Extra fields carried verbatim into the created case.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl CaseDraft {
    /// Create a draft with the two required fields.
    pub fn new(title: impl Into<String>, author: impl Into<String>) -> Self {
        Self {
            title: Some(title.into()),
            author: Some(author.into()),
            ..Default::default()
        }
    }

    /// Use a caller-supplied id instead of a generated one.
    pub fn with_id(mut self, id: impl Into<CaseId>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn with_status(mut self, status: CaseStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn with_tags(mut self, tags: Vec<String>) -> Self {
        self.tags = Some(tags);
        self
    }

    pub fn with_actions(mut self, steps: Vec<Value>) -> Self {
        self.actions = Some(steps);
        self
    }

    /// Route the case into a specific file under the store root.
    pub fn with_file_path(mut self, path: impl Into<String>) -> Self {
        self.file_path = Some(path.into());
        self
    }
}

/// One indexed case together with its owning file.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CaseEntry {
    /// Path of the owning file, relative to the store root.
    pub file_path: PathBuf,

    pub case: TestCase,
}

/// Result of a successful `create` or `duplicate`.
#[derive(Clone, Debug)]
pub struct CreatedCase {
    pub case: TestCase,

    /// File the case was appended to, relative to the store root.
    pub file_path: PathBuf,
}

/// Result of a successful `delete`.
#[derive(Clone, Copy, Debug)]
pub struct DeleteOutcome {
    /// True when the backing file held no further cases and was removed.
    pub file_removed: bool,
}

/// Result of a successful `move_case`.
#[derive(Clone, Debug, PartialEq)]
pub struct MoveOutcome {
    pub previous_file: PathBuf,
    pub new_file: PathBuf,
}
