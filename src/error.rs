//! Error types for the test case store.

use crate::types::CaseId;
use std::path::PathBuf;
use thiserror::Error;

/// Main error type for store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Test case not found: {0}")]
    CaseNotFound(CaseId),

    #[error("Test case already exists: {0}")]
    DuplicateId(CaseId),

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Directory already exists: {0}")]
    DirectoryExists(String),

    #[error("Malformed document at {}: {reason}", .path.display())]
    MalformedDocument { path: PathBuf, reason: String },

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Store not initialized")]
    NotInitialized,
}

impl From<serde_json::Error> for StoreError {
    fn from(e: serde_json::Error) -> Self {
        StoreError::Serialization(e.to_string())
    }
}

impl StoreError {
    /// True for errors caused by bad caller input.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            StoreError::Validation(_) | StoreError::DuplicateId(_) | StoreError::DirectoryExists(_)
        )
    }

    /// True when the referenced case is absent from the current index.
    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::CaseNotFound(_))
    }
}

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;
