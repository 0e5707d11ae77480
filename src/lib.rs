//! # Casetree
//!
//! A file-tree-backed test case store: structured case documents persisted
//! as JSON files in an arbitrary directory hierarchy.
//!
//! ## Core Concepts
//!
//! - **Cases**: Open-schema documents with an id, title, tags, and steps
//! - **Shapes**: A file holds one case object or an array of cases, interchangeably
//! - **Snapshots**: Every operation re-scans the tree; nothing is cached
//! - **Cleanup**: A file emptied of its last case is deleted, never left as `[]`
//!
//! ## Example
//!
//! ```ignore
//! use casetree::{CaseDraft, Store, StoreConfig};
//!
//! let store = Store::open_or_create(StoreConfig {
//!     root: "./test_cases".into(),
//!     ..Default::default()
//! })?;
//!
//! // Create a case (id synthesized, defaults applied)
//! let created = store.create_case(CaseDraft::new("Login works", "bob"))?;
//!
//! // Search across the whole corpus
//! let hits = store.search("login");
//!
//! // Relocate it into another file
//! store.move_case(&created.case.id, "suites/auth.json")?;
//! ```

pub mod docfile;
pub mod error;
pub mod index;
pub mod locks;
pub mod store;
pub mod types;

// Re-exports
pub use docfile::DocumentShape;
pub use error::{Result, StoreError};
pub use index::{scan, DirNode, Snapshot};
pub use locks::PathLockManager;
pub use store::{Store, StoreConfig};
pub use types::*;
