//! Corpus indexing: recursive scan, flat entries, directory tree.

mod scanner;

pub use scanner::{scan, DirNode, Snapshot};
