//! On-disk document shapes and their conversion rules.
//!
//! A document file holds either one case object or an ordered array of
//! case objects. The two shapes are interchangeable at the storage layer:
//! appending to an object-shaped file promotes it to an array, and a file
//! left with zero cases is deleted rather than persisted as `[]`.

use crate::types::{CaseId, TestCase};
use serde::{Deserialize, Serialize};

/// The two shapes a document file can take on disk.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DocumentShape {
    /// A file holding exactly one test case object.
    Single(TestCase),

    /// A file holding an ordered sequence of test cases.
    Collection(Vec<TestCase>),
}

impl DocumentShape {
    /// The shape a freshly created file starts from.
    pub fn empty() -> Self {
        DocumentShape::Collection(Vec::new())
    }

    pub fn len(&self) -> usize {
        match self {
            DocumentShape::Single(_) => 1,
            DocumentShape::Collection(cases) => cases.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn iter(&self) -> impl Iterator<Item = &TestCase> {
        match self {
            DocumentShape::Single(case) => std::slice::from_ref(case).iter(),
            DocumentShape::Collection(cases) => cases.iter(),
        }
    }

    pub fn contains(&self, id: &CaseId) -> bool {
        self.iter().any(|case| &case.id == id)
    }

    /// Append a case, promoting a single-object file to a collection.
    pub fn push(self, case: TestCase) -> DocumentShape {
        match self {
            DocumentShape::Single(existing) => DocumentShape::Collection(vec![existing, case]),
            DocumentShape::Collection(mut cases) => {
                cases.push(case);
                DocumentShape::Collection(cases)
            }
        }
    }

    /// Replace the case matching `id` in place. Returns false when absent.
    pub fn replace(&mut self, id: &CaseId, replacement: TestCase) -> bool {
        match self {
            DocumentShape::Single(case) => {
                if &case.id == id {
                    *case = replacement;
                    true
                } else {
                    false
                }
            }
            DocumentShape::Collection(cases) => {
                if let Some(slot) = cases.iter_mut().find(|case| &case.id == id) {
                    *slot = replacement;
                    true
                } else {
                    false
                }
            }
        }
    }

    /// Remove the case matching `id`.
    ///
    /// Returns the remaining shape and whether anything was removed.
    /// `None` means the file would hold zero cases and must be deleted.
    pub fn remove(self, id: &CaseId) -> (Option<DocumentShape>, bool) {
        match self {
            DocumentShape::Single(case) => {
                if &case.id == id {
                    (None, true)
                } else {
                    (Some(DocumentShape::Single(case)), false)
                }
            }
            DocumentShape::Collection(cases) => {
                let before = cases.len();
                let remaining: Vec<TestCase> =
                    cases.into_iter().filter(|case| &case.id != id).collect();
                let removed = remaining.len() < before;
                if remaining.is_empty() {
                    (None, removed)
                } else {
                    (Some(DocumentShape::Collection(remaining)), removed)
                }
            }
        }
    }
}
