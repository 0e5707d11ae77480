//! Single-file document IO and shape reconciliation.

mod mutator;
mod shape;

pub use mutator::{append_case, load, remove_case, replace_case, save};
pub use shape::DocumentShape;
