//! Walking, classifying and flattening a source tree.
//!
//! The walk produces entries lazily; the generator feeds each one through
//! the classifier, the flattener and the structure builder as it arrives.
//! The finished structure is rendered into the folder report.

mod classifier;
mod flatten;
mod render;
mod structure;
mod walker;

pub use classifier::Classifier;
pub use flatten::{FlattenError, Flattener};
pub use render::render;
pub use structure::{FileRecord, FolderStructure, StructureBuilder};
pub use walker::{TreeWalker, WalkEntry, WalkError};
