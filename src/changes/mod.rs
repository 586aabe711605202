//! Change detection: which files version control reports as modified.

mod change_set;
mod git_status;

pub use change_set::{ChangeSetProvider, ChangedFileSet, StaticChangeSet};
pub use git_status::GitStatusProvider;
