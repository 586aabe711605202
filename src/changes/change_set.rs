use std::{collections::HashSet, path::Path};

use derive_more::{From, IntoIterator};

/// Paths relative to the scanned root, `/`-separated, that version control
/// reports as added, modified, deleted or untracked.
#[derive(Debug, Clone, Default, PartialEq, Eq, From, IntoIterator)]
pub struct ChangedFileSet(HashSet<String>);

impl ChangedFileSet {
    pub fn contains(&self, relative_path: &str) -> bool {
        self.0.contains(relative_path)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<S: Into<String>> FromIterator<S> for ChangedFileSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self(iter.into_iter().map(Into::into).collect())
    }
}

/// Source of the change set for a directory.
///
/// Implementations must not fail: any internal problem is logged and reported
/// as an empty set so the export degrades to "nothing changed".
pub trait ChangeSetProvider {
    async fn changed_files(&self, repo_path: &Path) -> ChangedFileSet;
}

/// A change set known up front.
#[derive(Debug, Clone, Default, From)]
pub struct StaticChangeSet(ChangedFileSet);

impl ChangeSetProvider for StaticChangeSet {
    async fn changed_files(&self, _repo_path: &Path) -> ChangedFileSet {
        self.0.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn changed_file_set_collects_from_strs() {
        let set: ChangedFileSet = ["a.ts", "sub/b.ts"].into_iter().collect();
        assert_eq!(set.len(), 2);
        assert!(set.contains("sub/b.ts"));
        assert!(!set.contains("b.ts"));
    }

    #[compio::test]
    async fn static_change_set_ignores_repo_path() {
        let provider = StaticChangeSet::from(ChangedFileSet::from_iter(["f1.ts"]));
        let changed = provider.changed_files(Path::new("/anywhere")).await;
        assert!(changed.contains("f1.ts"));
    }
}
