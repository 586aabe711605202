use std::{collections::HashSet, path::Path};

use crate::changes::ChangedFileSet;
use crate::config::ExportConfig;
use crate::ext::PathExt;

/// Decides which files are exported and which of them count as changed.
#[derive(Debug, Clone)]
pub struct Classifier {
    extensions: HashSet<String>,
    excluded_suffixes: Vec<String>,
}

impl From<&ExportConfig> for Classifier {
    fn from(config: &ExportConfig) -> Self {
        Self {
            extensions: config.extensions.iter().cloned().collect(),
            excluded_suffixes: config.excluded_suffixes.clone(),
        }
    }
}

impl Classifier {
    pub fn qualifies(&self, name: &str, extension: Option<&str>) -> bool {
        let allowed = extension.is_some_and(|ext| self.extensions.contains(ext));
        allowed
            && !self
                .excluded_suffixes
                .iter()
                .any(|suffix| name.ends_with(suffix.as_str()))
    }

    /// `relative_path` must be relative to the root the change set was queried for.
    pub fn is_changed(&self, relative_path: &Path, changed_files: &ChangedFileSet) -> bool {
        changed_files.contains(&relative_path.to_slash_string())
    }
}
