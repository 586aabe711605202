use std::path::{Path, PathBuf};

use compio::fs;
use derive_more::Display;
use snafu::{ResultExt, Snafu};

use crate::ext::PathExt;

/// A file name with no directory separators, unique only up to collisions.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Display)]
pub struct FlatName(String);

impl FlatName {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Replaces every `/` and `\` in a relative path with `_`.
///
/// `a/x.ts` and `a_x.ts` flatten to the same name; whichever is copied last wins.
pub fn flatten(relative_path: &Path) -> FlatName {
    let flat = relative_path
        .to_string_lossy()
        .chars()
        .map(|c| if c == '/' || c == '\\' { '_' } else { c })
        .collect();
    FlatName(flat)
}

/// Copies files into the flat `all_files` and `changed_files` folders.
#[derive(Debug, Clone)]
pub struct Flattener {
    all_files_dir: PathBuf,
    changed_files_dir: PathBuf,
}

impl Flattener {
    pub fn new(all_files_dir: impl Into<PathBuf>, changed_files_dir: impl Into<PathBuf>) -> Self {
        Self {
            all_files_dir: all_files_dir.into(),
            changed_files_dir: changed_files_dir.into(),
        }
    }

    /// Copies `source` into the all-files folder, and into the changed-files
    /// folder as well when `changed` is set. Existing files are overwritten.
    pub async fn copy(
        &self,
        source: &Path,
        relative_path: &Path,
        changed: bool,
    ) -> Result<FlatName, FlattenError> {
        let flat_name = flatten(relative_path);

        let bytes = fs::read(source).await.context(ReadSnafu {
            path: source.best_effort_path_display(),
        })?;

        let all_files_dest = self.all_files_dir.join(flat_name.as_str());
        let written = fs::write(&all_files_dest, bytes).await;
        written.0.context(WriteSnafu {
            path: all_files_dest.best_effort_path_display(),
        })?;

        if changed {
            let changed_files_dest = self.changed_files_dir.join(flat_name.as_str());
            fs::write(&changed_files_dest, written.1)
                .await
                .0
                .context(WriteSnafu {
                    path: changed_files_dest.best_effort_path_display(),
                })?;
        }

        Ok(flat_name)
    }
}

#[derive(Debug, Snafu)]
pub enum FlattenError {
    #[snafu(display("Failed to read source file {}", path))]
    ReadError {
        path: String,
        source: std::io::Error,
    },
    #[snafu(display("Failed to write {}", path))]
    WriteError {
        path: String,
        source: std::io::Error,
    },
}
