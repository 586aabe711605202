use std::{
    ffi::OsStr,
    fs,
    path::{Path, PathBuf},
};

use snafu::{ResultExt, Snafu};
use walkdir::WalkDir;

use crate::ext::PathExt;

/// An item produced by [`TreeWalker`].
///
/// `relative_path` is always relative to the root the walk started from,
/// never to the directory currently being read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WalkEntry {
    Directory {
        relative_path: PathBuf,
    },
    File {
        path: PathBuf,
        relative_path: PathBuf,
        name: String,
        extension: Option<String>,
    },
}

impl WalkEntry {
    pub fn relative_path(&self) -> &Path {
        match self {
            WalkEntry::Directory { relative_path, .. } => relative_path,
            WalkEntry::File { relative_path, .. } => relative_path,
        }
    }
}

/// Lazy depth-first, pre-order walk over a directory tree.
///
/// Entries are produced in directory-read order. When a directory entry is
/// produced, the walk descends into it before reading the next sibling.
/// Symbolic links are reported as files and never followed.
pub struct TreeWalker {
    root: PathBuf,
    entries: walkdir::IntoIter,
    excluded: Vec<PathBuf>,
}

impl TreeWalker {
    /// Opens the root directory. Fails right away if it cannot be listed.
    pub fn new(root: impl Into<PathBuf>) -> Result<Self, WalkError> {
        let root = root.into();
        fs::read_dir(&root).context(ReadRootSnafu {
            path: root.best_effort_path_display(),
        })?;

        let entries = WalkDir::new(&root)
            .min_depth(1)
            .follow_links(false)
            .into_iter();

        Ok(Self {
            root,
            entries,
            excluded: Vec::new(),
        })
    }

    /// Skips the entry at `relative_path` (and everything below it) entirely.
    pub fn exclude(mut self, relative_path: impl Into<PathBuf>) -> Self {
        self.excluded.push(relative_path.into());
        self
    }

    fn visit(&self, entry: walkdir::DirEntry) -> Result<WalkEntry, WalkError> {
        let relative_path = self.relative_path_of(entry.path())?;

        if entry.file_type().is_dir() {
            return Ok(WalkEntry::Directory { relative_path });
        }

        Ok(WalkEntry::File {
            extension: extension_of(entry.file_name()),
            name: entry.file_name().to_string_lossy().into_owned(),
            path: entry.into_path(),
            relative_path,
        })
    }

    fn relative_path_of(&self, path: &Path) -> Result<PathBuf, WalkError> {
        path.strip_prefix(&self.root)
            .map(Path::to_path_buf)
            .context(OutsideRootSnafu {
                path: path.best_effort_path_display(),
            })
    }
}

impl Iterator for TreeWalker {
    type Item = Result<WalkEntry, WalkError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let entry = match self.entries.next()? {
                Ok(entry) => entry,
                Err(source) => {
                    let path = source
                        .path()
                        .unwrap_or(self.root.as_path())
                        .best_effort_path_display();
                    return Some(Err(WalkError::TraverseError { path, source }));
                }
            };

            let excluded = entry
                .path()
                .strip_prefix(&self.root)
                .is_ok_and(|relative| self.excluded.iter().any(|e| e == relative));
            if excluded {
                if entry.file_type().is_dir() {
                    self.entries.skip_current_dir();
                }
                continue;
            }

            return Some(self.visit(entry));
        }
    }
}

/// Text after the last dot, ignoring the leading dot of hidden files.
fn extension_of(file_name: &OsStr) -> Option<String> {
    Path::new(file_name)
        .extension()
        .map(|ext| ext.to_string_lossy().into_owned())
}

#[derive(Debug, Snafu)]
pub enum WalkError {
    #[snafu(display("Failed to read directory {}", path))]
    ReadRootError {
        path: String,
        source: std::io::Error,
    },
    #[snafu(display("Failed to walk {}", path))]
    TraverseError {
        path: String,
        source: walkdir::Error,
    },
    #[snafu(display("{} is not below the walk root", path))]
    OutsideRootError {
        path: String,
        source: std::path::StripPrefixError,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use tempfile::TempDir;

    fn collect_relative(root: &Path) -> Vec<(PathBuf, bool)> {
        TreeWalker::new(root)
            .expect("Failed to open walker")
            .map(|entry| entry.expect("Walk failed"))
            .map(|entry| {
                let is_dir = matches!(entry, WalkEntry::Directory { .. });
                (entry.relative_path().to_path_buf(), is_dir)
            })
            .collect()
    }

    #[test]
    fn walker_fails_on_missing_root() {
        let result = TreeWalker::new("/this/path/does/not/exist");
        assert!(matches!(result, Err(WalkError::ReadRootError { .. })));
    }

    #[test]
    fn walker_fails_when_root_is_a_file() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let file = temp_dir.path().join("plain.ts");
        fs::write(&file, "x").unwrap();

        assert!(TreeWalker::new(&file).is_err());
    }

    #[test]
    fn walker_on_empty_directory_yields_nothing() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        assert!(collect_relative(temp_dir.path()).is_empty());
    }

    #[test]
    fn walker_yields_relative_paths_from_top_level_root() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let root = temp_dir.path();
        fs::create_dir_all(root.join("a/b")).unwrap();
        fs::write(root.join("a/b/deep.ts"), "deep").unwrap();
        fs::write(root.join("top.ts"), "top").unwrap();

        let mut entries = collect_relative(root);
        entries.sort();

        assert_eq!(
            entries,
            vec![
                (PathBuf::from("a"), true),
                (PathBuf::from("a/b"), true),
                (PathBuf::from("a/b/deep.ts"), false),
                (PathBuf::from("top.ts"), false),
            ]
        );
    }

    #[test]
    fn walker_descends_before_reading_next_sibling() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let root = temp_dir.path();
        for dir in ["one", "two"] {
            fs::create_dir_all(root.join(dir).join("inner")).unwrap();
            fs::write(root.join(dir).join("inner/file.ts"), dir).unwrap();
        }

        let entries = collect_relative(root);
        assert_eq!(entries.len(), 6);

        // Every entry's parent directory was produced right before its subtree
        for (index, (path, _)) in entries.iter().enumerate() {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                let parent_index = entries
                    .iter()
                    .position(|(p, _)| p == parent)
                    .expect("Parent directory was not yielded");
                assert!(parent_index < index);
                assert!(
                    entries[parent_index..index]
                        .iter()
                        .all(|(p, _)| p.starts_with(parent)),
                    "Subtree of {} was interleaved with a sibling",
                    parent.display()
                );
            }
        }
    }

    #[test]
    fn walker_reports_file_name_and_extension() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        fs::write(temp_dir.path().join("app.component.ts"), "").unwrap();

        let entry = TreeWalker::new(temp_dir.path())
            .unwrap()
            .next()
            .unwrap()
            .unwrap();

        match entry {
            WalkEntry::File {
                name, extension, ..
            } => {
                assert_eq!(name, "app.component.ts");
                assert_eq!(extension.as_deref(), Some("ts"));
            }
            other => panic!("Expected a file, got {other:?}"),
        }
    }

    #[test]
    fn walker_skips_excluded_subtree() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let root = temp_dir.path();
        fs::create_dir_all(root.join("out/all_files")).unwrap();
        fs::write(root.join("out/all_files/copy.ts"), "copy").unwrap();
        fs::write(root.join("kept.ts"), "kept").unwrap();

        let entries: Vec<PathBuf> = TreeWalker::new(root)
            .unwrap()
            .exclude("out")
            .map(|entry| entry.unwrap().relative_path().to_path_buf())
            .collect();

        assert_eq!(entries, vec![PathBuf::from("kept.ts")]);
    }

    #[rstest]
    #[case("main.ts", Some("ts"))]
    #[case("style.scss", Some("scss"))]
    #[case("a.spec.ts", Some("ts"))]
    #[case(".gitignore", None)]
    #[case("Makefile", None)]
    fn extension_ignores_leading_dot(#[case] name: &str, #[case] expected: Option<&str>) {
        assert_eq!(extension_of(OsStr::new(name)).as_deref(), expected);
    }

    #[cfg(unix)]
    #[test]
    fn walker_reports_directory_symlinks_as_files() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let root = temp_dir.path();
        fs::create_dir(root.join("real")).unwrap();
        fs::write(root.join("real/inside.ts"), "inside").unwrap();
        std::os::unix::fs::symlink(root.join("real"), root.join("link.ts")).unwrap();

        let mut entries = collect_relative(root);
        entries.sort();

        assert_eq!(
            entries,
            vec![
                (PathBuf::from("link.ts"), false),
                (PathBuf::from("real"), true),
                (PathBuf::from("real/inside.ts"), false),
            ]
        );
    }

    #[cfg(unix)]
    #[test]
    fn walker_yields_error_for_unreadable_subdirectory() {
        use std::os::unix::fs::PermissionsExt;

        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let locked = temp_dir.path().join("locked");
        fs::create_dir(&locked).unwrap();
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o000)).unwrap();
        // Privileged users can list the directory anyway
        let readable = fs::read_dir(&locked).is_ok();

        let results: Vec<_> = TreeWalker::new(temp_dir.path()).unwrap().collect();
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();

        if !readable {
            assert!(
                results
                    .iter()
                    .any(|r| matches!(r, Err(WalkError::TraverseError { .. })))
            );
        }
    }
}
