use std::path::{Component, Path, PathBuf};

/// Renders a path for log and error messages.
///
/// A path that does not exist yet (an output folder about to be created) is
/// shown below its closest existing ancestor, resolved through symlinks.
pub fn best_effort_path_display(path: &Path) -> String {
    resolve_existing_prefix(path).display().to_string()
}

fn resolve_existing_prefix(path: &Path) -> PathBuf {
    let mut missing = Vec::new();
    let mut current = path;
    loop {
        let probe = if current.as_os_str().is_empty() {
            Path::new(".")
        } else {
            current
        };
        if let Ok(existing) = probe.canonicalize() {
            return missing
                .iter()
                .rev()
                .fold(existing, |resolved, part| resolved.join(part));
        }

        match (current.parent(), current.file_name()) {
            (Some(parent), Some(name)) => {
                missing.push(name);
                current = parent;
            }
            _ => return path.to_path_buf(),
        }
    }
}

/// Joins the normal components of a relative path with `/`, the separator
/// git uses in its status output on every platform.
pub fn to_slash_string(path: &Path) -> String {
    path.components()
        .filter_map(|component| match component {
            Component::Normal(part) => Some(part.to_string_lossy()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("/")
}

pub trait PathExt {
    fn best_effort_path_display(&self) -> String;
    fn to_slash_string(&self) -> String;
}

impl PathExt for Path {
    fn best_effort_path_display(&self) -> String {
        best_effort_path_display(self)
    }

    fn to_slash_string(&self) -> String {
        to_slash_string(self)
    }
}

impl PathExt for PathBuf {
    fn best_effort_path_display(&self) -> String {
        best_effort_path_display(self)
    }

    fn to_slash_string(&self) -> String {
        to_slash_string(self)
    }
}
