use std::fmt;

use super::structure::{FileRecord, FolderEntry, FolderStructure};

const INDENT: &str = "  ";
const CHANGED_MARKER: &str = " [CHANGED]";

/// Renders the structure report: one `<key>/` line per entry, files indented
/// below their directory line, subdirectories indented one level further.
pub fn render(structure: &FolderStructure) -> String {
    structure.to_string()
}

impl fmt::Display for FileRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)?;
        if self.changed {
            f.write_str(CHANGED_MARKER)?;
        }
        Ok(())
    }
}

impl fmt::Display for FolderStructure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_level(f, self, "")
    }
}

fn write_level(f: &mut fmt::Formatter<'_>, structure: &FolderStructure, indent: &str) -> fmt::Result {
    for (key, entry) in structure.iter() {
        writeln!(f, "{indent}{key}/")?;
        match entry {
            FolderEntry::Files(records) => {
                for record in records {
                    writeln!(f, "{indent}{INDENT}{record}")?;
                }
            }
            FolderEntry::Directory(children) => {
                write_level(f, children, &format!("{indent}{INDENT}"))?;
            }
        }
    }
    Ok(())
}
