use std::path::{Component, Path};

use hashlink::{LinkedHashMap, linked_hash_map::Entry};

/// Key under which a directory's own files are listed, next to its
/// subdirectories. No directory entry can be named `.`, so file lists and
/// subdirectories never overwrite each other.
pub const OWN_FILES_KEY: &str = ".";

/// A qualifying file as it appears in the structure report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileRecord {
    pub name: String,
    pub changed: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FolderEntry {
    Directory(FolderStructure),
    Files(Vec<FileRecord>),
}

/// Captured directory hierarchy. Keys keep the order they were first inserted in.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FolderStructure {
    entries: LinkedHashMap<String, FolderEntry>,
}

impl FolderStructure {
    pub fn iter(&self) -> impl Iterator<Item = (&String, &FolderEntry)> {
        self.entries.iter()
    }

    fn directory_entry_mut(&mut self, name: String) -> &mut FolderStructure {
        first_insertion(&mut self.entries, name, || {
            FolderEntry::Directory(FolderStructure::default())
        })
        .directory_mut()
    }
}

impl FolderEntry {
    fn directory_mut(&mut self) -> &mut FolderStructure {
        match *self {
            FolderEntry::Directory(ref mut children) => children,
            FolderEntry::Files(_) => {
                *self = FolderEntry::Directory(FolderStructure::default());
                self.directory_mut()
            }
        }
    }
}

/// Like `Entry::or_insert_with`, but an occupied key keeps its position
/// instead of being moved to the back.
fn first_insertion(
    entries: &mut LinkedHashMap<String, FolderEntry>,
    key: String,
    default: impl FnOnce() -> FolderEntry,
) -> &mut FolderEntry {
    match entries.entry(key) {
        Entry::Occupied(occupied) => occupied.into_mut(),
        Entry::Vacant(vacant) => vacant.insert(default()),
    }
}

/// Builds a [`FolderStructure`] from walk events.
///
/// Nodes are addressed by their path relative to the walk root, so the
/// builder never holds on to a reference into the tree between calls.
#[derive(Debug, Default)]
pub struct StructureBuilder {
    root: FolderStructure,
}

impl StructureBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a directory so it shows up in the report even when empty.
    pub fn enter_directory(&mut self, relative_dir: &Path) {
        self.node_mut(relative_dir);
    }

    /// Appends a file to the directory at `relative_parent` (empty for the root).
    pub fn add_file(&mut self, relative_parent: &Path, record: FileRecord) {
        let node = self.node_mut(relative_parent);
        let entry = first_insertion(&mut node.entries, OWN_FILES_KEY.to_string(), || {
            FolderEntry::Files(Vec::new())
        });
        match *entry {
            FolderEntry::Files(ref mut records) => records.push(record),
            FolderEntry::Directory(_) => *entry = FolderEntry::Files(vec![record]),
        }
    }

    pub fn finish(self) -> FolderStructure {
        self.root
    }

    fn node_mut(&mut self, relative_dir: &Path) -> &mut FolderStructure {
        let mut node = &mut self.root;
        for component in relative_dir.components() {
            if let Component::Normal(name) = component {
                node = node.directory_entry_mut(name.to_string_lossy().into_owned());
            }
        }
        node
    }
}
