use std::{
    io,
    path::{Path, PathBuf},
};

use compio::fs;
use snafu::prelude::*;
use tracing::{debug, error, info, trace};
use walkdir::WalkDir;

use crate::changes::{ChangeSetProvider, ChangedFileSet};
use crate::config::ExportConfig;
use crate::ext::PathExt;
use crate::filesystem::{
    Classifier, FileRecord, FlattenError, Flattener, FolderStructure, StructureBuilder,
    TreeWalker, WalkEntry, WalkError, render,
};

pub const ALL_FILES_DIR: &str = "all_files";
pub const CHANGED_FILES_DIR: &str = "changed_files";
pub const STRUCTURE_FILE_NAME: &str = "folder-structure.txt";

/// What a successful run produced.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GenerationSummary {
    pub directories: usize,
    pub files_copied: usize,
    pub changed_files_copied: usize,
    pub files_skipped: usize,
    pub report_path: PathBuf,
}

/// Snapshots a source tree into flat `all_files`/`changed_files` folders
/// plus a folder structure report.
pub struct PackageGenerator<P> {
    classifier: Classifier,
    change_set_provider: P,
}

impl<P: ChangeSetProvider> PackageGenerator<P> {
    pub fn new(config: &ExportConfig, change_set_provider: P) -> Self {
        Self {
            classifier: Classifier::from(config),
            change_set_provider,
        }
    }

    /// Runs one export. Every step is awaited before the next starts; a
    /// failure leaves whatever was already written in place.
    ///
    /// With `clear_output` the output directory is emptied first, removing
    /// anything unrelated that was in it.
    pub async fn generate(
        &self,
        source: &Path,
        output: &Path,
        clear_output: bool,
    ) -> Result<GenerationSummary, GenerateError> {
        info!(
            "Generating package from {} into {}",
            source.best_effort_path_display(),
            output.best_effort_path_display()
        );

        if clear_output {
            clear_output_folder(source, output).await?;
        }

        let all_files_dir = output.join(ALL_FILES_DIR);
        let changed_files_dir = output.join(CHANGED_FILES_DIR);
        ensure_dir(&all_files_dir).await?;
        ensure_dir(&changed_files_dir).await?;

        let changed_files = self.change_set_provider.changed_files(source).await;
        if changed_files.is_empty() {
            info!("No changed files reported, changed_files/ stays empty");
        } else {
            debug!("{} files reported as changed", changed_files.len());
        }

        let flattener = Flattener::new(all_files_dir, changed_files_dir);
        let (structure, mut summary) = self
            .copy_files(source, output, &flattener, &changed_files)
            .await?;

        summary.report_path = write_structure_file(&structure, output).await?;
        info!(
            "Copied {} files ({} changed) from {} directories",
            summary.files_copied, summary.changed_files_copied, summary.directories
        );

        Ok(summary)
    }

    async fn copy_files(
        &self,
        source: &Path,
        output: &Path,
        flattener: &Flattener,
        changed_files: &ChangedFileSet,
    ) -> Result<(FolderStructure, GenerationSummary), GenerateError> {
        let mut walker = TreeWalker::new(source)
            .inspect_err(|e| error!("Error copying files: {e}"))
            .context(WalkSnafu)?;
        if let Some(nested_output) = relative_inside(output, source) {
            debug!(
                "Output lies inside the source, skipping {}",
                output.best_effort_path_display()
            );
            walker = if nested_output.as_os_str().is_empty() {
                walker.exclude(ALL_FILES_DIR).exclude(CHANGED_FILES_DIR)
            } else {
                walker.exclude(nested_output)
            };
        }

        let mut builder = StructureBuilder::new();
        let mut summary = GenerationSummary::default();

        for entry in walker {
            let entry = entry
                .inspect_err(|e| error!("Error copying files: {e}"))
                .context(WalkSnafu)?;
            trace!("Visiting {}", entry.relative_path().display());

            match entry {
                WalkEntry::Directory { relative_path, .. } => {
                    builder.enter_directory(&relative_path);
                    summary.directories += 1;
                }
                WalkEntry::File {
                    path,
                    relative_path,
                    name,
                    extension,
                } => {
                    if !self.classifier.qualifies(&name, extension.as_deref()) {
                        summary.files_skipped += 1;
                        continue;
                    }

                    let changed = self.classifier.is_changed(&relative_path, changed_files);
                    let flat_name = flattener
                        .copy(&path, &relative_path, changed)
                        .await
                        .inspect_err(|e| error!("Error copying files: {e}"))
                        .context(CopySnafu)?;

                    let parent = relative_path.parent().unwrap_or(Path::new(""));
                    builder.add_file(parent, FileRecord { name, changed });

                    summary.files_copied += 1;
                    if changed {
                        summary.changed_files_copied += 1;
                    }
                    debug!(
                        "Copied file: {} as {}{}",
                        relative_path.display(),
                        flat_name,
                        if changed { " (changed)" } else { "" }
                    );
                }
            }
        }

        Ok((builder.finish(), summary))
    }
}

async fn clear_output_folder(source: &Path, output: &Path) -> Result<(), GenerateError> {
    ensure!(
        relative_inside(source, output).is_none(),
        SourceInsideOutputSnafu {
            source_dir: source.best_effort_path_display(),
            output_dir: output.best_effort_path_display(),
        }
    );

    empty_dir(output)
        .await
        .inspect_err(|e| error!("Error clearing output folder: {e}"))
        .context(ClearOutputSnafu {
            path: output.best_effort_path_display(),
        })?;
    debug!("Cleared output folder: {}", output.best_effort_path_display());
    Ok(())
}

/// Removes everything inside `dir`, creating it when it does not exist.
async fn empty_dir(dir: &Path) -> io::Result<()> {
    match fs::metadata(dir).await {
        Err(e) if e.kind() == io::ErrorKind::NotFound => return fs::create_dir_all(dir).await,
        Err(e) => return Err(e),
        Ok(_) => {}
    }

    // Contents come before the directory holding them
    let entries = WalkDir::new(dir)
        .min_depth(1)
        .follow_links(false)
        .contents_first(true);
    for entry in entries {
        let entry = entry?;
        if entry.file_type().is_dir() {
            fs::remove_dir(entry.path()).await?;
        } else {
            fs::remove_file(entry.path()).await?;
        }
    }
    Ok(())
}

async fn ensure_dir(dir: &Path) -> Result<(), GenerateError> {
    fs::create_dir_all(dir)
        .await
        .inspect_err(|e| error!("Error creating {}: {e}", dir.display()))
        .context(CreateDirSnafu {
            path: dir.best_effort_path_display(),
        })
}

async fn write_structure_file(
    structure: &FolderStructure,
    output: &Path,
) -> Result<PathBuf, GenerateError> {
    let structure_file_path = output.join(STRUCTURE_FILE_NAME);
    let content = render(structure);

    fs::write(&structure_file_path, content.into_bytes())
        .await
        .0
        .inspect_err(|e| error!("Error generating folder structure file: {e}"))
        .context(WriteReportSnafu {
            path: structure_file_path.best_effort_path_display(),
        })?;

    debug!(
        "Generated folder structure file: {}",
        structure_file_path.best_effort_path_display()
    );
    Ok(structure_file_path)
}

/// `inner` relative to `outer` when `inner` is `outer` or lies below it.
/// Paths that cannot be canonicalized (e.g. do not exist yet) are never inside.
fn relative_inside(inner: &Path, outer: &Path) -> Option<PathBuf> {
    let inner = inner.canonicalize().ok()?;
    let outer = outer.canonicalize().ok()?;
    inner.strip_prefix(&outer).ok().map(Path::to_path_buf)
}

#[derive(Debug, Snafu)]
pub enum GenerateError {
    #[snafu(display("Refusing to clear {}: it contains the source {}", output_dir, source_dir))]
    SourceInsideOutput {
        source_dir: String,
        output_dir: String,
    },
    #[snafu(display("Failed to clear output folder {}", path))]
    ClearOutputError { path: String, source: io::Error },
    #[snafu(display("Failed to create directory {}", path))]
    CreateDirError { path: String, source: io::Error },
    #[snafu(display("Failed to walk the source directory"))]
    WalkError { source: WalkError },
    #[snafu(display("Failed to copy a source file"))]
    CopyError { source: FlattenError },
    #[snafu(display("Failed to write the folder structure file {}", path))]
    WriteReportError { path: String, source: io::Error },
}
