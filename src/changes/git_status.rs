use std::{path::Path, process::Stdio};

use compio::process::Command;
use snafu::{ResultExt, Snafu};
use tracing::{debug, error};

use crate::ext::PathExt;

use super::{ChangeSetProvider, ChangedFileSet};

const DEFAULT_GIT_PROGRAM: &str = "git";

/// Reads the change set from `git status` run in the scanned directory.
///
/// Git reports paths relative to the repository top level, so they are
/// rebased onto the scanned directory using `git rev-parse --show-prefix`.
#[derive(Debug, Clone)]
pub struct GitStatusProvider {
    program: String,
}

impl Default for GitStatusProvider {
    fn default() -> Self {
        Self::with_program(DEFAULT_GIT_PROGRAM)
    }
}

impl ChangeSetProvider for GitStatusProvider {
    async fn changed_files(&self, repo_path: &Path) -> ChangedFileSet {
        match self.query(repo_path).await {
            Ok(changed) => {
                debug!(
                    "git reports {} changed files under {}",
                    changed.len(),
                    repo_path.best_effort_path_display()
                );
                changed
            }
            Err(e) => {
                error!("Error getting changed files: {e}");
                ChangedFileSet::default()
            }
        }
    }
}

impl GitStatusProvider {
    pub fn with_program(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }

    async fn query(&self, repo_path: &Path) -> Result<ChangedFileSet, GitStatusError> {
        let prefix = self.run(repo_path, &["rev-parse", "--show-prefix"]).await?;
        let status = self
            .run(
                repo_path,
                &["status", "--porcelain=v1", "-z", "--untracked-files=all"],
            )
            .await?;

        Ok(parse_porcelain(&status, prefix.trim_end()))
    }

    /// Runs git in `repo_path` and returns its stdout
    async fn run(&self, repo_path: &Path, args: &[&str]) -> Result<String, GitStatusError> {
        let command_line = format!("{} {}", self.program, args.join(" "));
        debug!(
            "Running '{}' in {}",
            command_line,
            repo_path.best_effort_path_display()
        );

        let mut cmd = Command::new(&self.program);
        cmd.arg("-C");
        cmd.arg(repo_path);
        cmd.args(args);
        let _ = cmd.stdout(Stdio::piped());
        let _ = cmd.stderr(Stdio::piped());

        let output = cmd.output().await.context(SpawnSnafu {
            command: command_line.clone(),
        })?;

        if !output.status.success() {
            return Err(GitStatusError::UnsuccessfulExecution {
                command: command_line,
                status: output.status.code().unwrap_or(-1),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        String::from_utf8(output.stdout).context(OutputEncodingSnafu {
            command: command_line,
        })
    }
}

/// Parses `git status --porcelain=v1 -z` output.
///
/// Each record is `XY <path>`; rename and copy records (in either column)
/// are followed by an extra field holding the original path, which is
/// skipped. Only paths below `prefix` (the scanned directory relative to the
/// top level, with a trailing `/` or empty) are kept, with the prefix removed.
pub fn parse_porcelain(output: &str, prefix: &str) -> ChangedFileSet {
    let mut fields = output.split('\0').filter(|field| !field.is_empty());
    let mut changed = Vec::new();

    while let Some(record) = fields.next() {
        let Some((status, path)) = record.split_at_checked(3) else {
            debug!("Skipping malformed status record: {:?}", record);
            continue;
        };

        if status.chars().take(2).any(|column| matches!(column, 'R' | 'C')) {
            fields.next();
        }

        match path.strip_prefix(prefix) {
            Some(relative) if !relative.is_empty() => changed.push(relative.to_string()),
            _ => debug!("Ignoring change outside of scanned directory: {}", path),
        }
    }

    changed.into_iter().collect()
}

#[derive(Debug, Snafu)]
pub enum GitStatusError {
    #[snafu(display("Failed to spawn '{}'", command))]
    SpawnError {
        command: String,
        source: std::io::Error,
    },
    #[snafu(display("'{}' failed with exit code {}: {}", command, status, stderr))]
    UnsuccessfulExecution {
        command: String,
        status: i32,
        stderr: String,
    },
    #[snafu(display("'{}' produced output that is not valid UTF-8", command))]
    OutputEncodingError {
        command: String,
        source: std::string::FromUtf8Error,
    },
}
