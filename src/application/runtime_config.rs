use std::path::PathBuf;

use crate::cli::Cli;

#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    pub source: PathBuf,
    pub output: PathBuf,
    pub clear_output: bool,
    pub config: Option<PathBuf>,
    /// Replaces the git status query when set
    pub changed_files: Option<Vec<String>>,
}

impl From<Cli> for RuntimeConfig {
    fn from(cli: Cli) -> Self {
        Self {
            source: cli.source,
            output: cli.output,
            clear_output: !cli.keep_output,
            config: cli.config,
            changed_files: cli.changed,
        }
    }
}
