use std::path::PathBuf;

use clap::Parser;

use crate::application::data::LogLevel;

/// Snapshot a source tree into flat copies of its files plus a folder structure report.
#[derive(Parser, Debug, Clone)]
#[command(version)]
pub struct Cli {
    /// Directory to snapshot
    pub source: PathBuf,

    /// Directory receiving all_files/, changed_files/ and folder-structure.txt
    pub output: PathBuf,

    /// Keep whatever already is in the output directory instead of emptying it
    #[clap(long)]
    pub keep_output: bool,

    /// YAML file overriding the exported extensions and excluded suffixes
    #[clap(long, short)]
    pub config: Option<PathBuf>,

    /// Comma-separated paths, relative to SOURCE, to treat as changed instead of asking git
    #[clap(long, value_delimiter = ',')]
    pub changed: Option<Vec<String>>,

    #[clap(long, short, default_value = "warn", value_enum)]
    pub log_level: LogLevel,
}
