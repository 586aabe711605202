use colored::Colorize;
use snafu::Snafu;
use snafu::prelude::*;
use supports_color::Stream;
use tracing::debug;

use crate::application::RuntimeConfig;
use crate::changes::{ChangedFileSet, GitStatusProvider, StaticChangeSet};
use crate::config::{ExportConfig, ExportConfigError};
use crate::package::{GenerateError, GenerationSummary, PackageGenerator};

const SUCCESS_MESSAGE: &str = "Package generated successfully";

pub struct Application;

impl Application {
    pub async fn run(app_config: impl Into<RuntimeConfig>) -> Result<(), ApplicationError> {
        let app_config: RuntimeConfig = app_config.into();

        let export_config = match &app_config.config {
            Some(path) => ExportConfig::from_path(path).await.context(ConfigSnafu)?,
            None => ExportConfig::default(),
        };
        debug!("Loaded config: {:?}", export_config);

        let (source, output) = (&app_config.source, &app_config.output);
        let summary = match &app_config.changed_files {
            Some(changed_files) => {
                let changed: ChangedFileSet = changed_files.iter().map(String::as_str).collect();
                PackageGenerator::new(&export_config, StaticChangeSet::from(changed))
                    .generate(source, output, app_config.clear_output)
                    .await
            }
            None => {
                PackageGenerator::new(&export_config, GitStatusProvider::default())
                    .generate(source, output, app_config.clear_output)
                    .await
            }
        }
        .context(GenerationSnafu)?;

        print_summary(&summary);
        Ok(())
    }
}

fn print_summary(summary: &GenerationSummary) {
    let details = format!(
        "{} files copied, {} changed, structure written to {}",
        summary.files_copied,
        summary.changed_files_copied,
        summary.report_path.display()
    );

    if supports_color::on(Stream::Stdout).is_some() {
        println!("{} ({})", SUCCESS_MESSAGE.green().bold(), details.dimmed());
    } else {
        println!("{SUCCESS_MESSAGE} ({details})");
    }
}

#[derive(Debug, Snafu)]
pub enum ApplicationError {
    #[snafu(display("Critical failure encountered while loading the export config"))]
    ConfigError { source: ExportConfigError },
    #[snafu(display("Critical failure encountered while generating the package"))]
    GenerationError { source: GenerateError },
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;
    use tempfile::TempDir;

    fn runtime_config(source: &Path, output: &Path, config: Option<&Path>) -> RuntimeConfig {
        RuntimeConfig {
            source: source.to_path_buf(),
            output: output.to_path_buf(),
            clear_output: true,
            config: config.map(Path::to_path_buf),
            changed_files: None,
        }
    }

    #[compio::test]
    async fn run_generates_package_with_default_config() {
        let temp = TempDir::new().expect("Failed to create temp directory");
        let source = temp.path().join("source");
        let output = temp.path().join("output");
        std::fs::create_dir_all(&source).unwrap();
        std::fs::write(source.join("index.html"), "<html></html>").unwrap();

        Application::run(runtime_config(&source, &output, None))
            .await
            .expect("Run failed");

        assert!(output.join("all_files/index.html").exists());
        assert!(output.join("folder-structure.txt").exists());
    }

    #[compio::test]
    async fn run_fails_on_missing_config_file() {
        let temp = TempDir::new().expect("Failed to create temp directory");
        let missing = temp.path().join("missing.yaml");

        let result = Application::run(runtime_config(temp.path(), temp.path(), Some(&missing))).await;

        assert!(matches!(result, Err(ApplicationError::ConfigError { .. })));
    }

    #[compio::test]
    async fn run_uses_extensions_from_config_file() {
        let temp = TempDir::new().expect("Failed to create temp directory");
        let source = temp.path().join("source");
        let output = temp.path().join("output");
        let config = temp.path().join("treepack.yaml");
        std::fs::create_dir_all(&source).unwrap();
        std::fs::write(source.join("notes.md"), "notes").unwrap();
        std::fs::write(source.join("main.ts"), "main").unwrap();
        std::fs::write(&config, "extensions: [md]\n").unwrap();

        Application::run(runtime_config(&source, &output, Some(&config)))
            .await
            .expect("Run failed");

        assert!(output.join("all_files/notes.md").exists());
        assert!(!output.join("all_files/main.ts").exists());
    }

    #[compio::test]
    async fn run_uses_explicit_change_list() {
        let temp = TempDir::new().expect("Failed to create temp directory");
        let source = temp.path().join("source");
        let output = temp.path().join("output");
        std::fs::create_dir_all(source.join("sub")).unwrap();
        std::fs::write(source.join("sub/a.ts"), "a").unwrap();
        std::fs::write(source.join("b.ts"), "b").unwrap();

        let mut config = runtime_config(&source, &output, None);
        config.changed_files = Some(vec!["sub/a.ts".to_string()]);
        Application::run(config).await.expect("Run failed");

        assert!(output.join("changed_files/sub_a.ts").exists());
        assert!(!output.join("changed_files/b.ts").exists());
    }

    #[compio::test]
    async fn run_reports_generation_failure() {
        let temp = TempDir::new().expect("Failed to create temp directory");
        let source = temp.path().join("missing");
        let output = temp.path().join("output");

        let result = Application::run(runtime_config(&source, &output, None)).await;

        assert!(matches!(
            result,
            Err(ApplicationError::GenerationError { .. })
        ));
    }
}
