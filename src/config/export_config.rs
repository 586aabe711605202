use std::{borrow::Cow, path::Path};

use compio::fs;
use hashlink::LinkedHashMap;
use saphyr::{LoadableYamlNode, Scalar, Yaml};
use snafu::prelude::*;
use tracing::debug;

use crate::ext::PathExt;

const DEFAULT_EXTENSIONS: [&str; 3] = ["ts", "scss", "html"];
const DEFAULT_EXCLUDED_SUFFIXES: [&str; 1] = [".spec.ts"];

const EXTENSIONS_KEY: &str = "extensions";
const EXCLUDED_SUFFIXES_KEY: &str = "excludedSuffixes";

/// Which files end up in the package.
///
/// Extensions are stored without their leading dot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportConfig {
    pub extensions: Vec<String>,
    pub excluded_suffixes: Vec<String>,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            extensions: DEFAULT_EXTENSIONS.iter().map(|e| e.to_string()).collect(),
            excluded_suffixes: DEFAULT_EXCLUDED_SUFFIXES
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }
}

impl ExportConfig {
    #[cfg(test)]
    pub fn new(
        extensions: impl IntoIterator<Item = impl Into<String>>,
        excluded_suffixes: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        Self {
            extensions: extensions
                .into_iter()
                .map(|ext| normalize_extension(ext.into()))
                .collect(),
            excluded_suffixes: excluded_suffixes.into_iter().map(Into::into).collect(),
        }
    }

    pub async fn from_path(path: &Path) -> Result<Self, ExportConfigError> {
        debug!("Reading export config: {}", path.best_effort_path_display());
        let bytes = fs::read(path).await.context(ReadSnafu {
            file_path: path.best_effort_path_display(),
        })?;
        let contents = String::from_utf8(bytes).context(EncodingSnafu {
            file_path: path.best_effort_path_display(),
        })?;
        contents.as_str().try_into()
    }

    fn read_string_list(
        top_level: &LinkedHashMap<Yaml, Yaml>,
        key: &'static str,
    ) -> Result<Option<Vec<String>>, ExportConfigError> {
        let Some(value) = top_level.get(&Yaml::Value(Scalar::String(Cow::Borrowed(key)))) else {
            return Ok(None);
        };

        let sequence = value.as_sequence().context(NotAListSnafu { key })?;
        sequence
            .iter()
            .map(|item| {
                item.as_str()
                    .map(str::to_string)
                    .context(NotAStringSnafu { key })
            })
            .collect::<Result<Vec<_>, _>>()
            .map(Some)
    }
}

impl TryFrom<&str> for ExportConfig {
    type Error = ExportConfigError;

    fn try_from(contents: &str) -> Result<Self, Self::Error> {
        let documents = Yaml::load_from_str(contents).context(ParseSnafu)?;
        let mut config = ExportConfig::default();

        // A file holding nothing but comments keeps every default
        let Some(document) = documents.first() else {
            return Ok(config);
        };

        let top_level = document
            .as_mapping()
            .ok_or(ExportConfigError::TopLevelNotMap)?;

        if let Some(extensions) = Self::read_string_list(top_level, EXTENSIONS_KEY)? {
            config.extensions = extensions.into_iter().map(normalize_extension).collect();
        }
        if let Some(suffixes) = Self::read_string_list(top_level, EXCLUDED_SUFFIXES_KEY)? {
            config.excluded_suffixes = suffixes;
        }

        // An empty suffix would match every file name
        ensure!(
            !config.extensions.iter().any(String::is_empty),
            EmptyItemSnafu {
                key: EXTENSIONS_KEY
            }
        );
        ensure!(
            !config.excluded_suffixes.iter().any(String::is_empty),
            EmptyItemSnafu {
                key: EXCLUDED_SUFFIXES_KEY
            }
        );

        debug!("Parsed export config: {:?}", config);
        Ok(config)
    }
}

fn normalize_extension(extension: String) -> String {
    match extension.strip_prefix('.') {
        Some(stripped) => stripped.to_string(),
        None => extension,
    }
}

#[derive(Debug, Snafu)]
pub enum ExportConfigError {
    #[snafu(display("Failed to read the config file: {}", file_path))]
    ReadError {
        file_path: String,
        source: std::io::Error,
    },
    #[snafu(display("Config file {} is not valid UTF-8", file_path))]
    EncodingError {
        file_path: String,
        source: std::string::FromUtf8Error,
    },
    #[snafu(display("Failed to parse the config file"))]
    ParseError { source: saphyr::ScanError },
    #[snafu(display("Top level of config should be a map"))]
    TopLevelNotMap,
    #[snafu(display("'{}' should be a list", key))]
    NotAList { key: &'static str },
    #[snafu(display("Every item of '{}' should be a string", key))]
    NotAString { key: &'static str },
    #[snafu(display("'{}' should not contain empty items", key))]
    EmptyItem { key: &'static str },
}
