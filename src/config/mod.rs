mod export_config;

pub use export_config::{ExportConfig, ExportConfigError};
