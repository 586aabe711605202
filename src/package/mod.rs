mod generator;

pub use generator::{GenerateError, GenerationSummary, PackageGenerator};
