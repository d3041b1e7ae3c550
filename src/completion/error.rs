use std::path::PathBuf;

use thiserror::Error;

pub type CompletionResult<T> = Result<T, CompletionError>;

#[derive(Debug, Error)]
pub enum CompletionError {
    #[error("Spec not found: {name}")]
    SpecNotFound { name: String },
    #[error("I/O error while {context}: {source}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to parse spec document {path}: {source}")]
    SpecParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("Unknown generator reference: {0}")]
    UnknownGenerator(String),
    #[error("Generator timed out after {timeout_ms}ms: {command}")]
    GeneratorTimeout { command: String, timeout_ms: u64 },
    #[error("Generator failed: {0}")]
    Generator(String),
}

impl CompletionError {
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }

    pub fn spec_not_found(name: impl Into<String>) -> Self {
        Self::SpecNotFound { name: name.into() }
    }
}

impl From<anyhow::Error> for CompletionError {
    fn from(err: anyhow::Error) -> Self {
        Self::Generator(format!("{err:#}"))
    }
}
