//! Error types for dcx core operations.

use std::path::{Path, PathBuf};
use thiserror::Error;

/// Result type for dcx core operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised while reading configuration or talking to collaborators.
#[derive(Error, Debug)]
pub enum Error {
    /// The tool registry document does not exist.
    #[error("Tool registry not found at {}", path.display())]
    RegistryMissing {
        /// Where the registry was expected.
        path: PathBuf,
    },

    /// A configuration document exists but is not valid YAML for its schema.
    #[error("Failed to parse {}: {message}", path.display())]
    Parse {
        /// The offending document.
        path: PathBuf,
        /// Parser message.
        message: String,
    },

    /// Filesystem operation failed.
    #[error("I/O {operation} failed on {}: {source}", path.display())]
    Io {
        /// Underlying error.
        #[source]
        source: std::io::Error,
        /// Path being operated on.
        path: PathBuf,
        /// Short verb describing the operation.
        operation: &'static str,
    },

    /// An external process could not be started.
    #[error("Failed to run {program}: {source}")]
    Process {
        /// Program that failed to start.
        program: String,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },
}

impl Error {
    /// Create a parse error for a document.
    #[must_use]
    pub fn parse(path: &Path, message: impl Into<String>) -> Self {
        Self::Parse {
            path: path.to_path_buf(),
            message: message.into(),
        }
    }

    /// Create an I/O error with path context.
    #[must_use]
    pub fn io(source: std::io::Error, path: &Path, operation: &'static str) -> Self {
        Self::Io {
            source,
            path: path.to_path_buf(),
            operation,
        }
    }

    /// Create a process spawn error.
    #[must_use]
    pub fn process(program: impl Into<String>, source: std::io::Error) -> Self {
        Self::Process {
            program: program.into(),
            source,
        }
    }
}
