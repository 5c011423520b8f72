//! Error types for tool installation.

use std::path::{Path, PathBuf};
use thiserror::Error;

/// Result type for installer operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while installing a tool.
#[derive(Error, Debug)]
pub enum Error {
    /// The registry has no entry with this name.
    #[error("Unknown tool '{0}'")]
    UnknownTool(String),

    /// The descriptor has no URL for the current platform.
    #[error("Tool '{tool}' has no download URL for platform '{platform}'")]
    NoPlatformUrl {
        /// The tool name.
        tool: String,
        /// The platform tag.
        platform: String,
    },

    /// Transport failure or non-success HTTP status.
    #[error("Failed to download {url}: {message}")]
    DownloadFailed {
        /// The requested URL.
        url: String,
        /// Error message.
        message: String,
    },

    /// The archive could not be read or held no matching member.
    #[error("Failed to extract binary '{binary}' from archive: {message}")]
    ExtractionFailed {
        /// The expected binary name.
        binary: String,
        /// Error message.
        message: String,
    },

    /// Downloaded archive digest differs from the registry.
    #[error("Checksum mismatch for '{tool}': expected {expected}, got {actual}")]
    ChecksumMismatch {
        /// The tool name.
        tool: String,
        /// Digest listed in the registry.
        expected: String,
        /// Digest of the downloaded archive.
        actual: String,
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

    /// Registry or path resolution error.
    #[error(transparent)]
    Registry(#[from] dcx_core::Error),
}

impl Error {
    /// Create a no platform URL error.
    #[must_use]
    pub fn no_platform_url(tool: impl Into<String>, platform: impl Into<String>) -> Self {
        Self::NoPlatformUrl {
            tool: tool.into(),
            platform: platform.into(),
        }
    }

    /// Create a download failed error.
    #[must_use]
    pub fn download_failed(url: impl Into<String>, message: impl Into<String>) -> Self {
        Self::DownloadFailed {
            url: url.into(),
            message: message.into(),
        }
    }

    /// Create an extraction failed error.
    #[must_use]
    pub fn extraction_failed(binary: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ExtractionFailed {
            binary: binary.into(),
            message: message.into(),
        }
    }

    /// Create a checksum mismatch error.
    #[must_use]
    pub fn checksum_mismatch(
        tool: impl Into<String>,
        expected: impl Into<String>,
        actual: impl Into<String>,
    ) -> Self {
        Self::ChecksumMismatch {
            tool: tool.into(),
            expected: expected.into(),
            actual: actual.into(),
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

    /// True for errors caused by configuration rather than the environment.
    #[must_use]
    pub fn is_configuration(&self) -> bool {
        match self {
            Self::UnknownTool(_) | Self::NoPlatformUrl { .. } => true,
            Self::Registry(inner) => matches!(
                inner,
                dcx_core::Error::RegistryMissing { .. } | dcx_core::Error::Parse { .. }
            ),
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_configuration_classification() {
        assert!(Error::UnknownTool("zz".into()).is_configuration());
        assert!(Error::no_platform_url("gum", "plan9-mips").is_configuration());
        assert!(
            Error::Registry(dcx_core::Error::RegistryMissing {
                path: PathBuf::from("tools.yaml")
            })
            .is_configuration()
        );
        assert!(!Error::download_failed("https://x", "404").is_configuration());
        assert!(!Error::extraction_failed("gum", "no match").is_configuration());
    }

    #[test]
    fn test_display() {
        let err = Error::no_platform_url("gum", "plan9-mips");
        assert_eq!(
            err.to_string(),
            "Tool 'gum' has no download URL for platform 'plan9-mips'"
        );
        let err = Error::checksum_mismatch("rg", "aa", "bb");
        assert_eq!(
            err.to_string(),
            "Checksum mismatch for 'rg': expected aa, got bb"
        );
    }
}
