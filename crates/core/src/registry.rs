//! Declarative registry of installable tools (`tools.yaml`).
//!
//! The registry is read fresh on every invocation so edits take effect
//! immediately. Unlike the project document there is no built-in default:
//! without the file dcx cannot know what to install.

use indexmap::IndexMap;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::paths::InstallationPaths;
use crate::platform::Platform;
use crate::{Error, Result};

/// Container format of a release artifact.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArchiveKind {
    /// Gzip-compressed tar stream.
    TarGz,
    /// Zip container.
    Zip,
}

impl ArchiveKind {
    /// File extension used for cached downloads.
    #[must_use]
    pub fn extension(self) -> &'static str {
        match self {
            Self::TarGz => "tar.gz",
            Self::Zip => "zip",
        }
    }

    /// Guess the kind from a URL suffix, defaulting to tar.gz.
    #[must_use]
    pub fn from_url(url: &str) -> Self {
        if url.ends_with(".zip") {
            Self::Zip
        } else {
            Self::TarGz
        }
    }
}

/// Registry-wide settings.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RegistrySettings {
    /// Install missing required tools during `tools check`.
    pub auto_download: bool,
    /// Verify archive digests listed under `sha256`.
    pub verify_checksum: bool,
    /// Informational cache location from the document.
    pub cache_dir: Option<String>,
}

/// One installable tool.
#[derive(Debug, Clone, Deserialize)]
pub struct ToolDescriptor {
    /// Pinned release version, substituted for `{version}`.
    pub version: String,
    /// Whether scripts cannot run without it.
    #[serde(default)]
    pub required: bool,
    /// Human description.
    #[serde(default)]
    pub description: String,
    /// Platform tag to URL template.
    #[serde(default)]
    pub urls: IndexMap<String, String>,
    /// Binary name inside the archive, when it differs from the tool name.
    #[serde(default)]
    pub binary: Option<String>,
    /// Archive hint (`zip` or `tar.gz`).
    #[serde(default)]
    pub extract: Option<String>,
    /// Platform tag to expected archive SHA-256 (hex).
    #[serde(default)]
    pub sha256: IndexMap<String, String>,
}

impl ToolDescriptor {
    /// Download URL for a platform with `{version}` substituted.
    #[must_use]
    pub fn url_for(&self, platform: &Platform) -> Option<String> {
        self.urls
            .get(&platform.tag())
            .map(|template| template.replace("{version}", &self.version))
    }

    /// Archive kind from `extract`, else from the URL suffix.
    #[must_use]
    pub fn archive_kind(&self, url: &str) -> ArchiveKind {
        if self.extract.as_deref() == Some("zip") {
            ArchiveKind::Zip
        } else {
            ArchiveKind::from_url(url)
        }
    }

    /// Name of the binary to look for inside the archive.
    #[must_use]
    pub fn binary_name<'a>(&'a self, tool: &'a str) -> &'a str {
        self.binary.as_deref().filter(|b| !b.is_empty()).unwrap_or(tool)
    }

    /// Expected archive digest for a platform.
    #[must_use]
    pub fn checksum_for(&self, platform: &Platform) -> Option<&str> {
        self.sha256.get(&platform.tag()).map(String::as_str)
    }
}

#[derive(Debug, Deserialize)]
struct RegistryDocument {
    #[serde(default)]
    settings: RegistrySettings,
    #[serde(default)]
    tools: IndexMap<String, ToolDescriptor>,
}

/// Loaded tool registry, in document order.
#[derive(Debug, Clone)]
pub struct ToolRegistry {
    path: PathBuf,
    settings: RegistrySettings,
    tools: IndexMap<String, ToolDescriptor>,
}

impl ToolRegistry {
    /// Load `tools.yaml` from the config directory.
    ///
    /// # Errors
    ///
    /// Returns [`Error::RegistryMissing`] when the file does not exist and
    /// [`Error::Parse`] when it is malformed.
    pub fn load(paths: &InstallationPaths) -> Result<Self> {
        Self::from_path(&paths.tools_file())
    }

    /// Load a registry document from an explicit path.
    ///
    /// # Errors
    ///
    /// See [`ToolRegistry::load`].
    pub fn from_path(path: &Path) -> Result<Self> {
        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(Error::RegistryMissing {
                    path: path.to_path_buf(),
                });
            }
            Err(e) => return Err(Error::io(e, path, "read")),
        };

        let registry = Self::from_yaml_str(&content, path)?;
        debug!(path = %path.display(), tools = registry.len(), "Loaded tool registry");
        Ok(registry)
    }

    /// Parse registry YAML; `origin` is only used in error messages.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Parse`] for invalid YAML or schema mismatches.
    pub fn from_yaml_str(content: &str, origin: &Path) -> Result<Self> {
        let doc: RegistryDocument =
            serde_yaml::from_str(content).map_err(|e| Error::parse(origin, e.to_string()))?;
        Ok(Self {
            path: origin.to_path_buf(),
            settings: doc.settings,
            tools: doc.tools,
        })
    }

    /// Where the registry was read from.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Registry-wide settings.
    #[must_use]
    pub fn settings(&self) -> &RegistrySettings {
        &self.settings
    }

    /// Look up a tool by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&ToolDescriptor> {
        self.tools.get(name)
    }

    /// Iterate tools in document order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &ToolDescriptor)> {
        self.tools.iter().map(|(name, tool)| (name.as_str(), tool))
    }

    /// Tool names in document order.
    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        self.tools.keys().map(String::as_str).collect()
    }

    /// Number of registered tools.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tools.len()
    }

    /// True when no tools are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}
