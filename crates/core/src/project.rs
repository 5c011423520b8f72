//! Project document (`project.yaml`).
//!
//! Absent documents fall back to built-in defaults so a bare checkout still
//! identifies itself.

use serde::Deserialize;

use crate::paths::InstallationPaths;
use crate::{Error, Result};

/// Identity of the project dcx is bootstrapping.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ProjectInfo {
    /// Short name.
    pub name: String,
    /// Long name.
    pub full_name: String,
    /// `owner/repo` on GitHub.
    pub repo: String,
}

impl Default for ProjectInfo {
    fn default() -> Self {
        Self {
            name: "DCX".to_string(),
            full_name: "Datacosmos Command eXecutor".to_string(),
            repo: "datacosmos-br/dcx".to_string(),
        }
    }
}

/// Parsed `project.yaml`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ProjectConfig {
    /// Project identity.
    pub project: ProjectInfo,
}

impl ProjectConfig {
    /// Load from the config directory, defaulting when the file is absent.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Parse`] when the file exists but is malformed.
    pub fn load(paths: &InstallationPaths) -> Result<Self> {
        let path = paths.project_file();
        match std::fs::read_to_string(&path) {
            Ok(content) => {
                serde_yaml::from_str(&content).map_err(|e| Error::parse(&path, e.to_string()))
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(e) => Err(Error::io(e, &path, "read")),
        }
    }
}
