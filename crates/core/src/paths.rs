//! Installation path resolution for dcx.
//!
//! Everything dcx manages lives under a single installation root:
//!
//! | Directory | Development layout | Installed layout |
//! |-----------|--------------------|------------------|
//! | binaries  | `<root>/bin`       | `<root>/share/DCX/bin` |
//! | config    | `<root>/etc`       | `<root>/share/DCX/etc` |
//! | shell lib | `<root>/lib`       | `<root>/share/DCX/lib` |
//! | cache     | `<root>/cache`     | `<root>/cache` |
//!
//! The root is resolved in this order:
//! 1. `DC_HOME` environment variable (used verbatim when non-empty)
//! 2. Location of the running executable (`<root>/bin/dcx` or a cargo build
//!    under `<root>/target/<profile>/dcx`)
//! 3. `~/.local/share/dcx`
//!
//! Accessors never cache and never fail: each call probes the filesystem again
//! and falls back to the development layout when nothing matches, so callers
//! can install into a root that does not exist yet.

use std::path::{Path, PathBuf};
use tracing::debug;

use crate::platform::Platform;

/// Environment variable overriding the installation root.
pub const HOME_ENV: &str = "DC_HOME";

/// Variable carrying the resolved root into shell libraries such as
/// `cred.sh`. Never read back by dcx itself.
pub const EXPORTED_HOME_ENV: &str = "DCX_HOME";

/// Product directory name under `share/` in the installed layout.
const INSTALLED_PRODUCT_DIR: &str = "DCX";

/// Executable name used to mark a development `bin/` directory.
const SELF_BINARY: &str = "dcx";

/// File name of the tool registry document.
pub const TOOLS_FILE: &str = "tools.yaml";

/// File name of the project document.
pub const PROJECT_FILE: &str = "project.yaml";

/// Shell library that implements credential operations.
pub const CRED_SCRIPT: &str = "cred.sh";

/// Resolved installation directories for one invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallationPaths {
    root: PathBuf,
}

impl InstallationPaths {
    /// Resolve the root from the environment and the running executable.
    #[must_use]
    pub fn resolve() -> Self {
        Self::from_root(resolve_root())
    }

    /// Use an explicit installation root.
    #[must_use]
    pub fn from_root(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// The installation root.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Directory holding bundled binaries.
    ///
    /// The development `bin/` wins only when it holds this platform's `dcx`
    /// build; otherwise an existing installed layout is used.
    #[must_use]
    pub fn bin_dir(&self) -> PathBuf {
        let dev = self.root.join("bin");
        let marker = format!("{SELF_BINARY}-{}", Platform::current());
        if dev.join(&marker).is_file() {
            return dev;
        }

        let installed = self.installed_dir("bin");
        if installed.is_dir() {
            return installed;
        }

        debug!(bin_dir = %dev.display(), "Falling back to development bin dir");
        dev
    }

    /// Directory holding `tools.yaml` and `project.yaml`.
    #[must_use]
    pub fn etc_dir(&self) -> PathBuf {
        self.probe_layout("etc", TOOLS_FILE)
    }

    /// Directory holding the shell libraries (`cred.sh`).
    #[must_use]
    pub fn lib_dir(&self) -> PathBuf {
        self.probe_layout("lib", CRED_SCRIPT)
    }

    /// Download cache for release archives.
    #[must_use]
    pub fn cache_dir(&self) -> PathBuf {
        self.root.join("cache")
    }

    /// Directory of structural-search lint rules.
    #[must_use]
    pub fn rules_dir(&self) -> PathBuf {
        self.root.join("etc").join("rules")
    }

    /// Path of the tool registry document.
    #[must_use]
    pub fn tools_file(&self) -> PathBuf {
        self.etc_dir().join(TOOLS_FILE)
    }

    /// Path of the project document.
    #[must_use]
    pub fn project_file(&self) -> PathBuf {
        self.etc_dir().join(PROJECT_FILE)
    }

    fn installed_dir(&self, name: &str) -> PathBuf {
        self.root
            .join("share")
            .join(INSTALLED_PRODUCT_DIR)
            .join(name)
    }

    fn probe_layout(&self, name: &str, marker: &str) -> PathBuf {
        let dev = self.root.join(name);
        if dev.join(marker).is_file() {
            return dev;
        }

        let installed = self.installed_dir(name);
        if installed.join(marker).is_file() {
            return installed;
        }

        dev
    }
}

fn resolve_root() -> PathBuf {
    if let Ok(dir) = std::env::var(HOME_ENV)
        && !dir.is_empty()
    {
        return PathBuf::from(dir);
    }

    if let Some(root) = std::env::current_exe()
        .and_then(|exe| exe.canonicalize())
        .ok()
        .and_then(|exe| root_from_executable(&exe))
    {
        debug!(root = %root.display(), "Inferred root from executable location");
        return root;
    }

    default_root()
}

/// Infer the installation root from a canonical executable path.
///
/// `<root>/bin/dcx` yields `<root>`; a cargo build at
/// `<root>/target/<profile>/dcx` also yields `<root>`.
#[must_use]
pub fn root_from_executable(exe: &Path) -> Option<PathBuf> {
    let parent = exe.parent()?;
    if parent.file_name().is_some_and(|n| n == "bin") {
        return parent.parent().map(Path::to_path_buf);
    }

    let grandparent = parent.parent()?;
    if grandparent.file_name().is_some_and(|n| n == "target") {
        return grandparent.parent().map(Path::to_path_buf);
    }

    None
}

/// `~/.local/share/dcx`, or `./.local/share/dcx` when no home is known.
#[must_use]
pub fn default_root() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".local")
        .join("share")
        .join(SELF_BINARY)
}
