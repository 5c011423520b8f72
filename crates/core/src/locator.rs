//! Layered lookup of tool executables.
//!
//! A name resolves to the first hit of:
//! 1. `<bin_dir>/<name>-<platform>` (platform-qualified bundle)
//! 2. `<bin_dir>/<name>` (generic bundle)
//! 3. the first `<name>` on the search path
//!
//! Bundled copies always shadow system copies so the version pinned in
//! `tools.yaml` is the one scripts run.

use std::ffi::OsString;
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::trace;

use crate::paths::InstallationPaths;
use crate::platform::Platform;

/// Where a located binary came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Origin {
    /// `<bin_dir>/<name>-<platform>`.
    BundledPlatform,
    /// `<bin_dir>/<name>`.
    BundledGeneric,
    /// Found on the search path.
    System,
}

impl Origin {
    /// True for either bundled form.
    #[must_use]
    pub fn is_bundled(self) -> bool {
        matches!(self, Self::BundledPlatform | Self::BundledGeneric)
    }
}

impl fmt::Display for Origin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::BundledPlatform | Self::BundledGeneric => write!(f, "bundled"),
            Self::System => write!(f, "system"),
        }
    }
}

/// Result of a successful lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocatedBinary {
    /// Absolute path of the executable.
    pub path: PathBuf,
    /// Which layer matched.
    pub origin: Origin,
}

/// Finds executables for logical tool names.
#[derive(Debug, Clone)]
pub struct BinaryLocator {
    bin_dir: PathBuf,
    platform: Platform,
    search_path: Option<OsString>,
}

impl BinaryLocator {
    /// Locator over the binaries directory of `paths`, using `PATH`.
    #[must_use]
    pub fn new(paths: &InstallationPaths) -> Self {
        Self {
            bin_dir: paths.bin_dir(),
            platform: Platform::current(),
            search_path: None,
        }
    }

    /// Replace the system search path (a `PATH`-style list).
    #[must_use]
    pub fn with_search_path(mut self, search_path: impl Into<OsString>) -> Self {
        self.search_path = Some(search_path.into());
        self
    }

    /// Use a specific platform tag for platform-qualified bundles.
    #[must_use]
    pub fn with_platform(mut self, platform: Platform) -> Self {
        self.platform = platform;
        self
    }

    /// The binaries directory being searched.
    #[must_use]
    pub fn bin_dir(&self) -> &Path {
        &self.bin_dir
    }

    /// Locate `name`, or `None` when no layer has it.
    #[must_use]
    pub fn locate(&self, name: &str) -> Option<LocatedBinary> {
        let platform_bin = self.bin_dir.join(format!("{name}-{}", self.platform));
        if is_executable(&platform_bin) {
            return Some(LocatedBinary {
                path: platform_bin,
                origin: Origin::BundledPlatform,
            });
        }

        let generic_bin = self.bin_dir.join(name);
        if is_executable(&generic_bin) {
            return Some(LocatedBinary {
                path: generic_bin,
                origin: Origin::BundledGeneric,
            });
        }

        let system = match &self.search_path {
            Some(search_path) => {
                which::which_in(name, Some(search_path), &self.bin_dir).ok()
            }
            None => which::which(name).ok(),
        };

        trace!(%name, found = system.is_some(), "Searched system path");
        system.map(|path| LocatedBinary {
            path,
            origin: Origin::System,
        })
    }
}

/// True if `path` is a regular file (following symlinks) with an execute bit.
#[must_use]
pub fn is_executable(path: &Path) -> bool {
    let Ok(meta) = std::fs::metadata(path) else {
        return false;
    };
    if !meta.is_file() {
        return false;
    }

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        meta.permissions().mode() & 0o111 != 0
    }
    #[cfg(not(unix))]
    {
        true
    }
}
