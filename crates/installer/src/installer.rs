//! Turning registry descriptors into executables under the binaries dir.

use dcx_core::{
    ArchiveKind, InstallationPaths, Platform, ToolDescriptor, ToolRegistry, is_executable,
};
use sha2::{Digest, Sha256};
use std::fmt;
use std::fs::File;
use std::path::{Path, PathBuf};
use tracing::{error, info, warn};

use crate::download::Downloader;
use crate::extract::extract;
use crate::{Error, Result};

/// Progress of a single install.
///
/// `NotPresent → Downloading → Extracting → Installed`, with `Failed` reachable
/// from the two middle phases and `AlreadyPresent` from the initial check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InstallPhase {
    /// Nothing usable at the destination (or a forced reinstall).
    NotPresent,
    /// Fetching the archive into the cache.
    Downloading,
    /// Pulling the binary out of the cached archive.
    Extracting,
    /// Binary placed and executable.
    Installed,
    /// Destination already executable; nothing to do.
    AlreadyPresent,
    /// Aborted with the given reason.
    Failed(String),
}

impl fmt::Display for InstallPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotPresent => write!(f, "not-present"),
            Self::Downloading => write!(f, "downloading"),
            Self::Extracting => write!(f, "extracting"),
            Self::Installed => write!(f, "installed"),
            Self::AlreadyPresent => write!(f, "already-present"),
            Self::Failed(reason) => write!(f, "failed: {reason}"),
        }
    }
}

/// What a successful [`Installer::install`] did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InstallOutcome {
    /// The destination was already executable and `force` was not set.
    AlreadyPresent {
        /// Existing binary.
        path: PathBuf,
    },
    /// A fresh binary was placed.
    Installed {
        /// Installed binary.
        path: PathBuf,
        /// Version from the registry.
        version: String,
        /// SHA-256 of the installed binary (hex).
        sha256: String,
    },
}

impl InstallOutcome {
    /// Path of the binary, installed or pre-existing.
    #[must_use]
    pub fn path(&self) -> &Path {
        match self {
            Self::AlreadyPresent { path } | Self::Installed { path, .. } => path,
        }
    }
}

/// Aggregate result of [`Installer::install_all`].
#[derive(Debug, Default)]
pub struct InstallReport {
    /// Tools that ended up usable, in registry order.
    pub outcomes: Vec<(String, InstallOutcome)>,
    /// Tools that failed, in registry order.
    pub failures: Vec<(String, Error)>,
}

impl InstallReport {
    /// Number of tools that failed.
    #[must_use]
    pub fn failed(&self) -> usize {
        self.failures.len()
    }

    /// Number of tools that are now usable.
    #[must_use]
    pub fn succeeded(&self) -> usize {
        self.outcomes.len()
    }
}

/// Installs registry tools into the binaries directory.
pub struct Installer<'a, D: Downloader> {
    paths: &'a InstallationPaths,
    registry: &'a ToolRegistry,
    downloader: D,
    platform: Platform,
}

impl<'a, D: Downloader> Installer<'a, D> {
    /// Installer for the running platform.
    pub fn new(paths: &'a InstallationPaths, registry: &'a ToolRegistry, downloader: D) -> Self {
        Self {
            paths,
            registry,
            downloader,
            platform: Platform::current(),
        }
    }

    /// Select URLs for another platform.
    #[must_use]
    pub fn with_platform(mut self, platform: Platform) -> Self {
        self.platform = platform;
        self
    }

    /// Install `name`, or report it already present unless `force` is set.
    ///
    /// # Errors
    ///
    /// - [`Error::UnknownTool`] if the registry has no such entry
    /// - [`Error::NoPlatformUrl`] if no URL exists for this platform
    /// - [`Error::DownloadFailed`], [`Error::ChecksumMismatch`] or
    ///   [`Error::ExtractionFailed`] from the respective phase
    pub fn install(&self, name: &str, force: bool) -> Result<InstallOutcome> {
        let tool = self
            .registry
            .get(name)
            .ok_or_else(|| Error::UnknownTool(name.to_string()))?;

        let bin_dir = self.paths.bin_dir();
        let dest = bin_dir.join(name);

        if !force && is_executable(&dest) {
            log_phase(name, &InstallPhase::AlreadyPresent);
            return Ok(InstallOutcome::AlreadyPresent { path: dest });
        }
        log_phase(name, &InstallPhase::NotPresent);

        let url = tool
            .url_for(&self.platform)
            .ok_or_else(|| Error::no_platform_url(name, self.platform.tag()))?;
        let kind = tool.archive_kind(&url);

        let cache_dir = self.paths.cache_dir();
        create_dir(&cache_dir)?;
        create_dir(&bin_dir)?;
        let archive = cache_dir.join(format!("{name}-{}.{}", tool.version, kind.extension()));

        info!(tool = %name, version = %tool.version, %url, platform = %self.platform, "Installing tool");

        let result = self.fetch_and_place(name, tool, &url, &archive, kind, &dest);
        let _ = std::fs::remove_file(&archive);

        match result {
            Ok(()) => {
                let sha256 = file_sha256(&dest)?;
                log_phase(name, &InstallPhase::Installed);
                info!(tool = %name, path = %dest.display(), %sha256, "Installed tool");
                Ok(InstallOutcome::Installed {
                    path: dest,
                    version: tool.version.clone(),
                    sha256,
                })
            }
            Err(e) => {
                log_phase(name, &InstallPhase::Failed(e.to_string()));
                Err(e)
            }
        }
    }

    /// Install every registry tool in document order, continuing past
    /// failures.
    pub fn install_all(&self, force: bool) -> InstallReport {
        let mut report = InstallReport::default();

        for name in self.registry.names() {
            match self.install(name, force) {
                Ok(outcome) => report.outcomes.push((name.to_string(), outcome)),
                Err(e) => {
                    error!(tool = %name, error = %e, "Failed to install tool");
                    report.failures.push((name.to_string(), e));
                }
            }
        }

        info!(
            installed = report.succeeded(),
            failed = report.failed(),
            "Finished installing tools"
        );
        report
    }

    fn fetch_and_place(
        &self,
        name: &str,
        tool: &ToolDescriptor,
        url: &str,
        archive: &Path,
        kind: ArchiveKind,
        dest: &Path,
    ) -> Result<()> {
        log_phase(name, &InstallPhase::Downloading);
        self.downloader.download(url, archive)?;
        self.verify_checksum(name, tool, archive)?;

        log_phase(name, &InstallPhase::Extracting);
        extract(archive, kind, tool.binary_name(name), dest)
    }

    fn verify_checksum(&self, name: &str, tool: &ToolDescriptor, archive: &Path) -> Result<()> {
        if !self.registry.settings().verify_checksum {
            return Ok(());
        }

        let Some(expected) = tool.checksum_for(&self.platform) else {
            warn!(tool = %name, platform = %self.platform, "No checksum listed; skipping verification");
            return Ok(());
        };

        let actual = file_sha256(archive)?;
        if !actual.eq_ignore_ascii_case(expected.trim()) {
            return Err(Error::checksum_mismatch(name, expected, actual));
        }

        info!(tool = %name, sha256 = %actual, "Checksum verified");
        Ok(())
    }
}

fn log_phase(tool: &str, phase: &InstallPhase) {
    info!(%tool, %phase, "Install phase");
}

fn create_dir(dir: &Path) -> Result<()> {
    std::fs::create_dir_all(dir).map_err(|e| Error::io(e, dir, "create directory"))
}

/// Compute the SHA-256 of a file as lowercase hex.
///
/// # Errors
///
/// Returns [`Error::Io`] when the file cannot be read.
pub fn file_sha256(path: &Path) -> Result<String> {
    let mut file = File::open(path).map_err(|e| Error::io(e, path, "open"))?;
    let mut hasher = Sha256::new();
    std::io::copy(&mut file, &mut hasher).map_err(|e| Error::io(e, path, "read"))?;
    Ok(format!("{:x}", hasher.finalize()))
}
