//! Tool installation for dcx.
//!
//! This crate provides functionality to:
//! - Download pinned tool releases listed in `tools.yaml`
//! - Verify archive digests when the registry asks for it
//! - Extract the executable from tar.gz or zip archives into the binaries dir
//!
//! # Example
//!
//! ```ignore
//! use dcx_core::{InstallationPaths, ToolRegistry};
//! use dcx_installer::{HttpDownloader, Installer};
//!
//! let paths = InstallationPaths::resolve();
//! let registry = ToolRegistry::load(&paths)?;
//! let installer = Installer::new(&paths, &registry, HttpDownloader::new()?);
//!
//! let outcome = installer.install("gum", false)?;
//! println!("{}", outcome.path().display());
//! ```

#![warn(missing_docs)]

mod download;
mod error;
mod extract;
mod installer;

pub use download::{Downloader, HttpDownloader};
pub use error::{Error, Result};
pub use extract::{extract, matches_binary_name};
pub use installer::{InstallOutcome, InstallPhase, InstallReport, Installer, file_sha256};
