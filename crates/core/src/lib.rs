//! Core types for dcx.
//!
//! This crate answers the questions every dcx command asks first:
//! - Which platform are we on? ([`Platform`])
//! - Where does the installation live? ([`InstallationPaths`])
//! - Which executable runs for a tool name? ([`BinaryLocator`])
//! - What tools are declared and how are they fetched? ([`ToolRegistry`])
//!
//! Delegated work (credential scripts, linting, smoke tests) goes through the
//! [`ExternalProcess`] seam.

#![warn(missing_docs)]

mod error;
pub mod locator;
pub mod paths;
pub mod platform;
pub mod process;
pub mod project;
pub mod registry;
pub mod yaml;

pub use error::{Error, Result};
pub use locator::{BinaryLocator, LocatedBinary, Origin, is_executable};
pub use paths::{
    CRED_SCRIPT, EXPORTED_HOME_ENV, HOME_ENV, InstallationPaths, PROJECT_FILE, TOOLS_FILE,
};
pub use platform::Platform;
pub use process::{ExternalProcess, ProcessOutput, StdinMode, SystemProcess};
pub use project::{ProjectConfig, ProjectInfo};
pub use registry::{ArchiveKind, RegistrySettings, ToolDescriptor, ToolRegistry};
