//! Command handlers.
//!
//! Handlers write user-facing output to the `out` writer they are given and
//! report failures as [`CliError`]; `main` owns stdout and the exit code.

pub mod binary;
pub mod config;
pub mod cred;
pub mod lint;
pub mod tools;
pub mod validate;
pub mod version;

use dcx_core::{BinaryLocator, InstallationPaths, LocatedBinary, Platform};
use dcx_installer::HttpDownloader;
use std::ffi::OsString;
use std::io::{self, Write};

use crate::cli::{CliError, Commands, ToolsCommands};

/// Tools every installation is expected to carry, with whether scripts
/// require them.
pub const BUNDLED_TOOLS: &[(&str, bool)] = &[
    ("gum", true),
    ("yq", true),
    ("rg", false),
    ("fd", false),
    ("sd", false),
    ("sg", false),
];

/// Per-invocation state shared by all handlers.
#[derive(Debug, Clone)]
pub struct Context {
    /// Resolved installation directories.
    pub paths: InstallationPaths,
    /// Platform used for bundled names and download URLs.
    pub platform: Platform,
    search_path: Option<OsString>,
}

impl Context {
    /// Resolve paths and platform for this process.
    #[must_use]
    pub fn resolve() -> Self {
        Self::new(InstallationPaths::resolve(), Platform::current())
    }

    /// Context over explicit paths and platform.
    #[must_use]
    pub fn new(paths: InstallationPaths, platform: Platform) -> Self {
        Self {
            paths,
            platform,
            search_path: None,
        }
    }

    /// Search `search_path` instead of `PATH` for system binaries.
    #[must_use]
    pub fn with_search_path(mut self, search_path: impl Into<OsString>) -> Self {
        self.search_path = Some(search_path.into());
        self
    }

    /// Locator over this installation's binaries directory.
    #[must_use]
    pub fn locator(&self) -> BinaryLocator {
        let locator = BinaryLocator::new(&self.paths).with_platform(self.platform.clone());
        match &self.search_path {
            Some(search_path) => locator.with_search_path(search_path.clone()),
            None => locator,
        }
    }

    /// Shorthand for `self.locator().locate(name)`.
    #[must_use]
    pub fn locate(&self, name: &str) -> Option<LocatedBinary> {
        self.locator().locate(name)
    }
}

/// Run a parsed command.
///
/// # Errors
///
/// Returns the handler's [`CliError`].
pub fn execute(command: Commands, ctx: &Context, out: &mut impl Write) -> Result<(), CliError> {
    match command {
        Commands::Version => version::execute_version(ctx, out),
        Commands::Platform => {
            writeln!(out, "{}", ctx.platform)?;
            Ok(())
        }
        Commands::Binary { command, name } => binary::execute_binary(ctx, command, name, out),
        Commands::Tools { command } => match command.unwrap_or(ToolsCommands::List {
            format: crate::cli::ListFormat::Table,
        }) {
            ToolsCommands::List { format } => tools::execute_list(ctx, format, out),
            ToolsCommands::Install { name, all, force } => {
                let downloader = http_downloader()?;
                if all {
                    tools::execute_install_all(ctx, &downloader, force, out)
                } else {
                    let name = name.ok_or_else(|| {
                        CliError::config_with_help(
                            "No tool name given",
                            "Use 'dcx tools install <name>' or 'dcx tools install --all'",
                        )
                    })?;
                    tools::execute_install(ctx, &downloader, &name, force, out)
                }
            }
            ToolsCommands::Check { auto } => {
                let downloader = http_downloader()?;
                tools::execute_check(ctx, &downloader, auto, out)
            }
        },
        Commands::Config { command } => config::execute_config(ctx, command, out),
        Commands::Cred { command } => {
            let stdin = io::stdin();
            cred::execute_cred(ctx, command, &mut stdin.lock(), out)
        }
        Commands::Lint { paths } => lint::execute_lint(ctx, &paths, out),
        Commands::Validate => validate::execute_validate(ctx, out),
    }
}

/// Environment variables consulted, in order, for a GitHub token.
const GITHUB_TOKEN_VARS: [&str; 2] = ["GITHUB_TOKEN", "GH_TOKEN"];

fn http_downloader() -> Result<HttpDownloader, CliError> {
    let token = github_token(|key| std::env::var(key).ok());
    Ok(HttpDownloader::new()?.with_github_token(token))
}

fn github_token(var: impl Fn(&str) -> Option<String>) -> Option<String> {
    GITHUB_TOKEN_VARS
        .iter()
        .filter_map(|key| var(key))
        .find(|token| !token.is_empty())
}
