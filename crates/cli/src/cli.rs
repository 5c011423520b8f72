use clap::{Parser, Subcommand, ValueEnum};
use miette::{Diagnostic, Report};
use std::io::{self, Write};
use std::path::PathBuf;
use thiserror::Error;

use crate::tracing::{LogLevel, TracingFormat};

/// Exit codes for the CLI application
pub const EXIT_OK: i32 = 0;
/// Command failure exit code (missing tool, failed install, delegated script)
pub const EXIT_FAILURE: i32 = 1;
/// Configuration error exit code (registry missing or invalid, unknown tool)
pub const EXIT_CONFIG: i32 = 2;

/// CLI-specific error types with proper exit code mapping
#[derive(Error, Debug, Clone, Diagnostic)]
pub enum CliError {
    /// Configuration error (exit code 2)
    #[error("Configuration error: {message}")]
    #[diagnostic(code(dcx::config))]
    Config {
        /// The error message
        message: String,
        /// Optional help text
        #[help]
        help: Option<String>,
    },
    /// Command failure (exit code 1)
    #[error("{message}")]
    #[diagnostic(code(dcx::failed))]
    Failed {
        /// The error message
        message: String,
        /// Optional help text
        #[help]
        help: Option<String>,
    },
    /// Failure already reported by a child process or by design (exit code 1)
    #[error("Command failed")]
    #[diagnostic(code(dcx::silent))]
    Silent,
}

impl CliError {
    /// Create a new configuration error
    #[must_use]
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
            help: None,
        }
    }

    /// Create a new configuration error with help text
    #[must_use]
    pub fn config_with_help(message: impl Into<String>, help: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
            help: Some(help.into()),
        }
    }

    /// Create a new command failure
    #[must_use]
    pub fn failed(message: impl Into<String>) -> Self {
        Self::Failed {
            message: message.into(),
            help: None,
        }
    }

    /// Create a new command failure with help text
    #[must_use]
    pub fn failed_with_help(message: impl Into<String>, help: impl Into<String>) -> Self {
        Self::Failed {
            message: message.into(),
            help: Some(help.into()),
        }
    }
}

impl From<dcx_core::Error> for CliError {
    fn from(err: dcx_core::Error) -> Self {
        match &err {
            dcx_core::Error::RegistryMissing { path } => Self::config_with_help(
                err.to_string(),
                format!(
                    "Create {} or point {} at an installation",
                    path.display(),
                    dcx_core::HOME_ENV
                ),
            ),
            dcx_core::Error::Parse { .. } => Self::config(err.to_string()),
            dcx_core::Error::Io { .. } | dcx_core::Error::Process { .. } => {
                Self::failed(err.to_string())
            }
        }
    }
}

impl From<dcx_installer::Error> for CliError {
    fn from(err: dcx_installer::Error) -> Self {
        match err {
            dcx_installer::Error::Registry(inner) => inner.into(),
            dcx_installer::Error::UnknownTool(_) => {
                Self::config_with_help(err.to_string(), "Run 'dcx tools list' to see known tools")
            }
            other if other.is_configuration() => Self::config(other.to_string()),
            other => Self::failed(other.to_string()),
        }
    }
}

impl From<io::Error> for CliError {
    fn from(err: io::Error) -> Self {
        Self::failed(format!("Failed to write output: {err}"))
    }
}

/// Get the exit code for a CLI error
#[must_use]
pub const fn exit_code_for(err: &CliError) -> i32 {
    match err {
        CliError::Config { .. } => EXIT_CONFIG,
        CliError::Failed { .. } | CliError::Silent => EXIT_FAILURE,
    }
}

/// Render an error to stderr with miette
#[allow(clippy::print_stderr)]
pub fn render_error(err: &CliError) {
    if matches!(err, CliError::Silent) {
        return;
    }
    let report = Report::new(err.clone());
    eprintln!("{report:?}");
    let _ = io::stderr().flush();
}

/// Output format for `dcx tools list`
#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum, Default)]
pub enum ListFormat {
    /// Aligned columns with status and path
    #[default]
    Table,
    /// JSON array of tool objects
    Json,
    /// One `[x] name` line per tool
    Simple,
}

/// Parsed command line.
#[derive(Parser, Debug)]
#[command(name = "dcx")]
#[command(about = "Datacosmos Command eXecutor: bundled tool management for shell toolchains")]
#[command(long_about = None)]
#[command(version)]
pub struct Cli {
    /// The subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,

    /// Logging verbosity level.
    #[arg(
        short = 'L',
        long,
        global = true,
        help = "Set logging level",
        default_value = "warn",
        value_enum
    )]
    pub level: LogLevel,

    /// Log output format.
    #[arg(
        long = "log-format",
        global = true,
        help = "Log output format",
        default_value = "compact",
        value_enum
    )]
    pub log_format: TracingFormat,
}

/// Top-level commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Show version, platform and bundled tool status.
    #[command(about = "Show version and bundled tools status")]
    Version,

    /// Print the platform tag.
    #[command(about = "Print current platform (e.g., linux-amd64)")]
    Platform,

    /// Locate bundled or system binaries.
    #[command(
        about = "Find bundled or system binary",
        args_conflicts_with_subcommands = true,
        arg_required_else_help = true
    )]
    Binary {
        /// Binary subcommand to execute.
        #[command(subcommand)]
        command: Option<BinaryCommands>,
        /// Shorthand for `dcx binary find <name>`.
        #[arg(value_name = "NAME")]
        name: Option<String>,
    },

    /// Manage registry tools.
    #[command(about = "Manage bundled tools (list, install, check)")]
    Tools {
        /// Tools subcommand to execute (defaults to `list`).
        #[command(subcommand)]
        command: Option<ToolsCommands>,
    },

    /// Inspect configuration.
    #[command(about = "Show project configuration and paths")]
    Config {
        /// Config subcommand to execute (defaults to `show`).
        #[command(subcommand)]
        command: Option<ConfigCommands>,
    },

    /// Credential operations delegated to the shell library.
    #[command(about = "Manage credentials", arg_required_else_help = true)]
    Cred {
        /// Credential subcommand to execute.
        #[command(subcommand)]
        command: CredCommands,
    },

    /// Lint shell scripts with structural-search rules.
    #[command(about = "Lint shell scripts with ast-grep")]
    Lint {
        /// Paths to lint (defaults to the lib and bin directories).
        #[arg(value_name = "PATH")]
        paths: Vec<PathBuf>,
    },

    /// Smoke-test the bundled tools.
    #[command(about = "Test all bundled tools work correctly")]
    Validate,
}

/// `dcx binary` subcommands.
#[derive(Subcommand, Debug)]
pub enum BinaryCommands {
    /// Print the path a tool name resolves to.
    #[command(about = "Find path to binary (bundled or system)")]
    Find {
        /// Tool name.
        name: String,
    },
    /// Show every known tool with its origin.
    #[command(about = "List all known binaries and their status")]
    List,
}

/// `dcx tools` subcommands.
#[derive(Subcommand, Debug)]
pub enum ToolsCommands {
    /// List registry tools with install status.
    #[command(about = "List configured tools", visible_alias = "ls")]
    List {
        /// Output format.
        #[arg(value_enum, default_value_t = ListFormat::Table)]
        format: ListFormat,
    },
    /// Install one tool or all of them.
    #[command(about = "Install a tool (or --all)", visible_alias = "add")]
    Install {
        /// Tool name from the registry.
        #[arg(required_unless_present = "all", conflicts_with = "all")]
        name: Option<String>,
        /// Install every tool in the registry.
        #[arg(long)]
        all: bool,
        /// Reinstall even if already present.
        #[arg(long, short = 'f')]
        force: bool,
    },
    /// Verify required tools are available.
    #[command(about = "Check if required tools are available")]
    Check {
        /// Install missing required tools.
        #[arg(long)]
        auto: bool,
    },
}

/// `dcx config` subcommands.
#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Print project configuration and paths.
    #[command(about = "Show all configuration")]
    Show,
    /// Print one configuration value.
    #[command(about = "Get a specific config value")]
    Get {
        /// Key (name, full_name, repo, home, bin, etc, lib, cache, platform).
        key: String,
    },
    /// Print paths as shell assignments.
    #[command(about = "Print paths as shell variables")]
    Paths,
    /// Print a value from a YAML file.
    #[command(about = "Get value from YAML file")]
    YamlGet {
        /// YAML file.
        file: PathBuf,
        /// Dot-separated key.
        key: String,
        /// Printed when the key is absent.
        default: Option<String>,
    },
    /// Succeed only if a key exists.
    #[command(about = "Check if key exists (exit 0/1)")]
    YamlHas {
        /// YAML file.
        file: PathBuf,
        /// Dot-separated key.
        key: String,
    },
    /// List mapping keys at a path.
    #[command(about = "List keys at path")]
    YamlKeys {
        /// YAML file.
        file: PathBuf,
        /// Dot-separated path (defaults to the document root).
        path: Option<String>,
    },
}

/// `dcx cred` subcommands.
#[derive(Subcommand, Debug)]
pub enum CredCommands {
    /// Store a credential.
    #[command(about = "Store a credential")]
    Set {
        /// Key in `service/environment/name` form.
        key: String,
        /// Secret value.
        value: String,
    },
    /// Print a credential.
    #[command(about = "Retrieve a credential")]
    Get {
        /// Key in `service/environment/name` form.
        key: String,
    },
    /// List stored keys.
    #[command(about = "List all credential keys")]
    List {
        /// Print a JSON array.
        #[arg(long)]
        json: bool,
    },
    /// Remove a credential.
    #[command(about = "Remove a credential")]
    Delete {
        /// Key in `service/environment/name` form.
        key: String,
        /// Skip the confirmation prompt.
        #[arg(short = 'y', long)]
        yes: bool,
    },
    /// Print credentials as `export` statements.
    #[command(about = "Export credentials as environment variables")]
    Export {
        /// Only keys under this prefix.
        #[arg(long)]
        prefix: Option<String>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use std::path::Path;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_exit_codes() {
        assert_eq!(exit_code_for(&CliError::config("bad")), EXIT_CONFIG);
        assert_eq!(exit_code_for(&CliError::failed("bad")), EXIT_FAILURE);
        assert_eq!(exit_code_for(&CliError::Silent), EXIT_FAILURE);
    }

    #[test]
    fn test_installer_errors_map_to_exit_codes() {
        let unknown: CliError = dcx_installer::Error::UnknownTool("zz".into()).into();
        assert_eq!(exit_code_for(&unknown), EXIT_CONFIG);

        let missing: CliError = dcx_installer::Error::Registry(dcx_core::Error::RegistryMissing {
            path: Path::new("/x/etc/tools.yaml").to_path_buf(),
        })
        .into();
        assert_eq!(exit_code_for(&missing), EXIT_CONFIG);

        let download: CliError =
            dcx_installer::Error::download_failed("https://x", "HTTP 404").into();
        assert_eq!(exit_code_for(&download), EXIT_FAILURE);
    }

    #[test]
    fn test_binary_shorthand_parses() {
        let cli = Cli::try_parse_from(["dcx", "binary", "gum"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Binary { command: None, name: Some(ref n) } if n == "gum"
        ));

        let cli = Cli::try_parse_from(["dcx", "binary", "find", "yq"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Binary { command: Some(BinaryCommands::Find { ref name }), .. } if name == "yq"
        ));
    }

    #[test]
    fn test_install_requires_name_or_all() {
        assert!(Cli::try_parse_from(["dcx", "tools", "install"]).is_err());
        assert!(Cli::try_parse_from(["dcx", "tools", "install", "gum", "--all"]).is_err());
        let cli = Cli::try_parse_from(["dcx", "tools", "install", "--all", "--force"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Tools {
                command: Some(ToolsCommands::Install {
                    name: None,
                    all: true,
                    force: true
                })
            }
        ));
    }

    #[test]
    fn test_list_format_positional() {
        let cli = Cli::try_parse_from(["dcx", "tools", "list", "json"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Tools {
                command: Some(ToolsCommands::List {
                    format: ListFormat::Json
                })
            }
        ));
    }
}
