// Rust 1.92 compiler bug: false positives for thiserror/miette derive macro fields
// https://github.com/rust-lang/rust/issues/147648
#![allow(unused_assignments)]
#![warn(missing_docs)]

//! dcx - bootstrap CLI for shell toolchains
//!
//! Scripts call `dcx` to find the pinned tools they depend on (gum, yq, rg,
//! fd, sd, sg), to install missing ones from `etc/tools.yaml`, and to read
//! small bits of configuration without a YAML processor.
//!
//! The binary is a thin shell over this library: [`cli::Cli`] parses the
//! command line and [`commands::execute`] runs it against a
//! [`commands::Context`].
//!
//! ```ignore
//! use dcx::commands::{Context, execute};
//! use dcx::cli::Commands;
//!
//! let ctx = Context::resolve();
//! execute(Commands::Platform, &ctx, &mut std::io::stdout())?;
//! ```

/// CLI argument parsing, errors and exit codes.
pub mod cli;
/// Command implementations (binary, tools, config, cred, lint, validate).
pub mod commands;
/// Tracing and logging configuration.
pub mod tracing;
