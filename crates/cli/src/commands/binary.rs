use std::io::Write;

use super::{BUNDLED_TOOLS, Context};
use crate::cli::{BinaryCommands, CliError};

/// Dispatch `dcx binary`.
///
/// # Errors
///
/// Fails when a looked-up binary cannot be found.
pub fn execute_binary(
    ctx: &Context,
    command: Option<BinaryCommands>,
    name: Option<String>,
    out: &mut impl Write,
) -> Result<(), CliError> {
    match (command, name) {
        (Some(BinaryCommands::Find { name }), _) | (None, Some(name)) => {
            execute_find(ctx, &name, out)
        }
        (Some(BinaryCommands::List), _) => execute_list(ctx, out),
        (None, None) => Err(CliError::config_with_help(
            "No binary name given",
            "Use 'dcx binary find <name>' or 'dcx binary list'",
        )),
    }
}

/// Print the path `name` resolves to.
///
/// # Errors
///
/// Returns a command failure when no layer has the binary.
pub fn execute_find(ctx: &Context, name: &str, out: &mut impl Write) -> Result<(), CliError> {
    let found = ctx.locate(name).ok_or_else(|| {
        CliError::failed_with_help(
            format!("binary not found: {name}"),
            format!("Run 'dcx tools install {name}' if it is a registry tool"),
        )
    })?;
    writeln!(out, "{}", found.path.display())?;
    Ok(())
}

/// Print the known tools with required flag, origin and path.
///
/// # Errors
///
/// Only fails when output cannot be written.
pub fn execute_list(ctx: &Context, out: &mut impl Write) -> Result<(), CliError> {
    let locator = ctx.locator();

    writeln!(out, "{:<10} {:<10} {:<8} Path", "Name", "Required", "Status")?;
    writeln!(out, "{:<10} {:<10} {:<8} ----", "----", "--------", "------")?;

    for (tool, required) in BUNDLED_TOOLS {
        let required = if *required { "yes" } else { "no" };
        match locator.locate(tool) {
            Some(found) => writeln!(
                out,
                "{tool:<10} {required:<10} {:<8} {}",
                found.origin.to_string(),
                found.path.display()
            )?,
            None => writeln!(out, "{tool:<10} {required:<10} {:<8} -", "missing")?,
        }
    }

    Ok(())
}
