//! `dcx cred`: thin front end over the shell credential library.
//!
//! Storage lives entirely in `lib/cred.sh`. Each subcommand sources the
//! library in a fresh `bash` and calls one `cred_*` function with the
//! arguments passed positionally, so values never pass through shell
//! quoting.

use dcx_core::{
    CRED_SCRIPT, EXPORTED_HOME_ENV, ExternalProcess, HOME_ENV, ProcessOutput, StdinMode,
    SystemProcess,
};
use std::io::{BufRead, Write};
use std::path::Path;
use tracing::debug;

use super::Context;
use crate::cli::{CliError, CredCommands};

const BASH_SHIM: &str = r#"source "$1" && shift && "$@""#;

/// Dispatch `dcx cred`.
///
/// `input` answers the delete confirmation prompt.
///
/// # Errors
///
/// Returns a configuration error when the library is missing, and a command
/// failure for malformed keys or when the library function fails.
pub fn execute_cred(
    ctx: &Context,
    command: CredCommands,
    input: &mut impl BufRead,
    out: &mut impl Write,
) -> Result<(), CliError> {
    let script = ctx.paths.lib_dir().join(CRED_SCRIPT);
    if !script.is_file() {
        return Err(CliError::config_with_help(
            format!("Credential library not found: {}", script.display()),
            format!("Ensure {HOME_ENV} is set correctly"),
        ));
    }

    let bash = SystemProcess::new("bash")
        .env(EXPORTED_HOME_ENV, ctx.paths.root())
        .inherit_stderr(true);

    run_cred(&bash, &script, command, input, out)
}

fn run_cred(
    process: &impl ExternalProcess,
    script: &Path,
    command: CredCommands,
    input: &mut impl BufRead,
    out: &mut impl Write,
) -> Result<(), CliError> {
    match command {
        CredCommands::Set { key, value } => {
            validate_key(&key)?;
            let output = call(process, script, "cred_set", &[key, value])?;
            write!(out, "{}", expect_success("cred_set", output)?)?;
        }
        CredCommands::Get { key } => {
            let output = call(process, script, "cred_get", &[key])?;
            if !output.success() {
                return Err(CliError::Silent);
            }
            write!(out, "{}", output.stdout)?;
        }
        CredCommands::List { json } => {
            let stdout = expect_success("cred_list", call(process, script, "cred_list", &[])?)?;
            if json {
                let keys: Vec<&str> = stdout
                    .lines()
                    .map(str::trim)
                    .filter(|line| !line.is_empty())
                    .collect();
                let encoded = serde_json::to_string(&keys)
                    .map_err(|e| CliError::failed(format!("Failed to encode keys: {e}")))?;
                writeln!(out, "{encoded}")?;
            } else {
                write!(out, "{stdout}")?;
            }
        }
        CredCommands::Delete { key, yes } => {
            if !yes && !confirm(&key, input, out)? {
                writeln!(out, "Cancelled")?;
                return Ok(());
            }
            let output = call(process, script, "cred_delete", &[key])?;
            write!(out, "{}", expect_success("cred_delete", output)?)?;
        }
        CredCommands::Export { prefix } => {
            let args: Vec<String> = prefix.into_iter().collect();
            let output = call(process, script, "cred_export", &args)?;
            write!(out, "{}", expect_success("cred_export", output)?)?;
        }
    }

    Ok(())
}

/// Keys are `service/environment/name`.
fn validate_key(key: &str) -> Result<(), CliError> {
    if key.split('/').count() < 3 {
        return Err(CliError::failed_with_help(
            format!("Invalid key format: {key}"),
            "Use service/environment/name, e.g. oracle/prod/password",
        ));
    }
    Ok(())
}

fn confirm(key: &str, input: &mut impl BufRead, out: &mut impl Write) -> Result<bool, CliError> {
    write!(out, "Delete credential '{key}'? [y/N] ")?;
    out.flush()?;

    let mut answer = String::new();
    input
        .read_line(&mut answer)
        .map_err(|e| CliError::failed(format!("Failed to read confirmation: {e}")))?;

    let answer = answer.trim().to_ascii_lowercase();
    Ok(answer == "y" || answer == "yes")
}

fn call(
    process: &impl ExternalProcess,
    script: &Path,
    function: &str,
    args: &[String],
) -> Result<ProcessOutput, CliError> {
    let mut argv = vec![
        "-c".to_string(),
        BASH_SHIM.to_string(),
        "dcx".to_string(),
        script.display().to_string(),
        function.to_string(),
    ];
    argv.extend_from_slice(args);

    debug!(%function, "Calling credential library");
    Ok(process.invoke(&argv, StdinMode::Inherit)?)
}

fn expect_success(function: &str, output: ProcessOutput) -> Result<String, CliError> {
    if output.success() {
        return Ok(output.stdout);
    }

    let detail = [output.stdout.trim(), output.stderr.trim()]
        .into_iter()
        .find(|s| !s.is_empty())
        .map_or_else(
            || match output.status {
                Some(code) => format!("exit status {code}"),
                None => "terminated by signal".to_string(),
            },
            str::to_string,
        );
    Err(CliError::failed(format!("{function} failed: {detail}")))
}
