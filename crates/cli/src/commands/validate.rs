//! `dcx validate`: run each bundled tool against a tiny fixture.

use dcx_core::{ExternalProcess, StdinMode, SystemProcess};
use std::io::Write;
use std::path::Path;
use tracing::debug;

use super::{BUNDLED_TOOLS, Context};
use crate::cli::CliError;

/// Outcome of one smoke test.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Verdict {
    Ok(String),
    Fail(&'static str),
    Missing,
}

/// Smoke-test every bundled tool.
///
/// Optional tools never fail the run.
///
/// # Errors
///
/// Returns a command failure when a required tool is missing or broken.
pub fn execute_validate(ctx: &Context, out: &mut impl Write) -> Result<(), CliError> {
    let scratch = tempfile::Builder::new()
        .prefix("dcx-validate-")
        .tempdir()
        .map_err(|e| CliError::failed(format!("Failed to create temp dir: {e}")))?;

    writeln!(out, "Validating bundled tools...")?;
    writeln!(out)?;

    let locator = ctx.locator();
    let mut failed = 0;

    for (tool, required) in BUNDLED_TOOLS {
        let verdict = match locator.locate(tool) {
            Some(found) => smoke_test(tool, &SystemProcess::new(found.path), scratch.path()),
            None => Verdict::Missing,
        };

        let label = format!("{tool}:");
        let status = match (&verdict, *required) {
            (Verdict::Ok(version), _) => format!("OK ({version})"),
            (Verdict::Fail(reason), _) => format!("FAIL ({reason})"),
            (Verdict::Missing, true) => "MISSING (required)".to_string(),
            (Verdict::Missing, false) => "SKIP (optional)".to_string(),
        };
        writeln!(out, "  {label:<5}{status}")?;

        if *required && !matches!(verdict, Verdict::Ok(_)) {
            failed += 1;
        }
    }

    writeln!(out)?;

    if failed > 0 {
        return Err(CliError::failed_with_help(
            "Some required tools are missing or broken.",
            "Run 'dcx tools install --all' to install them.",
        ));
    }

    writeln!(out, "All required tools validated.")?;
    Ok(())
}

fn smoke_test(tool: &str, process: &impl ExternalProcess, scratch: &Path) -> Verdict {
    let works = match tool {
        "yq" => write_fixture(scratch, "test.yaml", "test: value").is_some_and(|file| {
            run(process, &[".test", &file]).is_some_and(|out| out.trim() == "value")
        }),
        "rg" => write_fixture(scratch, "test.txt", "test pattern here")
            .is_some_and(|file| run(process, &["-q", "pattern", &file]).is_some()),
        "fd" => write_fixture(scratch, "findme.txt", "").is_some_and(|_| {
            run(process, &["-q", "findme", &scratch.display().to_string()]).is_some()
        }),
        "sd" => {
            let Some(file) = write_fixture(scratch, "replace.txt", "old text") else {
                return Verdict::Fail("not working");
            };
            if run(process, &["old", "new", &file]).is_none() {
                return Verdict::Fail("not working");
            }
            let replaced = std::fs::read_to_string(&file).is_ok_and(|c| c.contains("new"));
            if !replaced {
                return Verdict::Fail("replacement didn't work");
            }
            true
        }
        _ => true,
    };

    if !works {
        return Verdict::Fail("not working");
    }

    match run(process, &["--version"]) {
        Some(version) => Verdict::Ok(version.lines().next().unwrap_or_default().trim().to_string()),
        None => Verdict::Fail("not working"),
    }
}

fn write_fixture(scratch: &Path, name: &str, content: &str) -> Option<String> {
    let path = scratch.join(name);
    match std::fs::write(&path, content) {
        Ok(()) => Some(path.display().to_string()),
        Err(e) => {
            debug!(path = %path.display(), error = %e, "Cannot write smoke-test fixture");
            None
        }
    }
}

/// Stdout of a successful run, `None` on spawn failure or non-zero exit.
fn run(process: &impl ExternalProcess, args: &[&str]) -> Option<String> {
    let args: Vec<String> = args.iter().map(|a| (*a).to_string()).collect();
    match process.invoke(&args, StdinMode::Null) {
        Ok(output) if output.success() => Some(output.stdout),
        Ok(output) => {
            debug!(?args, status = ?output.status, "Smoke test exited unsuccessfully");
            None
        }
        Err(e) => {
            debug!(?args, error = %e, "Smoke test could not run");
            None
        }
    }
}
