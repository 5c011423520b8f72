//! `dcx tools`: registry listing, installation and availability checks.

use dcx_core::{Origin, ToolRegistry};
use dcx_installer::{Downloader, InstallOutcome, Installer};
use serde::Serialize;
use std::io::Write;
use tracing::{info, instrument};

use super::Context;
use crate::cli::{CliError, ListFormat};

#[derive(Debug, Serialize)]
struct ToolStatus<'a> {
    name: &'a str,
    version: &'a str,
    required: bool,
    status: &'static str,
}

/// List registry tools in the requested format.
///
/// # Errors
///
/// Returns a configuration error when the registry is missing or malformed.
pub fn execute_list(ctx: &Context, format: ListFormat, out: &mut impl Write) -> Result<(), CliError> {
    let registry = ToolRegistry::load(&ctx.paths)?;
    let locator = ctx.locator();

    match format {
        ListFormat::Json => {
            let tools: Vec<ToolStatus<'_>> = registry
                .iter()
                .map(|(name, tool)| ToolStatus {
                    name,
                    version: &tool.version,
                    required: tool.required,
                    status: if locator.locate(name).is_some() {
                        "installed"
                    } else {
                        "missing"
                    },
                })
                .collect();
            let json = serde_json::to_string_pretty(&tools)
                .map_err(|e| CliError::failed(format!("Failed to encode tool list: {e}")))?;
            writeln!(out, "{json}")?;
        }
        ListFormat::Simple => {
            for (name, _) in registry.iter() {
                let mark = if locator.locate(name).is_some() { "x" } else { " " };
                writeln!(out, "[{mark}] {name}")?;
            }
        }
        ListFormat::Table => {
            writeln!(
                out,
                "{:<12} {:<10} {:<10} {:<10} Path",
                "Tool", "Version", "Required", "Status"
            )?;
            writeln!(
                out,
                "{:<12} {:<10} {:<10} {:<10} ----",
                "----", "-------", "--------", "------"
            )?;
            for (name, tool) in registry.iter() {
                let required = if tool.required { "yes" } else { "no" };
                let (status, path) = match locator.locate(name) {
                    Some(found) if found.origin == Origin::System => {
                        ("System", found.path.display().to_string())
                    }
                    Some(found) => ("OK", found.path.display().to_string()),
                    None => ("Missing", "-".to_string()),
                };
                writeln!(
                    out,
                    "{name:<12} {:<10} {required:<10} {status:<10} {path}",
                    tool.version
                )?;
            }
        }
    }

    Ok(())
}

/// Install one registry tool.
///
/// # Errors
///
/// Returns a configuration error for unknown tools or a missing platform URL,
/// and a command failure when download or extraction fails.
#[instrument(name = "tools_install", skip(ctx, downloader, out))]
pub fn execute_install(
    ctx: &Context,
    downloader: &impl Downloader,
    name: &str,
    force: bool,
    out: &mut impl Write,
) -> Result<(), CliError> {
    let registry = ToolRegistry::load(&ctx.paths)?;
    let installer =
        Installer::new(&ctx.paths, &registry, downloader).with_platform(ctx.platform.clone());

    writeln!(out, "Installing {name}...")?;
    let outcome = installer.install(name, force)?;
    write_outcome(out, name, &outcome)?;
    Ok(())
}

/// Install every registry tool, continuing past failures.
///
/// # Errors
///
/// Returns a command failure naming how many tools failed.
#[instrument(name = "tools_install_all", skip(ctx, downloader, out))]
pub fn execute_install_all(
    ctx: &Context,
    downloader: &impl Downloader,
    force: bool,
    out: &mut impl Write,
) -> Result<(), CliError> {
    let registry = ToolRegistry::load(&ctx.paths)?;
    let installer =
        Installer::new(&ctx.paths, &registry, downloader).with_platform(ctx.platform.clone());

    writeln!(out, "Installing all tools for {}...", ctx.platform)?;
    let report = installer.install_all(force);

    for (name, outcome) in &report.outcomes {
        write_outcome(out, name, outcome)?;
    }
    for (name, err) in &report.failures {
        writeln!(out, "  {name}: FAILED ({err})")?;
    }

    if report.failed() > 0 {
        return Err(CliError::failed(format!(
            "{} tool(s) failed to install",
            report.failed()
        )));
    }

    writeln!(out, "All tools installed!")?;
    Ok(())
}

/// Report missing required tools, installing them when asked to.
///
/// # Errors
///
/// Returns a command failure listing the missing tools, or when an automatic
/// install fails.
pub fn execute_check(
    ctx: &Context,
    downloader: &impl Downloader,
    auto: bool,
    out: &mut impl Write,
) -> Result<(), CliError> {
    let registry = ToolRegistry::load(&ctx.paths)?;
    let locator = ctx.locator();

    let missing: Vec<&str> = registry
        .iter()
        .filter(|(name, tool)| tool.required && locator.locate(name).is_none())
        .map(|(name, _)| name)
        .collect();

    if missing.is_empty() {
        writeln!(out, "All required tools are available.")?;
        return Ok(());
    }

    if !(auto || registry.settings().auto_download) {
        return Err(CliError::failed_with_help(
            format!("Missing required tools: {}", missing.join(", ")),
            "Run 'dcx tools install --all'",
        ));
    }

    info!(tools = ?missing, "Installing missing required tools");
    let installer =
        Installer::new(&ctx.paths, &registry, downloader).with_platform(ctx.platform.clone());

    let mut failed = Vec::new();
    for name in &missing {
        writeln!(out, "Installing {name}...")?;
        match installer.install(name, false) {
            Ok(outcome) => write_outcome(out, name, &outcome)?,
            Err(e) => {
                writeln!(out, "  {name}: FAILED ({e})")?;
                failed.push(*name);
            }
        }
    }

    if !failed.is_empty() {
        return Err(CliError::failed(format!(
            "Failed to install required tools: {}",
            failed.join(", ")
        )));
    }

    writeln!(out, "All required tools are available.")?;
    Ok(())
}

fn write_outcome(out: &mut impl Write, name: &str, outcome: &InstallOutcome) -> std::io::Result<()> {
    match outcome {
        InstallOutcome::AlreadyPresent { path } => {
            writeln!(out, "  {name}: already installed at {}", path.display())
        }
        InstallOutcome::Installed { path, version, .. } => {
            writeln!(out, "  {name}: installed {version} at {}", path.display())
        }
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use crate::cli::{EXIT_CONFIG, EXIT_FAILURE, exit_code_for};
    use crate::commands::test_support::{Sandbox, output};
    use flate2::Compression;
    use flate2::write::GzEncoder;
    use std::cell::RefCell;
    use std::path::Path;

    const REGISTRY: &str = r"
tools:
  gum:
    version: 0.14.0
    required: true
    urls:
      linux-amd64: https://example.test/gum-{version}.tar.gz
  yq:
    version: 4.44.1
    required: true
    urls:
      darwin-arm64: https://example.test/yq.tar.gz
  rg:
    version: 14.1.0
    urls:
      linux-amd64: https://example.test/rg.tar.gz
";

    /// Serves one tarball containing a `gum` script and fails everything else.
    struct StubDownloader {
        requests: RefCell<Vec<String>>,
    }

    impl StubDownloader {
        fn new() -> Self {
            Self {
                requests: RefCell::new(Vec::new()),
            }
        }
    }

    impl Downloader for StubDownloader {
        fn download(&self, url: &str, dest: &Path) -> dcx_installer::Result<()> {
            self.requests.borrow_mut().push(url.to_string());
            if !url.contains("gum") {
                return Err(dcx_installer::Error::download_failed(url, "HTTP 404"));
            }

            let file = std::fs::File::create(dest).unwrap();
            let encoder = GzEncoder::new(file, Compression::default());
            let mut builder = tar::Builder::new(encoder);
            let body = b"#!/bin/sh\necho gum\n";
            let mut header = tar::Header::new_gnu();
            header.set_size(body.len() as u64);
            header.set_mode(0o644);
            header.set_cksum();
            builder.append_data(&mut header, "gum", &body[..]).unwrap();
            builder.into_inner().unwrap().finish().unwrap();
            Ok(())
        }
    }

    fn sandbox_with_registry() -> Sandbox {
        let sandbox = Sandbox::new();
        sandbox.write("etc/tools.yaml", REGISTRY);
        sandbox
    }

    #[test]
    fn test_list_table_reports_status() {
        let sandbox = sandbox_with_registry();
        sandbox.bin_script("gum", "echo gum");
        sandbox.system_script("rg", "echo rg");

        let mut buf = Vec::new();
        execute_list(&sandbox.ctx, ListFormat::Table, &mut buf).unwrap();
        let text = output(buf);

        let row = |tool: &str| text.lines().find(|l| l.starts_with(tool)).unwrap().to_string();
        assert!(row("gum").contains("OK"));
        assert!(row("yq").contains("Missing"));
        assert!(row("yq").ends_with('-'));
        assert!(row("rg").contains("System"));
    }

    #[test]
    fn test_list_json_and_simple() {
        let sandbox = sandbox_with_registry();
        sandbox.bin_script("gum", "echo gum");

        let mut buf = Vec::new();
        execute_list(&sandbox.ctx, ListFormat::Json, &mut buf).unwrap();
        let parsed: serde_json::Value = serde_json::from_slice(&buf).unwrap();
        assert_eq!(parsed[0]["name"], "gum");
        assert_eq!(parsed[0]["status"], "installed");
        assert_eq!(parsed[1]["version"], "4.44.1");
        assert_eq!(parsed[1]["status"], "missing");

        let mut buf = Vec::new();
        execute_list(&sandbox.ctx, ListFormat::Simple, &mut buf).unwrap();
        assert_eq!(output(buf), "[x] gum\n[ ] yq\n[ ] rg\n");
    }

    #[test]
    fn test_list_without_registry_is_config_error() {
        let sandbox = Sandbox::new();
        let err = execute_list(&sandbox.ctx, ListFormat::Table, &mut Vec::new()).unwrap_err();
        assert_eq!(exit_code_for(&err), EXIT_CONFIG);
    }

    #[test]
    fn test_install_unknown_tool_is_config_error() {
        let sandbox = sandbox_with_registry();
        let downloader = StubDownloader::new();
        let err = execute_install(&sandbox.ctx, &downloader, "zz", false, &mut Vec::new())
            .unwrap_err();
        assert_eq!(exit_code_for(&err), EXIT_CONFIG);
        assert!(downloader.requests.borrow().is_empty());
    }

    #[test]
    fn test_install_places_binary() {
        let sandbox = sandbox_with_registry();
        let downloader = StubDownloader::new();

        let mut buf = Vec::new();
        execute_install(&sandbox.ctx, &downloader, "gum", false, &mut buf).unwrap();

        assert!(sandbox.root().join("bin/gum").is_file());
        assert!(output(buf).contains("gum: installed 0.14.0"));
        assert_eq!(
            downloader.requests.borrow().as_slice(),
            ["https://example.test/gum-0.14.0.tar.gz"]
        );
    }

    #[test]
    fn test_install_all_reports_failures() {
        let sandbox = sandbox_with_registry();
        let downloader = StubDownloader::new();

        let mut buf = Vec::new();
        let err = execute_install_all(&sandbox.ctx, &downloader, false, &mut buf).unwrap_err();

        assert_eq!(exit_code_for(&err), EXIT_FAILURE);
        assert!(err.to_string().contains("2 tool(s) failed"));
        let text = output(buf);
        assert!(text.contains("yq: FAILED"));
        assert!(text.contains("rg: FAILED"));
        assert!(sandbox.root().join("bin/gum").is_file());
    }

    #[test]
    fn test_check_lists_missing_required() {
        let sandbox = sandbox_with_registry();
        let downloader = StubDownloader::new();

        let err = execute_check(&sandbox.ctx, &downloader, false, &mut Vec::new()).unwrap_err();
        assert_eq!(err.to_string(), "Missing required tools: gum, yq");
        assert!(downloader.requests.borrow().is_empty());
    }

    #[test]
    fn test_check_passes_when_required_present() {
        let sandbox = sandbox_with_registry();
        sandbox.bin_script("gum", "echo gum");
        sandbox.system_script("yq", "echo yq");

        let mut buf = Vec::new();
        execute_check(&sandbox.ctx, &StubDownloader::new(), false, &mut buf).unwrap();
        assert_eq!(output(buf), "All required tools are available.\n");
    }

    #[test]
    fn test_check_auto_installs_and_reports_failure() {
        let sandbox = sandbox_with_registry();
        let downloader = StubDownloader::new();

        let mut buf = Vec::new();
        let err = execute_check(&sandbox.ctx, &downloader, true, &mut buf).unwrap_err();

        assert!(sandbox.root().join("bin/gum").is_file());
        assert!(err.to_string().contains("yq"));
        assert!(!err.to_string().contains("gum"));
    }

    #[test]
    fn test_check_honours_auto_download_setting() {
        let sandbox = Sandbox::new();
        sandbox.write(
            "etc/tools.yaml",
            "settings:\n  auto_download: true\ntools:\n  gum:\n    version: 0.14.0\n    required: true\n    urls:\n      linux-amd64: https://example.test/gum.tar.gz\n",
        );

        let mut buf = Vec::new();
        execute_check(&sandbox.ctx, &StubDownloader::new(), false, &mut buf).unwrap();
        assert!(sandbox.root().join("bin/gum").is_file());
    }
}
