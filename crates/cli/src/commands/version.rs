use dcx_core::ProjectConfig;
use std::io::Write;

use super::{BUNDLED_TOOLS, Context};
use crate::cli::CliError;

/// Print version, platform, root and where each bundled tool resolves.
///
/// # Errors
///
/// Only fails when output cannot be written.
pub fn execute_version(ctx: &Context, out: &mut impl Write) -> Result<(), CliError> {
    let project = ProjectConfig::load(&ctx.paths)
        .unwrap_or_default()
        .project;

    writeln!(
        out,
        "{} v{} - {}",
        project.name,
        env!("CARGO_PKG_VERSION"),
        project.full_name
    )?;
    writeln!(out, "Platform: {}", ctx.platform)?;
    writeln!(
        out,
        "{}: {}",
        dcx_core::EXPORTED_HOME_ENV,
        ctx.paths.root().display()
    )?;
    writeln!(out)?;

    writeln!(out, "Bundled tools:")?;
    let locator = ctx.locator();
    for (tool, required) in BUNDLED_TOOLS {
        match locator.locate(tool) {
            Some(found) => writeln!(out, "  {tool}: {}", found.path.display())?,
            None if *required => writeln!(out, "  {tool}: (not found - required)")?,
            None => writeln!(out, "  {tool}: (optional)")?,
        }
    }

    Ok(())
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use crate::commands::test_support::{Sandbox, output};

    #[test]
    fn test_version_lists_tool_status() {
        let sandbox = Sandbox::new();
        let gum = sandbox.bin_script("gum", "echo gum");

        let mut buf = Vec::new();
        execute_version(&sandbox.ctx, &mut buf).unwrap();
        let text = output(buf);

        assert!(text.starts_with(&format!(
            "DCX v{} - Datacosmos Command eXecutor\n",
            env!("CARGO_PKG_VERSION")
        )));
        assert!(text.contains("Platform: linux-amd64\n"));
        assert!(text.contains(&format!("  gum: {}\n", gum.display())));
        assert!(text.contains("  yq: (not found - required)\n"));
        assert!(text.contains("  sg: (optional)\n"));
    }

    #[test]
    fn test_version_uses_project_name() {
        let sandbox = Sandbox::new();
        sandbox.write("etc/tools.yaml", "tools: {}\n");
        sandbox.write(
            "etc/project.yaml",
            "project:\n  name: ACME\n  full_name: Acme Tools\n  repo: acme/tools\n",
        );

        let mut buf = Vec::new();
        execute_version(&sandbox.ctx, &mut buf).unwrap();
        assert!(output(buf).starts_with("ACME v"));
    }
}
