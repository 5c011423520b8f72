//! `dcx config`: project identity, resolved paths and YAML lookups for
//! shell scripts.

use dcx_core::{HOME_ENV, ProjectConfig, yaml};
use std::io::Write;
use std::path::Path;
use tracing::debug;

use super::Context;
use crate::cli::{CliError, ConfigCommands};

const KNOWN_KEYS: &str = "name, full_name, repo, home, bin, etc, lib, cache, platform";

/// Dispatch `dcx config`, defaulting to `show`.
///
/// # Errors
///
/// Fails on unknown keys, a malformed project document, or when `yaml-has`
/// finds nothing.
pub fn execute_config(
    ctx: &Context,
    command: Option<ConfigCommands>,
    out: &mut impl Write,
) -> Result<(), CliError> {
    match command.unwrap_or(ConfigCommands::Show) {
        ConfigCommands::Show => execute_show(ctx, out),
        ConfigCommands::Get { key } => execute_get(ctx, &key, out),
        ConfigCommands::Paths => execute_paths(ctx, out),
        ConfigCommands::YamlGet { file, key, default } => {
            execute_yaml_get(&file, &key, default.as_deref(), out)
        }
        ConfigCommands::YamlHas { file, key } => execute_yaml_has(&file, &key),
        ConfigCommands::YamlKeys { file, path } => {
            execute_yaml_keys(&file, path.as_deref().unwrap_or(""), out)
        }
    }
}

fn execute_show(ctx: &Context, out: &mut impl Write) -> Result<(), CliError> {
    let project = ProjectConfig::load(&ctx.paths)?.project;
    let paths = &ctx.paths;

    writeln!(out, "Project:")?;
    writeln!(out, "  Name:      {}", project.name)?;
    writeln!(out, "  Full name: {}", project.full_name)?;
    writeln!(out, "  Repo:      {}", project.repo)?;
    writeln!(out)?;
    writeln!(out, "Paths:")?;
    writeln!(out, "  {HOME_ENV}:   {}", paths.root().display())?;
    writeln!(out, "  Binaries:  {}", paths.bin_dir().display())?;
    writeln!(out, "  Config:    {}", paths.etc_dir().display())?;
    writeln!(out, "  Library:   {}", paths.lib_dir().display())?;
    writeln!(out, "  Cache:     {}", paths.cache_dir().display())?;
    writeln!(out, "  Platform:  {}", ctx.platform)?;
    Ok(())
}

fn execute_get(ctx: &Context, key: &str, out: &mut impl Write) -> Result<(), CliError> {
    let paths = &ctx.paths;
    let value = match key {
        "name" | "project.name" => ProjectConfig::load(paths)?.project.name,
        "full_name" | "project.full_name" => ProjectConfig::load(paths)?.project.full_name,
        "repo" | "project.repo" => ProjectConfig::load(paths)?.project.repo,
        "home" | HOME_ENV => paths.root().display().to_string(),
        "bin" | "bin_dir" => paths.bin_dir().display().to_string(),
        "etc" | "etc_dir" => paths.etc_dir().display().to_string(),
        "lib" | "lib_dir" => paths.lib_dir().display().to_string(),
        "cache" | "cache_dir" => paths.cache_dir().display().to_string(),
        "platform" => ctx.platform.to_string(),
        other => {
            return Err(CliError::failed_with_help(
                format!("Unknown config key: {other}"),
                format!("Known keys: {KNOWN_KEYS}"),
            ));
        }
    };

    writeln!(out, "{value}")?;
    Ok(())
}

fn execute_paths(ctx: &Context, out: &mut impl Write) -> Result<(), CliError> {
    let paths = &ctx.paths;
    let assignments = [
        (HOME_ENV, paths.root().display().to_string()),
        ("DC_BIN_DIR", paths.bin_dir().display().to_string()),
        ("DC_ETC_DIR", paths.etc_dir().display().to_string()),
        ("DC_LIB_DIR", paths.lib_dir().display().to_string()),
        ("DC_CACHE_DIR", paths.cache_dir().display().to_string()),
        ("DC_PLATFORM", ctx.platform.to_string()),
    ];
    for (name, value) in assignments {
        writeln!(out, "{name}={}", shell_quote(&value))?;
    }
    Ok(())
}

/// Single-quote `value` for POSIX shells; embedded quotes become `'\''`.
fn shell_quote(value: &str) -> String {
    format!("'{}'", value.replace('\'', r"'\''"))
}

/// Print the value at `key`, or `default` when the key, the file or the
/// document is unusable. Prints nothing if there is no default.
fn execute_yaml_get(
    file: &Path,
    key: &str,
    default: Option<&str>,
    out: &mut impl Write,
) -> Result<(), CliError> {
    let value = match yaml::load(file) {
        Ok(doc) => yaml::lookup(&doc, key).map(yaml::render),
        Err(e) => {
            debug!(error = %e, "Falling back to default");
            None
        }
    };

    if let Some(value) = value.as_deref().or(default) {
        writeln!(out, "{value}")?;
    }
    Ok(())
}

fn execute_yaml_has(file: &Path, key: &str) -> Result<(), CliError> {
    let doc = yaml::load(file).map_err(|e| {
        debug!(error = %e, "Treating unreadable document as missing key");
        CliError::Silent
    })?;

    if yaml::lookup(&doc, key).is_some() {
        Ok(())
    } else {
        Err(CliError::Silent)
    }
}

fn execute_yaml_keys(file: &Path, path: &str, out: &mut impl Write) -> Result<(), CliError> {
    let Ok(doc) = yaml::load(file) else {
        return Ok(());
    };
    for key in yaml::keys(&doc, path) {
        writeln!(out, "{key}")?;
    }
    Ok(())
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use crate::cli::{EXIT_FAILURE, exit_code_for};
    use crate::commands::test_support::{Sandbox, output};

    const DOC: &str = "project:\n  name: demo\n  tags: [a, b]\nservices:\n  db:\n    port: 5432\n  cache:\n    port: 6379\n";

    fn run(ctx: &Context, command: ConfigCommands) -> Result<String, CliError> {
        let mut buf = Vec::new();
        execute_config(ctx, Some(command), &mut buf)?;
        Ok(output(buf))
    }

    #[test]
    fn test_get_defaults_without_project_file() {
        let sandbox = Sandbox::new();
        let repo = run(&sandbox.ctx, ConfigCommands::Get { key: "repo".into() }).unwrap();
        assert_eq!(repo, "datacosmos-br/dcx\n");
        let platform = run(&sandbox.ctx, ConfigCommands::Get { key: "platform".into() }).unwrap();
        assert_eq!(platform, "linux-amd64\n");
    }

    #[test]
    fn test_get_paths() {
        let sandbox = Sandbox::new();
        let bin = run(&sandbox.ctx, ConfigCommands::Get { key: "bin".into() }).unwrap();
        assert_eq!(bin.trim_end(), sandbox.root().join("bin").display().to_string());
        let home = run(&sandbox.ctx, ConfigCommands::Get { key: "DC_HOME".into() }).unwrap();
        assert_eq!(home.trim_end(), sandbox.root().display().to_string());
        assert!(run(&sandbox.ctx, ConfigCommands::Get { key: "DCX_HOME".into() }).is_err());
    }

    #[test]
    fn test_get_unknown_key_fails() {
        let sandbox = Sandbox::new();
        let err = run(&sandbox.ctx, ConfigCommands::Get { key: "colour".into() }).unwrap_err();
        assert_eq!(exit_code_for(&err), EXIT_FAILURE);
    }

    #[test]
    fn test_show_reads_project_file() {
        let sandbox = Sandbox::new();
        sandbox.write(
            "etc/project.yaml",
            "project:\n  name: ACME\n  full_name: Acme Tools\n  repo: acme/tools\n",
        );
        let text = execute_show_text(&sandbox);
        assert!(text.contains("Name:      ACME"));
        assert!(text.contains("Platform:  linux-amd64"));
    }

    fn execute_show_text(sandbox: &Sandbox) -> String {
        let mut buf = Vec::new();
        execute_config(&sandbox.ctx, None, &mut buf).unwrap();
        output(buf)
    }

    #[test]
    fn test_paths_are_shell_assignments() {
        let sandbox = Sandbox::new();
        let text = run(&sandbox.ctx, ConfigCommands::Paths).unwrap();
        assert_eq!(text.lines().count(), 6);
        assert!(text.starts_with(&format!("DC_HOME='{}'\n", sandbox.root().display())));
        assert!(text.contains(&format!(
            "DC_LIB_DIR='{}'",
            sandbox.root().join("lib").display()
        )));
        assert!(text.ends_with("DC_PLATFORM='linux-amd64'\n"));
    }

    #[test]
    fn test_shell_quote_escapes_single_quotes() {
        assert_eq!(shell_quote("/opt/dc"), "'/opt/dc'");
        assert_eq!(shell_quote("it's"), r"'it'\''s'");
        assert_eq!(shell_quote(r#"r$(touch x)"y`z`"#), r#"'r$(touch x)"y`z`'"#);
    }

    #[test]
    fn test_paths_survive_eval_with_hostile_root() {
        let sandbox = Sandbox::new();
        let root = sandbox.root().join("r$(touch PWNED)\"x'y");
        let ctx = Context::new(
            dcx_core::InstallationPaths::from_root(&root),
            dcx_core::Platform::new("linux", "amd64"),
        );
        let text = run(&ctx, ConfigCommands::Paths).unwrap();

        let status = std::process::Command::new("sh")
            .arg("-c")
            .arg(format!("{text}[ \"$DC_HOME\" = \"$1\" ]"))
            .arg("sh")
            .arg(&root)
            .current_dir(sandbox.root())
            .status()
            .unwrap();
        assert!(status.success());
        assert!(!sandbox.root().join("PWNED").exists());
    }

    #[test]
    fn test_yaml_get() {
        let sandbox = Sandbox::new();
        let file = sandbox.write("doc.yaml", DOC);

        let get = |key: &str, default: Option<&str>| {
            run(
                &sandbox.ctx,
                ConfigCommands::YamlGet {
                    file: file.clone(),
                    key: key.into(),
                    default: default.map(String::from),
                },
            )
            .unwrap()
        };

        assert_eq!(get("project.name", None), "demo\n");
        assert_eq!(get("services.db.port", None), "5432\n");
        assert_eq!(get("project.missing", Some("fallback")), "fallback\n");
        assert_eq!(get("project.missing", None), "");
    }

    #[test]
    fn test_yaml_get_missing_file_uses_default() {
        let sandbox = Sandbox::new();
        let text = run(
            &sandbox.ctx,
            ConfigCommands::YamlGet {
                file: sandbox.root().join("absent.yaml"),
                key: "a".into(),
                default: Some("d".into()),
            },
        )
        .unwrap();
        assert_eq!(text, "d\n");
    }

    #[test]
    fn test_yaml_has() {
        let sandbox = Sandbox::new();
        let file = sandbox.write("doc.yaml", DOC);

        assert!(execute_yaml_has(&file, "services.cache").is_ok());
        assert!(matches!(
            execute_yaml_has(&file, "services.queue"),
            Err(CliError::Silent)
        ));
        assert!(matches!(
            execute_yaml_has(&sandbox.root().join("absent.yaml"), "a"),
            Err(CliError::Silent)
        ));
    }

    #[test]
    fn test_yaml_keys() {
        let sandbox = Sandbox::new();
        let file = sandbox.write("doc.yaml", DOC);

        let keys = |path: Option<&str>| {
            run(
                &sandbox.ctx,
                ConfigCommands::YamlKeys {
                    file: file.clone(),
                    path: path.map(String::from),
                },
            )
            .unwrap()
        };

        assert_eq!(keys(None), "project\nservices\n");
        assert_eq!(keys(Some("services")), "db\ncache\n");
        assert_eq!(keys(Some("project.name")), "");
    }
}
