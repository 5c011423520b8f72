use dcx_core::{ExternalProcess, StdinMode, SystemProcess};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use super::Context;
use crate::cli::CliError;

/// Run `sg scan` once per rule file in `etc/rules`.
///
/// Lints `lib` and `bin` under the root unless `paths` is given. Missing
/// rules are not an error.
///
/// # Errors
///
/// Fails when `sg` is not available or any rule reports findings.
pub fn execute_lint(ctx: &Context, paths: &[PathBuf], out: &mut impl Write) -> Result<(), CliError> {
    let sg = ctx.locate("sg").ok_or_else(|| {
        CliError::failed_with_help("ast-grep (sg) not installed.", "Run: dcx tools install sg")
    })?;

    let rules_dir = ctx.paths.rules_dir();
    if !rules_dir.is_dir() {
        writeln!(out, "No rules directory found at {}", rules_dir.display())?;
        writeln!(out, "Create YAML rule files in etc/rules/ to enable linting.")?;
        return Ok(());
    }

    let rules = rule_files(&rules_dir);
    if rules.is_empty() {
        writeln!(out, "No rule files (*.yml) found in {}", rules_dir.display())?;
        return Ok(());
    }

    let targets = if paths.is_empty() {
        vec![ctx.paths.lib_dir(), ctx.paths.bin_dir()]
    } else {
        paths.to_vec()
    };

    let process = SystemProcess::new(sg.path)
        .current_dir(ctx.paths.root())
        .inherit_stderr(true);

    run_rules(&process, &rules, &targets, out)
}

fn rule_files(dir: &Path) -> Vec<PathBuf> {
    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) => {
            warn!(dir = %dir.display(), error = %e, "Cannot read rules directory");
            return Vec::new();
        }
    };

    let mut rules: Vec<PathBuf> = entries
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| path.is_file() && path.extension().is_some_and(|ext| ext == "yml"))
        .collect();
    rules.sort();
    rules
}

fn run_rules(
    sg: &impl ExternalProcess,
    rules: &[PathBuf],
    targets: &[PathBuf],
    out: &mut impl Write,
) -> Result<(), CliError> {
    let mut has_issues = false;

    for rule in rules {
        let name = rule
            .file_name()
            .map_or_else(|| rule.display().to_string(), |n| n.to_string_lossy().into_owned());
        writeln!(out, "=== Checking: {name} ===")?;

        let mut args = vec![
            "scan".to_string(),
            "--rule".to_string(),
            rule.display().to_string(),
        ];
        args.extend(targets.iter().map(|p| p.display().to_string()));

        let output = sg.invoke(&args, StdinMode::Null)?;
        write!(out, "{}", output.stdout)?;
        writeln!(out)?;

        if !output.success() {
            debug!(rule = %name, status = ?output.status, "Rule reported findings");
            has_issues = true;
        }
    }

    if has_issues {
        return Err(CliError::failed("Lint found issues"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use dcx_core::ProcessOutput;
    use std::cell::RefCell;

    /// Fails whichever rule file name contains `bad`.
    struct FakeSg {
        calls: RefCell<Vec<Vec<String>>>,
    }

    impl ExternalProcess for FakeSg {
        fn invoke(&self, args: &[String], _stdin: StdinMode) -> dcx_core::Result<ProcessOutput> {
            self.calls.borrow_mut().push(args.to_vec());
            let bad = args[2].contains("bad");
            Ok(ProcessOutput {
                stdout: if bad { "warning: unquoted\n".into() } else { String::new() },
                stderr: String::new(),
                status: Some(i32::from(bad)),
            })
        }
    }

    fn fake() -> FakeSg {
        FakeSg {
            calls: RefCell::new(Vec::new()),
        }
    }

    #[test]
    fn test_rules_run_in_order_against_targets() {
        let sg = fake();
        let rules = [PathBuf::from("/r/a.yml"), PathBuf::from("/r/b.yml")];
        let targets = [PathBuf::from("lib"), PathBuf::from("bin")];

        let mut out = Vec::new();
        run_rules(&sg, &rules, &targets, &mut out).unwrap();

        assert_eq!(
            String::from_utf8(out).unwrap(),
            "=== Checking: a.yml ===\n\n=== Checking: b.yml ===\n\n"
        );
        assert_eq!(
            sg.calls.borrow()[1],
            ["scan", "--rule", "/r/b.yml", "lib", "bin"]
        );
    }

    #[test]
    fn test_findings_fail_after_all_rules() {
        let sg = fake();
        let rules = [PathBuf::from("/r/bad.yml"), PathBuf::from("/r/good.yml")];

        let mut out = Vec::new();
        let err = run_rules(&sg, &rules, &[PathBuf::from(".")], &mut out).unwrap_err();

        assert_eq!(err.to_string(), "Lint found issues");
        assert_eq!(sg.calls.borrow().len(), 2);
        assert!(String::from_utf8(out).unwrap().contains("warning: unquoted"));
    }

    #[test]
    fn test_rule_files_sorted_and_filtered() {
        let dir = tempfile::TempDir::new().unwrap();
        for name in ["z.yml", "a.yml", "notes.md", "b.yaml"] {
            std::fs::write(dir.path().join(name), "id: x\n").unwrap();
        }

        let names: Vec<_> = rule_files(dir.path())
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, ["a.yml", "z.yml"]);
    }

    #[cfg(unix)]
    mod sandboxed {
        use super::super::*;
        use crate::cli::{EXIT_FAILURE, exit_code_for};
        use crate::commands::test_support::{Sandbox, output};

        #[test]
        fn test_missing_sg_fails() {
            let sandbox = Sandbox::new();
            let err = execute_lint(&sandbox.ctx, &[], &mut Vec::new()).unwrap_err();
            assert_eq!(exit_code_for(&err), EXIT_FAILURE);
        }

        #[test]
        fn test_no_rules_directory_is_ok() {
            let sandbox = Sandbox::new();
            sandbox.bin_script("sg", "exit 1");

            let mut buf = Vec::new();
            execute_lint(&sandbox.ctx, &[], &mut buf).unwrap();
            assert!(output(buf).starts_with("No rules directory found at"));
        }

        #[test]
        fn test_runs_bundled_sg() {
            let sandbox = Sandbox::new();
            sandbox.bin_script("sg", "echo \"sg $*\"");
            sandbox.write("etc/rules/quote.yml", "id: quote\n");

            let mut buf = Vec::new();
            execute_lint(&sandbox.ctx, &[PathBuf::from("lib")], &mut buf).unwrap();
            let text = output(buf);
            assert!(text.starts_with("=== Checking: quote.yml ===\nsg scan --rule "));
            assert!(text.contains("quote.yml lib\n"));
        }
    }
}
