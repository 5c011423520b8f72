//! Seam for delegating work to external programs.
//!
//! Credential handling (`cred.sh`), linting (`sg`) and tool smoke tests all
//! run as child processes. Commands depend on [`ExternalProcess`] so tests
//! can substitute a scripted double.

use std::ffi::OsString;
use std::io::{self, Write};
use std::path::PathBuf;
use std::process::{Command, Stdio};
use std::thread;
use tracing::debug;

use crate::{Error, Result};

/// How the child's standard input is wired.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StdinMode {
    /// Share the parent's stdin (interactive prompts).
    Inherit,
    /// Closed stdin.
    Null,
    /// Feed these bytes, then close.
    Bytes(Vec<u8>),
}

/// Captured result of a finished child.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProcessOutput {
    /// Captured stdout.
    pub stdout: String,
    /// Captured stderr (empty when stderr is passed through).
    pub stderr: String,
    /// Exit code, `None` when killed by a signal.
    pub status: Option<i32>,
}

impl ProcessOutput {
    /// True when the child exited with code 0.
    #[must_use]
    pub fn success(&self) -> bool {
        self.status == Some(0)
    }
}

/// Something that can be run with arguments and report its output.
pub trait ExternalProcess {
    /// Run to completion.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Process`] when the program cannot be started. A
    /// non-zero exit is not an error; inspect [`ProcessOutput::status`].
    fn invoke(&self, args: &[String], stdin: StdinMode) -> Result<ProcessOutput>;
}

/// [`ExternalProcess`] backed by [`std::process::Command`].
#[derive(Debug, Clone)]
pub struct SystemProcess {
    program: PathBuf,
    current_dir: Option<PathBuf>,
    envs: Vec<(OsString, OsString)>,
    inherit_stderr: bool,
}

impl SystemProcess {
    /// Process running `program`.
    #[must_use]
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            current_dir: None,
            envs: Vec::new(),
            inherit_stderr: false,
        }
    }

    /// Run in `dir` instead of the current directory.
    #[must_use]
    pub fn current_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.current_dir = Some(dir.into());
        self
    }

    /// Add an environment variable for the child.
    #[must_use]
    pub fn env(mut self, key: impl Into<OsString>, value: impl Into<OsString>) -> Self {
        self.envs.push((key.into(), value.into()));
        self
    }

    /// Send the child's stderr straight to ours instead of capturing it.
    #[must_use]
    pub fn inherit_stderr(mut self, inherit: bool) -> Self {
        self.inherit_stderr = inherit;
        self
    }
}

impl ExternalProcess for SystemProcess {
    fn invoke(&self, args: &[String], stdin: StdinMode) -> Result<ProcessOutput> {
        let program = self.program.display().to_string();
        debug!(%program, ?args, "Running external process");

        let mut cmd = Command::new(&self.program);
        cmd.args(args);
        if let Some(dir) = &self.current_dir {
            cmd.current_dir(dir);
        }
        for (key, value) in &self.envs {
            cmd.env(key, value);
        }

        cmd.stdout(Stdio::piped());
        cmd.stderr(if self.inherit_stderr {
            Stdio::inherit()
        } else {
            Stdio::piped()
        });
        cmd.stdin(match &stdin {
            StdinMode::Inherit => Stdio::inherit(),
            StdinMode::Null => Stdio::null(),
            StdinMode::Bytes(_) => Stdio::piped(),
        });

        let mut child = cmd.spawn().map_err(|e| Error::process(&program, e))?;

        // Feed stdin from its own thread so a child that fills its stdout
        // pipe before reading all input cannot block us.
        let writer = match (stdin, child.stdin.take()) {
            (StdinMode::Bytes(bytes), Some(mut pipe)) => Some(thread::spawn(move || {
                match pipe.write_all(&bytes) {
                    Err(e) if e.kind() == io::ErrorKind::BrokenPipe => Ok(()),
                    other => other,
                }
            })),
            _ => None,
        };

        let output = child
            .wait_with_output()
            .map_err(|e| Error::process(&program, e))?;

        if let Some(writer) = writer {
            writer
                .join()
                .unwrap_or_else(|_| Err(io::Error::other("stdin writer panicked")))
                .map_err(|e| Error::process(&program, e))?;
        }

        debug!(%program, status = ?output.status.code(), "External process finished");
        Ok(ProcessOutput {
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            status: output.status.code(),
        })
    }
}
