//! shell
//!
//! Single interface for running OS utilities.
//!
//! The system reporters and the Xcode toolchain shell out to `ps`, `df`,
//! `netstat`, `xcodebuild`, `codesign`, `hdiutil` and friends. They do so
//! only through the [`Shell`] trait so that parsing and orchestration can
//! be tested against canned output with [`mock::MockShell`].

pub mod mock;

use std::process::{Command, Stdio};

use thiserror::Error;
use tracing::debug;

/// Errors from running external programs.
#[derive(Debug, Error)]
pub enum ShellError {
    #[error("failed to run {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{command}: {detail}")]
    Failed { command: String, detail: String },
}

impl ShellError {
    /// A finished run that failed. Non-empty stderr is preferred as the
    /// detail, otherwise the exit code.
    pub fn failed(command: String, code: Option<i32>, stderr: &str) -> Self {
        let stderr = stderr.trim();
        let detail = if stderr.is_empty() {
            describe_exit(code)
        } else {
            stderr.to_string()
        };
        ShellError::Failed { command, detail }
    }
}

/// `exit code N`, or a note that the process was killed by a signal.
pub fn describe_exit(code: Option<i32>) -> String {
    match code {
        Some(code) => format!("exit code {}", code),
        None => "terminated by signal".to_string(),
    }
}

/// How an attached run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Exit {
    pub success: bool,
    pub code: Option<i32>,
}

impl Exit {
    /// Exit with status 0 or 1.
    pub fn from_success(success: bool) -> Self {
        Self {
            success,
            code: Some(if success { 0 } else { 1 }),
        }
    }
}

/// Captured result of a finished program.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Output {
    pub success: bool,
    pub code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl Output {
    /// Successful output with the given stdout.
    pub fn ok(stdout: impl Into<String>) -> Self {
        Self {
            success: true,
            code: Some(0),
            stdout: stdout.into(),
            stderr: String::new(),
        }
    }

    /// Failed output with the given stderr.
    pub fn failed(stderr: impl Into<String>) -> Self {
        Self {
            success: false,
            code: Some(1),
            stdout: String::new(),
            stderr: stderr.into(),
        }
    }
}

/// Runs external programs.
pub trait Shell {
    /// Run to completion capturing stdout and stderr.
    fn output(&self, program: &str, args: &[&str]) -> Result<Output, ShellError>;

    /// Run with the terminal attached and report how it ended.
    fn status(&self, program: &str, args: &[&str]) -> Result<Exit, ShellError>;

    /// Stdout of a successful run, `None` when it fails or cannot start.
    fn capture(&self, program: &str, args: &[&str]) -> Option<String> {
        match self.output(program, args) {
            Ok(out) if out.success => Some(out.stdout),
            _ => None,
        }
    }

    /// Trimmed stdout of a successful run, `None` if empty.
    fn capture_line(&self, program: &str, args: &[&str]) -> Option<String> {
        self.capture(program, args)
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
    }

    /// Run with the terminal attached, failing on a non-zero exit.
    fn run(&self, program: &str, args: &[&str]) -> Result<(), ShellError> {
        let exit = self.status(program, args)?;
        if exit.success {
            Ok(())
        } else {
            Err(ShellError::failed(display_command(program, args), exit.code, ""))
        }
    }

    /// Whether `program` is on `PATH`.
    fn has_program(&self, program: &str) -> bool {
        matches!(self.output("which", &[program]), Ok(out) if out.success)
    }
}

/// Render a command line for messages.
pub fn display_command(program: &str, args: &[&str]) -> String {
    std::iter::once(program)
        .chain(args.iter().copied())
        .collect::<Vec<_>>()
        .join(" ")
}

/// [`Shell`] backed by `std::process::Command`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemShell;

impl Shell for SystemShell {
    fn output(&self, program: &str, args: &[&str]) -> Result<Output, ShellError> {
        debug!(command = %display_command(program, args), "spawn");
        let out = Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .output()
            .map_err(|source| ShellError::Spawn {
                program: program.to_string(),
                source,
            })?;
        Ok(Output {
            success: out.status.success(),
            code: out.status.code(),
            stdout: String::from_utf8_lossy(&out.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&out.stderr).into_owned(),
        })
    }

    fn status(&self, program: &str, args: &[&str]) -> Result<Exit, ShellError> {
        debug!(command = %display_command(program, args), "spawn attached");
        let status = Command::new(program)
            .args(args)
            .status()
            .map_err(|source| ShellError::Spawn {
                program: program.to_string(),
                source,
            })?;
        Ok(Exit {
            success: status.success(),
            code: status.code(),
        })
    }
}
