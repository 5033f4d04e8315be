//! shell::mock
//!
//! Scripted [`Shell`] for deterministic tests.
//!
//! # Example
//!
//! ```
//! use jarvis::shell::mock::MockShell;
//! use jarvis::shell::Shell;
//!
//! let shell = MockShell::new().with_stdout("sysctl -n hw.pagesize", "16384\n");
//! assert_eq!(shell.capture_line("sysctl", &["-n", "hw.pagesize"]).as_deref(), Some("16384"));
//! assert_eq!(shell.capture("uptime", &[]), None);
//! assert_eq!(shell.calls(), vec!["sysctl -n hw.pagesize", "uptime"]);
//! ```

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use super::{display_command, Exit, Output, Shell, ShellError};

/// Mock shell keyed by the full command line.
///
/// Unscripted commands fail as if the program were missing. `which <name>`
/// succeeds for names registered with [`with_program`](Self::with_program).
#[derive(Debug, Clone, Default)]
pub struct MockShell {
    inner: Arc<Mutex<MockShellInner>>,
}

#[derive(Debug, Default)]
struct MockShellInner {
    outputs: HashMap<String, Output>,
    statuses: HashMap<String, bool>,
    calls: Vec<String>,
}

impl MockShell {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, MockShellInner> {
        match self.inner.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    /// Script a successful captured run.
    pub fn with_stdout(self, command: &str, stdout: &str) -> Self {
        self.with_output(command, Output::ok(stdout))
    }

    /// Script an arbitrary captured run.
    pub fn with_output(self, command: &str, output: Output) -> Self {
        self.lock().outputs.insert(command.to_string(), output);
        self
    }

    /// Script the exit status of an attached run.
    pub fn with_status(self, command: &str, success: bool) -> Self {
        self.lock().statuses.insert(command.to_string(), success);
        self
    }

    /// Make `which <program>` succeed.
    pub fn with_program(self, program: &str) -> Self {
        let path = format!("/usr/bin/{}\n", program);
        self.with_stdout(&format!("which {}", program), &path)
    }

    /// Every command line run so far, in order.
    pub fn calls(&self) -> Vec<String> {
        self.lock().calls.clone()
    }
}

impl Shell for MockShell {
    fn output(&self, program: &str, args: &[&str]) -> Result<Output, ShellError> {
        let line = display_command(program, args);
        let mut inner = self.lock();
        inner.calls.push(line.clone());
        inner
            .outputs
            .get(&line)
            .cloned()
            .ok_or_else(|| ShellError::Spawn {
                program: program.to_string(),
                source: std::io::Error::new(std::io::ErrorKind::NotFound, "not scripted"),
            })
    }

    fn status(&self, program: &str, args: &[&str]) -> Result<Exit, ShellError> {
        let line = display_command(program, args);
        let mut inner = self.lock();
        inner.calls.push(line.clone());
        let success = inner.statuses.get(&line).copied().unwrap_or(false);
        Ok(Exit::from_success(success))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn records_calls() {
        let shell = MockShell::new()
            .with_status("hdiutil detach /Volumes/App", true)
            .with_program("create-dmg");
        assert!(shell.run("hdiutil", &["detach", "/Volumes/App"]).is_ok());
        assert!(shell.has_program("create-dmg"));
        assert!(!shell.has_program("lipo"));
        assert_eq!(
            shell.calls(),
            vec![
                "hdiutil detach /Volumes/App",
                "which create-dmg",
                "which lipo"
            ]
        );
    }

    #[test]
    fn unscripted_status_fails() {
        let shell = MockShell::new();
        let err = shell.run("xcodebuild", &["build"]).unwrap_err();
        assert!(matches!(err, ShellError::Failed { .. }));
        assert_eq!(err.to_string(), "xcodebuild build: exit code 1");
    }

    #[test]
    fn failed_output_not_captured() {
        let shell = MockShell::new().with_output("security list", Output::failed("denied"));
        assert_eq!(shell.capture("security", &["list"]), None);
    }
}
