//! xcode::build
//!
//! Release builds through `xcodebuild`.

use std::fmt;
use std::path::PathBuf;

use tracing::info;

use crate::shell::Shell;

use super::{XcodeError, XcodeProject};

/// Default derived-data directory.
pub const DEFAULT_BUILD_PATH: &str = "./temp";

/// Target architecture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Arch {
    #[default]
    Universal,
    X86_64,
    Arm64,
}

impl Arch {
    /// Value passed as `ARCHS=`.
    pub fn archs(self) -> &'static str {
        match self {
            Arch::Universal => "x86_64 arm64",
            Arch::X86_64 => "x86_64",
            Arch::Arm64 => "arm64",
        }
    }
}

impl fmt::Display for Arch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Arch::Universal => "universal",
            Arch::X86_64 => "x86_64",
            Arch::Arm64 => "arm64",
        })
    }
}

/// A Release build request.
#[derive(Debug, Clone)]
pub struct BuildOptions {
    pub project: XcodeProject,
    pub scheme: String,
    pub build_path: PathBuf,
    pub arch: Arch,
    pub verbose: bool,
    pub clean: bool,
}

impl BuildOptions {
    /// Arguments shared by the clean and build actions.
    pub fn base_args(&self) -> Vec<String> {
        let mut args = self.project.selector();
        args.extend([
            "-scheme".to_string(),
            self.scheme.clone(),
            "-configuration".to_string(),
            "Release".to_string(),
            "-derivedDataPath".to_string(),
            self.build_path.display().to_string(),
            "-destination".to_string(),
            "generic/platform=macOS".to_string(),
        ]);
        args.push(format!("ARCHS={}", self.arch.archs()));
        args.push("ONLY_ACTIVE_ARCH=NO".into());
        if !self.verbose {
            args.push("-quiet".into());
        }
        args
    }

    /// Base arguments followed by `action`.
    pub fn args_for(&self, action: &str) -> Vec<String> {
        let mut args = self.base_args();
        args.push(action.to_string());
        args
    }

    /// Where the built products land.
    pub fn products_dir(&self) -> PathBuf {
        self.build_path.join("Build/Products/Release")
    }
}

fn xcodebuild(shell: &dyn Shell, args: &[String], step: &'static str) -> Result<(), XcodeError> {
    let args: Vec<&str> = args.iter().map(String::as_str).collect();
    shell.run("xcodebuild", &args).map_err(XcodeError::step(step))
}

/// Clean (unless disabled) then build.
pub fn build(shell: &dyn Shell, opts: &BuildOptions) -> Result<(), XcodeError> {
    if opts.clean {
        info!(scheme = %opts.scheme, "cleaning previous build");
        xcodebuild(shell, &opts.args_for("clean"), "clean")?;
    }
    info!(scheme = %opts.scheme, arch = %opts.arch, "building");
    xcodebuild(shell, &opts.args_for("build"), "build")
}
