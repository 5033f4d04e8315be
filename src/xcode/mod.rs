//! xcode
//!
//! macOS application release toolchain.
//!
//! Each step of the distribution pipeline is a separate module:
//!
//! - [`project`] - locate the Xcode project, read and bump `MARKETING_VERSION`
//! - [`build`] - drive `xcodebuild` for a Release build
//! - [`bundle`] - read Info.plist values and architectures of a built app
//! - [`signing`] - `codesign` the built app (Sparkle components first)
//! - [`package`] - wrap the app in a compressed DMG
//! - [`toolchain`] - installed tools, SDKs, certificates and keychains
//! - [`roadmap`] - where the current step sits in the pipeline
//!
//! All external programs are run through [`crate::shell::Shell`].

pub mod build;
pub mod bundle;
pub mod package;
pub mod project;
pub mod roadmap;
pub mod signing;
pub mod toolchain;

use std::path::PathBuf;

use thiserror::Error;

use crate::shell::ShellError;

pub use project::{ProjectKind, XcodeProject};
pub use roadmap::Step;

/// Errors from the Xcode toolchain.
#[derive(Debug, Error)]
pub enum XcodeError {
    #[error("no .pbxproj file found below {0}")]
    PbxprojNotFound(PathBuf),

    #[error("no .xcodeproj or .xcworkspace in {0}")]
    ProjectNotFound(PathBuf),

    #[error("MARKETING_VERSION not found in {0}")]
    VersionNotFound(PathBuf),

    #[error("invalid version '{0}': expected x.y.z")]
    InvalidVersion(String),

    #[error("no scheme given and none could be detected")]
    SchemeNotFound,

    #[error("application not found: {0}")]
    AppNotFound(PathBuf),

    #[error("no DMG mount point in hdiutil output")]
    MountPointNotFound,

    #[error("{step} failed: {source}")]
    Step {
        step: &'static str,
        #[source]
        source: ShellError,
    },

    #[error("failed to access {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid pattern: {0}")]
    Pattern(#[from] regex::Error),
}

impl XcodeError {
    pub(crate) fn io(path: impl Into<PathBuf>) -> impl FnOnce(std::io::Error) -> Self {
        let path = path.into();
        move |source| XcodeError::Io { path, source }
    }

    pub(crate) fn step(step: &'static str) -> impl FnOnce(ShellError) -> Self {
        move |source| XcodeError::Step { step, source }
    }
}
