//! xcode::signing
//!
//! Code signing with `codesign` and identity discovery with `security`.

use std::path::{Path, PathBuf};

use tracing::info;

use crate::shell::Shell;

use super::XcodeError;

/// Sparkle framework pieces signed inside-out before the app itself.
pub const SPARKLE_COMPONENTS: &[&str] = &[
    "Versions/B/Resources/Autoupdate.app/Contents/MacOS/Autoupdate",
    "Versions/B/Resources/Autoupdate.app",
    "Versions/B/Sparkle",
    "Sparkle",
];

const SPARKLE_FRAMEWORK: &str = "Contents/Frameworks/Sparkle.framework";

/// Location of `<scheme>.app` under a build path.
///
/// A build path that already points into `/Build/Products/` is used as
/// is; otherwise `Build/Products/Release` is appended.
pub fn app_path(build_path: &Path, scheme: &str) -> PathBuf {
    let app = format!("{}.app", scheme);
    if build_path.to_string_lossy().contains("/Build/Products/") {
        build_path.join(app)
    } else {
        build_path.join("Build/Products/Release").join(app)
    }
}

/// `codesign` arguments to sign `path` with hardened runtime and timestamp.
pub fn sign_args(path: &Path, identity: &str, verbose: bool) -> Vec<String> {
    let mut args: Vec<String> = Vec::new();
    if verbose {
        args.push("--verbose".into());
    }
    args.extend([
        "--sign".to_string(),
        identity.to_string(),
        "--force".to_string(),
        "--options".to_string(),
        "runtime".to_string(),
        "--deep".to_string(),
        "--timestamp".to_string(),
        path.display().to_string(),
    ]);
    args
}

/// `codesign` arguments to verify the signature of `path`.
pub fn verify_args(path: &Path, verbose: bool) -> Vec<String> {
    let mut args: Vec<String> = Vec::new();
    if verbose {
        args.push("--verbose".into());
    }
    args.extend([
        "--verify".to_string(),
        "--deep".to_string(),
        "--strict".to_string(),
        path.display().to_string(),
    ]);
    args
}

fn codesign(shell: &dyn Shell, args: &[String], step: &'static str) -> Result<(), XcodeError> {
    let args: Vec<&str> = args.iter().map(String::as_str).collect();
    shell.run("codesign", &args).map_err(XcodeError::step(step))
}

/// Sparkle components present in `app`, in signing order.
pub fn sparkle_components(app: &Path) -> Vec<PathBuf> {
    let framework = app.join(SPARKLE_FRAMEWORK);
    if !framework.exists() {
        return Vec::new();
    }
    SPARKLE_COMPONENTS
        .iter()
        .map(|c| framework.join(c))
        .filter(|p| p.exists())
        .collect()
}

/// Sign Sparkle components, then the app, then verify.
///
/// Returns every path signed, app last.
pub fn sign_app(
    shell: &dyn Shell,
    app: &Path,
    identity: &str,
    verbose: bool,
) -> Result<Vec<PathBuf>, XcodeError> {
    if !app.exists() {
        return Err(XcodeError::AppNotFound(app.to_path_buf()));
    }
    let mut signed = sparkle_components(app);
    for component in &signed {
        info!(path = %component.display(), "signing Sparkle component");
        codesign(shell, &sign_args(component, identity, verbose), "sign Sparkle component")?;
    }
    info!(path = %app.display(), "signing application");
    codesign(shell, &sign_args(app, identity, verbose), "sign application")?;
    signed.push(app.to_path_buf());

    codesign(shell, &verify_args(app, verbose), "verify signature")?;
    Ok(signed)
}

/// Certificate category.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdentityKind {
    /// Developer ID Application: distributable outside the App Store
    Distribution,
    /// Apple Development / Mac Developer: team testing only
    Development,
    Other,
}

impl IdentityKind {
    pub fn of(name: &str) -> Self {
        if name.contains("Developer ID Application") {
            IdentityKind::Distribution
        } else if name.contains("Apple Development") || name.contains("Mac Developer") {
            IdentityKind::Development
        } else {
            IdentityKind::Other
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            IdentityKind::Distribution => "distribution",
            IdentityKind::Development => "development",
            IdentityKind::Other => "other",
        }
    }
}

/// One valid signing identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub hash: String,
    pub name: String,
    pub kind: IdentityKind,
}

/// Parse `security find-identity -v -p codesigning` output.
///
/// Lines look like `1) <SHA-1> "<name>"`; the trailing count line is
/// ignored.
pub fn parse_identities(output: &str) -> Vec<Identity> {
    output
        .lines()
        .map(str::trim)
        .filter(|l| !l.contains("valid identities found"))
        .filter_map(|line| {
            let (_, rest) = line.split_once(')')?;
            let start = rest.find('"')?;
            let end = rest.rfind('"')?;
            if start >= end {
                return None;
            }
            let name = rest[start + 1..end].to_string();
            Some(Identity {
                hash: rest[..start].trim().to_string(),
                kind: IdentityKind::of(&name),
                name,
            })
        })
        .collect()
}

/// Valid code-signing identities in the user's keychains.
pub fn identities(shell: &dyn Shell) -> Option<Vec<Identity>> {
    shell
        .capture("security", &["find-identity", "-v", "-p", "codesigning"])
        .map(|out| parse_identities(&out))
}
