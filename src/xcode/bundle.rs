//! xcode::bundle
//!
//! Inspecting a built `.app` bundle: Info.plist values, executable
//! architectures and likely locations when the expected path is missing.

use std::fs;
use std::path::{Path, PathBuf};

use crate::shell::Shell;

/// Most search hits reported.
const MAX_SEARCH_HITS: usize = 20;

/// Info.plist values shown for an app.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BundleInfo {
    pub short_version: Option<String>,
    pub build_version: Option<String>,
    pub identifier: Option<String>,
}

impl BundleInfo {
    /// Read via `plutil -p <app>/Contents/Info.plist`.
    pub fn read(shell: &dyn Shell, app: &Path) -> Option<Self> {
        let plist = info_plist(app);
        if !plist.exists() {
            return None;
        }
        let out = shell.capture("plutil", &["-p", &plist.display().to_string()])?;
        Some(Self::parse(&out))
    }

    pub fn parse(plutil: &str) -> Self {
        Self {
            short_version: plist_value(plutil, "CFBundleShortVersionString"),
            build_version: plist_value(plutil, "CFBundleVersion"),
            identifier: plist_value(plutil, "CFBundleIdentifier"),
        }
    }
}

pub fn info_plist(app: &Path) -> PathBuf {
    app.join("Contents/Info.plist")
}

/// Value of `key` in `plutil -p` output (`"key" => "value"` lines).
pub fn plist_value(plutil: &str, key: &str) -> Option<String> {
    plutil.lines().find_map(|line| {
        let parts: Vec<&str> = line.split('"').collect();
        (parts.len() >= 4 && parts[1] == key).then(|| parts[3].to_string())
    })
}

/// Architectures of the first executable in `Contents/MacOS`, from `lipo`.
pub fn architectures(shell: &dyn Shell, app: &Path) -> Option<String> {
    let macos = app.join("Contents/MacOS");
    let mut files: Vec<PathBuf> = fs::read_dir(&macos)
        .ok()?
        .flatten()
        .filter(|e| e.file_type().map(|t| !t.is_dir()).unwrap_or(false))
        .map(|e| e.path())
        .collect();
    files.sort();
    files
        .iter()
        .find_map(|exe| shell.capture_line("lipo", &["-archs", &exe.display().to_string()]))
}

/// File-name label for `lipo -archs` output: `universal` when both Intel
/// and Apple silicon slices are present.
pub fn arch_label(lipo: &str) -> String {
    if lipo.contains("x86_64") && lipo.contains("arm64") {
        "universal".to_string()
    } else {
        lipo.trim().to_string()
    }
}

/// Conventional build output locations for `scheme`.
pub fn candidate_paths(scheme: &str) -> Vec<String> {
    [
        "./temp/Build/Products/Release",
        "./temp/Build/Products/Debug",
        "./Build/Products/Release",
        "./Build/Products/Debug",
        "./build/Release",
        "./build/Debug",
        "./DerivedData/Build/Products/Release",
        "./DerivedData/Build/Products/Debug",
    ]
    .iter()
    .map(|dir| format!("{}/{}.app", dir, scheme))
    .collect()
}

/// Existing `<scheme>.app` bundles: known locations first, then a `find`
/// over the current directory that skips hidden paths.
pub fn search_apps(shell: &dyn Shell, scheme: &str) -> Vec<String> {
    let mut found: Vec<String> = candidate_paths(scheme)
        .into_iter()
        .filter(|p| Path::new(p).exists())
        .collect();
    let name = format!("{}.app", scheme);
    if let Some(out) = shell.capture(
        "find",
        &[".", "-name", &name, "-type", "d", "-not", "-path", "*/.*"],
    ) {
        for line in out.lines().map(str::trim).filter(|l| !l.is_empty()) {
            if found.len() >= MAX_SEARCH_HITS {
                break;
            }
            if !found.iter().any(|f| f == line) {
                found.push(line.to_string());
            }
        }
    }
    found
}

/// First column of `du -sh`, or `unknown`.
pub fn disk_size(shell: &dyn Shell, path: &str) -> String {
    shell
        .capture("du", &["-sh", path])
        .and_then(|out| out.split_whitespace().next().map(str::to_string))
        .unwrap_or_else(|| "unknown".to_string())
}
