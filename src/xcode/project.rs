//! xcode::project
//!
//! Project discovery and marketing-version handling.

use std::fs;
use std::path::{Path, PathBuf};

use regex::{Captures, Regex};
use tracing::debug;
use walkdir::WalkDir;

use crate::shell::Shell;

use super::XcodeError;

/// Deepest directory level searched for a `.pbxproj`.
const PBXPROJ_MAX_DEPTH: usize = 3;

const VERSION_PATTERN: &str = r"(MARKETING_VERSION\s*=\s*)([0-9]+\.[0-9]+\.[0-9]+)";

fn skipped_dir(path: &Path) -> bool {
    let text = path.to_string_lossy();
    text.contains("Resources") || text.contains("temp")
}

/// First `.pbxproj` at most three levels below `root`.
///
/// Directories whose path below `root` contains `Resources` or `temp` are
/// not entered.
pub fn find_pbxproj(root: &Path) -> Result<PathBuf, XcodeError> {
    let walker = WalkDir::new(root)
        .max_depth(PBXPROJ_MAX_DEPTH)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| {
            let rel = e.path().strip_prefix(root).unwrap_or(e.path());
            e.depth() == 0 || !(e.file_type().is_dir() && skipped_dir(rel))
        });
    for entry in walker.flatten() {
        if entry.file_type().is_file()
            && entry.path().extension().is_some_and(|ext| ext == "pbxproj")
        {
            debug!(path = %entry.path().display(), "found pbxproj");
            return Ok(entry.into_path());
        }
    }
    Err(XcodeError::PbxprojNotFound(root.to_path_buf()))
}

/// First `MARKETING_VERSION = x.y.z` in project text.
pub fn marketing_version(content: &str) -> Result<Option<String>, XcodeError> {
    let re = Regex::new(VERSION_PATTERN)?;
    Ok(re
        .captures(content)
        .and_then(|c| c.get(2))
        .map(|m| m.as_str().to_string()))
}

/// Read the marketing version from a `.pbxproj` file.
pub fn read_version(pbxproj: &Path) -> Result<String, XcodeError> {
    let content = fs::read_to_string(pbxproj).map_err(XcodeError::io(pbxproj))?;
    marketing_version(&content)?.ok_or_else(|| XcodeError::VersionNotFound(pbxproj.to_path_buf()))
}

/// Increment the patch component of `x.y.z`.
pub fn bump_patch(version: &str) -> Result<String, XcodeError> {
    let invalid = || XcodeError::InvalidVersion(version.to_string());
    let parts: Vec<&str> = version.split('.').collect();
    if parts.len() != 3 {
        return Err(invalid());
    }
    let patch: u64 = parts[2].parse().map_err(|_| invalid())?;
    let next = patch.checked_add(1).ok_or_else(invalid)?;
    Ok(format!("{}.{}.{}", parts[0], parts[1], next))
}

/// Replace every `MARKETING_VERSION = old` with `new`.
///
/// Matches the same spacing [`marketing_version`] accepts and keeps it.
/// Settings holding another version are left alone.
pub fn replace_version(content: &str, old: &str, new: &str) -> Result<String, XcodeError> {
    let re = Regex::new(VERSION_PATTERN)?;
    Ok(re
        .replace_all(content, |caps: &Captures| {
            if &caps[2] == old {
                format!("{}{}", &caps[1], new)
            } else {
                caps[0].to_string()
            }
        })
        .into_owned())
}

/// Outcome of a version bump.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bump {
    pub old: String,
    pub new: String,
    pub written: bool,
}

/// Bump the marketing version in `pbxproj`, writing unless `dry_run`.
pub fn bump_file(pbxproj: &Path, dry_run: bool) -> Result<Bump, XcodeError> {
    let content = fs::read_to_string(pbxproj).map_err(XcodeError::io(pbxproj))?;
    let old = marketing_version(&content)?
        .ok_or_else(|| XcodeError::VersionNotFound(pbxproj.to_path_buf()))?;
    let new = bump_patch(&old)?;
    if !dry_run {
        let updated = replace_version(&content, &old, &new)?;
        fs::write(pbxproj, updated).map_err(XcodeError::io(pbxproj))?;
    }
    Ok(Bump {
        old,
        new,
        written: !dry_run,
    })
}

/// Workspace or plain project.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProjectKind {
    Workspace,
    Project,
}

impl ProjectKind {
    fn flag(self) -> &'static str {
        match self {
            ProjectKind::Workspace => "-workspace",
            ProjectKind::Project => "-project",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ProjectKind::Workspace => "Xcode Workspace",
            ProjectKind::Project => "Xcode Project",
        }
    }
}

/// A buildable Xcode container.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XcodeProject {
    pub path: PathBuf,
    pub kind: ProjectKind,
}

impl XcodeProject {
    /// Find a `.xcworkspace`, then a `.xcodeproj`, directly in `dir`.
    pub fn detect(dir: &Path) -> Result<Self, XcodeError> {
        let mut entries: Vec<PathBuf> = fs::read_dir(dir)
            .map_err(XcodeError::io(dir))?
            .flatten()
            .map(|e| e.path())
            .collect();
        entries.sort();
        for (ext, kind) in [
            ("xcworkspace", ProjectKind::Workspace),
            ("xcodeproj", ProjectKind::Project),
        ] {
            if let Some(path) = entries
                .iter()
                .find(|p| p.extension().is_some_and(|e| e == ext))
            {
                return Ok(Self {
                    path: path.clone(),
                    kind,
                });
            }
        }
        Err(XcodeError::ProjectNotFound(dir.to_path_buf()))
    }

    /// `-workspace <path>` or `-project <path>`.
    pub fn selector(&self) -> Vec<String> {
        vec![
            self.kind.flag().to_string(),
            self.path.display().to_string(),
        ]
    }

    /// Schemes listed by `xcodebuild -list`.
    pub fn schemes(&self, shell: &dyn Shell) -> Vec<String> {
        let mut args = self.selector();
        args.push("-list".into());
        let args: Vec<&str> = args.iter().map(String::as_str).collect();
        shell
            .capture("xcodebuild", &args)
            .map(|out| parse_schemes(&out))
            .unwrap_or_default()
    }

    /// `ARCHS` from the Release build settings of `scheme`.
    pub fn archs(&self, shell: &dyn Shell, scheme: &str) -> Option<String> {
        let mut args = self.selector();
        args.extend(
            ["-scheme", scheme, "-showBuildSettings", "-configuration", "Release"]
                .into_iter()
                .map(String::from),
        );
        let args: Vec<&str> = args.iter().map(String::as_str).collect();
        let out = shell.capture("xcodebuild", &args)?;
        out.lines()
            .find(|l| l.contains("ARCHS ="))
            .and_then(|l| l.split_once('='))
            .map(|(_, v)| v.trim().to_string())
    }
}

/// Entries of the `Schemes:` section of `xcodebuild -list` output.
pub fn parse_schemes(output: &str) -> Vec<String> {
    let mut schemes = Vec::new();
    let mut in_schemes = false;
    for line in output.lines().map(str::trim) {
        if line == "Schemes:" {
            in_schemes = true;
            continue;
        }
        if !in_schemes {
            continue;
        }
        if line.is_empty() {
            break;
        }
        if !line.contains(':') {
            schemes.push(line.to_string());
        }
    }
    schemes
}

/// Use `explicit` or fall back to the first scheme of the project in `dir`.
pub fn resolve_scheme(
    shell: &dyn Shell,
    dir: &Path,
    explicit: Option<&str>,
) -> Result<String, XcodeError> {
    if let Some(s) = explicit.filter(|s| !s.is_empty()) {
        return Ok(s.to_string());
    }
    let project = XcodeProject::detect(dir)?;
    project
        .schemes(shell)
        .into_iter()
        .next()
        .ok_or(XcodeError::SchemeNotFound)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shell::mock::MockShell;
    use tempfile::TempDir;

    const PBXPROJ: &str = "\
\t\t\t\tINFOPLIST_FILE = App/Info.plist;
\t\t\t\tMARKETING_VERSION = 1.4.9;
\t\t\t\tPRODUCT_BUNDLE_IDENTIFIER = dev.example.app;
\t\t\t\tMARKETING_VERSION = 1.4.9;
";

    #[test]
    fn version_extraction() {
        assert_eq!(marketing_version(PBXPROJ).unwrap().as_deref(), Some("1.4.9"));
        assert_eq!(
            marketing_version("MARKETING_VERSION=2.0.1;").unwrap().as_deref(),
            Some("2.0.1")
        );
        assert_eq!(marketing_version("MARKETING_VERSION = 2.0;").unwrap(), None);
    }

    mod bump {
        use super::*;

        #[test]
        fn increments_patch() {
            assert_eq!(bump_patch("1.4.9").unwrap(), "1.4.10");
            assert_eq!(bump_patch("0.0.0").unwrap(), "0.0.1");
        }

        #[test]
        fn rejects_bad_versions() {
            assert!(matches!(bump_patch("1.4"), Err(XcodeError::InvalidVersion(_))));
            assert!(bump_patch("1.4.x").is_err());
            assert!(bump_patch("1.2.3.4").is_err());
            assert!(bump_patch(&format!("1.0.{}", u64::MAX)).is_err());
        }

        #[test]
        fn replace_keeps_spacing_and_other_versions() {
            let text = "MARKETING_VERSION=1.2.3;\nMARKETING_VERSION  =  1.2.3;\nMARKETING_VERSION = 1.2.30;\n";
            assert_eq!(
                replace_version(text, "1.2.3", "1.2.4").unwrap(),
                "MARKETING_VERSION=1.2.4;\nMARKETING_VERSION  =  1.2.4;\nMARKETING_VERSION = 1.2.30;\n"
            );
        }

        #[test]
        fn rewrites_compact_setting() {
            let dir = TempDir::new().unwrap();
            let path = dir.path().join("project.pbxproj");
            fs::write(&path, "MARKETING_VERSION=1.2.3;\n").unwrap();

            let done = bump_file(&path, false).unwrap();
            assert_eq!(done.new, "1.2.4");
            assert_eq!(fs::read_to_string(&path).unwrap(), "MARKETING_VERSION=1.2.4;\n");
        }

        #[test]
        fn rewrites_every_occurrence() {
            let dir = TempDir::new().unwrap();
            let path = dir.path().join("project.pbxproj");
            fs::write(&path, PBXPROJ).unwrap();

            let preview = bump_file(&path, true).unwrap();
            assert_eq!(preview.new, "1.4.10");
            assert!(!preview.written);
            assert_eq!(fs::read_to_string(&path).unwrap(), PBXPROJ);

            let done = bump_file(&path, false).unwrap();
            assert!(done.written);
            let text = fs::read_to_string(&path).unwrap();
            assert_eq!(text.matches("MARKETING_VERSION = 1.4.10").count(), 2);
            assert!(!text.contains("1.4.9"));
        }
    }

    mod discovery {
        use super::*;

        #[test]
        fn finds_pbxproj_and_skips_temp() {
            let dir = TempDir::new().unwrap();
            let temp = dir.path().join("temp/Old.xcodeproj");
            fs::create_dir_all(&temp).unwrap();
            fs::write(temp.join("project.pbxproj"), "").unwrap();
            assert!(matches!(
                find_pbxproj(dir.path()),
                Err(XcodeError::PbxprojNotFound(_))
            ));

            let real = dir.path().join("App.xcodeproj");
            fs::create_dir_all(&real).unwrap();
            fs::write(real.join("project.pbxproj"), "").unwrap();
            assert_eq!(find_pbxproj(dir.path()).unwrap(), real.join("project.pbxproj"));
        }

        #[test]
        fn respects_depth() {
            let dir = TempDir::new().unwrap();
            let deep = dir.path().join("a/b/c/App.xcodeproj");
            fs::create_dir_all(&deep).unwrap();
            fs::write(deep.join("project.pbxproj"), "").unwrap();
            assert!(find_pbxproj(dir.path()).is_err());
        }

        #[test]
        fn workspace_preferred() {
            let dir = TempDir::new().unwrap();
            fs::create_dir(dir.path().join("App.xcodeproj")).unwrap();
            let project = XcodeProject::detect(dir.path()).unwrap();
            assert_eq!(project.kind, ProjectKind::Project);

            fs::create_dir(dir.path().join("App.xcworkspace")).unwrap();
            let project = XcodeProject::detect(dir.path()).unwrap();
            assert_eq!(project.kind, ProjectKind::Workspace);
            assert_eq!(project.selector()[0], "-workspace");
        }

        #[test]
        fn nothing_to_build() {
            let dir = TempDir::new().unwrap();
            assert!(matches!(
                XcodeProject::detect(dir.path()),
                Err(XcodeError::ProjectNotFound(_))
            ));
        }
    }

    const LIST: &str = "\
Information about project \"App\":
    Targets:
        App
        AppTests

    Build Configurations:
        Debug
        Release

    Schemes:
        App
        App (Staging)

";

    #[test]
    fn schemes_section() {
        assert_eq!(parse_schemes(LIST), vec!["App", "App (Staging)"]);
        assert!(parse_schemes("Targets:\n  App\n").is_empty());
    }

    #[test]
    fn scheme_resolution() {
        let dir = TempDir::new().unwrap();
        fs::create_dir(dir.path().join("App.xcodeproj")).unwrap();
        let project_path = dir.path().join("App.xcodeproj");
        let shell = MockShell::new().with_stdout(
            &format!("xcodebuild -project {} -list", project_path.display()),
            LIST,
        );
        assert_eq!(resolve_scheme(&shell, dir.path(), None).unwrap(), "App");
        assert_eq!(
            resolve_scheme(&shell, dir.path(), Some("Other")).unwrap(),
            "Other"
        );

        let empty = MockShell::new();
        assert!(matches!(
            resolve_scheme(&empty, dir.path(), None),
            Err(XcodeError::SchemeNotFound)
        ));
    }

    #[test]
    fn build_settings_archs() {
        let project = XcodeProject {
            path: PathBuf::from("App.xcodeproj"),
            kind: ProjectKind::Project,
        };
        let shell = MockShell::new().with_stdout(
            "xcodebuild -project App.xcodeproj -scheme App -showBuildSettings -configuration Release",
            "    ACTION = build\n    ARCHS = arm64 x86_64\n    ARCHS_STANDARD = arm64 x86_64\n",
        );
        assert_eq!(project.archs(&shell, "App").as_deref(), Some("arm64 x86_64"));
    }
}
