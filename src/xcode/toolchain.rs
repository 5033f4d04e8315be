//! xcode::toolchain
//!
//! Reports on the installed developer toolchain: Xcode, command line
//! tools, SDKs, simulators, signing certificates, keychains and
//! provisioning profiles.

use std::fs;
use std::path::Path;

use crate::shell::Shell;
use crate::ui::output::{Level, Report};

use super::signing::{self, IdentityKind};

/// Tools checked by `xcode info`.
pub const XCODE_TOOLS: &[(&str, &str)] = &[
    ("xcodebuild", "build tool"),
    ("xcrun", "tool runner"),
    ("codesign", "code signing"),
    ("security", "keychain access"),
    ("hdiutil", "disk images"),
    ("plutil", "property lists"),
    ("lipo", "architectures"),
];

/// Tools checked by `xcode setup`.
pub const SIGNING_TOOLS: &[&str] = &["codesign", "security", "hdiutil", "plutil", "lipo"];

/// SDKs listed in verbose `xcode info`.
const SDKS: &[(&str, &str)] = &[
    ("macosx", "macOS SDK"),
    ("iphoneos", "iOS SDK"),
    ("iphonesimulator", "iOS Simulator SDK"),
];

const SIMULATOR_PREVIEW: usize = 3;

fn mark(ok: bool) -> String {
    if ok {
        Level::Ok.paint("✓")
    } else {
        Level::Critical.paint("✗")
    }
}

/// Non-empty trimmed lines.
fn lines(text: &str) -> impl Iterator<Item = &str> {
    text.lines().map(str::trim).filter(|l| !l.is_empty())
}

/// `-- iOS x.y --` runtime headers in `simctl list devices available`.
pub fn ios_runtimes(simctl: &str) -> Vec<String> {
    simctl
        .lines()
        .filter(|l| l.contains("iOS") && l.contains("--"))
        .map(|l| l.trim().to_string())
        .collect()
}

/// Swift version and target lines of `swift --version`.
pub fn swift_lines(output: &str) -> Vec<&str> {
    lines(output)
        .filter(|l| l.contains("Swift version") || l.contains("Target:"))
        .collect()
}

/// Build `xcode info`.
pub fn info_report(shell: &dyn Shell, verbose: bool) -> Report {
    let mut r = Report::new();
    r.header("Xcode");

    r.section("Installation");
    let Some(path) = shell.capture_line("xcode-select", &["-p"]) else {
        r.line(Level::Critical.paint("  Xcode not found; install it from the App Store"));
        return r;
    };
    r.field("Developer directory", path);
    match shell.capture("xcodebuild", &["-version"]) {
        Some(out) => {
            for line in lines(&out) {
                r.detail(line);
            }
        }
        None => {
            r.line(Level::Critical.paint("  unable to read the Xcode version"));
        }
    }

    if verbose {
        r.section("SDKs");
        for &(sdk, label) in SDKS {
            if let Some(sdk_path) = shell.capture_line("xcrun", &["--show-sdk-path", "--sdk", sdk]) {
                let version = shell
                    .capture_line("xcrun", &["--show-sdk-version", "--sdk", sdk])
                    .unwrap_or_default();
                r.field(label, version);
                r.detail(sdk_path);
            }
        }
    }

    r.section("Command Line Tools");
    if let Some(clang) = shell.capture("clang", &["--version"]) {
        if let Some(first) = lines(&clang).next().filter(|l| l.contains("clang")) {
            r.field("Compiler", first);
        }
    }
    let available: Vec<bool> = XCODE_TOOLS
        .iter()
        .map(|(tool, _)| shell.has_program(tool))
        .collect();
    if verbose {
        for ((tool, desc), ok) in XCODE_TOOLS.iter().zip(&available) {
            r.line(format!("  {} {} ({})", mark(*ok), tool, desc));
        }
    } else {
        let count = available.iter().filter(|ok| **ok).count();
        r.field("Available", format!("{}/{}", count, XCODE_TOOLS.len()));
    }

    r.section("Swift");
    match shell.capture("swift", &["--version"]) {
        Some(out) => {
            for line in swift_lines(&out) {
                r.detail(line);
            }
        }
        None => {
            r.line(Level::Critical.paint("  unable to read the Swift version"));
        }
    }

    if verbose {
        r.section("Simulators");
        match shell.capture("xcrun", &["simctl", "list", "devices", "available"]) {
            Some(out) => {
                let runtimes = ios_runtimes(&out);
                if runtimes.is_empty() {
                    r.line(Level::Warn.paint("  no iOS simulators available"));
                }
                for runtime in runtimes.iter().take(SIMULATOR_PREVIEW) {
                    r.detail(runtime);
                }
                if runtimes.len() > SIMULATOR_PREVIEW {
                    r.detail(format!("... {} more", runtimes.len() - SIMULATOR_PREVIEW));
                }
            }
            None => {
                r.line(Level::Critical.paint("  unable to list simulators"));
            }
        }
    }
    r
}

/// Sections shown by `xcode setup`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SetupOptions {
    pub certificates: bool,
    pub keychain: bool,
    pub profiles: bool,
    pub verbose: bool,
}

impl SetupOptions {
    /// Everything, as with `--all`.
    pub fn all(verbose: bool) -> Self {
        Self {
            certificates: true,
            keychain: true,
            profiles: true,
            verbose,
        }
    }

    fn any_section(&self) -> bool {
        self.certificates || self.keychain || self.profiles
    }
}

fn unquote(s: &str) -> &str {
    s.trim().trim_matches('"')
}

fn xcode_installation(r: &mut Report, shell: &dyn Shell) {
    r.section("Xcode");
    match shell.capture_line("xcode-select", &["-p"]) {
        Some(path) => {
            r.field("Path", path);
            if let Some(out) = shell.capture("xcodebuild", &["-version"]) {
                for line in lines(&out).take(2) {
                    r.detail(line);
                }
            }
        }
        None => {
            r.line(Level::Critical.paint("  Xcode not found; install it from the App Store"));
        }
    }
}

fn command_line_tools(r: &mut Report, shell: &dyn Shell) {
    r.section("Command Line Tools");
    let installed = shell.capture_line("xcode-select", &["-p"]).is_some();
    r.line(format!(
        "  {} command line tools {}",
        mark(installed),
        if installed { "installed" } else { "missing; run xcode-select --install" }
    ));
    for tool in SIGNING_TOOLS {
        r.line(format!("  {} {}", mark(shell.has_program(tool)), tool));
    }
}

fn certificate_summary(r: &mut Report, shell: &dyn Shell, verbose: bool) {
    r.section("Signing Certificates");
    let Some(ids) = signing::identities(shell) else {
        r.line(Level::Critical.paint("  unable to read certificates"));
        return;
    };
    let count = |kind: IdentityKind| ids.iter().filter(|i| i.kind == kind).count();
    let dev = count(IdentityKind::Development);
    let dist = count(IdentityKind::Distribution);
    if verbose {
        for id in ids.iter().filter(|i| i.kind != IdentityKind::Other) {
            r.detail(format!("{}: {}", id.kind.label(), id.name));
        }
    }
    r.field("Development", dev);
    r.field("Distribution", dist);
    if dev == 0 && dist == 0 {
        r.line(Level::Warn.paint(
            "  no signing certificates; sign in to Xcode with an Apple ID or import one",
        ));
    }
}

fn certificate_details(r: &mut Report, shell: &dyn Shell, verbose: bool) {
    r.section("Certificate Details");
    let ids = signing::identities(shell).unwrap_or_default();
    if ids.is_empty() {
        r.line(Level::Critical.paint("  no code signing certificates"));
        return;
    }
    for id in &ids {
        r.field(id.kind.label(), &id.name);
        if verbose {
            r.detail(format!("SHA-1: {}", id.hash));
        }
    }
}

fn keychain(r: &mut Report, shell: &dyn Shell, detailed: bool, verbose: bool) {
    r.section("Keychain");
    if let Some(default) = shell.capture_line("security", &["default-keychain"]) {
        let default = unquote(&default).to_string();
        r.field("Default", &default);
        if detailed {
            r.detail(if Path::new(&default).exists() {
                "file present"
            } else {
                "file missing"
            });
        }
    }
    if !(detailed || verbose) {
        return;
    }
    match shell.capture("security", &["list-keychains"]) {
        Some(out) => {
            r.field("Search list", "");
            for (i, entry) in lines(&out).map(unquote).enumerate() {
                r.detail(format!("{}. {}", i + 1, entry));
                if detailed && verbose {
                    let ok = Path::new(entry).exists();
                    r.detail(format!("   {} {}", mark(ok), if ok { "accessible" } else { "inaccessible" }));
                }
            }
        }
        None => {
            r.line(Level::Critical.paint("  unable to list keychains"));
        }
    }
}

/// `<string>` value following `<key>{key}</key>` in a decoded profile.
pub fn profile_value(plist: &str, key: &str) -> Option<String> {
    let marker = format!("<key>{}</key>", key);
    let mut it = plist.lines();
    it.by_ref().find(|l| l.contains(&marker))?;
    let next = it.next()?;
    let start = next.find("<string>")? + "<string>".len();
    let end = next.find("</string>")?;
    (start < end).then(|| next[start..end].to_string())
}

/// `.mobileprovision` files in `dir`, sorted.
pub fn provisioning_profiles(dir: &Path) -> std::io::Result<Vec<std::path::PathBuf>> {
    let mut profiles: Vec<_> = fs::read_dir(dir)?
        .flatten()
        .map(|e| e.path())
        .filter(|p| p.extension().is_some_and(|e| e == "mobileprovision"))
        .collect();
    profiles.sort();
    Ok(profiles)
}

fn profiles(r: &mut Report, shell: &dyn Shell, dir: &Path, verbose: bool) {
    r.section("Provisioning Profiles");
    if !dir.exists() {
        r.line(Level::Warn.paint("  profile directory not found"));
        r.detail(dir.display());
        return;
    }
    let found = match provisioning_profiles(dir) {
        Ok(found) => found,
        Err(err) => {
            r.line(Level::Critical.paint(format!("  unable to read {}: {}", dir.display(), err)));
            return;
        }
    };
    if verbose {
        for profile in &found {
            let file = profile
                .file_name()
                .map(|f| f.to_string_lossy().into_owned())
                .unwrap_or_default();
            r.field("Profile", file);
            let path = profile.display().to_string();
            if let Some(decoded) = shell.capture("security", &["cms", "-D", "-i", &path]) {
                for (label, key) in [
                    ("Name", "Name"),
                    ("Team", "TeamName"),
                    ("App ID", "application-identifier"),
                ] {
                    if let Some(v) = profile_value(&decoded, key) {
                        r.detail(format!("{}: {}", label, v));
                    }
                }
            }
        }
    }
    r.field("Total", found.len());
    if found.is_empty() {
        r.line(Level::Warn.paint("  no profiles; download them from Xcode"));
    }
}

/// Build `xcode setup`. Without section flags a basic overview is shown.
pub fn setup_report(shell: &dyn Shell, opts: SetupOptions, profiles_dir: &Path) -> Report {
    let mut r = Report::new();
    r.header("Code Signing Environment");
    if !opts.any_section() {
        xcode_installation(&mut r, shell);
        command_line_tools(&mut r, shell);
        certificate_summary(&mut r, shell, opts.verbose);
        keychain(&mut r, shell, false, opts.verbose);
        return r;
    }
    if opts.certificates {
        certificate_details(&mut r, shell, opts.verbose);
    }
    if opts.keychain {
        keychain(&mut r, shell, true, opts.verbose);
    }
    if opts.profiles {
        profiles(&mut r, shell, profiles_dir, opts.verbose);
    }
    r
}

/// Host, Xcode, Swift and git details printed before a pipeline step.
pub fn environment_report(shell: &dyn Shell, title: &str, settings: &[(&str, String)]) -> Report {
    let mut r = Report::new();
    r.header(title);

    r.section("System");
    r.field(
        "OS",
        format!("{} {}", std::env::consts::OS, std::env::consts::ARCH),
    );
    if let Some(host) = shell.capture_line("hostname", &[]) {
        r.field("Hostname", host);
    }

    r.section("Xcode");
    if let Some(out) = shell.capture("xcodebuild", &["-version"]) {
        for line in lines(&out).take(2) {
            r.detail(line);
        }
    }
    if let Some(sdk) = shell.capture_line("xcrun", &["--show-sdk-path"]) {
        r.field("SDK", sdk);
    }
    if let Some(dev) = shell.capture_line("xcode-select", &["-p"]) {
        r.field("Developer directory", dev);
    }
    if let Some(swift) = shell.capture("swift", &["--version"]) {
        if let Some(first) = lines(&swift).next() {
            r.field("Swift", first);
        }
    }

    r.section("Git");
    if let Some(v) = shell.capture_line("git", &["--version"]) {
        r.field("Version", v);
    }
    if let Some(b) = shell.capture_line("git", &["branch", "--show-current"]) {
        r.field("Branch", b);
    }
    if let Some(c) = shell.capture_line("git", &["log", "-1", "--pretty=format:%h - %s (%an, %ar)"]) {
        r.field("Last commit", c);
    }

    if !settings.is_empty() {
        r.section("Settings");
        for (label, value) in settings {
            r.field(label, value);
        }
        if let Ok(cwd) = std::env::current_dir() {
            r.field("Working directory", cwd.display());
        }
    }
    r
}

/// `git status --porcelain` changes after a version bump.
pub fn git_changes(shell: &dyn Shell, new_version: &str) -> Report {
    let mut r = Report::new();
    r.section("Git Changes");
    match shell.capture("git", &["status", "--porcelain"]) {
        Some(out) if lines(&out).next().is_some() => {
            for line in lines(&out) {
                r.detail(line);
            }
        }
        _ => {
            r.detail("no changes");
        }
    }
    r.blank();
    r.line(Level::Warn.paint("  commit the change yourself:"));
    r.detail("git add .");
    r.detail(format!("git commit -m \"Bump version to {}\"", new_version));
    r
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shell::mock::MockShell;
    use tempfile::TempDir;

    const SIMCTL: &str = "\
== Devices ==
-- iOS 16.4 --
    iPhone 14 (AAAA) (Shutdown)
-- iOS 17.0 --
    iPhone 15 (BBBB) (Shutdown)
-- iOS 17.2 --
-- iOS 17.4 --
-- watchOS 10.4 --
";

    #[test]
    fn simulator_runtimes() {
        let rt = ios_runtimes(SIMCTL);
        assert_eq!(rt.len(), 4);
        assert_eq!(rt[0], "-- iOS 16.4 --");
    }

    #[test]
    fn swift_version_lines() {
        let out = "swift-driver version: 1.87.3 Apple Swift version 5.9.2 (swiftlang-5.9.2.2.56 clang-1500.1.0.2.5)\nTarget: arm64-apple-macosx14.0\n";
        assert_eq!(swift_lines(out).len(), 2);
    }

    #[test]
    fn info_without_xcode() {
        let text = info_report(&MockShell::new(), false).plain();
        assert!(text.contains("Xcode not found"));
        assert!(!text.contains("Swift"));
    }

    #[test]
    fn info_counts_tools() {
        let shell = MockShell::new()
            .with_stdout("xcode-select -p", "/Applications/Xcode.app/Contents/Developer\n")
            .with_stdout("xcodebuild -version", "Xcode 15.2\nBuild version 15C500b\n")
            .with_program("xcodebuild")
            .with_program("codesign")
            .with_stdout("swift --version", "Apple Swift version 5.9.2\nTarget: arm64-apple-macosx14.0\n");
        let text = info_report(&shell, false).plain();
        assert!(text.contains("Developer directory: /Applications/Xcode.app/Contents/Developer"));
        assert!(text.contains("    Build version 15C500b"));
        assert!(text.contains("Available: 2/7"));
        assert!(text.contains("Target: arm64-apple-macosx14.0"));
        assert!(!text.contains("Simulators"));
    }

    #[test]
    fn info_verbose_simulators() {
        let shell = MockShell::new()
            .with_stdout("xcode-select -p", "/x\n")
            .with_stdout("xcrun simctl list devices available", SIMCTL);
        let text = info_report(&shell, true).plain();
        assert!(text.contains("-- iOS 17.2 --"));
        assert!(!text.contains("-- iOS 17.4 --"));
        assert!(text.contains("... 1 more"));
        assert!(text.contains("✗ lipo (architectures)"));
    }

    #[test]
    fn profile_values() {
        let plist = "\
<dict>
\t<key>AppIDName</key>
\t<string>Example</string>
\t<key>Name</key>
\t<string>Example Distribution</string>
\t<key>TeamName</key>
\t<string>Ada Lovelace</string>
</dict>";
        assert_eq!(profile_value(plist, "Name").as_deref(), Some("Example Distribution"));
        assert_eq!(profile_value(plist, "TeamName").as_deref(), Some("Ada Lovelace"));
        assert_eq!(profile_value(plist, "application-identifier"), None);
    }

    const IDENTITIES: &str = "  1) AAAA \"Developer ID Application: Ada (T1)\"\n  2) BBBB \"Apple Development: Ada (T2)\"\n  3) CCCC \"Mac Developer: Ada (T3)\"\n     3 valid identities found\n";

    #[test]
    fn setup_basic_overview() {
        let shell = MockShell::new()
            .with_stdout("security find-identity -v -p codesigning", IDENTITIES)
            .with_stdout("security default-keychain", "    \"/Users/ada/Library/Keychains/login.keychain-db\"\n");
        let text = setup_report(&shell, SetupOptions::default(), Path::new("/none")).plain();
        assert!(text.contains("Development: 2"));
        assert!(text.contains("Distribution: 1"));
        assert!(text.contains("Default: /Users/ada/Library/Keychains/login.keychain-db"));
        assert!(text.contains("✗ command line tools missing"));
        assert!(!text.contains("Provisioning Profiles"));
    }

    #[test]
    fn setup_profiles_section() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("a.mobileprovision"), "").unwrap();
        fs::write(dir.path().join("b.mobileprovision"), "").unwrap();
        fs::write(dir.path().join("notes.txt"), "").unwrap();
        let opts = SetupOptions {
            profiles: true,
            ..Default::default()
        };
        let text = setup_report(&MockShell::new(), opts, dir.path()).plain();
        assert!(text.contains("Total: 2"));
        assert!(!text.contains("Keychain"));

        let missing = setup_report(&MockShell::new(), opts, &dir.path().join("nope")).plain();
        assert!(missing.contains("profile directory not found"));
    }

    #[test]
    fn setup_certificate_details() {
        let shell = MockShell::new()
            .with_stdout("security find-identity -v -p codesigning", IDENTITIES);
        let opts = SetupOptions {
            certificates: true,
            verbose: true,
            ..Default::default()
        };
        let text = setup_report(&shell, opts, Path::new("/none")).plain();
        assert!(text.contains("distribution: Developer ID Application: Ada (T1)"));
        assert!(text.contains("SHA-1: BBBB"));
    }

    #[test]
    fn git_change_listing() {
        let shell = MockShell::new().with_stdout(
            "git status --porcelain",
            " M App.xcodeproj/project.pbxproj\n",
        );
        let text = git_changes(&shell, "1.4.10").plain();
        assert!(text.contains("M App.xcodeproj/project.pbxproj"));
        assert!(text.contains("Bump version to 1.4.10"));
        assert!(git_changes(&MockShell::new(), "1.0.1").plain().contains("no changes"));
    }
}
