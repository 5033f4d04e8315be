//! xcode::package
//!
//! DMG creation.
//!
//! The default pipeline uses only `hdiutil`: a writable image is created
//! from the app, mounted, given an `/Applications` link, unmounted and
//! converted to a zlib-compressed read-only image. When requested and
//! installed, `create-dmg` is used instead.

use std::collections::BTreeSet;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tracing::{info, warn};

use crate::shell::{display_command, Shell, ShellError};

use super::bundle::{self, BundleInfo};
use super::XcodeError;

pub const DEFAULT_APP_DIR: &str = "./temp/Build/Products/Release";
pub const DEFAULT_OUTPUT_DIR: &str = "./temp";

/// DMG file name.
///
/// An explicit name wins (`.dmg` appended when missing). Otherwise
/// `<scheme>[-<version>][-<arch>].dmg`.
pub fn dmg_filename(
    explicit: Option<&str>,
    scheme: &str,
    version: Option<&str>,
    arch: Option<&str>,
) -> String {
    if let Some(name) = explicit.filter(|n| !n.is_empty()) {
        return if name.ends_with(".dmg") {
            name.to_string()
        } else {
            format!("{}.dmg", name)
        };
    }
    let mut name = scheme.to_string();
    for part in [version, arch].into_iter().flatten() {
        if !part.is_empty() {
            name.push('-');
            name.push_str(part);
        }
    }
    name.push_str(".dmg");
    name
}

/// Mount point in `hdiutil attach` output.
///
/// The mount column is last on its line and may contain spaces.
pub fn parse_mount_point(attach: &str) -> Option<String> {
    attach.lines().find_map(|line| {
        let idx = line.find("/Volumes/")?;
        Some(line[idx..].trim().to_string())
    })
}

/// What to package and where.
#[derive(Debug, Clone)]
pub struct PackageOptions {
    pub app: PathBuf,
    pub scheme: String,
    pub output_dir: PathBuf,
    pub name: Option<String>,
    pub include_arch: bool,
    pub verbose: bool,
    pub use_create_dmg: bool,
}

/// Which tool produced the image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Hdiutil,
    CreateDmg,
}

/// A finished image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Package {
    pub path: PathBuf,
    pub method: Method,
}

/// Name the DMG for `opts` from the bundle's version and architectures.
pub fn filename_for(shell: &dyn Shell, opts: &PackageOptions) -> String {
    if opts.name.as_deref().is_some_and(|n| !n.is_empty()) {
        return dmg_filename(opts.name.as_deref(), &opts.scheme, None, None);
    }
    let version = BundleInfo::read(shell, &opts.app).and_then(|b| b.short_version);
    let arch = opts
        .include_arch
        .then(|| bundle::architectures(shell, &opts.app))
        .flatten()
        .map(|lipo| bundle::arch_label(&lipo));
    dmg_filename(None, &opts.scheme, version.as_deref(), arch.as_deref())
}

fn run(shell: &dyn Shell, program: &str, args: &[&str], step: &'static str) -> Result<(), XcodeError> {
    info!(command = %display_command(program, args), "{}", step);
    shell.run(program, args).map_err(XcodeError::step(step))
}

/// Build the DMG.
pub fn create(shell: &dyn Shell, opts: &PackageOptions) -> Result<Package, XcodeError> {
    if !opts.app.exists() {
        return Err(XcodeError::AppNotFound(opts.app.clone()));
    }
    fs::create_dir_all(&opts.output_dir).map_err(XcodeError::io(&opts.output_dir))?;
    let filename = filename_for(shell, opts);

    if opts.use_create_dmg {
        if shell.has_program("create-dmg") {
            return with_create_dmg(shell, opts, &filename.replace(' ', "-"));
        }
        warn!("create-dmg not installed; falling back to hdiutil");
    }
    with_hdiutil(shell, opts, &filename)
}

fn with_hdiutil(
    shell: &dyn Shell,
    opts: &PackageOptions,
    filename: &str,
) -> Result<Package, XcodeError> {
    let final_dmg = opts.output_dir.join(filename);
    let temp_dmg = opts
        .output_dir
        .join(filename.replacen(".dmg", "-temp.dmg", 1));
    let app = opts.app.display().to_string();
    let temp = temp_dmg.display().to_string();

    let _cleanup = TempImage(&temp_dmg);
    run(
        shell,
        "hdiutil",
        &["create", "-srcfolder", &app, "-format", "UDRW", "-volname", &opts.scheme, &temp],
        "create temporary image",
    )?;

    let attach_args = ["attach", temp.as_str(), "-readwrite", "-noverify", "-noautoopen"];
    let attached = shell
        .output("hdiutil", &attach_args)
        .map_err(XcodeError::step("attach image"))?;
    if !attached.success {
        return Err(XcodeError::Step {
            step: "attach image",
            source: ShellError::failed(
                display_command("hdiutil", &attach_args),
                attached.code,
                &attached.stderr,
            ),
        });
    }
    let mount = parse_mount_point(&attached.stdout).ok_or(XcodeError::MountPointNotFound)?;

    let link = format!("{}/Applications", mount);
    if let Err(err) = run(shell, "ln", &["-s", "/Applications", &link], "link Applications") {
        let _ = shell.run("hdiutil", &["detach", &mount]);
        return Err(err);
    }
    run(shell, "hdiutil", &["detach", &mount], "detach image")?;

    let final_path = final_dmg.display().to_string();
    run(
        shell,
        "hdiutil",
        &["convert", &temp, "-format", "UDZO", "-imagekey", "zlib-level=9", "-o", &final_path],
        "compress image",
    )?;

    Ok(Package {
        path: final_dmg,
        method: Method::Hdiutil,
    })
}

/// Removes the writable image on every exit from the hdiutil pipeline.
///
/// A leftover image makes the next `hdiutil create` fail.
struct TempImage<'a>(&'a Path);

impl Drop for TempImage<'_> {
    fn drop(&mut self) {
        match fs::remove_file(self.0) {
            Ok(()) => {}
            Err(err) if err.kind() == io::ErrorKind::NotFound => {}
            Err(err) => {
                warn!(path = %self.0.display(), error = %err, "could not remove temporary image");
            }
        }
    }
}

fn dmg_files(dir: &Path) -> BTreeSet<PathBuf> {
    fs::read_dir(dir)
        .map(|entries| {
            entries
                .flatten()
                .map(|e| e.path())
                .filter(|p| p.extension().is_some_and(|e| e == "dmg"))
                .collect()
        })
        .unwrap_or_default()
}

fn with_create_dmg(
    shell: &dyn Shell,
    opts: &PackageOptions,
    filename: &str,
) -> Result<Package, XcodeError> {
    let final_dmg = opts.output_dir.join(filename);
    let before = dmg_files(&opts.output_dir);
    let app = opts.app.display().to_string();
    let out = opts.output_dir.display().to_string();
    run(shell, "create-dmg", &["--overwrite", &app, &out], "generate DMG")?;

    let produced = dmg_files(&opts.output_dir)
        .into_iter()
        .find(|p| !before.contains(p) && *p != final_dmg);
    if let Some(produced) = produced {
        fs::rename(&produced, &final_dmg).map_err(XcodeError::io(&produced))?;
    }
    Ok(Package {
        path: final_dmg,
        method: Method::CreateDmg,
    })
}
