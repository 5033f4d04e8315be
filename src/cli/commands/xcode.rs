//! xcode command - macOS app release toolchain
//!
//! Every step ends by printing the release roadmap with itself marked.

use std::path::{Path, PathBuf};

use crate::cli::args::XcodeAction;
use crate::cli::Context;
use crate::shell::{Shell, SystemShell};
use crate::xcode::build::{self, BuildOptions};
use crate::xcode::package::{self, Method, PackageOptions};
use crate::xcode::toolchain::{self, SetupOptions};
use crate::xcode::{bundle, project, roadmap, signing, Step, XcodeProject};
use crate::ui::output::{self, Report};
use anyhow::{bail, Context as _, Result};

/// Run an xcode step.
pub fn xcode(ctx: &Context, action: XcodeAction) -> Result<()> {
    let shell = SystemShell;
    let cwd = std::env::current_dir().context("Failed to read current directory")?;

    let step = match action {
        XcodeAction::Info { verbose } => {
            toolchain::info_report(&shell, verbose).print();
            Step::Setup
        }
        XcodeAction::Version { project: explicit } => {
            let pbxproj = pbxproj_path(&cwd, explicit)?;
            let version = project::read_version(&pbxproj)?;
            let mut r = Report::new();
            r.header("Version");
            r.field("Project", pbxproj.display());
            r.field("Marketing version", console::style(&version).green().bold());
            r.print();
            Step::Version
        }
        XcodeAction::Bump {
            project: explicit,
            dry_run,
        } => {
            let pbxproj = pbxproj_path(&cwd, explicit)?;
            let bump = project::bump_file(&pbxproj, dry_run)?;
            let mut r = Report::new();
            r.header("Version Bump");
            r.field("Project", pbxproj.display());
            r.field("Current", &bump.old);
            r.field("New", console::style(&bump.new).green().bold());
            r.print();
            if bump.written {
                output::success(
                    format!("Version updated: {} -> {}", bump.old, bump.new),
                    ctx.verbosity(),
                );
                toolchain::git_changes(&shell, &bump.new).print();
            } else {
                output::info("dry run: nothing written", ctx.verbosity());
            }
            Step::Version
        }
        XcodeAction::Build {
            scheme,
            build_path,
            arch,
            verbose,
            no_clean,
        } => {
            let detected = XcodeProject::detect(&cwd)?;
            let scheme = project::resolve_scheme(&shell, &cwd, scheme.as_deref())?;
            let opts = BuildOptions {
                project: detected,
                scheme,
                build_path,
                arch: arch.into(),
                verbose,
                clean: !no_clean,
            };
            toolchain::environment_report(
                &shell,
                "Build",
                &[
                    ("Project", opts.project.path.display().to_string()),
                    ("Type", opts.project.kind.label().to_string()),
                    ("Scheme", opts.scheme.clone()),
                    ("Architecture", opts.arch.to_string()),
                    ("Build path", opts.build_path.display().to_string()),
                ],
            )
            .print();
            if let Some(archs) = opts.project.archs(&shell, &opts.scheme) {
                output::info(format!("project ARCHS: {}", archs), ctx.verbosity());
            }
            build::build(&shell, &opts)?;
            output::success(
                format!("Build complete: {}", opts.products_dir().display()),
                ctx.verbosity(),
            );
            Step::Build
        }
        XcodeAction::Codesign {
            scheme,
            build_path,
            identity,
            verbose,
        } => {
            let scheme = project::resolve_scheme(&shell, &cwd, scheme.as_deref())?;
            let Some(identity) = identity.filter(|i| !i.is_empty()) else {
                print_identities(&shell);
                bail!("No signing identity given. Pass one with -i/--identity.");
            };
            let app = signing::app_path(&build_path, &scheme);
            ensure_app(&shell, &app, &scheme)?;
            toolchain::environment_report(
                &shell,
                "Code Signing",
                &[
                    ("Application", app.display().to_string()),
                    ("Identity", identity.clone()),
                ],
            )
            .print();
            let signed = signing::sign_app(&shell, &app, &identity, verbose)?;
            for path in &signed {
                output::success(format!("signed {}", path.display()), ctx.verbosity());
            }
            output::success("Signature verified", ctx.verbosity());
            Step::Codesign
        }
        XcodeAction::Package {
            scheme,
            build_path,
            output: output_dir,
            name,
            no_arch,
            verbose,
            use_create_dmg,
        } => {
            let scheme = project::resolve_scheme(&shell, &cwd, scheme.as_deref())?;
            let app = build_path.join(format!("{}.app", scheme));
            ensure_app(&shell, &app, &scheme)?;
            let opts = PackageOptions {
                app,
                scheme,
                output_dir,
                name,
                include_arch: !no_arch,
                verbose,
                use_create_dmg,
            };
            let pkg = package::create(&shell, &opts)?;
            let path = pkg.path.display().to_string();
            let mut r = Report::new();
            r.header("Package");
            r.field("DMG", &path);
            r.field("Size", bundle::disk_size(&shell, &path));
            r.field(
                "Method",
                match pkg.method {
                    Method::Hdiutil => "hdiutil",
                    Method::CreateDmg => "create-dmg",
                },
            );
            if let Some(info) = bundle::BundleInfo::read(&shell, &opts.app) {
                if let Some(v) = info.short_version {
                    r.field("Version", v);
                }
                if let Some(id) = info.identifier {
                    r.field("Bundle id", id);
                }
            }
            r.print();
            Step::Package
        }
        XcodeAction::Setup {
            show_certificates,
            show_keychain,
            show_profiles,
            all,
            verbose,
        } => {
            let opts = if all {
                SetupOptions::all(verbose)
            } else {
                SetupOptions {
                    certificates: show_certificates,
                    keychain: show_keychain,
                    profiles: show_profiles,
                    verbose,
                }
            };
            let home = dirs::home_dir().context("Home directory not found")?;
            let profiles = home.join("Library/MobileDevice/Provisioning Profiles");
            toolchain::setup_report(&shell, opts, &profiles).print();
            Step::Setup
        }
    };

    if !ctx.quiet {
        roadmap::render(step).print();
    }
    Ok(())
}

fn pbxproj_path(cwd: &Path, explicit: Option<PathBuf>) -> Result<PathBuf> {
    match explicit {
        Some(p) => Ok(p),
        None => Ok(project::find_pbxproj(cwd)?),
    }
}

fn print_identities(shell: &dyn Shell) {
    let mut r = Report::new();
    r.section("Available signing identities");
    match signing::identities(shell) {
        Some(ids) if !ids.is_empty() => {
            for (i, id) in ids.iter().enumerate() {
                r.line(format!("  {}) {} [{}]", i + 1, id.name, id.kind.label()));
            }
        }
        _ => {
            r.detail("none found");
        }
    }
    r.print();
}

/// Fail with search suggestions when the app bundle is missing.
fn ensure_app(shell: &dyn Shell, app: &Path, scheme: &str) -> Result<()> {
    if app.exists() {
        return Ok(());
    }
    let found = bundle::search_apps(shell, scheme);
    if !found.is_empty() {
        let mut r = Report::new();
        r.section(&format!("Found {}.app elsewhere", scheme));
        for path in &found {
            r.detail(path);
        }
        r.print();
    }
    bail!(
        "Application not found: {}. Run `jarvis xcode build` first or pass --build-path.",
        app.display()
    )
}
