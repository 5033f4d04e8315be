//! system::info
//!
//! Basic host information: OS, hardware and shell environment.

use crate::shell::Shell;
use crate::ui::output::Report;

use super::format::{format_gb, parse_leading_u64};

/// PATH entries shown before the remainder is summarised.
const PATH_PREVIEW: usize = 10;

/// Collected host information.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SystemInfo {
    pub os: String,
    pub arch: String,
    pub cpus: usize,
    pub hostname: Option<String>,
    pub user: Option<String>,
    pub cwd: Option<String>,
    pub macos: Option<MacosInfo>,
    pub hardware: Hardware,
    pub env: Environment,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct MacosInfo {
    pub product_version: Option<String>,
    pub build_version: Option<String>,
    pub kernel: Option<String>,
    pub uptime: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Hardware {
    pub cpu_brand: Option<String>,
    pub memory_bytes: Option<u64>,
    pub cpu_max_hz: Option<u64>,
    pub l1i_cache: Option<String>,
    pub l2_cache: Option<String>,
    pub l3_cache: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Environment {
    pub shell: Option<String>,
    pub term: Option<String>,
    pub lang: Option<String>,
    pub path: Option<String>,
}

/// First `limit` PATH entries and how many were left out.
pub fn path_preview(path: &str, limit: usize) -> (Vec<&str>, usize) {
    let entries: Vec<&str> = path.split(':').collect();
    let hidden = entries.len().saturating_sub(limit);
    (entries.into_iter().take(limit).collect(), hidden)
}

fn sysctl(shell: &dyn Shell, name: &str) -> Option<String> {
    shell.capture_line("sysctl", &["-n", name])
}

/// Gather host information.
///
/// `env` looks up environment variables. macOS-only sources are queried
/// when `os` is `macos`; elsewhere those fields stay empty.
pub fn collect(
    shell: &dyn Shell,
    env: &dyn Fn(&str) -> Option<String>,
    verbose: bool,
) -> SystemInfo {
    let os = std::env::consts::OS.to_string();
    let is_macos = os == "macos";

    let macos = is_macos.then(|| MacosInfo {
        product_version: shell.capture_line("sw_vers", &["-productVersion"]),
        build_version: shell.capture_line("sw_vers", &["-buildVersion"]),
        kernel: shell.capture_line("uname", &["-r"]),
        uptime: if verbose {
            shell.capture_line("uptime", &[])
        } else {
            None
        },
    });

    let hardware = if is_macos {
        let mut hw = Hardware {
            cpu_brand: sysctl(shell, "machdep.cpu.brand_string"),
            memory_bytes: sysctl(shell, "hw.memsize").and_then(|s| parse_leading_u64(&s)),
            ..Default::default()
        };
        if verbose {
            hw.cpu_max_hz = sysctl(shell, "hw.cpufrequency_max").and_then(|s| parse_leading_u64(&s));
            hw.l1i_cache = sysctl(shell, "hw.l1icachesize");
            hw.l2_cache = sysctl(shell, "hw.l2cachesize");
            hw.l3_cache = sysctl(shell, "hw.l3cachesize");
        }
        hw
    } else {
        Hardware::default()
    };

    SystemInfo {
        arch: std::env::consts::ARCH.to_string(),
        cpus: std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1),
        hostname: shell.capture_line("hostname", &[]),
        user: env("USER").filter(|u| !u.is_empty()),
        cwd: std::env::current_dir()
            .ok()
            .map(|p| p.display().to_string()),
        macos,
        hardware,
        env: Environment {
            shell: env("SHELL"),
            term: env("TERM"),
            lang: env("LANG"),
            path: if verbose { env("PATH") } else { None },
        },
        os,
    }
}

/// Render the info report.
pub fn render(info: &SystemInfo) -> Report {
    let mut r = Report::new();
    r.header("System Information");

    r.section("Operating System");
    r.field("OS", &info.os);
    r.field("Architecture", &info.arch);
    r.field("CPU cores", info.cpus);
    if let Some(h) = &info.hostname {
        r.field("Hostname", h);
    }
    if let Some(u) = &info.user {
        r.field("User", u);
    }
    if let Some(c) = &info.cwd {
        r.field("Working directory", c);
    }
    if let Some(mac) = &info.macos {
        if let Some(v) = &mac.product_version {
            r.field("macOS version", v);
        }
        if let Some(v) = &mac.build_version {
            r.field("Build", v);
        }
        if let Some(v) = &mac.kernel {
            r.field("Kernel", v);
        }
        if let Some(v) = &mac.uptime {
            r.field("Uptime", v);
        }
    }

    let hw = &info.hardware;
    r.section("Hardware");
    if let Some(b) = &hw.cpu_brand {
        r.field("Processor", b);
    }
    if let Some(m) = hw.memory_bytes.filter(|m| *m > 0) {
        r.field("Memory", format_gb(m));
    }
    if let Some(hz) = hw.cpu_max_hz.filter(|hz| *hz > 0) {
        r.field("Max frequency", format!("{:.2} GHz", hz as f64 / 1e9));
    }
    for (label, value) in [
        ("L1 instruction cache", &hw.l1i_cache),
        ("L2 cache", &hw.l2_cache),
        ("L3 cache", &hw.l3_cache),
    ] {
        if let Some(v) = value {
            r.field(label, format!("{} bytes", v));
        }
    }

    r.section("Environment");
    for (label, value) in [
        ("Shell", &info.env.shell),
        ("Terminal", &info.env.term),
        ("Locale", &info.env.lang),
    ] {
        if let Some(v) = value.as_deref().filter(|v| !v.is_empty()) {
            r.field(label, v);
        }
    }
    if let Some(path) = info.env.path.as_deref().filter(|p| !p.is_empty()) {
        r.field("PATH", "");
        let (shown, hidden) = path_preview(path, PATH_PREVIEW);
        for entry in shown {
            r.detail(entry);
        }
        if hidden > 0 {
            r.detail(format!("... {} more", hidden));
        }
    }
    r
}
