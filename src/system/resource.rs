//! system::resource
//!
//! CPU, memory, disk and load snapshot.
//!
//! Sources (macOS): `top -l 1 -n 0` for CPU, `vm_stat` plus
//! `sysctl -n hw.pagesize` for memory, `df -h` for disks and `uptime` for
//! load averages.

use crate::shell::Shell;
use crate::ui::output::{usage_bar, Report};

use super::disk::{parse_df, DiskUsage};
use super::format::format_gb;

const DEFAULT_PAGE_SIZE: u64 = 4096;

/// Memory totals in bytes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Memory {
    pub total: u64,
    pub used: u64,
    pub free: u64,
}

impl Memory {
    /// Used share of total, 0 when total is unknown.
    pub fn percent_used(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            self.used as f64 / self.total as f64 * 100.0
        }
    }
}

/// One resource snapshot.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Snapshot {
    pub cpus: usize,
    pub cpu_usage: Option<f64>,
    pub cpu_line: Option<String>,
    pub memory: Option<Memory>,
    pub disks: Vec<DiskUsage>,
    pub load: Option<String>,
}

/// The `CPU usage:` line of `top` output.
pub fn cpu_usage_line(top: &str) -> Option<&str> {
    top.lines()
        .find(|l| l.contains("CPU usage:"))
        .map(str::trim)
}

/// CPU busy percentage (100 minus idle) from `top` output.
pub fn parse_cpu_usage(top: &str) -> Option<f64> {
    let line = cpu_usage_line(top)?;
    line.split(',')
        .map(str::trim)
        .find(|part| part.contains("idle"))
        .and_then(|part| part.split_whitespace().next())
        .and_then(|idle| idle.trim_end_matches('%').parse::<f64>().ok())
        .map(|idle| 100.0 - idle)
}

/// First positive integer in a `vm_stat` line, ignoring trailing dots.
fn extract_pages(line: &str) -> Option<u64> {
    line.split_whitespace()
        .filter_map(|f| f.trim_end_matches('.').parse::<u64>().ok())
        .find(|n| *n > 0)
}

/// Memory totals from `vm_stat` output.
///
/// free = "Pages free"; used = active + inactive + wired down;
/// total = used + free.
pub fn parse_vm_stat(vm_stat: &str, page_size: u64) -> Memory {
    let mut mem = Memory::default();
    for line in vm_stat.lines() {
        let pages = || extract_pages(line).unwrap_or(0) * page_size;
        if line.contains("Pages free:") {
            mem.free = pages();
        } else if line.contains("Pages active:")
            || line.contains("Pages inactive:")
            || line.contains("Pages wired down:")
        {
            mem.used += pages();
        }
    }
    mem.total = mem.used + mem.free;
    mem
}

/// Text after `load averages:` (macOS) or `load average:` (Linux).
pub fn parse_load(uptime: &str) -> Option<String> {
    ["load averages:", "load average:"]
        .iter()
        .find_map(|marker| uptime.split_once(marker))
        .map(|(_, rest)| rest.trim().to_string())
        .filter(|s| !s.is_empty())
}

/// Mounts shown in the resource view: `/` and `/Volumes*`, or all.
pub fn is_primary_mount(mount: &str, verbose: bool) -> bool {
    verbose || mount == "/" || mount.starts_with("/Volumes")
}

/// Take one snapshot.
pub fn collect(shell: &dyn Shell, verbose: bool) -> Snapshot {
    let top = shell.capture("top", &["-l", "1", "-n", "0"]);
    let page_size = shell
        .capture_line("sysctl", &["-n", "hw.pagesize"])
        .and_then(|s| s.parse().ok())
        .unwrap_or(DEFAULT_PAGE_SIZE);
    let memory = shell
        .capture("vm_stat", &[])
        .map(|out| parse_vm_stat(&out, page_size));
    let disks = shell
        .capture("df", &["-h"])
        .map(|out| parse_df(&out))
        .unwrap_or_default()
        .into_iter()
        .filter(|d| is_primary_mount(&d.mount, verbose))
        .collect();

    Snapshot {
        cpus: std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1),
        cpu_usage: top.as_deref().and_then(parse_cpu_usage),
        cpu_line: top
            .as_deref()
            .and_then(cpu_usage_line)
            .map(str::to_string),
        memory,
        disks,
        load: shell.capture("uptime", &[]).and_then(|u| parse_load(&u)),
    }
}

/// Render a snapshot.
pub fn render(snap: &Snapshot, verbose: bool) -> Report {
    let mut r = Report::new();
    r.header("System Resources");

    r.section("CPU");
    r.field("Cores", snap.cpus);
    if let Some(usage) = snap.cpu_usage {
        r.field("Usage", format!("{:.1}%", usage));
        r.line(format!("  {}", usage_bar(usage)));
    }
    if verbose {
        if let Some(line) = &snap.cpu_line {
            r.detail(line);
        }
    }

    r.section("Memory");
    match &snap.memory {
        Some(mem) if mem.total > 0 => {
            r.field("Total", format_gb(mem.total));
            r.field("Used", format_gb(mem.used));
            r.field("Free", format_gb(mem.free));
            r.field("Usage", format!("{:.1}%", mem.percent_used()));
            r.line(format!("  {}", usage_bar(mem.percent_used())));
        }
        _ => {
            r.detail("unavailable");
        }
    }

    r.section("Disk");
    for disk in &snap.disks {
        r.field("Mount", &disk.mount);
        r.detail(format!(
            "{}  size {}  used {}  avail {}  ({})",
            disk.filesystem, disk.size, disk.used, disk.available, disk.capacity
        ));
        if let Some(p) = disk.percent() {
            r.line(format!("  {}", usage_bar(p)));
        }
    }

    r.section("Load");
    match &snap.load {
        Some(load) => {
            r.field("Load average", load);
            if verbose {
                r.detail("1, 5 and 15 minute averages");
                r.detail(format!(
                    "{} cores; sustained load above this means the system is busy",
                    snap.cpus
                ));
            }
        }
        None => {
            r.detail("unavailable");
        }
    }
    r
}
