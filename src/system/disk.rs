//! system::disk
//!
//! Disk usage, filesystem types, inodes, I/O counters and mount points.
//!
//! `df` prints six columns on Linux and nine on macOS (inode columns sit
//! between capacity and the mount point). Both layouts are recognised. The
//! mount point is everything after the last fixed column, so names with
//! spaces survive.

use std::collections::BTreeMap;

use crate::shell::Shell;
use crate::ui::output::{usage_bar, Level, Report};

use super::format::{pad_right, parse_percent, truncate};

/// Mount points always listed.
const IMPORTANT_MOUNTS: &[&str] = &["/", "/home", "/var", "/tmp", "/usr"];

/// One `df -h` row.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DiskUsage {
    pub filesystem: String,
    pub size: String,
    pub used: String,
    pub available: String,
    pub capacity: String,
    pub mount: String,
}

impl DiskUsage {
    /// Capacity as a number, if it parses.
    pub fn percent(&self) -> Option<f64> {
        parse_percent(&self.capacity)
    }
}

/// Index of the mount-point column for a `df` row.
fn mount_column(fields: &[&str]) -> usize {
    // macOS: Filesystem Size Used Avail Capacity iused ifree %iused Mounted
    if fields.len() >= 9 && fields[7].ends_with('%') {
        8
    } else {
        5
    }
}

/// Parse `df -h` output, skipping the header.
pub fn parse_df(output: &str) -> Vec<DiskUsage> {
    output
        .lines()
        .skip(1)
        .filter_map(|line| {
            let fields: Vec<&str> = line.split_whitespace().collect();
            if fields.len() < 6 {
                return None;
            }
            let mount_at = mount_column(&fields);
            Some(DiskUsage {
                filesystem: fields[0].to_string(),
                size: fields[1].to_string(),
                used: fields[2].to_string(),
                available: fields[3].to_string(),
                capacity: fields[4].to_string(),
                mount: fields[mount_at..].join(" "),
            })
        })
        .collect()
}

/// Whether a mount point is listed in the disk view.
///
/// Verbose shows everything; otherwise the well-known system mounts and
/// external volumes under `/Volumes/`.
pub fn should_show_disk(mount: &str, verbose: bool) -> bool {
    verbose || IMPORTANT_MOUNTS.contains(&mount) || mount.starts_with("/Volumes/")
}

/// A `mount` line split into device, mount point and filesystem type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MountEntry {
    pub device: String,
    pub mount: String,
    pub fs_type: String,
}

/// Parse one `mount` line.
///
/// Handles `dev on /mnt type ext4 (rw)` and the macOS form
/// `dev on /mnt (apfs, local, journaled)`.
pub fn parse_mount_line(line: &str) -> Option<MountEntry> {
    let (device, rest) = line.split_once(" on ")?;
    let (mount, fs_type) = if let Some((mount, after)) = rest.split_once(" type ") {
        (mount, after.split_whitespace().next()?)
    } else {
        let open = rest.rfind(" (")?;
        let opts = rest[open + 2..].trim_end_matches(')');
        (&rest[..open], opts.split(',').next()?.trim())
    };
    Some(MountEntry {
        device: device.trim().to_string(),
        mount: mount.trim().to_string(),
        fs_type: fs_type.to_string(),
    })
}

/// Parse `mount` output.
pub fn parse_mounts(output: &str) -> Vec<MountEntry> {
    output.lines().filter_map(parse_mount_line).collect()
}

/// Number of mount points per filesystem type.
pub fn fs_type_counts(mounts: &[MountEntry]) -> BTreeMap<String, usize> {
    let mut counts = BTreeMap::new();
    for m in mounts {
        *counts.entry(m.fs_type.clone()).or_insert(0) += 1;
    }
    counts
}

/// One `df -i` row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InodeUsage {
    pub filesystem: String,
    pub used: String,
    pub free: String,
    pub percent: String,
    pub mount: String,
}

/// Parse `df -i` output (Linux six-column or macOS nine-column).
pub fn parse_df_inodes(output: &str) -> Vec<InodeUsage> {
    output
        .lines()
        .skip(1)
        .filter_map(|line| {
            let f: Vec<&str> = line.split_whitespace().collect();
            if f.len() >= 9 && f[7].ends_with('%') {
                Some(InodeUsage {
                    filesystem: f[0].to_string(),
                    used: f[5].to_string(),
                    free: f[6].to_string(),
                    percent: f[7].to_string(),
                    mount: f[8..].join(" "),
                })
            } else if f.len() >= 6 {
                Some(InodeUsage {
                    filesystem: f[0].to_string(),
                    used: f[2].to_string(),
                    free: f[3].to_string(),
                    percent: f[4].to_string(),
                    mount: f[5..].join(" "),
                })
            } else {
                None
            }
        })
        .collect()
}

/// Per-device I/O counters as `(column, value)` pairs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceIo {
    pub device: String,
    pub stats: Vec<(String, String)>,
}

/// Parse `iostat -d` output.
///
/// macOS lays devices out as column groups (`disk0  disk4` over repeated
/// `KB/t tps MB/s` headers); Linux prints a `Device` header row followed
/// by one row per device.
pub fn parse_iostat(output: &str) -> Vec<DeviceIo> {
    let lines: Vec<&str> = output.lines().filter(|l| !l.trim().is_empty()).collect();
    if let Some(header_at) = lines
        .iter()
        .position(|l| l.trim_start().starts_with("Device"))
    {
        let headers: Vec<&str> = lines[header_at].split_whitespace().skip(1).collect();
        return lines[header_at + 1..]
            .iter()
            .filter_map(|l| {
                let mut f = l.split_whitespace();
                let device = f.next()?.trim_end_matches(':').to_string();
                let stats = headers
                    .iter()
                    .zip(f)
                    .map(|(h, v)| (h.to_string(), v.to_string()))
                    .collect();
                Some(DeviceIo { device, stats })
            })
            .collect();
    }

    if lines.len() < 3 {
        return Vec::new();
    }
    let devices: Vec<&str> = lines[0]
        .split_whitespace()
        .filter(|d| d.starts_with("disk"))
        .collect();
    let headers: Vec<&str> = lines[1].split_whitespace().collect();
    let values: Vec<&str> = lines[2].split_whitespace().collect();
    if devices.is_empty() || headers.len() % devices.len() != 0 {
        return Vec::new();
    }
    let per_device = headers.len() / devices.len();
    devices
        .iter()
        .enumerate()
        .map(|(i, device)| {
            let range = i * per_device..(i + 1) * per_device;
            DeviceIo {
                device: device.to_string(),
                stats: headers[range.clone()]
                    .iter()
                    .zip(values.get(range).unwrap_or(&[]))
                    .map(|(h, v)| (h.to_string(), v.to_string()))
                    .collect(),
            }
        })
        .collect()
}

/// Options for the disk report.
#[derive(Debug, Clone, Copy, Default)]
pub struct DiskOptions {
    pub verbose: bool,
    pub io: bool,
    pub inodes: bool,
}

fn usage_level(percent: f64) -> Level {
    Level::of(percent, 90.0, 80.0)
}

/// Build the disk report.
pub fn report(shell: &dyn Shell, opts: DiskOptions) -> Report {
    let mut r = Report::new();
    r.header("Disk Information");

    r.section("Usage");
    let disks: Vec<DiskUsage> = match shell.capture("df", &["-h"]) {
        Some(out) => parse_df(&out)
            .into_iter()
            .filter(|d| should_show_disk(&d.mount, opts.verbose))
            .collect(),
        None => {
            r.detail("df is unavailable");
            Vec::new()
        }
    };
    if !disks.is_empty() {
        r.line(format!(
            "{} {} {} {} {} Mounted on",
            pad_right("Filesystem", 20),
            pad_right("Size", 8),
            pad_right("Used", 8),
            pad_right("Avail", 8),
            pad_right("Use%", 8)
        ));
        r.line("-".repeat(70));
    }
    for d in &disks {
        let percent = d.percent();
        let capacity = pad_right(&d.capacity, 8);
        let capacity = match percent {
            Some(p) => usage_level(p).paint(capacity),
            None => capacity,
        };
        r.line(format!(
            "{} {} {} {} {} {}",
            pad_right(&truncate(&d.filesystem, 20), 20),
            pad_right(&d.size, 8),
            pad_right(&d.used, 8),
            pad_right(&d.available, 8),
            capacity,
            d.mount
        ));
        if let Some(p) = percent {
            r.line(format!("  {}", usage_bar(p)));
        }
    }

    r.section("Summary");
    let high = disks
        .iter()
        .filter(|d| d.percent().is_some_and(|p| p > 80.0))
        .count();
    r.field("Disks", disks.len());
    r.field("Above 80% used", high);
    if high > 0 {
        r.line(Level::Warn.paint("  Some disks are nearly full; consider freeing space."));
    }

    if opts.verbose {
        let mounts = shell
            .capture("mount", &[])
            .map(|out| parse_mounts(&out))
            .unwrap_or_default();
        r.section("Filesystem types");
        for (fs_type, count) in fs_type_counts(&mounts) {
            r.field(&fs_type, format!("{} mount point(s)", count));
        }
        r.section("Mount points");
        for m in mounts.iter().filter(|m| should_show_disk(&m.mount, false)) {
            r.field("Device", &m.device);
            r.detail(format!("mounted on {} ({})", m.mount, m.fs_type));
        }
    }

    if opts.inodes {
        r.section("Inodes");
        match shell.capture("df", &["-i"]) {
            Some(out) => {
                for i in parse_df_inodes(&out)
                    .into_iter()
                    .filter(|i| should_show_disk(&i.mount, false))
                {
                    let pct = match parse_percent(&i.percent) {
                        Some(p) => usage_level(p).paint(&i.percent),
                        None => i.percent.clone(),
                    };
                    r.line(format!(
                        "{} used {} free {} {} {}",
                        pad_right(&truncate(&i.filesystem, 20), 20),
                        pad_right(&i.used, 10),
                        pad_right(&i.free, 10),
                        pct,
                        i.mount
                    ));
                }
            }
            None => {
                r.detail("df -i is unavailable");
            }
        }
    }

    if opts.io {
        r.section("I/O");
        match shell.capture("iostat", &["-d"]) {
            Some(out) => {
                for dev in parse_iostat(&out) {
                    r.field("Device", &dev.device);
                    for (name, value) in &dev.stats {
                        r.detail(format!("{}: {}", name, value));
                    }
                }
            }
            None => {
                r.detail("iostat is unavailable");
            }
        }
    }

    r
}
