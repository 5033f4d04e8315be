//! system::process
//!
//! Process statistics and a sortable, filterable process list from `ps`.

use std::cmp::Ordering;
use std::collections::BTreeMap;

use crate::shell::Shell;
use crate::ui::output::{Level, Report};

use super::format::{pad_right, truncate};

/// One `ps aux` row.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProcessInfo {
    pub pid: u32,
    pub name: String,
    pub cpu: f64,
    pub memory: f64,
    pub user: String,
    pub command: String,
}

/// Sort order for the process list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortKey {
    #[default]
    Cpu,
    Memory,
    Pid,
    Name,
}

impl SortKey {
    /// Parse a sort name. Unknown names fall back to CPU.
    pub fn from_name(name: &str) -> Self {
        match name.to_ascii_lowercase().as_str() {
            "memory" | "mem" => SortKey::Memory,
            "pid" => SortKey::Pid,
            "name" => SortKey::Name,
            _ => SortKey::Cpu,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            SortKey::Cpu => "cpu",
            SortKey::Memory => "memory",
            SortKey::Pid => "pid",
            SortKey::Name => "name",
        }
    }
}

/// Parse `ps aux` output.
///
/// Rows with fewer than eleven columns are skipped. The name is the first
/// word of the command with kernel-thread brackets removed.
pub fn parse_ps_aux(output: &str) -> Vec<ProcessInfo> {
    output
        .lines()
        .skip(1)
        .filter_map(|line| {
            let f: Vec<&str> = line.split_whitespace().collect();
            if f.len() < 11 {
                return None;
            }
            let raw_name = f[10];
            let name = if raw_name.starts_with('[') && raw_name.ends_with(']') {
                raw_name.trim_matches(|c| c == '[' || c == ']')
            } else {
                raw_name
            };
            Some(ProcessInfo {
                pid: f[1].parse().unwrap_or(0),
                cpu: f[2].parse().unwrap_or(0.0),
                memory: f[3].parse().unwrap_or(0.0),
                user: f[0].to_string(),
                name: name.to_string(),
                command: f[10..].join(" "),
            })
        })
        .collect()
}

/// Human name of a process state letter.
pub fn state_name(state: char) -> Option<&'static str> {
    Some(match state {
        'R' => "Running",
        'S' => "Sleeping",
        'I' => "Idle",
        'T' => "Stopped",
        'Z' => "Zombie",
        'U' => "Uninterruptible",
        _ => return None,
    })
}

/// Count processes by the first letter of `ps -eo stat` output.
pub fn count_states(output: &str) -> BTreeMap<char, usize> {
    let mut counts = BTreeMap::new();
    for line in output.lines().skip(1) {
        if let Some(c) = line.trim().chars().next() {
            *counts.entry(c).or_insert(0) += 1;
        }
    }
    counts
}

/// Keep processes whose name or command contains `filter`, ignoring case.
pub fn filter_processes(processes: Vec<ProcessInfo>, filter: &str) -> Vec<ProcessInfo> {
    let needle = filter.to_lowercase();
    processes
        .into_iter()
        .filter(|p| {
            p.name.to_lowercase().contains(&needle) || p.command.to_lowercase().contains(&needle)
        })
        .collect()
}

/// Sort in place: CPU and memory descending, PID and name ascending.
pub fn sort_processes(processes: &mut [ProcessInfo], key: SortKey) {
    let desc = |a: f64, b: f64| b.partial_cmp(&a).unwrap_or(Ordering::Equal);
    match key {
        SortKey::Cpu => processes.sort_by(|a, b| desc(a.cpu, b.cpu)),
        SortKey::Memory => processes.sort_by(|a, b| desc(a.memory, b.memory)),
        SortKey::Pid => processes.sort_by_key(|p| p.pid),
        SortKey::Name => processes.sort_by(|a, b| a.name.cmp(&b.name)),
    }
}

/// Options for the process report.
#[derive(Debug, Clone, Default)]
pub struct ProcessOptions {
    /// Rows to show; 0 shows all.
    pub top: usize,
    pub sort: SortKey,
    pub filter: Option<String>,
    pub verbose: bool,
}

/// Build the process report.
pub fn report(shell: &dyn Shell, opts: &ProcessOptions) -> Report {
    let mut r = Report::new();
    r.header("Processes");

    let ps = shell.capture("ps", &["aux"]);

    r.section("Statistics");
    if let Some(out) = &ps {
        let total = out.lines().count().saturating_sub(1);
        if total > 0 {
            r.field("Total", total);
        }
    }
    if let Some(out) = shell.capture("ps", &["-eo", "stat"]) {
        for (state, count) in count_states(&out) {
            match state_name(state) {
                Some(name) => r.field(name, count),
                None => r.field(&state.to_string(), count),
            };
        }
    }

    r.section(&format!(
        "Top {} by {}",
        if opts.top == 0 { "all".to_string() } else { opts.top.to_string() },
        opts.sort.label()
    ));
    let mut processes = ps.as_deref().map(parse_ps_aux).unwrap_or_default();
    if processes.is_empty() {
        r.line(Level::Critical.paint("  unable to read the process list"));
        return r;
    }
    if let Some(filter) = opts.filter.as_deref().filter(|f| !f.is_empty()) {
        processes = filter_processes(processes, filter);
        r.field("Matching", processes.len());
    }
    sort_processes(&mut processes, opts.sort);
    if opts.top > 0 {
        processes.truncate(opts.top);
    }

    if opts.verbose {
        r.line(format!(
            "{} {} {} {} {} COMMAND",
            pad_right("PID", 8),
            pad_right("NAME", 20),
            pad_right("CPU%", 8),
            pad_right("MEM%", 8),
            pad_right("USER", 10)
        ));
        r.line("-".repeat(80));
    } else {
        r.line(format!(
            "{} {} {} {} USER",
            pad_right("PID", 8),
            pad_right("NAME", 25),
            pad_right("CPU%", 8),
            pad_right("MEM%", 8)
        ));
        r.line("-".repeat(60));
    }

    for p in &processes {
        let cpu = Level::of(p.cpu, 50.0, 20.0).paint(pad_right(&format!("{:.1}", p.cpu), 8));
        let mem = Level::of(p.memory, 10.0, 5.0).paint(pad_right(&format!("{:.1}", p.memory), 8));
        if opts.verbose {
            r.line(format!(
                "{} {} {} {} {} {}",
                pad_right(&p.pid.to_string(), 8),
                pad_right(&truncate(&p.name, 20), 20),
                cpu,
                mem,
                pad_right(&truncate(&p.user, 10), 10),
                truncate(&p.command, 30)
            ));
        } else {
            r.line(format!(
                "{} {} {} {} {}",
                pad_right(&p.pid.to_string(), 8),
                pad_right(&truncate(&p.name, 25), 25),
                cpu,
                mem,
                truncate(&p.user, 10)
            ));
        }
    }
    r
}
