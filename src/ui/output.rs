//! ui::output
//!
//! Output formatting and display.
//!
//! # Design
//!
//! Informational output respects `--quiet`. Command results (panel bodies,
//! report tables) and errors are always printed. Colour comes from
//! `console`, which drops styling automatically when stdout is not a TTY.

use std::fmt::Display;

use console::{style, Style};

/// Output verbosity level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verbosity {
    /// Quiet mode - results and errors only
    Quiet,
    /// Normal mode - standard output
    Normal,
    /// Debug mode - verbose output
    Debug,
}

impl Verbosity {
    /// Create verbosity from flags.
    pub fn from_flags(quiet: bool, debug: bool) -> Self {
        if quiet {
            Verbosity::Quiet
        } else if debug {
            Verbosity::Debug
        } else {
            Verbosity::Normal
        }
    }

    fn shows_info(self) -> bool {
        self != Verbosity::Quiet
    }
}

/// Print a result line (always shown).
pub fn result(message: impl Display) {
    println!("{}", message);
}

/// Print an informational message (respects quiet mode).
pub fn info(message: impl Display, verbosity: Verbosity) {
    if verbosity.shows_info() {
        println!("{}", style(message).cyan());
    }
}

/// Print an error message (always shown).
pub fn error(message: impl Display) {
    eprintln!("{} {}", style("error:").red().bold(), message);
}

/// Print a warning message (respects quiet mode).
pub fn warn(message: impl Display, verbosity: Verbosity) {
    if verbosity.shows_info() {
        eprintln!("{} {}", style("warning:").yellow().bold(), message);
    }
}

/// Print a success message (respects quiet mode).
pub fn success(message: impl Display, verbosity: Verbosity) {
    if verbosity.shows_info() {
        println!("{} {}", style("✓").green(), message);
    }
}

/// A multi-line report built up before printing.
///
/// Report builders return one of these so their content can be asserted in
/// tests; commands print it with [`Report::print`].
#[derive(Debug, Clone, Default)]
pub struct Report {
    out: String,
}

impl Report {
    pub fn new() -> Self {
        Self::default()
    }

    /// Report title followed by a rule.
    pub fn header(&mut self, title: &str) -> &mut Self {
        let dim = Style::new().dim();
        self.line(style(title).bold());
        self.line(dim.apply_to("═".repeat(50)))
    }

    /// Section heading, preceded by a blank line.
    pub fn section(&mut self, title: &str) -> &mut Self {
        self.blank();
        self.line(style(title).bold().underlined())
    }

    /// Indented `label: value` line.
    pub fn field(&mut self, label: &str, value: impl Display) -> &mut Self {
        let dim = Style::new().dim();
        self.line(format!("  {} {}", dim.apply_to(format!("{}:", label)), value))
    }

    /// Dimmed, further-indented detail line.
    pub fn detail(&mut self, text: impl Display) -> &mut Self {
        let dim = Style::new().dim();
        self.line(format!("    {}", dim.apply_to(text)))
    }

    /// Raw line.
    pub fn line(&mut self, text: impl Display) -> &mut Self {
        self.out.push_str(&text.to_string());
        self.out.push('\n');
        self
    }

    pub fn blank(&mut self) -> &mut Self {
        self.out.push('\n');
        self
    }

    /// Report text with styling removed.
    pub fn plain(&self) -> String {
        console::strip_ansi_codes(&self.out).into_owned()
    }

    /// Print to stdout (always shown).
    pub fn print(&self) {
        print!("{}", self.out);
    }
}

impl Display for Report {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.out)
    }
}

/// Format a list of items.
pub fn format_list<T: Display>(items: &[T], prefix: &str) -> String {
    items
        .iter()
        .map(|item| format!("{}{}", prefix, item))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Severity bucket for a percentage against two thresholds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    Ok,
    Warn,
    Critical,
}

impl Level {
    /// `Critical` above `red`, `Warn` above `yellow`, else `Ok`.
    pub fn of(value: f64, red: f64, yellow: f64) -> Self {
        if value > red {
            Level::Critical
        } else if value > yellow {
            Level::Warn
        } else {
            Level::Ok
        }
    }

    fn style(self) -> Style {
        match self {
            Level::Ok => Style::new().green(),
            Level::Warn => Style::new().yellow(),
            Level::Critical => Style::new().red(),
        }
    }

    /// Apply this level's colour.
    pub fn paint(self, text: impl Display) -> String {
        self.style().apply_to(text).to_string()
    }
}

/// Width of usage bars in cells.
pub const BAR_WIDTH: usize = 30;

/// Cells filled for a percentage, clamped to `0..=BAR_WIDTH`.
pub fn bar_cells(percent: f64) -> usize {
    let clamped = percent.clamp(0.0, 100.0);
    ((clamped / 100.0) * BAR_WIDTH as f64) as usize
}

/// Coloured `[████░░░░]` usage bar (red > 80, yellow > 60).
pub fn usage_bar(percent: f64) -> String {
    let filled = bar_cells(percent);
    let bar = format!("{}{}", "█".repeat(filled), "░".repeat(BAR_WIDTH - filled));
    format!("[{}]", Level::of(percent, 80.0, 60.0).paint(bar))
}
