//! xcode::roadmap
//!
//! The release pipeline, printed after each xcode step so the next
//! command is always visible.

use console::style;

use crate::ui::output::Report;

/// Pipeline step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Setup,
    Version,
    Build,
    Codesign,
    Package,
    Notarize,
    Distribute,
}

impl Step {
    pub const ALL: [Step; 7] = [
        Step::Setup,
        Step::Version,
        Step::Build,
        Step::Codesign,
        Step::Package,
        Step::Notarize,
        Step::Distribute,
    ];

    pub fn title(self) -> &'static str {
        match self {
            Step::Setup => "Environment setup",
            Step::Version => "Version management",
            Step::Build => "Build",
            Step::Codesign => "Code signing",
            Step::Package => "Packaging",
            Step::Notarize => "Notarization",
            Step::Distribute => "Distribution",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            Step::Setup => "configure the code signing environment",
            Step::Version => "view or bump the app version",
            Step::Build => "compile a Release build",
            Step::Codesign => "sign the app with your identity",
            Step::Package => "create the DMG installer",
            Step::Notarize => "Apple notarization (optional)",
            Step::Distribute => "upload or hand out the DMG",
        }
    }

    /// Suggested follow-up commands.
    pub fn next_hint(self) -> &'static [&'static str] {
        match self {
            Step::Setup => &["jarvis xcode version", "jarvis xcode build"],
            Step::Version => &["jarvis xcode build"],
            Step::Build => &["jarvis xcode codesign"],
            Step::Codesign => &["jarvis xcode package"],
            Step::Package => &["notarize the DMG or distribute it directly"],
            Step::Notarize => &["publish to a distribution channel or share a download link"],
            Step::Distribute => &["the release pipeline is complete"],
        }
    }
}

/// Render the roadmap with `current` highlighted.
pub fn render(current: Step) -> Report {
    let mut r = Report::new();
    r.blank();
    r.header("Release Roadmap");
    r.field("Current step", style(current.title()).green());
    r.blank();
    for step in Step::ALL {
        if step == current {
            r.line(
                style(format!("▶ {}: {}", step.title(), step.description()))
                    .green()
                    .bold(),
            );
        } else {
            r.line(format!("  {}: {}", step.title(), step.description()));
        }
    }
    r.section("Next");
    for hint in current.next_hint() {
        r.line(format!("  {}", style(hint).cyan()));
    }
    r
}
