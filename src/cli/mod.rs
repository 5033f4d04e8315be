//! cli
//!
//! Command-line interface layer for Jarvis.
//!
//! # Responsibilities
//!
//! - Parse command-line arguments and global flags
//! - Initialise logging and load configuration
//! - Delegate to command handlers
//!
//! # Architecture
//!
//! The CLI layer is thin. Handlers resolve flags against the loaded
//! [`Config`] and call into the domain modules ([`crate::panel`],
//! [`crate::mysql`], [`crate::system`], [`crate::xcode`]), which do the
//! actual work and return typed errors.

pub mod args;
pub mod commands;
pub mod logging;

pub use args::{Cli, Shell};

use anyhow::{Context as _, Result};

use crate::config::Config;
use crate::ui::output::Verbosity;

/// State shared by every command handler.
#[derive(Debug, Clone)]
pub struct Context {
    pub debug: bool,
    pub quiet: bool,
    pub config: Config,
}

impl Context {
    /// Output verbosity from the global flags.
    pub fn verbosity(&self) -> Verbosity {
        Verbosity::from_flags(self.quiet, self.debug)
    }
}

/// Run the CLI application.
///
/// This is the main entry point called from `main.rs`.
pub fn run() -> Result<()> {
    let cli = Cli::parse_args();
    logging::init(cli.debug);

    let config = Config::load(cli.config.as_deref()).context("Failed to load configuration")?;
    let ctx = Context {
        debug: cli.debug,
        quiet: cli.quiet,
        config,
    };

    commands::dispatch(cli.command, &ctx)
}
