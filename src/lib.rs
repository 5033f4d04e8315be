//! Jarvis - a personal command-line assistant
//!
//! Jarvis bundles the chores of one developer's day into a single binary:
//! driving a hosting control panel over its signed HTTP API, creating local
//! MySQL databases, reporting on the host, and taking a macOS app from
//! version bump to a signed DMG.
//!
//! # Architecture
//!
//! - [`cli`] - Command-line interface layer (parses args, dispatches)
//! - [`config`] - TOML configuration with flag > file > default precedence
//! - [`panel`] - Signed form POSTs against the hosting panel
//! - [`mysql`] - Local MySQL listing and creation
//! - [`shell`] - Single interface for running OS utilities
//! - [`system`] - Host reports parsed from OS utilities
//! - [`xcode`] - Release pipeline around `xcodebuild`, `codesign`, `hdiutil`
//! - [`ui`] - User-facing output
//!
//! # Invariants
//!
//! 1. The panel key is never sent; every request carries a timestamp and a
//!    token derived from it instead
//! 2. Every panel request times out after 20 seconds
//! 3. External programs run only through [`shell::Shell`]

pub mod cli;
pub mod config;
pub mod mysql;
pub mod panel;
pub mod shell;
pub mod system;
pub mod ui;
pub mod xcode;
