//! ui
//!
//! User-facing terminal output.
//!
//! # Modules
//!
//! - [`output`] - Messages, report headings, colour thresholds, usage bars
//!
//! # Design
//!
//! All terminal output goes through this module so `--quiet` is honoured
//! consistently. Diagnostics go to `tracing` instead.

pub mod output;
