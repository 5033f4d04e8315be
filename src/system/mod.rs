//! system
//!
//! Host reports built from standard OS utilities.
//!
//! Every reporter takes a [`crate::shell::Shell`] and returns a
//! [`crate::ui::output::Report`], so output can be asserted against canned
//! command output. Collection is best effort: a utility that is missing or
//! fails leaves its part of the report empty rather than aborting.
//!
//! The sources are the macOS tools (`sysctl`, `vm_stat`, `top -l`,
//! `netstat -b`); parsers also accept the Linux layouts of `df`, `mount`,
//! `iostat` and `ifconfig` where they differ.

pub mod disk;
pub mod format;
pub mod info;
pub mod network;
pub mod process;
pub mod resource;
