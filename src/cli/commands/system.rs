//! system command - Host reports

use std::thread;
use std::time::Duration;

use crate::cli::args::SystemAction;
use crate::cli::Context;
use crate::shell::SystemShell;
use crate::system::disk::{self, DiskOptions};
use crate::system::network::{self, NetworkOptions};
use crate::system::process::{self, ProcessOptions, SortKey};
use crate::system::{info, resource};
use crate::ui::output;
use anyhow::Result;
use console::Term;

/// Run a system report.
pub fn system(ctx: &Context, action: SystemAction) -> Result<()> {
    let shell = SystemShell;
    match action {
        SystemAction::Info { verbose } => {
            let env = |name: &str| std::env::var(name).ok();
            info::render(&info::collect(&shell, &env, verbose)).print();
        }
        SystemAction::Resource {
            verbose,
            watch,
            interval,
        } => {
            if !watch {
                resource::render(&resource::collect(&shell, verbose), verbose).print();
                return Ok(());
            }
            let term = Term::stdout();
            loop {
                let report = resource::render(&resource::collect(&shell, verbose), verbose);
                term.clear_screen()?;
                report.print();
                output::info(
                    format!("\nrefreshing every {}s, Ctrl+C to stop", interval),
                    ctx.verbosity(),
                );
                thread::sleep(Duration::from_secs(interval));
            }
        }
        SystemAction::Process {
            top,
            sort,
            filter,
            verbose,
        } => {
            let opts = ProcessOptions {
                top,
                sort: SortKey::from_name(&sort),
                filter,
                verbose,
            };
            process::report(&shell, &opts).print();
        }
        SystemAction::Network {
            verbose,
            connections,
            stats,
        } => {
            let opts = NetworkOptions {
                verbose,
                connections,
                stats,
            };
            network::report(&shell, opts).print();
        }
        SystemAction::Disk {
            verbose,
            io,
            inodes,
        } => {
            let opts = DiskOptions {
                verbose,
                io,
                inodes,
            };
            disk::report(&shell, opts).print();
        }
    }
    Ok(())
}
