//! cli::commands
//!
//! Command dispatch and handlers.
//!
//! # Architecture
//!
//! Each command handler:
//! 1. Resolves flags against the loaded configuration
//! 2. Calls the domain module doing the work
//! 3. Formats and displays output
//!
//! # Async Commands
//!
//! Panel and MySQL commands are async because they involve network I/O.
//! Their handlers build a tokio runtime and block on the async body.

mod bt;
mod bt_crontab;
mod bt_database;
mod bt_site;
mod completion;
mod config_cmd;
mod database;
mod ping;
mod system;
mod xcode;

// Re-export command functions for testing and direct invocation
pub use bt::bt;
pub use completion::completion;
pub use config_cmd::{get as config_get, list as config_list, path as config_path, set as config_set};
pub use database::database;
pub use ping::ping;
pub use system::system;
pub use xcode::xcode;

use super::args::{Command, ConfigAction};
use super::Context;
use anyhow::Result;

/// Dispatch a command to its handler.
pub fn dispatch(command: Command, ctx: &Context) -> Result<()> {
    match command {
        Command::Ping => ping(),
        Command::Completion { shell } => completion(shell),
        Command::Config { action } => match action {
            ConfigAction::Get { key } => config_get(ctx, &key),
            ConfigAction::Set { key, value } => config_set(ctx, &key, value),
            ConfigAction::List => config_list(ctx),
            ConfigAction::Path => config_path(ctx),
        },
        Command::Bt(args) => bt(ctx, args),
        Command::Database(args) => database(ctx, args),
        Command::System { action } => system(ctx, action),
        Command::Xcode { action } => xcode(ctx, action),
    }
}
