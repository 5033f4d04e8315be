//! database command - Local MySQL administration

use crate::cli::args::{DatabaseAction, DatabaseArgs};
use crate::cli::Context;
use crate::mysql::{self, MysqlTarget};
use crate::ui::output;
use anyhow::{Context as _, Result};

/// Run a local MySQL command.
pub fn database(ctx: &Context, args: DatabaseArgs) -> Result<()> {
    let target = ctx.config.mysql_target(
        args.host.as_deref(),
        args.port,
        args.username.as_deref(),
        args.password.as_deref(),
    );
    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(database_async(ctx, &target, args.action))
}

async fn database_async(ctx: &Context, target: &MysqlTarget, action: DatabaseAction) -> Result<()> {
    match action {
        DatabaseAction::Show => {
            let names = mysql::list_databases(target)
                .await
                .context("Failed to list databases")?;
            output::info(format!("Databases on {}:", target), ctx.verbosity());
            for name in names {
                output::result(format!("  {}", name));
            }
            Ok(())
        }
        DatabaseAction::Create { name } => {
            mysql::create_database(target, &name)
                .await
                .with_context(|| format!("Failed to create database '{}'", name))?;
            output::success(format!("Database '{}' created", name), ctx.verbosity());
            Ok(())
        }
    }
}
