//! bt database command - Panel-managed databases

use crate::cli::args::BtDatabaseAction;
use crate::cli::Context;
use crate::panel::actions::{self, NewDatabase};
use crate::ui::output;
use anyhow::Result;

use super::bt::{report, Panel};

pub(crate) async fn database(ctx: &Context, panel: &Panel, action: BtDatabaseAction) -> Result<()> {
    match action {
        BtDatabaseAction::Show => {
            let body = panel
                .post(actions::DATABASE_LIST, actions::list_params())
                .await?;
            output::result(body);
            Ok(())
        }
        BtDatabaseAction::Create {
            name,
            password,
            user,
            access,
            ps,
        } => {
            let db = NewDatabase {
                user,
                access,
                note: ps,
                ..NewDatabase::new(name, password)
            };
            let body = panel.post(actions::DATABASE_ADD, db.to_params()).await?;
            report(ctx, &body)
        }
    }
}
