//! bt crontab command - Scheduled tasks

use crate::cli::args::CrontabAction;
use crate::cli::Context;
use crate::panel::actions::{self, NewCrontab};
use crate::panel::{find_id, FormParams, PanelError, PanelItem};
use crate::system::format::pad_right;
use crate::ui::output;
use anyhow::Result;

use super::bt::{report, Panel};

/// One listing row: id, type padded to 16, name.
pub(crate) fn crontab_line(item: &PanelItem) -> String {
    format!("{} {} {}", item.id, pad_right(&item.kind, 16), item.name)
}

pub(crate) async fn crontab(ctx: &Context, panel: &Panel, action: CrontabAction) -> Result<()> {
    match action {
        CrontabAction::Get => {
            for item in panel.list(actions::CRONTAB_LIST, FormParams::new()).await? {
                output::result(crontab_line(&item));
            }
            Ok(())
        }
        CrontabAction::Create { name, shell } => {
            let task = NewCrontab { name, script: shell };
            let body = panel.post(actions::CRONTAB_ADD, task.to_params()).await?;
            report(ctx, &body)
        }
        CrontabAction::Delete { name } => {
            let items = panel.list(actions::CRONTAB_LIST, FormParams::new()).await?;
            let id = find_id(&items, &name).ok_or_else(|| PanelError::NotFound {
                kind: "crontab",
                name: name.clone(),
            })?;
            output::info(format!("crontab id: {}", id), ctx.verbosity());
            let body = panel
                .post(actions::CRONTAB_DELETE, actions::delete_crontab_params(id))
                .await?;
            report(ctx, &body)
        }
    }
}
