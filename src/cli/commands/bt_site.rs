//! bt site command - Sites and their nginx configuration

use std::fs;

use crate::cli::args::SiteAction;
use crate::cli::Context;
use crate::panel::actions::{self, NewSite};
use crate::panel::{find_id, FormParams, PanelError};
use crate::ui::output;
use anyhow::{bail, Context as _, Result};

use super::bt::{report, Panel};

pub(crate) async fn site(ctx: &Context, panel: &Panel, action: SiteAction) -> Result<()> {
    match action {
        SiteAction::Show => show(panel, actions::SITE_LIST, actions::list_params()).await,
        SiteAction::Types => show(panel, actions::SITE_TYPES, FormParams::new()).await,
        SiteAction::Php => show(panel, actions::SITE_PHP_VERSIONS, FormParams::new()).await,
        SiteAction::Create {
            domain,
            path,
            php,
            port,
            ps,
            type_id,
        } => {
            let site = NewSite {
                path,
                php_version: php,
                port,
                note: ps,
                type_id,
                ..NewSite::new(domain)
            };
            let body = panel.post(actions::SITE_ADD, site.to_params()).await?;
            report(ctx, &body)
        }
        SiteAction::Delete { name } => {
            let sites = panel.list(actions::SITE_LIST, actions::list_params()).await?;
            let id = find_id(&sites, &name).ok_or_else(|| PanelError::NotFound {
                kind: "site",
                name: name.clone(),
            })?;
            output::info(format!("site id: {}", id), ctx.verbosity());
            let body = panel
                .post(actions::SITE_DELETE, actions::delete_site_params(id, &name))
                .await?;
            report(ctx, &body)
        }
        SiteAction::Conf {
            name,
            file,
            content,
        } => {
            let content = match (file, content) {
                (Some(file), _) => fs::read_to_string(&file)
                    .with_context(|| format!("Failed to read {}", file.display()))?,
                (None, Some(content)) => content,
                (None, None) => bail!("Nothing to write. Use --file or --content."),
            };
            output::info(
                format!("writing {}", actions::nginx_conf_path(&name)),
                ctx.verbosity(),
            );
            let body = panel
                .post(actions::FILE_SAVE, actions::save_conf_params(&name, &content))
                .await?;
            report(ctx, &body)
        }
    }
}

async fn show(panel: &Panel, path: &str, params: FormParams) -> Result<()> {
    let body = panel.post(path, params).await?;
    output::result(body);
    Ok(())
}
