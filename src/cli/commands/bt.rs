//! bt command - Hosting panel API
//!
//! Resolves the panel host and key, then hands off to the site, crontab
//! and database handlers. Every request goes through [`Panel`], which
//! signs it with the key.

use crate::cli::args::{BtAction, BtArgs};
use crate::cli::Context;
use crate::panel::{decode_items, Envelope, FormParams, PanelClient, PanelError, PanelItem};
use crate::ui::output;
use anyhow::{bail, Result};
use tracing::debug;

use super::{bt_crontab, bt_database, bt_site};

/// A connected panel: client plus key.
pub(crate) struct Panel {
    pub client: PanelClient,
    key: String,
}

impl Panel {
    /// Resolve host and key from flags over config.
    pub fn resolve(ctx: &Context, host: Option<&str>, key: Option<&str>) -> Result<Self> {
        let host = ctx.config.panel_host(host);
        if host.trim().is_empty() {
            bail!("Panel host is empty. Use --host or `jarvis config set panel.host`.");
        }
        let Some(key) = ctx.config.panel_key(key).filter(|k| !k.is_empty()) else {
            bail!("Panel key not set. Use --key or `jarvis config set panel.key`.");
        };
        let client = PanelClient::new(host)?;
        output::info(format!("host: {}", client.host()), ctx.verbosity());
        Ok(Self { client, key })
    }

    /// Signed POST returning the body.
    pub async fn post(&self, path: &str, params: FormParams) -> Result<String, PanelError> {
        self.client.signed_post(path, &self.key, params).await
    }

    /// Fetch a listing, failing on an error envelope.
    pub async fn list(&self, path: &str, params: FormParams) -> Result<Vec<PanelItem>, PanelError> {
        let body = self.post(path, params).await?;
        let envelope = Envelope::decode(&body);
        if envelope.is_error() {
            return Err(PanelError::Api(envelope.message()));
        }
        let items = decode_items(&body);
        debug!(path, count = items.len(), "panel listing");
        Ok(items)
    }
}

/// Print the outcome of a mutating call.
///
/// An error envelope aborts with its message. A success envelope prints
/// its message; any other body is printed as is.
pub(crate) fn report(ctx: &Context, body: &str) -> Result<()> {
    let envelope = Envelope::decode(body);
    if envelope.is_error() {
        return Err(PanelError::Api(envelope.message()).into());
    }
    let message = envelope.message();
    if message.is_empty() {
        output::result(body);
    } else {
        output::success(message, ctx.verbosity());
    }
    Ok(())
}

/// Run a panel command.
pub fn bt(ctx: &Context, args: BtArgs) -> Result<()> {
    let panel = Panel::resolve(ctx, args.host.as_deref(), args.key.as_deref())?;
    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(bt_async(ctx, &panel, args.action))
}

async fn bt_async(ctx: &Context, panel: &Panel, action: BtAction) -> Result<()> {
    match action {
        BtAction::Http { query, data } => http(panel, &query, data.as_deref()).await,
        BtAction::Site { action } => bt_site::site(ctx, panel, action).await,
        BtAction::Crontab { action } => bt_crontab::crontab(ctx, panel, action).await,
        BtAction::Database { action } => bt_database::database(ctx, panel, action).await,
    }
}

async fn http(panel: &Panel, query: &str, data: Option<&str>) -> Result<()> {
    let params = data.map(FormParams::parse).unwrap_or_default();
    let body = panel.post(query, params).await?;
    output::result(body);
    Ok(())
}
