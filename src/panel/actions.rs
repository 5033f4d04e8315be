//! panel::actions
//!
//! Endpoint paths and parameter builders for the panel operations jarvis
//! uses. Builders return unsigned [`FormParams`]; signing happens in
//! [`PanelClient::signed_post`](super::PanelClient::signed_post).

use serde::Serialize;

use super::params::FormParams;

pub const SITE_LIST: &str = "/data?action=getData&table=sites";
pub const SITE_TYPES: &str = "/site?action=get_site_types";
pub const SITE_PHP_VERSIONS: &str = "/site?action=GetPHPVersion";
pub const SITE_ADD: &str = "/site?action=AddSite";
pub const SITE_DELETE: &str = "/site?action=DeleteSite";
pub const FILE_SAVE: &str = "/files?action=SaveFileBody";
pub const DATABASE_LIST: &str = "/data?action=getData&table=databases";
pub const DATABASE_ADD: &str = "/database?action=AddDatabase";
pub const CRONTAB_LIST: &str = "/crontab?action=GetCrontab";
pub const CRONTAB_ADD: &str = "/crontab?action=AddCrontab";
pub const CRONTAB_DELETE: &str = "/crontab?action=DelCrontab";

/// Directory holding per-site nginx configuration on the panel host.
pub const NGINX_VHOST_DIR: &str = "/www/server/panel/vhost/nginx";

/// Default web root parent for new sites.
pub const WWW_ROOT: &str = "/www/wwwroot";

/// Parameters for listing rows of a panel table.
pub fn list_params() -> FormParams {
    FormParams::new()
        .with("p", "1")
        .with("limit", "1000")
}

#[derive(Serialize)]
struct Webname<'a> {
    domain: &'a str,
    domainlist: Vec<String>,
    count: u32,
}

/// A new site.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewSite {
    pub domain: String,
    pub path: Option<String>,
    pub php_version: String,
    pub port: u16,
    pub note: Option<String>,
    pub type_id: u32,
}

impl NewSite {
    /// A site for `domain` with the panel's usual defaults.
    pub fn new(domain: impl Into<String>) -> Self {
        Self {
            domain: domain.into(),
            path: None,
            php_version: "80".to_string(),
            port: 80,
            note: None,
            type_id: 0,
        }
    }

    /// The web root, defaulting to `/www/wwwroot/<domain>`.
    pub fn root_path(&self) -> String {
        self.path
            .clone()
            .unwrap_or_else(|| format!("{}/{}", WWW_ROOT, self.domain))
    }

    /// AddSite parameters.
    pub fn to_params(&self) -> FormParams {
        let webname = Webname {
            domain: &self.domain,
            domainlist: Vec::new(),
            count: 0,
        };
        FormParams::new()
            .with("webname", serde_json::to_string(&webname).unwrap_or_default())
            .with("path", self.root_path())
            .with("type_id", self.type_id.to_string())
            .with("type", "PHP")
            .with("version", self.php_version.as_str())
            .with("port", self.port.to_string())
            .with("ps", self.note.clone().unwrap_or_else(|| self.domain.clone()))
            .with("ftp", "false")
            .with("sql", "false")
    }
}

/// DeleteSite parameters.
pub fn delete_site_params(id: i64, name: &str) -> FormParams {
    FormParams::new()
        .with("id", id.to_string())
        .with("webname", name)
}

/// Path of a site's nginx configuration file.
pub fn nginx_conf_path(site: &str) -> String {
    format!("{}/{}.conf", NGINX_VHOST_DIR, site)
}

/// SaveFileBody parameters for a site's nginx configuration.
pub fn save_conf_params(site: &str, content: &str) -> FormParams {
    FormParams::new()
        .with("path", nginx_conf_path(site))
        .with("data", content)
        .with("encoding", "utf-8")
}

/// A new shell crontab entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewCrontab {
    pub name: String,
    pub script: String,
}

impl NewCrontab {
    /// AddCrontab parameters for a shell task run every minute.
    pub fn to_params(&self) -> FormParams {
        FormParams::new()
            .with("name", self.name.as_str())
            .with("type", "minute-n")
            .with("where1", "1")
            .with("hour", "")
            .with("minute", "")
            .with("week", "")
            .with("sType", "toShell")
            .with("sBody", self.script.as_str())
            .with("sName", "")
            .with("backupTo", "")
            .with("save", "")
            .with("save_local", "1")
            .with("urladdress", "")
            .with("notice", "")
            .with("notice_channel", "")
    }
}

/// DelCrontab parameters.
pub fn delete_crontab_params(id: i64) -> FormParams {
    FormParams::new().with("id", id.to_string())
}

/// A new panel-managed MySQL database.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewDatabase {
    pub name: String,
    pub user: Option<String>,
    pub password: String,
    pub access: String,
    pub note: Option<String>,
}

impl NewDatabase {
    pub fn new(name: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            user: None,
            password: password.into(),
            access: "127.0.0.1".to_string(),
            note: None,
        }
    }

    /// AddDatabase parameters.
    pub fn to_params(&self) -> FormParams {
        FormParams::new()
            .with("name", self.name.as_str())
            .with("db_user", self.user.clone().unwrap_or_else(|| self.name.clone()))
            .with("password", self.password.as_str())
            .with("codeing", "utf8mb4")
            .with("dtype", "MySQL")
            .with("dataAccess", self.access.as_str())
            .with("address", self.access.as_str())
            .with("ps", self.note.clone().unwrap_or_else(|| self.name.clone()))
    }
}
