//! config::schema
//!
//! Configuration schema types.
//!
//! # Example
//!
//! ```toml
//! [panel]
//! host = "http://127.0.0.1:8888"
//! key = "..."
//!
//! [mysql]
//! host = "127.0.0.1"
//! port = 3306
//! username = "root"
//! password = "root"
//! ```
//!
//! # Validation
//!
//! Values are validated after parsing: empty strings are rejected, the panel
//! host must be an http(s) URL and the MySQL port must be non-zero.

use serde::{Deserialize, Serialize};

use super::ConfigError;

/// Keys accepted by `jarvis config get|set`.
pub const KEYS: &[&str] = &[
    "panel.host",
    "panel.key",
    "mysql.host",
    "mysql.port",
    "mysql.username",
    "mysql.password",
];

/// Keys whose values are masked in listings.
pub const SECRET_KEYS: &[&str] = &["panel.key", "mysql.password"];

/// Whole configuration file.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct FileConfig {
    /// Hosting panel connection
    pub panel: Option<PanelConfig>,

    /// Local MySQL connection
    pub mysql: Option<MysqlConfig>,
}

/// Hosting panel connection settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct PanelConfig {
    /// Panel base URL
    pub host: Option<String>,

    /// Shared API key
    pub key: Option<String>,
}

/// Local MySQL connection settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct MysqlConfig {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub username: Option<String>,
    pub password: Option<String>,
}

fn non_empty(key: &str, value: &Option<String>) -> Result<(), ConfigError> {
    match value {
        Some(v) if v.trim().is_empty() => Err(ConfigError::InvalidValue(format!(
            "{} cannot be empty",
            key
        ))),
        _ => Ok(()),
    }
}

impl PanelConfig {
    /// Validate the configuration values.
    pub fn validate(&self) -> Result<(), ConfigError> {
        non_empty("panel.host", &self.host)?;
        non_empty("panel.key", &self.key)?;
        if let Some(host) = &self.host {
            if !(host.starts_with("http://") || host.starts_with("https://")) {
                return Err(ConfigError::InvalidValue(format!(
                    "panel.host must start with http:// or https://, got '{}'",
                    host
                )));
            }
        }
        Ok(())
    }
}

impl MysqlConfig {
    /// Validate the configuration values.
    pub fn validate(&self) -> Result<(), ConfigError> {
        non_empty("mysql.host", &self.host)?;
        non_empty("mysql.username", &self.username)?;
        if self.port == Some(0) {
            return Err(ConfigError::InvalidValue(
                "mysql.port must be non-zero".to_string(),
            ));
        }
        Ok(())
    }
}

impl FileConfig {
    /// Validate every section present.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(panel) = &self.panel {
            panel.validate()?;
        }
        if let Some(mysql) = &self.mysql {
            mysql.validate()?;
        }
        Ok(())
    }

    /// Read a value by dotted key. `Ok(None)` means known but unset.
    pub fn get(&self, key: &str) -> Result<Option<String>, ConfigError> {
        let panel = self.panel.as_ref();
        let mysql = self.mysql.as_ref();
        let value = match key {
            "panel.host" => panel.and_then(|p| p.host.clone()),
            "panel.key" => panel.and_then(|p| p.key.clone()),
            "mysql.host" => mysql.and_then(|m| m.host.clone()),
            "mysql.port" => mysql.and_then(|m| m.port).map(|p| p.to_string()),
            "mysql.username" => mysql.and_then(|m| m.username.clone()),
            "mysql.password" => mysql.and_then(|m| m.password.clone()),
            _ => return Err(ConfigError::UnknownKey(key.to_string())),
        };
        Ok(value)
    }

    /// Set a value by dotted key, then re-validate.
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        let value = value.to_string();
        match key {
            "panel.host" => self.panel.get_or_insert_with(Default::default).host = Some(value),
            "panel.key" => self.panel.get_or_insert_with(Default::default).key = Some(value),
            "mysql.host" => self.mysql.get_or_insert_with(Default::default).host = Some(value),
            "mysql.port" => {
                let port = value.parse::<u16>().map_err(|_| {
                    ConfigError::InvalidValue(format!("mysql.port must be a port number, got '{}'", value))
                })?;
                self.mysql.get_or_insert_with(Default::default).port = Some(port);
            }
            "mysql.username" => {
                self.mysql.get_or_insert_with(Default::default).username = Some(value)
            }
            "mysql.password" => {
                self.mysql.get_or_insert_with(Default::default).password = Some(value)
            }
            _ => return Err(ConfigError::UnknownKey(key.to_string())),
        }
        self.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    mod parse {
        use super::*;

        #[test]
        fn full_file() {
            let config: FileConfig = toml::from_str(
                r#"
                [panel]
                host = "https://panel.example.com:8888"
                key = "abc"

                [mysql]
                port = 3307
                "#,
            )
            .unwrap();
            let panel = config.panel.as_ref().unwrap();
            assert_eq!(panel.key.as_deref(), Some("abc"));
            assert_eq!(config.mysql.as_ref().unwrap().port, Some(3307));
            assert!(config.validate().is_ok());
        }

        #[test]
        fn unknown_field_rejected() {
            let result: Result<FileConfig, _> = toml::from_str("[panel]\ntoken = \"x\"");
            assert!(result.is_err());
        }

        #[test]
        fn empty_file() {
            let config: FileConfig = toml::from_str("").unwrap();
            assert_eq!(config, FileConfig::default());
        }
    }

    mod validate {
        use super::*;

        #[test]
        fn host_needs_scheme() {
            let panel = PanelConfig {
                host: Some("127.0.0.1:8888".into()),
                key: None,
            };
            assert!(panel.validate().is_err());
        }

        #[test]
        fn empty_key_rejected() {
            let panel = PanelConfig {
                host: None,
                key: Some("  ".into()),
            };
            assert!(panel.validate().is_err());
        }

        #[test]
        fn zero_port_rejected() {
            let mysql = MysqlConfig {
                port: Some(0),
                ..Default::default()
            };
            assert!(mysql.validate().is_err());
        }
    }

    mod get_set {
        use super::*;

        #[test]
        fn set_then_get() {
            let mut config = FileConfig::default();
            config.set("panel.host", "http://10.0.0.2:8888").unwrap();
            config.set("mysql.port", "3307").unwrap();
            assert_eq!(
                config.get("panel.host").unwrap().as_deref(),
                Some("http://10.0.0.2:8888")
            );
            assert_eq!(config.get("mysql.port").unwrap().as_deref(), Some("3307"));
            assert_eq!(config.get("panel.key").unwrap(), None);
        }

        #[test]
        fn unknown_key() {
            let mut config = FileConfig::default();
            assert!(matches!(
                config.set("panel.token", "x"),
                Err(ConfigError::UnknownKey(_))
            ));
            assert!(matches!(
                config.get("nope"),
                Err(ConfigError::UnknownKey(_))
            ));
        }

        #[test]
        fn bad_port() {
            let mut config = FileConfig::default();
            assert!(config.set("mysql.port", "abc").is_err());
            assert!(config.set("mysql.port", "0").is_err());
        }

        #[test]
        fn every_listed_key_is_gettable() {
            let config = FileConfig::default();
            for key in KEYS {
                assert!(config.get(key).is_ok(), "{}", key);
            }
        }
    }
}
