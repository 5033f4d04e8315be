//! config
//!
//! Configuration loading, precedence and atomic writes.
//!
//! # Locations
//!
//! Searched in order, first existing file wins:
//! 1. `--config <path>` if given
//! 2. `$JARVIS_CONFIG` if set
//! 3. `$XDG_CONFIG_HOME/jarvis/config.toml`
//! 4. `~/.jarvis/config.toml` (canonical write location)
//!
//! A missing file is not an error; defaults are used.
//!
//! # Precedence
//!
//! CLI flag > config file > built-in default. Flag handling lives in the
//! command layer, which passes flag values into the resolvers here.
//!
//! # Security
//!
//! The file may hold the panel key and a MySQL password. On Unix it is
//! written with mode 0600, and values are never logged.

pub mod schema;

pub use schema::{FileConfig, MysqlConfig, PanelConfig};

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

#[cfg(unix)]
use std::os::unix::fs::PermissionsExt;

use thiserror::Error;
use tracing::debug;

use crate::mysql::MysqlTarget;
use crate::panel::DEFAULT_HOST;

/// Errors from configuration operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file '{path}': {source}")]
    ReadError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config file '{path}': {message}")]
    ParseError { path: PathBuf, message: String },

    #[error("failed to write config file '{path}': {source}")]
    WriteError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid config value: {0}")]
    InvalidValue(String),

    #[error("unknown config key '{0}'")]
    UnknownKey(String),

    #[error("home directory not found")]
    NoHomeDir,
}

/// Environment inputs to path resolution.
#[derive(Debug, Clone, Default)]
pub struct SearchPaths {
    pub explicit: Option<PathBuf>,
    pub env_config: Option<PathBuf>,
    pub xdg_config_home: Option<PathBuf>,
    pub home: Option<PathBuf>,
}

impl SearchPaths {
    /// Gather search inputs from the process environment.
    pub fn from_env(explicit: Option<&Path>) -> Self {
        Self {
            explicit: explicit.map(Path::to_path_buf),
            env_config: std::env::var_os("JARVIS_CONFIG").map(PathBuf::from),
            xdg_config_home: std::env::var_os("XDG_CONFIG_HOME").map(PathBuf::from),
            home: dirs::home_dir(),
        }
    }

    fn candidates(&self) -> Vec<PathBuf> {
        let mut out = Vec::new();
        out.extend(self.explicit.clone());
        out.extend(self.env_config.clone());
        if let Some(xdg) = &self.xdg_config_home {
            out.push(xdg.join("jarvis/config.toml"));
        }
        if let Some(home) = &self.home {
            out.push(home.join(".jarvis/config.toml"));
        }
        out
    }

    /// First candidate that exists on disk.
    pub fn find_existing(&self) -> Option<PathBuf> {
        self.candidates().into_iter().find(|p| p.exists())
    }

    /// Where a write should go when no file exists yet.
    ///
    /// An explicit path or `$JARVIS_CONFIG` is honoured, otherwise the
    /// canonical `~/.jarvis/config.toml`.
    pub fn write_target(&self) -> Result<PathBuf, ConfigError> {
        if let Some(p) = self.explicit.clone().or_else(|| self.env_config.clone()) {
            return Ok(p);
        }
        self.home
            .as_ref()
            .map(|h| h.join(".jarvis/config.toml"))
            .ok_or(ConfigError::NoHomeDir)
    }
}

/// Loaded configuration plus where it came from.
#[derive(Debug, Clone, Default)]
pub struct Config {
    pub file: FileConfig,
    loaded_from: Option<PathBuf>,
    search: SearchPaths,
}

impl Config {
    /// Load configuration from the standard locations.
    ///
    /// # Errors
    ///
    /// Returns an error if a config file exists but cannot be read, parsed
    /// or validated.
    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        Self::load_from(SearchPaths::from_env(explicit))
    }

    /// Load using explicit search inputs.
    pub fn load_from(search: SearchPaths) -> Result<Self, ConfigError> {
        let found = search.find_existing();
        let file = match &found {
            Some(path) => {
                debug!(path = %path.display(), "loading config");
                Self::read(path)?
            }
            None => {
                debug!("no config file found, using defaults");
                FileConfig::default()
            }
        };
        file.validate()?;
        Ok(Self {
            file,
            loaded_from: found,
            search,
        })
    }

    fn read(path: &Path) -> Result<FileConfig, ConfigError> {
        let contents = fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            source: e,
        })?;
        toml::from_str(&contents).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }

    /// Path the configuration was loaded from, if any.
    pub fn loaded_from(&self) -> Option<&Path> {
        self.loaded_from.as_deref()
    }

    /// Path that [`save`](Self::save) writes to.
    pub fn path(&self) -> Result<PathBuf, ConfigError> {
        match &self.loaded_from {
            Some(p) => Ok(p.clone()),
            None => self.search.write_target(),
        }
    }

    /// Write the configuration back atomically.
    pub fn save(&mut self) -> Result<PathBuf, ConfigError> {
        let path = self.path()?;
        write_atomic(&path, &self.file)?;
        self.loaded_from = Some(path.clone());
        Ok(path)
    }

    // =========================================================================
    // Resolution with precedence: flag > file > default
    // =========================================================================

    /// Panel host.
    pub fn panel_host(&self, flag: Option<&str>) -> String {
        flag.map(str::to_string)
            .or_else(|| self.file.panel.as_ref().and_then(|p| p.host.clone()))
            .unwrap_or_else(|| DEFAULT_HOST.to_string())
    }

    /// Panel key. No default exists.
    pub fn panel_key(&self, flag: Option<&str>) -> Option<String> {
        flag.map(str::to_string)
            .or_else(|| self.file.panel.as_ref().and_then(|p| p.key.clone()))
    }

    /// MySQL target from flags layered over the file and defaults.
    pub fn mysql_target(
        &self,
        host: Option<&str>,
        port: Option<u16>,
        username: Option<&str>,
        password: Option<&str>,
    ) -> MysqlTarget {
        let file = self.file.mysql.clone().unwrap_or_default();
        let defaults = MysqlTarget::default();
        MysqlTarget {
            host: host.map(str::to_string).or(file.host).unwrap_or(defaults.host),
            port: port.or(file.port).unwrap_or(defaults.port),
            username: username
                .map(str::to_string)
                .or(file.username)
                .unwrap_or(defaults.username),
            password: password
                .map(str::to_string)
                .or(file.password)
                .unwrap_or(defaults.password),
        }
    }
}

fn write_err(path: &Path) -> impl FnOnce(std::io::Error) -> ConfigError {
    let path = path.to_path_buf();
    move |source| ConfigError::WriteError { path, source }
}

/// Write a config file atomically with owner-only permissions.
fn write_atomic(path: &Path, config: &FileConfig) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).map_err(write_err(path))?;
        }
    }

    let contents =
        toml::to_string_pretty(config).map_err(|e| ConfigError::InvalidValue(e.to_string()))?;

    let temp_path = path.with_extension("toml.tmp");
    let mut file = fs::File::create(&temp_path).map_err(write_err(&temp_path))?;

    #[cfg(unix)]
    {
        let perms = fs::Permissions::from_mode(0o600);
        file.set_permissions(perms).map_err(write_err(&temp_path))?;
    }

    file.write_all(contents.as_bytes())
        .map_err(write_err(&temp_path))?;
    file.sync_all().map_err(write_err(&temp_path))?;

    fs::rename(&temp_path, path).map_err(write_err(path))?;
    debug!(path = %path.display(), "config written");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn isolated(temp: &TempDir) -> SearchPaths {
        SearchPaths {
            explicit: None,
            env_config: None,
            xdg_config_home: Some(temp.path().join("xdg")),
            home: Some(temp.path().join("home")),
        }
    }

    mod lookup {
        use super::*;

        #[test]
        fn missing_file_uses_defaults() {
            let temp = TempDir::new().unwrap();
            let config = Config::load_from(isolated(&temp)).unwrap();
            assert!(config.loaded_from().is_none());
            assert_eq!(config.panel_host(None), DEFAULT_HOST);
            assert_eq!(config.panel_key(None), None);
        }

        #[test]
        fn xdg_before_home() {
            let temp = TempDir::new().unwrap();
            let search = isolated(&temp);
            let xdg = temp.path().join("xdg/jarvis/config.toml");
            let home = temp.path().join("home/.jarvis/config.toml");
            fs::create_dir_all(xdg.parent().unwrap()).unwrap();
            fs::create_dir_all(home.parent().unwrap()).unwrap();
            fs::write(&xdg, "[panel]\nkey = \"from-xdg\"\n").unwrap();
            fs::write(&home, "[panel]\nkey = \"from-home\"\n").unwrap();

            let config = Config::load_from(search).unwrap();
            assert_eq!(config.panel_key(None).as_deref(), Some("from-xdg"));
            assert_eq!(config.loaded_from(), Some(xdg.as_path()));
        }

        #[test]
        fn explicit_wins() {
            let temp = TempDir::new().unwrap();
            let explicit = temp.path().join("custom.toml");
            fs::write(&explicit, "[panel]\nhost = \"http://10.1.1.1:8888\"\n").unwrap();
            let search = SearchPaths {
                explicit: Some(explicit),
                ..isolated(&temp)
            };
            let config = Config::load_from(search).unwrap();
            assert_eq!(config.panel_host(None), "http://10.1.1.1:8888");
        }

        #[test]
        fn invalid_file_is_error() {
            let temp = TempDir::new().unwrap();
            let explicit = temp.path().join("bad.toml");
            fs::write(&explicit, "[panel]\nhost = \"ftp://x\"\n").unwrap();
            let search = SearchPaths {
                explicit: Some(explicit),
                ..isolated(&temp)
            };
            assert!(matches!(
                Config::load_from(search),
                Err(ConfigError::InvalidValue(_))
            ));
        }

        #[test]
        fn unparsable_file_is_error() {
            let temp = TempDir::new().unwrap();
            let explicit = temp.path().join("bad.toml");
            fs::write(&explicit, "[panel\n").unwrap();
            let search = SearchPaths {
                explicit: Some(explicit),
                ..isolated(&temp)
            };
            assert!(matches!(
                Config::load_from(search),
                Err(ConfigError::ParseError { .. })
            ));
        }
    }

    mod precedence {
        use super::*;

        fn with_file() -> Config {
            Config {
                file: FileConfig {
                    panel: Some(PanelConfig {
                        host: Some("http://file:8888".into()),
                        key: Some("file-key".into()),
                    }),
                    mysql: Some(MysqlConfig {
                        port: Some(3307),
                        ..Default::default()
                    }),
                },
                ..Default::default()
            }
        }

        #[test]
        fn flag_over_file() {
            let config = with_file();
            assert_eq!(config.panel_host(Some("http://flag:1")), "http://flag:1");
            assert_eq!(config.panel_key(Some("flag-key")).as_deref(), Some("flag-key"));
        }

        #[test]
        fn file_over_default() {
            let config = with_file();
            assert_eq!(config.panel_host(None), "http://file:8888");
            let target = config.mysql_target(None, None, Some("admin"), None);
            assert_eq!(target.port, 3307);
            assert_eq!(target.host, "127.0.0.1");
            assert_eq!(target.username, "admin");
            assert_eq!(target.password, "root");
        }
    }

    mod write {
        use super::*;

        #[test]
        fn save_creates_canonical_file() {
            let temp = TempDir::new().unwrap();
            let mut config = Config::load_from(isolated(&temp)).unwrap();
            config.file.set("panel.key", "k1").unwrap();
            let path = config.save().unwrap();

            assert_eq!(path, temp.path().join("home/.jarvis/config.toml"));
            assert!(!path.with_extension("toml.tmp").exists());

            let reloaded = Config::load_from(isolated(&temp)).unwrap();
            assert_eq!(reloaded.panel_key(None).as_deref(), Some("k1"));
        }

        #[cfg(unix)]
        #[test]
        fn owner_only_permissions() {
            let temp = TempDir::new().unwrap();
            let mut config = Config::load_from(isolated(&temp)).unwrap();
            config.file.set("mysql.password", "pw").unwrap();
            let path = config.save().unwrap();
            let mode = fs::metadata(&path).unwrap().permissions().mode();
            assert_eq!(mode & 0o777, 0o600);
        }

        #[test]
        fn save_rewrites_loaded_file() {
            let temp = TempDir::new().unwrap();
            let explicit = temp.path().join("mine.toml");
            fs::write(&explicit, "").unwrap();
            let search = SearchPaths {
                explicit: Some(explicit.clone()),
                ..isolated(&temp)
            };
            let mut config = Config::load_from(search).unwrap();
            config.file.set("mysql.host", "db.local").unwrap();
            assert_eq!(config.save().unwrap(), explicit);
            assert!(fs::read_to_string(&explicit).unwrap().contains("db.local"));
        }
    }
}
