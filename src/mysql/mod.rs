//! mysql
//!
//! Local MySQL administration: list databases and create one.
//!
//! Statements are sent over the text protocol. Database names are validated
//! against a conservative identifier set and backtick-quoted before being
//! spliced into `CREATE DATABASE`, since identifiers cannot be bound.

use std::fmt;

use sqlx::mysql::{MySqlConnectOptions, MySqlConnection, MySqlRow};
use sqlx::{Connection, Row};
use thiserror::Error;
use tracing::debug;

/// Errors from MySQL operations.
#[derive(Debug, Error)]
pub enum MysqlError {
    #[error("invalid database name '{0}': use 1-64 letters, digits, '_' or '$'")]
    InvalidName(String),

    #[error("failed to connect to {target}: {source}")]
    Connect {
        target: String,
        #[source]
        source: sqlx::Error,
    },

    #[error("query failed: {0}")]
    Query(#[from] sqlx::Error),
}

/// Connection target.
#[derive(Clone, PartialEq, Eq)]
pub struct MysqlTarget {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
}

impl Default for MysqlTarget {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3306,
            username: "root".to_string(),
            password: "root".to_string(),
        }
    }
}

// Password omitted.
impl fmt::Debug for MysqlTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MysqlTarget")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("username", &self.username)
            .finish()
    }
}

impl fmt::Display for MysqlTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}:{}", self.username, self.host, self.port)
    }
}

impl MysqlTarget {
    fn options(&self) -> MySqlConnectOptions {
        MySqlConnectOptions::new()
            .host(&self.host)
            .port(self.port)
            .username(&self.username)
            .password(&self.password)
            .charset("utf8mb4")
    }

    async fn connect(&self) -> Result<MySqlConnection, MysqlError> {
        debug!(server = %self, "connecting to mysql");
        MySqlConnection::connect_with(&self.options())
            .await
            .map_err(|source| MysqlError::Connect {
                target: self.to_string(),
                source,
            })
    }
}

/// Check a database name and return it backtick-quoted.
pub fn quote_database_name(name: &str) -> Result<String, MysqlError> {
    let valid = !name.is_empty()
        && name.chars().count() <= 64
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$');
    if !valid {
        return Err(MysqlError::InvalidName(name.to_string()));
    }
    Ok(format!("`{}`", name))
}

/// Statement creating `name` if it does not exist.
pub fn create_database_sql(name: &str) -> Result<String, MysqlError> {
    Ok(format!(
        "CREATE DATABASE IF NOT EXISTS {} CHARACTER SET utf8mb4",
        quote_database_name(name)?
    ))
}

fn first_column_text(row: &MySqlRow) -> Result<String, sqlx::Error> {
    match row.try_get::<String, _>(0) {
        Ok(s) => Ok(s),
        Err(_) => {
            let bytes: Vec<u8> = row.try_get(0)?;
            Ok(String::from_utf8_lossy(&bytes).into_owned())
        }
    }
}

/// Names of all databases visible to the user.
pub async fn list_databases(target: &MysqlTarget) -> Result<Vec<String>, MysqlError> {
    let mut conn = target.connect().await?;
    let rows = sqlx::Executor::fetch_all(&mut conn, "SHOW DATABASES").await?;
    let names = rows
        .iter()
        .map(first_column_text)
        .collect::<Result<Vec<_>, _>>()?;
    conn.close().await?;
    Ok(names)
}

/// Create a database if it does not already exist.
pub async fn create_database(target: &MysqlTarget, name: &str) -> Result<(), MysqlError> {
    let sql = create_database_sql(name)?;
    let mut conn = target.connect().await?;
    debug!(database = name, "creating database");
    sqlx::Executor::execute(&mut conn, sql.as_str()).await?;
    conn.close().await?;
    Ok(())
}
