//! Application configuration file model.
//!
//! # Responsibility
//! - Deserialize the JSON config file (`server`, `db`, optional `log`).
//! - Map `db.driver` onto a supported storage backend.
//!
//! # Invariants
//! - Only SQLite drivers are accepted; other names fail at startup.
//! - The database password never appears in `Debug` output.

use crate::db::{DbError, DbResult};
use crate::logging::default_log_level;
use serde::Deserialize;
use std::error::Error;
use std::fmt::{Debug, Display, Formatter};
use std::path::{Path, PathBuf};
use std::time::Duration;

const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 5_000;

#[derive(Debug)]
pub enum ConfigError {
    Io { path: PathBuf, source: std::io::Error },
    Parse { path: PathBuf, source: serde_json::Error },
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io { path, source } => {
                write!(f, "failed to read config `{}`: {source}", path.display())
            }
            Self::Parse { path, source } => {
                write!(f, "failed to parse config `{}`: {source}", path.display())
            }
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::Parse { source, .. } => Some(source),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub db: DbConfig,
    #[serde(default)]
    pub log: LogConfig,
}

impl AppConfig {
    /// Reads and parses a JSON config file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = std::fs::read(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_slice(&raw).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: String,
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
}

impl ServerConfig {
    /// `host:port` as accepted by a TCP listener.
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}

/// Supported storage backends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DbDriver {
    Sqlite,
}

#[derive(Clone, Default, Deserialize)]
#[serde(default)]
pub struct DbConfig {
    pub driver: String,
    pub host: String,
    pub port: String,
    pub user: String,
    pub password: String,
    /// Database name; for SQLite, the database file path.
    pub name: String,
}

impl DbConfig {
    pub fn driver(&self) -> DbResult<DbDriver> {
        match self.driver.trim().to_ascii_lowercase().as_str() {
            "sqlite3" | "sqlite" => Ok(DbDriver::Sqlite),
            _ => Err(DbError::UnsupportedDriver(self.driver.clone())),
        }
    }

    /// Database file path for the SQLite driver.
    pub fn sqlite_path(&self) -> DbResult<PathBuf> {
        match self.driver()? {
            DbDriver::Sqlite => Ok(PathBuf::from(&self.name)),
        }
    }
}

impl Debug for DbConfig {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DbConfig")
            .field("driver", &self.driver)
            .field("host", &self.host)
            .field("port", &self.port)
            .field("user", &self.user)
            .field("password", &"<redacted>")
            .field("name", &self.name)
            .finish()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LogConfig {
    #[serde(default = "default_level")]
    pub level: String,
    /// Absolute directory for rolling log files; stderr when unset.
    #[serde(default)]
    pub dir: Option<String>,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_level(),
            dir: None,
        }
    }
}

fn default_request_timeout_ms() -> u64 {
    DEFAULT_REQUEST_TIMEOUT_MS
}

fn default_level() -> String {
    default_log_level().to_string()
}
