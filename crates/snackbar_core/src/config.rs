//! Application configuration loaded from a JSON file.
//!
//! # Responsibility
//! - Provide the database connection string and display branding.
//! - Resolve the connection string into a concrete database location.
//!
//! # Invariants
//! - Every field has a default; an empty JSON object is a valid config.
//! - Relative database paths resolve against the config file's directory.

use crate::db::{open_db, open_db_in_memory, DbResult};
use crate::logging::default_log_level;
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};

const MEMORY_DATA_SOURCE: &str = ":memory:";
const DATA_SOURCE_KEYS: &[&str] = &["data source", "datasource", "filename"];

#[derive(Debug)]
pub enum ConfigError {
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    Parse(serde_json::Error),
    InvalidValue {
        field: &'static str,
        message: String,
    },
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io { path, source } => {
                write!(f, "failed to read config `{}`: {source}", path.display())
            }
            Self::Parse(err) => write!(f, "invalid config JSON: {err}"),
            Self::InvalidValue { field, message } => write!(f, "invalid `{field}`: {message}"),
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::Parse(err) => Some(err),
            Self::InvalidValue { .. } => None,
        }
    }
}

impl From<serde_json::Error> for ConfigError {
    fn from(value: serde_json::Error) -> Self {
        Self::Parse(value)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// Bare path, `Data Source=<path>` or `:memory:`.
    pub connection_string: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            connection_string: "Data Source=data/snackbar.db".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BrandingConfig {
    pub name: String,
    pub logo: String,
    pub theme: String,
}

impl Default for BrandingConfig {
    fn default() -> Self {
        Self {
            name: "SmartLanche".to_string(),
            logo: "assets/logo.png".to_string(),
            theme: "light".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Falls back to `default_log_level()` when unset.
    pub level: Option<String>,
    /// Absolute log directory. Logging stays off when unset.
    pub dir: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub database: DatabaseConfig,
    pub branding: BrandingConfig,
    pub logging: LoggingConfig,
    /// Directory relative database paths resolve against.
    #[serde(skip)]
    pub base_dir: Option<PathBuf>,
}

/// Where the sales database lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DatabaseLocation {
    Memory,
    File(PathBuf),
}

impl DatabaseLocation {
    /// Opens the database and applies migrations.
    pub fn open(&self) -> DbResult<Connection> {
        match self {
            Self::Memory => open_db_in_memory(),
            Self::File(path) => open_db(path),
        }
    }
}

impl Display for DatabaseLocation {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Memory => f.write_str(MEMORY_DATA_SOURCE),
            Self::File(path) => write!(f, "{}", path.display()),
        }
    }
}

impl AppConfig {
    /// Reads and parses a JSON config file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&text, path.parent())
    }

    pub fn from_json_str(json: &str, base_dir: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config: Self = serde_json::from_str(json)?;
        config.base_dir = base_dir
            .filter(|dir| !dir.as_os_str().is_empty())
            .map(Path::to_path_buf);
        Ok(config)
    }

    pub fn database_location(&self) -> Result<DatabaseLocation, ConfigError> {
        let source = parse_data_source(&self.database.connection_string)?;
        if source == MEMORY_DATA_SOURCE {
            return Ok(DatabaseLocation::Memory);
        }

        let path = PathBuf::from(source);
        let resolved = match &self.base_dir {
            Some(base_dir) if path.is_relative() => base_dir.join(path),
            _ => path,
        };
        Ok(DatabaseLocation::File(resolved))
    }

    pub fn log_level(&self) -> &str {
        self.logging
            .level
            .as_deref()
            .map(str::trim)
            .filter(|level| !level.is_empty())
            .unwrap_or(default_log_level())
    }
}

fn parse_data_source(connection_string: &str) -> Result<&str, ConfigError> {
    let trimmed = connection_string.trim();
    if trimmed.is_empty() {
        return Err(invalid_connection_string("connection string is empty"));
    }
    if !trimmed.contains('=') {
        return Ok(trimmed);
    }

    trimmed
        .split(';')
        .filter_map(|pair| pair.split_once('='))
        .find(|(key, _)| {
            let key = key.trim().to_ascii_lowercase();
            DATA_SOURCE_KEYS.contains(&key.as_str())
        })
        .map(|(_, value)| value.trim())
        .filter(|value| !value.is_empty())
        .ok_or_else(|| invalid_connection_string("missing `Data Source` entry"))
}

fn invalid_connection_string(message: &str) -> ConfigError {
    ConfigError::InvalidValue {
        field: "database.connection_string",
        message: message.to_string(),
    }
}
