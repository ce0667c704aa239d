//! Runtime configuration resolved from environment variables.
//!
//! # Responsibility
//! - Collect database location, log setup, debounce delay and storage
//!   backend selection in one value.
//!
//! # Invariants
//! - Blank variables count as unset.
//! - Resolution never panics; malformed values return `ConfigError`.

use crate::logging::default_log_level;
use crate::sync::debounce::DEFAULT_DEBOUNCE_MS;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;

pub const ENV_DB_PATH: &str = "VIBEBOARD_DB_PATH";
pub const ENV_LOCAL_DIR: &str = "VIBEBOARD_LOCAL_DIR";
pub const ENV_LOG_DIR: &str = "VIBEBOARD_LOG_DIR";
pub const ENV_LOG_LEVEL: &str = "VIBEBOARD_LOG_LEVEL";
pub const ENV_NOTE_DEBOUNCE_MS: &str = "VIBEBOARD_NOTE_DEBOUNCE_MS";
pub const ENV_STORAGE: &str = "VIBEBOARD_STORAGE";

const DEFAULT_DB_FILE_NAME: &str = "vibeboard.sqlite3";
const DEFAULT_LOCAL_DIR_NAME: &str = "vibeboard-local";
const DEFAULT_LOG_DIR_NAME: &str = "vibeboard-logs";

/// Durable backend behind the workspace.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum StorageMode {
    /// Migrated SQLite database at `db_path`.
    #[default]
    Sqlite,
    /// One JSON file per table under `local_dir`.
    Local,
}

impl StorageMode {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Sqlite => "sqlite",
            Self::Local => "local",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "sqlite" => Some(Self::Sqlite),
            "local" => Some(Self::Local),
            _ => None,
        }
    }
}

/// Invalid configuration value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    InvalidNumber { key: &'static str, value: String },
    InvalidStorageMode(String),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidNumber { key, value } => {
                write!(f, "`{key}` must be a non-negative integer, got `{value}`")
            }
            Self::InvalidStorageMode(value) => write!(
                f,
                "`{ENV_STORAGE}` must be `sqlite` or `local`, got `{value}`"
            ),
        }
    }
}

impl Error for ConfigError {}

/// Fully resolved runtime configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoreConfig {
    pub db_path: PathBuf,
    pub local_dir: PathBuf,
    pub log_dir: PathBuf,
    pub log_level: String,
    pub note_debounce_ms: i64,
    pub storage_mode: StorageMode,
}

impl Default for CoreConfig {
    fn default() -> Self {
        let temp = std::env::temp_dir();
        Self {
            db_path: temp.join(DEFAULT_DB_FILE_NAME),
            local_dir: temp.join(DEFAULT_LOCAL_DIR_NAME),
            log_dir: temp.join(DEFAULT_LOG_DIR_NAME),
            log_level: default_log_level().to_string(),
            note_debounce_ms: DEFAULT_DEBOUNCE_MS,
            storage_mode: StorageMode::default(),
        }
    }
}

impl CoreConfig {
    /// Reads the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::resolve(|key| std::env::var(key).ok())
    }

    /// Resolves configuration from `lookup`, falling back to defaults.
    pub fn resolve(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let read = |key: &str| {
            lookup(key)
                .map(|raw| raw.trim().to_string())
                .filter(|value| !value.is_empty())
        };
        let mut config = Self::default();

        if let Some(path) = read(ENV_DB_PATH) {
            config.db_path = PathBuf::from(path);
        }
        if let Some(path) = read(ENV_LOCAL_DIR) {
            config.local_dir = PathBuf::from(path);
        }
        if let Some(path) = read(ENV_LOG_DIR) {
            config.log_dir = PathBuf::from(path);
        }
        if let Some(level) = read(ENV_LOG_LEVEL) {
            config.log_level = level;
        }
        if let Some(raw) = read(ENV_NOTE_DEBOUNCE_MS) {
            config.note_debounce_ms = match raw.parse::<u32>() {
                Ok(value) => i64::from(value),
                Err(_) => {
                    return Err(ConfigError::InvalidNumber {
                        key: ENV_NOTE_DEBOUNCE_MS,
                        value: raw,
                    })
                }
            };
        }
        if let Some(raw) = read(ENV_STORAGE) {
            config.storage_mode =
                StorageMode::parse(&raw).ok_or(ConfigError::InvalidStorageMode(raw))?;
        }
        Ok(config)
    }
}
