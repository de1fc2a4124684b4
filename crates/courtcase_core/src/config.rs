//! Runtime configuration loaded from environment variables.
//!
//! | key | default |
//! |---|---|
//! | `COURTCASE_DB_PATH` | `courtcase.sqlite3` |
//! | `COURTCASE_LOG_LEVEL` | build-mode default |
//! | `COURTCASE_LOG_DIR` | unset (file logging disabled) |
//! | `COURTCASE_ALLOWED_ORIGINS` | empty (no CORS origin echoed) |
//! | `COURTCASE_PAGE_SIZE` | `10` |

use crate::api::ApiConfig;
use crate::logging::{default_log_level, normalize_level};
use crate::view::case_view::DEFAULT_PAGE_SIZE;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;

pub const ENV_DB_PATH: &str = "COURTCASE_DB_PATH";
pub const ENV_LOG_LEVEL: &str = "COURTCASE_LOG_LEVEL";
pub const ENV_LOG_DIR: &str = "COURTCASE_LOG_DIR";
pub const ENV_ALLOWED_ORIGINS: &str = "COURTCASE_ALLOWED_ORIGINS";
pub const ENV_PAGE_SIZE: &str = "COURTCASE_PAGE_SIZE";

const DEFAULT_DB_FILE_NAME: &str = "courtcase.sqlite3";
const MAX_PAGE_SIZE: usize = 100;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    InvalidValue { key: String, message: String },
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidValue { key, message } => write!(f, "invalid {key}: {message}"),
        }
    }
}

impl Error for ConfigError {}

/// Application settings shared by the CLI and entry points.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub db_path: PathBuf,
    pub log_level: &'static str,
    /// Absolute directory for rolling logs; `None` disables file logging.
    pub log_dir: Option<PathBuf>,
    /// Lowercased origins allowed for CORS. `*` allows any origin.
    pub allowed_origins: Vec<String>,
    pub page_size: usize,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            db_path: PathBuf::from(DEFAULT_DB_FILE_NAME),
            log_level: default_log_level(),
            log_dir: None,
            allowed_origins: Vec::new(),
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

impl AppConfig {
    /// Reads configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Reads configuration through an arbitrary key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let read = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };
        let mut config = Self::default();

        if let Some(path) = read(ENV_DB_PATH) {
            config.db_path = PathBuf::from(path);
        }

        if let Some(level) = read(ENV_LOG_LEVEL) {
            config.log_level =
                normalize_level(&level).map_err(|message| invalid(ENV_LOG_LEVEL, message))?;
        }

        if let Some(dir) = read(ENV_LOG_DIR) {
            let dir = PathBuf::from(dir);
            if !dir.is_absolute() {
                return Err(invalid(ENV_LOG_DIR, "log directory must be an absolute path"));
            }
            config.log_dir = Some(dir);
        }

        if let Some(raw) = read(ENV_ALLOWED_ORIGINS) {
            config.allowed_origins = parse_origins_csv(&raw);
        }

        if let Some(raw) = read(ENV_PAGE_SIZE) {
            config.page_size = parse_page_size(&raw)?;
        }

        Ok(config)
    }

    pub fn api_config(&self) -> ApiConfig {
        ApiConfig {
            allowed_origins: self.allowed_origins.clone(),
        }
    }
}

fn parse_origins_csv(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|origin| !origin.is_empty())
        .map(|origin| origin.trim_end_matches('/').to_ascii_lowercase())
        .collect()
}

fn parse_page_size(raw: &str) -> Result<usize, ConfigError> {
    let value = raw
        .parse::<usize>()
        .map_err(|err| invalid(ENV_PAGE_SIZE, format!("`{raw}` is not a number: {err}")))?;
    if value == 0 || value > MAX_PAGE_SIZE {
        return Err(invalid(
            ENV_PAGE_SIZE,
            format!("must be between 1 and {MAX_PAGE_SIZE}, got {value}"),
        ));
    }
    Ok(value)
}

fn invalid(key: &str, message: impl Into<String>) -> ConfigError {
    ConfigError::InvalidValue {
        key: key.to_string(),
        message: message.into(),
    }
}
