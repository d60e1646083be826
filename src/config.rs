//! Environment-level configuration
//!
//! The core only needs to know where the backend lives, which language to
//! show before the user picks one, and where durable local state is kept.

use crate::error::{AppError, Result};
use std::path::PathBuf;

pub const DEFAULT_API_BASE_URL: &str = "http://localhost:8080";
pub const DEFAULT_LANGUAGE: &str = "EN";
pub const DB_FILENAME: &str = "stock-advisor.db";

const ENV_API_BASE_URL: &str = "STOCK_ADVISOR_API_BASE_URL";
const ENV_DEFAULT_LANGUAGE: &str = "STOCK_ADVISOR_DEFAULT_LANGUAGE";
const ENV_DATA_DIR: &str = "STOCK_ADVISOR_DATA_DIR";

#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    /// Base URL of the stocks REST backend
    pub api_base_url: String,
    /// Display language used when nothing has been stored yet
    pub default_language: String,
    /// Directory holding the durable local store
    pub data_dir: PathBuf,
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            default_language: DEFAULT_LANGUAGE.to_string(),
            data_dir: default_data_dir(),
        }
    }
}

impl AppConfig {
    /// Build configuration from process environment variables
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary variable lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = AppConfig::default();
        let non_blank = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let api_base_url = non_blank(ENV_API_BASE_URL).unwrap_or(defaults.api_base_url);
        url::Url::parse(&api_base_url).map_err(|e| {
            AppError::Config(format!("{} is not a valid URL: {}", ENV_API_BASE_URL, e))
        })?;

        let default_language = non_blank(ENV_DEFAULT_LANGUAGE)
            .map(|lang| lang.to_uppercase())
            .unwrap_or(defaults.default_language);

        let data_dir = non_blank(ENV_DATA_DIR)
            .map(PathBuf::from)
            .unwrap_or(defaults.data_dir);

        Ok(AppConfig {
            api_base_url,
            default_language,
            data_dir,
        })
    }

    /// Path of the SQLite file backing local storage
    pub fn db_path(&self) -> PathBuf {
        self.data_dir.join(DB_FILENAME)
    }
}

fn default_data_dir() -> PathBuf {
    directories::ProjectDirs::from("com", "stockadvisor", "stock-advisor")
        .map(|dirs| dirs.data_dir().to_path_buf())
        .unwrap_or_else(|| PathBuf::from("."))
}
