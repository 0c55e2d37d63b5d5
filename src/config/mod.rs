//! Persisted reader preferences.
//!
//! Read from `~/.config/freshet/config.toml` at startup. If the file doesn't
//! exist, a commented default is written. Missing fields fall back to
//! defaults.

use std::fs;
use std::io::Write;
use std::path::PathBuf;

use serde::Deserialize;
use thiserror::Error;

use crate::session::{FilterMode, SortOrder};

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Entry list ordering applied when a feed view opens.
    pub entries_order: SortOrder,
    /// Filter mode applied when a feed view opens.
    pub default_filter: FilterMode,
    /// Refresh a feed automatically when its view opens.
    pub auto_refresh: bool,
    /// Override the database location.
    pub db_path: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            entries_order: SortOrder::ByDate,
            default_filter: FilterMode::None,
            auto_refresh: true,
            db_path: None,
        }
    }
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("could not determine config directory")]
    NoConfigDir,

    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
}

const DEFAULT_CONFIG: &str = r#"# freshet configuration

# Entry list ordering when a feed view opens: "by_date" or "unread_first".
entries_order = "by_date"

# Filter applied when a feed view opens: "none", "unread" or "starred".
default_filter = "none"

# Refresh a feed automatically when its view opens.
auto_refresh = true

# Uncomment to override the database location.
# db_path = "/path/to/freshet.db"
"#;

impl Config {
    /// Load from the default path, creating a commented default file if none
    /// exists.
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::default_config_path()?;

        if !config_path.exists() {
            Self::create_default_config(&config_path)?;
            return Ok(Self::default());
        }

        let content = fs::read_to_string(&config_path).map_err(|e| ConfigError::Io {
            path: config_path.clone(),
            source: e,
        })?;

        toml::from_str(&content).map_err(|e| ConfigError::Parse {
            path: config_path,
            source: e,
        })
    }

    pub fn default_config_path() -> Result<PathBuf, ConfigError> {
        let config_dir = dirs::config_dir().ok_or(ConfigError::NoConfigDir)?;
        Ok(config_dir.join("freshet").join("config.toml"))
    }

    fn create_default_config(path: &PathBuf) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| ConfigError::Io {
                path: parent.to_path_buf(),
                source: e,
            })?;
        }

        let mut file = fs::File::create(path).map_err(|e| ConfigError::Io {
            path: path.clone(),
            source: e,
        })?;
        file.write_all(DEFAULT_CONFIG.as_bytes())
            .map_err(|e| ConfigError::Io {
                path: path.clone(),
                source: e,
            })?;

        Ok(())
    }
}
