use serde::{Deserialize, Serialize};
use std::fs;
use std::io::ErrorKind;
use std::path::PathBuf;
use thiserror::Error;

/// Environment variable overriding the config file location
pub const CONFIG_PATH_ENV: &str = "FAVORITES_CONFIG";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config {path:?}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config {path:?}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
}

/// User configuration (config.json)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Config {
    /// State file override (default: `<data_local_dir>/favorites/state.json`)
    pub state_file: Option<PathBuf>,
    /// Workspace roots used when none are given on the command line
    pub workspaces: Vec<PathBuf>,
}

impl Config {
    /// Get the config file path
    pub fn path() -> PathBuf {
        if let Some(path) = std::env::var_os(CONFIG_PATH_ENV) {
            return PathBuf::from(path);
        }

        const FILENAME: &str = "config.json";
        if let Some(mut path) = dirs::config_dir() {
            path.push("favorites");
            path.push(FILENAME);
            return path;
        }

        // Fallback to home directory
        if let Some(mut path) = dirs::home_dir() {
            path.push(".favorites");
            path.push(FILENAME);
            return path;
        }

        PathBuf::from(FILENAME)
    }

    /// Load config from the default location
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(Self::path())
    }

    /// Load config from `path`, or defaults if the file does not exist
    pub fn load_from(path: impl Into<PathBuf>) -> Result<Self, ConfigError> {
        let path = path.into();
        let content = match fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "No config file, using defaults");
                return Ok(Self::default());
            }
            Err(source) => return Err(ConfigError::Read { path, source }),
        };

        serde_json::from_str(&content).map_err(|source| ConfigError::Parse { path, source })
    }
}
