//! Configuration management with layered loading
//!
//! Precedence (lowest to highest):
//! 1. Compiled defaults
//! 2. Global config: `$XDG_CONFIG_HOME/goaltree/goaltree.toml`
//! 3. Environment variables: `GOALTREE_*` prefix

use std::path::PathBuf;

use config::{Config, Environment, File};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

use crate::application::ApplicationError;
use crate::infrastructure::DEFAULT_DEBOUNCE_MS;

/// Unified configuration for goaltree.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Settings {
    /// Path of the JSON goal document
    pub data_file: PathBuf,
    /// Quiet period for coalescing document writes, in milliseconds
    pub debounce_ms: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            data_file: default_data_file(),
            debounce_ms: DEFAULT_DEBOUNCE_MS,
        }
    }
}

/// Default document location in the platform data directory.
fn default_data_file() -> PathBuf {
    ProjectDirs::from("", "", "goaltree")
        .map(|dirs| dirs.data_dir().join("goals.json"))
        .unwrap_or_else(|| PathBuf::from("goals.json"))
}

/// Get the XDG config directory for goaltree.
pub fn global_config_dir() -> Option<PathBuf> {
    ProjectDirs::from("", "", "goaltree").map(|dirs| dirs.config_dir().to_path_buf())
}

/// Get the path to the global config file.
pub fn global_config_path() -> Option<PathBuf> {
    global_config_dir().map(|dir| dir.join("goaltree.toml"))
}

impl Settings {
    /// Load settings with layered precedence.
    pub fn load() -> Result<Self, ApplicationError> {
        Self::load_from(global_config_path())
    }

    /// Load settings with an explicit global config path (for testing).
    pub fn load_from(global: Option<PathBuf>) -> Result<Self, ApplicationError> {
        let mut builder = Config::builder().add_source(
            Config::try_from(&Settings::default()).map_err(|e| ApplicationError::Config {
                message: e.to_string(),
            })?,
        );

        if let Some(path) = global {
            if path.exists() {
                builder = builder.add_source(File::from(path));
            }
        }

        builder = builder.add_source(Environment::with_prefix("GOALTREE").try_parsing(true));

        builder
            .build()
            .and_then(|config| config.try_deserialize())
            .map_err(|e| ApplicationError::Config {
                message: e.to_string(),
            })
    }

    /// Render the effective settings as TOML.
    pub fn to_toml(&self) -> Result<String, ApplicationError> {
        toml::to_string_pretty(self).map_err(|e| ApplicationError::Config {
            message: e.to_string(),
        })
    }
}
