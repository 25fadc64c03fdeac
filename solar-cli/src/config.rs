//! `solarcalc.toml` configuration.
//!
//! Every key is optional; anything left out keeps its built-in default.
//!
//! ```toml
//! log_level = "info"
//! log_file = "solarcalc.log"
//!
//! [database]
//! backend = "sqlite"
//! connection_string = "solarcalc.db"
//!
//! [defaults]
//! panel_power_wp = 585
//! system_efficiency = 0.8
//! kwh_price = 1.02
//! connection_type = "bifasico"
//! ```
//!
//! Command-line flags override the file.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use solar_core::ClientDefaults;
use solar_core::db::DbConfig;
use thiserror::Error;
use tracing::debug;

use crate::logging::DEFAULT_LOG_LEVEL;

/// File looked up in the working directory when `--config` is not given.
pub const DEFAULT_CONFIG_FILE: &str = "solarcalc.toml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid configuration in {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub database: DbConfig,
    /// Bare level or full `EnvFilter` directive. `RUST_LOG` wins over it.
    pub log_level: String,
    /// Appended to in addition to stderr.
    pub log_file: Option<PathBuf>,
    /// Applied to clients created with `solarcalc new`.
    pub defaults: ClientDefaults,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database: DbConfig::default(),
            log_level: DEFAULT_LOG_LEVEL.to_string(),
            log_file: None,
            defaults: ClientDefaults::default(),
        }
    }
}

/// Values given on the command line, each replacing its file counterpart.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConfigOverrides {
    pub backend: Option<String>,
    pub connection_string: Option<String>,
    pub log_level: Option<String>,
    pub log_file: Option<PathBuf>,
}

impl AppConfig {
    /// Loads `path`, or [`DEFAULT_CONFIG_FILE`] when `path` is `None`.
    ///
    /// # Errors
    ///
    /// An explicit `path` must exist. A missing default file yields the
    /// built-in configuration; an unreadable or malformed one is an error.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let (path, required) = match path {
            Some(path) => (path, true),
            None => (Path::new(DEFAULT_CONFIG_FILE), false),
        };

        if !required && !path.exists() {
            debug!(path = %path.display(), "no configuration file, using defaults");
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_toml(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;

        debug!(path = %path.display(), backend = %config.database.backend, "configuration loaded");
        Ok(config)
    }

    pub fn from_toml(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    pub fn apply_overrides(
        &mut self,
        overrides: ConfigOverrides,
    ) {
        if let Some(backend) = overrides.backend {
            self.database.backend = backend;
        }
        if let Some(connection_string) = overrides.connection_string {
            self.database.connection_string = connection_string;
        }
        if let Some(level) = overrides.log_level {
            self.log_level = level;
        }
        if let Some(file) = overrides.log_file {
            self.log_file = Some(file);
        }
    }
}
