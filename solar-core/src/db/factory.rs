use std::collections::HashMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::repository::{RepositoryError, SolarRepository};

/// Database file used when no connection string is configured.
pub const DEFAULT_DATABASE_FILE: &str = "solarcalc.db";

/// Which storage backend to open, and how.
///
/// `backend` selects a registered [`RepositoryFactory`] by name; the
/// factory alone interprets `connection_string`.
///
/// | backend    | connection_string examples                 |
/// |------------|--------------------------------------------|
/// | `sqlite`   | `solarcalc.db`, `:memory:`, `sqlite:x.db`  |
/// | `memory`   | ignored                                    |
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DbConfig {
    pub backend: String,
    pub connection_string: String,
}

impl Default for DbConfig {
    fn default() -> Self {
        Self {
            backend: "sqlite".to_string(),
            connection_string: DEFAULT_DATABASE_FILE.to_string(),
        }
    }
}

/// Opens repositories for one backend.
///
/// Backend crates export a unit struct implementing this trait; binaries
/// register it with a [`RepositoryRegistry`] at startup.
#[async_trait]
pub trait RepositoryFactory: Send + Sync {
    /// Lowercase name matched against [`DbConfig::backend`].
    fn backend_name(&self) -> &'static str;

    /// Returns a repository ready for use, creating or upgrading the
    /// underlying storage as needed.
    async fn create(&self, config: &DbConfig) -> Result<Box<dyn SolarRepository>, RepositoryError>;
}

/// Backend factories by name.
#[derive(Default)]
pub struct RepositoryRegistry {
    factories: HashMap<&'static str, Box<dyn RepositoryFactory>>,
}

impl RepositoryRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `factory`, replacing any factory registered under the same name.
    pub fn register(&mut self, factory: Box<dyn RepositoryFactory>) {
        self.factories.insert(factory.backend_name(), factory);
    }

    /// Registered backend names in alphabetical order.
    pub fn available_backends(&self) -> Vec<&'static str> {
        let mut names: Vec<_> = self.factories.keys().copied().collect();
        names.sort_unstable();
        names
    }

    /// Opens a repository with the factory named by `config.backend`.
    ///
    /// # Errors
    ///
    /// [`RepositoryError::Configuration`] when no such backend is registered;
    /// otherwise whatever the factory reports.
    pub async fn create(
        &self,
        config: &DbConfig,
    ) -> Result<Box<dyn SolarRepository>, RepositoryError> {
        let Some(factory) = self.factories.get(config.backend.as_str()) else {
            return Err(RepositoryError::Configuration(format!(
                "unknown backend '{}'; available: {}",
                config.backend,
                self.available_backends().join(", ")
            )));
        };

        debug!(backend = factory.backend_name(), "creating repository");
        factory.create(config).await
    }
}
