use async_trait::async_trait;
use tracing::info;

use solar_core::db::repository::{RepositoryError, SolarRepository};
use solar_core::db::{DbConfig, RepositoryFactory};

use crate::repository::SqliteRepository;

/// [`RepositoryFactory`] for SQLite.
///
/// Register this with a [`solar_core::db::RepositoryRegistry`] to make the
/// `"sqlite"` backend available:
///
/// ```rust,no_run
/// use solar_core::db::RepositoryRegistry;
/// use solar_db_sqlite::SqliteRepositoryFactory;
///
/// let mut registry = RepositoryRegistry::new();
/// registry.register(Box::new(SqliteRepositoryFactory));
/// ```
pub struct SqliteRepositoryFactory;

#[async_trait]
impl RepositoryFactory for SqliteRepositoryFactory {
    fn backend_name(&self) -> &'static str {
        "sqlite"
    }

    /// Open the database described by `config.connection_string`, apply
    /// pending migrations and upgrade clients saved by older versions.
    ///
    /// Accepted connection-string values:
    /// * A bare file path, e.g. `"solarcalc.db"`. The file is created if it
    ///   does not exist.
    /// * `":memory:"` for an ephemeral in-memory database.
    /// * A full sqlx URL such as `"sqlite:data/solar.db?mode=ro"`.
    async fn create(
        &self,
        config: &DbConfig,
    ) -> Result<Box<dyn SolarRepository>, RepositoryError> {
        let repo = SqliteRepository::new(&config.connection_string)
            .await
            .map_err(|e| RepositoryError::Connection(format!("{e:#}")))?;
        repo.run_migrations()
            .await
            .map_err(|e| RepositoryError::Migration(format!("{e:#}")))?;
        repo.upgrade_stored_clients()
            .await
            .map_err(|e| RepositoryError::Migration(format!("{e:#}")))?;

        info!(connection = %config.connection_string, "sqlite repository ready");
        Ok(Box::new(repo))
    }
}
