//! Backend wiring shared by the binary and the integration tests.

use solar_core::db::{DbConfig, MemoryRepositoryFactory, RepositoryRegistry};
use solar_core::{RepositoryError, SolarRepository};
use solar_db_sqlite::SqliteRepositoryFactory;
use tracing::debug;

/// Registry with every backend this build knows about.
pub fn build_registry() -> RepositoryRegistry {
    let mut registry = RepositoryRegistry::new();
    registry.register(Box::new(SqliteRepositoryFactory));
    registry.register(Box::new(MemoryRepositoryFactory));
    registry
}

/// Opens the repository described by `config`.
pub async fn open_repository(
    config: &DbConfig,
) -> Result<Box<dyn SolarRepository>, RepositoryError> {
    debug!(
        backend = %config.backend,
        connection = %config.connection_string,
        "opening repository"
    );
    build_registry().create(config).await
}
