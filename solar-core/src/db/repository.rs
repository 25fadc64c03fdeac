use async_trait::async_trait;
use thiserror::Error;

use crate::models::{Client, CompanySettings};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RepositoryError {
    #[error("Record not found")]
    NotFound,

    #[error("Database error: {0}")]
    Database(String),

    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Migration error: {0}")]
    Migration(String),
}

impl From<crate::migration::MigrationError> for RepositoryError {
    fn from(err: crate::migration::MigrationError) -> Self {
        Self::Migration(err.to_string())
    }
}

/// Storage for clients and the company settings.
///
/// Implementations hand out owned copies; callers persist changes with
/// [`SolarRepository::upsert_client`].
#[async_trait]
pub trait SolarRepository: Send + Sync {
    // Clients
    /// Every stored client, most recently updated first.
    async fn list_clients(&self) -> Result<Vec<Client>, RepositoryError>;

    async fn get_client(&self, id: &str) -> Result<Client, RepositoryError>;

    /// Inserts the client, or replaces the stored one with the same id.
    async fn upsert_client(&self, client: &Client) -> Result<(), RepositoryError>;

    /// Fails with [`RepositoryError::NotFound`] when no client has `id`.
    async fn delete_client(&self, id: &str) -> Result<(), RepositoryError>;

    // Company settings
    /// Stored settings, or the defaults when none were saved yet.
    async fn get_settings(&self) -> Result<CompanySettings, RepositoryError>;

    async fn save_settings(&self, settings: &CompanySettings) -> Result<(), RepositoryError>;
}
