//! A process-local repository, handy for tests and throwaway sessions.

use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;

use super::factory::{DbConfig, RepositoryFactory};
use super::repository::{RepositoryError, SolarRepository};
use crate::models::{Client, CompanySettings};

#[derive(Debug, Default)]
struct Store {
    clients: HashMap<String, Client>,
    settings: Option<CompanySettings>,
}

/// Keeps clients and settings in memory; nothing survives the process.
#[derive(Debug, Default)]
pub struct MemoryRepository {
    store: RwLock<Store>,
}

impl MemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, Store>, RepositoryError> {
        self.store
            .read()
            .map_err(|_| RepositoryError::Database("memory store lock poisoned".to_string()))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, Store>, RepositoryError> {
        self.store
            .write()
            .map_err(|_| RepositoryError::Database("memory store lock poisoned".to_string()))
    }
}

#[async_trait]
impl SolarRepository for MemoryRepository {
    async fn list_clients(&self) -> Result<Vec<Client>, RepositoryError> {
        let mut clients: Vec<Client> = self.read()?.clients.values().cloned().collect();
        clients.sort_by(|a, b| b.updated_at.cmp(&a.updated_at).then_with(|| a.id.cmp(&b.id)));
        Ok(clients)
    }

    async fn get_client(&self, id: &str) -> Result<Client, RepositoryError> {
        self.read()?
            .clients
            .get(id)
            .cloned()
            .ok_or(RepositoryError::NotFound)
    }

    async fn upsert_client(&self, client: &Client) -> Result<(), RepositoryError> {
        self.write()?
            .clients
            .insert(client.id.clone(), client.clone());
        Ok(())
    }

    async fn delete_client(&self, id: &str) -> Result<(), RepositoryError> {
        self.write()?
            .clients
            .remove(id)
            .map(|_| ())
            .ok_or(RepositoryError::NotFound)
    }

    async fn get_settings(&self) -> Result<CompanySettings, RepositoryError> {
        Ok(self.read()?.settings.clone().unwrap_or_default())
    }

    async fn save_settings(&self, settings: &CompanySettings) -> Result<(), RepositoryError> {
        self.write()?.settings = Some(settings.clone());
        Ok(())
    }
}

/// Registers the `memory` backend. The connection string is ignored.
pub struct MemoryRepositoryFactory;

#[async_trait]
impl RepositoryFactory for MemoryRepositoryFactory {
    fn backend_name(&self) -> &'static str {
        "memory"
    }

    async fn create(&self, _config: &DbConfig) -> Result<Box<dyn SolarRepository>, RepositoryError> {
        Ok(Box::new(MemoryRepository::new()))
    }
}
