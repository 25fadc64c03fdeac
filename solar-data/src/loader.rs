use chrono::{DateTime, Utc};
use solar_core::calculations::{calculate_solar_system, recompute_derived_financials};
use solar_core::{Client, CompanySettings, RepositoryError, SolarRepository};
use thiserror::Error;
use tracing::{debug, info};

use crate::monthly_csv::MonthlyProfile;

/// Errors that can occur when writing imported data.
#[derive(Debug, Error)]
pub enum ClientDataLoaderError {
    #[error("Client '{0}' not found in database")]
    ClientNotFound(String),

    #[error("Repository error: {0}")]
    Repository(#[from] RepositoryError),
}

/// Writes imported data through the [`SolarRepository`] trait, so it works
/// with any database backend.
///
/// Every client is saved with its proposal and final values recomputed from
/// the current sizing result.
pub struct ClientDataLoader;

impl ClientDataLoader {
    /// Replace the monthly series of one stored client.
    ///
    /// Series that are `None` in `profile` are left as they were. The client's
    /// `updated_at` becomes `now`.
    pub async fn apply_monthly<R: SolarRepository + ?Sized>(
        repo: &R,
        client_id: &str,
        profile: &MonthlyProfile,
        now: DateTime<Utc>,
    ) -> Result<Client, ClientDataLoaderError> {
        let mut client = repo.get_client(client_id).await.map_err(|e| match e {
            RepositoryError::NotFound => ClientDataLoaderError::ClientNotFound(client_id.to_string()),
            other => ClientDataLoaderError::Repository(other),
        })?;

        if let Some(consumption) = profile.consumption {
            client.consumption = consumption;
        }
        if let Some(irradiation) = profile.irradiation {
            client.irradiation = irradiation;
        }
        client.updated_at = now;

        let client = Self::with_derived_values(&client);
        repo.upsert_client(&client).await?;

        debug!(
            client_id,
            consumption = profile.consumption.is_some(),
            irradiation = profile.irradiation.is_some(),
            "applied monthly data"
        );
        Ok(client)
    }

    /// Insert or replace every client, returning how many were written.
    ///
    /// Loading the same clients twice leaves the database unchanged.
    pub async fn load_clients<R: SolarRepository + ?Sized>(
        repo: &R,
        clients: &[Client],
    ) -> Result<usize, ClientDataLoaderError> {
        let mut written = 0;

        for client in clients {
            repo.upsert_client(&Self::with_derived_values(client)).await?;
            written += 1;
        }

        info!(written, "loaded clients");
        Ok(written)
    }

    pub async fn load_settings<R: SolarRepository + ?Sized>(
        repo: &R,
        settings: &CompanySettings,
    ) -> Result<(), ClientDataLoaderError> {
        repo.save_settings(settings).await?;
        Ok(())
    }

    fn with_derived_values(client: &Client) -> Client {
        recompute_derived_financials(client, &calculate_solar_system(client))
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;
    use solar_core::db::MemoryRepository;
    use solar_core::{Month, MonthlyData};

    use super::*;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 8, 1, 12, 0, 0).unwrap()
    }

    fn stored_client() -> Client {
        let mut client = Client::new_empty("c1", Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap());
        client.consumption = MonthlyData::splat(400.0);
        client.irradiation = MonthlyData::splat(5.0);
        client.kit_price = 10000.0;
        client
    }

    #[tokio::test]
    async fn apply_monthly_replaces_only_given_series() {
        let repo = MemoryRepository::new();
        repo.upsert_client(&stored_client()).await.unwrap();
        let profile = MonthlyProfile {
            consumption: None,
            irradiation: Some(MonthlyData::splat(5.5)),
        };

        let updated = ClientDataLoader::apply_monthly(&repo, "c1", &profile, now())
            .await
            .unwrap();

        assert_eq!(updated.consumption[Month::Jan], 400.0);
        assert_eq!(updated.irradiation[Month::Jan], 5.5);
        assert_eq!(updated.updated_at, now());
        assert_eq!(repo.get_client("c1").await.unwrap(), updated);
    }

    #[tokio::test]
    async fn apply_monthly_recomputes_proposal_value() {
        let repo = MemoryRepository::new();
        repo.upsert_client(&stored_client()).await.unwrap();

        let updated = ClientDataLoader::apply_monthly(&repo, "c1", &MonthlyProfile::default(), now())
            .await
            .unwrap();

        assert_eq!(updated.proposal_value, 10000.0);
        assert_eq!(updated.final_value, 10000.0);
    }

    #[tokio::test]
    async fn apply_monthly_to_unknown_client_fails() {
        let repo = MemoryRepository::new();

        let result =
            ClientDataLoader::apply_monthly(&repo, "ghost", &MonthlyProfile::default(), now()).await;

        assert!(matches!(result, Err(ClientDataLoaderError::ClientNotFound(id)) if id == "ghost"));
    }

    #[tokio::test]
    async fn load_clients_is_idempotent() {
        let repo = MemoryRepository::new();
        let clients = vec![stored_client()];

        assert_eq!(ClientDataLoader::load_clients(&repo, &clients).await.unwrap(), 1);
        assert_eq!(ClientDataLoader::load_clients(&repo, &clients).await.unwrap(), 1);

        let stored = repo.list_clients().await.unwrap();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].proposal_value, 10000.0);
    }
}
