use std::str::FromStr;
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::Value;
use solar_core::migration::{CURRENT_SCHEMA_VERSION, upgrade_client_document};
use solar_core::{Client, CompanySettings, RepositoryError, SolarRepository};
use sqlx::FromRow;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use tracing::{debug, info, warn};

/// Key of the single row holding the company settings.
const COMPANY_SETTINGS_KEY: &str = "company";

const MEMORY_URL: &str = "sqlite::memory:";

/// Maps a configured connection string to a sqlx URL.
///
/// * `:memory:` opens an ephemeral in-memory database.
/// * Anything starting with `sqlite:` is used unchanged.
/// * Any other value is a file path, created when missing.
pub fn connection_url(connection_string: &str) -> String {
    let trimmed = connection_string.trim();
    if trimmed == ":memory:" {
        MEMORY_URL.to_string()
    } else if trimmed.starts_with("sqlite:") {
        trimmed.to_string()
    } else {
        format!("sqlite:{trimmed}?mode=rwc")
    }
}

pub struct SqliteRepository {
    pool: SqlitePool,
}

impl SqliteRepository {
    /// Connects to `connection_string`; see [`connection_url`] for accepted forms.
    pub async fn new(connection_string: &str) -> Result<Self> {
        let url = connection_url(connection_string);
        let options = SqliteConnectOptions::from_str(&url)
            .with_context(|| format!("Invalid database URL: {url}"))?;

        let connected = if url.contains(":memory:") {
            // Every connection to :memory: is a separate database; keep exactly one alive.
            SqlitePoolOptions::new()
                .max_connections(1)
                .idle_timeout(None::<Duration>)
                .max_lifetime(None::<Duration>)
                .connect_with(options)
                .await
        } else {
            SqlitePoolOptions::new().connect_with(options).await
        };
        let pool = connected.with_context(|| format!("Failed to connect to database: {url}"))?;

        debug!(%url, "opened sqlite database");
        Ok(Self { pool })
    }

    pub async fn new_with_pool(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn run_migrations(&self) -> Result<()> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .context("Failed to run database migrations")?;
        Ok(())
    }

    /// Rewrites every client stored with an older schema version.
    ///
    /// Returns how many documents were upgraded. Documents that cannot be
    /// upgraded are left untouched and logged.
    pub async fn upgrade_stored_clients(&self) -> Result<usize> {
        let rows: Vec<ClientRow> = sqlx::query_as(
            "SELECT id, schema_version, document FROM clients WHERE schema_version < ?",
        )
        .bind(i64::from(CURRENT_SCHEMA_VERSION))
        .fetch_all(&self.pool)
        .await
        .context("Failed to read stored clients")?;

        let now = Utc::now();
        let mut upgraded = 0;
        for row in rows {
            let id = row.id.clone();
            match row.into_client(now) {
                Ok(client) => {
                    self.write_client(&client)
                        .await
                        .with_context(|| format!("Failed to store upgraded client '{id}'"))?;
                    upgraded += 1;
                }
                Err(err) => warn!(client_id = %id, error = %err, "skipping client that cannot be upgraded"),
            }
        }

        if upgraded > 0 {
            info!(upgraded, version = CURRENT_SCHEMA_VERSION, "upgraded stored clients");
        }
        Ok(upgraded)
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    async fn write_client(&self, client: &Client) -> Result<(), RepositoryError> {
        let document = serde_json::to_string(client)
            .map_err(|e| RepositoryError::Database(format!("Failed to encode client: {e}")))?;

        sqlx::query(
            "INSERT INTO clients (id, schema_version, name, email, status, document, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?)
             ON CONFLICT(id) DO UPDATE SET
                schema_version = excluded.schema_version,
                name = excluded.name,
                email = excluded.email,
                status = excluded.status,
                document = excluded.document,
                created_at = excluded.created_at,
                updated_at = excluded.updated_at",
        )
        .bind(&client.id)
        .bind(i64::from(CURRENT_SCHEMA_VERSION))
        .bind(&client.name)
        .bind(&client.email)
        .bind(client.status.as_str())
        .bind(document)
        .bind(sortable_timestamp(client.created_at))
        .bind(sortable_timestamp(client.updated_at))
        .execute(&self.pool)
        .await
        .map_err(|e| RepositoryError::Database(e.to_string()))?;

        Ok(())
    }
}

#[derive(FromRow)]
struct ClientRow {
    id: String,
    schema_version: i64,
    document: String,
}

impl ClientRow {
    fn into_client(self, now: DateTime<Utc>) -> Result<Client, RepositoryError> {
        let document: Value = serde_json::from_str(&self.document).map_err(|e| {
            RepositoryError::Database(format!("Malformed document for client '{}': {e}", self.id))
        })?;
        let version = u32::try_from(self.schema_version).map_err(|_| {
            RepositoryError::Migration(format!(
                "Invalid schema version {} for client '{}'",
                self.schema_version, self.id
            ))
        })?;

        Ok(upgrade_client_document(document, version, now)?)
    }
}

/// Fixed-width UTC timestamps so that text order matches time order.
fn sortable_timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Micros, true)
}

#[async_trait]
impl SolarRepository for SqliteRepository {
    async fn list_clients(&self) -> Result<Vec<Client>, RepositoryError> {
        let rows: Vec<ClientRow> = sqlx::query_as(
            "SELECT id, schema_version, document FROM clients ORDER BY updated_at DESC, id ASC",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| RepositoryError::Database(e.to_string()))?;

        let now = Utc::now();
        let mut clients = Vec::with_capacity(rows.len());
        for row in rows {
            let id = row.id.clone();
            match row.into_client(now) {
                Ok(client) => clients.push(client),
                Err(err) => warn!(client_id = %id, error = %err, "skipping unreadable client"),
            }
        }
        Ok(clients)
    }

    async fn get_client(&self, id: &str) -> Result<Client, RepositoryError> {
        let row: ClientRow =
            sqlx::query_as("SELECT id, schema_version, document FROM clients WHERE id = ?")
                .bind(id)
                .fetch_optional(&self.pool)
                .await
                .map_err(|e| RepositoryError::Database(e.to_string()))?
                .ok_or(RepositoryError::NotFound)?;

        row.into_client(Utc::now())
    }

    async fn upsert_client(&self, client: &Client) -> Result<(), RepositoryError> {
        self.write_client(client).await?;
        debug!(client_id = %client.id, "saved client");
        Ok(())
    }

    async fn delete_client(&self, id: &str) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM clients WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| RepositoryError::Database(e.to_string()))?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        Ok(())
    }

    async fn get_settings(&self) -> Result<CompanySettings, RepositoryError> {
        let row: Option<(String,)> = sqlx::query_as("SELECT document FROM settings WHERE key = ?")
            .bind(COMPANY_SETTINGS_KEY)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| RepositoryError::Database(e.to_string()))?;

        match row {
            Some((document,)) => serde_json::from_str(&document)
                .map_err(|e| RepositoryError::Database(format!("Malformed company settings: {e}"))),
            None => Ok(CompanySettings::default()),
        }
    }

    async fn save_settings(&self, settings: &CompanySettings) -> Result<(), RepositoryError> {
        let document = serde_json::to_string(settings)
            .map_err(|e| RepositoryError::Database(format!("Failed to encode settings: {e}")))?;

        sqlx::query(
            "INSERT INTO settings (key, document) VALUES (?, ?)
             ON CONFLICT(key) DO UPDATE SET document = excluded.document",
        )
        .bind(COMPANY_SETTINGS_KEY)
        .bind(document)
        .execute(&self.pool)
        .await
        .map_err(|e| RepositoryError::Database(e.to_string()))?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration as ChronoDuration, TimeZone};
    use pretty_assertions::assert_eq;
    use solar_core::{MonthlyData, ProjectStatus};

    use super::*;

    async fn setup_test_db() -> SqliteRepository {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None::<Duration>)
            .max_lifetime(None::<Duration>)
            .connect(MEMORY_URL)
            .await
            .expect("Failed to create in-memory database");

        let repo = SqliteRepository::new_with_pool(pool).await;
        repo.run_migrations()
            .await
            .expect("Failed to run migrations");
        repo
    }

    fn base_time() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 5, 20, 9, 30, 0).unwrap()
    }

    fn test_client(id: &str, minutes: i64) -> Client {
        let mut client = Client::new_empty(id, base_time());
        client.name = format!("Client {id}");
        client.consumption = MonthlyData::splat(450.0);
        client.irradiation = MonthlyData::splat(5.2);
        client.kit_price = 14000.0;
        client.updated_at = base_time() + ChronoDuration::minutes(minutes);
        client
    }

    async fn insert_raw(repo: &SqliteRepository, id: &str, version: i64, document: &str) {
        sqlx::query(
            "INSERT INTO clients (id, schema_version, document, created_at, updated_at)
             VALUES (?, ?, ?, '2024-01-01T00:00:00.000000Z', '2024-01-01T00:00:00.000000Z')",
        )
        .bind(id)
        .bind(version)
        .bind(document)
        .execute(repo.pool())
        .await
        .expect("Failed to insert raw client");
    }

    // =========================================================================
    // connection strings
    // =========================================================================

    #[test]
    fn connection_url_maps_known_forms() {
        assert_eq!(connection_url(":memory:"), "sqlite::memory:");
        assert_eq!(connection_url("sqlite:data/x.db"), "sqlite:data/x.db");
        assert_eq!(connection_url("solarcalc.db"), "sqlite:solarcalc.db?mode=rwc");
    }

    #[tokio::test]
    async fn new_opens_usable_memory_database() {
        let repo = SqliteRepository::new(":memory:").await.unwrap();
        repo.run_migrations().await.unwrap();

        repo.upsert_client(&test_client("a", 0)).await.unwrap();

        assert_eq!(repo.list_clients().await.unwrap().len(), 1);
    }

    // =========================================================================
    // clients
    // =========================================================================

    #[tokio::test]
    async fn upsert_and_get_client() {
        let repo = setup_test_db().await;
        let client = test_client("c1", 0);

        repo.upsert_client(&client).await.expect("Should save client");
        let fetched = repo.get_client("c1").await.expect("Should fetch client");

        assert_eq!(fetched, client);
    }

    #[tokio::test]
    async fn upsert_replaces_existing_document() {
        let repo = setup_test_db().await;
        let mut client = test_client("c1", 0);
        repo.upsert_client(&client).await.unwrap();

        client.status = ProjectStatus::Approval;
        client.kit_price = 16000.0;
        repo.upsert_client(&client).await.unwrap();

        let all = repo.list_clients().await.unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].status, ProjectStatus::Approval);
        assert_eq!(all[0].kit_price, 16000.0);
    }

    #[tokio::test]
    async fn list_clients_most_recent_first() {
        let repo = setup_test_db().await;
        repo.upsert_client(&test_client("old", 0)).await.unwrap();
        repo.upsert_client(&test_client("newest", 120)).await.unwrap();
        repo.upsert_client(&test_client("middle", 60)).await.unwrap();

        let ids: Vec<String> = repo
            .list_clients()
            .await
            .unwrap()
            .into_iter()
            .map(|c| c.id)
            .collect();

        assert_eq!(ids, vec!["newest", "middle", "old"]);
    }

    #[tokio::test]
    async fn get_missing_client_is_not_found() {
        let repo = setup_test_db().await;

        assert_eq!(repo.get_client("ghost").await, Err(RepositoryError::NotFound));
    }

    #[tokio::test]
    async fn delete_client_removes_row() {
        let repo = setup_test_db().await;
        repo.upsert_client(&test_client("c1", 0)).await.unwrap();

        repo.delete_client("c1").await.expect("Should delete client");

        assert_eq!(repo.get_client("c1").await, Err(RepositoryError::NotFound));
        assert_eq!(repo.delete_client("c1").await, Err(RepositoryError::NotFound));
    }

    // =========================================================================
    // legacy documents
    // =========================================================================

    #[tokio::test]
    async fn legacy_rows_are_upgraded_on_read() {
        let repo = setup_test_db().await;
        insert_raw(
            &repo,
            "legacy",
            1,
            r#"{"id":"legacy","name":"Rosa","kitItems":"8x Painel 550W","updatedAt":"2024-01-01T00:00:00.000Z"}"#,
        )
        .await;

        let client = repo.get_client("legacy").await.unwrap();

        assert_eq!(client.name, "Rosa");
        assert_eq!(client.status, ProjectStatus::Lead);
        assert_eq!(client.materials[0].model, "8x Painel 550W");
    }

    #[tokio::test]
    async fn upgrade_stored_clients_rewrites_old_versions_once() {
        let repo = setup_test_db().await;
        insert_raw(&repo, "legacy", 1, r#"{"id":"legacy","name":"Rosa"}"#).await;
        repo.upsert_client(&test_client("current", 0)).await.unwrap();

        assert_eq!(repo.upgrade_stored_clients().await.unwrap(), 1);
        assert_eq!(repo.upgrade_stored_clients().await.unwrap(), 0);

        let (version,): (i64,) =
            sqlx::query_as("SELECT schema_version FROM clients WHERE id = 'legacy'")
                .fetch_one(repo.pool())
                .await
                .unwrap();
        assert_eq!(version, i64::from(CURRENT_SCHEMA_VERSION));
    }

    #[tokio::test]
    async fn upgrade_skips_broken_documents() {
        let repo = setup_test_db().await;
        insert_raw(&repo, "broken", 1, r#"{"name":"no id"}"#).await;

        assert_eq!(repo.upgrade_stored_clients().await.unwrap(), 0);
        assert!(matches!(
            repo.get_client("broken").await,
            Err(RepositoryError::Migration(_))
        ));
    }

    #[tokio::test]
    async fn list_clients_skips_unreadable_rows() {
        let repo = setup_test_db().await;
        insert_raw(&repo, "broken", 1, r#"{"name":"no id"}"#).await;
        repo.upsert_client(&test_client("c1", 0)).await.unwrap();

        let ids: Vec<String> = repo.list_clients().await.unwrap().into_iter().map(|c| c.id).collect();

        assert_eq!(ids, vec!["c1".to_string()]);
    }

    #[tokio::test]
    async fn newer_schema_is_reported_as_migration_error() {
        let repo = setup_test_db().await;
        insert_raw(&repo, "future", 99, r#"{"id":"future"}"#).await;

        assert!(matches!(
            repo.get_client("future").await,
            Err(RepositoryError::Migration(_))
        ));
    }

    // =========================================================================
    // settings
    // =========================================================================

    #[tokio::test]
    async fn settings_default_until_saved() {
        let repo = setup_test_db().await;

        assert_eq!(repo.get_settings().await.unwrap(), CompanySettings::default());
    }

    #[tokio::test]
    async fn save_settings_overwrites_previous() {
        let repo = setup_test_db().await;
        let first = CompanySettings {
            logo: None,
            company_name: Some("Sol Nascente".to_string()),
        };
        let second = CompanySettings {
            logo: Some("iVBORw0KGgo=".to_string()),
            company_name: Some("Sol Poente".to_string()),
        };

        repo.save_settings(&first).await.unwrap();
        repo.save_settings(&second).await.unwrap();

        assert_eq!(repo.get_settings().await.unwrap(), second);
    }
}
