//! Integration tests for the importers using the actual database backend.

use chrono::{TimeZone, Utc};
use pretty_assertions::assert_eq;
use solar_core::{Client, ConnectionType, Month, MonthlyData, PaymentMethod, ProjectStatus, SolarRepository};
use solar_data::{ClientDataLoader, ClientDataLoaderError, LegacyExportLoader, MonthlyCsvLoader, MonthlyProfile, parse_climatology};
use solar_db_sqlite::SqliteRepository;
use sqlx::sqlite::SqlitePoolOptions;

const MONTHLY_CSV: &str = include_str!("../test-data/monthly_consumption.csv");
const NASA_JSON: &str = include_str!("../test-data/nasa_power_climatology.json");
const LEGACY_JSON: &str = include_str!("../test-data/legacy_export.json");

const MARIANA: &str = "7f1c2d9e-0b6a-4e55-9d38-3a1f0e2b4c11";
const ROCHA: &str = "c03b8a55-6a0e-4f0b-8f0e-52d7a7a9e3f2";

async fn setup_test_db() -> SqliteRepository {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .expect("Failed to create in-memory database");

    let repo = SqliteRepository::new_with_pool(pool).await;
    repo.run_migrations()
        .await
        .expect("Failed to run migrations");

    repo
}

async fn setup_with_client(id: &str) -> SqliteRepository {
    let repo = setup_test_db().await;
    let mut client = Client::new_empty(id, Utc.with_ymd_and_hms(2025, 1, 10, 8, 0, 0).unwrap());
    client.name = "Teste".to_string();
    client.consumption = MonthlyData::splat(100.0);
    client.irradiation = MonthlyData::splat(4.0);
    repo.upsert_client(&client)
        .await
        .expect("Failed to insert client");
    repo
}

async fn import_legacy(repo: &SqliteRepository) -> usize {
    let export = LegacyExportLoader::parse(LEGACY_JSON, Utc::now()).expect("Failed to parse export");
    ClientDataLoader::load_clients(repo, &export.clients)
        .await
        .expect("Failed to load clients")
}

// =============================================================================
// legacy export
// =============================================================================

#[tokio::test]
async fn test_import_legacy_export() {
    let repo = setup_test_db().await;

    assert_eq!(import_legacy(&repo).await, 2);

    let clients = repo.list_clients().await.expect("Failed to list clients");
    let ids: Vec<&str> = clients.iter().map(|c| c.id.as_str()).collect();
    // Most recently updated first
    assert_eq!(ids, vec![ROCHA, MARIANA]);
}

#[tokio::test]
async fn test_legacy_client_is_upgraded() {
    let repo = setup_test_db().await;
    import_legacy(&repo).await;

    let client = repo.get_client(MARIANA).await.expect("Failed to get client");

    assert_eq!(client.status, ProjectStatus::Lead);
    assert_eq!(
        client.status_updated_at,
        Utc.with_ymd_and_hms(2024, 3, 5, 9, 10, 0).unwrap()
    );
    assert_eq!(client.connection_type, ConnectionType::Bifasico);
    assert_eq!(client.payment_method, PaymentMethod::Financing);
    assert_eq!(client.installments, 48);
    assert_eq!(client.address.neighborhood, "Cambuí");
    assert_eq!(client.materials.len(), 1);
    assert_eq!(client.materials[0].unit, "kit");
    assert_eq!(client.materials[0].brand, "-");
}

#[tokio::test]
async fn test_legacy_proposal_values_are_recomputed() {
    let repo = setup_test_db().await;
    import_legacy(&repo).await;

    let mariana = repo.get_client(MARIANA).await.unwrap();
    // kit 18500 + labor 3500, fixed discount 1000
    assert_eq!(mariana.proposal_value, 22000.0);
    assert_eq!(mariana.final_value, 21000.0);

    let rocha = repo.get_client(ROCHA).await.unwrap();
    assert_eq!(rocha.proposal_value, 42000.0);
    assert_eq!(rocha.final_value, 42000.0);
}

#[tokio::test]
async fn test_legacy_nulls_and_gaps_are_filled() {
    let repo = setup_test_db().await;
    import_legacy(&repo).await;

    let rocha = repo.get_client(ROCHA).await.unwrap();

    assert_eq!(rocha.kwh_price, 0.0);
    assert_eq!(rocha.installments, 1);
    assert_eq!(rocha.consumption[Month::Mar], 1480.0);
    assert_eq!(rocha.consumption[Month::Apr], 0.0);
    assert_eq!(rocha.address.street, "");
    assert!(rocha.materials.is_empty());
}

#[tokio::test]
async fn test_import_legacy_twice_is_idempotent() {
    let repo = setup_test_db().await;

    import_legacy(&repo).await;
    import_legacy(&repo).await;

    assert_eq!(repo.list_clients().await.unwrap().len(), 2);
}

// =============================================================================
// monthly data
// =============================================================================

#[tokio::test]
async fn test_apply_monthly_csv() {
    let repo = setup_with_client("c1").await;
    let profile = MonthlyCsvLoader::parse(MONTHLY_CSV.as_bytes()).expect("Failed to parse CSV");

    ClientDataLoader::apply_monthly(&repo, "c1", &profile, Utc::now())
        .await
        .expect("Failed to apply monthly data");

    let client = repo.get_client("c1").await.unwrap();
    assert_eq!(client.consumption[Month::Jan], 520.0);
    assert_eq!(client.consumption.total(), 5615.0);
    assert_eq!(client.irradiation[Month::Jul], 4.02);
}

#[tokio::test]
async fn test_apply_nasa_irradiation_keeps_consumption() {
    let repo = setup_with_client("c1").await;
    let profile = MonthlyProfile {
        consumption: None,
        irradiation: Some(parse_climatology(NASA_JSON).expect("Failed to parse NASA JSON")),
    };

    ClientDataLoader::apply_monthly(&repo, "c1", &profile, Utc::now())
        .await
        .unwrap();

    let client = repo.get_client("c1").await.unwrap();
    assert_eq!(client.consumption, MonthlyData::splat(100.0));
    assert_eq!(client.irradiation[Month::Jan], 5.62);
    assert_eq!(client.irradiation[Month::Jun], 3.49);
}

#[tokio::test]
async fn test_apply_monthly_to_missing_client() {
    let repo = setup_test_db().await;
    let profile = MonthlyCsvLoader::parse(MONTHLY_CSV.as_bytes()).unwrap();

    let result = ClientDataLoader::apply_monthly(&repo, "nobody", &profile, Utc::now()).await;

    assert!(matches!(result, Err(ClientDataLoaderError::ClientNotFound(_))));
}
