use std::fs::{self, File};
use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use chrono::Utc;
use clap::Parser;
use solar_data::{ClientDataLoader, LegacyExportLoader, MonthlyCsvLoader, MonthlyProfile, parse_climatology};
use solar_db_sqlite::SqliteRepository;
use tracing_subscriber::EnvFilter;

/// Import client data into the SolarCalc database.
///
/// Monthly data is applied to an existing client (`--client`):
/// - `--monthly-csv`: CSV with `month,consumption_kwh,irradiation` columns
/// - `--nasa-json`: NASA POWER climatology response (irradiation only)
///
/// `--legacy-json` imports every client (and the company settings, when
/// present) from an export of the browser version.
#[derive(Parser, Debug)]
#[command(name = "solar-data-loader")]
#[command(version, about, long_about = None)]
struct Args {
    /// Database file, `:memory:`, or a full sqlx URL
    #[arg(short, long, default_value = "solarcalc.db")]
    database: String,

    /// Run database migrations before loading data
    #[arg(short, long, default_value_t = false)]
    migrate: bool,

    /// Id of the client that receives monthly data
    #[arg(short, long)]
    client: Option<String>,

    /// CSV file with monthly consumption and/or irradiation
    #[arg(long)]
    monthly_csv: Option<PathBuf>,

    /// NASA POWER climatology JSON with monthly irradiation
    #[arg(long)]
    nasa_json: Option<PathBuf>,

    /// Export of the browser version (client array or local-storage dump)
    #[arg(long)]
    legacy_json: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = Args::parse();

    if args.client.is_none() && (args.monthly_csv.is_some() || args.nasa_json.is_some()) {
        bail!("--monthly-csv and --nasa-json require --client");
    }

    let repo = SqliteRepository::new(&args.database)
        .await
        .with_context(|| format!("Failed to connect to database: {}", args.database))?;

    if args.migrate {
        println!("Running migrations...");
        repo.run_migrations()
            .await
            .context("Failed to run migrations")?;
        let upgraded = repo
            .upgrade_stored_clients()
            .await
            .context("Failed to upgrade stored clients")?;
        println!("Migrations complete ({upgraded} stored clients upgraded).");
    }

    if let Some(path) = &args.legacy_json {
        println!("Importing legacy export from: {}", path.display());
        let json = fs::read_to_string(path)
            .with_context(|| format!("Failed to read: {}", path.display()))?;
        let export = LegacyExportLoader::parse(&json, Utc::now())
            .with_context(|| format!("Failed to parse export: {}", path.display()))?;

        let written = ClientDataLoader::load_clients(&repo, &export.clients)
            .await
            .context("Failed to load clients into database")?;
        println!("Successfully imported {written} clients.");

        if let Some(settings) = &export.settings {
            ClientDataLoader::load_settings(&repo, settings)
                .await
                .context("Failed to save company settings")?;
            println!("Imported company settings for {}.", settings.display_name());
        }
    }

    if let Some(client_id) = &args.client {
        let mut profile = MonthlyProfile::default();

        if let Some(path) = &args.monthly_csv {
            let file = File::open(path).with_context(|| format!("Failed to open: {}", path.display()))?;
            profile = MonthlyCsvLoader::parse(file)
                .with_context(|| format!("Failed to parse CSV: {}", path.display()))?;
        }

        if let Some(path) = &args.nasa_json {
            let json = fs::read_to_string(path)
                .with_context(|| format!("Failed to read: {}", path.display()))?;
            let irradiation = parse_climatology(&json)
                .with_context(|| format!("Failed to parse NASA POWER response: {}", path.display()))?;
            profile.irradiation = Some(irradiation);
        }

        let client = ClientDataLoader::apply_monthly(&repo, client_id, &profile, Utc::now())
            .await
            .context("Failed to apply monthly data")?;

        println!(
            "Updated client {} ({}): consumption {}, irradiation {}.",
            client.id,
            client.name,
            if profile.consumption.is_some() { "replaced" } else { "unchanged" },
            if profile.irradiation.is_some() { "replaced" } else { "unchanged" },
        );
    }

    Ok(())
}
