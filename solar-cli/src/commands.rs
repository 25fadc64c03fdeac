//! Execution of parsed `solarcalc` subcommands against a repository.

use std::io::{self, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use solar_core::calculations::{calculate_solar_system, format_currency, recompute_derived_financials};
use solar_core::migration::{CURRENT_SCHEMA_VERSION, MigrationError, upgrade_client_document};
use solar_core::pipeline::{RegistrationError, change_status, follow_up_date, is_follow_up_due};
use solar_core::{Client, ClientDefaults, MaterialItem, ProjectStatus, RepositoryError, SolarRepository};
use thiserror::Error;
use tracing::{debug, info};

use crate::cli::{ClientFields, Command, MaterialCommand};
use crate::report::{CalculationSummary, Proposal};

#[derive(Debug, Error)]
pub enum CommandError {
    #[error("client '{0}' not found")]
    ClientNotFound(String),

    #[error("client '{client}' has no material '{material}'")]
    MaterialNotFound { client: String, material: String },

    #[error("cannot change status: {0}")]
    Registration(#[from] RegistrationError),

    #[error("cannot read {path}: {source}")]
    ReadFile {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("invalid client file {path}: {reason}")]
    InvalidClientFile { path: PathBuf, reason: String },

    #[error(transparent)]
    Repository(#[from] RepositoryError),

    #[error("output error: {0}")]
    Output(#[from] io::Error),
}

/// A repository plus the defaults new clients are created with.
pub struct Session<'a> {
    repo: &'a dyn SolarRepository,
    defaults: &'a ClientDefaults,
}

impl<'a> Session<'a> {
    pub fn new(
        repo: &'a dyn SolarRepository,
        defaults: &'a ClientDefaults,
    ) -> Self {
        Self { repo, defaults }
    }

    /// Runs `command`, writing its output to `out`. `now` stamps every change.
    pub async fn execute<W: Write>(
        &self,
        command: Command,
        now: DateTime<Utc>,
        out: &mut W,
    ) -> Result<(), CommandError> {
        match command {
            Command::List { search } => self.list(search.as_deref(), now, out).await,
            Command::New { fields } => self.create(&fields, now, out).await,
            Command::Update { id, fields } => self.update(&id, &fields, now, out).await,
            Command::Material { action } => self.material(action, now, out).await,
            Command::Status { id, status } => self.status(&id, status, now, out).await,
            Command::Report { id } => self.report(&id, now, out).await,
            Command::Calc { file, json } => calc(&file, json, now, out),
            Command::Delete { id } => self.delete(&id, out).await,
            Command::Settings { company_name } => self.settings(company_name, out).await,
        }
    }

    async fn list<W: Write>(
        &self,
        search: Option<&str>,
        now: DateTime<Utc>,
        out: &mut W,
    ) -> Result<(), CommandError> {
        let clients: Vec<Client> = self
            .repo
            .list_clients()
            .await?
            .into_iter()
            .filter(|client| search.is_none_or(|term| client.matches_search(term)))
            .collect();

        if clients.is_empty() {
            writeln!(out, "No clients found.")?;
            return Ok(());
        }

        writeln!(
            out,
            "{:<36}  {:<28}  {:<18}  {:>16}  {}",
            "ID", "Name", "Status", "Final value", "Updated"
        )?;
        for client in &clients {
            let follow_up = if is_follow_up_due(client, now) {
                "  follow-up due"
            } else {
                ""
            };
            writeln!(
                out,
                "{:<36}  {:<28}  {:<18}  {:>16}  {}{follow_up}",
                client.id,
                display_name(client),
                client.status.label(),
                format_currency(client.final_value),
                client.updated_at.format("%d/%m/%Y")
            )?;
        }
        Ok(())
    }

    async fn create<W: Write>(
        &self,
        fields: &ClientFields,
        now: DateTime<Utc>,
        out: &mut W,
    ) -> Result<(), CommandError> {
        let mut client = Client::create(now, self.defaults);
        fields.apply_to(&mut client);

        let client = self.save(client, now).await?;
        info!(client_id = %client.id, "client created");
        writeln!(out, "Created client {}", client.id)?;
        Ok(())
    }

    async fn update<W: Write>(
        &self,
        id: &str,
        fields: &ClientFields,
        now: DateTime<Utc>,
        out: &mut W,
    ) -> Result<(), CommandError> {
        let mut client = self.load(id).await?;
        fields.apply_to(&mut client);

        let client = self.save(client, now).await?;
        writeln!(
            out,
            "Updated client {} (final value {})",
            client.id,
            format_currency(client.final_value)
        )?;
        Ok(())
    }

    async fn material<W: Write>(
        &self,
        action: MaterialCommand,
        now: DateTime<Utc>,
        out: &mut W,
    ) -> Result<(), CommandError> {
        match action {
            MaterialCommand::Add {
                id,
                model,
                brand,
                quantity,
                unit,
            } => {
                let mut client = self.load(&id).await?;
                let item = MaterialItem {
                    quantity,
                    unit,
                    model,
                    brand,
                    ..MaterialItem::new()
                };
                let material_id = item.id.clone();
                client.materials.push(item);

                self.save(client, now).await?;
                writeln!(out, "Added material {material_id}")?;
            }
            MaterialCommand::Remove { id, material_id } => {
                let mut client = self.load(&id).await?;
                let position = client
                    .materials
                    .iter()
                    .position(|item| item.id == material_id)
                    .ok_or_else(|| CommandError::MaterialNotFound {
                        client: id.clone(),
                        material: material_id.clone(),
                    })?;
                client.materials.remove(position);

                self.save(client, now).await?;
                writeln!(out, "Removed material {material_id}")?;
            }
        }
        Ok(())
    }

    async fn status<W: Write>(
        &self,
        id: &str,
        status: ProjectStatus,
        now: DateTime<Utc>,
        out: &mut W,
    ) -> Result<(), CommandError> {
        let client = self.load(id).await?;
        let client = self.save(change_status(&client, status, now)?, now).await?;

        writeln!(out, "{}: {}", display_name(&client), client.status.label())?;
        if let Some(date) = follow_up_date(&client) {
            writeln!(out, "Follow up on {}", date.format("%d/%m/%Y"))?;
        }
        Ok(())
    }

    async fn report<W: Write>(
        &self,
        id: &str,
        now: DateTime<Utc>,
        out: &mut W,
    ) -> Result<(), CommandError> {
        let client = self.load(id).await?;
        let settings = self.repo.get_settings().await?;
        let results = calculate_solar_system(&client);

        write!(out, "{}", Proposal::new(&client, &results, &settings, now))?;
        Ok(())
    }

    async fn delete<W: Write>(
        &self,
        id: &str,
        out: &mut W,
    ) -> Result<(), CommandError> {
        self.repo.delete_client(id).await.map_err(|err| match err {
            RepositoryError::NotFound => CommandError::ClientNotFound(id.to_string()),
            other => other.into(),
        })?;

        info!(client_id = %id, "client deleted");
        writeln!(out, "Deleted client {id}")?;
        Ok(())
    }

    async fn settings<W: Write>(
        &self,
        company_name: Option<String>,
        out: &mut W,
    ) -> Result<(), CommandError> {
        let mut settings = self.repo.get_settings().await?;

        if let Some(name) = company_name {
            let name = name.trim();
            settings.company_name = (!name.is_empty()).then(|| name.to_string());
            self.repo.save_settings(&settings).await?;
            debug!(company_name = ?settings.company_name, "settings saved");
        }

        writeln!(out, "Company name: {}", settings.display_name())?;
        writeln!(
            out,
            "Logo:         {}",
            if settings.logo.is_some() { "set" } else { "none" }
        )?;
        Ok(())
    }

    async fn load(
        &self,
        id: &str,
    ) -> Result<Client, CommandError> {
        self.repo.get_client(id).await.map_err(|err| match err {
            RepositoryError::NotFound => CommandError::ClientNotFound(id.to_string()),
            other => other.into(),
        })
    }

    /// Stamps, recomputes the derived proposal values and stores `client`.
    async fn save(
        &self,
        mut client: Client,
        now: DateTime<Utc>,
    ) -> Result<Client, CommandError> {
        client.updated_at = now;
        let client = recompute_derived_financials(&client, &calculate_solar_system(&client));
        self.repo.upsert_client(&client).await?;
        Ok(client)
    }
}

/// Sizes the client stored in a JSON file. Older or partial records are
/// upgraded first, as on import.
fn calc<W: Write>(
    path: &Path,
    json: bool,
    now: DateTime<Utc>,
    out: &mut W,
) -> Result<(), CommandError> {
    let content = std::fs::read_to_string(path).map_err(|source| CommandError::ReadFile {
        path: path.to_path_buf(),
        source,
    })?;
    let client = parse_client_file(&content, now).map_err(|reason| {
        CommandError::InvalidClientFile {
            path: path.to_path_buf(),
            reason,
        }
    })?;

    let results = calculate_solar_system(&client);
    if json {
        let body = serde_json::to_string_pretty(&results).map_err(io::Error::other)?;
        writeln!(out, "{body}")?;
    } else {
        let client = recompute_derived_financials(&client, &results);
        write!(out, "{}", CalculationSummary::new(&client, &results))?;
    }
    Ok(())
}

fn parse_client_file(
    content: &str,
    now: DateTime<Utc>,
) -> Result<Client, String> {
    let value: serde_json::Value = serde_json::from_str(content).map_err(|e| e.to_string())?;
    upgrade_client_document(value, CURRENT_SCHEMA_VERSION, now).map_err(|e| match e {
        MigrationError::MissingId => "the client has no id".to_string(),
        other => other.to_string(),
    })
}

fn display_name(client: &Client) -> &str {
    if client.name.trim().is_empty() {
        "(unnamed)"
    } else {
        &client.name
    }
}
