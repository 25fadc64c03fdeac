use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use solar_core::{
    Client, ConnectionType, DiscountType, LaborType, Month, MonthlyData, PaymentMethod,
    ProjectStatus,
};

use crate::config::ConfigOverrides;

// ─── CLI definition ──────────────────────────────────────────────────────────

/// Photovoltaic sizing and proposal calculator.
///
/// Keeps a client register, sizes a solar system against each client's
/// consumption and prints the commercial proposal.
#[derive(Debug, Parser)]
#[command(name = "solarcalc", version)]
pub struct Cli {
    /// Configuration file. Defaults to `solarcalc.toml` when present.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Database backend to use (`sqlite` or `memory`).
    #[arg(long, global = true)]
    pub backend: Option<String>,

    /// Database connection string.
    /// For SQLite this is a file path (e.g. `solarcalc.db`) or `:memory:`.
    #[arg(long, global = true)]
    pub db: Option<String>,

    /// Log level or filter directive; `RUST_LOG` takes precedence.
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    /// Also append log output to this file.
    #[arg(long, global = true)]
    pub log_file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    pub fn overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            backend: self.backend.clone(),
            connection_string: self.db.clone(),
            log_level: self.log_level.clone(),
            log_file: self.log_file.clone(),
        }
    }
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// List clients, most recently updated first.
    List {
        /// Only clients whose name or e-mail contains this text.
        #[arg(long)]
        search: Option<String>,
    },

    /// Register a new client.
    New {
        #[command(flatten)]
        fields: ClientFields,
    },

    /// Change fields of an existing client.
    Update {
        id: String,
        #[command(flatten)]
        fields: ClientFields,
    },

    /// Edit the equipment list of a client.
    Material {
        #[command(subcommand)]
        action: MaterialCommand,
    },

    /// Move a client to another pipeline stage.
    Status {
        id: String,
        /// lead, proposal_sent, proposal_accepted, approval, installation or completed.
        #[arg(value_parser = parse_status)]
        status: ProjectStatus,
    },

    /// Print the proposal for a client.
    Report { id: String },

    /// Size a system from a client JSON file without touching the database.
    Calc {
        #[arg(long)]
        file: PathBuf,

        /// Print the raw calculation result as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Delete a client.
    Delete { id: String },

    /// Show or change the company settings.
    Settings {
        /// Name printed on proposals; an empty value restores the default.
        #[arg(long)]
        company_name: Option<String>,
    },
}

#[derive(Debug, Subcommand)]
pub enum MaterialCommand {
    /// Append an equipment line.
    Add {
        id: String,
        #[arg(long)]
        model: String,
        #[arg(long, default_value = "-")]
        brand: String,
        #[arg(long, default_value_t = 1.0)]
        quantity: f64,
        #[arg(long, default_value = "unid")]
        unit: String,
    },

    /// Remove an equipment line by its id.
    Remove { id: String, material_id: String },
}

/// Client fields settable from the command line. Omitted flags leave the
/// field unchanged.
///
/// Monthly series accept one value for every month (`500`), twelve
/// comma-separated values from January (`500,480,...`), or named months
/// (`jan=500,jul=420`), which only change the months listed.
#[derive(Debug, Clone, Default, Args)]
pub struct ClientFields {
    #[arg(long)]
    pub name: Option<String>,
    #[arg(long)]
    pub cpf: Option<String>,
    #[arg(long)]
    pub email: Option<String>,
    #[arg(long)]
    pub phone: Option<String>,

    #[arg(long)]
    pub street: Option<String>,
    #[arg(long)]
    pub number: Option<String>,
    #[arg(long)]
    pub neighborhood: Option<String>,
    #[arg(long)]
    pub zip: Option<String>,
    #[arg(long)]
    pub city: Option<String>,
    #[arg(long)]
    pub state: Option<String>,

    /// Monthly consumption in kWh.
    #[arg(long, value_parser = parse_monthly)]
    pub consumption: Option<MonthlyValues>,
    /// Daily irradiation in kWh/m²/day, per month.
    #[arg(long, value_parser = parse_monthly)]
    pub irradiation: Option<MonthlyValues>,
    #[arg(long)]
    pub panel_power_wp: Option<f64>,
    #[arg(long)]
    pub system_efficiency: Option<f64>,

    #[arg(long)]
    pub kwh_price: Option<f64>,
    #[arg(long)]
    pub kit_price: Option<f64>,
    /// fixed or percent.
    #[arg(long, value_parser = parse_labor_type)]
    pub labor_type: Option<LaborType>,
    #[arg(long)]
    pub labor_price: Option<f64>,
    #[arg(long)]
    pub labor_percent: Option<f64>,
    #[arg(long)]
    pub extra_materials: Option<f64>,
    /// monofasico, bifasico or trifasico.
    #[arg(long, value_parser = parse_connection_type)]
    pub connection_type: Option<ConnectionType>,

    /// fixed or percent.
    #[arg(long, value_parser = parse_discount_type)]
    pub discount_type: Option<DiscountType>,
    #[arg(long)]
    pub discount: Option<f64>,
    #[arg(long)]
    pub discount_percent: Option<f64>,
    /// pix, boleto, credit_card, debit_card or financing.
    #[arg(long, value_parser = parse_payment_method)]
    pub payment_method: Option<PaymentMethod>,
    #[arg(long, value_parser = clap::value_parser!(u32).range(1..))]
    pub installments: Option<u32>,

    #[arg(long)]
    pub notes: Option<String>,
}

impl ClientFields {
    /// Copies every given field onto `client`.
    pub fn apply_to(
        &self,
        client: &mut Client,
    ) {
        fn set<T: Clone>(target: &mut T, value: &Option<T>) {
            if let Some(value) = value {
                *target = value.clone();
            }
        }

        set(&mut client.name, &self.name);
        set(&mut client.cpf, &self.cpf);
        set(&mut client.email, &self.email);
        set(&mut client.phone, &self.phone);

        set(&mut client.address.street, &self.street);
        set(&mut client.address.number, &self.number);
        set(&mut client.address.neighborhood, &self.neighborhood);
        set(&mut client.address.zip, &self.zip);
        set(&mut client.address.city, &self.city);
        set(&mut client.address.state, &self.state);

        if let Some(values) = &self.consumption {
            values.apply_to(&mut client.consumption);
        }
        if let Some(values) = &self.irradiation {
            values.apply_to(&mut client.irradiation);
        }
        set(&mut client.panel_power_wp, &self.panel_power_wp);
        set(&mut client.system_efficiency, &self.system_efficiency);

        set(&mut client.kwh_price, &self.kwh_price);
        set(&mut client.kit_price, &self.kit_price);
        set(&mut client.labor_type, &self.labor_type);
        set(&mut client.labor_price, &self.labor_price);
        set(&mut client.labor_percent, &self.labor_percent);
        set(&mut client.extra_materials, &self.extra_materials);
        set(&mut client.connection_type, &self.connection_type);

        set(&mut client.discount_type, &self.discount_type);
        set(&mut client.discount, &self.discount);
        set(&mut client.discount_percent, &self.discount_percent);
        set(&mut client.payment_method, &self.payment_method);
        set(&mut client.installments, &self.installments);

        set(&mut client.notes, &self.notes);
    }
}

/// A monthly series given on the command line.
#[derive(Debug, Clone, PartialEq)]
pub enum MonthlyValues {
    /// Replaces all twelve months.
    All(MonthlyData),
    /// Replaces only the listed months.
    Partial(Vec<(Month, f64)>),
}

impl MonthlyValues {
    pub fn apply_to(
        &self,
        target: &mut MonthlyData,
    ) {
        match self {
            Self::All(data) => *target = *data,
            Self::Partial(values) => {
                for &(month, value) in values {
                    target[month] = value;
                }
            }
        }
    }
}

// ─── value parsers ───────────────────────────────────────────────────────────

pub fn parse_monthly(s: &str) -> Result<MonthlyValues, String> {
    let parts: Vec<&str> = s.split(',').map(str::trim).collect();

    if parts.iter().any(|part| part.contains('=')) {
        let mut values = Vec::with_capacity(parts.len());
        for part in parts {
            let (month, value) = part
                .split_once('=')
                .ok_or_else(|| format!("expected month=value, got '{part}'"))?;
            let month = Month::parse(month).ok_or_else(|| format!("unknown month '{month}'"))?;
            values.push((month, parse_amount(value)?));
        }
        return Ok(MonthlyValues::Partial(values));
    }

    match parts.as_slice() {
        [single] => Ok(MonthlyValues::All(MonthlyData::splat(parse_amount(single)?))),
        _ if parts.len() == Month::ALL.len() => {
            let mut data = MonthlyData::ZERO;
            for (month, part) in Month::ALL.into_iter().zip(parts) {
                data[month] = parse_amount(part)?;
            }
            Ok(MonthlyValues::All(data))
        }
        _ => Err(format!("expected 1 or 12 values, got {}", parts.len())),
    }
}

fn parse_amount(s: &str) -> Result<f64, String> {
    let value: f64 = s
        .trim()
        .parse()
        .map_err(|_| format!("'{s}' is not a number"))?;
    if value.is_finite() && value >= 0.0 {
        Ok(value)
    } else {
        Err(format!("'{s}' must be zero or positive"))
    }
}

fn choices<T>(
    kind: &str,
    s: &str,
    all: &[&str],
) -> Result<T, String> {
    Err(format!("unknown {kind} '{s}'; expected one of: {}", all.join(", ")))
}

pub fn parse_status(s: &str) -> Result<ProjectStatus, String> {
    ProjectStatus::parse(s).map_or_else(
        || {
            let all: Vec<_> = ProjectStatus::ALL.iter().map(ProjectStatus::as_str).collect();
            choices("status", s, &all)
        },
        Ok,
    )
}

pub fn parse_connection_type(s: &str) -> Result<ConnectionType, String> {
    ConnectionType::parse(s).map_or_else(
        || {
            let all: Vec<_> = ConnectionType::ALL.iter().map(ConnectionType::as_str).collect();
            choices("connection type", s, &all)
        },
        Ok,
    )
}

pub fn parse_labor_type(s: &str) -> Result<LaborType, String> {
    LaborType::parse(s).map_or_else(|| choices("labor type", s, &["fixed", "percent"]), Ok)
}

pub fn parse_discount_type(s: &str) -> Result<DiscountType, String> {
    DiscountType::parse(s).map_or_else(|| choices("discount type", s, &["fixed", "percent"]), Ok)
}

pub fn parse_payment_method(s: &str) -> Result<PaymentMethod, String> {
    PaymentMethod::parse(s).map_or_else(
        || {
            choices(
                "payment method",
                s,
                &["pix", "boleto", "credit_card", "debit_card", "financing"],
            )
        },
        Ok,
    )
}
