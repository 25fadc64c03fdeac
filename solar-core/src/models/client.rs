use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{ConnectionType, DiscountType, LaborType, MonthlyData, PaymentMethod, ProjectStatus};

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Address {
    pub street: String,
    pub number: String,
    pub neighborhood: String,
    pub zip: String,
    pub state: String,
    pub city: String,
}

/// One line of the equipment list attached to a proposal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MaterialItem {
    pub id: String,
    pub quantity: f64,
    pub unit: String,
    pub model: String,
    pub brand: String,
}

impl MaterialItem {
    /// A blank `1 unid` line with a fresh id.
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            quantity: 1.0,
            unit: "unid".to_string(),
            model: String::new(),
            brand: String::new(),
        }
    }
}

impl Default for MaterialItem {
    fn default() -> Self {
        Self::new()
    }
}

/// Sizing and tariff defaults applied to newly created clients.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientDefaults {
    pub panel_power_wp: f64,
    pub system_efficiency: f64,
    pub kwh_price: f64,
    pub labor_percent: f64,
    pub connection_type: ConnectionType,
}

impl Default for ClientDefaults {
    fn default() -> Self {
        Self {
            panel_power_wp: 550.0,
            system_efficiency: 0.75,
            kwh_price: 0.95,
            labor_percent: 20.0,
            connection_type: ConnectionType::Monofasico,
        }
    }
}

/// A prospective customer and everything needed to size and price their system.
///
/// Serialized with camelCase keys so stored documents keep the field names
/// used by the browser version of the tool.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Client {
    pub id: String,
    pub name: String,
    pub cpf: String,
    pub email: String,
    pub phone: String,
    pub address: Address,

    // Sizing inputs
    /// Monthly consumption in kWh.
    pub consumption: MonthlyData,
    /// Daily irradiation in kWh/m²/day, per month.
    pub irradiation: MonthlyData,
    /// Watts-peak of a single panel.
    pub panel_power_wp: f64,
    /// Fractional derate, usually 0.75 to 0.85.
    pub system_efficiency: f64,

    // Commercial terms
    pub kwh_price: f64,
    pub kit_price: f64,
    pub labor_type: LaborType,
    /// Used when `labor_type` is fixed.
    pub labor_price: f64,
    /// Percent of the kit price, used when `labor_type` is percent.
    pub labor_percent: f64,
    pub extra_materials: f64,
    pub connection_type: ConnectionType,

    // Negotiation
    pub proposal_value: f64,
    pub discount_type: DiscountType,
    /// Used when `discount_type` is fixed.
    pub discount: f64,
    /// Used when `discount_type` is percent.
    pub discount_percent: f64,
    pub final_value: f64,
    pub payment_method: PaymentMethod,
    pub installments: u32,

    pub materials: Vec<MaterialItem>,

    pub status: ProjectStatus,
    pub status_updated_at: DateTime<Utc>,

    pub notes: String,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Client {
    /// A blank client with the built-in defaults.
    pub fn new_empty(
        id: impl Into<String>,
        now: DateTime<Utc>,
    ) -> Self {
        Self::with_defaults(id, now, &ClientDefaults::default())
    }

    /// A blank client with a freshly generated id.
    pub fn create(now: DateTime<Utc>, defaults: &ClientDefaults) -> Self {
        Self::with_defaults(Uuid::new_v4().to_string(), now, defaults)
    }

    pub fn with_defaults(
        id: impl Into<String>,
        now: DateTime<Utc>,
        defaults: &ClientDefaults,
    ) -> Self {
        Self {
            id: id.into(),
            name: String::new(),
            cpf: String::new(),
            email: String::new(),
            phone: String::new(),
            address: Address::default(),
            consumption: MonthlyData::ZERO,
            irradiation: MonthlyData::ZERO,
            panel_power_wp: defaults.panel_power_wp,
            system_efficiency: defaults.system_efficiency,
            kwh_price: defaults.kwh_price,
            kit_price: 0.0,
            labor_type: LaborType::Fixed,
            labor_price: 0.0,
            labor_percent: defaults.labor_percent,
            extra_materials: 0.0,
            connection_type: defaults.connection_type,
            proposal_value: 0.0,
            discount_type: DiscountType::Fixed,
            discount: 0.0,
            discount_percent: 0.0,
            final_value: 0.0,
            payment_method: PaymentMethod::Unset,
            installments: 1,
            materials: Vec::new(),
            status: ProjectStatus::Lead,
            status_updated_at: now,
            notes: String::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Case-insensitive match of `term` against name or e-mail.
    /// An empty term matches everyone.
    pub fn matches_search(&self, term: &str) -> bool {
        let term = term.to_lowercase();
        self.name.to_lowercase().contains(&term) || self.email.to_lowercase().contains(&term)
    }
}
