use serde::{Deserialize, Serialize};

/// Phase configuration of the utility connection.
///
/// The connection type fixes the availability cost: a minimum number of kWh
/// billed every month regardless of how much energy is exchanged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionType {
    #[default]
    Monofasico,
    Bifasico,
    Trifasico,
}

impl ConnectionType {
    pub const ALL: [ConnectionType; 3] = [Self::Monofasico, Self::Bifasico, Self::Trifasico];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Monofasico => "monofasico",
            Self::Bifasico => "bifasico",
            Self::Trifasico => "trifasico",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "monofasico" => Some(Self::Monofasico),
            "bifasico" => Some(Self::Bifasico),
            "trifasico" => Some(Self::Trifasico),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Monofasico => "Monofásico",
            Self::Bifasico => "Bifásico",
            Self::Trifasico => "Trifásico",
        }
    }

    /// Minimum billable kWh per month for this connection.
    pub fn minimum_monthly_kwh(&self) -> f64 {
        match self {
            Self::Monofasico => 30.0,
            Self::Bifasico => 50.0,
            Self::Trifasico => 100.0,
        }
    }
}

/// How the labor cost of an installation is priced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LaborType {
    /// A flat amount (`laborPrice`).
    #[default]
    Fixed,
    /// A percentage of the kit price (`laborPercent`).
    Percent,
}

/// How a negotiated discount is expressed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DiscountType {
    #[default]
    Fixed,
    Percent,
}

impl LaborType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Fixed => "fixed",
            Self::Percent => "percent",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "fixed" => Some(Self::Fixed),
            "percent" => Some(Self::Percent),
            _ => None,
        }
    }
}

impl DiscountType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Fixed => "fixed",
            Self::Percent => "percent",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "fixed" => Some(Self::Fixed),
            "percent" => Some(Self::Percent),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PaymentMethod {
    #[serde(rename = "pix")]
    Pix,
    #[serde(rename = "boleto")]
    Boleto,
    #[serde(rename = "credit_card")]
    CreditCard,
    #[serde(rename = "debit_card")]
    DebitCard,
    #[serde(rename = "financing")]
    Financing,
    /// Not chosen yet.
    #[default]
    #[serde(rename = "")]
    Unset,
}

impl PaymentMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pix => "pix",
            Self::Boleto => "boleto",
            Self::CreditCard => "credit_card",
            Self::DebitCard => "debit_card",
            Self::Financing => "financing",
            Self::Unset => "",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pix" => Some(Self::Pix),
            "boleto" => Some(Self::Boleto),
            "credit_card" => Some(Self::CreditCard),
            "debit_card" => Some(Self::DebitCard),
            "financing" => Some(Self::Financing),
            "" => Some(Self::Unset),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Pix => "PIX",
            Self::Boleto => "Boleto",
            Self::CreditCard => "Cartão de Crédito",
            Self::DebitCard => "Cartão de Débito",
            Self::Financing => "Financiamento",
            Self::Unset => "-",
        }
    }
}
