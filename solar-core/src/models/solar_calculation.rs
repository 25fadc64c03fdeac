use serde::{Deserialize, Serialize};

use super::MonthlyData;

/// Investment, billing and payback figures derived for a client.
///
/// Monthly bill and savings figures are annual totals divided by twelve.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Financials {
    /// Labor cost actually used in the investment total.
    pub calculated_labor_cost: f64,
    pub total_investment: f64,
    pub monthly_bill_without_solar: f64,
    pub monthly_bill_with_solar: f64,
    pub monthly_savings: f64,
    /// Zero when either the investment or the savings is not positive.
    pub payback_months: f64,
    pub payback_years: f64,
    /// Undiscounted savings over 25 years minus the investment. May be negative.
    #[serde(rename = "totalSavings25Years")]
    pub total_savings_25_years: f64,
    /// Availability cost: the smallest monthly bill the utility will charge.
    pub minimum_bill_cost: f64,
}

/// Sized system, generation forecast and financial projection for one client.
///
/// Recomputed from scratch on every call; never updated in place.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SolarCalculationResult {
    pub avg_monthly_consumption: f64,
    pub avg_daily_consumption: f64,
    pub avg_irradiation: f64,
    #[serde(rename = "requiredSystemPowerKWp")]
    pub required_system_power_kwp: f64,
    pub panel_count_raw: f64,
    pub panel_count_rounded: f64,
    #[serde(rename = "totalSystemPowerKWp")]
    pub total_system_power_kwp: f64,
    /// Projected generation in kWh for each month.
    pub monthly_generation: MonthlyData,
    pub avg_monthly_generation: f64,
    pub financials: Financials,
}
