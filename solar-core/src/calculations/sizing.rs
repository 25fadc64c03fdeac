//! Photovoltaic sizing, generation forecast and payback projection.
//!
//! This module maps a [`Client`] snapshot to a [`SolarCalculationResult`]. The
//! calculation is pure: it performs no I/O, keeps no state and never fails.
//! Degenerate input yields degenerate but defined numbers (zero, `∞` or
//! `NaN`); validating plausible ranges is the caller's job.
//!
//! # Calculation Steps
//!
//! | Step | Description |
//! |------|-------------|
//! | 1    | Average monthly consumption (total ÷ 12) and daily consumption (÷ 30) |
//! | 2    | Average irradiation (total ÷ 12), floored to 1.0 for sizing when zero |
//! | 3    | Required power (kWp) = daily consumption ÷ (irradiation × efficiency) |
//! | 4    | Panel count = required ÷ panel kW (0.550 when unset), rounded up |
//! | 5    | Generation per month = installed kWp × irradiation × 30 × efficiency |
//! | 6    | Investment = kit + labor (fixed or % of kit) + extra materials |
//! | 7    | Minimum billable kWh per month from the connection type |
//! | 8    | Annual bill without solar = annual consumption × price |
//! | 9    | Savings = min(generation, consumption − 12 × minimum kWh) × price |
//! | 10   | Annual bill with solar = bill − savings, never below 12 × minimum cost |
//! | 11   | Monthly figures = annual figures ÷ 12 |
//! | 12   | Payback = investment ÷ monthly savings (0 unless both positive) |
//! | 13   | 25-year savings = monthly savings × 300 − investment |
//!
//! # Example
//!
//! ```
//! use chrono::Utc;
//! use solar_core::calculations::calculate_solar_system;
//! use solar_core::{Client, MonthlyData};
//!
//! let mut client = Client::new_empty("demo", Utc::now());
//! client.consumption = MonthlyData::splat(300.0);
//! client.irradiation = MonthlyData::splat(5.0);
//! client.kit_price = 15000.0;
//! client.labor_price = 3000.0;
//!
//! let result = calculate_solar_system(&client);
//!
//! assert_eq!(result.panel_count_rounded, 5.0);
//! assert_eq!(result.financials.total_investment, 18000.0);
//! ```

use tracing::{debug, warn};

use crate::calculations::common::{is_falsy, or_zero};
use crate::models::{
    Client, ConnectionType, Financials, LaborType, MonthlyData, SolarCalculationResult,
};

/// Days assumed in every month, for both consumption and generation.
pub const DAYS_PER_MONTH: f64 = 30.0;

/// Irradiation divisor used when no irradiation data has been entered.
pub const IRRADIATION_FLOOR: f64 = 1.0;

/// Panel power (kW) assumed when the client has none.
pub const FALLBACK_PANEL_POWER_KW: f64 = 0.550;

/// Horizon of the long-term savings projection.
pub const PROJECTION_YEARS: f64 = 25.0;

const MONTHS_PER_YEAR: f64 = 12.0;

/// Calculator for a single client snapshot.
///
/// The snapshot is borrowed read-only; every call to
/// [`SolarCalculator::calculate`] recomputes everything from it.
#[derive(Debug, Clone, Copy)]
pub struct SolarCalculator<'a> {
    client: &'a Client,
}

impl<'a> SolarCalculator<'a> {
    pub fn new(client: &'a Client) -> Self {
        Self { client }
    }

    /// Runs every calculation step in order and returns the result snapshot.
    pub fn calculate(&self) -> SolarCalculationResult {
        let client = self.client;

        // Consumption
        let total_consumption = client.consumption.total();
        let avg_monthly_consumption = total_consumption / MONTHS_PER_YEAR;
        let avg_daily_consumption = avg_monthly_consumption / DAYS_PER_MONTH;

        // Irradiation
        let avg_irradiation = client.irradiation.average();
        let sizing_irradiation = self.sizing_irradiation(avg_irradiation);

        // Required power and panels
        let required_system_power_kwp =
            avg_daily_consumption / (sizing_irradiation * client.system_efficiency);
        let panel_power_kw = self.panel_power_kw();
        let panel_count_raw = required_system_power_kwp / panel_power_kw;
        let panel_count_rounded = panel_count_raw.ceil();
        let total_system_power_kwp = panel_count_rounded * panel_power_kw;

        // Generation
        let monthly_generation = self.monthly_generation(total_system_power_kwp);
        let total_generation = monthly_generation.total();
        let avg_monthly_generation = total_generation / MONTHS_PER_YEAR;

        let financials = self.financials(total_consumption, total_generation);

        debug!(
            client_id = %client.id,
            required_kwp = required_system_power_kwp,
            panels = panel_count_rounded,
            installed_kwp = total_system_power_kwp,
            annual_generation_kwh = total_generation,
            "sized photovoltaic system"
        );

        SolarCalculationResult {
            avg_monthly_consumption,
            avg_daily_consumption,
            avg_irradiation,
            required_system_power_kwp,
            panel_count_raw,
            panel_count_rounded,
            total_system_power_kwp,
            monthly_generation,
            avg_monthly_generation,
            financials,
        }
    }

    /// Average irradiation to size with; zero (or `NaN`) means no data yet.
    fn sizing_irradiation(
        &self,
        avg_irradiation: f64,
    ) -> f64 {
        if is_falsy(avg_irradiation) {
            warn!(
                client_id = %self.client.id,
                "no irradiation data, sizing against a floor of {IRRADIATION_FLOOR}"
            );
            IRRADIATION_FLOOR
        } else {
            avg_irradiation
        }
    }

    /// Power of one panel in kW, falling back to 550 W when unset.
    fn panel_power_kw(&self) -> f64 {
        let panel_power_kw = self.client.panel_power_wp / 1000.0;
        if is_falsy(panel_power_kw) {
            FALLBACK_PANEL_POWER_KW
        } else {
            panel_power_kw
        }
    }

    /// Expected generation for each month of the installed system.
    fn monthly_generation(
        &self,
        total_system_power_kwp: f64,
    ) -> MonthlyData {
        let efficiency = self.client.system_efficiency;
        MonthlyData::from_fn(|month| {
            total_system_power_kwp * self.client.irradiation[month] * DAYS_PER_MONTH * efficiency
        })
    }

    /// Labor cost: a share of the kit price or a flat amount.
    fn labor_cost(
        &self,
        kit_price: f64,
    ) -> f64 {
        match self.client.labor_type {
            LaborType::Percent => kit_price * (or_zero(self.client.labor_percent) / 100.0),
            LaborType::Fixed => or_zero(self.client.labor_price),
        }
    }

    fn financials(
        &self,
        total_consumption: f64,
        total_generation: f64,
    ) -> Financials {
        let client = self.client;
        let kwh_price = or_zero(client.kwh_price);

        // Investment
        let kit_price = or_zero(client.kit_price);
        let extra_materials = or_zero(client.extra_materials);
        let calculated_labor_cost = self.labor_cost(kit_price);
        let total_investment = kit_price + calculated_labor_cost + extra_materials;

        // Bills
        let annual_bill_without_solar = total_consumption * kwh_price;
        let minimum_monthly_kwh = minimum_monthly_kwh(client.connection_type);
        let minimum_bill_cost = minimum_monthly_kwh * kwh_price;
        let annual_minimum_cost = minimum_bill_cost * MONTHS_PER_YEAR;

        let annual_savings = annual_savings(
            total_consumption,
            total_generation,
            minimum_monthly_kwh,
            kwh_price,
        );
        let annual_bill_with_solar = if annual_savings.is_nan() {
            f64::NAN
        } else {
            (annual_bill_without_solar - annual_savings).max(annual_minimum_cost)
        };

        let monthly_bill_without_solar = annual_bill_without_solar / MONTHS_PER_YEAR;
        let monthly_bill_with_solar = annual_bill_with_solar / MONTHS_PER_YEAR;
        let monthly_savings = annual_savings / MONTHS_PER_YEAR;

        // Payback
        let payback_months = payback_months(total_investment, monthly_savings);
        let payback_years = payback_months / MONTHS_PER_YEAR;
        let total_savings_25_years =
            (monthly_savings * MONTHS_PER_YEAR * PROJECTION_YEARS) - total_investment;

        Financials {
            calculated_labor_cost,
            total_investment,
            monthly_bill_without_solar,
            monthly_bill_with_solar,
            monthly_savings,
            payback_months,
            payback_years,
            total_savings_25_years,
            minimum_bill_cost,
        }
    }
}

/// Sizes the system and projects finances for `client`.
///
/// Shorthand for `SolarCalculator::new(client).calculate()`.
pub fn calculate_solar_system(client: &Client) -> SolarCalculationResult {
    SolarCalculator::new(client).calculate()
}

/// Minimum billable kWh per month for the connection.
pub fn minimum_monthly_kwh(connection_type: ConnectionType) -> f64 {
    connection_type.minimum_monthly_kwh()
}

/// Yearly savings under the availability-cost rule.
///
/// Credits cannot offset the minimum kWh billed each month, so only
/// consumption above twelve monthly minimums is offsettable, and only up to
/// what was actually generated. The floor is applied to the annual total,
/// not month by month. NaN generation yields NaN savings.
pub fn annual_savings(
    total_consumption: f64,
    total_generation: f64,
    minimum_monthly_kwh: f64,
    kwh_price: f64,
) -> f64 {
    if total_generation.is_nan() {
        return f64::NAN;
    }
    let offsettable_consumption =
        (total_consumption - MONTHS_PER_YEAR * minimum_monthly_kwh).max(0.0);
    let effective_saved_kwh = total_generation.min(offsettable_consumption);
    effective_saved_kwh * kwh_price
}

/// Months until savings repay the investment; zero unless both are positive.
pub fn payback_months(
    total_investment: f64,
    monthly_savings: f64,
) -> f64 {
    if total_investment > 0.0 && monthly_savings > 0.0 {
        total_investment / monthly_savings
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};
    use float_cmp::assert_approx_eq;
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::models::Month;

    fn empty_client() -> Client {
        Client::new_empty("test", Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap())
    }

    /// 300 kWh/month, 5.0 kWh/m²/day, 550 W panels at 75 %, R$ 0.95/kWh,
    /// monofásico, kit 15 000 with 3 000 fixed labor.
    fn reference_client() -> Client {
        let mut client = empty_client();
        client.consumption = MonthlyData::splat(300.0);
        client.irradiation = MonthlyData::splat(5.0);
        client.panel_power_wp = 550.0;
        client.system_efficiency = 0.75;
        client.kwh_price = 0.95;
        client.connection_type = ConnectionType::Monofasico;
        client.kit_price = 15000.0;
        client.labor_type = LaborType::Fixed;
        client.labor_price = 3000.0;
        client.extra_materials = 0.0;
        client
    }

    // =========================================================================
    // End-to-end scenario
    // =========================================================================

    #[test]
    fn reference_scenario_sizing() {
        let result = calculate_solar_system(&reference_client());

        assert_approx_eq!(f64, result.avg_monthly_consumption, 300.0);
        assert_approx_eq!(f64, result.avg_daily_consumption, 10.0);
        assert_approx_eq!(f64, result.avg_irradiation, 5.0);
        assert_approx_eq!(f64, result.required_system_power_kwp, 10.0 / 3.75, epsilon = 1e-12);
        assert_approx_eq!(f64, result.panel_count_raw, 4.848_484_848_484_849, epsilon = 1e-9);
        assert_eq!(result.panel_count_rounded, 5.0);
        assert_approx_eq!(f64, result.total_system_power_kwp, 2.75, epsilon = 1e-12);
    }

    #[test]
    fn reference_scenario_generation() {
        let result = calculate_solar_system(&reference_client());

        for (_, generation) in result.monthly_generation.iter() {
            assert_approx_eq!(f64, generation, 309.375, epsilon = 1e-9);
        }
        assert_approx_eq!(f64, result.avg_monthly_generation, 309.375, epsilon = 1e-9);
    }

    #[test]
    fn reference_scenario_financials() {
        let financials = calculate_solar_system(&reference_client()).financials;

        // Offsettable: 3600 - 360 = 3240 kWh, below the 3712.5 kWh generated.
        let annual_savings = 3240.0 * 0.95;

        assert_eq!(financials.calculated_labor_cost, 3000.0);
        assert_eq!(financials.total_investment, 18000.0);
        assert_approx_eq!(f64, financials.monthly_bill_without_solar, 285.0, epsilon = 1e-9);
        assert_approx_eq!(f64, financials.minimum_bill_cost, 28.5, epsilon = 1e-9);
        assert_approx_eq!(f64, financials.monthly_savings, annual_savings / 12.0, epsilon = 1e-9);
        assert_approx_eq!(f64, financials.monthly_bill_with_solar, 28.5, epsilon = 1e-9);
        assert_approx_eq!(
            f64,
            financials.payback_months,
            18000.0 / (annual_savings / 12.0),
            epsilon = 1e-9
        );
        assert_approx_eq!(
            f64,
            financials.payback_years,
            financials.payback_months / 12.0,
            epsilon = 1e-12
        );
        assert_approx_eq!(
            f64,
            financials.total_savings_25_years,
            annual_savings * 25.0 - 18000.0,
            epsilon = 1e-6
        );
    }

    // =========================================================================
    // Degenerate input
    // =========================================================================

    #[test]
    fn all_zero_input_yields_zero_and_no_payback() {
        let mut client = empty_client();
        client.kit_price = 0.0;

        let result = calculate_solar_system(&client);

        assert_eq!(result.avg_irradiation, 0.0);
        assert_eq!(result.required_system_power_kwp, 0.0);
        assert_eq!(result.panel_count_raw, 0.0);
        assert_eq!(result.panel_count_rounded, 0.0);
        assert_eq!(result.total_system_power_kwp, 0.0);
        assert_eq!(result.monthly_generation, MonthlyData::ZERO);
        assert_eq!(result.avg_monthly_generation, 0.0);
        assert_eq!(result.financials.payback_months, 0.0);
        assert_eq!(result.financials.payback_years, 0.0);
    }

    #[test]
    fn zero_irradiation_sizes_against_floor() {
        let mut client = reference_client();
        client.irradiation = MonthlyData::ZERO;

        let result = calculate_solar_system(&client);

        // 10 kWh/day ÷ (1.0 × 0.75)
        assert_approx_eq!(f64, result.required_system_power_kwp, 10.0 / 0.75, epsilon = 1e-12);
        assert_eq!(result.avg_irradiation, 0.0);
        assert_eq!(result.monthly_generation, MonthlyData::ZERO);
    }

    #[test]
    fn payback_is_zero_when_no_investment() {
        let mut client = reference_client();
        client.kit_price = 0.0;
        client.labor_price = 0.0;

        let financials = calculate_solar_system(&client).financials;

        assert_eq!(financials.total_investment, 0.0);
        assert_eq!(financials.payback_months, 0.0);
        assert!(financials.monthly_savings > 0.0);
    }

    #[test]
    fn zero_efficiency_does_not_panic() {
        let mut client = reference_client();
        client.system_efficiency = 0.0;

        let result = calculate_solar_system(&client);

        assert!(result.required_system_power_kwp.is_infinite());
        assert!(result.panel_count_rounded.is_infinite());
        assert!(result.avg_monthly_generation.is_nan());
        assert!(result.financials.monthly_savings.is_nan());
        assert!(result.financials.monthly_bill_with_solar.is_nan());
        assert_eq!(result.financials.payback_months, 0.0);
    }

    #[test]
    fn nan_generation_is_not_counted_as_savings() {
        assert!(annual_savings(3600.0, f64::NAN, 30.0, 0.95).is_nan());
        assert_approx_eq!(f64, annual_savings(3600.0, 3000.0, 30.0, 0.95), 2850.0, epsilon = 1e-9);
    }

    #[test]
    fn nan_prices_are_treated_as_zero() {
        let mut client = reference_client();
        client.kwh_price = f64::NAN;
        client.labor_price = f64::NAN;

        let financials = calculate_solar_system(&client).financials;

        assert_eq!(financials.calculated_labor_cost, 0.0);
        assert_eq!(financials.monthly_bill_without_solar, 0.0);
        assert_eq!(financials.monthly_savings, 0.0);
        assert_eq!(financials.payback_months, 0.0);
    }

    // =========================================================================
    // Panels
    // =========================================================================

    #[test]
    fn missing_panel_power_falls_back_to_550_watts() {
        let mut client = reference_client();
        client.panel_power_wp = 0.0;

        let result = calculate_solar_system(&client);

        assert_eq!(result.panel_count_rounded, 5.0);
        assert_approx_eq!(f64, result.total_system_power_kwp, 2.75, epsilon = 1e-12);
    }

    #[test]
    fn panel_count_is_ceiling_of_raw_count() {
        // 10 kWh/day at 5.0 × 0.8 needs 2.5 kWp; 250 W panels make exactly 10.
        let mut client = reference_client();
        client.system_efficiency = 0.8;
        client.panel_power_wp = 250.0;

        let exact = calculate_solar_system(&client);
        assert_approx_eq!(f64, exact.panel_count_raw, 10.0, ulps = 2);
        assert_eq!(exact.panel_count_rounded, exact.panel_count_raw.ceil());

        client.consumption = MonthlyData::splat(300.0 * 1.001);
        let over = calculate_solar_system(&client);
        assert_approx_eq!(f64, over.panel_count_raw, 10.01, epsilon = 1e-9);
        assert_eq!(over.panel_count_rounded, 11.0);
    }

    #[test]
    fn installed_power_covers_required_power() {
        for consumption in [50.0, 137.0, 300.0, 812.5, 2400.0] {
            for panel_power_wp in [0.0, 330.0, 550.0, 610.0] {
                let mut client = reference_client();
                client.consumption = MonthlyData::splat(consumption);
                client.panel_power_wp = panel_power_wp;

                let result = calculate_solar_system(&client);

                assert!(
                    result.total_system_power_kwp >= result.required_system_power_kwp,
                    "{consumption} kWh with {panel_power_wp} Wp: {result:#?}"
                );
            }
        }
    }

    #[test]
    fn generation_follows_monthly_irradiation() {
        let mut client = reference_client();
        client.irradiation = MonthlyData::from_fn(|m| if m == Month::Jun { 3.0 } else { 6.0 });

        let result = calculate_solar_system(&client);
        let kwp = result.total_system_power_kwp;

        assert_approx_eq!(f64, result.monthly_generation[Month::Jun], kwp * 3.0 * 30.0 * 0.75);
        assert_approx_eq!(f64, result.monthly_generation[Month::Dec], kwp * 6.0 * 30.0 * 0.75);
    }

    // =========================================================================
    // Labor and investment
    // =========================================================================

    #[test]
    fn percent_labor_is_share_of_kit_price() {
        let mut client = reference_client();
        client.labor_type = LaborType::Percent;
        client.kit_price = 10000.0;
        client.labor_percent = 20.0;
        client.labor_price = 999.0;
        client.extra_materials = 500.0;

        let financials = calculate_solar_system(&client).financials;

        assert_eq!(financials.calculated_labor_cost, 2000.0);
        assert_eq!(financials.total_investment, 12500.0);
    }

    #[test]
    fn fixed_labor_ignores_percent() {
        let mut client = reference_client();
        client.labor_type = LaborType::Fixed;
        client.labor_percent = 50.0;

        let financials = calculate_solar_system(&client).financials;

        assert_eq!(financials.calculated_labor_cost, 3000.0);
    }

    // =========================================================================
    // Availability cost and net metering
    // =========================================================================

    #[test]
    fn bill_never_drops_below_availability_floor() {
        let mut client = reference_client();
        client.kwh_price = 1.0;
        client.consumption = MonthlyData::splat(30.0); // 360 kWh/year, exactly the floor
        client.irradiation = MonthlyData::splat(8.0);
        client.panel_power_wp = 700.0;

        let financials = calculate_solar_system(&client).financials;

        assert_approx_eq!(f64, financials.monthly_bill_with_solar * 12.0, 360.0, epsilon = 1e-9);
        assert_eq!(financials.monthly_savings, 0.0);
        assert_eq!(financials.payback_months, 0.0);
    }

    #[test]
    fn minimum_bill_depends_on_connection_type() {
        let mut client = reference_client();
        client.kwh_price = 1.0;

        for (connection, expected) in [
            (ConnectionType::Monofasico, 30.0),
            (ConnectionType::Bifasico, 50.0),
            (ConnectionType::Trifasico, 100.0),
        ] {
            client.connection_type = connection;
            let financials = calculate_solar_system(&client).financials;
            assert_eq!(financials.minimum_bill_cost, expected);
        }
    }

    #[test]
    fn savings_capped_by_generation() {
        // 3600 kWh consumed, 360 kWh floor, 1000 kWh generated
        let savings = annual_savings(3600.0, 1000.0, 30.0, 1.0);

        assert_eq!(savings, 1000.0);
    }

    #[test]
    fn savings_capped_by_offsettable_consumption() {
        let savings = annual_savings(3600.0, 10_000.0, 100.0, 1.0);

        assert_eq!(savings, 2400.0);
    }

    #[test]
    fn consumption_below_floor_offsets_nothing() {
        assert_eq!(annual_savings(200.0, 5000.0, 30.0, 0.95), 0.0);
    }

    #[test]
    fn long_term_savings_may_be_negative() {
        let mut client = reference_client();
        client.kit_price = 1_000_000.0;

        let financials = calculate_solar_system(&client).financials;

        assert!(financials.total_savings_25_years < 0.0);
    }

    #[test]
    fn calculation_does_not_mutate_client() {
        let client = reference_client();
        let before = client.clone();

        let first = calculate_solar_system(&client);
        let second = SolarCalculator::new(&client).calculate();

        assert_eq!(client, before);
        assert_eq!(first, second);
    }
}
