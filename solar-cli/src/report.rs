//! Plain-text proposal printed by `solarcalc report` and `solarcalc calc`.

use std::fmt;

use chrono::{DateTime, Utc};
use solar_core::calculations::{
    discount_amount, format_currency, format_number, format_number_2,
    recompute_derived_financials,
};
use solar_core::pipeline::{follow_up_date, is_follow_up_due};
use solar_core::{Client, CompanySettings, PaymentMethod, SolarCalculationResult};

const DATE_FORMAT: &str = "%d/%m/%Y";

/// Full commercial proposal for one client.
pub struct Proposal<'a> {
    client: Client,
    results: &'a SolarCalculationResult,
    settings: &'a CompanySettings,
    now: DateTime<Utc>,
}

impl<'a> Proposal<'a> {
    /// Proposal and final values are recomputed from `results`, so the
    /// printed figures always agree with each other.
    pub fn new(
        client: &Client,
        results: &'a SolarCalculationResult,
        settings: &'a CompanySettings,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            client: recompute_derived_financials(client, results),
            results,
            settings,
            now,
        }
    }
}

impl fmt::Display for Proposal<'_> {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        let client = &self.client;
        let address = &client.address;

        writeln!(f, "{}", self.settings.display_name())?;
        writeln!(f, "Photovoltaic system proposal")?;
        writeln!(f)?;

        section(f, "Client")?;
        writeln!(f, "Name:               {}", client.name)?;
        writeln!(f, "CPF:                {}", client.cpf)?;
        writeln!(f, "Contact:            {} / {}", client.phone, client.email)?;
        writeln!(
            f,
            "Address:            {}, {} - {}, {}/{} {}",
            address.street,
            address.number,
            address.neighborhood,
            address.city,
            address.state,
            address.zip
        )?;
        writeln!(
            f,
            "Status:             {} (since {})",
            client.status.label(),
            client.status_updated_at.format(DATE_FORMAT)
        )?;
        if let Some(date) = follow_up_date(client) {
            let due = if is_follow_up_due(client, self.now) {
                " (due)"
            } else {
                ""
            };
            writeln!(f, "Follow-up:          {}{due}", date.format(DATE_FORMAT))?;
        }
        writeln!(f)?;

        system_section(f, client, self.results)?;
        writeln!(f)?;

        financial_section(f, client, self.results)?;
        writeln!(f)?;

        generation_section(f, client, self.results)?;
        writeln!(f)?;

        section(f, "Equipment")?;
        if client.materials.is_empty() {
            writeln!(f, "No equipment listed.")?;
        } else {
            writeln!(f, "{:>8}  {:<6}  {:<40}  {}", "Qty", "Unit", "Model", "Brand")?;
            for item in &client.materials {
                writeln!(
                    f,
                    "{:>8}  {:<6}  {:<40}  {}",
                    format_number(item.quantity, 0),
                    item.unit,
                    item.model,
                    item.brand
                )?;
            }
        }

        if !client.notes.trim().is_empty() {
            writeln!(f)?;
            section(f, "Notes")?;
            writeln!(f, "{}", client.notes.trim())?;
        }

        Ok(())
    }
}

/// Sizing and payback of a client that is not stored anywhere.
pub struct CalculationSummary<'a> {
    client: &'a Client,
    results: &'a SolarCalculationResult,
}

impl<'a> CalculationSummary<'a> {
    pub fn new(
        client: &'a Client,
        results: &'a SolarCalculationResult,
    ) -> Self {
        Self { client, results }
    }
}

impl fmt::Display for CalculationSummary<'_> {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        system_section(f, self.client, self.results)?;
        writeln!(f)?;
        financial_section(f, self.client, self.results)?;
        writeln!(f)?;
        generation_section(f, self.client, self.results)
    }
}

fn section(
    f: &mut fmt::Formatter<'_>,
    title: &str,
) -> fmt::Result {
    writeln!(f, "{title}")?;
    writeln!(f, "{}", "-".repeat(title.chars().count()))
}

fn system_section(
    f: &mut fmt::Formatter<'_>,
    client: &Client,
    results: &SolarCalculationResult,
) -> fmt::Result {
    section(f, "System")?;
    writeln!(
        f,
        "Avg. consumption:   {} kWh/month ({} kWh/day)",
        format_number(results.avg_monthly_consumption, 0),
        format_number_2(results.avg_daily_consumption)
    )?;
    writeln!(
        f,
        "Avg. irradiation:   {} kWh/m²/day",
        format_number_2(results.avg_irradiation)
    )?;
    writeln!(
        f,
        "Required power:     {} kWp",
        format_number_2(results.required_system_power_kwp)
    )?;
    writeln!(
        f,
        "Panels:             {} x {} Wp",
        format_number(results.panel_count_rounded, 0),
        format_number(client.panel_power_wp, 0)
    )?;
    writeln!(
        f,
        "Installed power:    {} kWp",
        format_number_2(results.total_system_power_kwp)
    )?;
    writeln!(
        f,
        "Avg. generation:    {} kWh/month",
        format_number(results.avg_monthly_generation, 0)
    )?;
    writeln!(
        f,
        "Connection:         {} (minimum {} kWh/month)",
        client.connection_type.label(),
        format_number(client.connection_type.minimum_monthly_kwh(), 0)
    )
}

fn financial_section(
    f: &mut fmt::Formatter<'_>,
    client: &Client,
    results: &SolarCalculationResult,
) -> fmt::Result {
    let financials = &results.financials;

    section(f, "Investment")?;
    writeln!(f, "Kit:                {}", format_currency(client.kit_price))?;
    writeln!(
        f,
        "Labor:              {}",
        format_currency(financials.calculated_labor_cost)
    )?;
    writeln!(
        f,
        "Extra materials:    {}",
        format_currency(client.extra_materials)
    )?;
    writeln!(
        f,
        "Total investment:   {}",
        format_currency(financials.total_investment)
    )?;

    let discount = discount_amount(client);
    if discount > 0.0 {
        writeln!(f, "Discount:           -{}", format_currency(discount))?;
    }
    writeln!(f, "Final value:        {}", format_currency(client.final_value))?;
    if client.payment_method != PaymentMethod::Unset {
        if client.installments > 1 {
            writeln!(
                f,
                "Payment:            {}, {}x {}",
                client.payment_method.label(),
                client.installments,
                format_currency(client.final_value / f64::from(client.installments))
            )?;
        } else {
            writeln!(f, "Payment:            {}", client.payment_method.label())?;
        }
    }
    writeln!(f)?;

    section(f, "Savings")?;
    writeln!(
        f,
        "Bill without solar: {}/month",
        format_currency(financials.monthly_bill_without_solar)
    )?;
    writeln!(
        f,
        "Bill with solar:    {}/month",
        format_currency(financials.monthly_bill_with_solar)
    )?;
    writeln!(
        f,
        "Monthly savings:    {}",
        format_currency(financials.monthly_savings)
    )?;
    if financials.payback_months > 0.0 {
        writeln!(
            f,
            "Payback:            {} years ({} months)",
            format_number(financials.payback_years, 1),
            format_number(financials.payback_months, 0)
        )?;
    } else {
        writeln!(f, "Payback:            -")?;
    }
    writeln!(
        f,
        "25-year savings:    {}",
        format_currency(financials.total_savings_25_years)
    )
}

fn generation_section(
    f: &mut fmt::Formatter<'_>,
    client: &Client,
    results: &SolarCalculationResult,
) -> fmt::Result {
    section(f, "Monthly generation")?;
    writeln!(f, "{:<10}  {:>12}  {:>12}", "Month", "Consumption", "Generation")?;
    for (month, generated) in results.monthly_generation.iter() {
        writeln!(
            f,
            "{:<10}  {:>8} kWh  {:>8} kWh",
            month.label(),
            format_number(client.consumption[month], 0),
            format_number(generated, 0)
        )?;
    }
    writeln!(
        f,
        "{:<10}  {:>8} kWh  {:>8} kWh",
        "Total",
        format_number(client.consumption.total(), 0),
        format_number(results.monthly_generation.total(), 0)
    )
}
