//! Proposal value and final value kept in step with the sizing result.
//!
//! The proposal value always mirrors the total investment; the final value is
//! the proposal value minus the negotiated discount, never below zero.

use tracing::debug;

use crate::calculations::common::or_zero;
use crate::models::{Client, DiscountType, SolarCalculationResult};

/// Discount in currency for `client`, given its current proposal value.
pub fn discount_amount(client: &Client) -> f64 {
    match client.discount_type {
        DiscountType::Percent => client.proposal_value * (or_zero(client.discount_percent) / 100.0),
        DiscountType::Fixed => or_zero(client.discount),
    }
}

/// Returns a copy of `client` with `proposal_value` and `final_value`
/// recomputed from `results`.
///
/// Call after every edit that may change the investment or the discount.
///
/// # Example
///
/// ```
/// use chrono::Utc;
/// use solar_core::calculations::{calculate_solar_system, recompute_derived_financials};
/// use solar_core::{Client, DiscountType};
///
/// let mut client = Client::new_empty("demo", Utc::now());
/// client.kit_price = 12500.0;
/// client.discount_type = DiscountType::Percent;
/// client.discount_percent = 10.0;
///
/// let results = calculate_solar_system(&client);
/// let client = recompute_derived_financials(&client, &results);
///
/// assert_eq!(client.proposal_value, 12500.0);
/// assert_eq!(client.final_value, 11250.0);
/// ```
pub fn recompute_derived_financials(
    client: &Client,
    results: &SolarCalculationResult,
) -> Client {
    let mut updated = client.clone();
    updated.proposal_value = results.financials.total_investment;
    updated.final_value = (updated.proposal_value - discount_amount(&updated)).max(0.0);

    if updated.proposal_value != client.proposal_value || updated.final_value != client.final_value {
        debug!(
            client_id = %client.id,
            proposal_value = updated.proposal_value,
            final_value = updated.final_value,
            "recomputed proposal values"
        );
    }

    updated
}
