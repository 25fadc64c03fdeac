//! Solar sizing and financial calculations.
//!
//! This module provides the pure computations of the tool: sizing a
//! photovoltaic system against a client's consumption, projecting generation
//! and payback, deriving proposal values, and formatting numbers for display.

pub mod common;
pub mod proposal;
pub mod sizing;

pub use common::{format_currency, format_number, format_number_2};
pub use proposal::{discount_amount, recompute_derived_financials};
pub use sizing::{SolarCalculator, calculate_solar_system};
