pub mod calculations;
pub mod db;
pub mod migration;
pub mod models;
pub mod pipeline;

pub use calculations::{calculate_solar_system, recompute_derived_financials};
pub use db::repository::{RepositoryError, SolarRepository};
pub use models::*;
