mod client;
mod commercial_terms;
mod company_settings;
mod monthly_data;
mod project_status;
mod solar_calculation;

pub use client::{Address, Client, ClientDefaults, MaterialItem};
pub use commercial_terms::{ConnectionType, DiscountType, LaborType, PaymentMethod};
pub use company_settings::{CompanySettings, DEFAULT_COMPANY_NAME};
pub use monthly_data::{Month, MonthlyData};
pub use project_status::ProjectStatus;
pub use solar_calculation::{Financials, SolarCalculationResult};
