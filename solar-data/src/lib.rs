//! Importers for client data: monthly CSV tables, NASA POWER irradiation
//! climatologies and exports of the browser version of the tool.

pub mod legacy;
pub mod loader;
pub mod monthly_csv;
pub mod nasa_power;

pub use legacy::{LegacyExport, LegacyExportError, LegacyExportLoader};
pub use loader::{ClientDataLoader, ClientDataLoaderError};
pub use monthly_csv::{MonthlyCsvError, MonthlyCsvLoader, MonthlyProfile, MonthlyRecord};
pub use nasa_power::{NasaPowerError, parse_climatology};
