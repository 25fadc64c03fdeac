use std::collections::HashSet;
use std::io::Read;

use serde::Deserialize;
use solar_core::{Month, MonthlyData};
use thiserror::Error;

/// Errors that can occur when reading a monthly CSV file.
#[derive(Debug, Error)]
pub enum MonthlyCsvError {
    #[error("CSV parse error: {0}")]
    CsvParse(String),

    #[error("Unknown month '{0}'")]
    UnknownMonth(String),

    #[error("Month '{0}' appears more than once")]
    DuplicateMonth(String),

    #[error("Invalid {column} value for {month}: {value}")]
    InvalidValue {
        column: &'static str,
        month: String,
        value: f64,
    },
}

impl From<csv::Error> for MonthlyCsvError {
    fn from(err: csv::Error) -> Self {
        MonthlyCsvError::CsvParse(err.to_string())
    }
}

/// A single row of the monthly CSV file.
///
/// - `month`: `jan`, `1`, `January` or `Janeiro` (case-insensitive)
/// - `consumption_kwh`: billed consumption for the month (optional)
/// - `irradiation`: daily irradiation in kWh/m²/day (optional)
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct MonthlyRecord {
    pub month: String,
    #[serde(default)]
    pub consumption_kwh: Option<f64>,
    #[serde(default)]
    pub irradiation: Option<f64>,
}

/// Monthly series read from a CSV file.
///
/// A series is `None` when its column was absent or empty on every row, so
/// applying the profile leaves the client's existing values alone.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MonthlyProfile {
    pub consumption: Option<MonthlyData>,
    pub irradiation: Option<MonthlyData>,
}

/// Reader for month-by-month consumption and irradiation tables.
///
/// Months missing from the file are zero.
pub struct MonthlyCsvLoader;

impl MonthlyCsvLoader {
    /// Parse the raw records from a CSV reader with a header row.
    pub fn parse_records<R: Read>(reader: R) -> Result<Vec<MonthlyRecord>, MonthlyCsvError> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(reader);
        let mut records = Vec::new();

        for result in csv_reader.deserialize() {
            let record: MonthlyRecord = result?;
            records.push(record);
        }

        Ok(records)
    }

    /// Parse a CSV reader into a [`MonthlyProfile`].
    ///
    /// # Example
    ///
    /// ```
    /// use solar_core::Month;
    /// use solar_data::MonthlyCsvLoader;
    ///
    /// let csv = "month,consumption_kwh,irradiation\njan,500,5.8\nfeb,480,5.6\n";
    /// let profile = MonthlyCsvLoader::parse(csv.as_bytes()).unwrap();
    ///
    /// let consumption = profile.consumption.unwrap();
    /// assert_eq!(consumption[Month::Feb], 480.0);
    /// assert_eq!(consumption[Month::Mar], 0.0);
    /// ```
    pub fn parse<R: Read>(reader: R) -> Result<MonthlyProfile, MonthlyCsvError> {
        let records = Self::parse_records(reader)?;

        let mut seen = HashSet::new();
        let mut consumption: Option<MonthlyData> = None;
        let mut irradiation: Option<MonthlyData> = None;

        for record in &records {
            let month = Month::parse(&record.month)
                .ok_or_else(|| MonthlyCsvError::UnknownMonth(record.month.clone()))?;
            if !seen.insert(month) {
                return Err(MonthlyCsvError::DuplicateMonth(record.month.clone()));
            }

            if let Some(value) = record.consumption_kwh {
                check_value("consumption_kwh", month, value)?;
                consumption.get_or_insert(MonthlyData::ZERO)[month] = value;
            }
            if let Some(value) = record.irradiation {
                check_value("irradiation", month, value)?;
                irradiation.get_or_insert(MonthlyData::ZERO)[month] = value;
            }
        }

        Ok(MonthlyProfile {
            consumption,
            irradiation,
        })
    }
}

fn check_value(
    column: &'static str,
    month: Month,
    value: f64,
) -> Result<(), MonthlyCsvError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(MonthlyCsvError::InvalidValue {
            column,
            month: month.key().to_string(),
            value,
        })
    }
}
