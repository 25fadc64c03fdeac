//! Monthly irradiation from NASA POWER climatology responses.
//!
//! The climatology endpoint returns long-term monthly averages of
//! `ALLSKY_SFC_SW_DWN` (all-sky surface shortwave downward irradiance) in
//! kWh/m²/day, keyed by upper-case month abbreviations:
//!
//! ```json
//! { "properties": { "parameter": { "ALLSKY_SFC_SW_DWN": { "JAN": 5.91, "FEB": 5.83, "ANN": 5.12 } } } }
//! ```
//!
//! Only parsing is provided; download the JSON from [`climatology_url`].

use serde_json::Value;
use solar_core::{Month, MonthlyData};
use thiserror::Error;
use tracing::warn;

/// Climatology endpoint for a single point.
pub const CLIMATOLOGY_ENDPOINT: &str = "https://power.larc.nasa.gov/api/temporal/climatology/point";

/// Irradiance parameter requested from the renewable-energy community.
pub const IRRADIATION_PARAMETER: &str = "ALLSKY_SFC_SW_DWN";

#[derive(Debug, Error)]
pub enum NasaPowerError {
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("response has no {name} parameter", name = IRRADIATION_PARAMETER)]
    MissingParameter,
}

/// URL of the climatology request for the given coordinates.
pub fn climatology_url(
    latitude: f64,
    longitude: f64,
) -> String {
    format!(
        "{CLIMATOLOGY_ENDPOINT}?parameters={IRRADIATION_PARAMETER}&community=RE&longitude={longitude}&latitude={latitude}&format=JSON"
    )
}

/// Reads monthly irradiation from a climatology response body.
///
/// Months that are absent, non-numeric or negative (NASA's `-999` fill value)
/// stay zero.
///
/// # Errors
///
/// Fails when the body is not JSON or carries no irradiation parameter.
pub fn parse_climatology(json: &str) -> Result<MonthlyData, NasaPowerError> {
    let body: Value = serde_json::from_str(json)?;
    climatology_from_value(&body)
}

/// [`parse_climatology`] for an already decoded body.
pub fn climatology_from_value(body: &Value) -> Result<MonthlyData, NasaPowerError> {
    let parameter = body
        .pointer(&format!("/properties/parameter/{IRRADIATION_PARAMETER}"))
        .and_then(Value::as_object)
        .ok_or(NasaPowerError::MissingParameter)?;

    Ok(MonthlyData::from_fn(|month| {
        let key = nasa_key(month);
        match parameter.get(key).and_then(Value::as_f64) {
            Some(value) if value >= 0.0 => value,
            Some(value) => {
                warn!(month = key, value, "ignoring NASA POWER fill value");
                0.0
            }
            None => 0.0,
        }
    }))
}

fn nasa_key(month: Month) -> &'static str {
    match month {
        Month::Jan => "JAN",
        Month::Feb => "FEB",
        Month::Mar => "MAR",
        Month::Apr => "APR",
        Month::May => "MAY",
        Month::Jun => "JUN",
        Month::Jul => "JUL",
        Month::Aug => "AUG",
        Month::Sep => "SEP",
        Month::Oct => "OCT",
        Month::Nov => "NOV",
        Month::Dec => "DEC",
    }
}
