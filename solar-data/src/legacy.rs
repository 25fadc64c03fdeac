//! Import of data exported from the browser version of the tool.
//!
//! The browser version kept everything in local storage under two keys. An
//! export is either the raw client array or an object holding those keys,
//! whose values may themselves be JSON-encoded strings:
//!
//! | key                     | content                      |
//! |-------------------------|------------------------------|
//! | `solarcalc_clients_v1`  | array of client records      |
//! | `solarcalc_settings_v1` | company settings object      |

use chrono::{DateTime, Utc};
use serde_json::Value;
use solar_core::migration::{MigrationError, upgrade_client_document};
use solar_core::{Client, CompanySettings};
use thiserror::Error;

pub const CLIENTS_KEY: &str = "solarcalc_clients_v1";
pub const SETTINGS_KEY: &str = "solarcalc_settings_v1";

/// Schema version of every record written by the browser version.
pub const LEGACY_SCHEMA_VERSION: u32 = 1;

#[derive(Debug, Error)]
pub enum LegacyExportError {
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("expected a client array or an object with '{key}'", key = CLIENTS_KEY)]
    UnexpectedShape,

    #[error("client record #{index}: {source}")]
    Record {
        index: usize,
        #[source]
        source: MigrationError,
    },

    #[error("invalid company settings: {0}")]
    Settings(serde_json::Error),
}

/// Clients and settings recovered from an export.
#[derive(Debug, Clone, PartialEq)]
pub struct LegacyExport {
    pub clients: Vec<Client>,
    pub settings: Option<CompanySettings>,
}

pub struct LegacyExportLoader;

impl LegacyExportLoader {
    /// Parse an export, upgrading every client record to the current model.
    ///
    /// `now` fills timestamps the records lack.
    ///
    /// # Errors
    ///
    /// Fails on malformed JSON, an unrecognised layout, or the first record
    /// that cannot be upgraded.
    pub fn parse(
        json: &str,
        now: DateTime<Utc>,
    ) -> Result<LegacyExport, LegacyExportError> {
        let root: Value = serde_json::from_str(json)?;

        let (clients, settings) = match root {
            Value::Array(records) => (records, None),
            Value::Object(mut storage) => {
                let clients = match storage.remove(CLIENTS_KEY).map(decode_stored) {
                    Some(Ok(Value::Array(records))) => records,
                    Some(Ok(Value::Null)) | None => Vec::new(),
                    Some(Ok(_)) => return Err(LegacyExportError::UnexpectedShape),
                    Some(Err(err)) => return Err(err.into()),
                };
                let settings = match storage.remove(SETTINGS_KEY).map(decode_stored) {
                    Some(Ok(Value::Null)) | None => None,
                    Some(Ok(value)) => Some(
                        serde_json::from_value(value).map_err(LegacyExportError::Settings)?,
                    ),
                    Some(Err(err)) => return Err(err.into()),
                };
                (clients, settings)
            }
            _ => return Err(LegacyExportError::UnexpectedShape),
        };

        let clients = clients
            .into_iter()
            .enumerate()
            .map(|(index, record)| {
                upgrade_client_document(record, LEGACY_SCHEMA_VERSION, now)
                    .map_err(|source| LegacyExportError::Record { index, source })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(LegacyExport { clients, settings })
    }
}

/// Local storage holds strings; exports may keep them encoded.
fn decode_stored(value: Value) -> Result<Value, serde_json::Error> {
    match value {
        Value::String(encoded) => serde_json::from_str(&encoded),
        other => Ok(other),
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use solar_core::ProjectStatus;

    use super::*;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 7, 1, 0, 0, 0).unwrap()
    }

    #[test]
    fn parses_bare_client_array() {
        let json = r#"[{"id":"a","name":"Ana"},{"id":"b","name":"Bruno"}]"#;

        let export = LegacyExportLoader::parse(json, now()).unwrap();

        assert_eq!(export.clients.len(), 2);
        assert_eq!(export.clients[1].name, "Bruno");
        assert_eq!(export.settings, None);
    }

    #[test]
    fn parses_storage_dump_with_encoded_values() {
        let clients = json!([{ "id": "a", "kitItems": "Kit 5kWp" }]).to_string();
        let settings = json!({ "logo": null, "companyName": "Sol Forte" }).to_string();
        let mut storage = serde_json::Map::new();
        storage.insert(CLIENTS_KEY.to_string(), Value::String(clients));
        storage.insert(SETTINGS_KEY.to_string(), Value::String(settings));
        let dump = Value::Object(storage).to_string();

        let export = LegacyExportLoader::parse(&dump, now()).unwrap();

        assert_eq!(export.clients[0].status, ProjectStatus::Lead);
        assert_eq!(export.clients[0].materials[0].model, "Kit 5kWp");
        assert_eq!(
            export.settings.unwrap().company_name.as_deref(),
            Some("Sol Forte")
        );
    }

    #[test]
    fn storage_dump_without_clients_is_empty() {
        let export = LegacyExportLoader::parse(r#"{"other":"x"}"#, now()).unwrap();

        assert!(export.clients.is_empty());
    }

    #[test]
    fn reports_index_of_bad_record() {
        let json = r#"[{"id":"a"},{"name":"no id"}]"#;

        let err = LegacyExportLoader::parse(json, now()).unwrap_err();

        assert!(matches!(err, LegacyExportError::Record { index: 1, .. }));
        assert_eq!(err.to_string(), "client record #1: client document has no id");
    }

    #[test]
    fn rejects_unexpected_shapes() {
        assert!(matches!(
            LegacyExportLoader::parse("42", now()),
            Err(LegacyExportError::UnexpectedShape)
        ));
        assert!(matches!(
            LegacyExportLoader::parse(r#"{"solarcalc_clients_v1":{"id":"a"}}"#, now()),
            Err(LegacyExportError::UnexpectedShape)
        ));
    }
}
