//! Upgrades stored client documents to the current [`Client`] shape.
//!
//! Documents written by older versions of the tool may lack whole groups of
//! fields (the sales pipeline, labor and discount modes, the material list)
//! or carry values the current model no longer accepts. Upgrading is a pure
//! function of the stored JSON, its schema version and the current time.
//!
//! | Field                 | Rule                                                       |
//! |-----------------------|------------------------------------------------------------|
//! | `status`              | missing or unknown becomes `lead`                          |
//! | `statusUpdatedAt`     | missing becomes `updatedAt`, then `createdAt`, then now    |
//! | `kitItems` (legacy)   | free text becomes a single `kit` line in `materials`       |
//! | enum fields           | unknown values fall back to the blank-client default       |
//! | numbers               | `null` becomes 0, `installments` becomes at least 1        |
//! | anything else missing | copied from a blank client                                 |

use chrono::{DateTime, Utc};
use serde_json::{Map, Value};
use thiserror::Error;
use tracing::debug;

use crate::models::{
    Client, ConnectionType, DiscountType, LaborType, MaterialItem, PaymentMethod, ProjectStatus,
};

/// Version stamped on every document written by this crate.
///
/// Version 1 covers documents saved before the sales pipeline existed.
pub const CURRENT_SCHEMA_VERSION: u32 = 2;

const LEGACY_KIT_ITEMS: &str = "kitItems";
const LEGACY_KIT_UNIT: &str = "kit";
const LEGACY_KIT_BRAND: &str = "-";

#[derive(Debug, Error)]
pub enum MigrationError {
    #[error("client document is not a JSON object")]
    NotAnObject,

    #[error("client document has no id")]
    MissingId,

    #[error("schema version {0} is newer than the supported version {max}", max = CURRENT_SCHEMA_VERSION)]
    UnsupportedVersion(u32),

    #[error("invalid client document: {0}")]
    Deserialize(#[from] serde_json::Error),
}

/// Upgrades a stored client document written at schema `version`.
///
/// `now` is used only where a timestamp is missing altogether.
///
/// # Errors
///
/// Fails when the document is not an object, has no usable id, was written
/// by a newer schema, or still does not deserialize once upgraded.
///
/// # Example
///
/// ```
/// use chrono::Utc;
/// use serde_json::json;
/// use solar_core::migration::upgrade_client_document;
/// use solar_core::ProjectStatus;
///
/// let legacy = json!({ "id": "42", "name": "Ana", "kitItems": "10x 550W panels" });
/// let client = upgrade_client_document(legacy, 1, Utc::now()).unwrap();
///
/// assert_eq!(client.status, ProjectStatus::Lead);
/// assert_eq!(client.materials[0].model, "10x 550W panels");
/// ```
pub fn upgrade_client_document(
    document: Value,
    version: u32,
    now: DateTime<Utc>,
) -> Result<Client, MigrationError> {
    if version > CURRENT_SCHEMA_VERSION {
        return Err(MigrationError::UnsupportedVersion(version));
    }

    let Value::Object(mut doc) = document else {
        return Err(MigrationError::NotAnObject);
    };

    let id = match doc.get("id") {
        Some(Value::String(id)) if !id.trim().is_empty() => id.clone(),
        Some(Value::Number(id)) => id.to_string(),
        _ => return Err(MigrationError::MissingId),
    };
    doc.insert("id".to_string(), Value::String(id.clone()));

    if version < CURRENT_SCHEMA_VERSION {
        debug!(client_id = %id, version, "upgrading legacy client document");
    }

    let Value::Object(blank) = serde_json::to_value(Client::new_empty(id, now))? else {
        return Err(MigrationError::NotAnObject);
    };

    upgrade_timestamps(&mut doc, now);
    upgrade_status(&mut doc);
    upgrade_materials(&mut doc);
    upgrade_enums(&mut doc);

    for (key, default) in &blank {
        let value = match (default, doc.remove(key)) {
            (_, None) => default.clone(),
            (Value::Object(fields), Some(value)) => Value::Object(backfill(fields, value)),
            (Value::Number(_), Some(value)) if key == "installments" => coerce_installments(&value),
            (Value::Number(_), Some(value)) => coerce_number(&value),
            (Value::String(_), Some(value)) => coerce_string(value),
            (_, Some(value)) => value,
        };
        doc.insert(key.clone(), value);
    }

    Ok(serde_json::from_value(Value::Object(doc))?)
}

fn upgrade_timestamps(
    doc: &mut Map<String, Value>,
    now: DateTime<Utc>,
) {
    let created = doc.get("createdAt").and_then(parse_timestamp).unwrap_or(now);
    let updated = doc.get("updatedAt").and_then(parse_timestamp).unwrap_or(created);
    let status_updated = doc.get("statusUpdatedAt").and_then(parse_timestamp);

    doc.insert("createdAt".to_string(), timestamp(created));
    doc.insert("updatedAt".to_string(), timestamp(updated));
    match status_updated {
        Some(at) => doc.insert("statusUpdatedAt".to_string(), timestamp(at)),
        None => doc.remove("statusUpdatedAt"),
    };
}

fn upgrade_status(doc: &mut Map<String, Value>) {
    let status = doc
        .get("status")
        .and_then(Value::as_str)
        .and_then(ProjectStatus::parse);

    let status = match status {
        Some(status) => status,
        None => {
            doc.remove("statusUpdatedAt");
            ProjectStatus::Lead
        }
    };
    doc.insert("status".to_string(), Value::String(status.as_str().to_string()));

    if let Some(updated) = doc.get("updatedAt").cloned() {
        doc.entry("statusUpdatedAt").or_insert(updated);
    }
}

fn upgrade_materials(doc: &mut Map<String, Value>) {
    let kit_items = doc.remove(LEGACY_KIT_ITEMS);

    let mut materials: Vec<Value> = match doc.remove("materials") {
        Some(Value::Array(items)) => items.into_iter().filter_map(upgrade_material).collect(),
        _ => Vec::new(),
    };

    if materials.is_empty() {
        if let Some(Value::String(text)) = kit_items {
            if !text.trim().is_empty() {
                let mut item = material_defaults();
                item.insert("unit".to_string(), Value::String(LEGACY_KIT_UNIT.to_string()));
                item.insert("model".to_string(), Value::String(text));
                item.insert("brand".to_string(), Value::String(LEGACY_KIT_BRAND.to_string()));
                materials.push(Value::Object(item));
            }
        }
    }

    doc.insert("materials".to_string(), Value::Array(materials));
}

fn upgrade_material(item: Value) -> Option<Value> {
    match item {
        Value::Object(_) => Some(Value::Object(backfill(&material_defaults(), item))),
        _ => None,
    }
}

fn material_defaults() -> Map<String, Value> {
    let blank = MaterialItem::new();
    let mut item = Map::new();
    item.insert("id".to_string(), Value::String(blank.id));
    item.insert("quantity".to_string(), Value::from(blank.quantity));
    item.insert("unit".to_string(), Value::String(blank.unit));
    item.insert("model".to_string(), Value::String(blank.model));
    item.insert("brand".to_string(), Value::String(blank.brand));
    item
}

fn upgrade_enums(doc: &mut Map<String, Value>) {
    canonicalize(doc, "connectionType", |s| ConnectionType::parse(s).map(|v| v.as_str()));
    canonicalize(doc, "laborType", |s| LaborType::parse(s).map(|v| v.as_str()));
    canonicalize(doc, "discountType", |s| DiscountType::parse(s).map(|v| v.as_str()));
    canonicalize(doc, "paymentMethod", |s| PaymentMethod::parse(s).map(|v| v.as_str()));
}

/// Unknown values are dropped so the blank-client default takes their place.
fn canonicalize(
    doc: &mut Map<String, Value>,
    key: &str,
    parse: impl Fn(&str) -> Option<&'static str>,
) {
    match doc.get(key).and_then(Value::as_str).and_then(parse) {
        Some(canonical) => {
            doc.insert(key.to_string(), Value::String(canonical.to_string()));
        }
        None => {
            doc.remove(key);
        }
    }
}

/// Fills the keys of `defaults` missing from `value`, coercing the ones present.
fn backfill(
    defaults: &Map<String, Value>,
    value: Value,
) -> Map<String, Value> {
    let mut current = match value {
        Value::Object(map) => map,
        _ => Map::new(),
    };

    for (key, default) in defaults {
        let value = match (default, current.remove(key)) {
            (_, None) => default.clone(),
            (Value::Number(_), Some(value)) => coerce_number(&value),
            (Value::String(_), Some(value)) => coerce_string(value),
            (_, Some(value)) => value,
        };
        current.insert(key.clone(), value);
    }

    current
}

fn number_of(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok().filter(|n| n.is_finite()),
        _ => None,
    }
}

fn coerce_number(value: &Value) -> Value {
    match value {
        Value::Number(n) => Value::Number(n.clone()),
        other => Value::from(number_of(other).unwrap_or(0.0)),
    }
}

fn coerce_installments(value: &Value) -> Value {
    let installments = number_of(value).unwrap_or(1.0).round().clamp(1.0, f64::from(u32::MAX));
    Value::from(installments as u64)
}

fn coerce_string(value: Value) -> Value {
    match value {
        Value::String(s) => Value::String(s),
        Value::Number(n) => Value::String(n.to_string()),
        Value::Bool(b) => Value::String(b.to_string()),
        _ => Value::String(String::new()),
    }
}

fn parse_timestamp(value: &Value) -> Option<DateTime<Utc>> {
    match value {
        Value::String(s) => DateTime::parse_from_rfc3339(s)
            .ok()
            .map(|at| at.with_timezone(&Utc)),
        Value::Number(n) => n.as_i64().and_then(DateTime::from_timestamp_millis),
        _ => None,
    }
}

fn timestamp(at: DateTime<Utc>) -> Value {
    Value::String(at.to_rfc3339())
}
