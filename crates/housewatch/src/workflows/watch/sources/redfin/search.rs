use serde_json::Value;
use tracing::debug;

use super::super::SourceError;
use super::SITE_URL;
use crate::workflows::watch::domain::RawRecord;

/// Anti-JSON-hijacking prefix the endpoint puts in front of every payload.
const JSON_GUARD: &str = "{}&&";

/// Text name for the numeric property-type code used by the search endpoint.
pub fn property_type_label(code: i64) -> &'static str {
    match code {
        6 => "Single-Family",
        3 => "Condo/Co-op",
        13 => "Townhouse",
        4 => "Multi-Family",
        5 => "Land",
        _ => "Other",
    }
}

/// Turns a search response body into raw records. Unit listings are skipped; entries with
/// missing fields are kept as-is and left for the parser to accept or reject.
pub fn parse_search_response(body: &str) -> Result<Vec<RawRecord>, SourceError> {
    let json = body.trim_start();
    let json = json.strip_prefix(JSON_GUARD).unwrap_or(json);

    let document: Value = serde_json::from_str(json)
        .map_err(|err| SourceError::Payload(format!("search response is not JSON: {err}")))?;

    let homes: &[Value] = match document.pointer("/payload/homes") {
        Some(Value::Array(homes)) => homes.as_slice(),
        Some(_) => {
            return Err(SourceError::Payload(
                "payload.homes is not a list".to_string(),
            ))
        }
        None => &[][..],
    };

    let records: Vec<RawRecord> = homes
        .iter()
        .filter(|home| home.is_object())
        .filter(|home| {
            let is_unit = text(home, "url").is_some_and(|url| url.contains("/unit-"));
            if is_unit {
                debug!(url = ?text(home, "url"), "skipping unit listing");
            }
            !is_unit
        })
        .map(record_from_home)
        .collect();

    debug!(homes = homes.len(), kept = records.len(), "search response parsed");
    Ok(records)
}

fn record_from_home(home: &Value) -> RawRecord {
    let source_id = text(home, "listingId").or_else(|| text(home, "propertyId"));
    let property_type = match field(home, "propertyType") {
        Some(Value::Number(code)) => code.as_i64().map(|code| property_type_label(code).to_string()),
        Some(Value::String(label)) => Some(label.clone()),
        _ => None,
    };
    let url = text(home, "url").map(|path| {
        if path.starts_with("http") {
            path
        } else {
            format!("{SITE_URL}{path}")
        }
    });

    RawRecord {
        source_id,
        price: number(home, "price").map(|price| price.round() as i64),
        address: text(home, "streetLine"),
        city: text(home, "city"),
        state: text(home, "state"),
        zip: text(home, "zip").or_else(|| text(home, "postalCode")),
        property_type,
        url,
        year_built: number(home, "yearBuilt").map(|year| year as i32),
        hoa_fee: number(home, "hoa"),
        beds: number(home, "beds").map(|beds| beds as u32),
        baths: number(home, "baths").map(|baths| baths as f32),
        sqft: number(home, "sqFt").map(|sqft| sqft as u32),
        lot_size: number(home, "lotSize"),
        ..RawRecord::default()
    }
}

/// Field value with any `{ "value": … }` wrapper removed.
fn field<'a>(home: &'a Value, key: &str) -> Option<&'a Value> {
    match home.get(key)? {
        Value::Null => None,
        Value::Object(wrapper) => wrapper.get("value").filter(|value| !value.is_null()),
        value => Some(value),
    }
}

fn text(home: &Value, key: &str) -> Option<String> {
    match field(home, key)? {
        Value::String(value) => Some(value.clone()),
        Value::Number(value) => Some(value.to_string()),
        _ => None,
    }
}

fn number(home: &Value, key: &str) -> Option<f64> {
    match field(home, key)? {
        Value::Number(value) => value.as_f64(),
        Value::String(value) => value.replace([',', '$'], "").trim().parse().ok(),
        _ => None,
    }
}
