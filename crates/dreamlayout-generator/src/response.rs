//! Validation of the model's JSON answer.
//!
//! The answer is untrusted: it is parsed into a `serde_json::Value` first and
//! each field is checked before a typed [`LayoutResult`] is built. Anything
//! that cannot be repaired becomes a [`MalformedResponse`] that keeps the raw
//! text so the user can still read what the model said.

use dreamlayout_shared::markup::ensure_svg_namespace;
use dreamlayout_shared::{Floor, LayoutResult, Room};
use serde::Serialize;
use serde_json::{Map, Value};

use crate::fence::extract_payload;

/// Title used when the model leaves it out.
pub const UNTITLED: &str = "Untitled Layout";

/// Name of the floor built from a legacy single-floor answer.
pub const SINGLE_FLOOR_NAME: &str = "Ground Floor";

/// A model answer that could not be turned into a layout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MalformedResponse {
    /// What was wrong, for logs and the error banner.
    pub reason: String,
    /// The model's answer exactly as received.
    pub raw: String,
}

/// Parse and validate a raw model answer.
pub fn parse_layout(raw: &str) -> Result<LayoutResult, MalformedResponse> {
    let malformed = |reason: String| MalformedResponse {
        reason,
        raw: raw.to_string(),
    };

    let payload = extract_payload(raw);
    let value: Value = serde_json::from_str(payload)
        .map_err(|e| malformed(format!("response is not valid JSON: {e}")))?;
    let Value::Object(doc) = value else {
        return Err(malformed("response is not a JSON object".to_string()));
    };

    let floors = floors_from(&doc).map_err(malformed)?;

    Ok(LayoutResult {
        title: text_field(&doc, "title")
            .filter(|t| !t.trim().is_empty())
            .unwrap_or_else(|| UNTITLED.to_string()),
        description: text_field(&doc, "description").unwrap_or_default(),
        conversational_response: text_field(&doc, "conversational_response").unwrap_or_default(),
        floors,
        design_code: None,
    })
}

fn floors_from(doc: &Map<String, Value>) -> Result<Vec<Floor>, String> {
    match doc.get("floors") {
        Some(Value::Array(items)) if !items.is_empty() => items
            .iter()
            .enumerate()
            .map(|(i, item)| floor_from(i, item))
            .collect(),
        Some(Value::Array(_)) | Some(Value::Null) | None => legacy_floor(doc),
        Some(_) => Err("'floors' is not an array".to_string()),
    }
}

/// Older answers put `rooms` and `svg` at the top level.
fn legacy_floor(doc: &Map<String, Value>) -> Result<Vec<Floor>, String> {
    if !doc.contains_key("rooms") && !doc.contains_key("svg") {
        return Err("response has no floors".to_string());
    }
    let rooms = rooms_from(0, doc.get("rooms"))?;
    let svg = text_field(doc, "svg").unwrap_or_default();
    Ok(vec![Floor {
        floor_name: SINGLE_FLOOR_NAME.to_string(),
        rooms,
        svg: normalize_markup(svg),
    }])
}

fn floor_from(index: usize, value: &Value) -> Result<Floor, String> {
    let Value::Object(floor) = value else {
        return Err(format!("floor {} is not an object", index + 1));
    };

    let floor_name = text_field(floor, "floor_name")
        .filter(|n| !n.trim().is_empty())
        .unwrap_or_else(|| format!("Floor {}", index + 1));
    let rooms = rooms_from(index, floor.get("rooms"))?;
    let svg = text_field(floor, "svg").unwrap_or_default();

    Ok(Floor {
        floor_name,
        rooms,
        svg: normalize_markup(svg),
    })
}

fn rooms_from(floor_index: usize, value: Option<&Value>) -> Result<Vec<Room>, String> {
    let items = match value {
        None | Some(Value::Null) => return Ok(Vec::new()),
        Some(Value::Array(items)) => items,
        Some(_) => return Err(format!("floor {} 'rooms' is not an array", floor_index + 1)),
    };

    items
        .iter()
        .enumerate()
        .map(|(i, item)| {
            let here = || format!("floor {} room {}", floor_index + 1, i + 1);
            let Value::Object(room) = item else {
                return Err(format!("{} is not an object", here()));
            };
            let required = |key: &str| {
                text_field(room, key)
                    .filter(|v| !v.trim().is_empty())
                    .ok_or_else(|| format!("{} is missing '{key}'", here()))
            };
            Ok(Room {
                id: room.get("id").and_then(room_number),
                name: required("name")?,
                size: required("size")?,
                position: required("position")?,
            })
        })
        .collect()
}

/// Strings are taken as is; numbers are accepted and printed.
fn text_field(obj: &Map<String, Value>, key: &str) -> Option<String> {
    match obj.get(key)? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn room_number(value: &Value) -> Option<u32> {
    match value {
        Value::Number(n) => n.as_u64().and_then(|n| u32::try_from(n).ok()),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Add the SVG namespace so the markup renders standalone. Markup without an
/// `<svg>` root is kept untouched.
fn normalize_markup(svg: String) -> String {
    if svg.trim().is_empty() {
        return svg;
    }
    match ensure_svg_namespace(&svg) {
        Ok(normalized) => normalized.into_owned(),
        Err(e) => {
            tracing::debug!(error = %e, "leaving floor markup as returned");
            svg
        }
    }
}
