//! Encoding of the floor payload column (`projects.rooms`).
//!
//! Current rows hold a JSON array of [`Floor`] records. Older rows hold one of:
//!
//! - a flat JSON array of rooms
//! - a whole generation response, `{"floors": [...]}`
//! - a single-floor response, `{"rooms": [...], "svg": "..."}`
//! - nothing at all
//!
//! Every shape decodes to a sequence of floors. Rows that match none of them
//! are logged and read as one empty floor carrying the project's canonical
//! markup, so a single bad row never fails a listing.

use dreamlayout_shared::{Floor, Room};
use serde::Deserialize;
use serde_json::Value;

use crate::error::Result;

/// Name given to the single floor reconstructed from a legacy row.
pub const LEGACY_FLOOR_NAME: &str = "Ground Floor";

pub fn encode_floors(floors: &[Floor]) -> Result<String> {
    Ok(serde_json::to_string(floors)?)
}

pub fn decode_floors(raw: Option<&str>, canonical_markup: &str) -> Vec<Floor> {
    let raw = match raw.map(str::trim) {
        None | Some("") | Some("null") => return Vec::new(),
        Some(raw) => raw,
    };

    match parse_floors(raw, canonical_markup) {
        Ok(floors) => floors,
        Err(e) => {
            tracing::warn!(error = %e, "unreadable floor payload, using canonical markup");
            if canonical_markup.is_empty() {
                Vec::new()
            } else {
                vec![legacy_floor(Vec::new(), canonical_markup.to_string())]
            }
        }
    }
}

fn parse_floors(raw: &str, canonical_markup: &str) -> serde_json::Result<Vec<Floor>> {
    let value: Value = serde_json::from_str(raw)?;

    match value {
        Value::Array(_) => match Vec::<Floor>::deserialize(&value) {
            Ok(floors) => Ok(floors),
            Err(floor_err) => match Vec::<Room>::deserialize(&value) {
                Ok(rooms) => Ok(vec![legacy_floor(rooms, canonical_markup.to_string())]),
                Err(_) => Err(floor_err),
            },
        },
        Value::Object(mut doc) => {
            if let Some(floors) = doc.remove("floors") {
                return Vec::<Floor>::deserialize(floors);
            }
            let rooms = match doc.remove("rooms") {
                Some(rooms) => Vec::<Room>::deserialize(rooms)?,
                None => return Err(serde::de::Error::custom("object has no floors or rooms")),
            };
            let svg = match doc.remove("svg") {
                Some(Value::String(svg)) if !svg.trim().is_empty() => svg,
                _ => canonical_markup.to_string(),
            };
            Ok(vec![legacy_floor(rooms, svg)])
        }
        other => Err(serde::de::Error::custom(format!(
            "expected a sequence or an object, found {other}"
        ))),
    }
}

fn legacy_floor(rooms: Vec<Room>, svg: String) -> Floor {
    Floor {
        floor_name: LEGACY_FLOOR_NAME.to_string(),
        rooms,
        svg,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn room(name: &str) -> Room {
        Room {
            id: Some(1),
            name: name.to_string(),
            size: "10' x 12'".to_string(),
            position: "north-east corner".to_string(),
        }
    }

    #[test]
    fn zero_floors_round_trip() {
        let encoded = encode_floors(&[]).unwrap();
        assert_eq!(decode_floors(Some(&encoded), ""), Vec::<Floor>::new());
    }

    #[test]
    fn ordered_floors_round_trip() {
        let floors = vec![
            Floor {
                floor_name: "Ground Floor".into(),
                rooms: vec![room("Counter"), room("Seating")],
                svg: "<svg>g</svg>".into(),
            },
            Floor {
                floor_name: "First Floor".into(),
                rooms: vec![room("Office")],
                svg: "<svg>f</svg>".into(),
            },
        ];
        let encoded = encode_floors(&floors).unwrap();
        assert_eq!(decode_floors(Some(&encoded), ""), floors);
    }

    #[test]
    fn legacy_room_array_becomes_one_floor() {
        let raw = r#"[{"name":"Kitchen","size":"8' x 10'","position":"rear"}]"#;
        let floors = decode_floors(Some(raw), "<svg>legacy</svg>");
        assert_eq!(floors.len(), 1);
        assert_eq!(floors[0].floor_name, LEGACY_FLOOR_NAME);
        assert_eq!(floors[0].rooms[0].name, "Kitchen");
        assert_eq!(floors[0].svg, "<svg>legacy</svg>");
    }

    #[test]
    fn missing_payload_is_empty() {
        assert!(decode_floors(None, "<svg/>").is_empty());
        assert!(decode_floors(Some("  "), "<svg/>").is_empty());
    }

    #[test]
    fn whole_response_object_yields_its_floors() {
        let raw = r#"{"title":"Cafe","floors":[{"floor_name":"Mezzanine","rooms":[],"svg":"<svg/>"}]}"#;
        let floors = decode_floors(Some(raw), "<svg>canonical</svg>");
        assert_eq!(floors.len(), 1);
        assert_eq!(floors[0].floor_name, "Mezzanine");

        assert!(decode_floors(Some(r#"{"floors": []}"#), "<svg/>").is_empty());
    }

    #[test]
    fn single_floor_object_becomes_one_floor() {
        let raw = r#"{"rooms":[{"name":"Hall","size":"6' x 9'","position":"entry"}],"svg":"<svg>own</svg>"}"#;
        let floors = decode_floors(Some(raw), "<svg>canonical</svg>");
        assert_eq!(floors.len(), 1);
        assert_eq!(floors[0].floor_name, LEGACY_FLOOR_NAME);
        assert_eq!(floors[0].rooms[0].name, "Hall");
        assert_eq!(floors[0].svg, "<svg>own</svg>");

        let bare = decode_floors(Some(r#"{"rooms":[]}"#), "<svg>canonical</svg>");
        assert_eq!(bare[0].svg, "<svg>canonical</svg>");
    }

    #[test]
    fn unreadable_payload_falls_back_to_canonical_markup() {
        let floors = decode_floors(Some("{not json"), "<svg>canonical</svg>");
        assert_eq!(floors.len(), 1);
        assert!(floors[0].rooms.is_empty());
        assert_eq!(floors[0].svg, "<svg>canonical</svg>");

        assert!(decode_floors(Some("42"), "").is_empty());
        assert!(decode_floors(Some(r#"{"title": "x"}"#), "").is_empty());
    }
}
