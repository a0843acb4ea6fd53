//! Meeting listing record.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// One meeting listing as served by a listings API.
///
/// Only `id` and `name` are required. Fields this type does not model are
/// kept in `extra` so re-serializing a record loses nothing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Meeting {
    #[serde(deserialize_with = "id_from_string_or_number")]
    pub id: String,
    pub name: String,
    /// Day of week, 0 = Sunday.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub day: Option<u8>,
    /// Start time, `HH:MM`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    /// Format codes (open, closed, online, ...).
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub types: Vec<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

fn id_from_string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        other => Err(serde::de::Error::custom(format!(
            "meeting id must be a string or number, got {}",
            other
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_full_record() {
        let json = r#"{
            "id": "m-17",
            "name": "Tuesday Night Group",
            "day": 2,
            "time": "19:30",
            "end_time": "20:30",
            "location": "Community Hall",
            "address": "12 High St",
            "types": ["O", "D"],
            "region": "North"
        }"#;

        let meeting: Meeting = serde_json::from_str(json).unwrap();
        assert_eq!(meeting.id, "m-17");
        assert_eq!(meeting.day, Some(2));
        assert_eq!(meeting.types, vec!["O", "D"]);
        assert_eq!(meeting.extra.get("region"), Some(&Value::from("North")));
    }

    #[test]
    fn test_deserialize_minimal_record_with_numeric_id() {
        let meeting: Meeting = serde_json::from_str(r#"{"id": 42, "name": "Online"}"#).unwrap();
        assert_eq!(meeting.id, "42");
        assert!(meeting.day.is_none());
        assert!(meeting.types.is_empty());
    }

    #[test]
    fn test_rejects_structured_id() {
        let result: Result<Meeting, _> = serde_json::from_str(r#"{"id": [1], "name": "x"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_serialize_skips_empty_fields_and_keeps_extra() {
        let meeting: Meeting =
            serde_json::from_str(r#"{"id": "a", "name": "b", "slug": "b-group"}"#).unwrap();

        let json = serde_json::to_value(&meeting).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"id": "a", "name": "b", "slug": "b-group"})
        );
    }
}
