//! Conversion between [`FieldValue`] and Firestore's REST value encoding.

use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::{json, Map, Value};
use tracing::debug;
use trackpro_common::{Document, FieldValue, Fields};

use crate::error::FirebaseError;

/// Encodes a value, or `None` for the server-timestamp sentinel, which Firestore
/// expresses as a field transform rather than a value.
pub fn encode_value(value: &FieldValue) -> Option<Value> {
    let encoded = match value {
        FieldValue::Null => json!({ "nullValue": null }),
        FieldValue::Bool(b) => json!({ "booleanValue": b }),
        // int64 travels as a decimal string
        FieldValue::Integer(i) => json!({ "integerValue": i.to_string() }),
        FieldValue::Double(d) => json!({ "doubleValue": d }),
        FieldValue::String(s) => json!({ "stringValue": s }),
        FieldValue::Timestamp(ts) => {
            json!({ "timestampValue": ts.to_rfc3339_opts(SecondsFormat::Micros, true) })
        }
        FieldValue::ServerTimestamp => return None,
    };
    Some(encoded)
}

/// Encodes all plain fields; sentinels are skipped.
pub fn encode_fields(fields: &Fields) -> Map<String, Value> {
    fields
        .iter()
        .filter_map(|(name, value)| encode_value(value).map(|v| (name.clone(), v)))
        .collect()
}

/// Decodes a Firestore value. Kinds without a [`FieldValue`] counterpart
/// (maps, arrays, references, ...) yield `None`.
pub fn decode_value(value: &Value) -> Option<FieldValue> {
    let (kind, inner) = value.as_object()?.iter().next()?;
    match kind.as_str() {
        "nullValue" => Some(FieldValue::Null),
        "booleanValue" => inner.as_bool().map(FieldValue::Bool),
        "integerValue" => match inner {
            Value::String(s) => s.parse().ok().map(FieldValue::Integer),
            other => other.as_i64().map(FieldValue::Integer),
        },
        "doubleValue" => inner.as_f64().map(FieldValue::Double),
        "stringValue" => inner.as_str().map(|s| FieldValue::String(s.to_string())),
        "timestampValue" => inner
            .as_str()
            .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
            .map(|ts| FieldValue::Timestamp(ts.with_timezone(&Utc))),
        _ => None,
    }
}

/// Decodes a Firestore `Document` resource.
pub fn decode_document(resource: &Value) -> Result<Document, FirebaseError> {
    let name = resource
        .get("name")
        .and_then(Value::as_str)
        .ok_or_else(|| FirebaseError::ParseError("document has no name".to_string()))?;
    let id = name.rsplit('/').next().unwrap_or(name).to_string();

    let mut fields = Fields::new();
    if let Some(raw_fields) = resource.get("fields").and_then(Value::as_object) {
        for (field_name, raw) in raw_fields {
            match decode_value(raw) {
                Some(value) => {
                    fields.insert(field_name.clone(), value);
                }
                None => debug!("Skipping unsupported Firestore field {} in {}", field_name, id),
            }
        }
    }
    Ok(Document { id, fields })
}

/// Quotes a field name for use in a field path unless it is a simple identifier.
pub fn field_path(name: &str) -> String {
    let simple = name
        .chars()
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
        && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_');
    if simple {
        name.to_string()
    } else {
        format!("`{}`", name.replace('\\', "\\\\").replace('`', "\\`"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_encode_values() {
        assert_eq!(
            encode_value(&FieldValue::Integer(499)),
            Some(json!({"integerValue": "499"}))
        );
        assert_eq!(
            encode_value(&FieldValue::Bool(true)),
            Some(json!({"booleanValue": true}))
        );
        let ts = Utc.with_ymd_and_hms(2025, 1, 2, 3, 4, 5).unwrap();
        assert_eq!(
            encode_value(&FieldValue::Timestamp(ts)),
            Some(json!({"timestampValue": "2025-01-02T03:04:05.000000Z"}))
        );
        assert_eq!(encode_value(&FieldValue::ServerTimestamp), None);
    }

    #[test]
    fn test_decode_document() {
        let resource = json!({
            "name": "projects/testgps/databases/(default)/documents/users/uid-1",
            "fields": {
                "isPro": {"booleanValue": true},
                "proActivatedAt": {"timestampValue": "2025-03-01T12:00:00.123456Z"},
                "amount": {"integerValue": "1500"},
                "devices": {"arrayValue": {"values": []}}
            },
            "createTime": "2025-03-01T12:00:00Z"
        });
        let doc = decode_document(&resource).unwrap();
        assert_eq!(doc.id, "uid-1");
        assert_eq!(doc.get("isPro"), Some(&FieldValue::Bool(true)));
        assert_eq!(doc.get("amount"), Some(&FieldValue::Integer(1500)));
        assert!(matches!(doc.get("proActivatedAt"), Some(FieldValue::Timestamp(_))));
        assert!(doc.get("devices").is_none());
    }

    #[test]
    fn test_field_path_quoting() {
        assert_eq!(field_path("isPro"), "isPro");
        assert_eq!(field_path("has-dash"), "`has-dash`");
        assert_eq!(field_path("9lives"), "`9lives`");
    }
}
