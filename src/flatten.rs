//! Record normalization
//!
//! Remote objects arrive as arbitrary JSON graphs. [`flatten_record`] is a
//! pure recursive conversion over the tagged value tree: nested objects
//! stay nested mappings, lists stay lists of mappings, and any string that
//! parses as a datetime is rewritten as ISO-8601 UTC so downstream loaders
//! see one canonical timestamp format.

use chrono::{DateTime, NaiveDateTime, SecondsFormat, Utc};
use serde_json::Value;

/// Normalize a remote record for emission
pub fn flatten_record(value: &Value) -> Value {
    match value {
        Value::Object(map) => Value::Object(
            map.iter()
                .map(|(k, v)| (k.clone(), flatten_record(v)))
                .collect(),
        ),
        Value::Array(items) => Value::Array(items.iter().map(flatten_record).collect()),
        Value::String(s) => normalize_datetime(s)
            .map(Value::String)
            .unwrap_or_else(|| value.clone()),
        _ => value.clone(),
    }
}

/// Rewrite a datetime-looking string as ISO-8601 UTC
///
/// Returns None when the string is not a datetime, leaving it untouched.
/// Plain dates (`2024-01-31`) are not rewritten.
fn normalize_datetime(s: &str) -> Option<String> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(
            dt.with_timezone(&Utc)
                .to_rfc3339_opts(SecondsFormat::Secs, true),
        );
    }

    // Offset-less datetimes from the platform are UTC
    for fmt in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S"] {
        if let Ok(ndt) = NaiveDateTime::parse_from_str(s, fmt) {
            let dt = DateTime::<Utc>::from_naive_utc_and_offset(ndt, Utc);
            return Some(dt.to_rfc3339_opts(SecondsFormat::Secs, true));
        }
    }

    None
}
