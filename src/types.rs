//! Common types used throughout adsync
//!
//! Shared type definitions, type aliases, and small utility types used
//! across multiple modules.

use serde::{Deserialize, Serialize};

// ============================================================================
// Type Aliases
// ============================================================================

/// JSON value type (re-exported from serde_json)
pub type JsonValue = serde_json::Value;

/// JSON object type
pub type JsonObject = serde_json::Map<String, JsonValue>;

// ============================================================================
// Replication Method
// ============================================================================

/// Replication method for streams
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReplicationMethod {
    /// Full re-extraction every run
    #[default]
    FullTable,
    /// Bounded-by-watermark extraction
    Incremental,
}

impl ReplicationMethod {
    /// Whether this method carries a bookmark between runs
    pub fn is_incremental(self) -> bool {
        matches!(self, Self::Incremental)
    }
}

// ============================================================================
// Field Type
// ============================================================================

/// Semantic type of a stream field, used for schema emission and for
/// coercing report CSV cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldType {
    #[default]
    String,
    Integer,
    Number,
    Boolean,
    /// ISO-8601 date (`2024-01-31`)
    Date,
    /// ISO-8601 datetime, always UTC
    DateTime,
    Object,
    Array,
}

impl FieldType {
    /// JSON-schema fragment for this type
    pub fn json_schema(self) -> JsonValue {
        match self {
            FieldType::String => serde_json::json!({ "type": ["null", "string"] }),
            FieldType::Integer => serde_json::json!({ "type": ["null", "integer"] }),
            FieldType::Number => serde_json::json!({ "type": ["null", "number"] }),
            FieldType::Boolean => serde_json::json!({ "type": ["null", "boolean"] }),
            FieldType::Date => {
                serde_json::json!({ "type": ["null", "string"], "format": "date" })
            }
            FieldType::DateTime => {
                serde_json::json!({ "type": ["null", "string"], "format": "date-time" })
            }
            FieldType::Object => serde_json::json!({ "type": ["null", "object"] }),
            FieldType::Array => serde_json::json!({ "type": ["null", "array"] }),
        }
    }
}

// ============================================================================
// Utilities
// ============================================================================

/// Extension trait for Option<String> to handle empty strings
pub trait OptionStringExt {
    /// Returns None if the string is empty
    fn none_if_empty(self) -> Option<String>;
}

impl OptionStringExt for Option<String> {
    fn none_if_empty(self) -> Option<String> {
        self.filter(|s| !s.is_empty())
    }
}

impl OptionStringExt for String {
    fn none_if_empty(self) -> Option<String> {
        if self.is_empty() {
            None
        } else {
            Some(self)
        }
    }
}
