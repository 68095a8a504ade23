//! Catalog types
//!
//! [`StreamDef`] is a registry entry describing one stream; [`Catalog`] and
//! [`CatalogEntry`] are the serialized discovery document, which doubles as
//! the sync input once `selected`/`selected_fields` are annotated.

use super::streams::StreamKind;
use crate::error::{Error, Result};
use crate::types::{FieldType, JsonValue, ReplicationMethod};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Static definition of one stream
#[derive(Debug, Clone)]
pub struct StreamDef {
    /// Stream identifier
    pub name: &'static str,
    /// Core object stream or asynchronous report stream
    pub kind: StreamKind,
    /// Primary key fields
    pub key_properties: &'static [&'static str],
    /// Replication method
    pub replication: ReplicationMethod,
    /// Replication key for incremental streams
    pub replication_key: Option<&'static str>,
    /// Foreign keys into parent streams, always emitted
    pub foreign_keys: &'static [&'static str],
    /// Field name and semantic type, in schema order
    pub fields: &'static [(&'static str, FieldType)],
    /// Columns the platform requires on every report request
    pub required_columns: &'static [&'static str],
    /// Statistic columns; a report request must carry at least one
    pub measure_columns: &'static [&'static str],
}

impl StreamDef {
    /// Whether this is a report stream
    pub fn is_report(&self) -> bool {
        matches!(self.kind, StreamKind::Report)
    }

    /// Fields always included in output regardless of selection
    pub fn automatic_fields(&self) -> BTreeSet<&'static str> {
        let mut fields: BTreeSet<&'static str> = self.key_properties.iter().copied().collect();
        fields.extend(self.foreign_keys.iter().copied());
        if let Some(key) = self.replication_key {
            fields.insert(key);
        }
        fields
    }

    /// JSON schema for this stream
    pub fn schema(&self) -> JsonValue {
        let properties: serde_json::Map<String, JsonValue> = self
            .fields
            .iter()
            .map(|(name, field_type)| ((*name).to_string(), field_type.json_schema()))
            .collect();
        serde_json::json!({
            "type": "object",
            "additionalProperties": false,
            "properties": properties,
        })
    }

    /// Look up the declared type of a field, defaulting to string
    pub fn field_type(&self, field: &str) -> FieldType {
        self.fields
            .iter()
            .find(|(name, _)| *name == field)
            .map_or(FieldType::String, |(_, field_type)| *field_type)
    }
}

/// Discovery catalog: every known stream with its schema
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Catalog {
    /// Catalog entries, one per stream
    pub streams: Vec<CatalogEntry>,
}

impl Catalog {
    /// Look up an entry by stream id
    pub fn get(&self, stream: &str) -> Option<&CatalogEntry> {
        self.streams.iter().find(|e| e.tap_stream_id == stream)
    }

    /// Whether a stream is selected for sync
    pub fn is_selected(&self, stream: &str) -> bool {
        self.get(stream).is_some_and(|e| e.selected)
    }

    /// All selected entries, in catalog order
    pub fn selected_streams(&self) -> impl Iterator<Item = &CatalogEntry> {
        self.streams.iter().filter(|e| e.selected)
    }

    /// Parse a catalog from JSON
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Load a catalog from a JSON file
    pub fn from_file(path: impl AsRef<std::path::Path>) -> Result<Self> {
        let contents = std::fs::read_to_string(path.as_ref()).map_err(|e| Error::Config {
            message: format!("Failed to read catalog file: {e}"),
        })?;
        Self::from_json(&contents)
    }
}

/// One stream in the catalog document
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogEntry {
    /// Stream identifier
    pub tap_stream_id: String,
    /// Primary key fields
    pub key_properties: Vec<String>,
    /// Replication method
    pub replication_method: ReplicationMethod,
    /// Replication key for incremental streams
    #[serde(skip_serializing_if = "Option::is_none")]
    pub replication_key: Option<String>,
    /// JSON schema for emitted records
    pub schema: JsonValue,
    /// Whether this stream is selected for sync
    #[serde(default)]
    pub selected: bool,
    /// Selected fields; empty means all fields
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub selected_fields: Vec<String>,
}

impl CatalogEntry {
    /// Build a discovery entry from a registry definition
    pub fn from_def(def: &StreamDef) -> Result<Self> {
        if def.fields.is_empty() {
            return Err(Error::SchemaResolution {
                type_name: def.name.to_string(),
            });
        }
        Ok(Self {
            tap_stream_id: def.name.to_string(),
            key_properties: def.key_properties.iter().map(|s| (*s).to_string()).collect(),
            replication_method: def.replication,
            replication_key: def.replication_key.map(String::from),
            schema: def.schema(),
            selected: false,
            selected_fields: Vec::new(),
        })
    }

    /// Whether a field survives selection filtering
    ///
    /// Automatic fields (primary, replication, and foreign keys) are always
    /// kept; with no explicit selection every field is kept.
    pub fn field_selected(&self, def: &StreamDef, field: &str) -> bool {
        if def.automatic_fields().contains(field) {
            return true;
        }
        self.selected_fields.is_empty() || self.selected_fields.iter().any(|f| f == field)
    }
}
