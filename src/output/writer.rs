//! Message types and line writer

use crate::catalog::CatalogEntry;
use crate::error::{Error, Result};
use crate::state::State;
use crate::types::JsonValue;
use chrono::{SecondsFormat, Utc};
use serde::Serialize;
use std::io::Write;

/// A message in the output protocol
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "UPPERCASE")]
pub enum Message {
    /// Stream schema, emitted once before the stream's records
    Schema {
        stream: String,
        schema: JsonValue,
        key_properties: Vec<String>,
        #[serde(skip_serializing_if = "Vec::is_empty")]
        bookmark_properties: Vec<String>,
    },
    /// One emitted row
    Record {
        stream: String,
        record: JsonValue,
        time_extracted: String,
    },
    /// Bookmark snapshot at a safe checkpoint
    State { value: JsonValue },
}

impl Message {
    /// Build a SCHEMA message from a catalog entry
    pub fn schema(entry: &CatalogEntry) -> Self {
        Self::Schema {
            stream: entry.tap_stream_id.clone(),
            schema: entry.schema.clone(),
            key_properties: entry.key_properties.clone(),
            bookmark_properties: entry.replication_key.iter().cloned().collect(),
        }
    }

    /// Build a RECORD message
    pub fn record(stream: impl Into<String>, record: JsonValue) -> Self {
        Self::Record {
            stream: stream.into(),
            record,
            time_extracted: Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true),
        }
    }

    /// Build a STATE message from a bookmark snapshot
    pub fn state(state: &State) -> Result<Self> {
        Ok(Self::State {
            value: serde_json::to_value(state)?,
        })
    }
}

/// Writes one JSON message per line to the wrapped sink
#[derive(Debug)]
pub struct SingerWriter<W: Write> {
    sink: W,
}

impl<W: Write> SingerWriter<W> {
    /// Create a writer over any sink
    pub fn new(sink: W) -> Self {
        Self { sink }
    }

    /// Write a single message followed by a newline
    pub fn write(&mut self, message: &Message) -> Result<()> {
        let line = serde_json::to_string(message)?;
        writeln!(self.sink, "{line}").map_err(Error::Io)?;
        Ok(())
    }

    /// Write the schema for a stream
    pub fn write_schema(&mut self, entry: &CatalogEntry) -> Result<()> {
        self.write(&Message::schema(entry))
    }

    /// Write one record
    pub fn write_record(&mut self, stream: &str, record: JsonValue) -> Result<()> {
        self.write(&Message::record(stream, record))
    }

    /// Write the current bookmark snapshot
    pub fn write_state(&mut self, state: &State) -> Result<()> {
        self.write(&Message::state(state)?)
    }

    /// Flush the underlying sink
    pub fn flush(&mut self) -> Result<()> {
        self.sink.flush().map_err(Error::Io)
    }

    /// Consume the writer and return the sink (used by tests)
    pub fn into_inner(self) -> W {
        self.sink
    }
}
