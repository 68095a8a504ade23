//! Persisted state shape
//!
//! Serialized as `{"bookmarks": {stream_or_prefixed_stream: {key: value}}}`
//! and passed back in on the next run.

use crate::types::JsonValue;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Complete connector state
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct State {
    /// Per-stream bookmark maps
    #[serde(default)]
    pub bookmarks: HashMap<String, HashMap<String, JsonValue>>,
}

impl State {
    /// Create a new empty state
    pub fn new() -> Self {
        Self::default()
    }

    /// Get a bookmark value
    pub fn get(&self, stream: &str, key: &str) -> Option<&JsonValue> {
        self.bookmarks.get(stream)?.get(key)
    }

    /// Set a bookmark value
    pub fn set(&mut self, stream: &str, key: &str, value: JsonValue) {
        self.bookmarks
            .entry(stream.to_string())
            .or_default()
            .insert(key.to_string(), value);
    }
}
