//! Bookmark manager
//!
//! All state mutation during a sync goes through this type; nothing else
//! writes bookmarks. Saves are atomic (temp file then rename). The stored
//! report bookmark is the raw sync date; the conversion-window lookback is
//! applied only when deriving the next run's query floor.

use super::types::State;
use crate::error::{Error, Result};
use crate::types::JsonValue;
use chrono::{Duration, NaiveDate};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::RwLock;

/// Bookmark manager holding the process-wide state map
#[derive(Debug)]
pub struct BookmarkManager {
    /// Path to the state file; empty in in-memory mode
    path: PathBuf,
    /// Current state (cached)
    state: Arc<RwLock<State>>,
}

impl BookmarkManager {
    /// Create an in-memory manager (no file persistence)
    pub fn in_memory() -> Self {
        Self {
            path: PathBuf::new(),
            state: Arc::new(RwLock::new(State::new())),
        }
    }

    /// Load from a state file, starting empty if the file does not exist
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let state = if path.exists() {
            let contents = std::fs::read_to_string(&path).map_err(|e| Error::State {
                message: format!("Failed to read state file: {e}"),
            })?;
            serde_json::from_str(&contents).map_err(|e| Error::State {
                message: format!("Failed to parse state file: {e}"),
            })?
        } else {
            State::new()
        };

        Ok(Self {
            path,
            state: Arc::new(RwLock::new(state)),
        })
    }

    /// Create from an inline JSON string
    pub fn from_json(json: &str) -> Result<Self> {
        let state: State = serde_json::from_str(json).map_err(|e| Error::State {
            message: format!("Failed to parse state JSON: {e}"),
        })?;
        Ok(Self {
            path: PathBuf::new(),
            state: Arc::new(RwLock::new(state)),
        })
    }

    /// Bookmark namespace for a stream, prefixed by account for report
    /// streams
    pub fn stream_key(stream: &str, account: Option<&str>) -> String {
        match account {
            Some(account) => format!("{account}_{stream}"),
            None => stream.to_string(),
        }
    }

    /// Read a bookmark
    pub async fn get_bookmark(
        &self,
        stream: &str,
        account: Option<&str>,
        key: &str,
    ) -> Option<JsonValue> {
        let state = self.state.read().await;
        state
            .get(&Self::stream_key(stream, account), key)
            .cloned()
    }

    /// Write a bookmark unconditionally
    pub async fn set_bookmark(
        &self,
        stream: &str,
        account: Option<&str>,
        key: &str,
        value: JsonValue,
    ) {
        let mut state = self.state.write().await;
        state.set(&Self::stream_key(stream, account), key, value);
    }

    /// Advance a bookmark, keeping it monotonically non-decreasing
    ///
    /// ISO-8601 strings compare correctly lexicographically, so a plain
    /// string comparison is the ordering here.
    pub async fn advance_bookmark(
        &self,
        stream: &str,
        account: Option<&str>,
        key: &str,
        value: &str,
    ) {
        let mut state = self.state.write().await;
        let stream_key = Self::stream_key(stream, account);
        let current = state
            .get(&stream_key, key)
            .and_then(JsonValue::as_str)
            .map(String::from);
        if current.as_deref() < Some(value) {
            state.set(&stream_key, key, JsonValue::String(value.to_string()));
        }
    }

    /// Query floor for a report stream
    ///
    /// The stored bookmark is the date of the last sync; the next request
    /// starts `conversion_window` days earlier to pick up late-arriving
    /// attribution, but never before the configured start date.
    pub async fn report_start_date(
        &self,
        stream: &str,
        account: &str,
        config_start: NaiveDate,
        conversion_window: i64,
    ) -> NaiveDate {
        let bookmark = self
            .get_bookmark(stream, Some(account), "date")
            .await
            .and_then(|v| v.as_str().and_then(|s| s.parse::<NaiveDate>().ok()));

        match bookmark {
            Some(date) => {
                let adjusted = date - Duration::days(conversion_window);
                std::cmp::max(adjusted, config_start)
            }
            None => config_start,
        }
    }

    /// Clone the current state for STATE message emission
    pub async fn snapshot(&self) -> State {
        self.state.read().await.clone()
    }

    /// Export as a JSON string
    pub async fn to_json(&self) -> Result<String> {
        let state = self.state.read().await;
        serde_json::to_string(&*state).map_err(|e| Error::State {
            message: format!("Failed to serialize state: {e}"),
        })
    }

    /// Save current state to the backing file
    pub async fn save(&self) -> Result<()> {
        if self.path.as_os_str().is_empty() {
            return Ok(()); // In-memory mode
        }

        let contents = {
            let state = self.state.read().await;
            serde_json::to_string_pretty(&*state).map_err(|e| Error::State {
                message: format!("Failed to serialize state: {e}"),
            })?
        };

        // Write to temp file first, then rename for atomicity
        let temp_path = self.path.with_extension("tmp");
        tokio::fs::write(&temp_path, &contents)
            .await
            .map_err(|e| Error::State {
                message: format!("Failed to write state file: {e}"),
            })?;

        tokio::fs::rename(&temp_path, &self.path)
            .await
            .map_err(|e| Error::State {
                message: format!("Failed to rename state file: {e}"),
            })?;

        Ok(())
    }

    /// Check if using in-memory mode
    pub fn is_in_memory(&self) -> bool {
        self.path.as_os_str().is_empty()
    }
}

impl Clone for BookmarkManager {
    fn clone(&self) -> Self {
        Self {
            path: self.path.clone(),
            state: Arc::clone(&self.state),
        }
    }
}
