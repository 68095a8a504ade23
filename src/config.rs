//! Connector configuration
//!
//! The config is parsed once at startup into an immutable
//! [`ConnectorConfig`] that is passed by reference into the sync pipeline.
//! Nothing in the connector mutates configuration after load.

use crate::error::{Error, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Deserializer};
use std::path::Path;
use std::time::Duration;

/// Default conversion-window lookback in days
pub const DEFAULT_CONVERSION_WINDOW_DAYS: i64 = 30;

/// Default remote request timeout in seconds
pub const DEFAULT_REQUEST_TIMEOUT_SECS: f64 = 300.0;

/// Immutable connector configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ConnectorConfig {
    /// Floor for the first incremental sync (ISO-8601 date)
    pub start_date: NaiveDate,

    /// Customer (manager account) identifier
    pub customer_id: String,

    /// Comma-separated account identifiers; empty means all accounts
    #[serde(default, deserialize_with = "deserialize_account_ids")]
    pub account_ids: Vec<String>,

    /// OAuth client id
    pub oauth_client_id: String,

    /// OAuth client secret
    pub oauth_client_secret: String,

    /// OAuth refresh token
    pub refresh_token: String,

    /// Platform developer token
    pub developer_token: String,

    /// Lookback in days applied to report date floors, accounting for the
    /// platform's delayed attribution finalization
    #[serde(default = "default_conversion_window")]
    pub conversion_window: i64,

    /// Remote request timeout in seconds; accepts int, float, or string,
    /// blank falls back to the default
    #[serde(default, deserialize_with = "deserialize_request_timeout")]
    pub request_timeout: Option<f64>,

    /// Optional OAuth token endpoint override (used by tests)
    #[serde(default)]
    pub token_url: Option<String>,

    /// Optional API base URL override (used by tests)
    #[serde(default)]
    pub api_url: Option<String>,
}

impl ConnectorConfig {
    /// Load configuration from a JSON file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let contents = std::fs::read_to_string(path.as_ref()).map_err(|e| Error::Config {
            message: format!("Failed to read config file: {e}"),
        })?;
        Self::from_json(&contents)
    }

    /// Parse configuration from a JSON string
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Effective request timeout
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs_f64(self.request_timeout.unwrap_or(DEFAULT_REQUEST_TIMEOUT_SECS))
    }

    /// Whether an account passed the configured filter
    pub fn account_selected(&self, account_id: &str) -> bool {
        self.account_ids.is_empty() || self.account_ids.iter().any(|id| id == account_id)
    }

    fn validate(&self) -> Result<()> {
        if self.customer_id.is_empty() {
            return Err(Error::missing_field("customer_id"));
        }
        if self.developer_token.is_empty() {
            return Err(Error::missing_field("developer_token"));
        }
        if self.conversion_window < 0 {
            return Err(Error::InvalidConfigValue {
                field: "conversion_window".to_string(),
                message: "must be a non-negative number of days".to_string(),
            });
        }
        if let Some(timeout) = self.request_timeout {
            if timeout <= 0.0 {
                return Err(Error::InvalidConfigValue {
                    field: "request_timeout".to_string(),
                    message: "must be a positive number of seconds".to_string(),
                });
            }
        }
        Ok(())
    }
}

fn default_conversion_window() -> i64 {
    DEFAULT_CONVERSION_WINDOW_DAYS
}

/// Accept `"A1,A2"`, `""`, or a missing field
fn deserialize_account_ids<'de, D>(deserializer: D) -> std::result::Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    Ok(raw
        .unwrap_or_default()
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect())
}

/// Accept `300`, `300.5`, `"300"`, `"300.5"`, or `""` (blank → default)
fn deserialize_request_timeout<'de, D>(
    deserializer: D,
) -> std::result::Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Number(f64),
        Text(String),
    }

    match Option::<Raw>::deserialize(deserializer)? {
        None => Ok(None),
        Some(Raw::Number(n)) => Ok(Some(n)),
        Some(Raw::Text(s)) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                return Ok(None);
            }
            trimmed.parse::<f64>().map(Some).map_err(|_| {
                serde::de::Error::custom(format!("invalid request_timeout: '{s}'"))
            })
        }
    }
}
