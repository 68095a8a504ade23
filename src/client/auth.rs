//! OAuth refresh-token exchange
//!
//! The platform hands out short-lived bearer tokens against a long-lived
//! refresh token. The provider caches the current token and refreshes it
//! just before expiry; callers only ever see a valid bearer string.

use crate::error::{Error, Result};
use chrono::{DateTime, Duration, Utc};
use reqwest::Client;
use serde::Deserialize;
use tokio::sync::RwLock;
use tracing::debug;

/// Refresh margin so a token is never used right at its expiry
const EXPIRY_MARGIN_SECS: i64 = 60;

#[derive(Debug, Clone)]
struct CachedToken {
    token: String,
    expires_at: DateTime<Utc>,
}

impl CachedToken {
    fn is_expired(&self) -> bool {
        Utc::now() + Duration::seconds(EXPIRY_MARGIN_SECS) >= self.expires_at
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default = "default_expires_in")]
    expires_in: i64,
}

fn default_expires_in() -> i64 {
    3600
}

/// Caching bearer-token provider backed by the OAuth refresh flow
pub struct TokenProvider {
    token_url: String,
    client_id: String,
    client_secret: String,
    refresh_token: String,
    http_client: Client,
    cached: RwLock<Option<CachedToken>>,
}

impl TokenProvider {
    /// Create a provider sharing the connector's HTTP client
    pub fn new(
        token_url: impl Into<String>,
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
        refresh_token: impl Into<String>,
        http_client: Client,
    ) -> Self {
        Self {
            token_url: token_url.into(),
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            refresh_token: refresh_token.into(),
            http_client,
            cached: RwLock::new(None),
        }
    }

    /// Get a valid bearer token, refreshing if necessary
    pub async fn bearer_token(&self) -> Result<String> {
        {
            let cached = self.cached.read().await;
            if let Some(token) = cached.as_ref() {
                if !token.is_expired() {
                    return Ok(token.token.clone());
                }
            }
        }

        let mut cached = self.cached.write().await;
        // Re-check after acquiring the write lock
        if let Some(token) = cached.as_ref() {
            if !token.is_expired() {
                return Ok(token.token.clone());
            }
        }

        let new_token = self.refresh().await?;
        let token = new_token.token.clone();
        *cached = Some(new_token);
        Ok(token)
    }

    async fn refresh(&self) -> Result<CachedToken> {
        debug!("refreshing OAuth access token");

        let form = [
            ("grant_type", "refresh_token"),
            ("client_id", self.client_id.as_str()),
            ("client_secret", self.client_secret.as_str()),
            ("refresh_token", self.refresh_token.as_str()),
        ];

        let response = self
            .http_client
            .post(&self.token_url)
            .form(&form)
            .send()
            .await
            .map_err(Error::Http)?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::TokenRefresh {
                status,
                message: body,
            });
        }

        let token_response: TokenResponse = response.json().await.map_err(Error::Http)?;
        Ok(CachedToken {
            token: token_response.access_token,
            expires_at: Utc::now() + Duration::seconds(token_response.expires_in),
        })
    }
}

impl std::fmt::Debug for TokenProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenProvider")
            .field("token_url", &self.token_url)
            .field("client_id", &self.client_id)
            .finish_non_exhaustive()
    }
}
