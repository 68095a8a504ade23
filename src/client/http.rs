//! HTTP implementation of the platform API
//!
//! One persistent reqwest session carries every call, including report
//! downloads. Each operation is wrapped by the retry executor; the rate
//! limiter gates individual attempts.

use super::api::{AdsApi, ReportPoll, ReportRequest, ReportStatus};
use super::auth::TokenProvider;
use super::rate_limit::{RateLimiter, RateLimiterConfig};
use crate::config::ConnectorConfig;
use crate::error::{Error, Result};
use crate::retry::{redact, Retryer, RetryPolicy};
use crate::types::{JsonValue, OptionStringExt};
use async_trait::async_trait;
use reqwest::{Client, Method};
use tracing::debug;

/// Default platform API base URL
pub const DEFAULT_API_URL: &str = "https://ads.example.com/api/v13";

/// Default OAuth token endpoint
pub const DEFAULT_TOKEN_URL: &str = "https://login.example.com/oauth2/token";

/// reqwest-backed [`AdsApi`] implementation
pub struct HttpAdsClient {
    http: Client,
    base_url: String,
    customer_id: String,
    developer_token: String,
    token: TokenProvider,
    rate_limiter: RateLimiter,
    retryer: Retryer,
}

impl HttpAdsClient {
    /// Build a client from connector configuration
    pub fn from_config(config: &ConnectorConfig) -> Result<Self> {
        let http = Client::builder()
            .timeout(config.request_timeout())
            .user_agent(format!("adsync/{}", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(Error::Http)?;

        let token_url = config
            .token_url
            .clone()
            .unwrap_or_else(|| DEFAULT_TOKEN_URL.to_string());
        let base_url = config
            .api_url
            .clone()
            .unwrap_or_else(|| DEFAULT_API_URL.to_string());

        debug!(
            customer_id = %config.customer_id,
            developer_token = %redact(&config.developer_token),
            %base_url,
            "building platform client"
        );

        let token = TokenProvider::new(
            token_url,
            &config.oauth_client_id,
            &config.oauth_client_secret,
            &config.refresh_token,
            http.clone(),
        );

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            customer_id: config.customer_id.clone(),
            developer_token: config.developer_token.clone(),
            token,
            rate_limiter: RateLimiter::new(&RateLimiterConfig::default()),
            retryer: Retryer::new(RetryPolicy::default()),
        })
    }

    /// Override the retry policy (tests use near-zero backoff)
    #[must_use]
    pub fn with_retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.retryer = Retryer::new(policy);
        self
    }

    /// Total time spent in retry backoff so far
    pub fn total_backoff(&self) -> std::time::Duration {
        self.retryer.total_backoff()
    }

    /// Issue one request attempt and parse the JSON body
    async fn request_json(
        &self,
        method: Method,
        path: &str,
        query: &[(String, String)],
        body: Option<&JsonValue>,
    ) -> Result<JsonValue> {
        self.rate_limiter.wait().await;

        let bearer = self.token.bearer_token().await?;
        let url = format!("{}{path}", self.base_url);

        let mut req = self
            .http
            .request(method, &url)
            .bearer_auth(bearer)
            .header("DeveloperToken", &self.developer_token)
            .header("CustomerId", &self.customer_id);

        if !query.is_empty() {
            req = req.query(query);
        }
        if let Some(body) = body {
            req = req.json(body);
        }

        let response = req.send().await.map_err(Error::Http)?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::HttpStatus {
                status: status.as_u16(),
                body,
            });
        }

        response.json().await.map_err(Error::Http)
    }

    /// Fetch a list endpoint through the retry executor
    async fn get_list(
        &self,
        operation: &str,
        account: Option<&str>,
        path: &str,
        query: &[(String, String)],
        records_key: &str,
    ) -> Result<Vec<JsonValue>> {
        let body = self
            .retryer
            .call(operation, account, || {
                self.request_json(Method::GET, path, query, None)
            })
            .await?;

        match body.get(records_key) {
            Some(JsonValue::Array(items)) => Ok(items.clone()),
            Some(JsonValue::Null) | None => Ok(Vec::new()),
            Some(other) => Ok(vec![other.clone()]),
        }
    }
}

#[async_trait]
impl AdsApi for HttpAdsClient {
    async fn get_accounts(&self) -> Result<Vec<JsonValue>> {
        let path = format!("/customers/{}/accounts", self.customer_id);
        self.get_list("get_accounts", None, &path, &[], "accounts")
            .await
    }

    async fn get_campaigns(&self, account_id: &str) -> Result<Vec<JsonValue>> {
        let path = format!("/accounts/{account_id}/campaigns");
        self.get_list("get_campaigns", Some(account_id), &path, &[], "campaigns")
            .await
    }

    async fn get_ad_groups(&self, account_id: &str, campaign_id: &str) -> Result<Vec<JsonValue>> {
        let path = format!("/accounts/{account_id}/campaigns/{campaign_id}/adgroups");
        self.get_list("get_ad_groups", Some(account_id), &path, &[], "ad_groups")
            .await
    }

    async fn get_ads(&self, account_id: &str, ad_group_id: &str) -> Result<Vec<JsonValue>> {
        let path = format!("/accounts/{account_id}/adgroups/{ad_group_id}/ads");
        self.get_list("get_ads", Some(account_id), &path, &[], "ads")
            .await
    }

    async fn submit_report(&self, account_id: &str, request: &ReportRequest) -> Result<String> {
        let body = serde_json::to_value(request)?;
        let response = self
            .retryer
            .call("submit_report", Some(account_id), || {
                self.request_json(Method::POST, "/reports/submit", &[], Some(&body))
            })
            .await?;

        response
            .get("request_id")
            .and_then(JsonValue::as_str)
            .map(String::from)
            .ok_or_else(|| Error::Other("report submit response missing request_id".to_string()))
    }

    async fn poll_report(&self, account_id: &str, request_id: &str) -> Result<ReportPoll> {
        let path = format!("/reports/{request_id}");
        let query = [("account_id".to_string(), account_id.to_string())];
        let response = self
            .retryer
            .call("poll_report", Some(account_id), || {
                self.request_json(Method::GET, &path, &query, None)
            })
            .await?;

        let status = match response.get("status").and_then(JsonValue::as_str) {
            Some("Success") => ReportStatus::Success,
            Some("Error" | "Failed") => ReportStatus::Error,
            // Anything unrecognized keeps polling
            _ => ReportStatus::Pending,
        };
        let download_url = response
            .get("download_url")
            .and_then(JsonValue::as_str)
            .map(String::from)
            .none_if_empty();

        Ok(ReportPoll {
            status,
            download_url,
        })
    }

    async fn download_report(&self, url: &str) -> Result<bytes::Bytes> {
        let url = url.to_string();
        self.retryer
            .call("download_report", None, || {
                let url = url.clone();
                async move {
                    self.rate_limiter.wait().await;
                    let response = self.http.get(&url).send().await.map_err(Error::Http)?;
                    let status = response.status();
                    if !status.is_success() {
                        let body = response.text().await.unwrap_or_default();
                        return Err(Error::HttpStatus {
                            status: status.as_u16(),
                            body,
                        });
                    }
                    response.bytes().await.map_err(Error::Http)
                }
            })
            .await
    }
}

impl std::fmt::Debug for HttpAdsClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpAdsClient")
            .field("base_url", &self.base_url)
            .field("customer_id", &self.customer_id)
            .finish_non_exhaustive()
    }
}
