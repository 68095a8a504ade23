//! Remote API trait and wire types

use crate::error::Result;
use crate::types::JsonValue;
use async_trait::async_trait;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Remote ads platform operations used by the sync pipeline
///
/// Implementations are expected to retry transient failures internally;
/// errors surfaced to callers are final.
#[async_trait]
pub trait AdsApi: Send + Sync {
    /// Fetch all accounts visible to the configured customer
    async fn get_accounts(&self) -> Result<Vec<JsonValue>>;

    /// Fetch campaigns under an account
    async fn get_campaigns(&self, account_id: &str) -> Result<Vec<JsonValue>>;

    /// Fetch ad groups under a campaign
    async fn get_ad_groups(&self, account_id: &str, campaign_id: &str) -> Result<Vec<JsonValue>>;

    /// Fetch ads under an ad group
    async fn get_ads(&self, account_id: &str, ad_group_id: &str) -> Result<Vec<JsonValue>>;

    /// Submit a report request, returning the opaque request id
    async fn submit_report(&self, account_id: &str, request: &ReportRequest) -> Result<String>;

    /// Poll a submitted report
    async fn poll_report(&self, account_id: &str, request_id: &str) -> Result<ReportPoll>;

    /// Download a finished report archive
    async fn download_report(&self, url: &str) -> Result<bytes::Bytes>;
}

/// One report request: columns, daily date range, account scope
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportRequest {
    /// Report type name
    pub report: String,
    /// Columns to include (required plus selected plus measures)
    pub columns: Vec<String>,
    /// Inclusive range start
    pub start_date: NaiveDate,
    /// Exclusive range end
    pub end_date: NaiveDate,
    /// Account scope filter
    pub account_id: String,
    /// Aggregation granularity; always daily for this connector
    pub aggregation: String,
}

/// Remote status of a submitted report
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReportStatus {
    /// Still generating; keep polling
    Pending,
    /// Finished; a download URL is present when the report has rows
    Success,
    /// The platform failed to generate the report
    Error,
}

/// One poll response
#[derive(Debug, Clone, Deserialize)]
pub struct ReportPoll {
    /// Remote status
    pub status: ReportStatus,
    /// Download URL; absent on Pending and on empty Success
    #[serde(default)]
    pub download_url: Option<String>,
}

impl ReportPoll {
    /// Convenience constructor, mostly for tests
    pub fn new(status: ReportStatus, download_url: Option<&str>) -> Self {
        Self {
            status,
            download_url: download_url.map(String::from),
        }
    }
}
