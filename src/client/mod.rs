//! Remote ads platform client
//!
//! [`AdsApi`] is the seam between the sync pipeline and the platform: the
//! production implementation is [`HttpAdsClient`] (reqwest, OAuth refresh,
//! rate limiting, retry on every call); tests substitute a mock.

mod api;
mod auth;
mod http;
mod rate_limit;

pub use api::{AdsApi, ReportPoll, ReportRequest, ReportStatus};
pub use auth::TokenProvider;
pub use http::HttpAdsClient;
pub use rate_limit::{RateLimiter, RateLimiterConfig};

#[cfg(test)]
mod tests;
