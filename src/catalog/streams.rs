//! Static stream registry
//!
//! Core object streams mirror the account hierarchy; report streams map to
//! asynchronously generated reports. Report columns keep the vendor's
//! PascalCase names since they come straight out of the downloaded CSV.

use super::types::StreamDef;
use crate::types::{FieldType, ReplicationMethod};
use once_cell::sync::Lazy;
use std::collections::HashMap;

/// Kind of stream
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamKind {
    /// Plain listing of remote objects
    Core,
    /// Asynchronous report job (submit, poll, download)
    Report,
}

const REPORT_REQUIRED: &[&str] = &["TimePeriod", "AccountId"];
const REPORT_MEASURES: &[&str] = &[
    "Clicks",
    "Impressions",
    "Spend",
    "Conversions",
    "Ctr",
    "AverageCpc",
];

macro_rules! report_fields {
    ($($name:literal => $ty:expr),* $(,)?) => {
        &[
            ("TimePeriod", FieldType::Date),
            ("AccountId", FieldType::Integer),
            $(($name, $ty),)*
            ("Clicks", FieldType::Integer),
            ("Impressions", FieldType::Integer),
            ("Spend", FieldType::Number),
            ("Conversions", FieldType::Integer),
            ("Ctr", FieldType::Number),
            ("AverageCpc", FieldType::Number),
        ]
    };
}

static STREAMS: Lazy<Vec<StreamDef>> = Lazy::new(|| {
    vec![
        StreamDef {
            name: "accounts",
            kind: StreamKind::Core,
            key_properties: &["id"],
            replication: ReplicationMethod::Incremental,
            replication_key: Some("last_modified_time"),
            foreign_keys: &[],
            fields: &[
                ("id", FieldType::String),
                ("name", FieldType::String),
                ("number", FieldType::String),
                ("currency_code", FieldType::String),
                ("time_zone", FieldType::String),
                ("last_modified_time", FieldType::DateTime),
            ],
            required_columns: &[],
            measure_columns: &[],
        },
        StreamDef {
            name: "campaigns",
            kind: StreamKind::Core,
            key_properties: &["id"],
            replication: ReplicationMethod::FullTable,
            replication_key: None,
            foreign_keys: &["account_id"],
            fields: &[
                ("id", FieldType::String),
                ("account_id", FieldType::String),
                ("name", FieldType::String),
                ("status", FieldType::String),
                ("budget_type", FieldType::String),
                ("daily_budget", FieldType::Number),
                ("time_zone", FieldType::String),
            ],
            required_columns: &[],
            measure_columns: &[],
        },
        StreamDef {
            name: "ad_groups",
            kind: StreamKind::Core,
            key_properties: &["id"],
            replication: ReplicationMethod::FullTable,
            replication_key: None,
            foreign_keys: &["account_id", "campaign_id"],
            fields: &[
                ("id", FieldType::String),
                ("account_id", FieldType::String),
                ("campaign_id", FieldType::String),
                ("name", FieldType::String),
                ("status", FieldType::String),
                ("start_date", FieldType::Date),
                ("end_date", FieldType::Date),
                ("language", FieldType::String),
            ],
            required_columns: &[],
            measure_columns: &[],
        },
        StreamDef {
            name: "ads",
            kind: StreamKind::Core,
            key_properties: &["id"],
            replication: ReplicationMethod::FullTable,
            replication_key: None,
            foreign_keys: &["account_id", "ad_group_id"],
            fields: &[
                ("id", FieldType::String),
                ("account_id", FieldType::String),
                ("ad_group_id", FieldType::String),
                ("title", FieldType::String),
                ("text", FieldType::String),
                ("status", FieldType::String),
                ("type", FieldType::String),
                ("final_urls", FieldType::Array),
            ],
            required_columns: &[],
            measure_columns: &[],
        },
        StreamDef {
            name: "account_performance_report",
            kind: StreamKind::Report,
            key_properties: &[],
            replication: ReplicationMethod::Incremental,
            replication_key: Some("date"),
            foreign_keys: &[],
            fields: report_fields![
                "AccountName" => FieldType::String,
                "DeviceType" => FieldType::String,
            ],
            required_columns: REPORT_REQUIRED,
            measure_columns: REPORT_MEASURES,
        },
        StreamDef {
            name: "campaign_performance_report",
            kind: StreamKind::Report,
            key_properties: &[],
            replication: ReplicationMethod::Incremental,
            replication_key: Some("date"),
            foreign_keys: &[],
            fields: report_fields![
                "CampaignId" => FieldType::Integer,
                "CampaignName" => FieldType::String,
                "CampaignStatus" => FieldType::String,
                "DeviceType" => FieldType::String,
            ],
            required_columns: REPORT_REQUIRED,
            measure_columns: REPORT_MEASURES,
        },
        StreamDef {
            name: "ad_group_performance_report",
            kind: StreamKind::Report,
            key_properties: &[],
            replication: ReplicationMethod::Incremental,
            replication_key: Some("date"),
            foreign_keys: &[],
            fields: report_fields![
                "CampaignId" => FieldType::Integer,
                "AdGroupId" => FieldType::Integer,
                "AdGroupName" => FieldType::String,
                "Language" => FieldType::String,
            ],
            required_columns: REPORT_REQUIRED,
            measure_columns: REPORT_MEASURES,
        },
        StreamDef {
            name: "keyword_performance_report",
            kind: StreamKind::Report,
            key_properties: &[],
            replication: ReplicationMethod::Incremental,
            replication_key: Some("date"),
            foreign_keys: &[],
            fields: report_fields![
                "CampaignId" => FieldType::Integer,
                "AdGroupId" => FieldType::Integer,
                "KeywordId" => FieldType::Integer,
                "Keyword" => FieldType::String,
                "BidMatchType" => FieldType::String,
                "DeviceType" => FieldType::String,
            ],
            required_columns: REPORT_REQUIRED,
            measure_columns: REPORT_MEASURES,
        },
        StreamDef {
            name: "ad_performance_report",
            kind: StreamKind::Report,
            key_properties: &[],
            replication: ReplicationMethod::Incremental,
            replication_key: Some("date"),
            foreign_keys: &[],
            fields: report_fields![
                "CampaignId" => FieldType::Integer,
                "AdGroupId" => FieldType::Integer,
                "AdId" => FieldType::Integer,
                "AdTitle" => FieldType::String,
                "AdType" => FieldType::String,
            ],
            required_columns: REPORT_REQUIRED,
            measure_columns: REPORT_MEASURES,
        },
        StreamDef {
            name: "geographic_performance_report",
            kind: StreamKind::Report,
            key_properties: &[],
            replication: ReplicationMethod::Incremental,
            replication_key: Some("date"),
            foreign_keys: &[],
            fields: report_fields![
                "CampaignId" => FieldType::Integer,
                "Country" => FieldType::String,
                "Region" => FieldType::String,
                "City" => FieldType::String,
                "BusinessCategoryName" => FieldType::String,
            ],
            required_columns: REPORT_REQUIRED,
            measure_columns: REPORT_MEASURES,
        },
    ]
});

/// Vendor CSV headers that drifted from the documented column names
static COLUMN_ALIASES: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
    HashMap::from([
        ("BusinessCatName", "BusinessCategoryName"),
        ("BusinessCatId", "BusinessCategoryId"),
        ("AvgCPC", "AverageCpc"),
        ("AvgCPM", "AverageCpm"),
    ])
});

/// All registered streams, in sync order
pub fn stream_defs() -> &'static [StreamDef] {
    &STREAMS
}

/// Look up one stream definition
pub fn stream_def(name: &str) -> Option<&'static StreamDef> {
    STREAMS.iter().find(|def| def.name == name)
}

/// Canonical name for a CSV header, applying vendor alias drift
pub fn column_alias(header: &str) -> &str {
    COLUMN_ALIASES.get(header).copied().unwrap_or(header)
}

/// Declared type of a report column, default string
pub fn report_field_type(stream: &str, column: &str) -> FieldType {
    stream_def(stream).map_or(FieldType::String, |def| def.field_type(column))
}
