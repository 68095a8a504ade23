use super::*;
use crate::client::{ReportPoll, ReportRequest, ReportStatus};
use crate::error::Error;
use crate::output::SingerWriter;
use crate::report::ReportJobConfig;
use async_trait::async_trait;
use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};

/// In-memory API double holding a small account hierarchy
#[derive(Default)]
struct MockAdsApi {
    accounts: Vec<JsonValue>,
    campaigns: HashMap<String, Vec<JsonValue>>,
    ad_groups: HashMap<(String, String), Vec<JsonValue>>,
    ads: HashMap<(String, String), Vec<JsonValue>>,
    fail_campaigns_for: Option<String>,
    report_payload: Option<Vec<u8>>,
    ad_group_calls: AtomicU32,
}

#[async_trait]
impl AdsApi for MockAdsApi {
    async fn get_accounts(&self) -> Result<Vec<JsonValue>> {
        Ok(self.accounts.clone())
    }

    async fn get_campaigns(&self, account_id: &str) -> Result<Vec<JsonValue>> {
        if self.fail_campaigns_for.as_deref() == Some(account_id) {
            return Err(Error::http_status(400, "InvalidAccountId"));
        }
        Ok(self.campaigns.get(account_id).cloned().unwrap_or_default())
    }

    async fn get_ad_groups(&self, account_id: &str, campaign_id: &str) -> Result<Vec<JsonValue>> {
        self.ad_group_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self
            .ad_groups
            .get(&(account_id.to_string(), campaign_id.to_string()))
            .cloned()
            .unwrap_or_default())
    }

    async fn get_ads(&self, account_id: &str, ad_group_id: &str) -> Result<Vec<JsonValue>> {
        Ok(self
            .ads
            .get(&(account_id.to_string(), ad_group_id.to_string()))
            .cloned()
            .unwrap_or_default())
    }

    async fn submit_report(&self, _account_id: &str, _request: &ReportRequest) -> Result<String> {
        Ok("req-1".to_string())
    }

    async fn poll_report(&self, _account_id: &str, _request_id: &str) -> Result<ReportPoll> {
        let url = self.report_payload.as_ref().map(|_| "mock://report");
        Ok(ReportPoll::new(ReportStatus::Success, url))
    }

    async fn download_report(&self, _url: &str) -> Result<bytes::Bytes> {
        Ok(bytes::Bytes::from(self.report_payload.clone().unwrap()))
    }
}

fn zip_payload(csv: &str) -> Vec<u8> {
    use std::io::{Cursor, Write as _};
    use zip::write::SimpleFileOptions;

    let mut buf = Cursor::new(Vec::new());
    {
        let mut writer = zip::ZipWriter::new(&mut buf);
        writer
            .start_file("report.csv", SimpleFileOptions::default())
            .unwrap();
        writer.write_all(csv.as_bytes()).unwrap();
        writer.finish().unwrap();
    }
    buf.into_inner()
}

fn test_config() -> ConnectorConfig {
    ConnectorConfig::from_json(
        r#"{
            "start_date": "2024-01-01",
            "customer_id": "C100",
            "oauth_client_id": "id",
            "oauth_client_secret": "secret",
            "refresh_token": "refresh",
            "developer_token": "dev"
        }"#,
    )
    .unwrap()
}

fn catalog_with(selected: &[&str]) -> Catalog {
    let mut catalog = crate::catalog::discover().unwrap();
    for entry in &mut catalog.streams {
        entry.selected = selected.contains(&entry.tap_stream_id.as_str());
    }
    catalog
}

fn hierarchy_api() -> MockAdsApi {
    let mut api = MockAdsApi {
        accounts: vec![json!({
            "id": "A1",
            "name": "Account One",
            "last_modified_time": "2024-02-01T10:00:00Z"
        })],
        ..MockAdsApi::default()
    };
    api.campaigns.insert(
        "A1".to_string(),
        vec![json!({ "id": "C1", "account_id": "A1", "name": "spring", "status": "Active" })],
    );
    api.ad_groups.insert(
        ("A1".to_string(), "C1".to_string()),
        vec![json!({ "id": "G1", "account_id": "A1", "campaign_id": "C1", "name": "group one" })],
    );
    api.ads.insert(
        ("A1".to_string(), "G1".to_string()),
        vec![json!({ "id": "AD1", "account_id": "A1", "ad_group_id": "G1", "title": "buy now" })],
    );
    api
}

async fn run_pipeline(
    api: &MockAdsApi,
    config: &ConnectorConfig,
    catalog: &Catalog,
    bookmarks: &BookmarkManager,
) -> (SyncStats, Vec<Value>) {
    let mut writer = SingerWriter::new(Vec::new());
    let stats = SyncPipeline::new(api, config, catalog, bookmarks, &mut writer)
        .with_report_config(ReportJobConfig::fast())
        .run()
        .await
        .unwrap();
    let lines = String::from_utf8(writer.into_inner())
        .unwrap()
        .lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect();
    (stats, lines)
}

fn messages_of<'a>(lines: &'a [Value], kind: &str) -> Vec<&'a Value> {
    lines.iter().filter(|m| m["type"] == kind).collect()
}

#[tokio::test]
async fn test_hierarchy_walk_emits_selected_streams() {
    let api = hierarchy_api();
    let config = test_config();
    let catalog = catalog_with(&["accounts", "campaigns", "ads"]);
    let bookmarks = BookmarkManager::in_memory();

    let (stats, lines) = run_pipeline(&api, &config, &catalog, &bookmarks).await;

    let schemas: Vec<&str> = messages_of(&lines, "SCHEMA")
        .iter()
        .map(|m| m["stream"].as_str().unwrap())
        .collect();
    assert_eq!(schemas, vec!["accounts", "campaigns", "ads"]);

    let records: Vec<&str> = messages_of(&lines, "RECORD")
        .iter()
        .map(|m| m["stream"].as_str().unwrap())
        .collect();
    assert_eq!(records, vec!["accounts", "campaigns", "ads"]);

    // Ad groups were traversed to reach ads even though they are not emitted
    assert_eq!(api.ad_group_calls.load(Ordering::SeqCst), 1);
    assert_eq!(stats.total_records(), 3);
    assert!(!stats.has_failures());
}

#[tokio::test]
async fn test_unselected_children_not_fetched() {
    let api = hierarchy_api();
    let config = test_config();
    let catalog = catalog_with(&["campaigns"]);
    let bookmarks = BookmarkManager::in_memory();

    let (stats, _) = run_pipeline(&api, &config, &catalog, &bookmarks).await;

    assert_eq!(api.ad_group_calls.load(Ordering::SeqCst), 0);
    assert_eq!(stats.records.get("campaigns"), Some(&1));
}

#[tokio::test]
async fn test_account_filter_limits_scope() {
    let mut api = hierarchy_api();
    api.accounts.push(json!({
        "id": "A2",
        "name": "Account Two",
        "last_modified_time": "2024-02-02T10:00:00Z"
    }));
    let mut config = test_config();
    config.account_ids = vec!["A2".to_string()];
    let catalog = catalog_with(&["accounts"]);
    let bookmarks = BookmarkManager::in_memory();

    let (_, lines) = run_pipeline(&api, &config, &catalog, &bookmarks).await;

    let records = messages_of(&lines, "RECORD");
    assert_eq!(records.len(), 1);
    assert_eq!(records[0]["record"]["id"], "A2");
}

#[tokio::test]
async fn test_accounts_incremental_filter_and_bookmark() {
    let mut api = hierarchy_api();
    api.accounts = vec![
        json!({ "id": "A1", "name": "old", "last_modified_time": "2024-01-15T00:00:00Z" }),
        json!({ "id": "A2", "name": "new", "last_modified_time": "2024-03-01T08:00:00Z" }),
    ];
    let config = test_config();
    let catalog = catalog_with(&["accounts"]);
    let bookmarks = BookmarkManager::from_json(
        r#"{ "bookmarks": { "accounts": { "last_modified_time": "2024-02-01T00:00:00Z" } } }"#,
    )
    .unwrap();

    let (stats, lines) = run_pipeline(&api, &config, &catalog, &bookmarks).await;

    let records = messages_of(&lines, "RECORD");
    assert_eq!(records.len(), 1);
    assert_eq!(records[0]["record"]["id"], "A2");
    assert_eq!(stats.records.get("accounts"), Some(&1));

    let bookmark = bookmarks
        .get_bookmark("accounts", None, "last_modified_time")
        .await
        .unwrap();
    assert_eq!(bookmark, json!("2024-03-01T08:00:00Z"));
}

#[tokio::test]
async fn test_second_run_resumes_from_advanced_bookmark() {
    let mut api = hierarchy_api();
    api.accounts = vec![
        json!({ "id": "A1", "name": "one", "last_modified_time": "2024-01-15T00:00:00Z" }),
        json!({ "id": "A2", "name": "two", "last_modified_time": "2024-03-01T08:00:00Z" }),
    ];
    let config = test_config();
    let catalog = catalog_with(&["accounts"]);
    let bookmarks = BookmarkManager::in_memory();

    let (first, _) = run_pipeline(&api, &config, &catalog, &bookmarks).await;
    assert_eq!(first.records.get("accounts"), Some(&2));
    let after_first = bookmarks
        .get_bookmark("accounts", None, "last_modified_time")
        .await
        .unwrap();
    assert_eq!(after_first, json!("2024-03-01T08:00:00Z"));

    // Same upstream data: only the record at the watermark is re-emitted
    let (second, _) = run_pipeline(&api, &config, &catalog, &bookmarks).await;
    assert_eq!(second.records.get("accounts"), Some(&1));
    assert!(second.total_records() < first.total_records());

    // The watermark does not move without newer data
    let after_second = bookmarks
        .get_bookmark("accounts", None, "last_modified_time")
        .await
        .unwrap();
    assert_eq!(after_second, after_first);
}

#[tokio::test]
async fn test_field_selection_keeps_automatic_fields() {
    let api = hierarchy_api();
    let config = test_config();
    let mut catalog = catalog_with(&["campaigns"]);
    catalog
        .streams
        .iter_mut()
        .find(|e| e.tap_stream_id == "campaigns")
        .unwrap()
        .selected_fields = vec!["name".to_string()];
    let bookmarks = BookmarkManager::in_memory();

    let (_, lines) = run_pipeline(&api, &config, &catalog, &bookmarks).await;

    let records = messages_of(&lines, "RECORD");
    let record = records[0]["record"].as_object().unwrap();
    let mut fields: Vec<&str> = record.keys().map(String::as_str).collect();
    fields.sort_unstable();
    // Primary and foreign keys survive selection; "status" does not
    assert_eq!(fields, vec!["account_id", "id", "name"]);
}

#[tokio::test]
async fn test_report_stream_emits_rows_and_advances_bookmark() {
    let mut api = hierarchy_api();
    api.report_payload = Some(zip_payload(
        "\u{1}TimePeriod,AccountId,Keyword,Clicks\n2024-03-01,101,shoes,7\n",
    ));
    let config = test_config();
    let catalog = catalog_with(&["keyword_performance_report"]);
    let bookmarks = BookmarkManager::in_memory();

    let (stats, lines) = run_pipeline(&api, &config, &catalog, &bookmarks).await;

    let records = messages_of(&lines, "RECORD");
    assert_eq!(records.len(), 1);
    assert_eq!(records[0]["stream"], "keyword_performance_report");
    assert_eq!(records[0]["record"]["Clicks"], 7);
    assert_eq!(stats.records.get("keyword_performance_report"), Some(&1));

    let today = chrono::Utc::now().date_naive().to_string();
    let bookmark = bookmarks
        .get_bookmark("keyword_performance_report", Some("A1"), "date")
        .await
        .unwrap();
    assert_eq!(bookmark, json!(today));
}

#[tokio::test]
async fn test_empty_report_still_advances_bookmark() {
    let api = hierarchy_api(); // no report payload: poll succeeds without a URL
    let config = test_config();
    let catalog = catalog_with(&["campaign_performance_report"]);
    let bookmarks = BookmarkManager::in_memory();

    let (stats, lines) = run_pipeline(&api, &config, &catalog, &bookmarks).await;

    assert!(messages_of(&lines, "RECORD").is_empty());
    assert!(!stats.has_failures());

    let today = chrono::Utc::now().date_naive().to_string();
    let bookmark = bookmarks
        .get_bookmark("campaign_performance_report", Some("A1"), "date")
        .await
        .unwrap();
    assert_eq!(bookmark, json!(today));
}

#[tokio::test]
async fn test_failed_stream_recorded_and_run_continues() {
    let mut api = hierarchy_api();
    api.fail_campaigns_for = Some("A1".to_string());
    api.report_payload = Some(zip_payload(
        "\u{1}TimePeriod,AccountId,Clicks\n2024-03-01,101,3\n",
    ));
    let config = test_config();
    let catalog = catalog_with(&["campaigns", "account_performance_report"]);
    let bookmarks = BookmarkManager::in_memory();

    let (stats, lines) = run_pipeline(&api, &config, &catalog, &bookmarks).await;

    assert!(stats.has_failures());
    assert_eq!(stats.failed, vec!["hierarchy:A1"]);

    // The report stream still ran after the hierarchy failure
    let records = messages_of(&lines, "RECORD");
    assert_eq!(records.len(), 1);
    assert_eq!(records[0]["stream"], "account_performance_report");
}

#[tokio::test]
async fn test_state_messages_carry_bookmarks() {
    let mut api = hierarchy_api();
    api.report_payload = Some(zip_payload(
        "\u{1}TimePeriod,AccountId,Clicks\n2024-03-01,101,3\n",
    ));
    let config = test_config();
    let catalog = catalog_with(&["accounts", "keyword_performance_report"]);
    let bookmarks = BookmarkManager::in_memory();

    let (_, lines) = run_pipeline(&api, &config, &catalog, &bookmarks).await;

    let states = messages_of(&lines, "STATE");
    assert!(!states.is_empty());

    let last = states.last().unwrap();
    let today = chrono::Utc::now().date_naive().to_string();
    assert_eq!(
        last["value"]["bookmarks"]["A1_keyword_performance_report"]["date"],
        Value::String(today)
    );
    assert!(last["value"]["bookmarks"]["accounts"]["last_modified_time"].is_string());
}
