//! Sync pipeline
//!
//! One run walks the account hierarchy top-down: accounts, then campaigns,
//! ad groups, and ads per account, then one report job per selected report
//! stream and account. A parent stream is fetched whenever any descendant
//! is selected, even if the parent itself is not emitted. A failed stream
//! is logged and skipped; the run continues and reports the failure in its
//! final stats.

mod types;

pub use types::SyncStats;

use crate::catalog::{stream_def, Catalog, CatalogEntry, StreamDef};
use crate::client::AdsApi;
use crate::config::ConnectorConfig;
use crate::error::Result;
use crate::flatten::flatten_record;
use crate::output::SingerWriter;
use crate::report::{build_request, ReportJob, ReportJobConfig, ReportOutcome};
use crate::state::BookmarkManager;
use crate::types::JsonValue;
use chrono::Utc;
use std::io::Write;
use tracing::{info, warn};

#[cfg(test)]
mod tests;

/// Drives one full sync run
pub struct SyncPipeline<'a, W: Write> {
    api: &'a dyn AdsApi,
    config: &'a ConnectorConfig,
    catalog: &'a Catalog,
    bookmarks: &'a BookmarkManager,
    writer: &'a mut SingerWriter<W>,
    report_config: ReportJobConfig,
    stats: SyncStats,
}

impl<'a, W: Write> SyncPipeline<'a, W> {
    pub fn new(
        api: &'a dyn AdsApi,
        config: &'a ConnectorConfig,
        catalog: &'a Catalog,
        bookmarks: &'a BookmarkManager,
        writer: &'a mut SingerWriter<W>,
    ) -> Self {
        Self {
            api,
            config,
            catalog,
            bookmarks,
            writer,
            report_config: ReportJobConfig::default(),
            stats: SyncStats::default(),
        }
    }

    /// Override the report poll budget (tests use a fast one)
    pub fn with_report_config(mut self, report_config: ReportJobConfig) -> Self {
        self.report_config = report_config;
        self
    }

    /// Run the sync to completion
    ///
    /// Returns the run's stats; per-stream failures are recorded there
    /// rather than aborting the run. Only a failure to list accounts is
    /// fatal, since every stream depends on the account list.
    pub async fn run(mut self) -> Result<SyncStats> {
        let selected: Vec<&str> = self
            .catalog
            .selected_streams()
            .map(|e| e.tap_stream_id.as_str())
            .collect();
        info!(streams = ?selected, "starting sync run");

        let accounts = self.fetch_accounts().await?;
        info!(accounts = accounts.len(), "accounts in scope");

        for name in ["accounts", "campaigns", "ad_groups", "ads"] {
            if let Some(entry) = self.catalog.get(name).filter(|e| e.selected) {
                self.writer.write_schema(entry)?;
            }
        }

        if self.catalog.is_selected("accounts") {
            if let Err(e) = self.sync_accounts(&accounts).await {
                warn!(stream = "accounts", error = %e, "stream failed, skipping");
                self.stats.record_failure("accounts");
            }
            self.checkpoint().await?;
        }

        for (account_id, _) in &accounts {
            if let Err(e) = self.sync_account_children(account_id).await {
                warn!(account = %account_id, error = %e, "account hierarchy sync failed, skipping");
                self.stats.record_failure(format!("hierarchy:{account_id}"));
            }
            self.checkpoint().await?;
        }

        let report_entries: Vec<CatalogEntry> = self
            .catalog
            .selected_streams()
            .filter(|e| {
                stream_def(&e.tap_stream_id).is_some_and(StreamDef::is_report)
            })
            .cloned()
            .collect();

        for entry in &report_entries {
            self.writer.write_schema(entry)?;
            for (account_id, _) in &accounts {
                if let Err(e) = self.sync_report_stream(entry, account_id).await {
                    warn!(
                        stream = %entry.tap_stream_id,
                        account = %account_id,
                        error = %e,
                        "report stream failed, skipping"
                    );
                    self.stats
                        .record_failure(format!("{}:{account_id}", entry.tap_stream_id));
                }
                self.checkpoint().await?;
            }
        }

        self.writer.flush()?;
        info!(
            records = self.stats.total_records(),
            failed = self.stats.failed.len(),
            "sync run finished"
        );
        Ok(self.stats)
    }

    /// List accounts and apply the configured account filter
    async fn fetch_accounts(&self) -> Result<Vec<(String, JsonValue)>> {
        let accounts = self.api.get_accounts().await?;
        Ok(accounts
            .iter()
            .map(flatten_record)
            .filter_map(|record| id_of(&record, "id").map(|id| (id, record)))
            .filter(|(id, _)| self.config.account_selected(id))
            .collect())
    }

    /// Emit the accounts stream, filtered and bookmarked incrementally
    async fn sync_accounts(&mut self, accounts: &[(String, JsonValue)]) -> Result<()> {
        let def = stream_def("accounts").expect("accounts stream is registered");
        let entry = self.catalog.get("accounts").expect("checked by caller");
        let key = def.replication_key.expect("accounts is incremental");

        let bookmark = self
            .bookmarks
            .get_bookmark("accounts", None, key)
            .await
            .and_then(|v| v.as_str().map(String::from));

        let mut emitted = 0u64;
        for (_, record) in accounts {
            let value = record.get(key).and_then(JsonValue::as_str);
            // ISO-8601 strings order lexicographically; records strictly
            // older than the bookmark were emitted by a previous run
            if let (Some(bookmark), Some(value)) = (bookmark.as_deref(), value) {
                if value < bookmark {
                    continue;
                }
            }

            let projected = project(def, entry, record);
            self.writer.write_record("accounts", projected)?;
            emitted += 1;

            if let Some(value) = value {
                self.bookmarks
                    .advance_bookmark("accounts", None, key, value)
                    .await;
            }
        }

        self.stats.add_records("accounts", emitted);
        Ok(())
    }

    /// Walk campaigns, ad groups, and ads under one account
    async fn sync_account_children(&mut self, account_id: &str) -> Result<()> {
        let want_campaigns = self.catalog.is_selected("campaigns");
        let want_ad_groups = self.catalog.is_selected("ad_groups");
        let want_ads = self.catalog.is_selected("ads");
        if !(want_campaigns || want_ad_groups || want_ads) {
            return Ok(());
        }

        let campaigns = self.api.get_campaigns(account_id).await?;
        for campaign in &campaigns {
            let campaign = flatten_record(campaign);
            if want_campaigns {
                self.emit("campaigns", &campaign)?;
            }

            let Some(campaign_id) = id_of(&campaign, "id") else {
                continue;
            };
            if !(want_ad_groups || want_ads) {
                continue;
            }

            let ad_groups = self.api.get_ad_groups(account_id, &campaign_id).await?;
            for ad_group in &ad_groups {
                let ad_group = flatten_record(ad_group);
                if want_ad_groups {
                    self.emit("ad_groups", &ad_group)?;
                }

                let Some(ad_group_id) = id_of(&ad_group, "id") else {
                    continue;
                };
                if !want_ads {
                    continue;
                }

                let ads = self.api.get_ads(account_id, &ad_group_id).await?;
                for ad in &ads {
                    let ad = flatten_record(ad);
                    self.emit("ads", &ad)?;
                }
            }
        }

        Ok(())
    }

    /// Run one report job for a stream and account
    ///
    /// The bookmark advances to the run date even when the report comes
    /// back empty: an empty result still covers the queried range.
    async fn sync_report_stream(&mut self, entry: &CatalogEntry, account_id: &str) -> Result<()> {
        let stream = entry.tap_stream_id.as_str();
        let def = stream_def(stream).expect("selected report stream is registered");

        let today = Utc::now().date_naive();
        let start = self
            .bookmarks
            .report_start_date(stream, account_id, self.config.start_date, self.config.conversion_window)
            .await;
        let request = build_request(def, entry, account_id, start, today)?;

        let mut job = ReportJob::new(stream, account_id);
        let outcome = job.run(self.api, &request, &self.report_config).await?;

        if let ReportOutcome::WithData(rows) = outcome {
            let count = rows.len() as u64;
            for row in rows {
                self.writer.write_record(stream, row)?;
            }
            self.stats.add_records(stream, count);
        }

        self.bookmarks
            .advance_bookmark(stream, Some(account_id), "date", &today.to_string())
            .await;

        Ok(())
    }

    /// Project a record through field selection and emit it
    fn emit(&mut self, stream: &str, record: &JsonValue) -> Result<()> {
        let def = stream_def(stream).expect("core stream is registered");
        let entry = self.catalog.get(stream).expect("selection checked by caller");
        self.writer.write_record(stream, project(def, entry, record))?;
        self.stats.add_records(stream, 1);
        Ok(())
    }

    /// Emit a STATE message and persist the state file
    async fn checkpoint(&mut self) -> Result<()> {
        let snapshot = self.bookmarks.snapshot().await;
        self.writer.write_state(&snapshot)?;
        self.bookmarks.save().await
    }
}

/// Drop unselected fields from a flattened record
fn project(def: &StreamDef, entry: &CatalogEntry, record: &JsonValue) -> JsonValue {
    match record {
        JsonValue::Object(map) => JsonValue::Object(
            map.iter()
                .filter(|(field, _)| entry.field_selected(def, field))
                .map(|(field, value)| (field.clone(), value.clone()))
                .collect(),
        ),
        other => other.clone(),
    }
}

/// Extract an id field that may arrive as a string or a number
fn id_of(record: &JsonValue, field: &str) -> Option<String> {
    match record.get(field) {
        Some(JsonValue::String(s)) => Some(s.clone()),
        Some(JsonValue::Number(n)) => Some(n.to_string()),
        _ => None,
    }
}
