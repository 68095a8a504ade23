//! Report job state machine
//!
//! `BUILDING → SUBMITTED → POLLING → {SUCCESS_WITH_DATA, SUCCESS_EMPTY,
//! ERROR}`. The poll loop is bounded by attempt count with a fixed
//! inter-poll sleep; a remote `Error` status or an exhausted budget is
//! fatal for this report only, and callers continue with other streams.

use super::parser::{extract_csv, parse_report_csv};
use crate::catalog::{CatalogEntry, StreamDef};
use crate::client::{AdsApi, ReportRequest, ReportStatus};
use crate::error::{Error, Result};
use crate::types::JsonValue;
use chrono::NaiveDate;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Poll budget for one report job
#[derive(Debug, Clone)]
pub struct ReportJobConfig {
    /// Maximum number of poll attempts before giving up
    pub max_polls: u32,
    /// Fixed sleep between poll attempts
    pub poll_interval: Duration,
}

impl Default for ReportJobConfig {
    fn default() -> Self {
        Self {
            max_polls: 10,
            poll_interval: Duration::from_secs(5),
        }
    }
}

impl ReportJobConfig {
    /// Config with near-zero sleeps, for tests
    pub fn fast() -> Self {
        Self {
            max_polls: 10,
            poll_interval: Duration::from_millis(1),
        }
    }
}

/// Lifecycle state of one report job
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobState {
    /// Assembling columns and date range
    Building,
    /// Request submitted, id received
    Submitted,
    /// Waiting for the remote side to finish generating
    Polling,
    /// Finished with rows to download
    SuccessWithData,
    /// Finished with no rows; the bookmark still advances
    SuccessEmpty,
    /// Remote failure or exhausted poll budget
    Failed,
}

impl JobState {
    /// Whether the job has reached a terminal state
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            Self::SuccessWithData | Self::SuccessEmpty | Self::Failed
        )
    }
}

/// Result of a finished report job
#[derive(Debug)]
pub enum ReportOutcome {
    /// Parsed rows from the downloaded CSV
    WithData(Vec<JsonValue>),
    /// Report finished but produced no rows
    Empty,
}

/// Assemble the column set for a report request
///
/// Required platform columns come first, then catalog-selected fields, and
/// the set is topped up with a default measure if none is present, since
/// the platform rejects reports with zero statistic columns.
pub fn build_columns(def: &StreamDef, entry: &CatalogEntry) -> Result<Vec<String>> {
    let known = |name: &str| def.fields.iter().any(|(field, _)| *field == name);

    let selected: Vec<&str> = if entry.selected_fields.is_empty() {
        def.fields.iter().map(|(name, _)| *name).collect()
    } else {
        entry
            .selected_fields
            .iter()
            .map(String::as_str)
            .filter(|name| known(name))
            .collect()
    };

    let mut columns: Vec<String> = Vec::new();
    let mut push = |columns: &mut Vec<String>, name: &str| {
        if !columns.iter().any(|c| c == name) {
            columns.push(name.to_string());
        }
    };

    for column in def.required_columns {
        push(&mut columns, column);
    }
    for column in selected {
        push(&mut columns, column);
    }

    if !columns
        .iter()
        .any(|c| def.measure_columns.contains(&c.as_str()))
    {
        let Some(measure) = def.measure_columns.first() else {
            return Err(Error::ReportColumns {
                stream: def.name.to_string(),
            });
        };
        push(&mut columns, measure);
    }

    if columns.is_empty() {
        return Err(Error::ReportColumns {
            stream: def.name.to_string(),
        });
    }

    Ok(columns)
}

/// Build a daily-aggregated report request for one account
pub fn build_request(
    def: &StreamDef,
    entry: &CatalogEntry,
    account_id: &str,
    start_date: NaiveDate,
    end_date: NaiveDate,
) -> Result<ReportRequest> {
    Ok(ReportRequest {
        report: def.name.to_string(),
        columns: build_columns(def, entry)?,
        start_date,
        end_date,
        account_id: account_id.to_string(),
        aggregation: "Daily".to_string(),
    })
}

/// One submit/poll/download cycle for a report stream and account
#[derive(Debug)]
pub struct ReportJob {
    report: String,
    account_id: String,
    state: JobState,
    poll_attempts: u32,
}

impl ReportJob {
    /// Create a job in the BUILDING state
    pub fn new(report: impl Into<String>, account_id: impl Into<String>) -> Self {
        Self {
            report: report.into(),
            account_id: account_id.into(),
            state: JobState::Building,
            poll_attempts: 0,
        }
    }

    /// Current lifecycle state
    pub fn state(&self) -> JobState {
        self.state
    }

    /// Poll attempts made so far
    pub fn poll_attempts(&self) -> u32 {
        self.poll_attempts
    }

    /// Drive the job to a terminal state
    pub async fn run(
        &mut self,
        api: &dyn AdsApi,
        request: &ReportRequest,
        config: &ReportJobConfig,
    ) -> Result<ReportOutcome> {
        info!(
            report = %self.report,
            account = %self.account_id,
            start = %request.start_date,
            end = %request.end_date,
            columns = request.columns.len(),
            "submitting report request"
        );

        let request_id = match api.submit_report(&self.account_id, request).await {
            Ok(id) => id,
            Err(e) => {
                self.state = JobState::Failed;
                return Err(e);
            }
        };
        self.state = JobState::Submitted;
        debug!(report = %self.report, %request_id, "report request accepted");

        self.state = JobState::Polling;
        for attempt in 1..=config.max_polls {
            self.poll_attempts = attempt;

            let poll = match api.poll_report(&self.account_id, &request_id).await {
                Ok(poll) => poll,
                Err(e) => {
                    self.state = JobState::Failed;
                    return Err(e);
                }
            };

            match poll.status {
                ReportStatus::Error => {
                    self.state = JobState::Failed;
                    return Err(Error::report_generation(&self.report));
                }
                ReportStatus::Success => {
                    return match poll.download_url {
                        Some(url) => {
                            let rows = self.download(api, &url).await?;
                            self.state = JobState::SuccessWithData;
                            info!(
                                report = %self.report,
                                account = %self.account_id,
                                rows = rows.len(),
                                "report finished"
                            );
                            Ok(ReportOutcome::WithData(rows))
                        }
                        None => {
                            self.state = JobState::SuccessEmpty;
                            info!(
                                report = %self.report,
                                account = %self.account_id,
                                "report finished with no results"
                            );
                            Ok(ReportOutcome::Empty)
                        }
                    };
                }
                ReportStatus::Pending => {
                    debug!(
                        report = %self.report,
                        attempt,
                        max = config.max_polls,
                        "report still pending"
                    );
                    if attempt < config.max_polls {
                        tokio::time::sleep(config.poll_interval).await;
                    }
                }
            }
        }

        self.state = JobState::Failed;
        warn!(
            report = %self.report,
            account = %self.account_id,
            attempts = config.max_polls,
            "poll budget exhausted"
        );
        Err(Error::ReportPollTimeout {
            report: self.report.clone(),
            attempts: config.max_polls,
        })
    }

    async fn download(&mut self, api: &dyn AdsApi, url: &str) -> Result<Vec<JsonValue>> {
        let bytes = match api.download_report(url).await {
            Ok(bytes) => bytes,
            Err(Error::HttpStatus { status, .. }) => {
                self.state = JobState::Failed;
                return Err(Error::ReportDownload {
                    report: self.report.clone(),
                    status,
                });
            }
            Err(e) => {
                self.state = JobState::Failed;
                return Err(e);
            }
        };

        let csv = extract_csv(&bytes)?;
        parse_report_csv(&self.report, &csv)
    }
}
