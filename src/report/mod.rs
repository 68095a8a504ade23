//! Asynchronous report jobs
//!
//! A report stream syncs through one job per account: build the request,
//! submit it, poll until a terminal status, then download and parse the
//! zipped CSV result. "Finished with no rows" is a legitimate terminal
//! state, distinct from both failure and rows-present.

mod job;
mod parser;

pub use job::{build_columns, build_request, JobState, ReportJob, ReportJobConfig, ReportOutcome};
pub use parser::{extract_csv, parse_report_csv};
