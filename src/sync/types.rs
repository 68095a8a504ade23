//! Sync run accounting

use std::collections::BTreeMap;

/// Per-run counters, returned by the pipeline when the run finishes
#[derive(Debug, Default, Clone)]
pub struct SyncStats {
    /// Records emitted per stream
    pub records: BTreeMap<String, u64>,
    /// Streams (or stream/account pairs) that failed and were skipped
    pub failed: Vec<String>,
}

impl SyncStats {
    /// Count emitted records against a stream
    pub fn add_records(&mut self, stream: &str, count: u64) {
        *self.records.entry(stream.to_string()).or_default() += count;
    }

    /// Record a stream failure that the run continued past
    pub fn record_failure(&mut self, label: impl Into<String>) {
        self.failed.push(label.into());
    }

    /// Total records emitted across all streams
    pub fn total_records(&self) -> u64 {
        self.records.values().sum()
    }

    /// Whether any stream failed during the run
    pub fn has_failures(&self) -> bool {
        !self.failed.is_empty()
    }
}
