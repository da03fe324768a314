//! Dataset Descriptor
//!
//! The JSON record tracking a dataset's coverage, row count, content hash,
//! and last-update facts. One descriptor exists per `(feature_path, code)`
//! pair; it is re-derived from the on-disk table at every save so coverage
//! claims never drift from the file.

use chrono::Local;
use serde::{Deserialize, Serialize};

use crate::constants::{API_VERSION, DATE_FORMAT, METADATA_VERSION, TIME_FORMAT};

/// Inclusive date coverage bounds of a stored table, YYYYMMDD
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: Option<String>,
    pub end: Option<String>,
}

impl DateRange {
    pub fn new(start: Option<String>, end: Option<String>) -> Self {
        Self { start, end }
    }
}

/// How the last write of a dataset was produced
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CollectionMode {
    /// Complete refetch of the desired history
    Full,
    /// Merge of a bounded catch-up window into the existing table
    Incremental,
}

impl CollectionMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            CollectionMode::Full => "full",
            CollectionMode::Incremental => "incremental",
        }
    }
}

/// Facts about the most recent incremental operation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IncrementalStats {
    pub update_range: DateRange,
    pub new_records_added: usize,
    pub update_timestamp: String,
}

/// Per-dataset update state, persisted as `last_update_<code>.json`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatasetDescriptor {
    pub feature_name: String,
    pub code: String,
    pub last_update_date: String,
    pub last_update_time: String,
    pub last_update_timestamp: String,
    pub total_records: usize,
    pub date_range: DateRange,
    /// SHA-256 of the table file, empty when the file is absent
    pub data_hash: String,
    pub api_version: String,
    pub collection_mode: CollectionMode,
    #[serde(default)]
    pub last_error: Option<String>,
    #[serde(default)]
    pub retry_count: u32,
    pub csv_path: String,
    pub metadata_version: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub incremental_stats: Option<IncrementalStats>,
}

impl DatasetDescriptor {
    /// Create a descriptor with now-timestamps and the given file facts.
    ///
    /// The caller supplies facts re-derived from the table file; nothing
    /// here is trusted from a fetch response.
    pub fn new(
        feature_name: &str,
        code: &str,
        csv_path: &str,
        total_records: usize,
        date_range: DateRange,
        data_hash: String,
        collection_mode: CollectionMode,
    ) -> Self {
        let now = Local::now();

        Self {
            feature_name: feature_name.to_string(),
            code: code.to_string(),
            last_update_date: now.format(DATE_FORMAT).to_string(),
            last_update_time: now.format(TIME_FORMAT).to_string(),
            last_update_timestamp: now.to_rfc3339(),
            total_records,
            date_range,
            data_hash,
            api_version: API_VERSION.to_string(),
            collection_mode,
            last_error: None,
            retry_count: 0,
            csv_path: csv_path.to_string(),
            metadata_version: METADATA_VERSION.to_string(),
            incremental_stats: None,
        }
    }

    /// Audit-trail entry derived from this descriptor's current state
    pub fn to_history_entry(&self) -> HistoryEntry {
        HistoryEntry {
            timestamp: self.last_update_timestamp.clone(),
            date: self.last_update_date.clone(),
            time: self.last_update_time.clone(),
            records: self.total_records,
            mode: self.collection_mode,
            date_range: self.date_range.clone(),
        }
    }
}

/// One line of the bounded, append-only update history log.
///
/// Diagnostics only; never read back for logic.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub timestamp: String,
    pub date: String,
    pub time: String,
    pub records: usize,
    pub mode: CollectionMode,
    pub date_range: DateRange,
}
