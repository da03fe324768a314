//! Metadata Store
//!
//! Persists per-dataset descriptors and the bounded update-history log under
//! a `.metadata` subdirectory of each feature path. A descriptor is always a
//! re-derived fact about the table file on disk, never a claim passed
//! through from a caller, so coverage metadata cannot drift from the data.
//!
//! Layout per dataset:
//!
//! ```text
//! <base>/<feature_path>/<code>.csv
//! <base>/<feature_path>/.metadata/last_update_<code>.json
//! <base>/<feature_path>/.metadata/update_history_<code>.json
//! ```

use chrono::Local;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, error, info};

use crate::constants::{HISTORY_LIMIT, METADATA_DIR_NAME};
use crate::error::{Error, Result};
use crate::models::{
    CollectionMode, DataTable, DatasetDescriptor, DateRange, HistoryEntry, IncrementalStats,
};
use crate::services::date_range::{compute_next_range, FetchPlan};
use crate::services::fingerprint::file_sha256;

pub struct MetadataStore {
    base_dir: PathBuf,
}

impl MetadataStore {
    pub fn new(base_dir: PathBuf) -> Self {
        Self { base_dir }
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    /// Table file path for a dataset
    pub fn table_path(&self, feature_path: &str, code: &str) -> PathBuf {
        self.base_dir
            .join(feature_path)
            .join(format!("{}.csv", code))
    }

    /// Metadata directory for a feature path
    pub fn metadata_dir(&self, feature_path: &str) -> PathBuf {
        self.base_dir.join(feature_path).join(METADATA_DIR_NAME)
    }

    fn last_update_path(&self, feature_path: &str, code: &str) -> PathBuf {
        self.metadata_dir(feature_path)
            .join(format!("last_update_{}.json", code))
    }

    fn history_path(&self, feature_path: &str, code: &str) -> PathBuf {
        self.metadata_dir(feature_path)
            .join(format!("update_history_{}.json", code))
    }

    /// Load a dataset's descriptor.
    ///
    /// Absence is the expected state for first-time datasets, so a missing
    /// or unreadable file is `None`, never an error.
    pub fn load(&self, feature_path: &str, code: &str) -> Option<DatasetDescriptor> {
        let path = self.last_update_path(feature_path, code);
        if !path.exists() {
            return None;
        }

        match fs::read_to_string(&path) {
            Ok(content) => match serde_json::from_str(&content) {
                Ok(descriptor) => Some(descriptor),
                Err(e) => {
                    error!(path = %path.display(), error = %e, "Failed to parse descriptor");
                    None
                }
            },
            Err(e) => {
                error!(path = %path.display(), error = %e, "Failed to read descriptor");
                None
            }
        }
    }

    /// Save a dataset's descriptor, creating the metadata directory on
    /// demand. Failures are logged and reported as `false`, never raised
    /// past this boundary.
    pub fn save(&self, feature_path: &str, code: &str, descriptor: &DatasetDescriptor) -> bool {
        let metadata_dir = self.metadata_dir(feature_path);
        if let Err(e) = fs::create_dir_all(&metadata_dir) {
            error!(dir = %metadata_dir.display(), error = %e, "Failed to create metadata dir");
            return false;
        }

        let path = self.last_update_path(feature_path, code);
        let json = match serde_json::to_string_pretty(descriptor) {
            Ok(j) => j,
            Err(e) => {
                error!(error = %e, "Failed to serialize descriptor");
                return false;
            }
        };

        match fs::write(&path, json) {
            Ok(()) => {
                debug!(path = %path.display(), "Saved descriptor");
                true
            }
            Err(e) => {
                error!(path = %path.display(), error = %e, "Failed to write descriptor");
                false
            }
        }
    }

    /// Append the descriptor's current state to the history log, keeping
    /// only the most recent entries. An audit trail, not a full ledger.
    pub fn append_history(
        &self,
        feature_path: &str,
        code: &str,
        descriptor: &DatasetDescriptor,
    ) -> bool {
        let path = self.history_path(feature_path, code);

        let mut history: Vec<HistoryEntry> = if path.exists() {
            fs::read_to_string(&path)
                .ok()
                .and_then(|content| serde_json::from_str(&content).ok())
                .unwrap_or_default()
        } else {
            Vec::new()
        };

        history.push(descriptor.to_history_entry());
        if history.len() > HISTORY_LIMIT {
            history.drain(..history.len() - HISTORY_LIMIT);
        }

        let json = match serde_json::to_string_pretty(&history) {
            Ok(j) => j,
            Err(e) => {
                error!(error = %e, "Failed to serialize history");
                return false;
            }
        };

        if let Some(parent) = path.parent() {
            if let Err(e) = fs::create_dir_all(parent) {
                error!(dir = %parent.display(), error = %e, "Failed to create metadata dir");
                return false;
            }
        }

        match fs::write(&path, json) {
            Ok(()) => true,
            Err(e) => {
                error!(path = %path.display(), error = %e, "Failed to write history");
                false
            }
        }
    }

    /// Read back the history log, newest last
    pub fn load_history(&self, feature_path: &str, code: &str) -> Vec<HistoryEntry> {
        let path = self.history_path(feature_path, code);
        if !path.exists() {
            return Vec::new();
        }
        fs::read_to_string(&path)
            .ok()
            .and_then(|content| serde_json::from_str(&content).ok())
            .unwrap_or_default()
    }

    /// Extract the inclusive date coverage of a table file by scanning its
    /// date column. Values are kept when they look like dates on the wire
    /// (8+ digits); anything else is ignored.
    pub fn table_date_range(
        &self,
        table_path: &Path,
        date_column: &str,
    ) -> Result<(Option<String>, Option<String>)> {
        if !table_path.exists() {
            return Ok((None, None));
        }

        let table = DataTable::from_csv(table_path)?;
        let mut dates: Vec<String> = table
            .column_values(date_column)
            .into_iter()
            .map(str::trim)
            .filter(|v| v.len() >= 8 && v.chars().all(|c| c.is_ascii_digit()))
            .map(str::to_string)
            .collect();

        if dates.is_empty() {
            return Ok((None, None));
        }

        dates.sort();
        dates.dedup();
        Ok((dates.first().cloned(), dates.last().cloned()))
    }

    /// Build a descriptor by inspecting the table file.
    ///
    /// Row count, coverage range, and content hash are all derived from the
    /// file itself.
    pub fn build_descriptor(
        &self,
        feature_name: &str,
        code: &str,
        table_path: &Path,
        date_column: &str,
        mode: CollectionMode,
    ) -> Result<DatasetDescriptor> {
        let (total_records, date_range) = if table_path.exists() {
            let table = DataTable::from_csv(table_path)?;
            let (start, end) = self.table_date_range(table_path, date_column)?;
            (table.len(), DateRange::new(start, end))
        } else {
            (0, DateRange::default())
        };

        let data_hash = file_sha256(table_path)?;

        Ok(DatasetDescriptor::new(
            feature_name,
            code,
            &table_path.display().to_string(),
            total_records,
            date_range,
            data_hash,
            mode,
        ))
    }

    /// Load the descriptor and compute the fetch window for a dataset
    pub fn compute_incremental_window(
        &self,
        feature_path: &str,
        code: &str,
        max_days_back: i64,
    ) -> FetchPlan {
        let descriptor = self.load(feature_path, code);
        compute_next_range(descriptor.as_ref(), max_days_back, Local::now().date_naive())
    }

    /// Refresh the descriptor after a merge was written, record the
    /// incremental facts, and append to history.
    pub fn update_after_merge(
        &self,
        feature_path: &str,
        code: &str,
        table_path: &Path,
        date_column: &str,
        mode: CollectionMode,
        new_records: usize,
        update_range: DateRange,
    ) -> bool {
        let feature_name = Path::new(feature_path)
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or(feature_path);

        let mut descriptor =
            match self.build_descriptor(feature_name, code, table_path, date_column, mode) {
                Ok(d) => d,
                Err(e) => {
                    error!(feature_path, code, error = %e, "Failed to rebuild descriptor");
                    return false;
                }
            };

        if mode == CollectionMode::Incremental {
            descriptor.incremental_stats = Some(IncrementalStats {
                update_range,
                new_records_added: new_records,
                update_timestamp: Local::now().to_rfc3339(),
            });
        }

        if !self.save(feature_path, code, &descriptor) {
            return false;
        }

        self.append_history(feature_path, code, &descriptor);
        info!(
            feature_path,
            code,
            records = descriptor.total_records,
            mode = mode.as_str(),
            "Metadata updated"
        );
        true
    }

    /// Record a failed run on the existing descriptor, if one exists.
    ///
    /// Failure bookkeeping never creates a descriptor; a dataset with no
    /// successful write has no coverage to claim.
    pub fn record_failure(&self, feature_path: &str, code: &str, message: &str) {
        if let Some(mut descriptor) = self.load(feature_path, code) {
            descriptor.last_error = Some(message.to_string());
            descriptor.retry_count += 1;
            self.save(feature_path, code, &descriptor);
        }
    }

    /// Feature paths under the data root that carry a metadata directory
    pub fn list_feature_paths(&self) -> Result<Vec<String>> {
        let mut features = Vec::new();
        if !self.base_dir.exists() {
            return Ok(features);
        }

        for entry in fs::read_dir(&self.base_dir)
            .map_err(|e| Error::Io(format!("Failed to read {}: {}", self.base_dir.display(), e)))?
        {
            let entry = entry.map_err(|e| Error::Io(e.to_string()))?;
            let path = entry.path();
            if path.is_dir() && path.join(METADATA_DIR_NAME).is_dir() {
                if let Some(name) = path.file_name().and_then(|n| n.to_str()) {
                    features.push(name.to_string());
                }
            }
        }

        features.sort();
        Ok(features)
    }

    /// Codes with a descriptor under one feature path
    pub fn list_codes(&self, feature_path: &str) -> Result<Vec<String>> {
        let metadata_dir = self.metadata_dir(feature_path);
        let mut codes = Vec::new();
        if !metadata_dir.exists() {
            return Ok(codes);
        }

        for entry in fs::read_dir(&metadata_dir)
            .map_err(|e| Error::Io(format!("Failed to read {}: {}", metadata_dir.display(), e)))?
        {
            let entry = entry.map_err(|e| Error::Io(e.to_string()))?;
            let name = entry.file_name();
            let name = name.to_string_lossy();
            if let Some(code) = name
                .strip_prefix("last_update_")
                .and_then(|rest| rest.strip_suffix(".json"))
            {
                codes.push(code.to_string());
            }
        }

        codes.sort();
        Ok(codes)
    }
}
