//! Incremental Update Orchestration
//!
//! Composes the window calculation, fetch boundary, backup protection,
//! merge engine, validator, and metadata store into one per-dataset run:
//!
//! ```text
//! load descriptor → compute window → (up to date? stop)
//!        → fetch → snapshot → merge → validate → write
//!        → refresh metadata + history → discard backup
//! ```
//!
//! Any failure after the snapshot restores the pre-update table, so a
//! dataset always ends in either its previous state or a fully validated
//! new one. Batch runs isolate failures per dataset.
//!
//! The fetch layer is a caller-supplied closure; HTTP, auth, and retry
//! mechanics live outside this crate's core.

use chrono::Local;
use std::path::Path;
use tracing::{error, info, warn};

use crate::error::{Error, Result};
use crate::models::{CollectionMode, DataTable, DatasetKind, DateRange};
use crate::services::backup::BackupCoordinator;
use crate::services::date_range::FetchPlan;
use crate::services::merge;
use crate::services::metadata_store::MetadataStore;
use crate::services::validate;
use crate::utils::today_yyyymmdd;

/// Knobs for one updater instance; owned, no ambient globals
#[derive(Debug, Clone)]
pub struct UpdaterConfig {
    /// Staleness bound before an incremental run degrades to full collection
    pub max_days_back: i64,
    /// Snapshot the table before mutating it
    pub backup_enabled: bool,
    /// When false, every run overwrites the table with the fetched batch
    /// instead of merging
    pub incremental: bool,
}

impl Default for UpdaterConfig {
    fn default() -> Self {
        Self {
            max_days_back: crate::constants::DEFAULT_MAX_DAYS_BACK,
            backup_enabled: true,
            incremental: true,
        }
    }
}

/// Result of one dataset run
#[derive(Debug, Clone)]
pub struct UpdateOutcome {
    pub code: String,
    pub mode: CollectionMode,
    /// Rows returned by the fetch
    pub fetched: usize,
    /// Rows in the table after the write
    pub merged: usize,
    /// Non-blocking validator findings
    pub warnings: Vec<String>,
    /// True when the dataset was already current and nothing ran
    pub skipped: bool,
}

/// Aggregate result of a batch run
#[derive(Debug, Clone, Default)]
pub struct BatchSummary {
    pub total: usize,
    pub success_count: usize,
    pub error_count: usize,
    pub skipped_count: usize,
    pub total_fetched: usize,
    pub total_merged: usize,
    pub errors: Vec<String>,
}

pub struct IncrementalUpdater {
    store: MetadataStore,
    config: UpdaterConfig,
}

impl IncrementalUpdater {
    pub fn new(store: MetadataStore, config: UpdaterConfig) -> Self {
        Self { store, config }
    }

    pub fn store(&self) -> &MetadataStore {
        &self.store
    }

    /// Bring one dataset current.
    ///
    /// `fetch` receives the `(start, end)` window as YYYYMMDD strings and
    /// returns the rows for that range; it may return overlapping dates,
    /// which the merge resolves in favor of the fresh batch.
    pub fn run<F>(&self, kind: DatasetKind, code: &str, mut fetch: F) -> Result<UpdateOutcome>
    where
        F: FnMut(&str, &str) -> Result<DataTable>,
    {
        let spec = kind.spec();
        let feature_path = spec.feature_path;

        let plan = if self.config.incremental {
            self.store
                .compute_incremental_window(feature_path, code, self.config.max_days_back)
        } else {
            FetchPlan::FullCollection {
                end: today_yyyymmdd(),
            }
        };

        let (start, end, mode) = match plan {
            FetchPlan::UpToDate { .. } => {
                info!(feature_path, code, "Already up to date, nothing to fetch");
                return Ok(UpdateOutcome {
                    code: code.to_string(),
                    mode: CollectionMode::Incremental,
                    fetched: 0,
                    merged: 0,
                    warnings: Vec::new(),
                    skipped: true,
                });
            }
            FetchPlan::FullCollection { end } => {
                (spec.default_start.to_string(), end, CollectionMode::Full)
            }
            FetchPlan::Incremental { start, end } => (start, end, CollectionMode::Incremental),
        };

        info!(
            feature_path,
            code,
            start = %start,
            end = %end,
            mode = mode.as_str(),
            "Fetch window computed"
        );

        let new = match fetch(&start, &end) {
            Ok(table) => table,
            Err(e) => {
                self.store
                    .record_failure(feature_path, code, &e.to_string());
                return Err(e);
            }
        };

        let table_path = self.store.table_path(feature_path, code);
        let existing = if self.config.incremental && table_path.exists() {
            DataTable::from_csv(&table_path)?
        } else {
            DataTable::empty()
        };

        let backup = if self.config.backup_enabled {
            BackupCoordinator::snapshot(&table_path)?
        } else {
            None
        };

        let update_range = DateRange::new(Some(start), Some(end));
        match self.merge_and_persist(
            kind,
            code,
            &table_path,
            &existing,
            &new,
            mode,
            update_range,
        ) {
            Ok(outcome) => {
                if let Some(backup_path) = backup {
                    BackupCoordinator::discard(&backup_path);
                }
                Ok(outcome)
            }
            Err(e) => {
                if let Some(backup_path) = &backup {
                    BackupCoordinator::restore(&table_path, backup_path);
                }
                self.store
                    .record_failure(feature_path, code, &e.to_string());
                error!(feature_path, code, error = %e, "Update failed, table restored");
                Err(e)
            }
        }
    }

    /// The protected section: everything here runs under backup cover
    #[allow(clippy::too_many_arguments)]
    fn merge_and_persist(
        &self,
        kind: DatasetKind,
        code: &str,
        table_path: &Path,
        existing: &DataTable,
        new: &DataTable,
        mode: CollectionMode,
        update_range: DateRange,
    ) -> Result<UpdateOutcome> {
        let spec = kind.spec();

        let merged = if self.config.incremental {
            merge::merge(existing, new, spec.date_column, spec.time_column)
        } else {
            new.clone()
        };

        let report = validate::validate(existing, new, &merged, spec.date_column);
        for warning in &report.warnings {
            warn!(feature_path = spec.feature_path, code, warning = %warning, "Merge warning");
        }
        if !report.is_valid {
            return Err(Error::Validation(report.error_summary()));
        }

        merged.write_csv(table_path)?;

        let saved = self.store.update_after_merge(
            spec.feature_path,
            code,
            table_path,
            spec.date_column,
            mode,
            new.len(),
            update_range,
        );
        if !saved {
            return Err(Error::Metadata(format!(
                "Failed to persist descriptor for {}/{}",
                spec.feature_path, code
            )));
        }

        info!(
            feature_path = spec.feature_path,
            code,
            existing = report.stats.old_records,
            fetched = report.stats.new_records,
            merged = report.stats.merged_records,
            "Dataset updated"
        );

        Ok(UpdateOutcome {
            code: code.to_string(),
            mode,
            fetched: new.len(),
            merged: merged.len(),
            warnings: report.warnings,
            skipped: false,
        })
    }

    /// Run a whole code list for one dataset family, continuing past
    /// per-dataset failures.
    pub fn run_batch<F>(&self, kind: DatasetKind, codes: &[String], mut fetch: F) -> BatchSummary
    where
        F: FnMut(&str, &str, &str) -> Result<DataTable>,
    {
        let mut summary = BatchSummary {
            total: codes.len(),
            ..Default::default()
        };

        for code in codes {
            match self.run(kind, code, |start, end| fetch(code, start, end)) {
                Ok(outcome) if outcome.skipped => {
                    summary.skipped_count += 1;
                }
                Ok(outcome) => {
                    summary.success_count += 1;
                    summary.total_fetched += outcome.fetched;
                    summary.total_merged += outcome.merged;
                }
                Err(e) => {
                    summary.error_count += 1;
                    summary
                        .errors
                        .push(format!("{}/{}: {}", kind.feature_name(), code, e));
                }
            }
        }

        info!(
            feature_path = kind.feature_name(),
            total = summary.total,
            success = summary.success_count,
            failed = summary.error_count,
            skipped = summary.skipped_count,
            fetched = summary.total_fetched,
            "Batch run finished"
        );

        summary
    }

    /// Whether a dataset's descriptor is older than `max_age_hours`.
    ///
    /// Absent or undecodable state reads as "needs update".
    pub fn should_update(&self, kind: DatasetKind, code: &str, max_age_hours: i64) -> bool {
        let descriptor = match self.store.load(kind.spec().feature_path, code) {
            Some(d) => d,
            None => return true,
        };

        let last = match chrono::DateTime::parse_from_rfc3339(&descriptor.last_update_timestamp) {
            Ok(t) => t,
            Err(_) => return true,
        };

        let hours_passed = Local::now().signed_duration_since(last).num_hours();
        hours_passed >= max_age_hours
    }
}
