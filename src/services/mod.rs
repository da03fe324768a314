pub mod backup;
pub mod date_range;
pub mod fingerprint;
pub mod merge;
pub mod metadata_store;
pub mod updater;
pub mod validate;

pub use backup::BackupCoordinator;
pub use date_range::{compute_next_range, FetchPlan};
pub use fingerprint::file_sha256;
pub use metadata_store::MetadataStore;
pub use updater::{BatchSummary, IncrementalUpdater, UpdateOutcome, UpdaterConfig};
pub use validate::{MergeStats, ValidationReport};
