//! Collection Core Constants
//!
//! Defines directory layout, date formats, and safety bounds shared by the
//! metadata store, merge engine, and validator.

/// Name of the per-feature metadata subdirectory
pub const METADATA_DIR_NAME: &str = ".metadata";

/// Maximum number of entries kept in a dataset's update history log
pub const HISTORY_LIMIT: usize = 50;

/// Default incremental catch-up bound in days
///
/// When the gap between a dataset's last covered date and today exceeds this,
/// the dataset is treated as stale beyond repair and a full collection is
/// scheduled instead of an unbounded incremental catch-up.
pub const DEFAULT_MAX_DAYS_BACK: i64 = 90;

/// Default start date for full collections when no prior state exists
pub const DEFAULT_COLLECTION_START: &str = "20240101";

/// Date format used across table files, descriptors, and fetch windows
pub const DATE_FORMAT: &str = "%Y%m%d";

/// Time-of-day format stored in descriptors
pub const TIME_FORMAT: &str = "%H%M%S";

/// Timestamp tag appended to backup file names
pub const BACKUP_TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S";

/// Day-over-day gap beyond which the validator flags a date discontinuity
///
/// Weekend and market-holiday gaps are legitimate, so this is generous and
/// the finding is warning-only.
pub const LARGE_GAP_DAYS: i64 = 7;

/// Metadata schema version written into every descriptor
pub const METADATA_VERSION: &str = "1.0";

/// API version recorded in descriptors for provenance
pub const API_VERSION: &str = "v1";
