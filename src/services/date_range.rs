//! Incremental Window Calculation
//!
//! Decides what date range must be fetched to bring a dataset current, given
//! its descriptor and a staleness bound. Pure computation; nothing here
//! touches persisted state.

use chrono::{Duration, NaiveDate};
use tracing::{info, warn};

use crate::models::DatasetDescriptor;
use crate::utils::{format_yyyymmdd, parse_yyyymmdd};

/// The fetch decision for one dataset
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchPlan {
    /// No usable prior coverage, or coverage too stale to catch up
    /// incrementally; fetch the whole desired history up to `end`.
    FullCollection { end: String },
    /// Fetch `start..=end` and merge into the existing table.
    Incremental { start: String, end: String },
    /// Coverage already reaches `end`; nothing to fetch.
    UpToDate { end: String },
}

impl FetchPlan {
    pub fn is_full(&self) -> bool {
        matches!(self, FetchPlan::FullCollection { .. })
    }

    pub fn is_up_to_date(&self) -> bool {
        matches!(self, FetchPlan::UpToDate { .. })
    }
}

/// Compute the next fetch window for a dataset.
///
/// Rules:
/// - no descriptor, or no recorded coverage end → full collection;
/// - coverage end more than `max_days_back` days behind `today` → full
///   collection (bounds worst-case merge cost);
/// - otherwise incremental from the day after the coverage end, collapsing
///   to up-to-date when that day is in the future.
pub fn compute_next_range(
    descriptor: Option<&DatasetDescriptor>,
    max_days_back: i64,
    today: NaiveDate,
) -> FetchPlan {
    let end = format_yyyymmdd(today);

    let descriptor = match descriptor {
        Some(d) => d,
        None => {
            info!("No metadata, full collection required");
            return FetchPlan::FullCollection { end };
        }
    };

    let last_end = match descriptor.date_range.end.as_deref() {
        Some(e) => e,
        None => {
            info!(
                code = %descriptor.code,
                "No coverage end recorded, full collection required"
            );
            return FetchPlan::FullCollection { end };
        }
    };

    let last_date = match parse_yyyymmdd(last_end) {
        Some(d) => d,
        None => {
            warn!(
                code = %descriptor.code,
                last_end,
                "Unparseable coverage end, falling back to full collection"
            );
            return FetchPlan::FullCollection { end };
        }
    };

    let days_since_last = (today - last_date).num_days();
    if days_since_last > max_days_back {
        warn!(
            code = %descriptor.code,
            days_since_last,
            max_days_back,
            "Coverage stale beyond incremental bound, full collection"
        );
        return FetchPlan::FullCollection { end };
    }

    let start_date = last_date + Duration::days(1);
    if start_date > today {
        return FetchPlan::UpToDate { end };
    }

    FetchPlan::Incremental {
        start: format_yyyymmdd(start_date),
        end,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CollectionMode, DateRange};

    fn descriptor_ending(end: Option<&str>) -> DatasetDescriptor {
        DatasetDescriptor::new(
            "domestic_futures_price",
            "101W09",
            "data/domestic_futures_price/101W09.csv",
            10,
            DateRange::new(Some("20240101".into()), end.map(str::to_string)),
            String::new(),
            CollectionMode::Full,
        )
    }

    fn day(s: &str) -> NaiveDate {
        parse_yyyymmdd(s).unwrap()
    }

    #[test]
    fn test_no_descriptor_requires_full_collection() {
        let plan = compute_next_range(None, 90, day("20240601"));
        assert_eq!(plan, FetchPlan::FullCollection { end: "20240601".into() });
    }

    #[test]
    fn test_missing_coverage_end_requires_full_collection() {
        let desc = descriptor_ending(None);
        let plan = compute_next_range(Some(&desc), 90, day("20240601"));
        assert!(plan.is_full());
    }

    #[test]
    fn test_stale_coverage_triggers_full_refetch() {
        // 20240101 -> 20240601 is 152 days, past the 90-day bound
        let desc = descriptor_ending(Some("20240101"));
        let plan = compute_next_range(Some(&desc), 90, day("20240601"));
        assert_eq!(plan, FetchPlan::FullCollection { end: "20240601".into() });
    }

    #[test]
    fn test_incremental_starts_strictly_after_coverage_end() {
        let desc = descriptor_ending(Some("20240510"));
        let plan = compute_next_range(Some(&desc), 90, day("20240601"));
        assert_eq!(
            plan,
            FetchPlan::Incremental { start: "20240511".into(), end: "20240601".into() }
        );
    }

    #[test]
    fn test_coverage_at_today_is_up_to_date() {
        let desc = descriptor_ending(Some("20240601"));
        let plan = compute_next_range(Some(&desc), 90, day("20240601"));
        assert_eq!(plan, FetchPlan::UpToDate { end: "20240601".into() });
    }

    #[test]
    fn test_boundary_exactly_max_days_back_stays_incremental() {
        let desc = descriptor_ending(Some("20240303"));
        // 90 days after 20240303 is 20240601
        let plan = compute_next_range(Some(&desc), 90, day("20240601"));
        assert_eq!(
            plan,
            FetchPlan::Incremental { start: "20240304".into(), end: "20240601".into() }
        );
    }

    #[test]
    fn test_garbage_coverage_end_falls_back_to_full() {
        let desc = descriptor_ending(Some("not-a-date"));
        let plan = compute_next_range(Some(&desc), 90, day("20240601"));
        assert!(plan.is_full());
    }
}
