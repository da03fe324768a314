//! Merge Result Validation
//!
//! Inspects a merged table against the inputs that produced it and reports
//! a structured verdict. Quality findings (row-count anomalies, date gaps,
//! leftover duplicates) are warnings that never block persistence; the only
//! structural failure is a non-empty result missing its required date
//! column. Validation itself never fails: it always returns a report.

use std::collections::HashMap;

use crate::constants::LARGE_GAP_DAYS;
use crate::models::DataTable;
use crate::utils::parse_yyyymmdd;

/// Row-count accounting for one merge
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MergeStats {
    pub old_records: usize,
    pub new_records: usize,
    pub merged_records: usize,
    pub duplicates_removed: i64,
}

/// Structured verdict for one merge
#[derive(Debug, Clone)]
pub struct ValidationReport {
    pub is_valid: bool,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
    pub stats: MergeStats,
}

impl ValidationReport {
    /// Single-line summary of the blocking errors
    pub fn error_summary(&self) -> String {
        self.errors.join("; ")
    }
}

/// Validate a merge result.
///
/// `is_valid == false` only for structural breakage; everything else is a
/// warning and the caller is expected to persist anyway.
pub fn validate(
    old: &DataTable,
    new: &DataTable,
    merged: &DataTable,
    date_column: &str,
) -> ValidationReport {
    let stats = MergeStats {
        old_records: old.len(),
        new_records: new.len(),
        merged_records: merged.len(),
        duplicates_removed: old.len() as i64 + new.len() as i64 - merged.len() as i64,
    };

    let mut report = ValidationReport {
        is_valid: true,
        errors: Vec::new(),
        warnings: Vec::new(),
        stats,
    };

    // Row-count bounds. A result below the floor hints at unintended data
    // loss; above the ceiling should be structurally impossible.
    let expected_min = if old.is_empty() { new.len() } else { old.len() };
    let expected_max = old.len() + new.len();

    if merged.len() < expected_min {
        report.warnings.push(format!(
            "Merged row count below expected minimum: {} < {}",
            merged.len(),
            expected_min
        ));
    }
    if merged.len() > expected_max {
        report.warnings.push(format!(
            "Merged row count above expected maximum: {} > {}",
            merged.len(),
            expected_max
        ));
    }

    // Date continuity. Market holidays and weekends make small gaps normal,
    // so only large ones are flagged, and only as information.
    let date_values = merged.column_values(date_column);
    if !date_values.is_empty() {
        let mut dates: Vec<_> = date_values
            .iter()
            .filter_map(|v| parse_yyyymmdd(v))
            .collect();
        dates.sort();

        let max_gap = dates
            .windows(2)
            .map(|w| (w[1] - w[0]).num_days())
            .max()
            .unwrap_or(0);
        if max_gap > LARGE_GAP_DAYS {
            report
                .warnings
                .push(format!("Large date gap found: up to {} days", max_gap));
        }

        // Leftover duplicates should not survive the merge; checked anyway.
        let mut counts: HashMap<&str, usize> = HashMap::new();
        for value in &date_values {
            *counts.entry(value.trim()).or_insert(0) += 1;
        }
        let duplicate_rows: usize = counts.values().filter(|&&c| c > 1).sum();
        if duplicate_rows > 0 {
            report.warnings.push(format!(
                "Duplicate dates remain after merge: {} rows affected",
                duplicate_rows
            ));
        }
    }

    if merged.is_empty() {
        report.warnings.push("Merged table is empty".to_string());
    } else if merged.column_index(date_column).is_none() {
        report.errors.push(format!(
            "Required date column '{}' missing from merged table",
            date_column
        ));
        report.is_valid = false;
    }

    report
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(columns: &[&str], rows: &[&[&str]]) -> DataTable {
        let mut t = DataTable::new(columns.to_vec());
        for row in rows {
            t.push_row(row.iter().map(|s| s.to_string()).collect());
        }
        t
    }

    #[test]
    fn test_clean_merge_is_valid_without_warnings() {
        let old = table(&["stck_bsop_date"], &[&["20240101"], &["20240102"]]);
        let new = table(&["stck_bsop_date"], &[&["20240103"]]);
        let merged = table(
            &["stck_bsop_date"],
            &[&["20240101"], &["20240102"], &["20240103"]],
        );

        let report = validate(&old, &new, &merged, "stck_bsop_date");
        assert!(report.is_valid);
        assert!(report.errors.is_empty());
        assert!(report.warnings.is_empty());
        assert_eq!(report.stats.merged_records, 3);
        assert_eq!(report.stats.duplicates_removed, 0);
    }

    #[test]
    fn test_undercount_warns_but_does_not_block() {
        let old = table(&["stck_bsop_date"], &[&["20240101"], &["20240102"]]);
        let new = table(&["stck_bsop_date"], &[&["20240103"]]);
        // Fewer rows than the existing table: possible data loss
        let merged = table(&["stck_bsop_date"], &[&["20240103"]]);

        let report = validate(&old, &new, &merged, "stck_bsop_date");
        assert!(report.is_valid);
        assert!(report.warnings.iter().any(|w| w.contains("below expected minimum")));
    }

    #[test]
    fn test_overcount_warns() {
        let old = table(&["stck_bsop_date"], &[&["20240101"]]);
        let new = table(&["stck_bsop_date"], &[&["20240102"]]);
        let merged = table(
            &["stck_bsop_date"],
            &[&["20240101"], &["20240102"], &["20240103"]],
        );

        let report = validate(&old, &new, &merged, "stck_bsop_date");
        assert!(report.is_valid);
        assert!(report.warnings.iter().any(|w| w.contains("above expected maximum")));
        assert_eq!(report.stats.duplicates_removed, -1);
    }

    #[test]
    fn test_large_date_gap_warns() {
        let old = table(&["stck_bsop_date"], &[&["20240101"]]);
        let new = table(&["stck_bsop_date"], &[&["20240120"]]);
        let merged = table(&["stck_bsop_date"], &[&["20240101"], &["20240120"]]);

        let report = validate(&old, &new, &merged, "stck_bsop_date");
        assert!(report.is_valid);
        assert!(report.warnings.iter().any(|w| w.contains("Large date gap")));
    }

    #[test]
    fn test_weekend_gap_does_not_warn() {
        // Friday to Monday is a 3-day gap, well under the threshold
        let old = table(&["stck_bsop_date"], &[&["20240105"]]);
        let new = table(&["stck_bsop_date"], &[&["20240108"]]);
        let merged = table(&["stck_bsop_date"], &[&["20240105"], &["20240108"]]);

        let report = validate(&old, &new, &merged, "stck_bsop_date");
        assert!(report.warnings.is_empty());
    }

    #[test]
    fn test_leftover_duplicates_warn() {
        let old = table(&["stck_bsop_date"], &[&["20240101"]]);
        let new = table(&["stck_bsop_date"], &[&["20240101"]]);
        let merged = table(&["stck_bsop_date"], &[&["20240101"], &["20240101"]]);

        let report = validate(&old, &new, &merged, "stck_bsop_date");
        assert!(report.is_valid);
        assert!(report.warnings.iter().any(|w| w.contains("Duplicate dates remain")));
    }

    #[test]
    fn test_missing_date_column_on_nonempty_result_is_blocking() {
        let old = table(&["other"], &[&["a"]]);
        let new = table(&["other"], &[&["b"]]);
        let merged = table(&["other"], &[&["a"], &["b"]]);

        let report = validate(&old, &new, &merged, "stck_bsop_date");
        assert!(!report.is_valid);
        assert!(report.errors.iter().any(|e| e.contains("stck_bsop_date")));
    }

    #[test]
    fn test_empty_merged_table_warns_but_is_valid() {
        let empty = DataTable::empty();
        let report = validate(&empty, &empty, &empty, "stck_bsop_date");
        assert!(report.is_valid);
        assert!(report.warnings.iter().any(|w| w.contains("empty")));
    }

    #[test]
    fn test_garbage_dates_are_skipped_not_fatal() {
        let old = table(&["stck_bsop_date"], &[&["not-a-date"]]);
        let new = table(&["stck_bsop_date"], &[&["20240101"]]);
        let merged = table(&["stck_bsop_date"], &[&["not-a-date"], &["20240101"]]);

        let report = validate(&old, &new, &merged, "stck_bsop_date");
        assert!(report.is_valid);
    }
}
