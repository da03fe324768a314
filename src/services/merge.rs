//! Table Merge Engine
//!
//! Combines an existing on-disk table with a freshly fetched batch,
//! deduplicating on the dataset's composite key and re-sorting. When a key
//! collides, the fetched row wins, which makes a re-fetch of overlapping
//! dates self-correcting.

use std::collections::HashSet;
use tracing::{debug, warn};

use crate::models::DataTable;

/// Merge `new` into `existing`, keyed by `date_column` and optionally
/// `time_column`.
///
/// - empty `new` returns `existing` unchanged (an empty fetch never
///   destroys data);
/// - empty `existing` returns `new` as-is (first collection);
/// - otherwise: concatenate existing-then-new, drop duplicate keys keeping
///   the last occurrence, sort ascending by the key columns.
///
/// Datasets without the date column (point-in-time snapshots) degrade to a
/// plain concatenation rather than an error.
pub fn merge(
    existing: &DataTable,
    new: &DataTable,
    date_column: &str,
    time_column: Option<&str>,
) -> DataTable {
    if new.is_empty() {
        debug!("Fetched batch empty, keeping existing table unchanged");
        return existing.clone();
    }

    if existing.is_empty() {
        return new.clone();
    }

    let mut merged = DataTable::new(existing.columns().to_vec());
    let mut rows: Vec<Vec<String>> = existing.rows().to_vec();
    rows.extend(merged.project_rows(new));

    let date_idx = merged.column_index(date_column);
    if date_idx.is_none() || new.column_index(date_column).is_none() {
        warn!(
            date_column,
            "Date column missing, skipping deduplication and sort"
        );
        merged.set_rows(rows);
        return merged;
    }

    let mut key_indices = vec![date_idx.unwrap()];
    if let Some(time_col) = time_column {
        if let Some(idx) = merged.column_index(time_col) {
            key_indices.push(idx);
        }
    }

    let before = rows.len();
    let rows = dedup_keep_last(rows, &key_indices);
    if rows.len() < before {
        debug!(
            removed = before - rows.len(),
            remaining = rows.len(),
            "Removed duplicate keys"
        );
    }

    let mut rows = rows;
    rows.sort_by(|a, b| {
        for &idx in &key_indices {
            match canonical_key(&a[idx]).cmp(&canonical_key(&b[idx])) {
                std::cmp::Ordering::Equal => continue,
                other => return other,
            }
        }
        std::cmp::Ordering::Equal
    });

    merged.set_rows(rows);
    merged
}

/// Drop rows with duplicate composite keys, keeping the last occurrence
/// and preserving the relative order of survivors.
fn dedup_keep_last(rows: Vec<Vec<String>>, key_indices: &[usize]) -> Vec<Vec<String>> {
    let mut seen = HashSet::new();
    let mut kept: Vec<Vec<String>> = Vec::with_capacity(rows.len());

    for row in rows.into_iter().rev() {
        let key: Vec<String> = key_indices
            .iter()
            .map(|&idx| canonical_key(&row[idx]))
            .collect();
        if seen.insert(key) {
            kept.push(row);
        }
    }

    kept.reverse();
    kept
}

/// Canonical string form of a key cell.
///
/// Fetch paths deliver dates as raw strings or preformatted date values;
/// trimming keeps both comparable, and the zero-padded wire formats
/// (YYYYMMDD, HHMMSS) order correctly as strings.
fn canonical_key(cell: &str) -> String {
    cell.trim().to_string()
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

    fn dates(t: &DataTable) -> Vec<String> {
        t.column_values("stck_bsop_date")
            .into_iter()
            .map(str::to_string)
            .collect()
    }

    #[test]
    fn test_empty_fetch_is_a_no_op() {
        let existing = table(
            &["stck_bsop_date", "close"],
            &[&["20240101", "100"], &["20240102", "101"]],
        );
        let new = DataTable::new(vec!["stck_bsop_date", "close"]);

        let merged = merge(&existing, &new, "stck_bsop_date", None);
        assert_eq!(merged, existing);
    }

    #[test]
    fn test_first_collection_returns_new_rows() {
        let new = table(&["stck_bsop_date", "close"], &[&["20240101", "100"]]);
        let merged = merge(&DataTable::empty(), &new, "stck_bsop_date", None);
        assert_eq!(merged, new);
    }

    #[test]
    fn test_dedup_keeps_last_occurrence() {
        let existing = table(&["stck_bsop_date", "close"], &[&["20240101", "old_val"]]);
        let new = table(&["stck_bsop_date", "close"], &[&["20240101", "new_val"]]);

        let merged = merge(&existing, &new, "stck_bsop_date", None);
        assert_eq!(merged.len(), 1);
        assert_eq!(merged.rows()[0], vec!["20240101", "new_val"]);
    }

    #[test]
    fn test_merge_sorts_ascending_by_date() {
        let existing = table(
            &["stck_bsop_date", "close"],
            &[&["20240103", "103"], &["20240101", "101"]],
        );
        let new = table(&["stck_bsop_date", "close"], &[&["20240102", "102"]]);

        let merged = merge(&existing, &new, "stck_bsop_date", None);
        assert_eq!(dates(&merged), vec!["20240101", "20240102", "20240103"]);
    }

    #[test]
    fn test_intraday_sort_uses_time_column_within_date() {
        let existing = table(
            &["stck_bsop_date", "stck_cntg_hour", "price"],
            &[&["20240101", "1030", "1"], &["20240101", "0900", "2"]],
        );
        let new = table(
            &["stck_bsop_date", "stck_cntg_hour", "price"],
            &[&["20240101", "1000", "3"]],
        );

        let merged = merge(&existing, &new, "stck_bsop_date", Some("stck_cntg_hour"));
        let hours: Vec<_> = merged.column_values("stck_cntg_hour");
        assert_eq!(hours, vec!["0900", "1000", "1030"]);
    }

    #[test]
    fn test_same_date_different_time_are_distinct_keys() {
        let existing = table(
            &["stck_bsop_date", "stck_cntg_hour", "price"],
            &[&["20240101", "0900", "1"]],
        );
        let new = table(
            &["stck_bsop_date", "stck_cntg_hour", "price"],
            &[&["20240101", "0901", "2"]],
        );

        let merged = merge(&existing, &new, "stck_bsop_date", Some("stck_cntg_hour"));
        assert_eq!(merged.len(), 2);
    }

    #[test]
    fn test_missing_date_column_degrades_to_concat() {
        let existing = table(&["snapshot_field"], &[&["a"], &["b"]]);
        let new = table(&["snapshot_field"], &[&["c"]]);

        let merged = merge(&existing, &new, "stck_bsop_date", None);
        assert_eq!(merged.len(), 3);
    }

    #[test]
    fn test_merge_is_idempotent_over_the_same_batch() {
        let existing = table(
            &["stck_bsop_date", "close"],
            &[&["20240101", "100"], &["20240102", "101"]],
        );
        let new = table(
            &["stck_bsop_date", "close"],
            &[&["20240102", "201"], &["20240103", "103"]],
        );

        let once = merge(&existing, &new, "stck_bsop_date", None);
        let twice = merge(&once, &new, "stck_bsop_date", None);
        assert_eq!(once, twice);
    }

    #[test]
    fn test_row_count_bounds() {
        let existing = table(
            &["stck_bsop_date", "close"],
            &[&["20240101", "100"], &["20240102", "101"]],
        );
        let new = table(
            &["stck_bsop_date", "close"],
            &[&["20240102", "201"], &["20240103", "103"]],
        );

        let merged = merge(&existing, &new, "stck_bsop_date", None);
        assert!(merged.len() >= existing.len());
        assert!(merged.len() <= existing.len() + new.len());
    }

    #[test]
    fn test_key_cells_are_trimmed_before_comparison() {
        let existing = table(&["stck_bsop_date", "close"], &[&["20240101", "100"]]);
        let new = table(&["stck_bsop_date", "close"], &[&[" 20240101 ", "200"]]);

        let merged = merge(&existing, &new, "stck_bsop_date", None);
        assert_eq!(merged.len(), 1);
        assert_eq!(merged.rows()[0][1], "200");
    }

    #[test]
    fn test_new_rows_projected_onto_existing_header() {
        let existing = table(&["stck_bsop_date", "close"], &[&["20240101", "100"]]);
        // Fetched batch carries columns in a different order plus an extra one
        let new = table(
            &["extra", "close", "stck_bsop_date"],
            &[&["x", "102", "20240102"]],
        );

        let merged = merge(&existing, &new, "stck_bsop_date", None);
        assert_eq!(merged.columns(), existing.columns());
        assert_eq!(merged.rows()[1], vec!["20240102", "102"]);
    }
}
