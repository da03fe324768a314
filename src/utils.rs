use chrono::{Local, NaiveDate};
use std::path::PathBuf;

use crate::constants::DATE_FORMAT;

/// Get base data directory from environment variable or use default
pub fn get_data_dir() -> PathBuf {
    std::env::var("KIS_DATA_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("data"))
}

/// Parse a YYYYMMDD date string
pub fn parse_yyyymmdd(s: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(s.trim(), DATE_FORMAT).ok()
}

/// Format a date as YYYYMMDD
pub fn format_yyyymmdd(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

/// Today's date in local time as YYYYMMDD
pub fn today_yyyymmdd() -> String {
    Local::now().format(DATE_FORMAT).to_string()
}
