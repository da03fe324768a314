//! Dataset Registry
//!
//! Static mapping from dataset families to their storage layout and merge
//! keys. Resolution happens through an exhaustive `match`, so adding a
//! dataset means adding a variant and a `spec()` arm, nothing dynamic.

use serde::{Deserialize, Serialize};

use crate::constants::DEFAULT_COLLECTION_START;

/// Storage layout and merge keys for one dataset family
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DatasetSpec {
    /// Relative path under the data root where tables for this family live
    pub feature_path: &'static str,
    /// Primary dedup/sort key column
    pub date_column: &'static str,
    /// Secondary key for intraday datasets
    pub time_column: Option<&'static str>,
    /// Start date used when a full collection is required, YYYYMMDD
    pub default_start: &'static str,
}

/// Dataset families collected from the KIS Developers API
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DatasetKind {
    /// Daily futures OHLC
    FuturesDaily,
    /// Minute futures bars (date + contract hour key)
    FuturesMinute,
    /// Daily options OHLC
    OptionsDaily,
    /// Daily weekly-options OHLC
    WeeklyOptionsDaily,
    /// Daily investor flow aggregates per market
    InvestorDaily,
}

impl DatasetKind {
    pub fn spec(&self) -> DatasetSpec {
        match self {
            DatasetKind::FuturesDaily => DatasetSpec {
                feature_path: "domestic_futures_price",
                date_column: "stck_bsop_date",
                time_column: None,
                default_start: DEFAULT_COLLECTION_START,
            },
            DatasetKind::FuturesMinute => DatasetSpec {
                feature_path: "domestic_futures_minute",
                date_column: "stck_bsop_date",
                time_column: Some("stck_cntg_hour"),
                default_start: DEFAULT_COLLECTION_START,
            },
            DatasetKind::OptionsDaily => DatasetSpec {
                feature_path: "domestic_options_price",
                date_column: "stck_bsop_date",
                time_column: None,
                default_start: DEFAULT_COLLECTION_START,
            },
            DatasetKind::WeeklyOptionsDaily => DatasetSpec {
                feature_path: "domestic_weekly_options_price",
                date_column: "stck_bsop_date",
                time_column: None,
                default_start: DEFAULT_COLLECTION_START,
            },
            DatasetKind::InvestorDaily => DatasetSpec {
                feature_path: "investor_daily",
                date_column: "trade_date",
                time_column: None,
                default_start: DEFAULT_COLLECTION_START,
            },
        }
    }

    /// Feature name used in descriptors (last segment of the feature path)
    pub fn feature_name(&self) -> &'static str {
        self.spec().feature_path
    }

    pub fn all() -> &'static [DatasetKind] {
        &[
            DatasetKind::FuturesDaily,
            DatasetKind::FuturesMinute,
            DatasetKind::OptionsDaily,
            DatasetKind::WeeklyOptionsDaily,
            DatasetKind::InvestorDaily,
        ]
    }

    /// Parse from the feature-path tag
    pub fn from_str(s: &str) -> Result<Self, String> {
        match s {
            "domestic_futures_price" | "futures_daily" => Ok(DatasetKind::FuturesDaily),
            "domestic_futures_minute" | "futures_minute" => Ok(DatasetKind::FuturesMinute),
            "domestic_options_price" | "options_daily" => Ok(DatasetKind::OptionsDaily),
            "domestic_weekly_options_price" | "weekly_options_daily" => {
                Ok(DatasetKind::WeeklyOptionsDaily)
            }
            "investor_daily" => Ok(DatasetKind::InvestorDaily),
            _ => Err(format!("Unknown dataset kind: '{}'", s)),
        }
    }
}
