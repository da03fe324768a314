//! Incremental collection core for KIS Developers API market data.
//!
//! Datasets are stored as per-code CSV tables with JSON descriptors and a
//! bounded history log under a `.metadata` sibling directory. The
//! [`services::IncrementalUpdater`] composes window calculation, merging,
//! validation, and backup/rollback into one per-dataset run; the fetch
//! layer (HTTP, auth) is supplied by the caller.

pub mod cli;
pub mod commands;
pub mod constants;
pub mod error;
pub mod models;
pub mod services;
pub mod utils;

pub use error::{AppError, Error, Result};
