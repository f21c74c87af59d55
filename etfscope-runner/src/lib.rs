//! etfscope runner — configuration, batch writes and export.
//!
//! This crate builds on `etfscope-core` to provide:
//! - TOML configuration for the store, filter and writer
//! - The batch writer (sequential or on a worker pool) with per-row results
//! - Listing → universe → store pipeline steps with timing
//! - CSV/JSON export of a universe and its category summary

pub mod config;
pub mod export;
pub mod pipeline;
pub mod writer;

pub use config::{AppConfig, ConfigError};
pub use export::{export_category_json, export_universe_csv, write_universe_csv};
pub use pipeline::{load_universe, put_universe};
pub use writer::{
    build_record, default_workers, BatchSummary, BatchWriter, LogProgress, WriteError, WriteMode,
    WriteProgress,
};
