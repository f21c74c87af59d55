//! Batch writer: one record per representative, written to a record store.
//!
//! Two modes:
//! - sequential: input order, stops at the first failure; the rows after it
//!   are reported as skipped
//! - parallel: a private rayon pool, every row is attempted regardless of
//!   failures elsewhere
//!
//! Either way the caller gets a [`BatchSummary`] naming which rows were
//! written, which failed (with the error) and which were never attempted.

use chrono::{NaiveDate, Utc};
use etfscope_core::data::provider::DataError;
use etfscope_core::filter::{EtfUniverse, GroupedRow};
use etfscope_core::store::{AttributeValue, KvRecord, RecordStore};
use rayon::prelude::*;
use thiserror::Error;

/// How to schedule the writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteMode {
    Sequential,
    Parallel { workers: usize },
}

/// Twice the number of available processing units.
pub fn default_workers() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
        * 2
}

#[derive(Debug, Error)]
pub enum WriteError {
    #[error("failed to build worker pool: {0}")]
    Pool(#[from] rayon::ThreadPoolBuildError),
}

/// Build the record stored for a representative.
pub fn build_record(rep: &GroupedRow, updated_at: NaiveDate) -> KvRecord {
    let mut rec = KvRecord::new();
    rec.insert("itemcode".into(), AttributeValue::string(rep.itemcode()));
    rec.insert("itemname".into(), AttributeValue::string(rep.itemname()));
    rec.insert("marketSum".into(), AttributeValue::number(rep.market_sum));
    rec.insert(
        "groupMarketSum".into(),
        AttributeValue::number(rep.group_market_sum),
    );
    rec.insert(
        "updatedAt".into(),
        AttributeValue::string(updated_at.format("%Y%m%d").to_string()),
    );
    rec
}

/// Progress callback for batch writes. Called from worker threads in
/// parallel mode.
pub trait WriteProgress: Send + Sync {
    fn on_start(&self, total: usize);

    fn on_row(&self, itemcode: &str, index: usize, total: usize, result: &Result<(), DataError>);

    fn on_batch_complete(&self, summary: &BatchSummary);
}

/// Progress reporter that logs through `tracing`.
pub struct LogProgress;

impl WriteProgress for LogProgress {
    fn on_start(&self, total: usize) {
        tracing::info!(total, "writing batch");
    }

    fn on_row(&self, itemcode: &str, index: usize, total: usize, result: &Result<(), DataError>) {
        match result {
            Ok(()) => tracing::debug!(itemcode, row = index + 1, total, "written"),
            Err(e) => tracing::warn!(itemcode, row = index + 1, total, error = %e, "write failed"),
        }
    }

    fn on_batch_complete(&self, summary: &BatchSummary) {
        tracing::info!(
            total = summary.total,
            written = summary.written.len(),
            failed = summary.failed.len(),
            skipped = summary.skipped.len(),
            "batch complete"
        );
    }
}

/// Outcome of a batch write.
#[derive(Debug, Default)]
pub struct BatchSummary {
    pub total: usize,
    pub written: Vec<String>,
    pub failed: Vec<(String, DataError)>,
    /// Rows never attempted because a sequential batch stopped early.
    pub skipped: Vec<String>,
}

impl BatchSummary {
    pub fn all_succeeded(&self) -> bool {
        self.failed.is_empty() && self.skipped.is_empty()
    }
}

/// Writes a universe to a record store.
pub struct BatchWriter<'a> {
    store: &'a dyn RecordStore,
    mode: WriteMode,
    updated_at: NaiveDate,
}

impl<'a> BatchWriter<'a> {
    /// Writer stamping records with today's UTC date.
    pub fn new(store: &'a dyn RecordStore, mode: WriteMode) -> Self {
        Self {
            store,
            mode,
            updated_at: Utc::now().date_naive(),
        }
    }

    pub fn with_updated_at(mut self, updated_at: NaiveDate) -> Self {
        self.updated_at = updated_at;
        self
    }

    fn write_one(&self, rep: &GroupedRow) -> Result<(), DataError> {
        self.store.put_item(&build_record(rep, self.updated_at))
    }

    pub fn write_all(
        &self,
        universe: &EtfUniverse,
        progress: &dyn WriteProgress,
    ) -> Result<BatchSummary, WriteError> {
        let rows = universe.rows();
        let total = rows.len();
        progress.on_start(total);

        let summary = match self.mode {
            WriteMode::Sequential => self.write_sequential(rows, progress),
            WriteMode::Parallel { workers } => self.write_parallel(rows, workers, progress)?,
        };

        progress.on_batch_complete(&summary);
        Ok(summary)
    }

    fn write_sequential(&self, rows: &[GroupedRow], progress: &dyn WriteProgress) -> BatchSummary {
        let total = rows.len();
        let mut summary = BatchSummary {
            total,
            ..Default::default()
        };

        for (i, rep) in rows.iter().enumerate() {
            let result = self.write_one(rep);
            progress.on_row(rep.itemcode(), i, total, &result);
            match result {
                Ok(()) => summary.written.push(rep.itemcode().to_string()),
                Err(e) => {
                    summary.failed.push((rep.itemcode().to_string(), e));
                    summary.skipped = rows[i + 1..]
                        .iter()
                        .map(|r| r.itemcode().to_string())
                        .collect();
                    break;
                }
            }
        }

        summary
    }

    fn write_parallel(
        &self,
        rows: &[GroupedRow],
        workers: usize,
        progress: &dyn WriteProgress,
    ) -> Result<BatchSummary, WriteError> {
        let total = rows.len();
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(workers.max(1))
            .build()?;

        let results: Vec<(String, Result<(), DataError>)> = pool.install(|| {
            rows.par_iter()
                .enumerate()
                .map(|(i, rep)| {
                    let result = self.write_one(rep);
                    progress.on_row(rep.itemcode(), i, total, &result);
                    (rep.itemcode().to_string(), result)
                })
                .collect()
        });

        let mut summary = BatchSummary {
            total,
            ..Default::default()
        };
        for (code, result) in results {
            match result {
                Ok(()) => summary.written.push(code),
                Err(e) => summary.failed.push((code, e)),
            }
        }
        Ok(summary)
    }
}
