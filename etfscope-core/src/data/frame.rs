//! Price history as a Polars frame, and Parquet output.
//!
//! Columns: `date, open, high, low, close, volume, foreign_ratio`.

use super::provider::DataError;
use crate::domain::PriceRow;
use chrono::NaiveDate;
use polars::prelude::*;
use std::fs;
use std::path::Path;

/// Convert price rows to a Polars DataFrame.
pub fn prices_to_dataframe(rows: &[PriceRow]) -> Result<DataFrame, DataError> {
    let epoch = NaiveDate::from_ymd_opt(1970, 1, 1)
        .ok_or_else(|| DataError::Output("invalid epoch".into()))?;
    let dates: Vec<i32> = rows
        .iter()
        .map(|r| (r.date - epoch).num_days() as i32)
        .collect();
    let opens: Vec<f64> = rows.iter().map(|r| r.open).collect();
    let highs: Vec<f64> = rows.iter().map(|r| r.high).collect();
    let lows: Vec<f64> = rows.iter().map(|r| r.low).collect();
    let closes: Vec<f64> = rows.iter().map(|r| r.close).collect();
    let volumes: Vec<u64> = rows.iter().map(|r| r.volume).collect();
    let ratios: Vec<f64> = rows.iter().map(|r| r.foreign_ratio).collect();

    DataFrame::new(vec![
        Column::new("date".into(), dates)
            .cast(&DataType::Date)
            .map_err(|e| DataError::Output(format!("date cast: {e}")))?,
        Column::new("open".into(), opens),
        Column::new("high".into(), highs),
        Column::new("low".into(), lows),
        Column::new("close".into(), closes),
        Column::new("volume".into(), volumes),
        Column::new("foreign_ratio".into(), ratios),
    ])
    .map_err(|e| DataError::Output(format!("dataframe creation: {e}")))
}

/// Write price rows to a Parquet file.
///
/// The file is written to `{path}.tmp` first and renamed into place.
pub fn write_prices_parquet(rows: &[PriceRow], path: &Path) -> Result<(), DataError> {
    let mut df = prices_to_dataframe(rows)?;
    let tmp_path = path.with_extension("parquet.tmp");

    let file = fs::File::create(&tmp_path)
        .map_err(|e| DataError::Output(format!("create {}: {e}", tmp_path.display())))?;
    ParquetWriter::new(file)
        .finish(&mut df)
        .map_err(|e| DataError::Output(format!("write parquet: {e}")))?;

    fs::rename(&tmp_path, path).map_err(|e| {
        let _ = fs::remove_file(&tmp_path);
        DataError::Output(format!("rename into {}: {e}", path.display()))
    })?;
    Ok(())
}
