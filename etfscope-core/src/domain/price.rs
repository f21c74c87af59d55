use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One trading day of one symbol.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceRow {
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: u64,
    /// Foreign ownership ratio, percent.
    pub foreign_ratio: f64,
}
