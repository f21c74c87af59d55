//! Filter/group engine.
//!
//! Turns the raw listing into a universe of one representative ETF per
//! underlying exposure:
//! 1. drop rows with any missing column
//! 2. drop rows whose name contains an exclusion keyword
//! 3. drop rows below the market-cap threshold (the threshold itself is kept)
//! 4. normalize names into group keys
//! 5. keep the largest row per group, annotated with the group's total
//! 6. order by market cap, largest first
//!
//! Group keys are purely textual. Two unrelated funds whose names collapse to
//! the same key are treated as one group.

use crate::data::provider::DataError;
use crate::domain::ListingRow;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Exclusion keywords commonly used for the Korean market: synthetic,
/// active, leveraged, mixed-asset, rate, short-term, 3-year bond, dividend
/// and total-return products.
pub const KOREAN_DEFAULT_EXCLUDES: [&str; 10] = [
    "합성", "액티브", "레버리지", "2X", "혼합", "금리", "단기", "3년", "배당", "TR",
];

/// Inputs of the engine besides the listing itself.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterConfig {
    /// Case-sensitive substrings; a name containing any of them is dropped.
    pub exclude_keywords: Vec<String>,
    /// Minimum `marketSum`, inclusive.
    pub min_market_cap: f64,
}

impl FilterConfig {
    pub fn new<I, S>(exclude_keywords: I, min_market_cap: f64) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            exclude_keywords: exclude_keywords.into_iter().map(Into::into).collect(),
            min_market_cap,
        }
    }

    /// Korean default keyword list with a threshold of 1000 (100M KRW units).
    pub fn korean_default() -> Self {
        Self::new(KOREAN_DEFAULT_EXCLUDES, 1000.0)
    }

    fn is_excluded(&self, name: &str) -> bool {
        self.exclude_keywords
            .iter()
            .any(|kwd| !kwd.is_empty() && name.contains(kwd.as_str()))
    }
}

/// A representative row with its group annotation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupedRow {
    pub row: ListingRow,
    pub group: String,
    pub market_sum: f64,
    pub group_market_sum: f64,
    /// Number of listing rows collapsed into this one.
    pub group_size: usize,
}

impl GroupedRow {
    pub fn itemcode(&self) -> &str {
        self.row.code()
    }

    pub fn itemname(&self) -> &str {
        self.row.name()
    }
}

/// Result of the engine: representatives ordered by market cap, descending.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct EtfUniverse {
    rows: Vec<GroupedRow>,
}

impl EtfUniverse {
    pub fn rows(&self) -> &[GroupedRow] {
        &self.rows
    }

    pub fn iter(&self) -> std::slice::Iter<'_, GroupedRow> {
        self.rows.iter()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Look up a representative by item code.
    pub fn get(&self, itemcode: &str) -> Option<&GroupedRow> {
        self.rows.iter().find(|r| r.itemcode() == itemcode)
    }

    /// The representatives as plain listing rows, in universe order.
    pub fn to_listing(&self) -> Vec<ListingRow> {
        self.rows.iter().map(|r| r.row.clone()).collect()
    }
}

impl<'a> IntoIterator for &'a EtfUniverse {
    type Item = &'a GroupedRow;
    type IntoIter = std::slice::Iter<'a, GroupedRow>;

    fn into_iter(self) -> Self::IntoIter {
        self.rows.iter()
    }
}

/// Normalize a name into its group key.
///
/// The issuer prefix (everything up to the first space) goes, then `(H)`
/// and `선물` anywhere, then a trailing `TR`.
///
/// ```
/// use etfscope_core::filter::group_key;
/// assert_eq!(group_key("KODEX 미국S&P500선물(H)"), "미국S&P500");
/// assert_eq!(group_key("TIGER 미국S&P500"), "미국S&P500");
/// assert_eq!(group_key("KODEX 200TR"), "200");
/// ```
pub fn group_key(name: &str) -> String {
    let rest = match name.char_indices().find(|(_, c)| c.is_whitespace()) {
        Some((idx, ' ')) => &name[idx + 1..],
        _ => name,
    };
    let stripped = rest.replace("(H)", "").replace("선물", "");
    let stripped = stripped.trim_end();
    stripped
        .strip_suffix("TR")
        .unwrap_or(stripped)
        .trim()
        .to_string()
}

struct GroupAcc<'a> {
    best: &'a ListingRow,
    best_sum: f64,
    total: f64,
    size: usize,
}

/// Run the engine over a raw listing.
///
/// Fails with [`DataError::Validation`] when a row that survives the missing
/// field and keyword steps has a non-numeric `marketSum`.
pub fn filter_listing(rows: &[ListingRow], config: &FilterConfig) -> Result<EtfUniverse, DataError> {
    let mut kept: Vec<(&ListingRow, f64)> = Vec::with_capacity(rows.len());
    let mut missing = 0usize;
    let mut excluded = 0usize;
    let mut below = 0usize;

    for row in rows {
        if row.has_missing_field() {
            missing += 1;
            continue;
        }
        if config.is_excluded(row.name()) {
            excluded += 1;
            continue;
        }
        let market_sum = row.market_sum()?;
        if market_sum < config.min_market_cap {
            below += 1;
            continue;
        }
        kept.push((row, market_sum));
    }

    let mut index: HashMap<String, usize> = HashMap::new();
    let mut groups: Vec<GroupAcc<'_>> = Vec::new();
    let mut keys: Vec<String> = Vec::new();

    for (row, market_sum) in kept {
        let key = group_key(row.name());
        match index.get(&key) {
            Some(&i) => {
                let acc = &mut groups[i];
                acc.total += market_sum;
                acc.size += 1;
                if market_sum > acc.best_sum {
                    acc.best = row;
                    acc.best_sum = market_sum;
                }
            }
            None => {
                index.insert(key.clone(), groups.len());
                keys.push(key);
                groups.push(GroupAcc {
                    best: row,
                    best_sum: market_sum,
                    total: market_sum,
                    size: 1,
                });
            }
        }
    }

    let mut reps: Vec<GroupedRow> = groups
        .into_iter()
        .zip(keys)
        .map(|(acc, group)| GroupedRow {
            row: acc.best.clone(),
            group,
            market_sum: acc.best_sum,
            group_market_sum: acc.total,
            group_size: acc.size,
        })
        .collect();
    reps.sort_by(|a, b| b.market_sum.total_cmp(&a.market_sum));

    tracing::debug!(
        input = rows.len(),
        missing,
        excluded,
        below_threshold = below,
        groups = reps.len(),
        "filtered ETF listing"
    );

    Ok(EtfUniverse { rows: reps })
}
