//! Listing rows as returned by the ETF list endpoint.

use crate::data::provider::DataError;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// One listed ETF.
///
/// Only the columns the filter engine needs are typed. Everything else the
/// endpoint returns (price, NAV, three-month return, ...) is carried in
/// `extra` untouched. `marketSum` stays a raw JSON value until the threshold
/// step so a non-numeric value can be reported rather than rejected at
/// deserialization time. A null or non-string `itemcode`/`itemname` reads as
/// `None`, which marks the row as missing a field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListingRow {
    #[serde(default, deserialize_with = "string_or_none")]
    pub itemcode: Option<String>,

    #[serde(default, deserialize_with = "string_or_none")]
    pub itemname: Option<String>,

    #[serde(rename = "marketSum", default)]
    pub market_sum: Option<Value>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ListingRow {
    /// Build a row with a numeric market cap and no extra columns.
    pub fn new(itemcode: impl Into<String>, itemname: impl Into<String>, market_sum: f64) -> Self {
        Self {
            itemcode: Some(itemcode.into()),
            itemname: Some(itemname.into()),
            market_sum: serde_json::Number::from_f64(market_sum).map(Value::Number),
            extra: Map::new(),
        }
    }

    /// Attach an extra column.
    pub fn with_column(mut self, key: impl Into<String>, value: Value) -> Self {
        self.extra.insert(key.into(), value);
        self
    }

    /// Item code, empty when absent.
    pub fn code(&self) -> &str {
        self.itemcode.as_deref().unwrap_or("")
    }

    /// Display name, empty when absent.
    pub fn name(&self) -> &str {
        self.itemname.as_deref().unwrap_or("")
    }

    /// True if any column of the row is missing or null.
    pub fn has_missing_field(&self) -> bool {
        self.itemcode.is_none()
            || self.itemname.is_none()
            || matches!(self.market_sum, None | Some(Value::Null))
            || self.extra.values().any(Value::is_null)
    }

    /// Numeric market cap.
    ///
    /// No coercion is attempted: strings, booleans and the like are a
    /// validation error.
    pub fn market_sum(&self) -> Result<f64, DataError> {
        match &self.market_sum {
            Some(Value::Number(n)) => n.as_f64().ok_or_else(|| {
                DataError::Validation(format!(
                    "marketSum for {} is out of range: {n}",
                    self.code()
                ))
            }),
            Some(other) => Err(DataError::Validation(format!(
                "marketSum for {} is not numeric: {other}",
                self.code()
            ))),
            None => Err(DataError::Validation(format!(
                "marketSum for {} is missing",
                self.code()
            ))),
        }
    }

    /// Category from the `etfTabCode` column.
    pub fn category(&self) -> EtfCategory {
        self.extra
            .get("etfTabCode")
            .and_then(Value::as_i64)
            .map(EtfCategory::from_code)
            .unwrap_or(EtfCategory::Unknown)
    }
}

fn string_or_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::String(s) => Some(s),
        _ => None,
    })
}

/// ETF category tab on the portal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum EtfCategory {
    DomesticIndex,
    DomesticSector,
    DomesticDerivatives,
    OverseasEquity,
    Commodity,
    Bond,
    Other,
    Unknown,
}

impl EtfCategory {
    pub fn from_code(code: i64) -> Self {
        match code {
            1 => Self::DomesticIndex,
            2 => Self::DomesticSector,
            3 => Self::DomesticDerivatives,
            4 => Self::OverseasEquity,
            5 => Self::Commodity,
            6 => Self::Bond,
            7 => Self::Other,
            _ => Self::Unknown,
        }
    }

    /// Label as shown on the portal.
    pub fn label(&self) -> &'static str {
        match self {
            Self::DomesticIndex => "국내 시장지수",
            Self::DomesticSector => "국내 업종/테마",
            Self::DomesticDerivatives => "국내 파생",
            Self::OverseasEquity => "해외 주식",
            Self::Commodity => "원자재",
            Self::Bond => "채권",
            Self::Other => "기타",
            Self::Unknown => "미분류",
        }
    }
}

impl fmt::Display for EtfCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn deserializes_endpoint_row_with_extras() {
        let row: ListingRow = serde_json::from_value(json!({
            "itemcode": "069500",
            "etfTabCode": 1,
            "itemname": "KODEX 200",
            "nowVal": 35000,
            "threeMonthEarnRate": 3.2,
            "marketSum": 61234
        }))
        .unwrap();

        assert_eq!(row.code(), "069500");
        assert_eq!(row.name(), "KODEX 200");
        assert_eq!(row.market_sum().unwrap(), 61234.0);
        assert_eq!(row.category(), EtfCategory::DomesticIndex);
        assert_eq!(row.extra["nowVal"], json!(35000));
        assert!(!row.has_missing_field());
    }

    #[test]
    fn null_extra_column_counts_as_missing() {
        let row = ListingRow::new("A", "KODEX 200", 100.0)
            .with_column("threeMonthEarnRate", Value::Null);
        assert!(row.has_missing_field());
    }

    #[test]
    fn absent_market_sum_counts_as_missing() {
        let row: ListingRow =
            serde_json::from_value(json!({"itemcode": "A", "itemname": "X"})).unwrap();
        assert!(row.has_missing_field());
    }

    #[test]
    fn null_or_non_string_code_and_name_count_as_missing() {
        let no_code: ListingRow = serde_json::from_value(
            json!({"itemcode": null, "itemname": "TIGER 200", "marketSum": 3000}),
        )
        .unwrap();
        assert_eq!(no_code.itemcode, None);
        assert!(no_code.has_missing_field());

        let numeric_name: ListingRow = serde_json::from_value(
            json!({"itemcode": "102110", "itemname": 12345, "marketSum": 3000}),
        )
        .unwrap();
        assert_eq!(numeric_name.itemname, None);
        assert!(numeric_name.has_missing_field());
    }

    #[test]
    fn string_market_sum_is_a_validation_error() {
        let mut row = ListingRow::new("A", "KODEX 200", 0.0);
        row.market_sum = Some(json!("1,000"));
        assert!(matches!(row.market_sum(), Err(DataError::Validation(_))));
    }

    #[test]
    fn unknown_tab_code_maps_to_unknown() {
        let row = ListingRow::new("A", "X", 1.0).with_column("etfTabCode", json!(42));
        assert_eq!(row.category(), EtfCategory::Unknown);
        assert_eq!(ListingRow::new("B", "Y", 1.0).category(), EtfCategory::Unknown);
    }
}
