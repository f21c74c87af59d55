//! Records as the table service expects them: every attribute is a
//! single-key object naming its type, e.g. `{"S": "069500"}` or
//! `{"N": "61234"}`.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A typed scalar attribute.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum AttributeValue {
    #[serde(rename = "S")]
    S(String),
    /// Numbers travel as their decimal string.
    #[serde(rename = "N")]
    N(String),
    #[serde(rename = "BOOL")]
    Bool(bool),
    #[serde(rename = "NULL")]
    Null(bool),
}

impl AttributeValue {
    pub fn string(s: impl Into<String>) -> Self {
        Self::S(s.into())
    }

    /// Whole numbers are written without a fractional part.
    pub fn number(n: f64) -> Self {
        Self::N(n.to_string())
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::S(s) | Self::N(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::N(s) => s.parse().ok(),
            _ => None,
        }
    }
}

/// Attribute name → value.
pub type KvRecord = BTreeMap<String, AttributeValue>;

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn serializes_as_type_tagged_objects() {
        let mut rec = KvRecord::new();
        rec.insert("itemcode".into(), AttributeValue::string("069500"));
        rec.insert("marketSum".into(), AttributeValue::number(61234.0));

        assert_eq!(
            serde_json::to_value(&rec).unwrap(),
            json!({"itemcode": {"S": "069500"}, "marketSum": {"N": "61234"}})
        );
    }

    #[test]
    fn fractional_numbers_keep_their_digits() {
        assert_eq!(AttributeValue::number(12.5), AttributeValue::N("12.5".into()));
        assert_eq!(AttributeValue::number(12.5).as_f64(), Some(12.5));
    }

    #[test]
    fn deserializes_query_items() {
        let rec: KvRecord =
            serde_json::from_value(json!({"a": {"S": "x"}, "b": {"BOOL": true}})).unwrap();
        assert_eq!(rec["a"].as_str(), Some("x"));
        assert_eq!(rec["b"], AttributeValue::Bool(true));
    }
}
