//! Naver Finance provider.
//!
//! Two public, unauthenticated endpoints:
//! - the ETF list (`/api/sise/etfItemList.nhn`), JSON under `result.etfItemList`
//! - daily prices (`/siseJson.naver`), a Python-literal table, see [`super::literal`]
//!
//! One request per call. Failures are returned as-is, there is no retry.

use super::literal::{parse_table, Literal};
use super::provider::{DataError, ListingProvider, PriceProvider};
use crate::domain::{ListingRow, PriceRow};
use chrono::NaiveDate;
use serde::Deserialize;

pub const LISTING_URL: &str = "https://finance.naver.com/api/sise/etfItemList.nhn";
pub const PRICE_URL: &str = "https://api.finance.naver.com/siseJson.naver";

const PRICE_START: &str = "19000101";
const PRICE_END: &str = "20991231";

#[derive(Debug, Deserialize)]
struct ListingResponse {
    result: Option<ListingResult>,
}

#[derive(Debug, Deserialize)]
struct ListingResult {
    #[serde(rename = "etfItemList")]
    etf_item_list: Option<Vec<serde_json::Value>>,
}

/// Naver Finance data provider.
pub struct NaverProvider {
    client: reqwest::blocking::Client,
    listing_url: String,
    price_url: String,
}

impl NaverProvider {
    /// Provider pointed at the public endpoints.
    pub fn new() -> Result<Self, DataError> {
        Self::with_urls(LISTING_URL, PRICE_URL)
    }

    /// Provider pointed at custom endpoints (mirrors, test servers).
    pub fn with_urls(
        listing_url: impl Into<String>,
        price_url: impl Into<String>,
    ) -> Result<Self, DataError> {
        let client = reqwest::blocking::Client::builder()
            .user_agent("Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36")
            .build()
            .map_err(|e| DataError::Transport(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            listing_url: listing_url.into(),
            price_url: price_url.into(),
        })
    }

    /// GET and return the decoded body of a successful response.
    ///
    /// `text()` honours the response charset, which `json()` would not.
    fn get_text(&self, request: reqwest::blocking::RequestBuilder) -> Result<String, DataError> {
        let resp = request.send().map_err(DataError::from_reqwest)?;
        let status = resp.status();
        if !status.is_success() {
            return Err(DataError::Transport(format!(
                "HTTP {status} from {}",
                resp.url()
            )));
        }
        resp.text().map_err(DataError::from_reqwest)
    }

    /// Parse the listing endpoint body.
    ///
    /// Rows are decoded one by one. Bad columns inside a row surface later as
    /// missing fields; an entry that is not an object at all is skipped.
    pub fn parse_listing(body: &str) -> Result<Vec<ListingRow>, DataError> {
        let resp: ListingResponse = serde_json::from_str(body)
            .map_err(|e| DataError::Parse(format!("listing body is not the expected JSON: {e}")))?;
        let items = resp
            .result
            .ok_or_else(|| DataError::Parse("listing response has no 'result'".into()))?
            .etf_item_list
            .ok_or_else(|| {
                DataError::Parse("listing response has no 'result.etfItemList'".into())
            })?;

        let mut rows = Vec::with_capacity(items.len());
        for (i, item) in items.into_iter().enumerate() {
            match serde_json::from_value::<ListingRow>(item) {
                Ok(row) => rows.push(row),
                Err(e) => tracing::warn!(index = i, error = %e, "skipping malformed listing entry"),
            }
        }
        Ok(rows)
    }

    /// Parse the price endpoint body.
    pub fn parse_prices(symbol: &str, body: &str) -> Result<Vec<PriceRow>, DataError> {
        let (headers, rows) = parse_table(body)?;
        let cols = PriceColumns::locate(&headers)?;

        rows.iter()
            .enumerate()
            .map(|(i, row)| cols.row(row).map_err(|e| {
                DataError::Parse(format!("{symbol} price row {i}: {e}"))
            }))
            .collect()
    }
}

impl ListingProvider for NaverProvider {
    fn name(&self) -> &str {
        "naver_finance"
    }

    fn fetch_listing(&self) -> Result<Vec<ListingRow>, DataError> {
        tracing::debug!(url = %self.listing_url, "fetching ETF listing");
        let body = self.get_text(self.client.get(&self.listing_url))?;
        let rows = Self::parse_listing(&body)?;
        tracing::info!(rows = rows.len(), "fetched ETF listing");
        Ok(rows)
    }
}

impl PriceProvider for NaverProvider {
    fn fetch_prices(&self, symbol: &str) -> Result<Vec<PriceRow>, DataError> {
        tracing::debug!(symbol, url = %self.price_url, "fetching daily prices");
        let request = self.client.get(&self.price_url).query(&[
            ("symbol", symbol),
            ("requestType", "1"),
            ("startTime", PRICE_START),
            ("endTime", PRICE_END),
            ("timeframe", "day"),
        ]);
        let body = self.get_text(request)?;
        let rows = Self::parse_prices(symbol, &body)?;
        tracing::info!(symbol, rows = rows.len(), "fetched daily prices");
        Ok(rows)
    }
}

/// Column positions of the price table, located by header name.
struct PriceColumns {
    date: usize,
    open: usize,
    high: usize,
    low: usize,
    close: usize,
    volume: usize,
    foreign_ratio: usize,
}

impl PriceColumns {
    fn locate(headers: &[String]) -> Result<Self, DataError> {
        let find = |name: &str| {
            headers
                .iter()
                .position(|h| h == name)
                .ok_or_else(|| DataError::Parse(format!("price table has no '{name}' column")))
        };
        Ok(Self {
            date: find("날짜")?,
            open: find("시가")?,
            high: find("고가")?,
            low: find("저가")?,
            close: find("종가")?,
            volume: find("거래량")?,
            foreign_ratio: find("외국인소진율")?,
        })
    }

    fn row(&self, cells: &[Literal]) -> Result<PriceRow, String> {
        let cell = |idx: usize| {
            cells
                .get(idx)
                .ok_or_else(|| format!("row has {} cells, column {idx} missing", cells.len()))
        };
        let number = |idx: usize| -> Result<f64, String> {
            let c = cell(idx)?;
            c.as_f64().ok_or_else(|| format!("non-numeric cell {c:?}"))
        };

        let raw_date = cell(self.date)?;
        let date_str = raw_date
            .as_str()
            .ok_or_else(|| format!("date cell is not a string: {raw_date:?}"))?;
        let date = NaiveDate::parse_from_str(date_str.trim(), "%Y%m%d")
            .map_err(|e| format!("bad date '{date_str}': {e}"))?;

        // Ratio is absent for some instruments.
        let foreign_ratio = match cell(self.foreign_ratio)? {
            Literal::None => f64::NAN,
            other => other
                .as_f64()
                .ok_or_else(|| format!("non-numeric cell {other:?}"))?,
        };

        Ok(PriceRow {
            date,
            open: number(self.open)?,
            high: number(self.high)?,
            low: number(self.low)?,
            close: number(self.close)?,
            volume: number(self.volume)?.max(0.0) as u64,
            foreign_ratio,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn listing_parses_nested_item_list() {
        let body = json!({
            "resultCode": "success",
            "result": {
                "etfItemList": [
                    {"itemcode": "069500", "etfTabCode": 1, "itemname": "KODEX 200", "marketSum": 61234},
                    {"itemcode": "102110", "etfTabCode": 1, "itemname": "TIGER 200", "marketSum": 30210}
                ]
            }
        })
        .to_string();

        let rows = NaverProvider::parse_listing(&body).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1].code(), "102110");
    }

    #[test]
    fn one_bad_row_does_not_sink_the_listing() {
        let body = json!({
            "result": {
                "etfItemList": [
                    {"itemcode": "069500", "itemname": "KODEX 200", "marketSum": 61234},
                    {"itemcode": null, "itemname": "TIGER 200", "marketSum": 3000},
                    {"itemcode": "102110", "itemname": 12345, "marketSum": 3000},
                    "not a row"
                ]
            }
        })
        .to_string();

        let rows = NaverProvider::parse_listing(&body).unwrap();
        assert_eq!(rows.len(), 3);
        assert!(!rows[0].has_missing_field());
        assert!(rows[1].has_missing_field());
        assert!(rows[2].has_missing_field());

        let universe = crate::filter::filter_listing(
            &rows,
            &crate::filter::FilterConfig::new(Vec::<String>::new(), 0.0),
        )
        .unwrap();
        let codes: Vec<&str> = universe.iter().map(|r| r.itemcode()).collect();
        assert_eq!(codes, vec!["069500"]);
    }

    #[test]
    fn listing_without_item_list_is_parse_error() {
        for body in [r#"{"result": {}}"#, r#"{"resultCode": "fail"}"#, "not json"] {
            assert!(matches!(
                NaverProvider::parse_listing(body),
                Err(DataError::Parse(_))
            ));
        }
    }

    #[test]
    fn prices_columns_are_located_by_header() {
        // Columns deliberately out of the usual order.
        let body = "[['종가', '날짜', '시가', '고가', '저가', '거래량', '외국인소진율'],\n\
                    [101, \"20240102\", 100, 102, 99, 5000, None]]";
        let rows = NaverProvider::parse_prices("TEST", body).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].date, NaiveDate::from_ymd_opt(2024, 1, 2).unwrap());
        assert_eq!(rows[0].close, 101.0);
        assert_eq!(rows[0].open, 100.0);
        assert_eq!(rows[0].volume, 5000);
        assert!(rows[0].foreign_ratio.is_nan());
    }

    #[test]
    fn prices_with_bad_date_is_parse_error() {
        let body = "[['날짜', '시가', '고가', '저가', '종가', '거래량', '외국인소진율'],\
                    [\"2024-01-02\", 1, 1, 1, 1, 1, 1.0]]";
        assert!(matches!(
            NaverProvider::parse_prices("TEST", body),
            Err(DataError::Parse(_))
        ));
    }

    #[test]
    fn prices_missing_header_is_parse_error() {
        let body = "[['날짜', '시가'], [\"20240102\", 1]]";
        assert!(matches!(
            NaverProvider::parse_prices("TEST", body),
            Err(DataError::Parse(_))
        ));
    }
}
