//! HTTP client for the key-value table service.
//!
//! Two calls, both `POST` with an `x-api-key` header:
//! - `{url}` with `{TableName, Item}` writes one record
//! - `{url}/query` with `{TableName, KeyConditionExpression, ExpressionAttributeValues}`
//!
//! Any status other than 200 is a [`DataError::Remote`]. The vendor error type
//! is read from the `x-amzn-ErrorType` header and the message from the body's
//! `message` field. Calls are never retried.

use super::record::KvRecord;
use crate::data::provider::DataError;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use std::fmt;

pub const API_KEY_HEADER: &str = "x-api-key";
pub const ERROR_TYPE_HEADER: &str = "x-amzn-ErrorType";

/// Where and how to reach the table service.
#[derive(Clone, PartialEq, Serialize, Deserialize)]
pub struct StoreConfig {
    pub url: String,
    pub api_key: String,
    pub table_name: String,
}

impl fmt::Debug for StoreConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StoreConfig")
            .field("url", &self.url)
            .field("api_key", &"<redacted>")
            .field("table_name", &self.table_name)
            .finish()
    }
}

/// Anything records can be written to.
pub trait RecordStore: Send + Sync {
    fn put_item(&self, record: &KvRecord) -> Result<(), DataError>;
}

#[derive(Serialize)]
#[serde(rename_all = "PascalCase")]
struct PutItemRequest<'a> {
    table_name: &'a str,
    item: &'a KvRecord,
}

#[derive(Serialize)]
#[serde(rename_all = "PascalCase")]
struct QueryRequest<'a> {
    table_name: &'a str,
    key_condition_expression: &'a str,
    expression_attribute_values: &'a KvRecord,
}

/// Decoded query response.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct QueryOutput {
    #[serde(default)]
    pub items: Vec<KvRecord>,
    #[serde(default)]
    pub count: Option<u64>,
}

/// Blocking client for the table service.
pub struct KvClient {
    client: reqwest::blocking::Client,
    config: StoreConfig,
}

impl KvClient {
    pub fn new(config: StoreConfig) -> Result<Self, DataError> {
        let client = reqwest::blocking::Client::builder()
            .build()
            .map_err(|e| DataError::Transport(format!("failed to build HTTP client: {e}")))?;
        Ok(Self { client, config })
    }

    fn query_url(&self) -> String {
        format!("{}/query", self.config.url.trim_end_matches('/'))
    }

    /// POST a JSON body and return the response if it is a 200.
    fn post<B: Serialize>(
        &self,
        url: &str,
        body: &B,
    ) -> Result<reqwest::blocking::Response, DataError> {
        let resp = self
            .client
            .post(url)
            .header(API_KEY_HEADER, &self.config.api_key)
            .json(body)
            .send()
            .map_err(DataError::from_reqwest)?;

        if resp.status() == StatusCode::OK {
            Ok(resp)
        } else {
            Err(remote_error(resp))
        }
    }

    /// Write one record.
    pub fn put_item(&self, record: &KvRecord) -> Result<(), DataError> {
        let body = PutItemRequest {
            table_name: &self.config.table_name,
            item: record,
        };
        self.post(&self.config.url, &body)?;
        Ok(())
    }

    /// Query by key condition, e.g. `itemcode = :code` with
    /// `{":code": {"S": "069500"}}`.
    pub fn query(&self, expr: &str, values: &KvRecord) -> Result<QueryOutput, DataError> {
        let body = QueryRequest {
            table_name: &self.config.table_name,
            key_condition_expression: expr,
            expression_attribute_values: values,
        };
        let resp = self.post(&self.query_url(), &body)?;
        let text = resp.text().map_err(DataError::from_reqwest)?;
        serde_json::from_str(&text)
            .map_err(|e| DataError::Parse(format!("query response is not the expected JSON: {e}")))
    }
}

impl RecordStore for KvClient {
    fn put_item(&self, record: &KvRecord) -> Result<(), DataError> {
        KvClient::put_item(self, record)
    }
}

/// Build (and log) the error for a non-200 response.
fn remote_error(resp: reqwest::blocking::Response) -> DataError {
    let status_code = resp.status().as_u16();
    let error_type = resp
        .headers()
        .get(ERROR_TYPE_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    let message = resp
        .text()
        .ok()
        .and_then(|body| serde_json::from_str::<serde_json::Value>(&body).ok())
        .and_then(|v| v.get("message").and_then(|m| m.as_str()).map(str::to_string));

    tracing::error!(
        status_code,
        error_type = error_type.as_deref().unwrap_or("-"),
        message = message.as_deref().unwrap_or("-"),
        "table service rejected request"
    );

    DataError::Remote {
        status_code,
        error_type,
        message,
    }
}
