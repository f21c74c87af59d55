//! Key-value table service: record model and HTTP client.

pub mod client;
pub mod record;

pub use client::{KvClient, QueryOutput, RecordStore, StoreConfig};
pub use record::{AttributeValue, KvRecord};
