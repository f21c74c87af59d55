//! etfscope core — ETF listing acquisition, filtering and persistence.
//!
//! This crate contains:
//! - Domain types (listing rows, categories, daily prices)
//! - Naver Finance fetchers for the ETF list and daily price history
//! - The filter/group engine that reduces the listing to one ETF per exposure
//! - Category summary of a filtered universe
//! - A blocking client for the key-value table service
//! - Timing wrappers that log through `tracing`

pub mod data;
pub mod diagnostics;
pub mod domain;
pub mod filter;
pub mod store;
pub mod summary;

pub use data::{DataError, ListingProvider, NaverProvider, PriceProvider};
pub use domain::{EtfCategory, ListingRow, PriceRow};
pub use filter::{filter_listing, group_key, EtfUniverse, FilterConfig, GroupedRow};
pub use store::{AttributeValue, KvClient, KvRecord, QueryOutput, RecordStore, StoreConfig};

#[cfg(test)]
mod tests {
    use super::*;

    /// Compile-time check: types handed to worker threads are Send + Sync.
    #[allow(dead_code)]
    fn assert_send_sync() {
        fn require_send<T: Send>() {}
        fn require_sync<T: Sync>() {}

        require_send::<ListingRow>();
        require_sync::<ListingRow>();
        require_send::<GroupedRow>();
        require_sync::<GroupedRow>();
        require_send::<EtfUniverse>();
        require_sync::<EtfUniverse>();
        require_send::<KvRecord>();
        require_sync::<KvRecord>();
        require_send::<KvClient>();
        require_sync::<KvClient>();
        require_send::<NaverProvider>();
        require_sync::<NaverProvider>();
        require_send::<DataError>();
        require_sync::<DataError>();
    }

    #[test]
    fn record_store_is_object_safe() {
        fn _check(store: &dyn RecordStore, record: &KvRecord) -> Result<(), DataError> {
            store.put_item(record)
        }
    }
}
