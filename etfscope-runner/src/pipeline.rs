//! End-to-end steps: listing → universe, universe → store.

use crate::writer::{BatchSummary, BatchWriter, WriteError, WriteMode, WriteProgress};
use etfscope_core::data::{DataError, ListingProvider};
use etfscope_core::diagnostics::stopwatch;
use etfscope_core::filter::{filter_listing, EtfUniverse, FilterConfig};
use etfscope_core::store::RecordStore;

/// Fetch the listing and reduce it to the filtered universe.
pub fn load_universe(
    provider: &dyn ListingProvider,
    filter: &FilterConfig,
) -> Result<EtfUniverse, DataError> {
    stopwatch("load_universe", || {
        let listing = provider.fetch_listing()?;
        let universe = filter_listing(&listing, filter)?;
        tracing::info!(
            provider = provider.name(),
            listed = listing.len(),
            selected = universe.len(),
            "universe ready"
        );
        Ok(universe)
    })
}

/// Write every representative of the universe to the store.
pub fn put_universe(
    universe: &EtfUniverse,
    store: &dyn RecordStore,
    mode: WriteMode,
    progress: &dyn WriteProgress,
) -> Result<BatchSummary, WriteError> {
    stopwatch("put_universe", || {
        BatchWriter::new(store, mode).write_all(universe, progress)
    })
}
