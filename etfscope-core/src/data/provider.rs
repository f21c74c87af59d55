//! Provider traits and structured error types.
//!
//! The provider traits abstract over where the listing and the price history
//! come from, so the Naver client can be swapped out and mocked in tests.

use crate::domain::{ListingRow, PriceRow};
use thiserror::Error;

/// Structured error types for fetch, filter and store operations.
///
/// Nothing in the library recovers from these; every failure goes straight
/// back to the caller.
#[derive(Debug, Error)]
pub enum DataError {
    #[error("transport error: {0}")]
    Transport(String),

    #[error("unexpected response shape: {0}")]
    Parse(String),

    #[error(
        "remote store rejected request (status {status_code}, type {}, message {})",
        error_type.as_deref().unwrap_or("-"),
        message.as_deref().unwrap_or("-")
    )]
    Remote {
        status_code: u16,
        error_type: Option<String>,
        message: Option<String>,
    },

    #[error("validation error: {0}")]
    Validation(String),

    #[error("output error: {0}")]
    Output(String),
}

impl DataError {
    /// Map a reqwest failure onto the taxonomy. Body decoding failures are
    /// shape problems; everything else is transport.
    pub(crate) fn from_reqwest(err: reqwest::Error) -> Self {
        if err.is_decode() {
            DataError::Parse(err.to_string())
        } else {
            DataError::Transport(err.to_string())
        }
    }
}

/// Source of the raw ETF listing.
pub trait ListingProvider: Send + Sync {
    /// Human-readable name of this provider.
    fn name(&self) -> &str;

    /// Fetch every listed ETF, unfiltered.
    fn fetch_listing(&self) -> Result<Vec<ListingRow>, DataError>;
}

/// Source of daily price history.
pub trait PriceProvider: Send + Sync {
    /// Fetch the full daily history for one symbol, oldest first.
    fn fetch_prices(&self, symbol: &str) -> Result<Vec<PriceRow>, DataError>;
}
