//! Domain types: listing rows, categories and daily prices.

pub mod listing;
pub mod price;

pub use listing::{EtfCategory, ListingRow};
pub use price::PriceRow;
