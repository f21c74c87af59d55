//! Data acquisition: Naver Finance fetchers and the price-response parser.

pub mod frame;
pub mod literal;
pub mod naver;
pub mod provider;

pub use frame::{prices_to_dataframe, write_prices_parquet};
pub use literal::Literal;
pub use naver::NaverProvider;
pub use provider::{DataError, ListingProvider, PriceProvider};
