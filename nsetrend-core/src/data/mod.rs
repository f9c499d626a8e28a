//! Data layer: providers, the validating fetcher, the session cache, and alignment.

pub mod align;
pub mod cache;
pub mod circuit_breaker;
pub mod fetcher;
pub mod provider;
pub mod synthetic;
pub mod yahoo;

pub use align::{align_series, AlignedFrame};
pub use cache::{CacheKey, CacheStats, SeriesCache};
pub use circuit_breaker::{BreakerState, CircuitBreaker};
pub use fetcher::{DataFetcher, FetchedSeries};
pub use provider::{DataProvider, DataSource, ProviderRow};
pub use synthetic::SyntheticProvider;
pub use yahoo::YahooProvider;
