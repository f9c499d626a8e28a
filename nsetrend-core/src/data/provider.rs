//! Data provider trait and the untyped row it returns.
//!
//! The DataProvider trait abstracts over data sources (Yahoo Finance, the
//! synthetic generator, test doubles). Providers hand back rows exactly as
//! the upstream shaped them; the fetcher is the only place those rows are
//! validated and turned into [`Bar`](crate::domain::Bar)s.

use crate::domain::{Granularity, Instrument};
use crate::error::FetchError;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One provider row before validation. Any field may be missing.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ProviderRow {
    /// Unix epoch seconds of the session, as reported by the provider.
    pub timestamp: i64,
    pub open: Option<f64>,
    pub high: Option<f64>,
    pub low: Option<f64>,
    pub close: Option<f64>,
    pub volume: Option<u64>,
}

impl ProviderRow {
    /// Rows with every field missing are non-trading placeholders.
    pub fn is_placeholder(&self) -> bool {
        self.open.is_none()
            && self.high.is_none()
            && self.low.is_none()
            && self.close.is_none()
            && self.volume.is_none()
    }
}

/// Where the data came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataSource {
    YahooFinance,
    Synthetic,
    Fixture,
}

/// Trait for market data providers.
///
/// Implementations handle the specifics of one upstream. The cache layer sits
/// above the fetcher, which sits above this trait; providers know about
/// neither.
pub trait DataProvider: Send + Sync {
    /// Human-readable name of this provider.
    fn name(&self) -> &str;

    fn source(&self) -> DataSource;

    /// Fetch rows for an instrument. The provider may return a superset of
    /// the requested range.
    fn fetch_rows(
        &self,
        instrument: &Instrument,
        start: NaiveDate,
        end: NaiveDate,
        granularity: Granularity,
    ) -> Result<Vec<ProviderRow>, FetchError>;

    /// Check if the provider is currently available (not rate-limited, not blocked).
    fn is_available(&self) -> bool {
        true
    }
}
