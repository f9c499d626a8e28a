//! Structured error types for every engine layer.
//!
//! These are designed to be displayable directly to the dashboard user: a
//! failed query is reported as a tagged error, never as an empty chart.

use crate::domain::Instrument;
use chrono::NaiveDate;
use thiserror::Error;

/// A raw symbol string could not be turned into an [`Instrument`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolutionError {
    #[error("symbol is empty")]
    Empty,

    #[error("symbol is {len} characters long (max {max})")]
    TooLong { len: usize, max: usize },

    #[error("symbol must start with a letter or digit, found '{ch}'")]
    InvalidStart { ch: char },

    #[error("invalid character '{ch}' at position {index}")]
    InvalidChar { ch: char, index: usize },

    #[error("unsupported exchange '{exchange}' (expected NS/BO suffix or NSE:/BSE: prefix)")]
    UnsupportedExchange { exchange: String },

    #[error("symbol '{symbol}' is not a known listing")]
    UnknownSymbol { symbol: String },
}

/// The provider failed, or returned nothing usable for the requested range.
///
/// `Clone` because coalesced cache waiters all receive the leader's failure.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FetchError {
    #[error("network unreachable: {0}")]
    NetworkUnreachable(String),

    #[error("provider timed out: {0}")]
    Timeout(String),

    #[error("rate limited by provider (retry after {retry_after_secs}s)")]
    RateLimited { retry_after_secs: u64 },

    #[error("authentication required: {0}")]
    AuthenticationRequired(String),

    #[error("hard stop: data provider has blocked requests (circuit breaker tripped)")]
    CircuitBreakerTripped,

    #[error("provider does not know ticker '{ticker}'")]
    SymbolNotFound { ticker: String },

    #[error("response format changed: {0}")]
    ResponseFormatChanged(String),

    #[error("no data for '{ticker}' between {start} and {end}")]
    NoDataInRange {
        ticker: String,
        start: NaiveDate,
        end: NaiveDate,
    },

    #[error("all {dropped} rows for '{ticker}' were malformed")]
    AllRowsMalformed { ticker: String, dropped: usize },

    #[error("provider error: {0}")]
    Provider(String),
}

/// Not enough aligned data to compute a requested metric.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InsufficientDataError {
    #[error("no instruments to analyze")]
    NoInstruments,

    #[error("{metric}: aligned frame has no dates")]
    NoDates { metric: String },

    #[error("{metric}: no date on which every instrument has an observation")]
    NoCommonDate { metric: String },
}

/// Failure of a whole `analyze` request. No partial results are returned.
#[derive(Debug, Error)]
pub enum QueryError {
    #[error("cannot resolve '{input}': {source}")]
    Resolution {
        input: String,
        #[source]
        source: ResolutionError,
    },

    #[error("fetch failed for {instrument}: {source}")]
    Fetch {
        instrument: Instrument,
        #[source]
        source: FetchError,
    },

    #[error("insufficient data: {0}")]
    InsufficientData(#[from] InsufficientDataError),

    #[error("invalid request: {0}")]
    InvalidRequest(String),
}

/// Problems reading or parsing engine configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("symbol directory: {0}")]
    Directory(#[from] csv::Error),

    #[error("symbol directory is missing the '{0}' column")]
    MissingColumn(&'static str),
}
