//! NSE Trend Core: historical data aggregation and trend analysis.
//!
//! This crate contains the engine behind the stock dashboard:
//! - Symbol resolution and the NSE listing directory
//! - Provider interface with Yahoo Finance and synthetic implementations
//! - Validating fetcher and the coalescing session cache
//! - Outer-join alignment with explicit gaps
//! - Trend analytics (moving average, returns, volatility, RSI, normalized comparison)
//! - The `analyze` query facade

pub mod analytics;
pub mod config;
pub mod data;
pub mod domain;
pub mod error;
pub mod fingerprint;
pub mod query;
pub mod symbols;
pub mod warning;

pub use analytics::{AnalyticsSeries, MetricSpec};
pub use config::EngineConfig;
pub use domain::{Bar, Cell, Exchange, Granularity, Instrument, RawSeries};
pub use error::{ConfigError, FetchError, InsufficientDataError, QueryError, ResolutionError};
pub use query::{AnalysisRequest, AnalyticsResult, Engine, Lookback};
pub use warning::Warning;
