//! Query facade: the single entry point the presentation layer calls.
//!
//! `analyze` resolves symbols, fetches every instrument through the session
//! cache in parallel, aligns the series, and computes the requested metrics.
//! Either the whole result is returned or a tagged [`QueryError`]; there are
//! no partial results.

use crate::analytics::{summarize, AnalyticsSeries, InstrumentSummary, MetricSpec};
use crate::config::EngineConfig;
use crate::data::{align_series, AlignedFrame, CacheKey, DataFetcher, DataProvider, DataSource, SeriesCache};
use crate::domain::{Exchange, Granularity, Instrument};
use crate::error::{ConfigError, InsufficientDataError, QueryError};
use crate::fingerprint::dataset_hash;
use crate::symbols::{SymbolDirectory, SymbolResolver};
use crate::warning::Warning;
use chrono::{Duration, NaiveDate, Utc};
use rayon::prelude::*;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use tracing::{info, warn};

/// What to analyze.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisRequest {
    pub symbols: Vec<String>,
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub metrics: Vec<MetricSpec>,
    pub granularity: Granularity,
}

impl AnalysisRequest {
    /// Daily request with the default metric set.
    pub fn new<S: AsRef<str>>(symbols: &[S], start: NaiveDate, end: NaiveDate) -> Self {
        Self {
            symbols: symbols.iter().map(|s| s.as_ref().to_string()).collect(),
            start,
            end,
            metrics: MetricSpec::defaults(),
            granularity: Granularity::Daily,
        }
    }

    pub fn with_metrics(mut self, metrics: Vec<MetricSpec>) -> Self {
        self.metrics = metrics;
        self
    }

    pub fn with_granularity(mut self, granularity: Granularity) -> Self {
        self.granularity = granularity;
        self
    }
}

/// A resolved instrument as reported back to the caller.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InstrumentInfo {
    pub instrument: Instrument,
    pub ticker: String,
    pub company_name: Option<String>,
    pub source: DataSource,
}

/// Chart-ready answer to one [`AnalysisRequest`].
#[derive(Debug, Clone, Serialize)]
pub struct AnalyticsResult {
    pub request: AnalysisRequest,
    pub instruments: Vec<InstrumentInfo>,
    pub frame: AlignedFrame,
    /// Metric name → one series per instrument, in frame order.
    pub metrics: BTreeMap<String, Vec<AnalyticsSeries>>,
    pub summaries: Vec<InstrumentSummary>,
    pub warnings: Vec<Warning>,
    pub dataset_hash: String,
    /// True when any instrument came from the synthetic provider.
    pub synthetic: bool,
}

impl AnalyticsResult {
    pub fn series(&self, metric: &str, instrument: &Instrument) -> Option<&AnalyticsSeries> {
        self.metrics
            .get(metric)?
            .iter()
            .find(|s| &s.instrument == instrument)
    }
}

/// Preset lookback windows offered by the dashboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lookback {
    OneMonth,
    ThreeMonths,
    SixMonths,
    OneYear,
    TwoYears,
    FiveYears,
}

impl Lookback {
    pub fn days(self) -> i64 {
        match self {
            Lookback::OneMonth => 30,
            Lookback::ThreeMonths => 90,
            Lookback::SixMonths => 180,
            Lookback::OneYear => 365,
            Lookback::TwoYears => 730,
            Lookback::FiveYears => 1825,
        }
    }

    /// `(start, end)` covering this lookback and ending on `end`.
    pub fn range_ending(self, end: NaiveDate) -> (NaiveDate, NaiveDate) {
        (end - Duration::days(self.days()), end)
    }
}

impl fmt::Display for Lookback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Lookback::OneMonth => "1m",
            Lookback::ThreeMonths => "3m",
            Lookback::SixMonths => "6m",
            Lookback::OneYear => "1y",
            Lookback::TwoYears => "2y",
            Lookback::FiveYears => "5y",
        };
        f.write_str(label)
    }
}

impl FromStr for Lookback {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "1m" => Ok(Lookback::OneMonth),
            "3m" => Ok(Lookback::ThreeMonths),
            "6m" => Ok(Lookback::SixMonths),
            "1y" => Ok(Lookback::OneYear),
            "2y" => Ok(Lookback::TwoYears),
            "5y" => Ok(Lookback::FiveYears),
            other => Err(format!("unknown period '{other}' (expected 1m, 3m, 6m, 1y, 2y or 5y)")),
        }
    }
}

/// The engine: resolver, fetcher and an injected session cache.
///
/// Cheap to share across threads; concurrent `analyze` calls coalesce their
/// fetches through the cache.
pub struct Engine {
    resolver: SymbolResolver,
    fetcher: DataFetcher,
    cache: Arc<SeriesCache>,
    today: Option<NaiveDate>,
}

impl Engine {
    pub fn new(resolver: SymbolResolver, fetcher: DataFetcher, cache: Arc<SeriesCache>) -> Self {
        Self {
            resolver,
            fetcher,
            cache,
            today: None,
        }
    }

    /// Default resolver and a fresh unbounded cache over `provider`.
    pub fn with_provider(provider: Arc<dyn DataProvider>) -> Self {
        Self::new(
            SymbolResolver::default(),
            DataFetcher::new(provider),
            Arc::new(SeriesCache::new()),
        )
    }

    /// Build from configuration. Without a configured directory file the
    /// built-in listing is used for company names.
    pub fn from_config(config: &EngineConfig, provider: Arc<dyn DataProvider>) -> Result<Self, ConfigError> {
        let directory = match &config.symbol_directory {
            Some(path) => SymbolDirectory::from_csv_path(path)?,
            None => SymbolDirectory::fallback(),
        };
        info!(listings = directory.len(), "symbol directory loaded");

        let resolver = SymbolResolver::new(config.default_exchange)
            .with_directory(Arc::new(directory), config.strict_symbols);
        let cache = Arc::new(SeriesCache::with_max_entries(config.cache.max_entries));
        Ok(Self::new(resolver, DataFetcher::new(provider), cache))
    }

    /// Share an existing cache (e.g. one session cache across engines).
    pub fn with_cache(mut self, cache: Arc<SeriesCache>) -> Self {
        self.cache = cache;
        self
    }

    pub fn with_resolver(mut self, resolver: SymbolResolver) -> Self {
        self.resolver = resolver;
        self
    }

    /// Pin "today" for request validation. Defaults to the current exchange-local date.
    pub fn with_today(mut self, today: NaiveDate) -> Self {
        self.today = Some(today);
        self
    }

    pub fn cache(&self) -> &Arc<SeriesCache> {
        &self.cache
    }

    pub fn resolver(&self) -> &SymbolResolver {
        &self.resolver
    }

    fn today(&self) -> NaiveDate {
        self.today
            .unwrap_or_else(|| Utc::now().with_timezone(&Exchange::Nse.utc_offset()).date_naive())
    }

    pub fn analyze_symbols<S: AsRef<str>>(
        &self,
        symbols: &[S],
        start: NaiveDate,
        end: NaiveDate,
        metrics: &[MetricSpec],
    ) -> Result<AnalyticsResult, QueryError> {
        let request = AnalysisRequest::new(symbols, start, end).with_metrics(metrics.to_vec());
        self.analyze(&request)
    }

    pub fn analyze(&self, request: &AnalysisRequest) -> Result<AnalyticsResult, QueryError> {
        if request.symbols.is_empty() {
            return Err(InsufficientDataError::NoInstruments.into());
        }
        self.validate(request)?;
        info!(
            symbols = ?request.symbols,
            start = %request.start,
            end = %request.end,
            granularity = %request.granularity,
            "analyze"
        );

        let mut warnings = Vec::new();
        let instruments = self.resolve_all(&request.symbols, &mut warnings)?;

        let fetched = instruments
            .par_iter()
            .map(|instrument| {
                let key = CacheKey::new(instrument.clone(), request.start, request.end, request.granularity);
                self.cache
                    .get_or_fetch(&key, &self.fetcher)
                    .map_err(|source| QueryError::Fetch {
                        instrument: instrument.clone(),
                        source,
                    })
            })
            .collect::<Result<Vec<_>, _>>()?;

        for f in &fetched {
            warnings.extend(f.warnings.iter().cloned());
        }

        let frame = align_series(&fetched.iter().map(|f| &f.series).collect::<Vec<_>>());
        warnings.extend(partial_history(&frame));

        let mut metrics = BTreeMap::new();
        for spec in &request.metrics {
            if metrics.contains_key(&spec.name()) {
                continue;
            }
            if frame.len() <= spec.lookback() {
                warn!(metric = %spec, rows = frame.len(), lookback = spec.lookback(), "frame shorter than lookback");
                warnings.push(Warning::ShortHistory {
                    metric: spec.name(),
                    rows: frame.len(),
                    lookback: spec.lookback(),
                });
            }
            metrics.insert(spec.name(), spec.compute(&frame)?);
        }

        let infos = instruments
            .iter()
            .zip(&fetched)
            .map(|(instrument, f)| InstrumentInfo {
                instrument: instrument.clone(),
                ticker: instrument.provider_ticker(),
                company_name: self.resolver.company_name(instrument),
                source: f.source,
            })
            .collect::<Vec<_>>();
        let synthetic = infos.iter().any(|i| i.source == DataSource::Synthetic);

        info!(
            instruments = instruments.len(),
            rows = frame.len(),
            warnings = warnings.len(),
            "analysis complete"
        );

        Ok(AnalyticsResult {
            request: request.clone(),
            instruments: infos,
            summaries: summarize(&frame),
            dataset_hash: dataset_hash(&frame),
            frame,
            metrics,
            warnings,
            synthetic,
        })
    }

    fn validate(&self, request: &AnalysisRequest) -> Result<(), QueryError> {
        let today = self.today();
        if request.start > request.end {
            return Err(QueryError::InvalidRequest(format!(
                "start {} is after end {}",
                request.start, request.end
            )));
        }
        if request.end > today {
            return Err(QueryError::InvalidRequest(format!(
                "end {} is in the future (today is {today})",
                request.end
            )));
        }
        if request.metrics.is_empty() {
            return Err(QueryError::InvalidRequest("no metrics requested".into()));
        }
        for spec in &request.metrics {
            spec.validate().map_err(QueryError::InvalidRequest)?;
        }
        Ok(())
    }

    /// Resolve in request order; repeats of an instrument collapse into one.
    fn resolve_all(&self, symbols: &[String], warnings: &mut Vec<Warning>) -> Result<Vec<Instrument>, QueryError> {
        let mut instruments: Vec<Instrument> = Vec::with_capacity(symbols.len());
        for input in symbols {
            let instrument = self.resolver.resolve(input).map_err(|source| QueryError::Resolution {
                input: input.clone(),
                source,
            })?;
            if instruments.contains(&instrument) {
                warn!(%input, %instrument, "duplicate symbol in request");
                warnings.push(Warning::DuplicateSymbol {
                    input: input.clone(),
                    instrument: instrument.to_string(),
                });
                continue;
            }
            instruments.push(instrument);
        }
        Ok(instruments)
    }
}

/// Warn about instruments whose history starts later or ends earlier than the
/// frame, or that have no observation in it at all.
fn partial_history(frame: &AlignedFrame) -> Vec<Warning> {
    let (Some(&frame_first), Some(&frame_last)) = (frame.dates.first(), frame.dates.last()) else {
        return Vec::new();
    };
    (0..frame.instrument_count())
        .filter_map(|idx| {
            let Some((first, last)) = frame.present_span(idx) else {
                warn!(instrument = %frame.instruments[idx], "no observations in frame");
                return Some(Warning::NoObservations {
                    instrument: frame.instruments[idx].to_string(),
                    frame_first,
                    frame_last,
                });
            };
            (first != frame_first || last != frame_last).then(|| Warning::PartialHistory {
                instrument: frame.instruments[idx].to_string(),
                first,
                last,
                frame_first,
                frame_last,
            })
        })
        .collect()
}
