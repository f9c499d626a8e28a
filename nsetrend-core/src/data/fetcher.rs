//! Data fetcher: the provider boundary.
//!
//! Pipeline per row: placeholder skip → exchange-local date → range trim →
//! field validation → monotonic check. Untyped provider rows never travel
//! past this module.

use super::provider::{DataProvider, DataSource, ProviderRow};
use crate::domain::{Bar, Granularity, Instrument, RawSeries};
use crate::error::FetchError;
use crate::warning::Warning;
use chrono::{DateTime, NaiveDate};
use std::sync::Arc;
use tracing::{debug, warn};

/// A validated series plus the warnings produced while validating it.
#[derive(Debug, Clone)]
pub struct FetchedSeries {
    pub series: RawSeries,
    pub warnings: Vec<Warning>,
    pub source: DataSource,
}

impl FetchedSeries {
    /// Narrow to `[start, end]`, keeping only warnings that fall inside it.
    pub fn trimmed(&self, start: NaiveDate, end: NaiveDate) -> FetchedSeries {
        let in_range = |date: &NaiveDate| *date >= start && *date <= end;
        let warnings = self
            .warnings
            .iter()
            .filter(|w| match w {
                Warning::MalformedRow { date, .. } => date.as_ref().map_or(true, in_range),
                Warning::NonMonotonicRow { date, .. } | Warning::DuplicateDate { date, .. } => {
                    in_range(date)
                }
                _ => true,
            })
            .cloned()
            .collect();
        FetchedSeries {
            series: self.series.trimmed(start, end),
            warnings,
            source: self.source,
        }
    }
}

#[derive(Clone)]
pub struct DataFetcher {
    provider: Arc<dyn DataProvider>,
}

impl DataFetcher {
    pub fn new(provider: Arc<dyn DataProvider>) -> Self {
        Self { provider }
    }

    pub fn provider_name(&self) -> &str {
        self.provider.name()
    }

    pub fn source(&self) -> DataSource {
        self.provider.source()
    }

    pub fn fetch(
        &self,
        instrument: &Instrument,
        start: NaiveDate,
        end: NaiveDate,
        granularity: Granularity,
    ) -> Result<FetchedSeries, FetchError> {
        if !self.provider.is_available() {
            return Err(FetchError::CircuitBreakerTripped);
        }

        let rows = self
            .provider
            .fetch_rows(instrument, start, end, granularity)?;
        debug!(
            provider = self.provider.name(),
            %instrument,
            rows = rows.len(),
            "provider returned rows"
        );

        let fetched = validate_rows(instrument, start, end, granularity, &rows)?;
        for w in &fetched.warnings {
            warn!(%instrument, "{w}");
        }

        Ok(FetchedSeries {
            series: fetched.series,
            warnings: fetched.warnings,
            source: self.provider.source(),
        })
    }
}

struct Validated {
    series: RawSeries,
    warnings: Vec<Warning>,
}

/// Convert provider rows into a sorted, duplicate-free series trimmed to `[start, end]`.
fn validate_rows(
    instrument: &Instrument,
    start: NaiveDate,
    end: NaiveDate,
    granularity: Granularity,
    rows: &[ProviderRow],
) -> Result<Validated, FetchError> {
    let ticker = instrument.provider_ticker();
    let offset = instrument.exchange().utc_offset();
    let mut bars: Vec<Bar> = Vec::with_capacity(rows.len());
    let mut warnings = Vec::new();
    let mut in_range = 0usize;
    let mut dropped = 0usize;

    for row in rows {
        if row.is_placeholder() {
            continue;
        }

        let Some(date) = DateTime::from_timestamp(row.timestamp, 0)
            .map(|utc| utc.with_timezone(&offset).date_naive())
        else {
            in_range += 1;
            dropped += 1;
            warnings.push(Warning::MalformedRow {
                ticker: ticker.clone(),
                date: None,
                reason: format!("invalid timestamp {}", row.timestamp),
            });
            continue;
        };

        if date < start || date > end {
            continue;
        }
        in_range += 1;

        let bar = match row_to_bar(date, row) {
            Ok(bar) => bar,
            Err(reason) => {
                dropped += 1;
                warnings.push(Warning::MalformedRow {
                    ticker: ticker.clone(),
                    date: Some(date),
                    reason,
                });
                continue;
            }
        };

        match bars.last().map(|b| b.date) {
            Some(previous) if bar.date < previous => {
                dropped += 1;
                warnings.push(Warning::NonMonotonicRow {
                    ticker: ticker.clone(),
                    date: bar.date,
                    previous,
                });
            }
            Some(previous) if bar.date == previous => {
                warnings.push(Warning::DuplicateDate {
                    ticker: ticker.clone(),
                    date: bar.date,
                });
                if let Some(last) = bars.last_mut() {
                    *last = bar;
                }
            }
            _ => bars.push(bar),
        }
    }

    if in_range == 0 {
        return Err(FetchError::NoDataInRange { ticker, start, end });
    }
    if bars.is_empty() {
        return Err(FetchError::AllRowsMalformed { ticker, dropped });
    }

    Ok(Validated {
        series: RawSeries {
            instrument: instrument.clone(),
            granularity,
            start,
            end,
            bars,
        },
        warnings,
    })
}

fn row_to_bar(date: NaiveDate, row: &ProviderRow) -> Result<Bar, String> {
    let field = |value: Option<f64>, name: &str| value.ok_or_else(|| format!("missing {name}"));
    let bar = Bar {
        date,
        open: field(row.open, "open")?,
        high: field(row.high, "high")?,
        low: field(row.low, "low")?,
        close: field(row.close, "close")?,
        volume: row.volume.ok_or_else(|| "missing volume".to_string())?,
    };
    if !bar.is_sane() {
        return Err(format!(
            "inconsistent prices (o={} h={} l={} c={})",
            bar.open, bar.high, bar.low, bar.close
        ));
    }
    Ok(bar)
}
