//! Yahoo Finance data provider.
//!
//! Fetches OHLCV bars for `.NS` / `.BO` tickers from Yahoo's v8 chart API.
//! Handles rate limiting, retries with exponential backoff, and the circuit
//! breaker. Rows are returned unvalidated; the fetcher owns validation.
//!
//! Yahoo Finance has no official API and is subject to unannounced format changes.

use super::circuit_breaker::CircuitBreaker;
use super::provider::{DataProvider, DataSource, ProviderRow};
use crate::config::ProviderConfig;
use crate::domain::{Granularity, Instrument};
use crate::error::FetchError;
use chrono::{NaiveDate, NaiveTime, TimeZone};
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Yahoo Finance v8 chart API response.
#[derive(Debug, Deserialize)]
struct ChartResponse {
    chart: ChartResult,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    result: Option<Vec<ChartData>>,
    error: Option<ChartError>,
}

#[derive(Debug, Deserialize)]
struct ChartError {
    code: String,
    description: String,
}

#[derive(Debug, Deserialize)]
struct ChartData {
    timestamp: Option<Vec<i64>>,
    indicators: Indicators,
}

#[derive(Debug, Deserialize)]
struct Indicators {
    quote: Vec<QuoteData>,
}

#[derive(Debug, Deserialize)]
struct QuoteData {
    #[serde(default)]
    open: Vec<Option<f64>>,
    #[serde(default)]
    high: Vec<Option<f64>>,
    #[serde(default)]
    low: Vec<Option<f64>>,
    #[serde(default)]
    close: Vec<Option<f64>>,
    #[serde(default)]
    volume: Vec<Option<u64>>,
}

pub struct YahooProvider {
    client: reqwest::blocking::Client,
    circuit_breaker: Arc<CircuitBreaker>,
    base_url: String,
    max_retries: u32,
    base_delay: Duration,
}

impl YahooProvider {
    pub fn new(
        config: &ProviderConfig,
        circuit_breaker: Arc<CircuitBreaker>,
    ) -> Result<Self, FetchError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(config.timeout())
            .user_agent(config.user_agent.as_str())
            .build()
            .map_err(|e| FetchError::Provider(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            circuit_breaker,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            max_retries: config.max_retries,
            base_delay: config.base_delay(),
        })
    }

    /// Build the chart API URL. Bounds are whole exchange-local days.
    fn chart_url(
        &self,
        instrument: &Instrument,
        start: NaiveDate,
        end: NaiveDate,
        granularity: Granularity,
    ) -> String {
        let offset = instrument.exchange().utc_offset();
        let to_ts = |date: NaiveDate, time: NaiveTime| {
            offset
                .from_local_datetime(&date.and_time(time))
                .single()
                .map(|dt| dt.timestamp())
                .unwrap_or_else(|| date.and_time(time).and_utc().timestamp())
        };
        let start_ts = to_ts(start, NaiveTime::MIN);
        let end_ts = to_ts(
            end,
            NaiveTime::from_hms_opt(23, 59, 59).unwrap_or(NaiveTime::MIN),
        );
        format!(
            "{}/v8/finance/chart/{}?period1={start_ts}&period2={end_ts}&interval={}&events=history",
            self.base_url,
            instrument.provider_ticker(),
            granularity.interval(),
        )
    }

    /// Flatten the chart response into provider rows.
    fn parse_response(ticker: &str, resp: ChartResponse) -> Result<Vec<ProviderRow>, FetchError> {
        let result = resp.chart.result.ok_or_else(|| match resp.chart.error {
            Some(err) if err.code == "Not Found" => FetchError::SymbolNotFound {
                ticker: ticker.to_string(),
            },
            Some(err) => {
                FetchError::ResponseFormatChanged(format!("{}: {}", err.code, err.description))
            }
            None => FetchError::ResponseFormatChanged("empty result with no error".into()),
        })?;

        let data = result
            .into_iter()
            .next()
            .ok_or_else(|| FetchError::ResponseFormatChanged("result array is empty".into()))?;

        // A listing with no sessions in range comes back without timestamps.
        let Some(timestamps) = data.timestamp else {
            return Ok(Vec::new());
        };

        let quote = data
            .indicators
            .quote
            .into_iter()
            .next()
            .ok_or_else(|| FetchError::ResponseFormatChanged("no quote data".into()))?;

        let rows = timestamps
            .iter()
            .enumerate()
            .map(|(i, &timestamp)| ProviderRow {
                timestamp,
                open: quote.open.get(i).copied().flatten(),
                high: quote.high.get(i).copied().flatten(),
                low: quote.low.get(i).copied().flatten(),
                close: quote.close.get(i).copied().flatten(),
                volume: quote.volume.get(i).copied().flatten(),
            })
            .collect();

        Ok(rows)
    }

    /// Execute the request with retry and circuit breaker logic.
    fn fetch_with_retry(&self, ticker: &str, url: &str) -> Result<Vec<ProviderRow>, FetchError> {
        if !self.circuit_breaker.is_allowed() {
            return Err(FetchError::CircuitBreakerTripped);
        }

        let mut last_error = None;

        for attempt in 0..=self.max_retries {
            if attempt > 0 {
                let delay = backoff_delay(self.base_delay, attempt);
                debug!(ticker, attempt, delay_ms = delay.as_millis() as u64, "retrying provider request");
                std::thread::sleep(delay);
            }

            if !self.circuit_breaker.is_allowed() {
                return Err(FetchError::CircuitBreakerTripped);
            }

            match self.client.get(url).send() {
                Ok(resp) => {
                    let status = resp.status();

                    if status == reqwest::StatusCode::FORBIDDEN {
                        self.circuit_breaker.trip();
                        return Err(FetchError::CircuitBreakerTripped);
                    }

                    if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
                        self.circuit_breaker.record_failure();
                        let retry_after = resp
                            .headers()
                            .get("retry-after")
                            .and_then(|v| v.to_str().ok())
                            .and_then(|v| v.parse::<u64>().ok())
                            .unwrap_or(60);
                        warn!(ticker, retry_after, "provider rate limited request");
                        last_error = Some(FetchError::RateLimited {
                            retry_after_secs: retry_after,
                        });
                        continue;
                    }

                    if status == reqwest::StatusCode::UNAUTHORIZED {
                        return Err(FetchError::AuthenticationRequired(
                            "Yahoo Finance requires authentication".into(),
                        ));
                    }

                    if status == reqwest::StatusCode::NOT_FOUND {
                        return Err(FetchError::SymbolNotFound {
                            ticker: ticker.to_string(),
                        });
                    }

                    if !status.is_success() {
                        self.circuit_breaker.record_failure();
                        last_error = Some(FetchError::Provider(format!("HTTP {status} for {ticker}")));
                        continue;
                    }

                    let chart: ChartResponse = resp.json().map_err(|e| {
                        FetchError::ResponseFormatChanged(format!(
                            "failed to parse response for {ticker}: {e}"
                        ))
                    })?;

                    let rows = Self::parse_response(ticker, chart)?;
                    self.circuit_breaker.record_success();
                    return Ok(rows);
                }
                Err(e) if e.is_timeout() => {
                    last_error = Some(FetchError::Timeout(e.to_string()));
                }
                Err(e) if e.is_connect() => {
                    last_error = Some(FetchError::NetworkUnreachable(e.to_string()));
                }
                Err(e) => return Err(FetchError::NetworkUnreachable(e.to_string())),
            }
        }

        Err(last_error.unwrap_or_else(|| FetchError::Provider("max retries exceeded".into())))
    }
}

impl DataProvider for YahooProvider {
    fn name(&self) -> &str {
        "yahoo_finance"
    }

    fn source(&self) -> DataSource {
        DataSource::YahooFinance
    }

    fn fetch_rows(
        &self,
        instrument: &Instrument,
        start: NaiveDate,
        end: NaiveDate,
        granularity: Granularity,
    ) -> Result<Vec<ProviderRow>, FetchError> {
        let ticker = instrument.provider_ticker();
        let url = self.chart_url(instrument, start, end, granularity);
        info!(ticker = %ticker, %start, %end, %granularity, "requesting chart from Yahoo");
        self.fetch_with_retry(&ticker, &url)
    }

    fn is_available(&self) -> bool {
        self.circuit_breaker.is_allowed()
    }
}

/// Exponential backoff before retry `attempt` (1-based), saturating on overflow.
fn backoff_delay(base: Duration, attempt: u32) -> Duration {
    let factor = 2u32.checked_pow(attempt.saturating_sub(1)).unwrap_or(u32::MAX);
    base.saturating_mul(factor)
}
