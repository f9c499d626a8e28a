//! Shared test doubles: an in-memory provider that counts calls.

#![allow(dead_code)]

use chrono::NaiveDate;
use nsetrend_core::data::{DataProvider, DataSource, ProviderRow};
use nsetrend_core::{FetchError, Granularity, Instrument};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

pub fn d(y: i32, m: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, day).unwrap()
}

/// Epoch seconds of 09:15 IST (03:45 UTC) on `date`.
pub fn session_ts(date: NaiveDate) -> i64 {
    date.and_hms_opt(3, 45, 0).unwrap().and_utc().timestamp()
}

pub fn row(date: NaiveDate, close: f64) -> ProviderRow {
    ProviderRow {
        timestamp: session_ts(date),
        open: Some(close),
        high: Some(close + 2.0),
        low: Some(close - 2.0),
        close: Some(close),
        volume: Some(10_000),
    }
}

/// Provider serving fixed rows per provider ticker, with call counting,
/// optional latency and scripted failures.
#[derive(Default)]
pub struct FixtureProvider {
    rows: HashMap<String, Vec<ProviderRow>>,
    failures: Mutex<HashMap<String, FetchError>>,
    delay: Option<Duration>,
    calls: AtomicUsize,
}

impl FixtureProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_rows(mut self, ticker: &str, rows: Vec<ProviderRow>) -> Self {
        self.rows.insert(ticker.to_string(), rows);
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Fail every fetch of `ticker` with `error` until cleared.
    pub fn fail(&self, ticker: &str, error: FetchError) {
        self.failures
            .lock()
            .unwrap()
            .insert(ticker.to_string(), error);
    }

    pub fn clear_failures(&self) {
        self.failures.lock().unwrap().clear();
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl DataProvider for FixtureProvider {
    fn name(&self) -> &str {
        "fixture"
    }

    fn source(&self) -> DataSource {
        DataSource::Fixture
    }

    fn fetch_rows(
        &self,
        instrument: &Instrument,
        _start: NaiveDate,
        _end: NaiveDate,
        _granularity: Granularity,
    ) -> Result<Vec<ProviderRow>, FetchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            std::thread::sleep(delay);
        }
        let ticker = instrument.provider_ticker();
        if let Some(err) = self.failures.lock().unwrap().get(&ticker) {
            return Err(err.clone());
        }
        self.rows
            .get(&ticker)
            .cloned()
            .ok_or(FetchError::SymbolNotFound { ticker })
    }
}

/// NSE trading days 2023-01-02 .. 2023-01-10 (weekdays only).
pub fn trading_days_jan_2023() -> Vec<NaiveDate> {
    vec![
        d(2023, 1, 2),
        d(2023, 1, 3),
        d(2023, 1, 4),
        d(2023, 1, 5),
        d(2023, 1, 6),
        d(2023, 1, 9),
        d(2023, 1, 10),
    ]
}
