//! Synthetic provider: deterministic random-walk bars for offline use.
//!
//! Results produced from synthetic data are tagged as such in the
//! `AnalyticsResult`. Each instrument gets its own seed derived from its
//! ticker, so the same request always produces the same series.

use super::provider::{DataProvider, DataSource, ProviderRow};
use crate::domain::{Granularity, Instrument};
use crate::error::FetchError;
use chrono::{Datelike, Duration, NaiveDate, NaiveTime, TimeZone, Weekday};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// NSE opens at 09:15 IST; synthetic rows are stamped at the open.
const SESSION_OPEN: (u32, u32) = (9, 15);

/// Epoch for the random walk, so a series is stable regardless of the requested start.
fn walk_epoch() -> NaiveDate {
    NaiveDate::from_ymd_opt(2000, 1, 3).unwrap_or(NaiveDate::MIN)
}

#[derive(Debug, Clone)]
pub struct SyntheticProvider {
    seed: u64,
}

impl SyntheticProvider {
    pub fn new(seed: u64) -> Self {
        Self { seed }
    }

    fn ticker_seed(&self, ticker: &str) -> u64 {
        let digest = blake3::hash(ticker.as_bytes());
        let mut bytes = [0u8; 8];
        bytes.copy_from_slice(&digest.as_bytes()[..8]);
        self.seed ^ u64::from_le_bytes(bytes)
    }
}

impl Default for SyntheticProvider {
    fn default() -> Self {
        Self::new(42)
    }
}

impl DataProvider for SyntheticProvider {
    fn name(&self) -> &str {
        "synthetic"
    }

    fn source(&self) -> DataSource {
        DataSource::Synthetic
    }

    fn fetch_rows(
        &self,
        instrument: &Instrument,
        start: NaiveDate,
        end: NaiveDate,
        granularity: Granularity,
    ) -> Result<Vec<ProviderRow>, FetchError> {
        let ticker = instrument.provider_ticker();
        let mut rng = StdRng::seed_from_u64(self.ticker_seed(&ticker));
        let offset = instrument.exchange().utc_offset();
        let open_time = NaiveTime::from_hms_opt(SESSION_OPEN.0, SESSION_OPEN.1, 0)
            .ok_or_else(|| FetchError::Provider("invalid session time".into()))?;

        let mut price: f64 = rng.gen_range(100.0..3000.0);
        let mut rows = Vec::new();
        let mut date = walk_epoch();

        while date <= end {
            let is_session = match granularity {
                Granularity::Daily => !matches!(date.weekday(), Weekday::Sat | Weekday::Sun),
                Granularity::Weekly => date.weekday() == Weekday::Mon,
            };
            if is_session {
                let open = price;
                let drift: f64 = rng.gen_range(-0.03..0.03);
                let close = (open * (1.0 + drift)).max(1.0);
                let high = open.max(close) * (1.0 + rng.gen_range(0.0..0.01));
                let low = open.min(close) * (1.0 - rng.gen_range(0.0..0.01));
                let volume: u64 = rng.gen_range(10_000..5_000_000);
                price = close;

                if date >= start {
                    let timestamp = offset
                        .from_local_datetime(&date.and_time(open_time))
                        .single()
                        .map(|dt| dt.timestamp())
                        .unwrap_or_else(|| date.and_time(open_time).and_utc().timestamp());
                    rows.push(ProviderRow {
                        timestamp,
                        open: Some(open),
                        high: Some(high),
                        low: Some(low),
                        close: Some(close),
                        volume: Some(volume),
                    });
                }
            }
            date += Duration::days(1);
        }

        Ok(rows)
    }
}
