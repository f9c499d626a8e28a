//! Bar and RawSeries, the validated market data units.

use super::Instrument;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Sampling period of a series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Granularity {
    #[default]
    Daily,
    Weekly,
}

impl Granularity {
    /// Provider interval parameter (`1d`, `1wk`).
    pub fn interval(self) -> &'static str {
        match self {
            Granularity::Daily => "1d",
            Granularity::Weekly => "1wk",
        }
    }
}

impl fmt::Display for Granularity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Granularity::Daily => f.write_str("daily"),
            Granularity::Weekly => f.write_str("weekly"),
        }
    }
}

impl FromStr for Granularity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "daily" | "1d" | "d" => Ok(Granularity::Daily),
            "weekly" | "1wk" | "w" => Ok(Granularity::Weekly),
            other => Err(format!("unknown granularity '{other}' (expected daily or weekly)")),
        }
    }
}

/// OHLCV bar for one instrument on one trading date.
///
/// Bars only exist after the fetcher's row validation, so every price is
/// finite and positive and the OHLC values are mutually consistent.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: u64,
}

impl Bar {
    /// OHLC sanity check: positive finite prices, high >= low, open/close inside the range.
    pub fn is_sane(&self) -> bool {
        let prices = [self.open, self.high, self.low, self.close];
        if prices.iter().any(|p| !p.is_finite() || *p <= 0.0) {
            return false;
        }
        self.high >= self.low
            && self.open >= self.low
            && self.open <= self.high
            && self.close >= self.low
            && self.close <= self.high
    }
}

/// Validated series for one instrument: ascending dates, no duplicates.
///
/// `start`/`end` are the bounds that were *requested*, which may be wider than
/// the first and last bar (holidays, late listing).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RawSeries {
    pub instrument: Instrument,
    pub granularity: Granularity,
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub bars: Vec<Bar>,
}

impl RawSeries {
    pub fn first_date(&self) -> Option<NaiveDate> {
        self.bars.first().map(|b| b.date)
    }

    pub fn last_date(&self) -> Option<NaiveDate> {
        self.bars.last().map(|b| b.date)
    }

    /// Whether this series' requested range contains `[start, end]`.
    pub fn covers(&self, start: NaiveDate, end: NaiveDate) -> bool {
        self.start <= start && end <= self.end
    }

    /// Copy of this series narrowed to `[start, end]`.
    pub fn trimmed(&self, start: NaiveDate, end: NaiveDate) -> RawSeries {
        RawSeries {
            instrument: self.instrument.clone(),
            granularity: self.granularity,
            start,
            end,
            bars: self
                .bars
                .iter()
                .filter(|b| b.date >= start && b.date <= end)
                .copied()
                .collect(),
        }
    }
}

impl AsRef<RawSeries> for RawSeries {
    fn as_ref(&self) -> &RawSeries {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Exchange;

    fn sample_bar(day: u32) -> Bar {
        Bar {
            date: NaiveDate::from_ymd_opt(2024, 1, day).unwrap(),
            open: 100.0,
            high: 105.0,
            low: 98.0,
            close: 103.0,
            volume: 50_000,
        }
    }

    #[test]
    fn bar_is_sane() {
        assert!(sample_bar(2).is_sane());
    }

    #[test]
    fn bar_inverted_range_not_sane() {
        let mut bar = sample_bar(2);
        bar.high = 90.0;
        assert!(!bar.is_sane());
    }

    #[test]
    fn bar_negative_or_nan_not_sane() {
        let mut bar = sample_bar(2);
        bar.low = -1.0;
        assert!(!bar.is_sane());
        let mut bar = sample_bar(2);
        bar.close = f64::NAN;
        assert!(!bar.is_sane());
    }

    #[test]
    fn trimmed_narrows_bars_and_bounds() {
        let series = RawSeries {
            instrument: Instrument::new("TCS".into(), Exchange::Nse),
            granularity: Granularity::Daily,
            start: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            end: NaiveDate::from_ymd_opt(2024, 1, 31).unwrap(),
            bars: (2..=6).map(sample_bar).collect(),
        };
        let start = NaiveDate::from_ymd_opt(2024, 1, 3).unwrap();
        let end = NaiveDate::from_ymd_opt(2024, 1, 5).unwrap();
        assert!(series.covers(start, end));

        let narrow = series.trimmed(start, end);
        assert_eq!(narrow.bars.len(), 3);
        assert_eq!(narrow.start, start);
        assert_eq!(narrow.end, end);
        assert!(!narrow.covers(series.start, series.end));
    }

    #[test]
    fn granularity_parse() {
        assert_eq!("weekly".parse::<Granularity>().unwrap(), Granularity::Weekly);
        assert_eq!("1d".parse::<Granularity>().unwrap(), Granularity::Daily);
        assert!("hourly".parse::<Granularity>().is_err());
    }
}
