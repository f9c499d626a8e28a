//! Trend analytics over an aligned frame.
//!
//! Every metric is a pure function of the frame and returns one
//! [`AnalyticsSeries`] per instrument on the frame's date index. A value at
//! row t only ever reads rows <= t. Gaps in the input never turn into zeros:
//! an output cell whose inputs are incomplete is `Absent`.

pub mod moving_average;
pub mod normalized;
pub mod returns;
pub mod rsi;
pub mod summary;
pub mod volatility;

pub use moving_average::MovingAverage;
pub use normalized::normalized_comparison;
pub use returns::PctReturn;
pub use rsi::Rsi;
pub use summary::{summarize, InstrumentSummary};
pub use volatility::Volatility;

use crate::data::AlignedFrame;
use crate::domain::{Cell, Instrument};
use crate::error::InsufficientDataError;
use serde::{Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// Single-instrument metric over a column of closes.
///
/// `closes[t]` is `None` where the frame has a gap. The output has the same
/// length as the input and contains no `Pending` cells.
pub trait Indicator: Send + Sync {
    /// Canonical metric name (e.g. "moving_average_20").
    fn name(&self) -> &str;

    /// Number of rows needed before the first value can be present.
    fn lookback(&self) -> usize;

    fn compute(&self, closes: &[Option<f64>]) -> Vec<Cell<f64>>;
}

/// Derived values for one metric and one instrument, on the frame's date index.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalyticsSeries {
    pub metric: String,
    pub instrument: Instrument,
    pub values: Vec<Cell<f64>>,
}

impl AnalyticsSeries {
    /// Value at row `idx`, `None` when absent or out of range.
    pub fn value_at(&self, idx: usize) -> Option<f64> {
        self.values.get(idx).and_then(Cell::present)
    }
}

/// A requested metric and its parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MetricSpec {
    MovingAverage(usize),
    PctReturn,
    Volatility(usize),
    NormalizedComparison,
    Rsi(usize),
}

impl MetricSpec {
    /// Metrics the dashboard shows when none are requested.
    pub fn defaults() -> Vec<MetricSpec> {
        vec![
            MetricSpec::MovingAverage(20),
            MetricSpec::MovingAverage(50),
            MetricSpec::Rsi(14),
        ]
    }

    pub fn name(&self) -> String {
        match self {
            MetricSpec::MovingAverage(n) => format!("moving_average_{n}"),
            MetricSpec::PctReturn => "pct_return".to_string(),
            MetricSpec::Volatility(n) => format!("volatility_{n}"),
            MetricSpec::NormalizedComparison => "normalized_comparison".to_string(),
            MetricSpec::Rsi(n) => format!("rsi_{n}"),
        }
    }

    /// Check parameters: windows need at least one row, volatility at least two returns.
    pub fn validate(&self) -> Result<(), String> {
        match *self {
            MetricSpec::MovingAverage(0) => Err("moving_average window must be >= 1".into()),
            MetricSpec::Volatility(n) if n < 2 => Err("volatility window must be >= 2".into()),
            MetricSpec::Rsi(0) => Err("rsi period must be >= 1".into()),
            _ => Ok(()),
        }
    }

    /// Single-instrument indicator behind this metric; `None` for the
    /// cross-instrument normalized comparison. Panics on an invalid spec.
    fn indicator(&self) -> Option<Box<dyn Indicator>> {
        match *self {
            MetricSpec::MovingAverage(n) => Some(Box::new(MovingAverage::new(n))),
            MetricSpec::PctReturn => Some(Box::new(PctReturn)),
            MetricSpec::Volatility(n) => Some(Box::new(Volatility::new(n))),
            MetricSpec::Rsi(n) => Some(Box::new(Rsi::new(n))),
            MetricSpec::NormalizedComparison => None,
        }
    }

    /// Rows an instrument needs before this metric can have a value.
    pub fn lookback(&self) -> usize {
        self.indicator().map_or(0, |indicator| indicator.lookback())
    }

    /// Compute this metric for every instrument in `frame`.
    pub fn compute(&self, frame: &AlignedFrame) -> Result<Vec<AnalyticsSeries>, InsufficientDataError> {
        ensure_frame(frame, &self.name())?;
        match self.indicator() {
            Some(indicator) => Ok(per_instrument(frame, indicator.as_ref())),
            None => normalized_comparison(frame),
        }
    }
}

impl fmt::Display for MetricSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name())
    }
}

/// Serialized by canonical name.
impl Serialize for MetricSpec {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.name())
    }
}

impl FromStr for MetricSpec {
    type Err = String;

    /// Accepts `moving_average(20)`, `sma(20)`, `moving_average_20`, `pct_return`,
    /// `volatility(20)`, `normalized_comparison`, `rsi(14)`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim().to_ascii_lowercase();
        let (head, arg) = match s.split_once('(') {
            Some((head, rest)) => {
                let inner = rest
                    .strip_suffix(')')
                    .ok_or_else(|| format!("unbalanced parentheses in metric '{s}'"))?;
                (head.trim().to_string(), Some(inner.trim().to_string()))
            }
            None => match s.rsplit_once('_') {
                Some((head, tail)) if !tail.is_empty() && tail.bytes().all(|b| b.is_ascii_digit()) => {
                    (head.to_string(), Some(tail.to_string()))
                }
                _ => (s.clone(), None),
            },
        };

        let window = |arg: Option<String>| -> Result<usize, String> {
            let arg = arg.ok_or_else(|| format!("metric '{head}' needs a window, e.g. {head}(20)"))?;
            arg.parse::<usize>()
                .map_err(|_| format!("invalid window '{arg}' for metric '{head}'"))
        };
        let no_arg = |arg: Option<String>, spec: MetricSpec| match arg {
            None => Ok(spec),
            Some(_) => Err(format!("metric '{head}' takes no parameter")),
        };

        let spec = match head.as_str() {
            "moving_average" | "sma" | "ma" => MetricSpec::MovingAverage(window(arg)?),
            "volatility" | "vol" => MetricSpec::Volatility(window(arg)?),
            "rsi" => MetricSpec::Rsi(window(arg)?),
            "pct_return" | "return" | "returns" => no_arg(arg, MetricSpec::PctReturn)?,
            "normalized_comparison" | "normalized" => no_arg(arg, MetricSpec::NormalizedComparison)?,
            other => return Err(format!("unknown metric '{other}'")),
        };
        spec.validate()?;
        Ok(spec)
    }
}

/// Zero instruments or zero dates cannot produce a metric.
pub(crate) fn ensure_frame(frame: &AlignedFrame, metric: &str) -> Result<(), InsufficientDataError> {
    if frame.instrument_count() == 0 {
        return Err(InsufficientDataError::NoInstruments);
    }
    if frame.is_empty() {
        return Err(InsufficientDataError::NoDates {
            metric: metric.to_string(),
        });
    }
    Ok(())
}

/// Apply a single-instrument indicator to every column of the frame.
pub fn per_instrument(frame: &AlignedFrame, indicator: &dyn Indicator) -> Vec<AnalyticsSeries> {
    frame
        .instruments
        .iter()
        .enumerate()
        .map(|(idx, instrument)| AnalyticsSeries {
            metric: indicator.name().to_string(),
            instrument: instrument.clone(),
            values: indicator.compute(&frame.closes(idx)),
        })
        .collect()
}

#[cfg(test)]
pub(crate) fn assert_approx(actual: Option<f64>, expected: f64, epsilon: f64) {
    let actual = actual.unwrap_or_else(|| panic!("expected {expected}, got absent"));
    assert!(
        (actual - expected).abs() < epsilon,
        "expected {expected}, got {actual} (diff {})",
        (actual - expected).abs()
    );
}

#[cfg(test)]
pub(crate) const DEFAULT_EPSILON: f64 = 1e-9;

/// Build a frame from close columns; `None` becomes an absent cell.
#[cfg(test)]
pub(crate) fn make_frame(columns: Vec<(&str, Vec<Option<f64>>)>) -> AlignedFrame {
    use crate::domain::Bar;
    use crate::symbols::SymbolResolver;

    let rows = columns.iter().map(|(_, c)| c.len()).max().unwrap_or(0);
    let base = chrono::NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
    let resolver = SymbolResolver::default();
    AlignedFrame {
        dates: (0..rows)
            .map(|i| base + chrono::Duration::days(i as i64))
            .collect(),
        instruments: columns
            .iter()
            .map(|(symbol, _)| resolver.resolve(symbol).unwrap())
            .collect(),
        columns: columns
            .iter()
            .map(|(_, closes)| {
                (0..rows)
                    .map(|i| match closes.get(i).copied().flatten() {
                        Some(close) => Cell::Present(Bar {
                            date: base + chrono::Duration::days(i as i64),
                            open: close,
                            high: close + 1.0,
                            low: close - 1.0,
                            close,
                            volume: 1_000,
                        }),
                        None => Cell::Absent,
                    })
                    .collect()
            })
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_metric_specs() {
        assert_eq!("moving_average(20)".parse::<MetricSpec>(), Ok(MetricSpec::MovingAverage(20)));
        assert_eq!("SMA(50)".parse::<MetricSpec>(), Ok(MetricSpec::MovingAverage(50)));
        assert_eq!("moving_average_20".parse::<MetricSpec>(), Ok(MetricSpec::MovingAverage(20)));
        assert_eq!("pct_return".parse::<MetricSpec>(), Ok(MetricSpec::PctReturn));
        assert_eq!(" volatility(10) ".parse::<MetricSpec>(), Ok(MetricSpec::Volatility(10)));
        assert_eq!("normalized_comparison".parse::<MetricSpec>(), Ok(MetricSpec::NormalizedComparison));
        assert_eq!("rsi(14)".parse::<MetricSpec>(), Ok(MetricSpec::Rsi(14)));
    }

    #[test]
    fn parse_rejects_bad_specs() {
        assert!("moving_average".parse::<MetricSpec>().is_err());
        assert!("moving_average(0)".parse::<MetricSpec>().is_err());
        assert!("volatility(1)".parse::<MetricSpec>().is_err());
        assert!("pct_return(3)".parse::<MetricSpec>().is_err());
        assert!("macd(12)".parse::<MetricSpec>().is_err());
        assert!("sma(20".parse::<MetricSpec>().is_err());
    }

    #[test]
    fn names_round_trip_through_parse() {
        for spec in [
            MetricSpec::MovingAverage(20),
            MetricSpec::PctReturn,
            MetricSpec::Volatility(5),
            MetricSpec::NormalizedComparison,
            MetricSpec::Rsi(14),
        ] {
            assert_eq!(spec.name().parse::<MetricSpec>(), Ok(spec));
        }
    }

    #[test]
    fn lookback_per_metric() {
        assert_eq!(MetricSpec::MovingAverage(20).lookback(), 19);
        assert_eq!(MetricSpec::PctReturn.lookback(), 1);
        assert_eq!(MetricSpec::Volatility(10).lookback(), 10);
        assert_eq!(MetricSpec::Rsi(14).lookback(), 14);
        assert_eq!(MetricSpec::NormalizedComparison.lookback(), 0);
    }

    #[test]
    fn empty_frame_is_insufficient() {
        let frame = make_frame(vec![]);
        assert_eq!(
            MetricSpec::PctReturn.compute(&frame),
            Err(InsufficientDataError::NoInstruments)
        );

        let frame = make_frame(vec![("TCS", vec![])]);
        assert_eq!(
            MetricSpec::MovingAverage(3).compute(&frame),
            Err(InsufficientDataError::NoDates {
                metric: "moving_average_3".into()
            })
        );
    }

    #[test]
    fn one_series_per_instrument_on_frame_index() {
        let frame = make_frame(vec![
            ("TCS", vec![Some(10.0), Some(11.0), Some(12.0)]),
            ("INFY", vec![Some(20.0), None, Some(22.0)]),
        ]);
        for spec in MetricSpec::defaults() {
            let out = spec.compute(&frame).unwrap();
            assert_eq!(out.len(), 2);
            assert!(out.iter().all(|s| s.values.len() == frame.len()));
            assert!(out
                .iter()
                .flat_map(|s| &s.values)
                .all(|c| !matches!(c, Cell::Pending)));
        }
    }
}
