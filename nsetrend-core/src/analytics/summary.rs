//! Per-instrument summary statistics over the aligned frame.

use crate::data::AlignedFrame;
use crate::domain::Instrument;
use chrono::NaiveDate;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InstrumentSummary {
    pub instrument: Instrument,
    /// Rows with an observation.
    pub observations: usize,
    /// Rows of the frame without an observation.
    pub gaps: usize,
    pub first_date: Option<NaiveDate>,
    pub last_date: Option<NaiveDate>,
    pub last_close: Option<f64>,
    pub mean_close: Option<f64>,
    pub highest_high: Option<f64>,
    pub lowest_low: Option<f64>,
    /// `(last_close - first_close) / first_close`.
    pub total_return: Option<f64>,
    pub total_volume: u64,
}

/// One summary per instrument, in frame order.
pub fn summarize(frame: &AlignedFrame) -> Vec<InstrumentSummary> {
    frame
        .instruments
        .iter()
        .zip(&frame.columns)
        .enumerate()
        .map(|(idx, (instrument, column))| {
            let bars: Vec<_> = column.iter().filter_map(|c| c.as_present()).collect();
            let span = frame.present_span(idx);
            let first_close = bars.first().map(|b| b.close);
            let last_close = bars.last().map(|b| b.close);

            InstrumentSummary {
                instrument: instrument.clone(),
                observations: bars.len(),
                gaps: column.len() - bars.len(),
                first_date: span.map(|(first, _)| first),
                last_date: span.map(|(_, last)| last),
                last_close,
                mean_close: (!bars.is_empty())
                    .then(|| bars.iter().map(|b| b.close).sum::<f64>() / bars.len() as f64),
                highest_high: bars.iter().map(|b| b.high).reduce(f64::max),
                lowest_low: bars.iter().map(|b| b.low).reduce(f64::min),
                total_return: first_close
                    .zip(last_close)
                    .map(|(first, last)| (last - first) / first),
                total_volume: bars.iter().map(|b| b.volume).sum(),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analytics::{assert_approx, make_frame, DEFAULT_EPSILON};

    #[test]
    fn summary_counts_gaps_and_returns() {
        let frame = make_frame(vec![
            ("TCS", vec![Some(100.0), Some(110.0), Some(120.0)]),
            ("INFY", vec![None, Some(50.0), Some(45.0)]),
        ]);
        let out = summarize(&frame);

        assert_eq!(out[0].observations, 3);
        assert_eq!(out[0].gaps, 0);
        assert_approx(out[0].mean_close, 110.0, DEFAULT_EPSILON);
        assert_approx(out[0].total_return, 0.2, DEFAULT_EPSILON);
        assert_approx(out[0].highest_high, 121.0, DEFAULT_EPSILON);
        assert_approx(out[0].lowest_low, 99.0, DEFAULT_EPSILON);
        assert_eq!(out[0].total_volume, 3_000);

        assert_eq!(out[1].observations, 2);
        assert_eq!(out[1].gaps, 1);
        assert_eq!(out[1].first_date, Some(frame.dates[1]));
        assert_eq!(out[1].last_close, Some(45.0));
        assert_approx(out[1].total_return, -0.1, DEFAULT_EPSILON);
    }

    #[test]
    fn all_gap_column_has_no_stats() {
        let frame = make_frame(vec![("TCS", vec![Some(1.5)]), ("INFY", vec![None])]);
        let out = summarize(&frame);
        assert_eq!(out[1].observations, 0);
        assert_eq!(out[1].mean_close, None);
        assert_eq!(out[1].total_return, None);
        assert_eq!(out[1].first_date, None);
    }
}
