//! Multi-instrument time alignment.
//!
//! Given series for multiple instruments, align them to a common timeline:
//! the union of every trading date present in any input. Dates an instrument
//! did not trade get an explicit `Cell::Absent` (no forward-fill, no zeros).

use crate::domain::{Bar, Cell, Instrument, RawSeries};
use chrono::NaiveDate;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

/// Observations for several instruments on a common date axis.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AlignedFrame {
    /// The common date axis (sorted ascending).
    pub dates: Vec<NaiveDate>,
    /// Instruments in request order.
    pub instruments: Vec<Instrument>,
    /// One column per instrument, each with exactly `dates.len()` cells.
    pub columns: Vec<Vec<Cell<Bar>>>,
}

impl AlignedFrame {
    pub fn len(&self) -> usize {
        self.dates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }

    pub fn instrument_count(&self) -> usize {
        self.instruments.len()
    }

    pub fn column_for(&self, instrument: &Instrument) -> Option<&[Cell<Bar>]> {
        self.instruments
            .iter()
            .position(|i| i == instrument)
            .map(|idx| self.columns[idx].as_slice())
    }

    /// Close prices of column `idx`, `None` on gaps.
    pub fn closes(&self, idx: usize) -> Vec<Option<f64>> {
        self.columns[idx]
            .iter()
            .map(|cell| cell.as_present().map(|bar| bar.close))
            .collect()
    }

    /// First and last dates on which column `idx` has an observation.
    pub fn present_span(&self, idx: usize) -> Option<(NaiveDate, NaiveDate)> {
        let column = &self.columns[idx];
        let first = column.iter().position(Cell::is_present)?;
        let last = column.iter().rposition(Cell::is_present)?;
        Some((self.dates[first], self.dates[last]))
    }

    /// Rebuild per-instrument series from the present cells.
    ///
    /// Requested bounds are the frame's own first and last date.
    pub fn to_series(&self) -> Vec<RawSeries> {
        let (start, end) = match (self.dates.first(), self.dates.last()) {
            (Some(s), Some(e)) => (*s, *e),
            _ => (NaiveDate::MIN, NaiveDate::MIN),
        };
        self.instruments
            .iter()
            .zip(&self.columns)
            .map(|(instrument, column)| RawSeries {
                instrument: instrument.clone(),
                granularity: Default::default(),
                start,
                end,
                bars: column.iter().filter_map(|c| c.as_present().copied()).collect(),
            })
            .collect()
    }
}

/// Align series to the union of their dates.
///
/// Instruments keep input order. If a series carries two bars for one date,
/// the later bar wins.
pub fn align_series<S: AsRef<RawSeries>>(series: &[S]) -> AlignedFrame {
    let all_dates: BTreeSet<NaiveDate> = series
        .iter()
        .flat_map(|s| s.as_ref().bars.iter().map(|b| b.date))
        .collect();
    let dates: Vec<NaiveDate> = all_dates.into_iter().collect();

    let mut instruments = Vec::with_capacity(series.len());
    let mut columns = Vec::with_capacity(series.len());

    for s in series {
        let s = s.as_ref();
        let by_date: BTreeMap<NaiveDate, Bar> = s.bars.iter().map(|b| (b.date, *b)).collect();

        let column: Vec<Cell<Bar>> = dates
            .iter()
            .map(|date| Cell::from(by_date.get(date).copied()))
            .collect();

        instruments.push(s.instrument.clone());
        columns.push(column);
    }

    AlignedFrame {
        dates,
        instruments,
        columns,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Granularity;
    use crate::symbols::SymbolResolver;

    fn bar(date: &str, close: f64) -> Bar {
        Bar {
            date: NaiveDate::parse_from_str(date, "%Y-%m-%d").unwrap(),
            open: close - 1.0,
            high: close + 1.0,
            low: close - 2.0,
            close,
            volume: 1000,
        }
    }

    fn series(symbol: &str, bars: Vec<Bar>) -> RawSeries {
        RawSeries {
            instrument: SymbolResolver::default().resolve(symbol).unwrap(),
            granularity: Granularity::Daily,
            start: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            end: NaiveDate::from_ymd_opt(2024, 1, 31).unwrap(),
            bars,
        }
    }

    #[test]
    fn align_marks_missing_as_absent() {
        let input = vec![
            series(
                "TCS",
                vec![
                    bar("2024-01-02", 100.0),
                    bar("2024-01-03", 101.0),
                    bar("2024-01-04", 102.0),
                ],
            ),
            series(
                "INFY",
                vec![bar("2024-01-02", 200.0), bar("2024-01-04", 202.0)],
            ),
        ];

        let frame = align_series(&input);

        assert_eq!(frame.len(), 3);
        assert_eq!(frame.columns[0].len(), 3);
        assert_eq!(frame.columns[1].len(), 3);
        assert_eq!(frame.closes(0)[1], Some(101.0));
        assert!(frame.columns[1][1].is_absent());
        assert_eq!(frame.instruments[1].symbol(), "INFY");
    }

    #[test]
    fn late_listing_keeps_full_union() {
        let input = vec![
            series("TCS", vec![bar("2024-01-02", 100.0), bar("2024-01-03", 101.0)]),
            series("ZOMATO", vec![bar("2024-01-03", 50.0), bar("2024-01-05", 52.0)]),
        ];
        let frame = align_series(&input);
        assert_eq!(frame.len(), 3);
        assert_eq!(
            frame.present_span(1),
            Some((
                NaiveDate::from_ymd_opt(2024, 1, 3).unwrap(),
                NaiveDate::from_ymd_opt(2024, 1, 5).unwrap()
            ))
        );
        assert!(frame.columns[0][2].is_absent());
    }

    #[test]
    fn duplicate_date_later_bar_wins() {
        let input = vec![series(
            "TCS",
            vec![bar("2024-01-02", 100.0), bar("2024-01-02", 105.0)],
        )];
        let frame = align_series(&input);
        assert_eq!(frame.len(), 1);
        assert_eq!(frame.closes(0), vec![Some(105.0)]);
    }

    #[test]
    fn realigning_own_output_is_identity() {
        let input = vec![
            series("TCS", vec![bar("2024-01-02", 100.0), bar("2024-01-04", 102.0)]),
            series("INFY", vec![bar("2024-01-03", 200.0)]),
        ];
        let frame = align_series(&input);
        let again = align_series(&frame.to_series());
        assert_eq!(frame, again);
    }

    #[test]
    fn empty_input_gives_empty_frame() {
        let frame = align_series::<RawSeries>(&[]);
        assert!(frame.is_empty());
        assert_eq!(frame.instrument_count(), 0);
    }
}
