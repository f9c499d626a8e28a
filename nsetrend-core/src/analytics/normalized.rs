//! Normalized comparison: every instrument rebased to 100.
//!
//! The base row is the earliest row on which every instrument in the frame
//! has a close. Rows before it are absent for all instruments; after it a
//! cell is present exactly when the instrument traded that day.

use super::{ensure_frame, AnalyticsSeries};
use crate::data::AlignedFrame;
use crate::domain::Cell;
use crate::error::InsufficientDataError;

const METRIC: &str = "normalized_comparison";

/// Index of the earliest row on which every instrument is present.
pub fn first_common_row(frame: &AlignedFrame) -> Option<usize> {
    (0..frame.len()).find(|&row| frame.columns.iter().all(|column| column[row].is_present()))
}

pub fn normalized_comparison(frame: &AlignedFrame) -> Result<Vec<AnalyticsSeries>, InsufficientDataError> {
    ensure_frame(frame, METRIC)?;
    let base_row = first_common_row(frame).ok_or_else(|| InsufficientDataError::NoCommonDate {
        metric: METRIC.to_string(),
    })?;

    Ok(frame
        .instruments
        .iter()
        .enumerate()
        .map(|(idx, instrument)| {
            let closes = frame.closes(idx);
            let base = closes[base_row];
            let values = closes
                .iter()
                .enumerate()
                .map(|(row, close)| match (row >= base_row, close, base) {
                    (true, Some(c), Some(b)) => Cell::Present(100.0 * c / b),
                    _ => Cell::Absent,
                })
                .collect();
            AnalyticsSeries {
                metric: METRIC.to_string(),
                instrument: instrument.clone(),
                values,
            }
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analytics::{assert_approx, make_frame, DEFAULT_EPSILON};

    #[test]
    fn rebases_to_first_common_row() {
        let frame = make_frame(vec![
            ("TCS", vec![Some(200.0), Some(210.0), Some(220.0)]),
            ("INFY", vec![Some(50.0), None, Some(55.0)]),
        ]);
        let out = normalized_comparison(&frame).unwrap();
        assert_approx(out[0].value_at(0), 100.0, DEFAULT_EPSILON);
        assert_approx(out[0].value_at(1), 105.0, DEFAULT_EPSILON);
        assert_approx(out[1].value_at(0), 100.0, DEFAULT_EPSILON);
        assert!(out[1].values[1].is_absent());
        assert_approx(out[1].value_at(2), 110.0, DEFAULT_EPSILON);
    }

    #[test]
    fn late_listing_moves_base_row() {
        let frame = make_frame(vec![
            ("TCS", vec![Some(100.0), Some(120.0), Some(150.0)]),
            ("ZOMATO", vec![None, Some(40.0), Some(44.0)]),
        ]);
        let out = normalized_comparison(&frame).unwrap();
        assert!(out[0].values[0].is_absent());
        assert_approx(out[0].value_at(1), 100.0, DEFAULT_EPSILON);
        assert_approx(out[0].value_at(2), 125.0, DEFAULT_EPSILON);
        assert_approx(out[1].value_at(2), 110.0, DEFAULT_EPSILON);
    }

    #[test]
    fn no_common_row_is_insufficient() {
        let frame = make_frame(vec![
            ("TCS", vec![Some(100.0), None]),
            ("INFY", vec![None, Some(50.0)]),
        ]);
        assert_eq!(
            normalized_comparison(&frame),
            Err(InsufficientDataError::NoCommonDate {
                metric: "normalized_comparison".into()
            })
        );
    }
}
