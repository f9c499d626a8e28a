//! Period-over-period percentage return.
//!
//! `r[t] = (c[t] - c[t-1]) / c[t-1]`, present only when both rows t and t-1
//! are present in the frame. Row 0 has no prior row and is absent. A return
//! is never taken across a gap.

use super::Indicator;
use crate::domain::Cell;

#[derive(Debug, Clone, Copy, Default)]
pub struct PctReturn;

impl PctReturn {
    /// Returns as plain options, shared with volatility.
    pub(crate) fn series(closes: &[Option<f64>]) -> Vec<Option<f64>> {
        let mut out = vec![None; closes.len()];
        for i in 1..closes.len() {
            if let (Some(prev), Some(curr)) = (closes[i - 1], closes[i]) {
                out[i] = Some((curr - prev) / prev);
            }
        }
        out
    }
}

impl Indicator for PctReturn {
    fn name(&self) -> &str {
        "pct_return"
    }

    fn lookback(&self) -> usize {
        1
    }

    fn compute(&self, closes: &[Option<f64>]) -> Vec<Cell<f64>> {
        Self::series(closes).into_iter().map(Cell::from).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analytics::{assert_approx, DEFAULT_EPSILON};

    #[test]
    fn simple_returns() {
        let result = PctReturn.compute(&[Some(100.0), Some(110.0), Some(99.0)]);
        assert!(result[0].is_absent());
        assert_approx(result[1].present(), 0.10, DEFAULT_EPSILON);
        assert_approx(result[2].present(), -0.10, DEFAULT_EPSILON);
    }

    #[test]
    fn gap_before_row_makes_it_absent() {
        let result = PctReturn.compute(&[Some(100.0), None, Some(120.0), Some(132.0)]);
        assert!(result[1].is_absent());
        // Prior row is a gap; no return is bridged from row 0.
        assert!(result[2].is_absent());
        assert_approx(result[3].present(), 0.10, DEFAULT_EPSILON);
    }

    #[test]
    fn empty_input() {
        assert!(PctReturn.compute(&[]).is_empty());
    }
}
