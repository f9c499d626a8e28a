//! Simple moving average of close prices.
//!
//! Window = the last n *present* closes up to and including row t. Gaps are
//! skipped, not filled: the cell on a gap row is absent, and so is every row
//! before the instrument has n observations.
//! Lookback: period - 1 (first possible value at row period-1).

use super::Indicator;
use crate::domain::Cell;
use std::collections::VecDeque;

#[derive(Debug, Clone)]
pub struct MovingAverage {
    period: usize,
    name: String,
}

impl MovingAverage {
    pub fn new(period: usize) -> Self {
        assert!(period >= 1, "moving average period must be >= 1");
        Self {
            period,
            name: format!("moving_average_{period}"),
        }
    }
}

impl Indicator for MovingAverage {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        self.period.saturating_sub(1)
    }

    fn compute(&self, closes: &[Option<f64>]) -> Vec<Cell<f64>> {
        let mut window: VecDeque<f64> = VecDeque::with_capacity(self.period + 1);

        closes
            .iter()
            .map(|close| {
                let Some(close) = *close else {
                    return Cell::Absent;
                };
                window.push_back(close);
                if window.len() > self.period {
                    window.pop_front();
                }
                if window.len() < self.period {
                    Cell::Absent
                } else {
                    Cell::Present(window.iter().sum::<f64>() / self.period as f64)
                }
            })
            .collect()
    }
}
