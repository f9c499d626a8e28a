//! Relative Strength Index (RSI).
//!
//! Uses Wilder smoothing of average gains and average losses over
//! close-to-close changes. RSI = 100 - 100 / (1 + avg_gain / avg_loss).
//! Lookback: period.
//!
//! A change is only defined between two present rows. When a gap breaks the
//! run of changes, the cell is absent and the average is seeded again from
//! the next `period` consecutive changes.
//! Edge cases: avg_loss == 0 → RSI = 100.

use super::Indicator;
use crate::domain::Cell;

#[derive(Debug, Clone)]
pub struct Rsi {
    period: usize,
    name: String,
}

impl Rsi {
    pub fn new(period: usize) -> Self {
        assert!(period >= 1, "RSI period must be >= 1");
        Self {
            period,
            name: format!("rsi_{period}"),
        }
    }
}

impl Indicator for Rsi {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        self.period
    }

    fn compute(&self, closes: &[Option<f64>]) -> Vec<Cell<f64>> {
        let n = closes.len();
        let mut result = vec![Cell::Pending; n];
        let alpha = 1.0 / self.period as f64;

        // Changes collected since the last gap, until the seed is complete.
        let mut seed: Vec<f64> = Vec::with_capacity(self.period);
        let mut averages: Option<(f64, f64)> = None;

        for i in 0..n {
            let change = match (i.checked_sub(1).and_then(|p| closes[p]), closes[i]) {
                (Some(prev), Some(curr)) => curr - prev,
                _ => {
                    seed.clear();
                    averages = None;
                    result[i] = Cell::Absent;
                    continue;
                }
            };
            let gain = change.max(0.0);
            let loss = (-change).max(0.0);

            let (avg_gain, avg_loss) = match averages {
                Some((g, l)) => (alpha * gain + (1.0 - alpha) * g, alpha * loss + (1.0 - alpha) * l),
                None => {
                    seed.push(change);
                    if seed.len() < self.period {
                        result[i] = Cell::Absent;
                        continue;
                    }
                    let g = seed.iter().map(|c| c.max(0.0)).sum::<f64>() / self.period as f64;
                    let l = seed.iter().map(|c| (-c).max(0.0)).sum::<f64>() / self.period as f64;
                    seed.clear();
                    (g, l)
                }
            };

            averages = Some((avg_gain, avg_loss));
            result[i] = Cell::Present(compute_rsi(avg_gain, avg_loss));
        }

        result
    }
}

fn compute_rsi(avg_gain: f64, avg_loss: f64) -> f64 {
    if avg_loss == 0.0 {
        100.0
    } else {
        100.0 - 100.0 / (1.0 + avg_gain / avg_loss)
    }
}
