//! Rolling volatility: sample standard deviation of percentage returns.
//!
//! Window = the last n *present* returns up to and including row t (n >= 2,
//! denominator n - 1). Rows without a return of their own are absent, and so
//! is every row before n returns have been observed.
//! Lookback: n (row 0 never has a return).

use super::returns::PctReturn;
use super::Indicator;
use crate::domain::Cell;
use std::collections::VecDeque;

#[derive(Debug, Clone)]
pub struct Volatility {
    period: usize,
    name: String,
}

impl Volatility {
    pub fn new(period: usize) -> Self {
        assert!(period >= 2, "volatility window must be >= 2");
        Self {
            period,
            name: format!("volatility_{period}"),
        }
    }
}

impl Indicator for Volatility {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        self.period
    }

    fn compute(&self, closes: &[Option<f64>]) -> Vec<Cell<f64>> {
        let mut window: VecDeque<f64> = VecDeque::with_capacity(self.period + 1);

        PctReturn::series(closes)
            .into_iter()
            .map(|ret| {
                let Some(ret) = ret else {
                    return Cell::Absent;
                };
                window.push_back(ret);
                if window.len() > self.period {
                    window.pop_front();
                }
                if window.len() < self.period {
                    Cell::Absent
                } else {
                    Cell::Present(sample_std_dev(window.make_contiguous()))
                }
            })
            .collect()
    }
}

fn sample_std_dev(values: &[f64]) -> f64 {
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let var = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (n - 1.0);
    var.sqrt()
}
