//! Look-ahead contamination tests for every metric.
//!
//! Invariant: no metric value at row t may depend on data from row t+1 or later.
//!
//! Method: compute on a truncated frame (rows 0..120) and on the full frame
//! (rows 0..240). Rows 0..120 must be identical between both runs, gaps
//! included. Any difference means the metric is leaking future data.

use chrono::NaiveDate;
use nsetrend_core::data::{align_series, AlignedFrame};
use nsetrend_core::symbols::SymbolResolver;
use nsetrend_core::{Bar, Granularity, MetricSpec, RawSeries};

/// Deterministic random walk with every `gap_every`-th day missing.
fn make_series(symbol: &str, n: usize, gap_every: usize, phase: u64) -> RawSeries {
    let base = NaiveDate::from_ymd_opt(2022, 1, 3).unwrap();
    let mut price = 100.0;
    let mut bars = Vec::with_capacity(n);

    for i in 0..n {
        let seed = (i as u64 + phase)
            .wrapping_mul(6364136223846793005)
            .wrapping_add(1442695040888963407);
        let change = ((seed >> 33) % 200) as f64 / 100.0 - 1.0;
        price = f64::max(price + change, 10.0);
        if i % gap_every == gap_every - 1 {
            continue;
        }
        bars.push(Bar {
            date: base + chrono::Duration::days(i as i64),
            open: price - 0.2,
            high: price + 1.0,
            low: price - 1.0,
            close: price,
            volume: 1_000 + i as u64,
        });
    }

    RawSeries {
        instrument: SymbolResolver::default().resolve(symbol).unwrap(),
        granularity: Granularity::Daily,
        start: base,
        end: base + chrono::Duration::days(n as i64),
        bars,
    }
}

fn full_frame() -> AlignedFrame {
    align_series(&[
        make_series("TCS", 240, 17, 0),
        make_series("INFY", 240, 11, 7),
        make_series("HDFCBANK", 240, 29, 3),
    ])
}

fn truncate(frame: &AlignedFrame, rows: usize) -> AlignedFrame {
    AlignedFrame {
        dates: frame.dates[..rows].to_vec(),
        instruments: frame.instruments.clone(),
        columns: frame.columns.iter().map(|c| c[..rows].to_vec()).collect(),
    }
}

fn assert_no_lookahead(spec: MetricSpec, full: &AlignedFrame, truncated_len: usize) {
    let truncated = truncate(full, truncated_len);
    let full_result = spec.compute(full).unwrap();
    let truncated_result = spec.compute(&truncated).unwrap();

    for (f, t) in full_result.iter().zip(&truncated_result) {
        assert_eq!(t.values.len(), truncated_len, "{spec}: truncated length mismatch");
        assert_eq!(f.values.len(), full.len(), "{spec}: full length mismatch");
        for row in 0..truncated_len {
            assert_eq!(
                f.values[row], t.values[row],
                "{spec}: {} differs at row {row}",
                f.instrument
            );
        }
    }
}

#[test]
fn frame_has_gaps() {
    let frame = full_frame();
    assert!(frame.columns.iter().all(|c| c.iter().any(|cell| cell.is_absent())));
}

#[test]
fn moving_average_no_lookahead() {
    assert_no_lookahead(MetricSpec::MovingAverage(5), &full_frame(), 120);
    assert_no_lookahead(MetricSpec::MovingAverage(20), &full_frame(), 120);
}

#[test]
fn pct_return_no_lookahead() {
    assert_no_lookahead(MetricSpec::PctReturn, &full_frame(), 120);
}

#[test]
fn volatility_no_lookahead() {
    assert_no_lookahead(MetricSpec::Volatility(10), &full_frame(), 120);
}

#[test]
fn rsi_no_lookahead() {
    assert_no_lookahead(MetricSpec::Rsi(3), &full_frame(), 120);
    assert_no_lookahead(MetricSpec::Rsi(14), &full_frame(), 120);
}

#[test]
fn normalized_comparison_no_lookahead() {
    assert_no_lookahead(MetricSpec::NormalizedComparison, &full_frame(), 120);
}

#[test]
fn all_metrics_at_many_cut_points() {
    let full = full_frame();
    for cut in [1, 2, 15, 60, 239] {
        for spec in [
            MetricSpec::MovingAverage(7),
            MetricSpec::PctReturn,
            MetricSpec::Volatility(4),
            MetricSpec::Rsi(5),
        ] {
            assert_no_lookahead(spec, &full, cut);
        }
    }
}
