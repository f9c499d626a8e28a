//! Criterion benchmarks for the analytics hot paths.
//!
//! Benchmarks:
//! 1. Alignment of several multi-year daily series with staggered gaps
//! 2. Each metric over the aligned frame
//! 3. Dataset fingerprint

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

use nsetrend_core::analytics::summarize;
use nsetrend_core::data::{align_series, AlignedFrame};
use nsetrend_core::fingerprint::dataset_hash;
use nsetrend_core::symbols::SymbolResolver;
use nsetrend_core::{Bar, Granularity, MetricSpec, RawSeries};

// ── Helpers ──────────────────────────────────────────────────────────

const SYMBOLS: [&str; 5] = ["RELIANCE", "TCS", "INFY", "HDFCBANK", "ITC"];

fn make_series(symbol: &str, n: usize, gap_every: usize) -> RawSeries {
    let base_date = chrono::NaiveDate::from_ymd_opt(2019, 1, 1).unwrap();
    let bars = (0..n)
        .filter(|i| i % gap_every != gap_every - 1)
        .map(|i| {
            let close = 1000.0 + (i as f64 * 0.05).sin() * 100.0;
            Bar {
                date: base_date + chrono::Duration::days(i as i64),
                open: close - 3.0,
                high: close + 15.0,
                low: close - 15.0,
                close,
                volume: 1_000_000 + (i as u64 % 500_000),
            }
        })
        .collect();
    RawSeries {
        instrument: SymbolResolver::default().resolve(symbol).unwrap(),
        granularity: Granularity::Daily,
        start: base_date,
        end: base_date + chrono::Duration::days(n as i64),
        bars,
    }
}

fn make_input(n: usize) -> Vec<RawSeries> {
    SYMBOLS
        .iter()
        .enumerate()
        .map(|(i, s)| make_series(s, n, 13 + i * 4))
        .collect()
}

fn make_frame(n: usize) -> AlignedFrame {
    align_series(&make_input(n))
}

// ── 1. Alignment ─────────────────────────────────────────────────────

fn bench_align(c: &mut Criterion) {
    let mut group = c.benchmark_group("align");
    for years in [1usize, 5] {
        let input = make_input(years * 365);
        group.bench_with_input(BenchmarkId::from_parameter(years), &input, |b, input| {
            b.iter(|| align_series(black_box(input)))
        });
    }
    group.finish();
}

// ── 2. Metrics ───────────────────────────────────────────────────────

fn bench_metrics(c: &mut Criterion) {
    let frame = make_frame(5 * 365);
    let mut group = c.benchmark_group("metrics_5y");
    for spec in [
        MetricSpec::MovingAverage(20),
        MetricSpec::MovingAverage(200),
        MetricSpec::PctReturn,
        MetricSpec::Volatility(20),
        MetricSpec::Rsi(14),
        MetricSpec::NormalizedComparison,
    ] {
        group.bench_function(spec.name(), |b| {
            b.iter(|| spec.compute(black_box(&frame)).unwrap())
        });
    }
    group.bench_function("summary", |b| b.iter(|| summarize(black_box(&frame))));
    group.finish();
}

// ── 3. Fingerprint ───────────────────────────────────────────────────

fn bench_fingerprint(c: &mut Criterion) {
    let frame = make_frame(5 * 365);
    c.bench_function("dataset_hash_5y", |b| b.iter(|| dataset_hash(black_box(&frame))));
}

criterion_group!(benches, bench_align, bench_metrics, bench_fingerprint);
criterion_main!(benches);
