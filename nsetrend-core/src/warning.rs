//! Non-fatal issues collected while answering a query.

use chrono::NaiveDate;
use serde::Serialize;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Warning {
    /// Provider row dropped because a field was missing or inconsistent.
    MalformedRow {
        ticker: String,
        date: Option<NaiveDate>,
        reason: String,
    },
    /// Provider row dated before an already accepted row.
    NonMonotonicRow {
        ticker: String,
        date: NaiveDate,
        previous: NaiveDate,
    },
    /// Two provider rows for one date; the later one was kept.
    DuplicateDate { ticker: String, date: NaiveDate },
    /// Instrument starts after or ends before the other instruments in the frame.
    PartialHistory {
        instrument: String,
        first: NaiveDate,
        last: NaiveDate,
        frame_first: NaiveDate,
        frame_last: NaiveDate,
    },
    /// Two request symbols resolved to the same instrument.
    DuplicateSymbol { input: String, instrument: String },
    /// Frame has too few rows for the metric to produce any value.
    ShortHistory {
        metric: String,
        rows: usize,
        lookback: usize,
    },
    /// Instrument has no observation anywhere in the frame.
    NoObservations {
        instrument: String,
        frame_first: NaiveDate,
        frame_last: NaiveDate,
    },
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Warning::MalformedRow {
                ticker,
                date: Some(date),
                reason,
            } => write!(f, "{ticker}: dropped malformed row for {date}: {reason}"),
            Warning::MalformedRow {
                ticker,
                date: None,
                reason,
            } => write!(f, "{ticker}: dropped malformed row: {reason}"),
            Warning::NonMonotonicRow {
                ticker,
                date,
                previous,
            } => write!(f, "{ticker}: dropped row for {date} (after {previous})"),
            Warning::DuplicateDate { ticker, date } => {
                write!(f, "{ticker}: duplicate row for {date}, kept the later one")
            }
            Warning::PartialHistory {
                instrument,
                first,
                last,
                ..
            } => write!(f, "{instrument}: partial history ({first} to {last})"),
            Warning::DuplicateSymbol { input, instrument } => {
                write!(f, "'{input}' repeats {instrument}, ignored")
            }
            Warning::ShortHistory {
                metric,
                rows,
                lookback,
            } => write!(
                f,
                "{metric}: {rows} rows, needs more than {lookback} for a value"
            ),
            Warning::NoObservations {
                instrument,
                frame_first,
                frame_last,
            } => write!(f, "{instrument}: no data between {frame_first} and {frame_last}"),
        }
    }
}
