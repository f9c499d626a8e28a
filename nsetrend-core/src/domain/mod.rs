//! Domain types: instruments, bars, series, and the tri-state cell.

pub mod bar;
pub mod cell;
pub mod instrument;

pub use bar::{Bar, Granularity, RawSeries};
pub use cell::Cell;
pub use instrument::{Exchange, Instrument};
