//! Deterministic BLAKE3 fingerprint of an aligned frame.
//!
//! Covers the date index and every cell in instrument order, so a consumer
//! can tell whether a refresh changed the underlying dataset. Absent cells
//! hash differently from any present bar.

use crate::data::AlignedFrame;
use crate::domain::Cell;

pub fn dataset_hash(frame: &AlignedFrame) -> String {
    let mut hasher = blake3::Hasher::new();

    for date in &frame.dates {
        hasher.update(date.to_string().as_bytes());
    }

    for (instrument, column) in frame.instruments.iter().zip(&frame.columns) {
        hasher.update(instrument.provider_ticker().as_bytes());
        for cell in column {
            match cell {
                Cell::Present(bar) => {
                    hasher.update(&[1]);
                    hasher.update(&bar.open.to_le_bytes());
                    hasher.update(&bar.high.to_le_bytes());
                    hasher.update(&bar.low.to_le_bytes());
                    hasher.update(&bar.close.to_le_bytes());
                    hasher.update(&bar.volume.to_le_bytes());
                }
                Cell::Absent | Cell::Pending => {
                    hasher.update(&[0]);
                }
            }
        }
    }

    hasher.finalize().to_hex().to_string()
}
