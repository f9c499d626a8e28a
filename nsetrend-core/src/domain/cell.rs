//! Tri-state cell for aligned and derived values.
//!
//! A missing observation is never encoded as `0.0` or `NaN`. Cells are either
//! present, explicitly absent, or still pending computation.

use serde::{Serialize, Serializer};

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Cell<T> {
    Present(T),
    Absent,
    Pending,
}

impl<T> Default for Cell<T> {
    fn default() -> Self {
        Cell::Pending
    }
}

impl<T> Cell<T> {
    pub fn is_present(&self) -> bool {
        matches!(self, Cell::Present(_))
    }

    pub fn is_absent(&self) -> bool {
        matches!(self, Cell::Absent)
    }

    pub fn as_present(&self) -> Option<&T> {
        match self {
            Cell::Present(v) => Some(v),
            _ => None,
        }
    }

    pub fn map<U>(&self, f: impl FnOnce(&T) -> U) -> Cell<U> {
        match self {
            Cell::Present(v) => Cell::Present(f(v)),
            Cell::Absent => Cell::Absent,
            Cell::Pending => Cell::Pending,
        }
    }
}

impl<T: Copy> Cell<T> {
    pub fn present(&self) -> Option<T> {
        self.as_present().copied()
    }
}

impl<T> From<Option<T>> for Cell<T> {
    fn from(value: Option<T>) -> Self {
        match value {
            Some(v) => Cell::Present(v),
            None => Cell::Absent,
        }
    }
}

/// Present cells serialize as the value, everything else as `null`.
impl<T: Serialize> Serialize for Cell<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Cell::Present(v) => serializer.serialize_some(v),
            Cell::Absent | Cell::Pending => serializer.serialize_none(),
        }
    }
}
