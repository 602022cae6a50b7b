//! Cell data structures for the sheet grid.

use dashmap::DashMap;
use serde::{Deserialize, Serialize};

use super::cell_ref::CellRef;
use super::error::EvalError;

/// Raw text starting with this marker is evaluated as a formula.
pub const FORMULA_MARKER: char = '=';

/// A memoized formula result, keyed on the raw text that produced it.
/// Failed evaluations are memoized too; a cycle is not cheaper to detect
/// the second time.
#[derive(Clone, Debug, PartialEq)]
pub struct Memo {
    /// Snapshot of the raw text at evaluation time.
    pub source: String,
    pub result: Result<String, EvalError>,
}

/// A cell in the sheet: its raw text plus the memoized computed result.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Cell {
    pub raw: String,
    /// Not serialized; recomputed on demand.
    #[serde(skip)]
    pub memo: Option<Memo>,
}

impl Cell {
    pub fn new(raw: impl Into<String>) -> Cell {
        Cell {
            raw: raw.into(),
            memo: None,
        }
    }

    /// The formula body (text after the marker), if this cell is a formula.
    pub fn formula_body(&self) -> Option<&str> {
        self.raw.strip_prefix(FORMULA_MARKER)
    }
}

/// Thread-safe sparse grid storage.
pub type Grid = DashMap<CellRef, Cell>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_formula_detection() {
        assert_eq!(Cell::new("=a * 2").formula_body(), Some("a * 2"));
        assert_eq!(Cell::new("=1 + 1").formula_body(), Some("1 + 1"));
        assert_eq!(Cell::new("1 + 1").formula_body(), None);
        assert_eq!(Cell::new(" =1").formula_body(), None);
        assert_eq!(Cell::new("plain").formula_body(), None);
    }
}
