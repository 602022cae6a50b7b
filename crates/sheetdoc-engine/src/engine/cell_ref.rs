//! Cell reference parsing and formatting.
//!
//! Provides bidirectional conversion between spreadsheet-style addresses
//! (e.g. "A0", "B3", "AA12") and zero-indexed row/column coordinates. Both
//! halves of the textual form are zero-based: "A0" is the top-left cell.
//!
//! # Examples
//!
//! ```ignore
//! let cell = CellRef::parse("B3").unwrap();
//! assert_eq!(cell.row, 3);
//! assert_eq!(cell.col, 1);
//! assert_eq!(cell.to_string(), "B3");
//! ```

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::OnceLock;

fn address_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^(?<letters>[A-Za-z]+)(?<numbers>[0-9]+)$").unwrap())
}

/// A reference to a cell by row and column indices (0-indexed).
#[derive(Clone, Copy, Debug, Hash, Eq, PartialEq, Ord, PartialOrd, Serialize, Deserialize)]
pub struct CellRef {
    pub row: usize,
    pub col: usize,
}

impl CellRef {
    pub fn new(row: usize, col: usize) -> CellRef {
        CellRef { row, col }
    }

    /// Parse an address like "A0", "b3" or "AA12". Returns None if the
    /// input is not an address.
    pub fn parse(name: &str) -> Option<CellRef> {
        let caps = address_re().captures(name)?;
        let letters = &caps["letters"];
        let numbers = &caps["numbers"];

        let col = letters
            .to_ascii_uppercase()
            .bytes()
            .fold(0usize, |acc, c| acc * 26 + (c - b'A') as usize + 1)
            - 1;

        let row = numbers.parse::<usize>().ok()?;

        Some(CellRef::new(row, col))
    }

    /// Convert column index to spreadsheet-style letters (0 -> A, 25 -> Z, 26 -> AA).
    pub fn col_to_letters(col: usize) -> String {
        let mut result = String::new();
        let mut n = col + 1;
        while n > 0 {
            n -= 1;
            result.insert(0, (b'A' + (n % 26) as u8) as char);
            n /= 26;
        }
        result
    }

}

impl std::str::FromStr for CellRef {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| format!("Invalid cell reference: {}", s))
    }
}

impl fmt::Display for CellRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", CellRef::col_to_letters(self.col), self.row)
    }
}
