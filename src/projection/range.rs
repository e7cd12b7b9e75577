//! A1-style cell references.

use std::fmt;
use std::str::FromStr;

use crate::error::IngestionError;

/// An absolute, inclusive rectangle of cells (0-based rows and columns).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CellRange {
    /// `(row, column)` of the top-left cell.
    pub start: (u32, u32),
    /// `(row, column)` of the bottom-right cell.
    pub end: (u32, u32),
}

impl FromStr for CellRange {
    type Err = IngestionError;

    /// Parse `B2:D10`, `$B$2:$D$10` or a single cell `B2`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (first, last) = match s.split_once(':') {
            Some((a, b)) => (a, b),
            None => (s, s),
        };
        let start = parse_cell_ref(first).ok_or_else(|| invalid(s))?;
        let end = parse_cell_ref(last).ok_or_else(|| invalid(s))?;
        if start.0 > end.0 || start.1 > end.1 {
            return Err(IngestionError::InvalidOption {
                option: "range".to_string(),
                message: format!("'{s}' ends before it starts"),
            });
        }
        Ok(Self { start, end })
    }
}

impl fmt::Display for CellRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}{}:{}{}",
            column_letters(self.start.1),
            self.start.0 + 1,
            column_letters(self.end.1),
            self.end.0 + 1
        )
    }
}

fn invalid(s: &str) -> IngestionError {
    IngestionError::InvalidOption {
        option: "range".to_string(),
        message: format!("'{s}' is not an A1 cell range"),
    }
}

/// Parse one reference such as `AB12` into 0-based `(row, column)`.
fn parse_cell_ref(s: &str) -> Option<(u32, u32)> {
    let s = s.trim();
    let s = s.strip_prefix('$').unwrap_or(s);
    let split = s.find(|c: char| !c.is_ascii_alphabetic())?;
    let (letters, rest) = s.split_at(split);
    let digits = rest.strip_prefix('$').unwrap_or(rest);
    if letters.is_empty() || digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }

    let mut col: u32 = 0;
    for b in letters.bytes() {
        let v = u32::from(b.to_ascii_uppercase() - b'A') + 1;
        col = col.checked_mul(26)?.checked_add(v)?;
    }
    let row: u32 = digits.parse().ok()?;
    if row == 0 {
        return None;
    }
    Some((row - 1, col - 1))
}

/// Spreadsheet column name for a 0-based index (`0` -> `A`, `26` -> `AA`).
pub fn column_letters(col: u32) -> String {
    let mut n = col as u64 + 1;
    let mut out = Vec::new();
    while n > 0 {
        let rem = ((n - 1) % 26) as u8;
        out.push(b'A' + rem);
        n = (n - 1) / 26;
    }
    out.reverse();
    String::from_utf8(out).unwrap_or_default()
}
