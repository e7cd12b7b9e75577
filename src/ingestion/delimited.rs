//! Delimited text (`.csv`, `.txt`, `.prn`) decoding.

use crate::error::IngestionResult;
use crate::types::{CellValue, Sheet, Workbook};

/// Name given to the only sheet of a single-table text format (delimited text, DIF, SYLK).
pub const SINGLE_SHEET_NAME: &str = "Sheet1";

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Decode delimited text into a one-sheet workbook.
///
/// Rules:
///
/// - The delimiter is sniffed from the first non-empty line (`,` `\t` `;` `|`); `.csv`
///   prefers `,`, other extensions prefer `\t`.
/// - No row is treated as a header here; that is the projector's job.
/// - Rows may have different lengths.
/// - Fields are typed: numbers, `TRUE`/`FALSE`, empty, otherwise text.
/// - Invalid UTF-8 is replaced rather than rejected.
pub fn decode_delimited(bytes: &[u8], extension: &str) -> IngestionResult<Workbook> {
    let bytes = bytes.strip_prefix(UTF8_BOM).unwrap_or(bytes);
    let text = String::from_utf8_lossy(bytes);
    let delimiter = sniff_delimiter(&text, extension);

    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .delimiter(delimiter)
        .from_reader(text.as_bytes());

    let mut rows: Vec<Vec<CellValue>> = Vec::new();
    for result in rdr.records() {
        let record = result?;
        rows.push(record.iter().map(parse_field).collect());
    }

    let mut workbook = Workbook::new();
    workbook.push_sheet(SINGLE_SHEET_NAME, Sheet::new((0, 0), rows))?;
    Ok(workbook)
}

fn sniff_delimiter(text: &str, extension: &str) -> u8 {
    let candidates: [u8; 4] = if extension.eq_ignore_ascii_case("csv") {
        [b',', b';', b'\t', b'|']
    } else {
        [b'\t', b',', b';', b'|']
    };
    let Some(first_line) = text.lines().find(|l| !l.trim().is_empty()) else {
        return candidates[0];
    };
    if extension.eq_ignore_ascii_case("csv") && first_line.contains(',') {
        return b',';
    }

    // First candidate wins ties.
    let mut best = candidates[0];
    let mut best_count = 0usize;
    for &c in &candidates {
        let count = first_line.bytes().filter(|&b| b == c).count();
        if count > best_count {
            best = c;
            best_count = count;
        }
    }
    best
}

/// Type a text field: numbers, `TRUE`/`FALSE`, empty, otherwise text.
pub(super) fn parse_field(raw: &str) -> CellValue {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return CellValue::Empty;
    }
    if trimmed.eq_ignore_ascii_case("true") {
        return CellValue::Bool(true);
    }
    if trimmed.eq_ignore_ascii_case("false") {
        return CellValue::Bool(false);
    }
    if looks_numeric(trimmed) {
        if let Ok(n) = trimmed.parse::<f64>() {
            if n.is_finite() {
                return CellValue::Number(n);
            }
        }
    }
    CellValue::String(raw.to_string())
}

/// Rejects words `f64::from_str` accepts (`inf`, `NaN`, `infinity`).
fn looks_numeric(s: &str) -> bool {
    s.bytes()
        .all(|b| b.is_ascii_digit() || matches!(b, b'.' | b'-' | b'+' | b'e' | b'E'))
}
