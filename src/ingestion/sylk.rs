//! SYLK (`.sylk`, `.slk`) decoding.
//!
//! SYLK is line oriented: each record is `TYPE;field;field...`, with `;;` standing for a
//! literal `;`. Only `C` (cell) and `F` (format) records move the cursor; `X`/`Y` are 1-based
//! and sticky, so a record without `Y` stays on the current row.

use crate::error::{IngestionError, IngestionResult};
use crate::types::{CellValue, Sheet, Workbook};

use super::delimited::SINGLE_SHEET_NAME;

/// Decode a SYLK file into a one-sheet workbook.
///
/// The first record must be `ID`. Cell values (`K` field) are quoted strings, numbers,
/// `TRUE`/`FALSE` or error literals (kept as text); formulas (`E` field) are ignored.
pub fn decode_sylk(bytes: &[u8]) -> IngestionResult<Workbook> {
    let text = String::from_utf8_lossy(bytes);
    let mut records = text.lines().filter(|l| !l.trim().is_empty());

    match records.next() {
        Some(first) if first.starts_with("ID") => {}
        _ => return Err(malformed("missing ID record".to_string())),
    }

    let mut cells = Vec::new();
    let mut row = 0usize;
    let mut col = 0usize;
    for record in records {
        let fields = split_fields(record.trim_end());
        let kind = fields[0].as_str();
        if kind == "E" {
            break;
        }
        if kind != "C" && kind != "F" {
            continue;
        }

        let mut value = None;
        for field in &fields[1..] {
            let Some(tag) = field.chars().next() else {
                continue;
            };
            let rest = &field[tag.len_utf8()..];
            match tag {
                'X' => col = position(rest)?,
                'Y' => row = position(rest)?,
                'K' if kind == "C" => value = Some(parse_value(rest)),
                _ => {}
            }
        }
        if let Some(v) = value {
            cells.push(((row, col), v));
        }
    }

    let mut workbook = Workbook::new();
    workbook.push_sheet(SINGLE_SHEET_NAME, Sheet::from_cells(cells)?)?;
    Ok(workbook)
}

fn split_fields(record: &str) -> Vec<String> {
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut chars = record.chars().peekable();
    while let Some(ch) = chars.next() {
        if ch != ';' {
            current.push(ch);
        } else if chars.peek() == Some(&';') {
            chars.next();
            current.push(';');
        } else {
            fields.push(std::mem::take(&mut current));
        }
    }
    fields.push(current);
    fields
}

/// 1-based coordinate, returned 0-based.
fn position(raw: &str) -> IngestionResult<usize> {
    match raw.trim().parse::<usize>() {
        Ok(n) if n >= 1 => Ok(n - 1),
        _ => Err(malformed(format!("'{raw}' is not a cell coordinate"))),
    }
}

fn parse_value(raw: &str) -> CellValue {
    if let Some(quoted) = raw.strip_prefix('"') {
        let inner = quoted.strip_suffix('"').unwrap_or(quoted);
        return match inner.replace("\"\"", "\"") {
            s if s.is_empty() => CellValue::Empty,
            s => CellValue::String(s),
        };
    }
    match raw {
        "TRUE" => CellValue::Bool(true),
        "FALSE" => CellValue::Bool(false),
        _ => raw
            .parse::<f64>()
            .ok()
            .filter(|n| n.is_finite())
            .map(CellValue::Number)
            .unwrap_or_else(|| CellValue::String(raw.to_string())),
    }
}

fn malformed(message: String) -> IngestionError {
    IngestionError::Decode {
        message: format!("sylk: {message}"),
    }
}
