//! DIF (Data Interchange Format) decoding.
//!
//! A DIF file is a header of `topic / vector,value / "string"` triples ending with `DATA`,
//! followed by two-line data items: `type,number` then a string line. Type `-1` items are
//! row markers (`BOT` starts a row, `EOD` ends the data), type `0` is numeric (`V`) or
//! boolean, type `1` is a quoted string.

use crate::error::{IngestionError, IngestionResult};
use crate::types::{CellValue, Sheet, Workbook};

use super::delimited::SINGLE_SHEET_NAME;

/// Decode a DIF file into a one-sheet workbook.
pub fn decode_dif(bytes: &[u8]) -> IngestionResult<Workbook> {
    let text = String::from_utf8_lossy(bytes);
    let mut lines = text.lines();

    loop {
        let Some(topic) = lines.next() else {
            return Err(malformed("missing DATA section".to_string()));
        };
        lines.next();
        lines.next();
        if topic.trim().eq_ignore_ascii_case("DATA") {
            break;
        }
    }

    let mut cells = Vec::new();
    let mut row: Option<usize> = None;
    let mut col = 0usize;
    while let Some(indicator) = lines.next() {
        let value_line = lines.next().unwrap_or("").trim();
        let (kind, number) = indicator
            .split_once(',')
            .ok_or_else(|| malformed(format!("data item '{}' has no type indicator", indicator.trim())))?;

        let value = match kind.trim() {
            "-1" => match value_line {
                "BOT" => {
                    row = Some(row.map_or(0, |r| r + 1));
                    col = 0;
                    continue;
                }
                "EOD" => break,
                other => return Err(malformed(format!("unknown special item '{other}'"))),
            },
            "0" => match value_line {
                "V" => number
                    .trim()
                    .parse::<f64>()
                    .map(CellValue::Number)
                    .map_err(|_| malformed(format!("'{}' is not a number", number.trim())))?,
                "TRUE" => CellValue::Bool(true),
                "FALSE" => CellValue::Bool(false),
                // NA and ERROR carry no value.
                _ => CellValue::Empty,
            },
            "1" => match unquote(value_line) {
                s if s.is_empty() => CellValue::Empty,
                s => CellValue::String(s),
            },
            other => return Err(malformed(format!("unknown type indicator '{other}'"))),
        };
        cells.push(((row.unwrap_or(0), col), value));
        col += 1;
    }

    let mut workbook = Workbook::new();
    workbook.push_sheet(SINGLE_SHEET_NAME, Sheet::from_cells(cells)?)?;
    Ok(workbook)
}

fn unquote(s: &str) -> String {
    match s.strip_prefix('"').and_then(|rest| rest.strip_suffix('"')) {
        Some(inner) => inner.replace("\"\"", "\""),
        None => s.to_string(),
    }
}

fn malformed(message: String) -> IngestionError {
    IngestionError::Decode {
        message: format!("dif: {message}"),
    }
}
