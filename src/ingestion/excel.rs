#![cfg(feature = "excel")]

use std::io::Cursor;

use calamine::{open_workbook_auto_from_rs, Data, DataType, Range, Reader};

use crate::error::IngestionResult;
use crate::types::{CellValue, Sheet, Workbook};

/// Decode an Excel/OpenDocument workbook (`.xlsx`, `.xls`, `.xlsb`, `.ods`, etc.) held in memory.
///
/// Behavior:
/// - The container format is sniffed from the bytes, not the extension
/// - Sheets are read in workbook (tab) order; each keeps its used range and origin
/// - Date/time cells become [`CellValue::Date`]; durations stay numeric
/// - Error cells become their display text (e.g. `#DIV/0!`)
pub fn decode_excel(bytes: &[u8]) -> IngestionResult<Workbook> {
    let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes))?;

    let sheet_names: Vec<String> = workbook.sheet_names().to_vec();
    let mut out = Workbook::new();
    for name in sheet_names {
        let range = workbook.worksheet_range(&name)?;
        out.push_sheet(name, sheet_from_range(&range))?;
    }

    Ok(out)
}

fn sheet_from_range(range: &Range<Data>) -> Sheet {
    let origin = range.start().unwrap_or((0, 0));
    let rows = range
        .rows()
        .map(|row| row.iter().map(convert_cell).collect())
        .collect();
    Sheet::new(origin, rows)
}

fn convert_cell(c: &Data) -> CellValue {
    match c {
        Data::Empty => CellValue::Empty,
        Data::String(s) => CellValue::String(s.clone()),
        Data::Int(i) => CellValue::Number(*i as f64),
        Data::Float(f) => CellValue::Number(*f),
        Data::Bool(b) => CellValue::Bool(*b),
        Data::DateTime(dt) if dt.is_duration() => CellValue::Number(dt.as_f64()),
        Data::DateTime(_) | Data::DateTimeIso(_) => c
            .as_datetime()
            .map(CellValue::Date)
            .unwrap_or_else(|| CellValue::String(c.to_string())),
        Data::DurationIso(s) => CellValue::String(s.clone()),
        Data::Error(e) => CellValue::String(e.to_string()),
    }
}
