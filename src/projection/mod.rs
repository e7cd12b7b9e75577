//! Sheet-to-records projection.
//!
//! [`project_sheet`] turns a [`Sheet`] into ordered [`Record`]s. How keys are chosen, which
//! cells are read and how values are rendered is controlled by [`ProjectionOptions`], which
//! callers normally obtain from the free-form [`PluginOptions`]:
//!
//! - `raw`: explicit `raw` wins, then the legacy `rawOutput`, then the default (`true`)
//! - `defval`: explicit `defval` wins, then the legacy `defaultValue`, then unset
//! - `header`, `range`, `blankrows`, `dateNF` map to typed fields
//! - anything else is kept in [`ProjectionOptions::extra`]
//!
//! ```rust
//! use sheet_nodes::projection::{project_sheet, ProjectionOptions};
//! use sheet_nodes::types::{CellValue, Sheet};
//!
//! let sheet = Sheet::new(
//!     (0, 0),
//!     vec![
//!         vec![CellValue::from("a"), CellValue::from("b")],
//!         vec![CellValue::Number(1.0), CellValue::Number(2.0)],
//!     ],
//! );
//! let records = project_sheet(&sheet, &ProjectionOptions::default());
//! assert_eq!(records.len(), 1);
//! assert_eq!(records[0].get("b"), Some(&CellValue::Number(2.0)));
//! ```

mod options;
mod range;

use std::collections::HashSet;

use crate::types::{CellValue, Record, Sheet};

pub use options::{HeaderMode, HeaderOption, PluginOptions, ProjectionOptions, RangeOption, RowRange};
pub use range::{column_letters, CellRange};

/// Key used for a header cell without text; later ones get `_1`, `_2`, ...
pub const EMPTY_HEADER_KEY: &str = "__EMPTY";

/// Project a sheet into records, one per data row, in row order.
///
/// Behavior:
/// - The working range is the sheet's used range, narrowed by `options.range`
/// - With [`HeaderMode::FirstRow`] the first row of the working range supplies keys
///   (empty header cells become `__EMPTY`, duplicates get a `_n` suffix)
/// - With [`HeaderMode::Keys`] a repeated key is one field: it keeps its first position and
///   the last column written to it supplies the value
/// - Empty cells are omitted, or filled with `options.defval` when set
/// - Rows without any value are skipped unless `options.blank_rows` is `true`
/// - With `raw == false` every value is rendered as text
pub fn project_sheet(sheet: &Sheet, options: &ProjectionOptions) -> Vec<Record> {
    let Some((first_row, first_col, last_row, last_col)) = working_bounds(sheet, options.range.as_ref()) else {
        return Vec::new();
    };

    let mut data_rows = first_row..=last_row;
    let columns: Vec<u32> = (first_col..=last_col).collect();
    let keys: Vec<Option<String>> = match &options.header {
        HeaderMode::FirstRow => match data_rows.next() {
            Some(header_row) => header_keys(sheet, header_row, &columns),
            None => return Vec::new(),
        },
        HeaderMode::Letters => columns.iter().map(|&c| Some(column_letters(c))).collect(),
        HeaderMode::Keys(list) => (0..columns.len()).map(|i| list.get(i).cloned()).collect(),
    };

    let mut records = Vec::new();
    for row in data_rows {
        let mut record = Record::new();
        let mut has_value = false;

        for (&col, key) in columns.iter().zip(keys.iter()) {
            let Some(key) = key else {
                continue;
            };
            let cell = sheet.cell(row, col);
            if cell.is_empty() {
                if let Some(defval) = &options.defval {
                    record.push(key.clone(), defval.clone());
                }
                continue;
            }
            has_value = true;
            record.push(key.clone(), render_cell(cell, options));
        }

        if has_value || options.include_blank_rows() {
            records.push(record);
        }
    }

    records
}

/// Inclusive absolute bounds actually read, or `None` when nothing can be read.
fn working_bounds(sheet: &Sheet, range: Option<&RowRange>) -> Option<(u32, u32, u32, u32)> {
    let (used_r0, used_c0, used_r1, used_c1) = sheet.bounds()?;
    let (r0, c0, r1, c1) = match range {
        None => (used_r0, used_c0, used_r1, used_c1),
        Some(RowRange::StartRow(row)) => (*row, used_c0, used_r1, used_c1),
        Some(RowRange::Cells(cells)) => (
            cells.start.0,
            cells.start.1,
            cells.end.0.min(used_r1),
            cells.end.1.min(used_c1),
        ),
    };
    if r0 > r1 || c0 > c1 {
        return None;
    }
    Some((r0, c0, r1, c1))
}

fn header_keys(sheet: &Sheet, header_row: u32, columns: &[u32]) -> Vec<Option<String>> {
    let mut seen: HashSet<String> = HashSet::new();
    let mut empty_count = 0usize;

    columns
        .iter()
        .map(|&col| {
            let text = sheet.cell(header_row, col).to_text(None);
            let base = if text.is_empty() {
                let key = match empty_count {
                    0 => EMPTY_HEADER_KEY.to_string(),
                    n => format!("{EMPTY_HEADER_KEY}_{n}"),
                };
                empty_count += 1;
                key
            } else {
                text
            };
            Some(dedupe_key(base, &mut seen))
        })
        .collect()
}

fn dedupe_key(base: String, seen: &mut HashSet<String>) -> String {
    if seen.insert(base.clone()) {
        return base;
    }
    let mut n = 1usize;
    loop {
        let candidate = format!("{base}_{n}");
        if seen.insert(candidate.clone()) {
            return candidate;
        }
        n += 1;
    }
}

fn render_cell(cell: &CellValue, options: &ProjectionOptions) -> CellValue {
    if options.raw_values() {
        cell.clone()
    } else {
        CellValue::String(cell.to_text(options.date_format.as_deref()))
    }
}
