//! Core data model for decoded spreadsheets.
//!
//! Decoders turn file content into a [`Workbook`] (ordered sheet names plus a [`Sheet`] per
//! name). The projector then turns each sheet into [`Record`]s, flat mappings from column
//! header to [`CellValue`].

use std::collections::HashMap;

use chrono::{NaiveDateTime, Timelike};
use serde::ser::{SerializeMap, SerializeStruct};
use serde::{Serialize, Serializer};

use crate::error::{IngestionError, IngestionResult};

/// Format used when a date cell is rendered as text and no explicit format is configured.
pub const DEFAULT_DATE_FORMAT: &str = "%Y-%m-%d";
/// Same as [`DEFAULT_DATE_FORMAT`], for dates carrying a time of day.
pub const DEFAULT_DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Largest row count a decoder materializes for one sheet.
pub const MAX_ROWS: usize = 1_048_576;
/// Largest column count a decoder materializes for one row.
pub const MAX_COLS: usize = 16_384;
/// Largest number of cells (gaps included) a decoder materializes for one sheet.
pub const MAX_CELLS: usize = 1 << 24;

/// A single decoded cell.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    /// Missing/empty cell.
    Empty,
    /// Text.
    String(String),
    /// Any numeric value (integers included).
    Number(f64),
    /// Boolean.
    Bool(bool),
    /// Date or date-time, materialized from the workbook's serial representation.
    Date(NaiveDateTime),
}

impl CellValue {
    /// Returns `true` for [`CellValue::Empty`].
    pub fn is_empty(&self) -> bool {
        matches!(self, Self::Empty)
    }

    /// Render the value as display text.
    ///
    /// Whole numbers render without a fractional part, booleans as `TRUE`/`FALSE`, dates with
    /// `date_format` (a `chrono` format string) or the defaults above.
    pub fn to_text(&self, date_format: Option<&str>) -> String {
        match self {
            Self::Empty => String::new(),
            Self::String(s) => s.clone(),
            Self::Number(n) => format_number(*n),
            Self::Bool(true) => "TRUE".to_string(),
            Self::Bool(false) => "FALSE".to_string(),
            Self::Date(dt) => {
                let fmt = date_format.unwrap_or(if is_midnight(dt) {
                    DEFAULT_DATE_FORMAT
                } else {
                    DEFAULT_DATETIME_FORMAT
                });
                dt.format(fmt).to_string()
            }
        }
    }
}

fn is_midnight(dt: &NaiveDateTime) -> bool {
    dt.time().num_seconds_from_midnight() == 0 && dt.time().nanosecond() == 0
}

fn format_number(n: f64) -> String {
    if n.is_finite() && n.fract() == 0.0 && n.abs() < 1e15 {
        (n as i64).to_string()
    } else {
        n.to_string()
    }
}

impl Serialize for CellValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Empty => serializer.serialize_none(),
            Self::String(s) => serializer.serialize_str(s),
            Self::Number(n) => serializer.serialize_f64(*n),
            Self::Bool(b) => serializer.serialize_bool(*b),
            Self::Date(dt) => {
                serializer.collect_str(&dt.format("%Y-%m-%dT%H:%M:%S%.3f"))
            }
        }
    }
}

impl From<&str> for CellValue {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

impl From<String> for CellValue {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl From<f64> for CellValue {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

impl From<bool> for CellValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<NaiveDateTime> for CellValue {
    fn from(value: NaiveDateTime) -> Self {
        Self::Date(value)
    }
}

/// One projected row: an ordered mapping from column header to cell value.
///
/// Column order is kept as projected and is preserved by serialization.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Record {
    fields: Vec<(String, CellValue)>,
}

impl Record {
    /// Create an empty record.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a field. A new key is appended; an existing key keeps its position and takes the
    /// new value, so keys stay unique.
    pub fn push(&mut self, key: impl Into<String>, value: CellValue) {
        let key = key.into();
        match self.fields.iter_mut().find(|(k, _)| *k == key) {
            Some((_, slot)) => *slot = value,
            None => self.fields.push((key, value)),
        }
    }

    /// Look up a field by header.
    pub fn get(&self, key: &str) -> Option<&CellValue> {
        self.fields.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    /// Iterate fields in column order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &CellValue)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Iterate headers in column order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(k, _)| k.as_str())
    }

    /// Number of fields.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Returns `true` if the record has no fields.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Keep only fields whose key matches `keep`.
    pub fn retain_keys<F>(&mut self, mut keep: F)
    where
        F: FnMut(&str) -> bool,
    {
        self.fields.retain(|(k, _)| keep(k));
    }
}

impl<K: Into<String>> FromIterator<(K, CellValue)> for Record {
    fn from_iter<I: IntoIterator<Item = (K, CellValue)>>(iter: I) -> Self {
        let mut record = Self::new();
        for (k, v) in iter {
            record.push(k, v);
        }
        record
    }
}

impl Serialize for Record {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.fields.len()))?;
        for (k, v) in &self.fields {
            map.serialize_entry(k, v)?;
        }
        map.end()
    }
}

/// The used range of one worksheet.
///
/// `origin` is the absolute (0-based) row/column of the top-left cell of `rows`. Rows may be
/// ragged; missing trailing cells read as [`CellValue::Empty`].
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Sheet {
    /// Absolute `(row, column)` of `rows[0][0]`.
    pub origin: (u32, u32),
    /// Row-major cell storage.
    pub rows: Vec<Vec<CellValue>>,
}

impl Sheet {
    /// Create a sheet from an origin and row-major cells.
    pub fn new(origin: (u32, u32), rows: Vec<Vec<CellValue>>) -> Self {
        Self { origin, rows }
    }

    /// Build a sheet from cells at absolute `(row, col)` positions, in any order.
    ///
    /// Empty values are dropped and the result is trimmed to the used range; a later value
    /// at the same position replaces an earlier one. Positions past [`MAX_ROWS`] /
    /// [`MAX_COLS`], or a used range needing more than [`MAX_CELLS`] cells, are
    /// [`IngestionError::Decode`].
    pub fn from_cells<I>(cells: I) -> IngestionResult<Self>
    where
        I: IntoIterator<Item = ((usize, usize), CellValue)>,
    {
        let mut placed: Vec<((usize, usize), CellValue)> = Vec::new();
        for ((row, col), value) in cells {
            if row >= MAX_ROWS || col >= MAX_COLS {
                return Err(IngestionError::Decode {
                    message: format!("cell ({}, {}) is outside the sheet limits", row + 1, col + 1),
                });
            }
            if !value.is_empty() {
                placed.push(((row, col), value));
            }
        }
        let (Some(first_row), Some(first_col)) = (
            placed.iter().map(|((r, _), _)| *r).min(),
            placed.iter().map(|((_, c), _)| *c).min(),
        ) else {
            return Ok(Self::default());
        };

        // Stable sort keeps input order among equal positions, so the last write wins below.
        placed.sort_by_key(|(pos, _)| *pos);

        // Each row is as wide as its last cell; sorted order puts that cell last in its row.
        let materialized: usize = placed
            .windows(2)
            .filter(|w| w[0].0.0 != w[1].0.0)
            .map(|w| w[0].0.1 - first_col + 1)
            .chain(placed.last().map(|((_, c), _)| c - first_col + 1))
            .sum();
        if materialized > MAX_CELLS {
            return Err(IngestionError::Decode {
                message: format!("sheet exceeds {MAX_CELLS} cells"),
            });
        }

        let mut rows: Vec<Vec<CellValue>> = Vec::new();
        for ((row, col), value) in placed {
            let (r, c) = (row - first_row, col - first_col);
            if rows.len() <= r {
                rows.resize(r + 1, Vec::new());
            }
            let cells = &mut rows[r];
            if cells.len() <= c {
                cells.resize(c + 1, CellValue::Empty);
            }
            cells[c] = value;
        }

        Ok(Self::new((first_row as u32, first_col as u32), rows))
    }

    /// Number of stored rows.
    pub fn height(&self) -> usize {
        self.rows.len()
    }

    /// Width of the widest stored row.
    pub fn width(&self) -> usize {
        self.rows.iter().map(Vec::len).max().unwrap_or(0)
    }

    /// Returns `true` if the sheet has no cells.
    pub fn is_empty(&self) -> bool {
        self.width() == 0
    }

    /// Absolute, inclusive bounds `(first_row, first_col, last_row, last_col)` of the used
    /// range, or `None` for an empty sheet.
    pub fn bounds(&self) -> Option<(u32, u32, u32, u32)> {
        if self.is_empty() {
            return None;
        }
        let (r0, c0) = self.origin;
        let last_row = r0 + (self.height() as u32 - 1);
        let last_col = c0 + (self.width() as u32 - 1);
        Some((r0, c0, last_row, last_col))
    }

    /// Cell at an absolute position; anything outside the stored cells is empty.
    pub fn cell(&self, row: u32, col: u32) -> &CellValue {
        const EMPTY: &CellValue = &CellValue::Empty;
        let (r0, c0) = self.origin;
        if row < r0 || col < c0 {
            return EMPTY;
        }
        self.rows
            .get((row - r0) as usize)
            .and_then(|r| r.get((col - c0) as usize))
            .unwrap_or(EMPTY)
    }
}

/// A decoded spreadsheet file: sheet names in declared (tab) order plus a sheet per name.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Workbook {
    sheet_names: Vec<String>,
    sheets: HashMap<String, Sheet>,
}

impl Workbook {
    /// Create a workbook with no sheets.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a sheet at the end of the declared order.
    ///
    /// Sheet names are unique within a workbook; a duplicate name is a decode error.
    pub fn push_sheet(&mut self, name: impl Into<String>, sheet: Sheet) -> IngestionResult<()> {
        let name = name.into();
        if self.sheets.contains_key(&name) {
            return Err(IngestionError::Decode {
                message: format!("duplicate sheet name '{name}'"),
            });
        }
        self.sheet_names.push(name.clone());
        self.sheets.insert(name, sheet);
        Ok(())
    }

    /// Sheet names in declared order.
    pub fn sheet_names(&self) -> &[String] {
        &self.sheet_names
    }

    /// Look up a sheet by name.
    pub fn sheet(&self, name: &str) -> Option<&Sheet> {
        self.sheets.get(name)
    }

    /// Iterate `(name, sheet)` pairs in declared order.
    pub fn sheets(&self) -> impl Iterator<Item = (&str, &Sheet)> {
        self.sheet_names
            .iter()
            .filter_map(|name| self.sheets.get(name).map(|s| (name.as_str(), s)))
    }

    /// Number of sheets.
    pub fn len(&self) -> usize {
        self.sheet_names.len()
    }

    /// Returns `true` if the workbook has no sheets.
    pub fn is_empty(&self) -> bool {
        self.sheet_names.is_empty()
    }
}

impl Serialize for Workbook {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        struct OrderedSheets<'a>(&'a Workbook);

        impl Serialize for OrderedSheets<'_> {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                let mut map = serializer.serialize_map(Some(self.0.len()))?;
                for (name, sheet) in self.0.sheets() {
                    map.serialize_entry(name, sheet)?;
                }
                map.end()
            }
        }

        let mut st = serializer.serialize_struct("Workbook", 2)?;
        st.serialize_field("SheetNames", &self.sheet_names)?;
        st.serialize_field("Sheets", &OrderedSheets(self))?;
        st.end()
    }
}
