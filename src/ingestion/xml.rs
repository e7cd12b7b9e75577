//! XML spreadsheet dialects: SpreadsheetML 2003 (`.xml`) and flat OpenDocument (`.fods`).
//!
//! Both are read with a streaming `quick_xml` reader. Element and attribute names are matched
//! by local name, so namespace prefixes do not matter.

use chrono::{NaiveDate, NaiveDateTime};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use crate::error::{IngestionError, IngestionResult};
use crate::types::{CellValue, Sheet, Workbook, MAX_CELLS, MAX_COLS, MAX_ROWS};

/// Decode a SpreadsheetML 2003 workbook.
///
/// Honors `ss:Index` on rows and cells and `ss:MergeAcross` on cells. `ss:Type` selects the
/// cell type (`Number`, `Boolean`, `DateTime`, `String`, `Error`). Cell comments are skipped.
pub fn decode_spreadsheet_xml(bytes: &[u8]) -> IngestionResult<Workbook> {
    let mut reader = Reader::from_reader(bytes);
    reader.config_mut().trim_text(false);

    let mut workbook = Workbook::new();
    let mut grid: Option<GridBuilder> = None;
    let mut cell: Option<XmlCell> = None;
    let mut in_data = false;
    let mut comment_depth = 0usize;
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(ref e) => match e.local_name().as_ref() {
                b"Comment" => comment_depth += 1,
                _ if comment_depth > 0 => {}
                b"Worksheet" => grid = Some(GridBuilder::new(attr(e, b"Name")?.unwrap_or_default())),
                b"Row" => {
                    if let Some(g) = grid.as_mut() {
                        g.begin_row(index_attr(e, b"Index")?);
                    }
                }
                b"Cell" => {
                    if let Some(g) = grid.as_mut() {
                        g.skip_to_col(index_attr(e, b"Index")?);
                        cell = Some(XmlCell {
                            merge_across: count_attr(e, b"MergeAcross")?.unwrap_or(0),
                            ..XmlCell::default()
                        });
                    }
                }
                b"Data" => {
                    if let Some(c) = cell.as_mut() {
                        c.kind = attr(e, b"Type")?;
                        in_data = true;
                    }
                }
                _ => {}
            },
            Event::Empty(ref e) => match e.local_name().as_ref() {
                _ if comment_depth > 0 => {}
                b"Worksheet" => {
                    let name = attr(e, b"Name")?.unwrap_or_default();
                    workbook.push_sheet(name, Sheet::default())?;
                }
                b"Row" => {
                    if let Some(g) = grid.as_mut() {
                        g.begin_row(index_attr(e, b"Index")?);
                        g.end_row(1)?;
                    }
                }
                b"Cell" => {
                    if let Some(g) = grid.as_mut() {
                        g.skip_to_col(index_attr(e, b"Index")?);
                        g.skip_cols(1 + count_attr(e, b"MergeAcross")?.unwrap_or(0));
                    }
                }
                _ => {}
            },
            Event::Text(ref e) if in_data && comment_depth == 0 => {
                if let Some(c) = cell.as_mut() {
                    c.text.push_str(&e.unescape()?);
                }
            }
            Event::CData(e) if in_data && comment_depth == 0 => {
                if let Some(c) = cell.as_mut() {
                    c.text.push_str(&String::from_utf8_lossy(&e.into_inner()));
                }
            }
            Event::End(ref e) => match e.local_name().as_ref() {
                b"Comment" => comment_depth = comment_depth.saturating_sub(1),
                _ if comment_depth > 0 => {}
                b"Data" => in_data = false,
                b"Cell" => {
                    if let (Some(g), Some(c)) = (grid.as_mut(), cell.take()) {
                        let merge_across = c.merge_across;
                        g.push_cells(c.into_value(), 1)?;
                        g.skip_cols(merge_across);
                    }
                }
                b"Row" => {
                    if let Some(g) = grid.as_mut() {
                        g.end_row(1)?;
                    }
                }
                b"Worksheet" => {
                    if let Some(g) = grid.take() {
                        let (name, sheet) = g.finish();
                        workbook.push_sheet(name, sheet)?;
                    }
                }
                _ => {}
            },
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    Ok(workbook)
}

/// Decode a flat OpenDocument spreadsheet.
///
/// Honors `table:number-rows-repeated` and `table:number-columns-repeated`; repeated empty
/// rows/cells at the end of a sheet are not materialized. Typed cells (`float`,
/// `percentage`, `currency`, `boolean`, `date`) use their `office:*-value` attribute, other
/// cells their paragraph text.
pub fn decode_flat_ods(bytes: &[u8]) -> IngestionResult<Workbook> {
    let mut reader = Reader::from_reader(bytes);
    reader.config_mut().trim_text(false);

    let mut workbook = Workbook::new();
    let mut grid: Option<GridBuilder> = None;
    let mut cell: Option<OdsCell> = None;
    let mut row_repeat = 1usize;
    let mut annotation_depth = 0usize;
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(ref e) => match e.local_name().as_ref() {
                b"table" => grid = Some(GridBuilder::new(attr(e, b"name")?.unwrap_or_default())),
                b"table-row" => {
                    if let Some(g) = grid.as_mut() {
                        row_repeat = count_attr(e, b"number-rows-repeated")?.unwrap_or(1);
                        g.begin_row(None);
                    }
                }
                b"table-cell" | b"covered-table-cell" => {
                    if grid.is_some() {
                        cell = Some(OdsCell::from_start(e)?);
                    }
                }
                b"annotation" => annotation_depth += 1,
                b"p" if annotation_depth == 0 => {
                    if let Some(c) = cell.as_mut() {
                        if c.paragraphs > 0 {
                            c.text.push('\n');
                        }
                        c.paragraphs += 1;
                        c.in_paragraph = true;
                    }
                }
                _ => {}
            },
            Event::Empty(ref e) => match e.local_name().as_ref() {
                b"table" => {
                    let name = attr(e, b"name")?.unwrap_or_default();
                    workbook.push_sheet(name, Sheet::default())?;
                }
                b"table-row" => {
                    if let Some(g) = grid.as_mut() {
                        g.begin_row(None);
                        g.end_row(count_attr(e, b"number-rows-repeated")?.unwrap_or(1))?;
                    }
                }
                b"table-cell" | b"covered-table-cell" => {
                    if let Some(g) = grid.as_mut() {
                        let c = OdsCell::from_start(e)?;
                        let repeat = c.repeat;
                        g.push_cells(c.into_value(), repeat)?;
                    }
                }
                b"s" if annotation_depth == 0 => {
                    if let Some(c) = cell.as_mut() {
                        let n = count_attr(e, b"c")?.unwrap_or(1);
                        c.text.extend(std::iter::repeat_n(' ', n.min(MAX_COLS)));
                    }
                }
                b"tab" if annotation_depth == 0 => {
                    if let Some(c) = cell.as_mut() {
                        c.text.push('\t');
                    }
                }
                b"line-break" if annotation_depth == 0 => {
                    if let Some(c) = cell.as_mut() {
                        c.text.push('\n');
                    }
                }
                _ => {}
            },
            Event::Text(ref e) if annotation_depth == 0 => {
                if let Some(c) = cell.as_mut() {
                    if c.in_paragraph {
                        c.text.push_str(&e.unescape()?);
                    }
                }
            }
            Event::End(ref e) => match e.local_name().as_ref() {
                b"annotation" => annotation_depth = annotation_depth.saturating_sub(1),
                b"p" => {
                    if let Some(c) = cell.as_mut() {
                        c.in_paragraph = false;
                    }
                }
                b"table-cell" | b"covered-table-cell" => {
                    if let (Some(g), Some(c)) = (grid.as_mut(), cell.take()) {
                        let repeat = c.repeat;
                        g.push_cells(c.into_value(), repeat)?;
                    }
                }
                b"table-row" => {
                    if let Some(g) = grid.as_mut() {
                        g.end_row(row_repeat)?;
                        row_repeat = 1;
                    }
                }
                b"table" => {
                    if let Some(g) = grid.take() {
                        let (name, sheet) = g.finish();
                        workbook.push_sheet(name, sheet)?;
                    }
                }
                _ => {}
            },
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    Ok(workbook)
}

/// Accumulates one sheet, materializing only non-empty cells (and the gaps before them).
struct GridBuilder {
    name: String,
    rows: Vec<Vec<CellValue>>,
    /// Absolute index of the current row.
    row: usize,
    /// Absolute index of the next cell in the current row.
    col: usize,
    current: Vec<CellValue>,
    /// Cells materialized so far, gaps included.
    cells: usize,
}

impl GridBuilder {
    fn new(name: String) -> Self {
        Self {
            name,
            rows: Vec::new(),
            row: 0,
            col: 0,
            current: Vec::new(),
            cells: 0,
        }
    }

    /// `index` is 0-based and may only move forward.
    fn begin_row(&mut self, index: Option<usize>) {
        if let Some(i) = index {
            self.row = self.row.max(i);
        }
        self.col = 0;
        self.current.clear();
    }

    fn skip_to_col(&mut self, index: Option<usize>) {
        if let Some(i) = index {
            self.col = self.col.max(i);
        }
    }

    fn skip_cols(&mut self, n: usize) {
        self.col = self.col.saturating_add(n);
    }

    fn push_cells(&mut self, value: CellValue, repeat: usize) -> IngestionResult<()> {
        if value.is_empty() {
            self.skip_cols(repeat);
            return Ok(());
        }
        let end = self.col.saturating_add(repeat);
        if end > MAX_COLS {
            return Err(IngestionError::Decode {
                message: format!("sheet '{}': row {} exceeds {MAX_COLS} columns", self.name, self.row + 1),
            });
        }
        self.current.resize(self.col, CellValue::Empty);
        self.current.extend(std::iter::repeat_n(value, repeat));
        self.col = end;
        Ok(())
    }

    fn end_row(&mut self, repeat: usize) -> IngestionResult<()> {
        if !self.current.is_empty() {
            if self.row.saturating_add(repeat) > MAX_ROWS {
                return Err(IngestionError::Decode {
                    message: format!("sheet '{}' exceeds {MAX_ROWS} rows", self.name),
                });
            }
            let added = self.current.len().saturating_mul(repeat);
            if self.cells.saturating_add(added) > MAX_CELLS {
                return Err(IngestionError::Decode {
                    message: format!("sheet '{}' exceeds {MAX_CELLS} cells", self.name),
                });
            }
            self.cells += added;
            self.rows.resize(self.row, Vec::new());
            for _ in 0..repeat {
                self.rows.push(self.current.clone());
            }
        }
        self.row = self.row.saturating_add(repeat);
        self.current.clear();
        self.col = 0;
        Ok(())
    }

    /// Name plus the sheet trimmed to its used range.
    fn finish(self) -> (String, Sheet) {
        let Some(first_row) = self.rows.iter().position(|r| !r.is_empty()) else {
            return (self.name, Sheet::default());
        };
        let first_col = self.rows[first_row..]
            .iter()
            .filter_map(|r| r.iter().position(|c| !c.is_empty()))
            .min()
            .unwrap_or(0);
        let rows = self
            .rows
            .into_iter()
            .skip(first_row)
            .map(|r| r.into_iter().skip(first_col).collect())
            .collect();
        (self.name, Sheet::new((first_row as u32, first_col as u32), rows))
    }
}

#[derive(Default)]
struct XmlCell {
    kind: Option<String>,
    text: String,
    merge_across: usize,
}

impl XmlCell {
    fn into_value(self) -> CellValue {
        if self.text.is_empty() {
            return CellValue::Empty;
        }
        match self.kind.as_deref() {
            Some("Number") => self
                .text
                .trim()
                .parse::<f64>()
                .map(CellValue::Number)
                .unwrap_or(CellValue::String(self.text)),
            Some("Boolean") => CellValue::Bool(matches!(self.text.trim(), "1" | "true" | "TRUE")),
            Some("DateTime") => parse_datetime(&self.text)
                .map(CellValue::Date)
                .unwrap_or(CellValue::String(self.text)),
            _ => CellValue::String(self.text),
        }
    }
}

struct OdsCell {
    value_type: Option<String>,
    typed: Option<CellValue>,
    text: String,
    paragraphs: usize,
    in_paragraph: bool,
    repeat: usize,
}

impl OdsCell {
    fn from_start(e: &BytesStart<'_>) -> IngestionResult<Self> {
        let repeat = count_attr(e, b"number-columns-repeated")?.unwrap_or(1);
        let value_type = attr(e, b"value-type")?;
        let typed = match value_type.as_deref() {
            Some("float" | "percentage" | "currency") => attr(e, b"value")?
                .and_then(|v| v.trim().parse::<f64>().ok())
                .map(CellValue::Number),
            Some("boolean") => attr(e, b"boolean-value")?.map(|v| CellValue::Bool(v.trim() == "true")),
            Some("date") => attr(e, b"date-value")?
                .and_then(|v| parse_datetime(&v))
                .map(CellValue::Date),
            _ => None,
        };
        Ok(Self {
            value_type,
            typed,
            text: String::new(),
            paragraphs: 0,
            in_paragraph: false,
            repeat,
        })
    }

    fn into_value(self) -> CellValue {
        match (self.typed, self.value_type) {
            (Some(v), _) => v,
            (None, None) => CellValue::Empty,
            (None, Some(_)) if self.text.is_empty() => CellValue::Empty,
            (None, Some(_)) => CellValue::String(self.text),
        }
    }
}

fn parse_datetime(s: &str) -> Option<NaiveDateTime> {
    let s = s.trim();
    NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .or_else(|| NaiveDate::parse_from_str(s, "%Y-%m-%d").ok()?.and_hms_opt(0, 0, 0))
}

fn attr(e: &BytesStart<'_>, local: &[u8]) -> IngestionResult<Option<String>> {
    for a in e.attributes() {
        let a = a.map_err(quick_xml::Error::from)?;
        if a.key.local_name().as_ref() == local {
            return Ok(Some(a.unescape_value()?.into_owned()));
        }
    }
    Ok(None)
}

fn count_attr(e: &BytesStart<'_>, local: &[u8]) -> IngestionResult<Option<usize>> {
    match attr(e, local)? {
        None => Ok(None),
        Some(v) => v.trim().parse::<usize>().map(Some).map_err(|err| IngestionError::Decode {
            message: format!(
                "attribute '{}'='{v}' is not a count: {err}",
                String::from_utf8_lossy(local)
            ),
        }),
    }
}

/// 1-based index attribute, returned 0-based.
fn index_attr(e: &BytesStart<'_>, local: &[u8]) -> IngestionResult<Option<usize>> {
    Ok(count_attr(e, local)?.map(|i| i.saturating_sub(1)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn grid_skips_trailing_empty_repeats() {
        let mut g = GridBuilder::new("S".to_string());
        g.begin_row(None);
        g.push_cells(CellValue::from("a"), 1).unwrap();
        g.push_cells(CellValue::Empty, 16_000).unwrap();
        g.end_row(1).unwrap();
        g.begin_row(None);
        g.push_cells(CellValue::Empty, 1024).unwrap();
        g.end_row(1_000_000).unwrap();
        let (_, sheet) = g.finish();
        assert_eq!(sheet.height(), 1);
        assert_eq!(sheet.width(), 1);
    }

    #[test]
    fn grid_trims_leading_gaps_into_origin() {
        let mut g = GridBuilder::new("S".to_string());
        g.begin_row(Some(2));
        g.skip_to_col(Some(1));
        g.push_cells(CellValue::Number(1.0), 1).unwrap();
        g.end_row(1).unwrap();
        let (_, sheet) = g.finish();
        assert_eq!(sheet.origin, (2, 1));
        assert_eq!(sheet.cell(2, 1), &CellValue::Number(1.0));
    }

    #[test]
    fn grid_caps_total_cells_across_repeated_rows() {
        let mut g = GridBuilder::new("Wide".to_string());
        g.begin_row(None);
        g.push_cells(CellValue::from("x"), MAX_COLS).unwrap();
        let err = g.end_row(MAX_ROWS).unwrap_err();
        assert!(err.to_string().contains("cells"));
    }

    #[test]
    fn parses_dates_with_and_without_time() {
        let d = parse_datetime("2024-03-01").unwrap();
        assert_eq!(d.to_string(), "2024-03-01 00:00:00");
        let dt = parse_datetime("2024-03-01T10:30:00.000").unwrap();
        assert_eq!(dt.to_string(), "2024-03-01 10:30:00");
    }
}
