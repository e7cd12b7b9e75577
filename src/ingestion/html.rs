//! HTML table decoding (`.htm`, `.html`).
//!
//! Every `<table>` in the document becomes one sheet, named `Sheet1`, `Sheet2`, ... in
//! document order. Rows of nested tables belong to the nested table only.

use std::collections::HashSet;

use scraper::{ElementRef, Html, Node, Selector};

use crate::error::{IngestionError, IngestionResult};
use crate::types::{CellValue, Sheet, Workbook, MAX_CELLS};

use super::delimited::parse_field;

const MAX_SPAN: usize = 1000;

/// Decode the tables of an HTML document into a workbook.
///
/// - `colspan`/`rowspan` are honored: the value lands in the top-left cell and the spanned
///   positions stay empty
/// - `data-t`/`data-v` attributes (as written by spreadsheet exporters) override the cell
///   text: `data-t="n"` is a number, `data-t="b"` a boolean
/// - otherwise cell text is typed like a delimited field
/// - a document without tables is a [`IngestionError::Decode`]
pub fn decode_html(bytes: &[u8]) -> IngestionResult<Workbook> {
    let text = String::from_utf8_lossy(bytes);
    let document = Html::parse_document(&text);
    let tables = selector("table")?;
    let rows = selector("tr")?;

    let mut workbook = Workbook::new();
    for (index, table) in document.select(&tables).enumerate() {
        let own_rows = table
            .select(&rows)
            .filter(|row| nearest_table(*row).is_some_and(|t| t.id() == table.id()));
        workbook.push_sheet(format!("Sheet{}", index + 1), decode_table(own_rows)?)?;
    }

    if workbook.is_empty() {
        return Err(IngestionError::Decode {
            message: "html: document has no <table>".to_string(),
        });
    }
    Ok(workbook)
}

fn selector(css: &str) -> IngestionResult<Selector> {
    Selector::parse(css).map_err(|e| IngestionError::Decode {
        message: format!("html: bad selector '{css}': {e}"),
    })
}

fn nearest_table(element: ElementRef<'_>) -> Option<ElementRef<'_>> {
    element
        .ancestors()
        .filter_map(ElementRef::wrap)
        .find(|a| a.value().name() == "table")
}

fn decode_table<'a>(rows: impl Iterator<Item = ElementRef<'a>>) -> IngestionResult<Sheet> {
    let mut cells = Vec::new();
    // Positions taken by an earlier cell's colspan/rowspan.
    let mut covered: HashSet<(usize, usize)> = HashSet::new();

    for (r, row) in rows.enumerate() {
        let mut c = 0usize;
        for cell in row
            .children()
            .filter_map(ElementRef::wrap)
            .filter(|e| matches!(e.value().name(), "td" | "th"))
        {
            while covered.remove(&(r, c)) {
                c += 1;
            }
            let colspan = span(cell, "colspan");
            let rowspan = span(cell, "rowspan");
            for dr in 0..rowspan {
                for dc in 0..colspan {
                    if dr > 0 || dc > 0 {
                        covered.insert((r + dr, c + dc));
                    }
                }
            }
            if covered.len() > MAX_CELLS {
                return Err(IngestionError::Decode {
                    message: format!("html: spans cover more than {MAX_CELLS} cells"),
                });
            }
            cells.push(((r, c), cell_value(cell)));
            c += colspan;
        }
    }

    Sheet::from_cells(cells)
}

fn span(cell: ElementRef<'_>, attr: &str) -> usize {
    cell.value()
        .attr(attr)
        .and_then(|v| v.trim().parse::<usize>().ok())
        .unwrap_or(1)
        .clamp(1, MAX_SPAN)
}

fn cell_value(cell: ElementRef<'_>) -> CellValue {
    let element = cell.value();
    if let Some(v) = element.attr("data-v") {
        return match element.attr("data-t") {
            Some("n") => v
                .trim()
                .parse::<f64>()
                .map(CellValue::Number)
                .unwrap_or_else(|_| CellValue::String(v.to_string())),
            Some("b") => CellValue::Bool(matches!(v.trim(), "1" | "true" | "TRUE")),
            _ if v.is_empty() => CellValue::Empty,
            _ => CellValue::String(v.to_string()),
        };
    }

    let mut raw = String::new();
    for node in cell.descendants() {
        match node.value() {
            Node::Text(t) => raw.extend(t.chars().map(|ch| if ch.is_whitespace() { ' ' } else { ch })),
            Node::Element(e) if e.name() == "br" => raw.push('\n'),
            _ => {}
        }
    }
    // Source whitespace collapses to one space; only `<br>` breaks a line.
    let text = raw
        .split('\n')
        .map(|line| line.split_whitespace().collect::<Vec<_>>().join(" "))
        .collect::<Vec<_>>()
        .join("\n");
    match parse_field(&text) {
        // Keep line breaks from `<br>` rather than the trimmed form.
        CellValue::String(_) => CellValue::String(text.trim().to_string()),
        other => other,
    }
}
