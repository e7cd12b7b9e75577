//! Bytes-to-[`Workbook`] decoding, dispatched by extension.

use crate::error::{IngestionError, IngestionResult};
use crate::types::Workbook;

use super::{delimited, dif, html, sylk, xml};

/// Decoder families.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpreadsheetFormat {
    /// Binary/zipped workbooks read with `calamine` (feature-gated behind `excel`).
    Workbook,
    /// Comma/tab/semicolon/pipe separated text.
    Delimited,
    /// SpreadsheetML 2003 (`.xml`).
    SpreadsheetXml,
    /// Flat OpenDocument spreadsheet (`.fods`).
    FlatOds,
    /// Data Interchange Format (`.dif`).
    Dif,
    /// Symbolic Link (`.sylk`, `.slk`).
    Sylk,
    /// HTML tables (`.htm`, `.html`).
    Html,
}

impl SpreadsheetFormat {
    /// Decoder for a file extension (case-insensitive), if one exists.
    ///
    /// The allow-listed binary legacy formats (`dbf`, `wks`, `123`, `wq1`, `qpw`) and `uos`
    /// have no decoder and return `None`.
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "xls" | "xlsx" | "xlsm" | "xlsb" | "ods" | "xlw" | "xlc" => Some(Self::Workbook),
            "csv" | "txt" | "prn" => Some(Self::Delimited),
            "xml" => Some(Self::SpreadsheetXml),
            "fods" => Some(Self::FlatOds),
            "dif" => Some(Self::Dif),
            "sylk" | "slk" => Some(Self::Sylk),
            "htm" | "html" => Some(Self::Html),
            _ => None,
        }
    }
}

/// Decode file content into a workbook.
///
/// - `extension` selects the decoder (see [`SpreadsheetFormat::from_extension`])
/// - Date-like cells come back as [`crate::types::CellValue::Date`]
/// - Empty input, a workbook without sheets, or duplicate sheet names are
///   [`IngestionError::Decode`]; an extension without decoder is
///   [`IngestionError::UnsupportedFormat`]
pub fn decode_workbook(bytes: &[u8], extension: &str) -> IngestionResult<Workbook> {
    let ext = extension.to_lowercase();
    let format = SpreadsheetFormat::from_extension(&ext).ok_or_else(|| IngestionError::UnsupportedFormat {
        extension: ext.clone(),
    })?;
    if bytes.is_empty() {
        return Err(IngestionError::Decode {
            message: "input is empty".to_string(),
        });
    }

    let workbook = match format {
        SpreadsheetFormat::Workbook => decode_excel_dispatch(bytes),
        SpreadsheetFormat::Delimited => delimited::decode_delimited(bytes, &ext),
        SpreadsheetFormat::SpreadsheetXml => xml::decode_spreadsheet_xml(bytes),
        SpreadsheetFormat::FlatOds => xml::decode_flat_ods(bytes),
        SpreadsheetFormat::Dif => dif::decode_dif(bytes),
        SpreadsheetFormat::Sylk => sylk::decode_sylk(bytes),
        SpreadsheetFormat::Html => html::decode_html(bytes),
    }?;

    if workbook.is_empty() {
        return Err(IngestionError::Decode {
            message: "workbook has no sheets".to_string(),
        });
    }
    Ok(workbook)
}

fn decode_excel_dispatch(bytes: &[u8]) -> IngestionResult<Workbook> {
    // Avoid unused warnings when the feature is off.
    let _ = bytes;

    #[cfg(feature = "excel")]
    {
        super::excel::decode_excel(bytes)
    }

    #[cfg(not(feature = "excel"))]
    {
        Err(IngestionError::Decode {
            message: "workbook decoding not enabled (enable cargo feature 'excel')".to_string(),
        })
    }
}
