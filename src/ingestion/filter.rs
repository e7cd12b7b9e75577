//! Extension allow-list deciding which discovered files are ingested.

/// Spreadsheet-like extensions accepted by [`is_supported_extension`] (lower case).
///
/// Workbook formats, delimited text, legacy spreadsheet formats and web tables.
pub const SUPPORTED_EXTENSIONS: [&str; 23] = [
    "xls", "xlsx", "xlsm", "xlsb", //
    "xml", "xlw", "xlc", "csv", //
    "txt", "dif", "sylk", "slk", //
    "prn", "ods", "fods", "uos", //
    "dbf", "wks", "123", "wq1", //
    "qpw", "htm", "html",
];

/// Whether a file with this extension should be ingested (case-insensitive).
///
/// A missing extension is treated as the empty string, which never matches.
pub fn is_supported_extension(extension: Option<&str>) -> bool {
    let ext = extension.unwrap_or("").to_lowercase();
    SUPPORTED_EXTENSIONS.contains(&ext.as_str())
}
