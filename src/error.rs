use thiserror::Error;

/// Convenience result type for ingestion operations.
pub type IngestionResult<T> = Result<T, IngestionError>;

/// Error type returned by ingestion functions.
///
/// One enum is shared by loading, decoding (Excel/delimited/XML), option resolution and graph
/// building. Every variant is fatal for the ingestion pass of the file that produced it.
#[derive(Debug, Error)]
pub enum IngestionError {
    /// Underlying I/O error (e.g. file not found, permission denied).
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[cfg(feature = "excel")]
    /// Workbook decoding error (feature-gated behind `excel`).
    #[error("excel error: {0}")]
    Excel(#[from] calamine::Error),

    /// Delimited text decoding error.
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    /// XML spreadsheet (SpreadsheetML 2003 / flat OpenDocument) decoding error.
    #[error("xml error: {0}")]
    Xml(#[from] quick_xml::Error),

    /// Configuration or digest serialization error.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    /// Worker pool for directory ingestion could not be created.
    #[error("thread pool error: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),

    /// The extension passed the ingestion filter but no decoder handles it.
    #[error("unsupported spreadsheet format '{extension}'")]
    UnsupportedFormat { extension: String },

    /// The content could not be turned into a workbook (empty input, no sheets, duplicate
    /// sheet names, malformed cells).
    #[error("decode error: {message}")]
    Decode { message: String },

    /// A projection option has an invalid value.
    #[error("invalid option '{option}': {message}")]
    InvalidOption { option: String, message: String },

    /// The host content loader failed or is not available.
    #[error("content loader error: {message}")]
    Loader { message: String },
}
