//! `sheet-nodes` turns spreadsheet files into content nodes for a static-site content
//! pipeline.
//!
//! When the host pipeline discovers a file, it calls [`ingestion::on_create_node`]. If the
//! extension is spreadsheet-like, the file is read, decoded into a [`types::Workbook`], and
//! flattened into a three-level tree registered through a [`graph::NodeHost`]:
//!
//! - one `ExcelWorkbook` node per file (child of the file node)
//! - one `ExcelWorksheet` node per sheet, in tab order
//! - one `ExcelWorksheetRow` node per projected record, carrying the record's fields
//!
//! Ids are derived from the file name, sheet name and row index, so re-ingesting an unchanged
//! file reproduces the same ids. Digests only cover a node's own content.
//!
//! ## What you can ingest
//!
//! The extension filter accepts the spreadsheet-like extensions in
//! [`ingestion::SUPPORTED_EXTENSIONS`]. Of those, these are decoded:
//!
//! - **Workbooks** (Cargo feature `excel`, on by default): `.xlsx`, `.xlsm`, `.xlsb`, `.xls`, `.ods`
//! - **Delimited text**: `.csv`, `.txt`, `.prn`
//! - **XML spreadsheets**: `.xml` (SpreadsheetML 2003), `.fods`
//! - **Legacy text formats**: `.dif`, `.sylk`/`.slk`
//! - **HTML tables**: `.htm`, `.html` (one sheet per `<table>`)
//!
//! The remaining allow-listed extensions (`.dbf`, `.wks`, `.123`, `.wq1`, `.qpw`, `.uos`) fail with [`IngestionError::UnsupportedFormat`].
//!
//! ## Quick example
//!
//! ```rust
//! use sheet_nodes::graph::{FileNode, MemoryHost, NodeKind};
//! use sheet_nodes::ingestion::{on_create_node, IngestionOptions};
//!
//! # fn main() -> Result<(), sheet_nodes::IngestionError> {
//! // A file without a local path is loaded through the host.
//! let host = MemoryHost::new().with_content("file-1", "a,b\n1,2\n3,4\n");
//! let file = FileNode::new("file-1", "data").with_extension("csv");
//!
//! on_create_node(&file, &host, &IngestionOptions::default())?;
//!
//! let graph = host.snapshot();
//! assert_eq!(graph.nodes_of_kind(NodeKind::Workbook).len(), 1);
//! assert_eq!(graph.nodes_of_kind(NodeKind::Row).len(), 2);
//! # Ok(())
//! # }
//! ```
//!
//! ## Options
//!
//! Caller configuration is a free-form JSON object ([`projection::PluginOptions`]). `raw` and
//! `defval` are resolved with their legacy aliases (`rawOutput`, `defaultValue`); the
//! explicit key always wins.
//!
//! ```rust
//! use sheet_nodes::projection::PluginOptions;
//!
//! # fn main() -> Result<(), sheet_nodes::IngestionError> {
//! let opts = PluginOptions::from_json_str(r#"{ "raw": false, "rawOutput": true }"#)?;
//! assert_eq!(opts.resolve()?.raw, Some(false));
//! # Ok(())
//! # }
//! ```
//!
//! ## Modules
//!
//! - [`ingestion`]: entrypoint, extension filter, loader, decoders, observers, directory driver
//! - [`projection`]: sheet-to-records projection and options
//! - [`graph`]: node types, the host interface and the graph builder
//! - [`types`]: decoded workbook/sheet/cell types
//! - [`error`]: error types

pub mod error;
pub mod graph;
pub mod ingestion;
pub mod projection;
pub mod types;

pub use error::{IngestionError, IngestionResult};
