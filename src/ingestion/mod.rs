//! Ingestion entrypoints and implementations.
//!
//! Most callers should use [`on_create_node`] (from [`unified`]) which:
//!
//! - skips files whose extension is not allow-listed ([`filter`])
//! - loads content from disk or through the host ([`loader`])
//! - decodes it into a [`crate::types::Workbook`] ([`decode`])
//! - registers the node tree ([`crate::graph::build_graph`])
//! - optionally reports success/failure/alerts to an [`IngestionObserver`]
//!
//! Format-specific decoders are also available under:
//! - [`delimited`]
//! - [`dif`] and [`sylk`]
//! - [`html`]
//! - [`xml`]
//! - `excel` (Cargo feature `excel`)
//!
//! [`batch::ingest_dir`] runs the entrypoint for every file below a directory.

pub mod batch;
pub mod decode;
pub mod delimited;
pub mod dif;
#[cfg(feature = "excel")]
pub mod excel;
pub mod filter;
pub mod html;
pub mod loader;
pub mod observability;
pub mod sylk;
pub mod unified;
pub mod xml;

pub use batch::{ingest_dir, DirIngestOptions, DirIngestSummary, FileIngestReport};
pub use decode::{decode_workbook, SpreadsheetFormat};
pub use filter::{is_supported_extension, SUPPORTED_EXTENSIONS};
pub use loader::load_content;
pub use observability::{
    CompositeObserver, FileObserver, IngestionContext, IngestionObserver, IngestionSeverity, StdErrObserver,
};
pub use unified::{on_create_node, IngestOutcome, IngestionOptions};
