//! Per-file ingestion entrypoint.
//!
//! The host calls [`on_create_node`] for every file node it discovers. Files whose extension
//! is not allow-listed are skipped without touching the host; everything else is loaded,
//! decoded and turned into a workbook -> worksheet -> row node tree.

#[cfg(feature = "excel")]
use std::error::Error as StdError;
use std::fmt;
use std::sync::Arc;

use crate::error::{IngestionError, IngestionResult};
use crate::graph::{build_graph, FileNode, GraphStats, NodeHost};
use crate::projection::PluginOptions;

use super::decode::decode_workbook;
use super::filter::is_supported_extension;
use super::loader::load_content;
use super::observability::{IngestionContext, IngestionObserver, IngestionSeverity};

/// Result of one [`on_create_node`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IngestOutcome {
    /// The extension is not a spreadsheet type; the host was not called.
    Skipped,
    /// The node tree was registered.
    Ingested(GraphStats),
}

/// Options controlling ingestion behavior.
///
/// Use [`Default`] for common cases.
#[derive(Clone)]
pub struct IngestionOptions {
    /// Caller configuration forwarded to row projection.
    pub plugin: PluginOptions,
    /// Optional observer for logging/alerts.
    pub observer: Option<Arc<dyn IngestionObserver>>,
    /// Severity threshold at which `on_alert` is invoked.
    pub alert_at_or_above: IngestionSeverity,
}

impl fmt::Debug for IngestionOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IngestionOptions")
            .field("plugin", &self.plugin)
            .field("observer_set", &self.observer.is_some())
            .field("alert_at_or_above", &self.alert_at_or_above)
            .finish()
    }
}

impl Default for IngestionOptions {
    fn default() -> Self {
        Self {
            plugin: PluginOptions::default(),
            observer: None,
            alert_at_or_above: IngestionSeverity::Critical,
        }
    }
}

impl IngestionOptions {
    /// Options with the given caller configuration and no observer.
    pub fn with_plugin(plugin: PluginOptions) -> Self {
        Self {
            plugin,
            ..Self::default()
        }
    }
}

/// Ingest one discovered file.
///
/// Steps, all for `file` only:
///
/// 1. Extension filter: unsupported files return [`IngestOutcome::Skipped`] with no host call
/// 2. Resolve `options.plugin` into projection options
/// 3. Load content (direct read, or the host's loader for files without a path)
/// 4. Decode the workbook
/// 5. Register and link workbook, worksheet and row nodes in order
///
/// Any failure ends the pass and is returned. Nodes registered before a failure stay
/// registered.
///
/// When an observer is configured, this function reports:
///
/// - `on_success` on success, with worksheet/row counts
/// - `on_failure` on failure, with a computed severity
/// - `on_alert` on failure when the computed severity is >= `options.alert_at_or_above`
///
/// Skipped files are not reported.
///
/// # Examples
///
/// ```no_run
/// use sheet_nodes::graph::{FileNode, MemoryHost};
/// use sheet_nodes::ingestion::{on_create_node, IngestOutcome, IngestionOptions};
///
/// # fn main() -> Result<(), sheet_nodes::IngestionError> {
/// let host = MemoryHost::new();
/// let file = FileNode::from_path("file-1", "content/prices.xlsx");
///
/// if let IngestOutcome::Ingested(stats) = on_create_node(&file, &host, &IngestionOptions::default())? {
///     println!("worksheets={} rows={}", stats.worksheets, stats.rows);
/// }
/// # Ok(())
/// # }
/// ```
pub fn on_create_node<H: NodeHost + ?Sized>(
    file: &FileNode,
    host: &H,
    options: &IngestionOptions,
) -> IngestionResult<IngestOutcome> {
    if !is_supported_extension(file.extension.as_deref()) {
        return Ok(IngestOutcome::Skipped);
    }

    let result = ingest_file(file, host, &options.plugin);

    if let Some(obs) = options.observer.as_ref() {
        let ctx = IngestionContext::for_file(file);
        match &result {
            Ok(stats) => obs.on_success(&ctx, *stats),
            Err(e) => {
                let sev = severity_for_error(e);
                obs.on_failure(&ctx, sev, e);
                if sev >= options.alert_at_or_above {
                    obs.on_alert(&ctx, sev, e);
                }
            }
        }
    }

    result.map(IngestOutcome::Ingested)
}

fn ingest_file<H: NodeHost + ?Sized>(
    file: &FileNode,
    host: &H,
    plugin: &PluginOptions,
) -> IngestionResult<GraphStats> {
    let projection = plugin.resolve()?;
    let content = load_content(file, host)?;
    let workbook = decode_workbook(&content, file.extension.as_deref().unwrap_or(""))?;
    build_graph(file, &workbook, &projection, host)
}

fn severity_for_error(e: &IngestionError) -> IngestionSeverity {
    match e {
        IngestionError::Io(_) | IngestionError::Loader { .. } | IngestionError::ThreadPool(_) => {
            IngestionSeverity::Critical
        }
        #[cfg(feature = "excel")]
        IngestionError::Excel(err) => {
            // calamine wraps I/O in several of its per-format errors.
            if error_chain_contains_io(err) {
                IngestionSeverity::Critical
            } else {
                IngestionSeverity::Error
            }
        }
        IngestionError::Csv(err) => match err.kind() {
            ::csv::ErrorKind::Io(_) => IngestionSeverity::Critical,
            _ => IngestionSeverity::Error,
        },
        IngestionError::Xml(quick_xml::Error::Io(_)) => IngestionSeverity::Critical,
        IngestionError::Xml(_)
        | IngestionError::Json(_)
        | IngestionError::UnsupportedFormat { .. }
        | IngestionError::Decode { .. }
        | IngestionError::InvalidOption { .. } => IngestionSeverity::Error,
    }
}

#[cfg(feature = "excel")]
fn error_chain_contains_io(e: &(dyn StdError + 'static)) -> bool {
    let mut cur: Option<&(dyn StdError + 'static)> = Some(e);
    while let Some(err) = cur {
        if err.is::<std::io::Error>() {
            return true;
        }
        cur = err.source();
    }
    false
}
