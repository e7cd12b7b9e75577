//! Directory ingestion: discover files under a root and run [`on_create_node`] for each.
//!
//! Files are independent passes, so they run on a rayon pool. Each file's registration order
//! is preserved; how calls from different files interleave is unspecified.

use std::path::{Path, PathBuf};

use rayon::prelude::*;
use rayon::ThreadPoolBuilder;
use walkdir::WalkDir;

use crate::error::{IngestionError, IngestionResult};
use crate::graph::{FileNode, NodeHost};

use super::unified::{on_create_node, IngestOutcome, IngestionOptions};

/// Options for [`ingest_dir`].
#[derive(Debug, Clone, Default)]
pub struct DirIngestOptions {
    /// Glob matched against each file's path relative to the root (e.g. `**/*.xlsx`).
    /// `None` visits every file.
    pub pattern: Option<String>,
    /// Worker threads. If `None`, uses the platform's available parallelism.
    pub num_threads: Option<usize>,
}

/// Outcome for one discovered file.
#[derive(Debug)]
pub struct FileIngestReport {
    pub path: PathBuf,
    pub result: IngestionResult<IngestOutcome>,
}

/// Per-file outcomes of an [`ingest_dir`] run, in path order.
#[derive(Debug, Default)]
pub struct DirIngestSummary {
    pub reports: Vec<FileIngestReport>,
}

impl DirIngestSummary {
    /// Files whose node tree was registered.
    pub fn ingested(&self) -> usize {
        self.reports
            .iter()
            .filter(|r| matches!(r.result, Ok(IngestOutcome::Ingested(_))))
            .count()
    }

    /// Files skipped by the extension filter.
    pub fn skipped(&self) -> usize {
        self.reports
            .iter()
            .filter(|r| matches!(r.result, Ok(IngestOutcome::Skipped)))
            .count()
    }

    /// Files whose pass failed.
    pub fn failed(&self) -> impl Iterator<Item = &FileIngestReport> {
        self.reports.iter().filter(|r| r.result.is_err())
    }

    /// Row nodes registered across all files.
    pub fn total_rows(&self) -> usize {
        self.reports
            .iter()
            .map(|r| match r.result {
                Ok(IngestOutcome::Ingested(stats)) => stats.rows,
                _ => 0,
            })
            .sum()
    }
}

/// Walk `root`, build a [`FileNode`] per matching file and ingest them in parallel.
///
/// File node ids come from [`NodeHost::create_node_id`] over `file:<path>`. A failing file
/// does not stop the others; its error is kept in its report. Errors walking the directory
/// or building the pool are returned directly.
pub fn ingest_dir<H: NodeHost>(
    root: impl AsRef<Path>,
    host: &H,
    dir_options: &DirIngestOptions,
    options: &IngestionOptions,
) -> IngestionResult<DirIngestSummary> {
    let root = root.as_ref();
    let files = discover_files(root, dir_options.pattern.as_deref())?;

    let n_threads = dir_options
        .num_threads
        .unwrap_or_else(|| std::thread::available_parallelism().map(|n| n.get()).unwrap_or(1))
        .max(1);
    let pool = ThreadPoolBuilder::new().num_threads(n_threads).build()?;

    let reports: Vec<FileIngestReport> = pool.install(|| {
        files
            .par_iter()
            .map(|path| {
                let id = host.create_node_id(&format!("file:{}", path.display()));
                let file = FileNode::from_path(id, path);
                FileIngestReport {
                    path: path.clone(),
                    result: on_create_node(&file, host, options),
                }
            })
            .collect()
    });

    Ok(DirIngestSummary { reports })
}

fn discover_files(root: &Path, pattern: Option<&str>) -> IngestionResult<Vec<PathBuf>> {
    let pattern = pattern
        .map(glob::Pattern::new)
        .transpose()
        .map_err(|e| IngestionError::InvalidOption {
            option: "pattern".to_string(),
            message: e.to_string(),
        })?;

    let mut files = Vec::new();
    for entry in WalkDir::new(root).sort_by_file_name() {
        let entry = entry.map_err(std::io::Error::from)?;
        if !entry.file_type().is_file() {
            continue;
        }
        let relative = entry.path().strip_prefix(root).unwrap_or(entry.path());
        if let Some(p) = &pattern {
            if !p.matches_path(relative) {
                continue;
            }
        }
        files.push(entry.into_path());
    }
    Ok(files)
}
