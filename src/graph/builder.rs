use serde::Serialize;

use crate::error::IngestionResult;
use crate::projection::{project_sheet, ProjectionOptions};
use crate::types::Workbook;

use super::host::NodeHost;
use super::node::{FileNode, Node, NodeId, NodeKind};

/// Counts reported after a successful pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GraphStats {
    /// Worksheet nodes created.
    pub worksheets: usize,
    /// Row nodes created across all worksheets.
    pub rows: usize,
}

/// Register the workbook -> worksheet -> row tree for `workbook` under `file`.
///
/// Behavior:
/// - The workbook node is named after the file and parented to `file.id`.
/// - Sheets are visited in declared order; each is projected with `options`, then its
///   worksheet node is registered, then one row node per record in index order.
/// - Every node is registered with [`NodeHost::create_node`] and immediately linked to its
///   parent with [`NodeHost::create_parent_child_link`].
///
/// Ids come from `{file}`, `{file}_{sheet}` and `{file}_{sheet}_{index}`. Digests cover only
/// the node's own content (the workbook, the sheet's records, a single record).
///
/// There is no rollback: if a digest cannot be computed midway, nodes registered before the
/// failure stay registered.
pub fn build_graph<H: NodeHost + ?Sized>(
    file: &FileNode,
    workbook: &Workbook,
    options: &ProjectionOptions,
    host: &H,
) -> IngestionResult<GraphStats> {
    let workbook_node = Node::new(
        NodeKind::Workbook,
        host.create_node_id(&file.name),
        file.id.clone(),
        digest_of(host, workbook)?,
    )
    .with_name(&file.name);
    let workbook_id = register(host, &file.id, workbook_node);

    let mut stats = GraphStats::default();
    for (sheet_name, sheet) in workbook.sheets() {
        let records = project_sheet(sheet, options);

        let worksheet_node = Node::new(
            NodeKind::Worksheet,
            host.create_node_id(&worksheet_key(&file.name, sheet_name)),
            workbook_id.clone(),
            digest_of(host, &records)?,
        )
        .with_name(sheet_name);
        let worksheet_id = register(host, &workbook_id, worksheet_node);
        stats.worksheets += 1;

        for (idx, record) in records.into_iter().enumerate() {
            let digest = digest_of(host, &record)?;
            let row_node = Node::row(
                host.create_node_id(&row_key(&file.name, sheet_name, idx)),
                worksheet_id.clone(),
                record,
                digest,
            );
            register(host, &worksheet_id, row_node);
            stats.rows += 1;
        }
    }

    Ok(stats)
}

fn worksheet_key(file_name: &str, sheet_name: &str) -> String {
    format!("{file_name}_{sheet_name}")
}

fn row_key(file_name: &str, sheet_name: &str, idx: usize) -> String {
    format!("{file_name}_{sheet_name}_{idx}")
}

fn digest_of<H: NodeHost + ?Sized, T: Serialize>(host: &H, value: &T) -> IngestionResult<String> {
    let value = serde_json::to_value(value)?;
    Ok(host.content_digest(&value))
}

fn register<H: NodeHost + ?Sized>(host: &H, parent: &NodeId, node: Node) -> NodeId {
    let id = node.id.clone();
    host.create_node(node);
    host.create_parent_child_link(parent, &id);
    id
}
