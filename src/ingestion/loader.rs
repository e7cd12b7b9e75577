use std::fs;

use crate::error::IngestionResult;
use crate::graph::{FileNode, NodeHost};

/// Load the raw bytes of `file`.
///
/// Reads the file directly when it has an absolute path; otherwise asks the host
/// ([`NodeHost::load_node_content`]), which covers virtual or remote sources. Errors from
/// either path are returned unchanged.
pub fn load_content<H: NodeHost + ?Sized>(file: &FileNode, host: &H) -> IngestionResult<Vec<u8>> {
    match file.absolute_path.as_deref() {
        Some(path) => Ok(fs::read(path)?),
        None => host.load_node_content(file),
    }
}
