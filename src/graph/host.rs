use std::collections::HashMap;
use std::fmt;
use std::sync::{Mutex, MutexGuard, PoisonError};

use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::error::{IngestionError, IngestionResult};

use super::node::{FileNode, Node, NodeId, NodeKind};

/// Namespace for [`default_node_id`]. Ids only need to be stable for a given key.
const NODE_ID_NAMESPACE: Uuid = Uuid::from_u128(0x6a1f_3c52_8e0d_4b7a_9f26_1d84_c0e5_b3a9);

/// The host content pipeline, as seen from the graph builder.
///
/// Every call a pass makes against the host goes through this trait: id generation, content
/// digests, node registration, parent-child links and (for non-local files) content loading.
/// Methods take `&self` so one host can serve passes for several files at once.
pub trait NodeHost: Send + Sync {
    /// Derive a node id from a logical key. Must be deterministic.
    ///
    /// Default: UUID v5 of the key.
    fn create_node_id(&self, key: &str) -> NodeId {
        default_node_id(key)
    }

    /// Digest a structured value. Must be pure and deterministic over the value's contents.
    ///
    /// Default: hex SHA-256 of the compact JSON text.
    fn content_digest(&self, value: &serde_json::Value) -> String {
        default_content_digest(value)
    }

    /// Record a node.
    fn create_node(&self, node: Node);

    /// Record a parent -> child edge.
    fn create_parent_child_link(&self, parent: &NodeId, child: &NodeId);

    /// Load the content of a file that has no local path.
    fn load_node_content(&self, file: &FileNode) -> IngestionResult<Vec<u8>> {
        Err(IngestionError::Loader {
            message: format!("no content loader for file node '{}'", file.id),
        })
    }
}

/// UUID v5 of `key` in a fixed namespace.
pub fn default_node_id(key: &str) -> NodeId {
    NodeId::new(Uuid::new_v5(&NODE_ID_NAMESPACE, key.as_bytes()).to_string())
}

/// Hex-encoded SHA-256 of the compact JSON serialization of `value`.
///
/// Object keys keep their insertion order, so equal content serialized the same way always
/// yields the same digest.
pub fn default_content_digest(value: &serde_json::Value) -> String {
    let mut hasher = Sha256::new();
    hasher.update(value.to_string().as_bytes());
    hex::encode(hasher.finalize())
}

/// Nodes and links recorded by a [`MemoryHost`], in call order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MemoryGraph {
    /// Registered nodes. A node's `children` list grows as links are recorded.
    pub nodes: Vec<Node>,
    /// `(parent, child)` edges.
    pub links: Vec<(NodeId, NodeId)>,
}

impl MemoryGraph {
    /// Find a registered node by id.
    pub fn node(&self, id: &NodeId) -> Option<&Node> {
        self.nodes.iter().find(|n| &n.id == id)
    }

    /// Registered nodes of one kind, in registration order.
    pub fn nodes_of_kind(&self, kind: NodeKind) -> Vec<&Node> {
        self.nodes.iter().filter(|n| n.kind() == kind).collect()
    }

    /// Children linked under `parent`, in link order.
    pub fn children_of(&self, parent: &NodeId) -> Vec<&Node> {
        self.links
            .iter()
            .filter(|(p, _)| p == parent)
            .filter_map(|(_, c)| self.node(c))
            .collect()
    }
}

/// In-memory [`NodeHost`] that records every registration and link.
///
/// Files without a local path are served from content added with
/// [`MemoryHost::with_content`].
#[derive(Default)]
pub struct MemoryHost {
    graph: Mutex<MemoryGraph>,
    contents: HashMap<NodeId, Vec<u8>>,
}

impl MemoryHost {
    /// Create an empty host.
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve `content` for the file node `id` from [`NodeHost::load_node_content`].
    pub fn with_content(mut self, id: impl Into<NodeId>, content: impl Into<Vec<u8>>) -> Self {
        self.contents.insert(id.into(), content.into());
        self
    }

    /// Copy of everything recorded so far.
    pub fn snapshot(&self) -> MemoryGraph {
        self.lock().clone()
    }

    /// Number of `create_node` plus `create_parent_child_link` calls received.
    pub fn call_count(&self) -> usize {
        let g = self.lock();
        g.nodes.len() + g.links.len()
    }

    fn lock(&self) -> MutexGuard<'_, MemoryGraph> {
        self.graph.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl fmt::Debug for MemoryHost {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let g = self.lock();
        f.debug_struct("MemoryHost")
            .field("nodes_len", &g.nodes.len())
            .field("links_len", &g.links.len())
            .field("contents_len", &self.contents.len())
            .finish()
    }
}

impl NodeHost for MemoryHost {
    fn create_node(&self, node: Node) {
        self.lock().nodes.push(node);
    }

    fn create_parent_child_link(&self, parent: &NodeId, child: &NodeId) {
        let mut g = self.lock();
        if let Some(p) = g.nodes.iter_mut().find(|n| &n.id == parent) {
            p.children.push(child.clone());
        }
        g.links.push((parent.clone(), child.clone()));
    }

    fn load_node_content(&self, file: &FileNode) -> IngestionResult<Vec<u8>> {
        self.contents
            .get(&file.id)
            .cloned()
            .ok_or_else(|| IngestionError::Loader {
                message: format!("no content registered for file node '{}'", file.id),
            })
    }
}
