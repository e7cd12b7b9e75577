//! Node graph construction.
//!
//! [`build_graph`] turns a decoded [`crate::types::Workbook`] into workbook, worksheet and
//! row [`Node`]s and registers them through a [`NodeHost`]. [`MemoryHost`] is an in-memory
//! host that records every call, useful for tests and for callers without a pipeline.

mod builder;
mod host;
mod node;

pub use builder::{build_graph, GraphStats};
pub use host::{default_content_digest, default_node_id, MemoryGraph, MemoryHost, NodeHost};
pub use node::{FileNode, Internal, Node, NodeId, NodeKind, RESERVED_FIELDS};
