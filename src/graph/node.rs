use std::fmt;
use std::path::{Path, PathBuf};

use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};

use crate::types::{CellValue, Record};

/// Structural keys every node carries. Record fields with these names are not copied onto
/// row nodes.
pub const RESERVED_FIELDS: [&str; 4] = ["id", "parent", "children", "internal"];

/// Identifier of a node in the host's content graph.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(String);

impl NodeId {
    /// Wrap an id string.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Borrow the id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for NodeId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for NodeId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// The three node kinds produced for a spreadsheet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    /// One decoded file.
    Workbook,
    /// One sheet within a workbook.
    Worksheet,
    /// One projected record within a sheet.
    Row,
}

impl NodeKind {
    /// Type tag registered with the host.
    pub fn type_name(self) -> &'static str {
        match self {
            Self::Workbook => "ExcelWorkbook",
            Self::Worksheet => "ExcelWorksheet",
            Self::Row => "ExcelWorksheetRow",
        }
    }
}

impl Serialize for NodeKind {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.type_name())
    }
}

/// Host bookkeeping attached to every node.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Internal {
    /// Node kind (`type` on the wire).
    #[serde(rename = "type")]
    pub kind: NodeKind,
    /// Digest of the node's own content.
    #[serde(rename = "contentDigest")]
    pub content_digest: String,
}

/// A content node handed to [`super::NodeHost::create_node`].
///
/// Serializes as one flat object: record fields first, then `name` (when set), `id`,
/// `parent`, `children` and `internal`.
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub id: NodeId,
    pub parent: NodeId,
    pub children: Vec<NodeId>,
    pub internal: Internal,
    /// Logical name (workbook and worksheet nodes only).
    pub name: Option<String>,
    /// Row attributes (row nodes only).
    pub fields: Record,
}

impl Node {
    pub(crate) fn new(kind: NodeKind, id: NodeId, parent: NodeId, content_digest: String) -> Self {
        Self {
            id,
            parent,
            children: Vec::new(),
            internal: Internal {
                kind,
                content_digest,
            },
            name: None,
            fields: Record::new(),
        }
    }

    pub(crate) fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Build a row node. Record fields named like a reserved structural key are dropped.
    pub(crate) fn row(id: NodeId, parent: NodeId, mut record: Record, content_digest: String) -> Self {
        record.retain_keys(|k| !RESERVED_FIELDS.contains(&k));
        Self {
            fields: record,
            ..Self::new(NodeKind::Row, id, parent, content_digest)
        }
    }

    /// Node kind.
    pub fn kind(&self) -> NodeKind {
        self.internal.kind
    }

    /// Content digest.
    pub fn content_digest(&self) -> &str {
        &self.internal.content_digest
    }

    /// Row attribute by header.
    pub fn field(&self, key: &str) -> Option<&CellValue> {
        self.fields.get(key)
    }
}

impl Serialize for Node {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(None)?;
        for (k, v) in self.fields.iter() {
            map.serialize_entry(k, v)?;
        }
        if let Some(name) = &self.name {
            map.serialize_entry("name", name)?;
        }
        map.serialize_entry("id", &self.id)?;
        map.serialize_entry("parent", &self.parent)?;
        map.serialize_entry("children", &self.children)?;
        map.serialize_entry("internal", &self.internal)?;
        map.end()
    }
}

/// A file discovered by the host pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileNode {
    /// Host id of the file node; becomes the workbook node's parent.
    pub id: NodeId,
    /// Logical name (file stem, e.g. `data` for `data.csv`).
    pub name: String,
    /// Extension without the leading dot, if any.
    pub extension: Option<String>,
    /// Absolute filesystem path, when the file is local.
    pub absolute_path: Option<PathBuf>,
}

impl FileNode {
    /// Create a file node without extension or path.
    pub fn new(id: impl Into<NodeId>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            extension: None,
            absolute_path: None,
        }
    }

    /// Set the extension.
    pub fn with_extension(mut self, extension: impl Into<String>) -> Self {
        self.extension = Some(extension.into());
        self
    }

    /// Set the absolute path.
    pub fn with_absolute_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.absolute_path = Some(path.into());
        self
    }

    /// Describe a local file: name from the file stem, extension from the path, and the path
    /// made absolute against the current directory when it is relative.
    pub fn from_path(id: impl Into<NodeId>, path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        let name = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        let extension = path
            .extension()
            .map(|s| s.to_string_lossy().into_owned());
        let absolute_path = if path.is_absolute() {
            Some(path.to_path_buf())
        } else {
            std::path::absolute(path).ok()
        };

        Self {
            id: id.into(),
            name,
            extension,
            absolute_path,
        }
    }
}
