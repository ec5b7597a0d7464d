//! `meta.yaml`: the dataset manifest.
//!
//! ```yaml
//! version: 1.0.0
//! dataset_name: social
//! separator: ","
//! node_data:
//!   - file_name: users.csv
//!     ntype: user
//! edge_data:
//!   - file_name: follows.csv
//!     etype: [user, follow, user]
//! graph_data:
//!   file_name: graphs.csv
//! ```
//!
//! Optional keys fall back to the defaults below. `version` must equal
//! [`SUPPORTED_VERSION`]; the manifest is rejected otherwise.

use crate::error::{DataError, Result, TypeKind};
use crate::labels::{EdgeType, DEFAULT_NTYPE};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

/// The only manifest format version this crate reads.
pub const SUPPORTED_VERSION: &str = "1.0.0";

/// File name of the manifest inside a dataset directory.
pub const MANIFEST_FILE_NAME: &str = "meta.yaml";

pub const DEFAULT_SEPARATOR: &str = ",";
pub const DEFAULT_GRAPH_ID_FIELD: &str = "graph_id";
pub const DEFAULT_NODE_ID_FIELD: &str = "node_id";
pub const DEFAULT_SRC_ID_FIELD: &str = "src_id";
pub const DEFAULT_DST_ID_FIELD: &str = "dst_id";

fn default_separator() -> String {
    DEFAULT_SEPARATOR.to_string()
}

fn default_ntype() -> String {
    DEFAULT_NTYPE.to_string()
}

fn default_graph_id_field() -> String {
    DEFAULT_GRAPH_ID_FIELD.to_string()
}

fn default_node_id_field() -> String {
    DEFAULT_NODE_ID_FIELD.to_string()
}

fn default_src_id_field() -> String {
    DEFAULT_SRC_ID_FIELD.to_string()
}

fn default_dst_id_field() -> String {
    DEFAULT_DST_ID_FIELD.to_string()
}

/// Node table descriptor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetaNode {
    pub file_name: String,
    #[serde(default = "default_ntype")]
    pub ntype: String,
    #[serde(default = "default_graph_id_field")]
    pub graph_id_field: String,
    #[serde(default = "default_node_id_field")]
    pub node_id_field: String,
}

impl MetaNode {
    pub fn new(file_name: impl Into<String>) -> Self {
        Self {
            file_name: file_name.into(),
            ntype: default_ntype(),
            graph_id_field: default_graph_id_field(),
            node_id_field: default_node_id_field(),
        }
    }

    pub fn with_ntype(mut self, ntype: impl Into<String>) -> Self {
        self.ntype = ntype.into();
        self
    }
}

/// Edge table descriptor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetaEdge {
    pub file_name: String,
    #[serde(default)]
    pub etype: EdgeType,
    #[serde(default = "default_graph_id_field")]
    pub graph_id_field: String,
    #[serde(default = "default_src_id_field")]
    pub src_id_field: String,
    #[serde(default = "default_dst_id_field")]
    pub dst_id_field: String,
}

impl MetaEdge {
    pub fn new(file_name: impl Into<String>) -> Self {
        Self {
            file_name: file_name.into(),
            etype: EdgeType::default(),
            graph_id_field: default_graph_id_field(),
            src_id_field: default_src_id_field(),
            dst_id_field: default_dst_id_field(),
        }
    }

    pub fn with_etype(mut self, etype: impl Into<EdgeType>) -> Self {
        self.etype = etype.into();
        self
    }
}

/// Graph table descriptor (one row per graph).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetaGraph {
    pub file_name: String,
    #[serde(default = "default_graph_id_field")]
    pub graph_id_field: String,
}

impl MetaGraph {
    pub fn new(file_name: impl Into<String>) -> Self {
        Self {
            file_name: file_name.into(),
            graph_id_field: default_graph_id_field(),
        }
    }
}

/// Parsed and validated manifest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Manifest {
    pub version: String,
    pub dataset_name: String,
    #[serde(default = "default_separator")]
    pub separator: String,
    pub node_data: Vec<MetaNode>,
    pub edge_data: Vec<MetaEdge>,
    #[serde(default)]
    pub graph_data: Option<MetaGraph>,
}

impl Manifest {
    /// Check version gating, the separator and type-label uniqueness.
    pub fn validate(&self) -> Result<()> {
        if self.version != SUPPORTED_VERSION {
            return Err(DataError::Schema(format!(
                "unsupported manifest version `{}` (expected `{SUPPORTED_VERSION}`)",
                self.version
            )));
        }
        if self.separator.len() != 1 {
            return Err(DataError::Schema(format!(
                "separator must be a single ASCII character, got `{}`",
                self.separator
            )));
        }

        let mut ntypes = HashSet::new();
        for node in &self.node_data {
            if !ntypes.insert(node.ntype.as_str()) {
                return Err(DataError::DuplicateType {
                    kind: TypeKind::Node,
                    label: node.ntype.clone(),
                });
            }
        }

        let mut etypes = HashSet::new();
        for edge in &self.edge_data {
            if !etypes.insert(&edge.etype) {
                return Err(DataError::DuplicateType {
                    kind: TypeKind::Edge,
                    label: edge.etype.to_string(),
                });
            }
        }

        Ok(())
    }

    /// Field separator as a byte. Only meaningful after [`Manifest::validate`].
    pub fn separator_byte(&self) -> u8 {
        self.separator.as_bytes().first().copied().unwrap_or(b',')
    }

    /// Every table file the manifest references, in manifest order
    /// (nodes, then edges, then the graph table).
    pub fn referenced_files(&self) -> Vec<&str> {
        let mut files: Vec<&str> = Vec::new();
        files.extend(self.node_data.iter().map(|n| n.file_name.as_str()));
        files.extend(self.edge_data.iter().map(|e| e.file_name.as_str()));
        if let Some(graph) = &self.graph_data {
            files.push(graph.file_name.as_str());
        }
        files
    }
}

/// Parse and validate manifest text.
pub fn parse_manifest_str(text: &str) -> Result<Manifest> {
    let manifest: Manifest =
        serde_yaml::from_str(text).map_err(|e| DataError::Schema(e.to_string()))?;
    manifest.validate()?;
    Ok(manifest)
}

/// Read, parse and validate the manifest at `path`.
pub fn load_manifest(path: &Path) -> Result<Manifest> {
    let text = std::fs::read_to_string(path).map_err(|e| DataError::io(path, e))?;
    parse_manifest_str(&text)
}
