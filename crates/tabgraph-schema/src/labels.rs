//! Node and edge type labels.
//!
//! `_V` and `_E` are ordinary labels: they take part in equality, ordering and
//! uniqueness checks exactly like user-supplied ones.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Node type of a dataset with a single, unnamed node type.
pub const DEFAULT_NTYPE: &str = "_V";

/// Edge label of a dataset with a single, unnamed edge type.
pub const DEFAULT_ETYPE_LABEL: &str = "_E";

/// Canonical edge type: `(src_type, edge_label, dst_type)`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "[String; 3]", into = "[String; 3]")]
pub struct EdgeType {
    pub src_type: String,
    pub edge_label: String,
    pub dst_type: String,
}

impl EdgeType {
    pub fn new(
        src_type: impl Into<String>,
        edge_label: impl Into<String>,
        dst_type: impl Into<String>,
    ) -> Self {
        Self {
            src_type: src_type.into(),
            edge_label: edge_label.into(),
            dst_type: dst_type.into(),
        }
    }

    /// `(_V, _E, _V)`
    pub fn default_type() -> Self {
        Self::new(DEFAULT_NTYPE, DEFAULT_ETYPE_LABEL, DEFAULT_NTYPE)
    }

    pub fn is_default(&self) -> bool {
        self.src_type == DEFAULT_NTYPE
            && self.edge_label == DEFAULT_ETYPE_LABEL
            && self.dst_type == DEFAULT_NTYPE
    }
}

impl Default for EdgeType {
    fn default() -> Self {
        Self::default_type()
    }
}

impl From<[String; 3]> for EdgeType {
    fn from([src_type, edge_label, dst_type]: [String; 3]) -> Self {
        Self {
            src_type,
            edge_label,
            dst_type,
        }
    }
}

impl From<EdgeType> for [String; 3] {
    fn from(etype: EdgeType) -> Self {
        [etype.src_type, etype.edge_label, etype.dst_type]
    }
}

impl From<(&str, &str, &str)> for EdgeType {
    fn from((src, label, dst): (&str, &str, &str)) -> Self {
        Self::new(src, label, dst)
    }
}

impl fmt::Display for EdgeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "({}, {}, {})",
            self.src_type, self.edge_label, self.dst_type
        )
    }
}
