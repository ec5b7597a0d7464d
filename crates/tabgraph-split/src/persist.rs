//! Split artifacts saved next to the dataset cache.
//!
//! Each artifact carries the dataset signature in its header and the split
//! parameters (seed included) in its payload; a split is reused only when
//! both match.

use crate::link::LinkPredSplit;
use crate::node::NodeSplit;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::path::Path;
use tabgraph_schema::{EdgeType, Result};
use tabgraph_storage::CacheController;

pub const NODE_SPLIT_FILE: &str = "node_pred_split.cbor";
pub const LINK_SPLIT_FILE: &str = "link_pred_split.cbor";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeSplitRecord {
    pub ratio: [f64; 3],
    pub ntype: String,
    /// Node count of `ntype` in each graph.
    pub node_counts: Vec<usize>,
    /// Seed the split was drawn with; `None` for the process-wide seed.
    pub seed: Option<u64>,
    pub splits: Vec<NodeSplit>,
}

impl NodeSplitRecord {
    pub fn matches(
        &self,
        ratio: [f64; 3],
        ntype: &str,
        node_counts: &[usize],
        seed: Option<u64>,
    ) -> bool {
        self.ratio == ratio
            && self.ntype == ntype
            && self.node_counts == node_counts
            && self.seed == seed
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinkSplitRecord {
    /// `None` when the split came from the edge masks.
    pub ratio: Option<[f64; 3]>,
    pub neg_ratio: usize,
    pub etype: EdgeType,
    pub edge_count: usize,
    pub seed: Option<u64>,
    pub split: LinkPredSplit,
}

impl LinkSplitRecord {
    pub fn matches(
        &self,
        ratio: Option<[f64; 3]>,
        neg_ratio: usize,
        etype: &EdgeType,
        edge_count: usize,
        seed: Option<u64>,
    ) -> bool {
        self.ratio == ratio
            && self.neg_ratio == neg_ratio
            && &self.etype == etype
            && self.edge_count == edge_count
            && self.seed == seed
    }
}

pub(crate) fn load_record<T: DeserializeOwned>(
    save_dir: &Path,
    file: &str,
    signature: &str,
) -> Option<T> {
    CacheController::at(save_dir.join(file)).load(signature)
}

pub(crate) fn store_record<T: Serialize>(
    save_dir: &Path,
    file: &str,
    signature: &str,
    record: &T,
) -> Result<()> {
    CacheController::at(save_dir.join(file)).store(signature, record)
}
