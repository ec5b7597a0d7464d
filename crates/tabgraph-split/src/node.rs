//! Node-prediction splits: three disjoint boolean masks over one node type.
//!
//! Sizes come from the ratio alone (`val = round(r1 * n)`,
//! `test = round(r2 * n)`, train takes the rest). Membership comes from a
//! seeded permutation, so equal seeds give equal splits.

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;
use tabgraph_graph::HeteroGraph;
use tabgraph_ingest_csv::Feature;
use tabgraph_schema::{DataError, Result};

pub const TRAIN_MASK: &str = "train_mask";
pub const VAL_MASK: &str = "val_mask";
pub const TEST_MASK: &str = "test_mask";

const RATIO_TOLERANCE: f64 = 1e-6;

/// Seed drawn once per process.
pub fn process_seed() -> u64 {
    static SEED: OnceLock<u64> = OnceLock::new();
    *SEED.get_or_init(rand::random)
}

/// Ratios must be non-negative and sum to 1.
pub fn validate_ratio(ratio: [f64; 3]) -> Result<()> {
    if ratio.iter().any(|r| !r.is_finite() || *r < 0.0) {
        return Err(DataError::InvalidSplit(format!(
            "split ratios must be non-negative, got {ratio:?}"
        )));
    }
    let sum: f64 = ratio.iter().sum();
    if (sum - 1.0).abs() > RATIO_TOLERANCE {
        return Err(DataError::InvalidSplit(format!(
            "split ratios must sum to 1, got {ratio:?} (sum {sum})"
        )));
    }
    Ok(())
}

/// `[train, val, test]` sizes for `n` nodes.
pub fn node_split_sizes(n: usize, ratio: [f64; 3]) -> [usize; 3] {
    let val = ((ratio[1] * n as f64).round() as usize).min(n);
    let test = ((ratio[2] * n as f64).round() as usize).min(n - val);
    [n - val - test, val, test]
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeSplit {
    pub train: Vec<bool>,
    pub val: Vec<bool>,
    pub test: Vec<bool>,
}

impl NodeSplit {
    pub fn len(&self) -> usize {
        self.train.len()
    }

    pub fn is_empty(&self) -> bool {
        self.train.is_empty()
    }

    /// `[train, val, test]` true counts.
    pub fn counts(&self) -> [usize; 3] {
        let count = |m: &[bool]| m.iter().filter(|&&b| b).count();
        [count(&self.train), count(&self.val), count(&self.test)]
    }

    pub fn train_idx(&self) -> Vec<usize> {
        mask_indices(&self.train)
    }

    pub fn val_idx(&self) -> Vec<usize> {
        mask_indices(&self.val)
    }

    pub fn test_idx(&self) -> Vec<usize> {
        mask_indices(&self.test)
    }
}

pub(crate) fn mask_indices(mask: &[bool]) -> Vec<usize> {
    mask.iter()
        .enumerate()
        .filter_map(|(i, &b)| b.then_some(i))
        .collect()
}

#[derive(Debug, Clone)]
pub struct NodePredSplitter {
    seed: u64,
}

impl Default for NodePredSplitter {
    fn default() -> Self {
        Self::new()
    }
}

impl NodePredSplitter {
    /// Splitter on the process-wide seed.
    pub fn new() -> Self {
        Self {
            seed: process_seed(),
        }
    }

    pub fn with_seed(seed: u64) -> Self {
        Self { seed }
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Splitter for the `i`-th graph of a dataset; graph 0 keeps this seed.
    pub fn for_graph(&self, i: usize) -> Self {
        Self::with_seed(self.seed.wrapping_add((i as u64).wrapping_mul(0x9E37_79B9_7F4A_7C15)))
    }

    /// Draw a fresh seed; later splits get new membership.
    pub fn reshuffle(&mut self) {
        self.seed = rand::random();
    }

    pub fn split(&self, n: usize, ratio: [f64; 3]) -> Result<NodeSplit> {
        validate_ratio(ratio)?;
        if n == 0 {
            return Err(DataError::InvalidSplit("cannot split zero nodes".to_string()));
        }
        let [train, val, _] = node_split_sizes(n, ratio);

        let mut perm: Vec<usize> = (0..n).collect();
        perm.shuffle(&mut StdRng::seed_from_u64(self.seed));

        let mut split = NodeSplit {
            train: vec![false; n],
            val: vec![false; n],
            test: vec![false; n],
        };
        for (rank, &node) in perm.iter().enumerate() {
            if rank < train {
                split.train[node] = true;
            } else if rank < train + val {
                split.val[node] = true;
            } else {
                split.test[node] = true;
            }
        }
        Ok(split)
    }
}

/// Resolve the node type to split: explicit, or the graph's only one.
pub fn resolve_ntype(graph: &HeteroGraph, ntype: Option<&str>) -> Result<String> {
    match ntype {
        Some(t) if graph.ntypes().contains(&t) => Ok(t.to_string()),
        Some(t) => Err(DataError::InvalidSplit(format!("unknown node type `{t}`"))),
        None => match graph.ntypes().as_slice() {
            [only] => Ok(only.to_string()),
            _ => Err(DataError::InvalidSplit(
                "node type is required for graphs with several node types".to_string(),
            )),
        },
    }
}

/// Write `split` as `train_mask`/`val_mask`/`test_mask` on `ntype`,
/// replacing any existing masks.
pub fn apply_node_split(graph: &mut HeteroGraph, ntype: &str, split: &NodeSplit) -> Result<()> {
    let count = graph.num_nodes(ntype);
    if split.len() != count {
        return Err(DataError::shape(format!("node split for {ntype}"), count, split.len()));
    }
    let data = graph
        .node_features_mut(ntype)
        .ok_or_else(|| DataError::InvalidSplit(format!("unknown node type `{ntype}`")))?;
    data.insert(TRAIN_MASK.to_string(), Feature::Bool(split.train.clone()));
    data.insert(VAL_MASK.to_string(), Feature::Bool(split.val.clone()));
    data.insert(TEST_MASK.to_string(), Feature::Bool(split.test.clone()));
    Ok(())
}

/// Split one node type of `graph` and attach the masks.
pub fn add_node_pred_split(
    graph: &mut HeteroGraph,
    ratio: [f64; 3],
    ntype: Option<&str>,
    splitter: &NodePredSplitter,
) -> Result<NodeSplit> {
    let ntype = resolve_ntype(graph, ntype)?;
    let split = splitter.split(graph.num_nodes(&ntype), ratio)?;
    apply_node_split(graph, &ntype, &split)?;
    Ok(split)
}
