//! Link-prediction splits over one edge type.
//!
//! Positive edges are partitioned by `floor` sizes (test takes the
//! remainder). Negatives are node pairs that are not edges of the full
//! graph, drawn by rejection sampling with a bounded number of attempts:
//! the sampler may return fewer than requested but never more.

use crate::node::{mask_indices, validate_ratio, TEST_MASK, TRAIN_MASK, VAL_MASK};
use ahash::AHashSet;
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use tabgraph_graph::{Csr, EdgeArrays, HeteroGraph};
use tabgraph_schema::{DataError, EdgeType, Result};

/// Draws allowed per requested negative before giving up.
const ATTEMPTS_PER_NEGATIVE: usize = 3;
const MIN_ATTEMPTS: usize = 100;

/// `[train, val, test]` positive-edge counts for `m` edges.
pub fn link_split_sizes(m: usize, ratio: [f64; 3]) -> [usize; 3] {
    let train = ((ratio[0] * m as f64).floor() as usize).min(m);
    let val = ((ratio[1] * m as f64).floor() as usize).min(m - train);
    [train, val, m - train - val]
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkPredSplit {
    /// Edge ids of `etype` kept in the training graph.
    pub train_eids: Vec<usize>,
    pub val_pos: EdgeArrays,
    pub val_neg: EdgeArrays,
    pub test_pos: EdgeArrays,
    pub test_neg: EdgeArrays,
}

impl LinkPredSplit {
    /// Split the edges of `etype` by `ratio` with `neg_ratio` negatives per
    /// held-out positive.
    pub fn generate<R: Rng>(
        graph: &HeteroGraph,
        etype: &EdgeType,
        ratio: [f64; 3],
        neg_ratio: usize,
        rng: &mut R,
    ) -> Result<Self> {
        validate_ratio(ratio)?;
        let (src, _) = edges_of(graph, etype)?;
        let m = src.len();
        if m == 0 {
            return Err(DataError::InvalidSplit(format!("edge type {etype} has no edges")));
        }

        let mut perm: Vec<usize> = (0..m).collect();
        perm.shuffle(rng);
        let [train, val, _] = link_split_sizes(m, ratio);
        let mut train_eids = perm[..train].to_vec();
        train_eids.sort_unstable();
        let val_eids = &perm[train..train + val];
        let test_eids = &perm[train + val..];

        Self::assemble(graph, etype, train_eids, val_eids, test_eids, neg_ratio, rng)
    }

    /// Use the `train_mask`/`val_mask`/`test_mask` edge features already on
    /// `etype`.
    pub fn from_masks<R: Rng>(
        graph: &HeteroGraph,
        etype: &EdgeType,
        neg_ratio: usize,
        rng: &mut R,
    ) -> Result<Self> {
        let data = graph
            .edge_features(etype)
            .ok_or_else(|| DataError::InvalidSplit(format!("unknown edge type {etype}")))?;
        let mask = |name: &str| {
            data.get(name)
                .and_then(|f| f.as_bool())
                .map(mask_indices)
                .ok_or_else(|| {
                    DataError::InvalidSplit(format!(
                        "edge type {etype} has no boolean `{name}` feature; pass a split ratio"
                    ))
                })
        };
        let train_eids = mask(TRAIN_MASK)?;
        let val_eids = mask(VAL_MASK)?;
        let test_eids = mask(TEST_MASK)?;
        Self::assemble(graph, etype, train_eids, &val_eids, &test_eids, neg_ratio, rng)
    }

    fn assemble<R: Rng>(
        graph: &HeteroGraph,
        etype: &EdgeType,
        train_eids: Vec<usize>,
        val_eids: &[usize],
        test_eids: &[usize],
        neg_ratio: usize,
        rng: &mut R,
    ) -> Result<Self> {
        let (src, dst) = edges_of(graph, etype)?;
        let pairs = |eids: &[usize]| -> EdgeArrays {
            (
                eids.iter().map(|&e| src[e]).collect(),
                eids.iter().map(|&e| dst[e]).collect(),
            )
        };

        let mut sampler = NegativeSampler::new(graph, etype)?;
        let val_neg = sampler.sample(val_eids.len() * neg_ratio, rng);
        let test_neg = sampler.sample(test_eids.len() * neg_ratio, rng);

        tracing::debug!(
            %etype,
            train = train_eids.len(),
            val = val_eids.len(),
            test = test_eids.len(),
            val_neg = val_neg.0.len(),
            test_neg = test_neg.0.len(),
            "link prediction split"
        );
        Ok(Self {
            train_eids,
            val_pos: pairs(val_eids),
            val_neg,
            test_pos: pairs(test_eids),
            test_neg,
        })
    }

    /// `[train, val, test]` positive counts.
    pub fn positive_counts(&self) -> [usize; 3] {
        [self.train_eids.len(), self.val_pos.0.len(), self.test_pos.0.len()]
    }
}

fn edges_of<'g>(graph: &'g HeteroGraph, etype: &EdgeType) -> Result<(&'g [usize], &'g [usize])> {
    graph
        .edges(etype)
        .ok_or_else(|| DataError::InvalidSplit(format!("unknown edge type {etype}")))
}

/// Uniform sampler of non-edges of one edge type. Pairs already returned
/// are never returned again.
pub struct NegativeSampler {
    adjacency: Csr,
    num_src: usize,
    num_dst: usize,
    exclude_self_loops: bool,
    seen: AHashSet<(usize, usize)>,
}

impl NegativeSampler {
    pub fn new(graph: &HeteroGraph, etype: &EdgeType) -> Result<Self> {
        let adjacency = graph
            .out_adjacency(etype)
            .ok_or_else(|| DataError::InvalidSplit(format!("unknown edge type {etype}")))?;
        Ok(Self {
            adjacency,
            num_src: graph.num_nodes(&etype.src_type),
            num_dst: graph.num_nodes(&etype.dst_type),
            exclude_self_loops: etype.src_type == etype.dst_type,
            seen: AHashSet::new(),
        })
    }

    /// Up to `count` fresh negative pairs.
    pub fn sample<R: Rng>(&mut self, count: usize, rng: &mut R) -> EdgeArrays {
        let mut out: EdgeArrays = (Vec::with_capacity(count), Vec::with_capacity(count));
        if count == 0 || self.num_src == 0 || self.num_dst == 0 {
            return out;
        }

        let max_attempts = count.saturating_mul(ATTEMPTS_PER_NEGATIVE).max(MIN_ATTEMPTS);
        let mut attempts = 0;
        while out.0.len() < count && attempts < max_attempts {
            attempts += 1;
            let u = rng.gen_range(0..self.num_src);
            let v = rng.gen_range(0..self.num_dst);
            if self.exclude_self_loops && u == v {
                continue;
            }
            if self.adjacency.has_edge(u, v) || !self.seen.insert((u, v)) {
                continue;
            }
            out.0.push(u);
            out.1.push(v);
        }

        if out.0.len() < count {
            tracing::warn!(
                requested = count,
                sampled = out.0.len(),
                "negative sampling stopped early"
            );
        }
        out
    }
}
