//! Task views over a loaded [`CsvDataset`].
//!
//! [`AsNodePred`] attaches node masks to every graph; [`AsLinkPred`] turns a
//! single-graph dataset into a training graph plus held-out positive and
//! negative pairs. Both reuse a saved split when the dataset signature and
//! split parameters are unchanged.

use crate::link::LinkPredSplit;
use crate::node::{apply_node_split, process_seed, resolve_ntype, NodePredSplitter, NodeSplit};
use crate::persist::{
    load_record, store_record, LinkSplitRecord, NodeSplitRecord, LINK_SPLIT_FILE, NODE_SPLIT_FILE,
};
use ahash::AHashSet;
use rand::rngs::StdRng;
use rand::SeedableRng;
use tabgraph_graph::{EdgeArrays, HeteroGraph};
use tabgraph_ingest_csv::Feature;
use tabgraph_schema::{DataError, EdgeType, Result};
use tabgraph_storage::CsvDataset;

/// Column holding class labels for [`AsNodePred::num_classes`].
pub const LABEL_FEATURE: &str = "label";

#[derive(Debug, Clone, Default)]
pub struct SplitOptions {
    /// Ignore any saved split.
    pub force_reload: bool,
    /// Fixed seed; the process-wide seed when unset.
    pub seed: Option<u64>,
}

impl SplitOptions {
    pub fn force_reload(mut self, force: bool) -> Self {
        self.force_reload = force;
        self
    }

    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }
}

// ============================================================================
// Node prediction
// ============================================================================

#[derive(Debug)]
pub struct AsNodePred {
    dataset: CsvDataset,
    ratio: [f64; 3],
    ntype: String,
    splits: Vec<NodeSplit>,
    num_classes: Option<usize>,
    reused: bool,
}

impl AsNodePred {
    pub fn new(
        mut dataset: CsvDataset,
        ratio: [f64; 3],
        ntype: Option<&str>,
        options: SplitOptions,
    ) -> Result<Self> {
        crate::node::validate_ratio(ratio)?;
        let first = dataset
            .graph(0)
            .ok_or_else(|| DataError::InvalidSplit("dataset has no graphs".to_string()))?;
        let ntype = resolve_ntype(first, ntype)?;
        let node_counts: Vec<usize> = dataset.graphs().iter().map(|g| g.num_nodes(&ntype)).collect();
        if node_counts.iter().all(|&n| n == 0) {
            return Err(DataError::InvalidSplit(format!("node type `{ntype}` has no nodes")));
        }

        let saved = if options.force_reload {
            None
        } else {
            load_record::<NodeSplitRecord>(dataset.save_dir(), NODE_SPLIT_FILE, dataset.signature())
                .filter(|r| r.matches(ratio, &ntype, &node_counts, options.seed))
        };
        let reused = saved.is_some();

        let splits = match saved {
            Some(record) => {
                tracing::info!(dataset = %dataset.name(), %ntype, "reusing saved node split");
                record.splits
            }
            None => {
                let splitter = options
                    .seed
                    .map(NodePredSplitter::with_seed)
                    .unwrap_or_default();
                let splits = node_counts
                    .iter()
                    .enumerate()
                    .map(|(i, &n)| match n {
                        0 => Ok(NodeSplit {
                            train: Vec::new(),
                            val: Vec::new(),
                            test: Vec::new(),
                        }),
                        _ => splitter.for_graph(i).split(n, ratio),
                    })
                    .collect::<Result<Vec<_>>>()?;
                let record = NodeSplitRecord {
                    ratio,
                    ntype: ntype.clone(),
                    node_counts,
                    seed: options.seed,
                    splits,
                };
                if let Err(e) = store_record(dataset.save_dir(), NODE_SPLIT_FILE, dataset.signature(), &record) {
                    tracing::warn!(error = %e, "failed to save node split");
                }
                tracing::info!(dataset = %dataset.name(), %ntype, ?ratio, "generated node split");
                record.splits
            }
        };

        for (graph, split) in dataset.graphs_mut().iter_mut().zip(&splits) {
            apply_node_split(graph, &ntype, split)?;
        }
        let num_classes = count_classes(dataset.graphs(), &ntype);

        Ok(Self {
            dataset,
            ratio,
            ntype,
            splits,
            num_classes,
            reused,
        })
    }

    pub fn len(&self) -> usize {
        self.dataset.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dataset.is_empty()
    }

    pub fn graph(&self, i: usize) -> Option<&HeteroGraph> {
        self.dataset.graph(i)
    }

    pub fn split(&self, i: usize) -> Option<&NodeSplit> {
        self.splits.get(i)
    }

    pub fn ratio(&self) -> [f64; 3] {
        self.ratio
    }

    pub fn target_ntype(&self) -> &str {
        &self.ntype
    }

    /// Distinct values of the target type's `label` column, if it has one.
    pub fn num_classes(&self) -> Option<usize> {
        self.num_classes
    }

    /// True when the split was read back rather than generated.
    pub fn reused_saved_split(&self) -> bool {
        self.reused
    }

    pub fn dataset(&self) -> &CsvDataset {
        &self.dataset
    }

    pub fn into_dataset(self) -> CsvDataset {
        self.dataset
    }
}

fn count_classes(graphs: &[HeteroGraph], ntype: &str) -> Option<usize> {
    let mut ints = AHashSet::new();
    let mut floats = AHashSet::new();
    let mut bools = AHashSet::new();
    for graph in graphs {
        match graph.node_features(ntype)?.get(LABEL_FEATURE) {
            None if graph.num_nodes(ntype) == 0 => {}
            None => return None,
            Some(Feature::Int(v)) => ints.extend(v.iter().copied()),
            Some(Feature::Float(v)) => floats.extend(v.iter().map(|x| x.to_bits())),
            Some(Feature::Bool(v)) => bools.extend(v.iter().copied()),
            Some(_) => return None,
        }
    }
    Some(ints.len() + floats.len() + bools.len())
}

// ============================================================================
// Link prediction
// ============================================================================

#[derive(Debug)]
pub struct AsLinkPred {
    dataset: CsvDataset,
    etype: EdgeType,
    split: LinkPredSplit,
    train_graph: HeteroGraph,
    reused: bool,
}

impl AsLinkPred {
    /// With `split_ratio == None` the edge type's own
    /// `train_mask`/`val_mask`/`test_mask` features define the split.
    pub fn new(
        dataset: CsvDataset,
        split_ratio: Option<[f64; 3]>,
        neg_ratio: usize,
        etype: Option<EdgeType>,
        options: SplitOptions,
    ) -> Result<Self> {
        let graph = match dataset.graphs() {
            [graph] => graph,
            graphs => {
                return Err(DataError::InvalidSplit(format!(
                    "link prediction needs a single-graph dataset, found {} graphs",
                    graphs.len()
                )))
            }
        };
        let etype = resolve_etype(graph, etype)?;
        let edge_count = graph.num_edges(&etype);

        let saved = if options.force_reload {
            None
        } else {
            load_record::<LinkSplitRecord>(dataset.save_dir(), LINK_SPLIT_FILE, dataset.signature())
                .filter(|r| r.matches(split_ratio, neg_ratio, &etype, edge_count, options.seed))
        };
        let reused = saved.is_some();

        let split = match saved {
            Some(record) => {
                tracing::info!(dataset = %dataset.name(), %etype, "reusing saved link split");
                record.split
            }
            None => {
                let mut rng = StdRng::seed_from_u64(options.seed.unwrap_or_else(process_seed));
                let split = match split_ratio {
                    Some(ratio) => LinkPredSplit::generate(graph, &etype, ratio, neg_ratio, &mut rng)?,
                    None => LinkPredSplit::from_masks(graph, &etype, neg_ratio, &mut rng)?,
                };
                let record = LinkSplitRecord {
                    ratio: split_ratio,
                    neg_ratio,
                    etype: etype.clone(),
                    edge_count,
                    seed: options.seed,
                    split,
                };
                if let Err(e) = store_record(dataset.save_dir(), LINK_SPLIT_FILE, dataset.signature(), &record) {
                    tracing::warn!(error = %e, "failed to save link split");
                }
                tracing::info!(dataset = %dataset.name(), %etype, ?split_ratio, neg_ratio, "generated link split");
                record.split
            }
        };

        let train_graph = graph.edge_subgraph(&etype, &split.train_eids)?;
        Ok(Self {
            dataset,
            etype,
            split,
            train_graph,
            reused,
        })
    }

    /// The full graph with only the training edges of the target type.
    pub fn train_graph(&self) -> &HeteroGraph {
        &self.train_graph
    }

    /// `(positive pairs, negative pairs)` for validation.
    pub fn val_edges(&self) -> (&EdgeArrays, &EdgeArrays) {
        (&self.split.val_pos, &self.split.val_neg)
    }

    /// `(positive pairs, negative pairs)` for testing.
    pub fn test_edges(&self) -> (&EdgeArrays, &EdgeArrays) {
        (&self.split.test_pos, &self.split.test_neg)
    }

    pub fn split(&self) -> &LinkPredSplit {
        &self.split
    }

    pub fn target_etype(&self) -> &EdgeType {
        &self.etype
    }

    pub fn reused_saved_split(&self) -> bool {
        self.reused
    }

    pub fn dataset(&self) -> &CsvDataset {
        &self.dataset
    }
}

fn resolve_etype(graph: &HeteroGraph, etype: Option<EdgeType>) -> Result<EdgeType> {
    let known = graph.canonical_etypes();
    match etype {
        Some(t) if known.contains(&&t) => Ok(t),
        Some(t) => Err(DataError::InvalidSplit(format!("unknown edge type {t}"))),
        None => match known.as_slice() {
            [only] => Ok((*only).clone()),
            _ => Err(DataError::InvalidSplit(
                "edge type is required for graphs with several edge types".to_string(),
            )),
        },
    }
}
