//! Tabgraph split assigners
//!
//! - `node`: seeded train/val/test node masks
//! - `link`: positive edge partition plus sampled negative pairs
//! - `persist`: saved splits keyed by dataset signature and parameters
//! - `tasks`: [`AsNodePred`] and [`AsLinkPred`] views over a [`CsvDataset`]
//!
//! [`CsvDataset`]: tabgraph_storage::CsvDataset

pub mod link;
pub mod node;
pub mod persist;
pub mod tasks;

pub use link::{link_split_sizes, LinkPredSplit, NegativeSampler};
pub use node::{
    add_node_pred_split, apply_node_split, node_split_sizes, process_seed, validate_ratio,
    NodePredSplitter, NodeSplit, TEST_MASK, TRAIN_MASK, VAL_MASK,
};
pub use persist::{LinkSplitRecord, NodeSplitRecord, LINK_SPLIT_FILE, NODE_SPLIT_FILE};
pub use tasks::{AsLinkPred, AsNodePred, SplitOptions, LABEL_FEATURE};
