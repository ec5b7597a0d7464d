//! Tabgraph graph construction
//!
//! Turns node/edge/graph records into graphs:
//!
//! 1. **Id remapping** (`id_map`): arbitrary external ids, duplicated and
//!    unordered, become dense `0..n` indices per `(type, graph_id)`.
//! 2. **Partitioning** (`construct`): one graph per graph id, ascending.
//! 3. **Storage** (`graph`): the [`GraphSink`] contract and the default
//!    [`HeteroGraph`], with [`Csr`] adjacency views.

pub mod construct;
pub mod csr;
pub mod graph;
pub mod id_map;

pub use construct::{construct_graphs, GraphConstructor};
pub use csr::Csr;
pub use graph::{EdgeArrays, EdgeStore, GraphSink, HeteroGraph, HeteroGraphSink, NodeStore};
pub use id_map::{first_occurrences, IdMap};
