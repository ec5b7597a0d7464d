//! Graph sink contract and the default heterograph.
//!
//! The constructor never builds graph structures itself; it hands per-type
//! node counts and remapped edge arrays to a [`GraphSink`], then attaches
//! feature columns through the sink's hooks.

use crate::csr::Csr;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tabgraph_ingest_csv::FeatureMap;
use tabgraph_schema::{DataError, EdgeType, Result, DEFAULT_NTYPE};

/// Remapped edge endpoints of one edge type: `(src, dst)` dense indices.
pub type EdgeArrays = (Vec<usize>, Vec<usize>);

pub trait GraphSink {
    type Graph;

    fn build(
        &self,
        node_counts: &BTreeMap<String, usize>,
        edges: BTreeMap<EdgeType, EdgeArrays>,
    ) -> Result<Self::Graph>;

    fn attach_node_features(&self, graph: &mut Self::Graph, ntype: &str, data: FeatureMap) -> Result<()>;

    fn attach_edge_features(
        &self,
        graph: &mut Self::Graph,
        etype: &EdgeType,
        data: FeatureMap,
    ) -> Result<()>;
}

/// Sink producing [`HeteroGraph`].
#[derive(Debug, Clone, Copy, Default)]
pub struct HeteroGraphSink;

impl GraphSink for HeteroGraphSink {
    type Graph = HeteroGraph;

    fn build(
        &self,
        node_counts: &BTreeMap<String, usize>,
        edges: BTreeMap<EdgeType, EdgeArrays>,
    ) -> Result<HeteroGraph> {
        HeteroGraph::from_parts(node_counts, edges)
    }

    fn attach_node_features(&self, graph: &mut HeteroGraph, ntype: &str, data: FeatureMap) -> Result<()> {
        graph.set_node_features(ntype, data)
    }

    fn attach_edge_features(&self, graph: &mut HeteroGraph, etype: &EdgeType, data: FeatureMap) -> Result<()> {
        graph.set_edge_features(etype, data)
    }
}

// ============================================================================
// HeteroGraph
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NodeStore {
    pub count: usize,
    pub data: FeatureMap,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EdgeStore {
    pub src: Vec<usize>,
    pub dst: Vec<usize>,
    pub data: FeatureMap,
}

/// Typed multigraph: per node type a dense index space, per edge type an
/// edge list into those spaces, plus feature columns on both.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HeteroGraph {
    nodes: BTreeMap<String, NodeStore>,
    edges: BTreeMap<EdgeType, EdgeStore>,
}

impl HeteroGraph {
    /// Every edge type's endpoint types must be declared in `node_counts`
    /// and every endpoint must be in range.
    pub fn from_parts(
        node_counts: &BTreeMap<String, usize>,
        edges: BTreeMap<EdgeType, EdgeArrays>,
    ) -> Result<Self> {
        let nodes: BTreeMap<String, NodeStore> = node_counts
            .iter()
            .map(|(ntype, &count)| {
                (
                    ntype.clone(),
                    NodeStore {
                        count,
                        data: FeatureMap::new(),
                    },
                )
            })
            .collect();

        let mut stores = BTreeMap::new();
        for (etype, (src, dst)) in edges {
            if src.len() != dst.len() {
                return Err(DataError::shape(format!("edge type {etype} dst"), src.len(), dst.len()));
            }
            check_endpoints(&nodes, &etype, &etype.src_type, &src)?;
            check_endpoints(&nodes, &etype, &etype.dst_type, &dst)?;
            stores.insert(
                etype,
                EdgeStore {
                    src,
                    dst,
                    data: FeatureMap::new(),
                },
            );
        }

        Ok(Self {
            nodes,
            edges: stores,
        })
    }

    pub fn num_nodes(&self, ntype: &str) -> usize {
        self.nodes.get(ntype).map(|n| n.count).unwrap_or(0)
    }

    pub fn num_edges(&self, etype: &EdgeType) -> usize {
        self.edges.get(etype).map(|e| e.src.len()).unwrap_or(0)
    }

    pub fn total_nodes(&self) -> usize {
        self.nodes.values().map(|n| n.count).sum()
    }

    pub fn total_edges(&self) -> usize {
        self.edges.values().map(|e| e.src.len()).sum()
    }

    pub fn ntypes(&self) -> Vec<&str> {
        self.nodes.keys().map(String::as_str).collect()
    }

    pub fn canonical_etypes(&self) -> Vec<&EdgeType> {
        self.edges.keys().collect()
    }

    /// Exactly one node type `_V` and one edge type `(_V, _E, _V)`.
    pub fn is_homogeneous(&self) -> bool {
        self.nodes.len() == 1
            && self.nodes.contains_key(DEFAULT_NTYPE)
            && self.edges.len() == 1
            && self.edges.keys().all(EdgeType::is_default)
    }

    pub fn node_features(&self, ntype: &str) -> Option<&FeatureMap> {
        self.nodes.get(ntype).map(|n| &n.data)
    }

    pub fn node_features_mut(&mut self, ntype: &str) -> Option<&mut FeatureMap> {
        self.nodes.get_mut(ntype).map(|n| &mut n.data)
    }

    pub fn edge_features(&self, etype: &EdgeType) -> Option<&FeatureMap> {
        self.edges.get(etype).map(|e| &e.data)
    }

    pub fn edge_features_mut(&mut self, etype: &EdgeType) -> Option<&mut FeatureMap> {
        self.edges.get_mut(etype).map(|e| &mut e.data)
    }

    /// `(src, dst)` endpoint arrays in original row order.
    pub fn edges(&self, etype: &EdgeType) -> Option<(&[usize], &[usize])> {
        self.edges
            .get(etype)
            .map(|e| (e.src.as_slice(), e.dst.as_slice()))
    }

    /// Replace the feature map of `ntype`; every column must have one row per node.
    pub fn set_node_features(&mut self, ntype: &str, data: FeatureMap) -> Result<()> {
        let store = self
            .nodes
            .get_mut(ntype)
            .ok_or_else(|| DataError::Reference(format!("unknown node type `{ntype}`")))?;
        for (name, feature) in &data {
            if feature.len() != store.count {
                return Err(DataError::shape(
                    format!("node type {ntype} feature `{name}`"),
                    store.count,
                    feature.len(),
                ));
            }
        }
        store.data = data;
        Ok(())
    }

    /// Replace the feature map of `etype`; every column must have one row per edge.
    pub fn set_edge_features(&mut self, etype: &EdgeType, data: FeatureMap) -> Result<()> {
        let store = self
            .edges
            .get_mut(etype)
            .ok_or_else(|| DataError::Reference(format!("unknown edge type {etype}")))?;
        for (name, feature) in &data {
            if feature.len() != store.src.len() {
                return Err(DataError::shape(
                    format!("edge type {etype} feature `{name}`"),
                    store.src.len(),
                    feature.len(),
                ));
            }
        }
        store.data = data;
        Ok(())
    }

    /// Adjacency keyed by source node.
    pub fn out_adjacency(&self, etype: &EdgeType) -> Option<Csr> {
        let e = self.edges.get(etype)?;
        Some(Csr::from_edges(self.num_nodes(&etype.src_type), &e.src, &e.dst))
    }

    /// Adjacency keyed by destination node.
    pub fn in_adjacency(&self, etype: &EdgeType) -> Option<Csr> {
        let e = self.edges.get(etype)?;
        Some(Csr::from_edges(self.num_nodes(&etype.dst_type), &e.dst, &e.src))
    }

    pub fn out_degrees(&self, etype: &EdgeType) -> Option<Vec<usize>> {
        self.out_adjacency(etype).map(|csr| csr.degrees())
    }

    pub fn in_degrees(&self, etype: &EdgeType) -> Option<Vec<usize>> {
        self.in_adjacency(etype).map(|csr| csr.degrees())
    }

    /// Keep only the listed edges of `etype` (with their features), in the
    /// order given. Nodes and all other edge types are kept whole.
    pub fn edge_subgraph(&self, etype: &EdgeType, edge_ids: &[usize]) -> Result<HeteroGraph> {
        let store = self
            .edges
            .get(etype)
            .ok_or_else(|| DataError::Reference(format!("unknown edge type {etype}")))?;
        if let Some(&bad) = edge_ids.iter().find(|&&e| e >= store.src.len()) {
            return Err(DataError::Reference(format!(
                "edge id {bad} out of range for edge type {etype} ({} edges)",
                store.src.len()
            )));
        }
        let kept = EdgeStore {
            src: edge_ids.iter().map(|&e| store.src[e]).collect(),
            dst: edge_ids.iter().map(|&e| store.dst[e]).collect(),
            data: store
                .data
                .iter()
                .map(|(name, feature)| (name.clone(), feature.gather(edge_ids)))
                .collect(),
        };
        let mut graph = self.clone();
        graph.edges.insert(etype.clone(), kept);
        Ok(graph)
    }
}

fn check_endpoints(
    nodes: &BTreeMap<String, NodeStore>,
    etype: &EdgeType,
    ntype: &str,
    endpoints: &[usize],
) -> Result<()> {
    let count = nodes
        .get(ntype)
        .map(|n| n.count)
        .ok_or_else(|| DataError::Reference(format!("edge type {etype} uses unknown node type `{ntype}`")))?;
    if let Some(&bad) = endpoints.iter().find(|&&i| i >= count) {
        return Err(DataError::Reference(format!(
            "edge type {etype}: node index {bad} out of range for `{ntype}` ({count} nodes)"
        )));
    }
    Ok(())
}
