//! Graph construction: records in, one graph per graph id out.
//!
//! Per node type, rows are partitioned by graph id and deduplicated by
//! external id, first occurrence wins. Each surviving id gets a dense index in
//! first-seen order within its `(type, graph_id)` partition; graph id scopes
//! identifier uniqueness. Edges are remapped through the partition of their
//! own graph id, in original row order, without dedup. Any dangling
//! reference aborts the whole construction.

use crate::graph::{EdgeArrays, GraphSink, HeteroGraph, HeteroGraphSink};
use crate::id_map::IdMap;
use std::collections::{BTreeMap, BTreeSet};
use tabgraph_ingest_csv::{EdgeData, Feature, FeatureMap, GraphData, NodeData};
use tabgraph_schema::{DataError, EdgeType, Result};

/// Rows kept by one partition, as `(group, row)` pairs in index order.
type RowRefs = Vec<(usize, usize)>;

#[derive(Debug, Default)]
struct NodePartition {
    ids: IdMap,
    rows: RowRefs,
}

#[derive(Debug, Default)]
struct EdgePartition {
    src: Vec<usize>,
    dst: Vec<usize>,
    rows: RowRefs,
}

/// Builds graphs through a [`GraphSink`].
#[derive(Debug, Clone, Default)]
pub struct GraphConstructor<S = HeteroGraphSink> {
    sink: S,
}

impl GraphConstructor<HeteroGraphSink> {
    pub fn new() -> Self {
        Self::default()
    }
}

impl<S: GraphSink> GraphConstructor<S> {
    pub fn with_sink(sink: S) -> Self {
        Self { sink }
    }

    /// Construct every graph found across `nodes` and `edges`.
    ///
    /// Returns the graphs in ascending graph-id order together with the
    /// graph-level features, aligned to that order. Without `graph` the
    /// feature map is empty.
    pub fn construct(
        &self,
        nodes: &[NodeData],
        edges: &[EdgeData],
        graph: Option<&GraphData>,
    ) -> Result<(Vec<S::Graph>, FeatureMap)> {
        // Node types in first-appearance order, each with its contributing groups.
        let node_groups = group_by(nodes, |n| n.ntype().to_string());
        let edge_groups = group_by(edges, |e| e.etype().clone());

        let mut node_parts: BTreeMap<&str, BTreeMap<i64, NodePartition>> = BTreeMap::new();
        for (ntype, groups) in &node_groups {
            let parts = node_parts.entry(ntype.as_str()).or_default();
            for (g, ndata) in groups.iter().enumerate() {
                for (row, (&id, &gid)) in ndata.id().iter().zip(ndata.graph_id()).enumerate() {
                    let part = parts.entry(gid).or_default();
                    if part.ids.insert(id).1 {
                        part.rows.push((g, row));
                    }
                }
            }
        }

        let mut edge_parts: BTreeMap<&EdgeType, BTreeMap<i64, EdgePartition>> = BTreeMap::new();
        for (etype, groups) in &edge_groups {
            let src_parts = node_parts.get(etype.src_type.as_str());
            let dst_parts = node_parts.get(etype.dst_type.as_str());
            let parts = edge_parts.entry(etype).or_default();
            for (g, edata) in groups.iter().enumerate() {
                for (row, ((&s, &d), &gid)) in edata
                    .src()
                    .iter()
                    .zip(edata.dst())
                    .zip(edata.graph_id())
                    .enumerate()
                {
                    let s_idx = resolve(src_parts, &etype.src_type, etype, gid, s)?;
                    let d_idx = resolve(dst_parts, &etype.dst_type, etype, gid, d)?;
                    let part = parts.entry(gid).or_default();
                    part.src.push(s_idx);
                    part.dst.push(d_idx);
                    part.rows.push((g, row));
                }
            }
        }

        let mut graph_ids: BTreeSet<i64> = BTreeSet::new();
        graph_ids.extend(node_parts.values().flat_map(|p| p.keys().copied()));
        graph_ids.extend(edge_parts.values().flat_map(|p| p.keys().copied()));

        let graph_rows = match graph {
            Some(gdata) => {
                let (first_rows, listed) = graph_rows_by_id(gdata);
                if let Some(missing) = graph_ids.iter().find(|gid| !listed.contains(*gid)) {
                    return Err(DataError::Reference(format!(
                        "graph id {missing} appears in node/edge data but not in the graph table"
                    )));
                }
                graph_ids.extend(listed);
                Some(first_rows)
            }
            None => None,
        };

        let empty_node_part = NodePartition::default();
        let empty_edge_part = EdgePartition::default();
        let mut graphs = Vec::with_capacity(graph_ids.len());
        for &gid in &graph_ids {
            let mut counts = BTreeMap::new();
            for (ntype, parts) in &node_parts {
                counts.insert(ntype.to_string(), parts.get(&gid).map_or(0, |p| p.ids.len()));
            }
            let mut arrays: BTreeMap<EdgeType, EdgeArrays> = BTreeMap::new();
            for (etype, parts) in &edge_parts {
                let (src, dst) = parts
                    .get(&gid)
                    .map(|p| (p.src.clone(), p.dst.clone()))
                    .unwrap_or_default();
                arrays.insert((*etype).clone(), (src, dst));
            }

            let mut built = self.sink.build(&counts, arrays)?;

            for (ntype, groups) in &node_groups {
                let part = node_parts
                    .get(ntype.as_str())
                    .and_then(|p| p.get(&gid))
                    .unwrap_or(&empty_node_part);
                let context = format!("node type {ntype} in graph {gid}");
                let data = gather_features(&context, groups, NodeData::data, &part.rows)?;
                self.sink.attach_node_features(&mut built, ntype, data)?;
            }
            for (etype, groups) in &edge_groups {
                let part = edge_parts
                    .get(etype)
                    .and_then(|p| p.get(&gid))
                    .unwrap_or(&empty_edge_part);
                let context = format!("edge type {etype} in graph {gid}");
                let data = gather_features(&context, groups, EdgeData::data, &part.rows)?;
                self.sink.attach_edge_features(&mut built, etype, data)?;
            }

            graphs.push(built);
        }

        let graph_features = match (graph, graph_rows) {
            (Some(gdata), Some(first_rows)) => {
                let rows: Vec<usize> = graph_ids
                    .iter()
                    .filter_map(|gid| first_rows.get(gid).copied())
                    .collect();
                gdata
                    .data()
                    .iter()
                    .map(|(name, feature)| (name.clone(), feature.gather(&rows)))
                    .collect()
            }
            _ => FeatureMap::new(),
        };

        tracing::debug!(
            graphs = graphs.len(),
            node_types = node_groups.len(),
            edge_types = edge_groups.len(),
            graph_features = graph_features.len(),
            "constructed graphs"
        );

        Ok((graphs, graph_features))
    }
}

/// Construct with the default [`HeteroGraph`] sink.
pub fn construct_graphs(
    nodes: &[NodeData],
    edges: &[EdgeData],
    graph: Option<&GraphData>,
) -> Result<(Vec<HeteroGraph>, FeatureMap)> {
    GraphConstructor::new().construct(nodes, edges, graph)
}

/// Group records by key, keys in first-appearance order.
fn group_by<'a, T, K: PartialEq>(items: &'a [T], key: impl Fn(&T) -> K) -> Vec<(K, Vec<&'a T>)> {
    let mut groups: Vec<(K, Vec<&'a T>)> = Vec::new();
    for item in items {
        let k = key(item);
        match groups.iter_mut().find(|(existing, _)| *existing == k) {
            Some((_, members)) => members.push(item),
            None => groups.push((k, vec![item])),
        }
    }
    groups
}

fn resolve(
    parts: Option<&BTreeMap<i64, NodePartition>>,
    ntype: &str,
    etype: &EdgeType,
    gid: i64,
    id: i64,
) -> Result<usize> {
    let parts = parts.ok_or_else(|| {
        DataError::Reference(format!("edge type {etype} references node type `{ntype}` with no node table"))
    })?;
    parts
        .get(&gid)
        .and_then(|p| p.ids.get(id))
        .ok_or_else(|| {
            DataError::Reference(format!(
                "edge type {etype} references node {id} of type `{ntype}` absent from graph {gid}"
            ))
        })
}

/// First row of every graph id in the graph table, plus the set of ids.
fn graph_rows_by_id(gdata: &GraphData) -> (BTreeMap<i64, usize>, BTreeSet<i64>) {
    let mut first_rows = BTreeMap::new();
    for (row, &gid) in gdata.graph_id().iter().enumerate() {
        first_rows.entry(gid).or_insert(row);
    }
    let listed = first_rows.keys().copied().collect();
    (first_rows, listed)
}

/// Gather the kept rows of every feature column, across all groups of a type.
fn gather_features<T>(
    context: &str,
    groups: &[&T],
    data_of: impl Fn(&T) -> &FeatureMap,
    rows: &RowRefs,
) -> Result<FeatureMap> {
    let mut per_group: Vec<Vec<usize>> = vec![Vec::new(); groups.len()];
    for &(g, row) in rows {
        per_group[g].push(row);
    }

    let names: BTreeSet<&String> = groups.iter().flat_map(|t| data_of(*t).keys()).collect();
    let mut out = FeatureMap::new();
    for name in names {
        let mut parts = Vec::with_capacity(groups.len());
        // Zero-row column of the first kind seen, for partitions no table fills.
        let mut empty = None;
        for (g, item) in groups.iter().enumerate() {
            match data_of(*item).get(name) {
                Some(feature) if per_group[g].is_empty() => {
                    empty.get_or_insert_with(|| feature.gather(&[]));
                }
                Some(feature) => parts.push(feature.gather(&per_group[g])),
                None if per_group[g].is_empty() => {}
                None => {
                    return Err(DataError::shape(
                        format!("{context} feature `{name}`"),
                        rows.len(),
                        rows.len() - per_group[g].len(),
                    ))
                }
            }
        }
        if parts.is_empty() {
            parts.extend(empty);
        }
        // Tables of a type must agree on a column's width; int and float mix.
        let merged = Feature::concat(&parts).ok_or_else(|| {
            DataError::parse(name.as_str(), format!("incompatible column kinds across tables of {context}"))
        })?;
        out.insert(name.clone(), merged);
    }
    Ok(out)
}
