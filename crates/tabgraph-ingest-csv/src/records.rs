//! Node, edge and graph records: one table's worth of identifiers plus
//! feature columns, tagged with a type label and per-row graph ids.
//!
//! Every constructor checks that identifiers, graph ids and feature columns
//! have the same number of rows; records are immutable afterwards.

use crate::feature::{Feature, FeatureMap};
use crate::parser::{coerce_ids, DataParser};
use crate::table::{read_table, RawTable};
use std::path::Path;
use tabgraph_schema::{DataError, EdgeType, MetaEdge, MetaGraph, MetaNode, Result, DEFAULT_NTYPE};

/// Anything that can be coerced to a 64-bit identifier column.
pub trait IdSequence {
    fn into_ids(self) -> Vec<i64>;
}

impl IdSequence for Vec<i64> {
    fn into_ids(self) -> Vec<i64> {
        self
    }
}

impl IdSequence for &[i64] {
    fn into_ids(self) -> Vec<i64> {
        self.to_vec()
    }
}

macro_rules! int_id_sequence {
    ($($t:ty),*) => {
        $(
            impl IdSequence for Vec<$t> {
                fn into_ids(self) -> Vec<i64> {
                    self.into_iter().map(|v| v as i64).collect()
                }
            }
        )*
    };
}

int_id_sequence!(i32, u32, u64, usize);

/// Float ids truncate toward zero, like a numeric cast.
impl IdSequence for Vec<f64> {
    fn into_ids(self) -> Vec<i64> {
        self.into_iter().map(|v| v as i64).collect()
    }
}

fn check_features(context: &str, rows: usize, data: &FeatureMap) -> Result<()> {
    for (name, feature) in data {
        if feature.len() != rows {
            return Err(DataError::shape(
                format!("{context} feature `{name}`"),
                rows,
                feature.len(),
            ));
        }
    }
    Ok(())
}

fn resolve_graph_id(context: &str, rows: usize, graph_id: Option<Vec<i64>>) -> Result<Vec<i64>> {
    match graph_id {
        None => Ok(vec![0; rows]),
        Some(g) if g.len() == rows => Ok(g),
        Some(g) => Err(DataError::shape(format!("{context} graph_id"), rows, g.len())),
    }
}

fn read_for_load(path: &Path, separator: u8) -> Result<RawTable> {
    let mut table = read_table(path, separator)?;
    for header in table.drop_unnamed_columns() {
        tracing::warn!(
            source = table.source(),
            column = %header,
            "dropping unnamed index column"
        );
    }
    Ok(table)
}

fn take_ids(table: &mut RawTable, column: &str) -> Result<Vec<i64>> {
    let cells = table
        .take_column(column)
        .ok_or_else(|| DataError::MissingColumn {
            table: table.source().to_string(),
            column: column.to_string(),
        })?;
    coerce_ids(column, &cells)
}

fn take_graph_ids(table: &mut RawTable, column: &str) -> Result<Option<Vec<i64>>> {
    match table.take_column(column) {
        Some(cells) => Ok(Some(coerce_ids(column, &cells)?)),
        None => Ok(None),
    }
}

// ============================================================================
// NodeData
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub struct NodeData {
    id: Vec<i64>,
    data: FeatureMap,
    ntype: String,
    graph_id: Vec<i64>,
}

impl NodeData {
    /// Nodes of the default type `_V`, all in graph 0.
    pub fn new(id: impl IdSequence, data: FeatureMap) -> Result<Self> {
        Self::typed(id, data, DEFAULT_NTYPE, None)
    }

    pub fn typed(
        id: impl IdSequence,
        data: FeatureMap,
        ntype: impl Into<String>,
        graph_id: Option<Vec<i64>>,
    ) -> Result<Self> {
        let id = id.into_ids();
        let ntype = ntype.into();
        let context = format!("node type {ntype}");
        let graph_id = resolve_graph_id(&context, id.len(), graph_id)?;
        check_features(&context, id.len(), &data)?;
        Ok(Self {
            id,
            data,
            ntype,
            graph_id,
        })
    }

    /// Read the table named by `meta`, resolving its file name against `base_dir`.
    ///
    /// The identifier column is required; the graph id column defaults to all
    /// zeros when absent. Every remaining column goes through `parser`.
    pub fn load_from_csv(
        meta: &MetaNode,
        base_dir: &Path,
        separator: u8,
        parser: &dyn DataParser,
    ) -> Result<Self> {
        let mut table = read_for_load(&base_dir.join(&meta.file_name), separator)?;
        let id = take_ids(&mut table, &meta.node_id_field)?;
        let graph_id = take_graph_ids(&mut table, &meta.graph_id_field)?;
        let data = parser.parse(&table)?;
        Self::typed(id, data, meta.ntype.clone(), graph_id)
    }

    pub fn id(&self) -> &[i64] {
        &self.id
    }

    pub fn data(&self) -> &FeatureMap {
        &self.data
    }

    pub fn ntype(&self) -> &str {
        &self.ntype
    }

    pub fn graph_id(&self) -> &[i64] {
        &self.graph_id
    }

    pub fn len(&self) -> usize {
        self.id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.id.is_empty()
    }
}

// ============================================================================
// EdgeData
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub struct EdgeData {
    src: Vec<i64>,
    dst: Vec<i64>,
    data: FeatureMap,
    etype: EdgeType,
    graph_id: Vec<i64>,
}

impl EdgeData {
    /// Edges of the default type `(_V, _E, _V)`, all in graph 0.
    pub fn new(src: impl IdSequence, dst: impl IdSequence, data: FeatureMap) -> Result<Self> {
        Self::typed(src, dst, data, EdgeType::default(), None)
    }

    pub fn typed(
        src: impl IdSequence,
        dst: impl IdSequence,
        data: FeatureMap,
        etype: impl Into<EdgeType>,
        graph_id: Option<Vec<i64>>,
    ) -> Result<Self> {
        let src = src.into_ids();
        let dst = dst.into_ids();
        let etype = etype.into();
        let context = format!("edge type {etype}");
        if dst.len() != src.len() {
            return Err(DataError::shape(format!("{context} dst"), src.len(), dst.len()));
        }
        let graph_id = resolve_graph_id(&context, src.len(), graph_id)?;
        check_features(&context, src.len(), &data)?;
        Ok(Self {
            src,
            dst,
            data,
            etype,
            graph_id,
        })
    }

    /// Read the table named by `meta`; both endpoint columns are required.
    pub fn load_from_csv(
        meta: &MetaEdge,
        base_dir: &Path,
        separator: u8,
        parser: &dyn DataParser,
    ) -> Result<Self> {
        let mut table = read_for_load(&base_dir.join(&meta.file_name), separator)?;
        let src = take_ids(&mut table, &meta.src_id_field)?;
        let dst = take_ids(&mut table, &meta.dst_id_field)?;
        let graph_id = take_graph_ids(&mut table, &meta.graph_id_field)?;
        let data = parser.parse(&table)?;
        Self::typed(src, dst, data, meta.etype.clone(), graph_id)
    }

    pub fn src(&self) -> &[i64] {
        &self.src
    }

    pub fn dst(&self) -> &[i64] {
        &self.dst
    }

    pub fn data(&self) -> &FeatureMap {
        &self.data
    }

    pub fn etype(&self) -> &EdgeType {
        &self.etype
    }

    pub fn graph_id(&self) -> &[i64] {
        &self.graph_id
    }

    pub fn len(&self) -> usize {
        self.src.len()
    }

    pub fn is_empty(&self) -> bool {
        self.src.is_empty()
    }
}

// ============================================================================
// GraphData
// ============================================================================

/// One row per graph: graph-level labels and features.
#[derive(Debug, Clone, PartialEq)]
pub struct GraphData {
    graph_id: Vec<i64>,
    data: FeatureMap,
}

impl GraphData {
    pub fn new(graph_id: impl IdSequence, data: FeatureMap) -> Result<Self> {
        let graph_id = graph_id.into_ids();
        check_features("graph table", graph_id.len(), &data)?;
        Ok(Self { graph_id, data })
    }

    /// Read the graph table; the graph id column is required.
    pub fn load_from_csv(
        meta: &MetaGraph,
        base_dir: &Path,
        separator: u8,
        parser: &dyn DataParser,
    ) -> Result<Self> {
        let mut table = read_for_load(&base_dir.join(&meta.file_name), separator)?;
        let graph_id = take_ids(&mut table, &meta.graph_id_field)?;
        let data = parser.parse(&table)?;
        Self::new(graph_id, data)
    }

    pub fn graph_id(&self) -> &[i64] {
        &self.graph_id
    }

    pub fn data(&self) -> &FeatureMap {
        &self.data
    }

    pub fn feature(&self, name: &str) -> Option<&Feature> {
        self.data.get(name)
    }

    pub fn len(&self) -> usize {
        self.graph_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.graph_id.is_empty()
    }
}
