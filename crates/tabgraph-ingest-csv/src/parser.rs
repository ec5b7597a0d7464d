//! Table parsers: raw table in, feature map out.
//!
//! [`DefaultDataParser`] is numeric-only. Callers may register their own
//! [`DataParser`] per node type, per edge type, or for the graph table; a
//! registered parser replaces the default for that type, it is not layered on
//! top of it.

use crate::feature::{flatten_rows, Feature, FeatureMap};
use crate::table::{is_unnamed_column, RawTable};
use std::collections::HashMap;
use std::sync::Arc;
use tabgraph_schema::{DataError, EdgeType, Result};

pub trait DataParser: Send + Sync {
    fn parse(&self, table: &RawTable) -> Result<FeatureMap>;
}

impl<F> DataParser for F
where
    F: Fn(&RawTable) -> Result<FeatureMap> + Send + Sync,
{
    fn parse(&self, table: &RawTable) -> Result<FeatureMap> {
        self(table)
    }
}

/// Numeric-only parser.
///
/// - integer cells -> `Int`, any non-integer numeric (or empty, read as NaN) -> `Float`
/// - `True`/`False` cells -> `Bool`
/// - bracketed lists (`"[0.1, 0.2]"`) -> `IntRows` / `FloatRows`
/// - unnamed index columns are dropped
/// - anything else is a parse error
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultDataParser;

impl DataParser for DefaultDataParser {
    fn parse(&self, table: &RawTable) -> Result<FeatureMap> {
        let mut out = FeatureMap::new();
        for (header, cells) in table.iter_columns() {
            if is_unnamed_column(header) {
                tracing::warn!(
                    source = table.source(),
                    column = header,
                    "dropping unnamed index column"
                );
                continue;
            }
            out.insert(header.to_string(), parse_column(header, cells)?);
        }
        Ok(out)
    }
}

/// Type one column under the default numeric rules.
pub fn parse_column(column: &str, cells: &[String]) -> Result<Feature> {
    let is_list = |c: &String| c.trim_start().starts_with('[');
    let lists = cells.iter().filter(|c| is_list(c)).count();

    if lists > 0 {
        if lists != cells.len() {
            return Err(DataError::parse(column, "mixes vector and scalar cells"));
        }
        return parse_list_column(column, cells);
    }

    if !cells.is_empty() && cells.iter().all(|c| parse_bool(c).is_some()) {
        return Ok(Feature::Bool(
            cells.iter().filter_map(|c| parse_bool(c)).collect(),
        ));
    }

    if let Some(ints) = cells
        .iter()
        .map(|c| c.trim().parse::<i64>().ok())
        .collect::<Option<Vec<_>>>()
    {
        return Ok(Feature::Int(ints));
    }

    let floats = cells
        .iter()
        .enumerate()
        .map(|(row, c)| parse_float(column, row, c))
        .collect::<Result<Vec<_>>>()?;
    Ok(Feature::Float(floats))
}

fn parse_list_column(column: &str, cells: &[String]) -> Result<Feature> {
    let mut rows: Vec<Vec<&str>> = Vec::with_capacity(cells.len());
    for (row, cell) in cells.iter().enumerate() {
        let inner = cell
            .trim()
            .strip_prefix('[')
            .and_then(|s| s.strip_suffix(']'))
            .ok_or_else(|| {
                DataError::parse(column, format!("row {row}: unterminated vector `{cell}`"))
            })?;
        if inner.contains('[') {
            return Err(DataError::parse(
                column,
                format!("row {row}: nested vectors are not supported"),
            ));
        }
        let values: Vec<&str> = if inner.trim().is_empty() {
            Vec::new()
        } else {
            inner.split(',').map(str::trim).collect()
        };
        rows.push(values);
    }

    let all_int = rows
        .iter()
        .flatten()
        .all(|v| v.parse::<i64>().is_ok());

    if all_int {
        let parsed: Vec<Vec<i64>> = rows
            .iter()
            .map(|r| r.iter().filter_map(|v| v.parse::<i64>().ok()).collect())
            .collect();
        let (width, data) = flatten_rows(column, parsed)?;
        return Ok(Feature::IntRows { width, data });
    }

    let parsed = rows
        .iter()
        .enumerate()
        .map(|(row, r)| {
            r.iter()
                .map(|v| parse_float(column, row, v))
                .collect::<Result<Vec<f64>>>()
        })
        .collect::<Result<Vec<_>>>()?;
    let (width, data) = flatten_rows(column, parsed)?;
    Ok(Feature::FloatRows { width, data })
}

fn parse_float(column: &str, row: usize, cell: &str) -> Result<f64> {
    let cell = cell.trim();
    if cell.is_empty() {
        return Ok(f64::NAN);
    }
    cell.parse::<f64>()
        .map_err(|_| DataError::parse(column, format!("row {row}: `{cell}` is not numeric")))
}

fn parse_bool(cell: &str) -> Option<bool> {
    match cell.trim() {
        "True" | "true" => Some(true),
        "False" | "false" => Some(false),
        _ => None,
    }
}

/// Coerce an identifier column to 64-bit integers.
///
/// Float-formatted ids (`"3.0"`) truncate toward zero; non-numeric or
/// non-finite cells are a parse error.
pub fn coerce_ids(column: &str, cells: &[String]) -> Result<Vec<i64>> {
    cells
        .iter()
        .enumerate()
        .map(|(row, cell)| {
            let cell = cell.trim();
            if let Ok(v) = cell.parse::<i64>() {
                return Ok(v);
            }
            match cell.parse::<f64>() {
                Ok(v) if v.is_finite() => Ok(v as i64),
                _ => Err(DataError::parse(
                    column,
                    format!("row {row}: identifier `{cell}` is not an integer"),
                )),
            }
        })
        .collect()
}

// ============================================================================
// Parser registry
// ============================================================================

/// Per-type parser overrides, falling back to one shared default parser.
#[derive(Clone)]
pub struct ParserRegistry {
    default: Arc<dyn DataParser>,
    node: HashMap<String, Arc<dyn DataParser>>,
    edge: HashMap<EdgeType, Arc<dyn DataParser>>,
    graph: Option<Arc<dyn DataParser>>,
}

impl Default for ParserRegistry {
    fn default() -> Self {
        Self {
            default: Arc::new(DefaultDataParser),
            node: HashMap::new(),
            edge: HashMap::new(),
            graph: None,
        }
    }
}

impl std::fmt::Debug for ParserRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ParserRegistry")
            .field("node", &self.node.keys().collect::<Vec<_>>())
            .field("edge", &self.edge.keys().collect::<Vec<_>>())
            .field("graph", &self.graph.is_some())
            .finish()
    }
}

impl ParserRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_node_parser(mut self, ntype: impl Into<String>, parser: impl DataParser + 'static) -> Self {
        self.node.insert(ntype.into(), Arc::new(parser));
        self
    }

    pub fn with_edge_parser(mut self, etype: impl Into<EdgeType>, parser: impl DataParser + 'static) -> Self {
        self.edge.insert(etype.into(), Arc::new(parser));
        self
    }

    pub fn with_graph_parser(mut self, parser: impl DataParser + 'static) -> Self {
        self.graph = Some(Arc::new(parser));
        self
    }

    pub fn for_node(&self, ntype: &str) -> &dyn DataParser {
        self.node.get(ntype).unwrap_or(&self.default).as_ref()
    }

    pub fn for_edge(&self, etype: &EdgeType) -> &dyn DataParser {
        self.edge.get(etype).unwrap_or(&self.default).as_ref()
    }

    pub fn for_graph(&self) -> &dyn DataParser {
        self.graph.as_ref().unwrap_or(&self.default).as_ref()
    }
}
