//! Delimited-table ingestion for Tabgraph
//!
//! Turns node, edge and graph tables into typed records:
//! - `table`: raw header + string cells, read with the manifest's separator
//! - `feature`: typed feature columns (scalar or fixed-width vector per row)
//! - `parser`: the default numeric parser and the per-type parser registry
//! - `records`: `NodeData` / `EdgeData` / `GraphData` value objects

pub mod feature;
pub mod parser;
pub mod records;
pub mod table;

pub use feature::{Feature, FeatureMap};
pub use parser::{coerce_ids, parse_column, DataParser, DefaultDataParser, ParserRegistry};
pub use records::{EdgeData, GraphData, IdSequence, NodeData};
pub use table::{is_unnamed_column, read_table, RawTable};
