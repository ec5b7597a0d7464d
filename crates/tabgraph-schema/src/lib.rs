//! Tabgraph manifest schema
//!
//! A tabgraph dataset is a directory holding a `meta.yaml` manifest plus one
//! delimited table per node type, per edge type and (optionally) one table of
//! graph-level rows. This crate defines:
//!
//! - the manifest model and its validation (`manifest`),
//! - node/edge type labels and their `_V`/`_E` defaults (`labels`),
//! - the error taxonomy shared by the whole load pipeline (`error`).

pub mod error;
pub mod labels;
pub mod manifest;

pub use error::{DataError, Result, TypeKind};
pub use labels::{EdgeType, DEFAULT_ETYPE_LABEL, DEFAULT_NTYPE};
pub use manifest::{
    load_manifest, parse_manifest_str, Manifest, MetaEdge, MetaGraph, MetaNode,
    MANIFEST_FILE_NAME, SUPPORTED_VERSION,
};
