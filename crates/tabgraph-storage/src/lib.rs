//! Tabgraph storage layer
//!
//! - `signature`: content hash of a manifest and its tables
//! - `artifact`: verified CBOR artifacts (magic, version, signature, SHA-256)
//! - `cache`: load/store against a save directory; every failure is a miss
//! - `dataset`: [`CsvDataset`], the cached parse -> construct pipeline
//! - `extract`: gzip archive extraction

pub mod artifact;
pub mod cache;
pub mod dataset;
pub mod extract;
pub mod signature;

pub use artifact::{
    decode_artifact, encode_artifact, write_atomic, ArtifactError, ArtifactHeader, FORMAT_VERSION,
    MAGIC,
};
pub use cache::{CacheController, GRAPH_CACHE_FILE};
pub use dataset::{CachedGraphs, CsvDataset, DatasetOptions, DEFAULT_SAVE_DIR};
pub use extract::extract_archive;
pub use signature::compute_signature;
