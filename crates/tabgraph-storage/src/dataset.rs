//! CSV dataset wrapper: manifest -> records -> graphs, behind the cache.

use crate::cache::CacheController;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tabgraph_graph::{construct_graphs, HeteroGraph};
use tabgraph_ingest_csv::{EdgeData, FeatureMap, GraphData, NodeData, ParserRegistry};
use tabgraph_schema::{load_manifest, Manifest, Result, MANIFEST_FILE_NAME};

/// Directory (under the data directory) holding cache artifacts by default.
pub const DEFAULT_SAVE_DIR: &str = ".tabgraph";

#[derive(Debug, Clone, Default)]
pub struct DatasetOptions {
    /// Rebuild even when a matching cache artifact exists.
    pub force_reload: bool,
    /// Where artifacts go; `<data_dir>/.tabgraph` when unset.
    pub save_dir: Option<PathBuf>,
    /// Extra strings mixed into the signature.
    pub hash_key: Vec<String>,
    pub parsers: ParserRegistry,
}

impl DatasetOptions {
    pub fn force_reload(mut self, force: bool) -> Self {
        self.force_reload = force;
        self
    }

    pub fn save_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.save_dir = Some(dir.into());
        self
    }

    pub fn hash_key(mut self, key: impl Into<String>) -> Self {
        self.hash_key.push(key.into());
        self
    }

    pub fn parsers(mut self, parsers: ParserRegistry) -> Self {
        self.parsers = parsers;
        self
    }
}

/// What the graph artifact stores.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CachedGraphs {
    pub graphs: Vec<HeteroGraph>,
    pub graph_features: FeatureMap,
}

#[derive(Debug, Clone)]
pub struct CsvDataset {
    data_dir: PathBuf,
    save_dir: PathBuf,
    manifest: Manifest,
    signature: String,
    graphs: Vec<HeteroGraph>,
    graph_features: FeatureMap,
    from_cache: bool,
}

impl CsvDataset {
    /// Load the dataset in `data_dir`, from cache when the inputs are unchanged.
    ///
    /// Manifest errors surface even on a cache hit. Any parse or construction
    /// error aborts the load; a failed cache write only logs.
    pub fn load(data_dir: impl AsRef<Path>, options: DatasetOptions) -> Result<Self> {
        let data_dir = data_dir.as_ref().to_path_buf();
        let manifest_path = data_dir.join(MANIFEST_FILE_NAME);
        let manifest = load_manifest(&manifest_path)?;
        let save_dir = options
            .save_dir
            .clone()
            .unwrap_or_else(|| data_dir.join(DEFAULT_SAVE_DIR));

        let raw_files: Vec<PathBuf> = manifest
            .referenced_files()
            .into_iter()
            .map(|f| data_dir.join(f))
            .collect();
        let signature = CacheController::signature(&manifest_path, raw_files.as_slice(), &options.hash_key)?;
        let cache = CacheController::new(&save_dir);

        if !options.force_reload {
            if let Some(cached) = cache.load::<CachedGraphs>(&signature) {
                tracing::info!(
                    dataset = %manifest.dataset_name,
                    graphs = cached.graphs.len(),
                    "loaded dataset from cache"
                );
                return Ok(Self {
                    data_dir,
                    save_dir,
                    manifest,
                    signature,
                    graphs: cached.graphs,
                    graph_features: cached.graph_features,
                    from_cache: true,
                });
            }
        }

        tracing::info!(
            dataset = %manifest.dataset_name,
            force_reload = options.force_reload,
            "building dataset from tables"
        );
        let (graphs, graph_features) = build_graphs(&data_dir, &manifest, &options.parsers)?;

        let dataset = Self {
            data_dir,
            save_dir,
            manifest,
            signature,
            graphs,
            graph_features,
            from_cache: false,
        };
        if let Err(e) = dataset.save() {
            tracing::warn!(error = %e, "failed to store dataset cache");
        }
        Ok(dataset)
    }

    /// Write the current graphs (including any in-place edits) to the cache.
    pub fn save(&self) -> Result<()> {
        let payload = CachedGraphs {
            graphs: self.graphs.clone(),
            graph_features: self.graph_features.clone(),
        };
        CacheController::new(&self.save_dir).store(&self.signature, &payload)
    }

    pub fn len(&self) -> usize {
        self.graphs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.graphs.is_empty()
    }

    pub fn graph(&self, i: usize) -> Option<&HeteroGraph> {
        self.graphs.get(i)
    }

    /// Graph `i` with its row of graph-level features.
    pub fn get(&self, i: usize) -> Option<(&HeteroGraph, FeatureMap)> {
        let graph = self.graphs.get(i)?;
        let row = self
            .graph_features
            .iter()
            .map(|(name, feature)| (name.clone(), feature.gather(&[i])))
            .collect();
        Some((graph, row))
    }

    pub fn graphs(&self) -> &[HeteroGraph] {
        &self.graphs
    }

    pub fn graphs_mut(&mut self) -> &mut [HeteroGraph] {
        &mut self.graphs
    }

    pub fn graph_features(&self) -> &FeatureMap {
        &self.graph_features
    }

    pub fn manifest(&self) -> &Manifest {
        &self.manifest
    }

    pub fn name(&self) -> &str {
        &self.manifest.dataset_name
    }

    pub fn signature(&self) -> &str {
        &self.signature
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn save_dir(&self) -> &Path {
        &self.save_dir
    }

    /// True when the save directory holds an artifact for the current inputs.
    pub fn has_cache(&self) -> bool {
        CacheController::new(&self.save_dir).has(&self.signature)
    }

    /// True when this instance came from the cache rather than the tables.
    pub fn loaded_from_cache(&self) -> bool {
        self.from_cache
    }
}

fn build_graphs(
    data_dir: &Path,
    manifest: &Manifest,
    parsers: &ParserRegistry,
) -> Result<(Vec<HeteroGraph>, FeatureMap)> {
    let separator = manifest.separator_byte();

    let nodes = manifest
        .node_data
        .iter()
        .map(|meta| NodeData::load_from_csv(meta, data_dir, separator, parsers.for_node(&meta.ntype)))
        .collect::<Result<Vec<_>>>()?;
    let edges = manifest
        .edge_data
        .iter()
        .map(|meta| EdgeData::load_from_csv(meta, data_dir, separator, parsers.for_edge(&meta.etype)))
        .collect::<Result<Vec<_>>>()?;
    let graph = manifest
        .graph_data
        .as_ref()
        .map(|meta| GraphData::load_from_csv(meta, data_dir, separator, parsers.for_graph()))
        .transpose()?;

    tracing::debug!(
        node_tables = nodes.len(),
        edge_tables = edges.len(),
        graph_table = graph.is_some(),
        "parsed tables"
    );
    construct_graphs(&nodes, &edges, graph.as_ref())
}
