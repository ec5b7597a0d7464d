//! Tabgraph CLI
//!
//! Command-line front end for CSV graph datasets:
//! - Inspecting and building a dataset directory (`meta.yaml` + tables)
//! - Attaching node-prediction masks and link-prediction splits
//! - Extracting downloaded `.gz` archives

use anyhow::{anyhow, bail, Result};
use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use serde::Serialize;
use std::path::{Path, PathBuf};
use tabgraph_graph::HeteroGraph;
use tabgraph_schema::EdgeType;
use tabgraph_split::{AsLinkPred, AsNodePred, SplitOptions};
use tabgraph_storage::{extract_archive, CsvDataset, DatasetOptions};
use tracing_subscriber::EnvFilter;

/// Environment variable holding the log filter (`tracing` directives).
const LOG_ENV: &str = "TABGRAPH_LOG";

#[derive(Parser)]
#[command(name = "tabgraph")]
#[command(author, version, about = "Tabgraph: graph datasets from CSV tables")]
struct Cli {
    /// Log at debug level unless TABGRAPH_LOG says otherwise
    #[arg(short, long, global = true)]
    verbose: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct LoadArgs {
    /// Dataset directory containing meta.yaml
    dir: PathBuf,
    /// Where cache artifacts go (default: <dir>/.tabgraph)
    #[arg(long)]
    save_dir: Option<PathBuf>,
    /// Rebuild even when the cache is current
    #[arg(long)]
    force_reload: bool,
    /// Extra strings mixed into the cache signature
    #[arg(long = "hash-key")]
    hash_key: Vec<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Summarize a dataset: graphs, node/edge types, feature columns.
    Inspect {
        #[command(flatten)]
        load: LoadArgs,
        /// Output format: text|json
        #[arg(long, default_value = "text")]
        format: String,
    },

    /// Parse and construct a dataset, refreshing its cache.
    Build {
        #[command(flatten)]
        load: LoadArgs,
    },

    /// Attach train/val/test node masks.
    SplitNodes {
        #[command(flatten)]
        load: LoadArgs,
        /// Ratios as train,val,test
        #[arg(long, value_parser = parse_ratio, default_value = "0.8,0.1,0.1")]
        ratio: [f64; 3],
        /// Node type to split (required for heterogeneous graphs)
        #[arg(long)]
        ntype: Option<String>,
        #[arg(long)]
        seed: Option<u64>,
        /// Ignore a saved split
        #[arg(long)]
        resplit: bool,
    },

    /// Hold out edges for link prediction and sample negatives.
    SplitLinks {
        #[command(flatten)]
        load: LoadArgs,
        /// Ratios as train,val,test; omit to use the edges' own masks
        #[arg(long, value_parser = parse_ratio)]
        ratio: Option<[f64; 3]>,
        /// Negatives per held-out positive
        #[arg(long, default_value_t = 1)]
        neg_ratio: usize,
        /// Edge type as src:label:dst (required for heterogeneous graphs)
        #[arg(long, value_parser = parse_etype)]
        etype: Option<EdgeType>,
        #[arg(long)]
        seed: Option<u64>,
        #[arg(long)]
        resplit: bool,
    },

    /// Extract a `.gz` archive into a directory.
    Extract {
        archive: PathBuf,
        /// Destination directory
        #[arg(short, long)]
        out: PathBuf,
        #[arg(long)]
        overwrite: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Inspect { load, format } => {
            let ds = load_dataset(&load)?;
            cmd_inspect(&ds, &format)?;
        }
        Commands::Build { load } => {
            let ds = load_dataset(&load)?;
            let source = if ds.loaded_from_cache() { "cache" } else { "tables" };
            eprintln!(
                "{} built {} ({} graphs, from {})",
                "ok".green().bold(),
                ds.name().bold(),
                ds.len(),
                source
            );
            println!("{}", ds.signature());
        }
        Commands::SplitNodes {
            load,
            ratio,
            ntype,
            seed,
            resplit,
        } => {
            let ds = load_dataset(&load)?;
            let task = AsNodePred::new(ds, ratio, ntype.as_deref(), split_options(resplit, seed))?;
            eprintln!(
                "{} node split on `{}` ({})",
                "ok".green().bold(),
                task.target_ntype(),
                reuse_label(task.reused_saved_split())
            );
            for i in 0..task.len() {
                if let Some(split) = task.split(i) {
                    let [train, val, test] = split.counts();
                    println!("graph {i}: train={train} val={val} test={test}");
                }
            }
            if let Some(n) = task.num_classes() {
                println!("num_classes: {n}");
            }
        }
        Commands::SplitLinks {
            load,
            ratio,
            neg_ratio,
            etype,
            seed,
            resplit,
        } => {
            let ds = load_dataset(&load)?;
            let task = AsLinkPred::new(ds, ratio, neg_ratio, etype, split_options(resplit, seed))?;
            let [train, val, test] = task.split().positive_counts();
            let (_, val_neg) = task.val_edges();
            let (_, test_neg) = task.test_edges();
            eprintln!(
                "{} link split on {} ({})",
                "ok".green().bold(),
                task.target_etype(),
                reuse_label(task.reused_saved_split())
            );
            println!("train: {train}");
            println!("val: {val} positive, {} negative", val_neg.0.len());
            println!("test: {test} positive, {} negative", test_neg.0.len());
        }
        Commands::Extract {
            archive,
            out,
            overwrite,
        } => {
            let path = extract_archive(&archive, &out, overwrite)?;
            eprintln!("{} {}", "wrote".green().bold(), path.display().to_string().bold());
        }
    }
    Ok(())
}

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn load_dataset(args: &LoadArgs) -> Result<CsvDataset> {
    let mut options = DatasetOptions::default().force_reload(args.force_reload);
    if let Some(dir) = &args.save_dir {
        options = options.save_dir(dir);
    }
    for key in &args.hash_key {
        options = options.hash_key(key);
    }
    CsvDataset::load(&args.dir, options)
        .map_err(|e| anyhow!("failed to load {}: {e}", args.dir.display()))
}

fn split_options(resplit: bool, seed: Option<u64>) -> SplitOptions {
    SplitOptions {
        force_reload: resplit,
        seed,
    }
}

fn reuse_label(reused: bool) -> &'static str {
    if reused {
        "saved"
    } else {
        "generated"
    }
}

fn parse_ratio(s: &str) -> std::result::Result<[f64; 3], String> {
    let parts = s
        .split(',')
        .map(|p| p.trim().parse::<f64>().map_err(|e| format!("bad ratio `{p}`: {e}")))
        .collect::<std::result::Result<Vec<_>, _>>()?;
    <[f64; 3]>::try_from(parts).map_err(|p| format!("expected 3 ratios, got {}", p.len()))
}

fn parse_etype(s: &str) -> std::result::Result<EdgeType, String> {
    match s.split(':').collect::<Vec<_>>().as_slice() {
        [src, label, dst] => Ok(EdgeType::new(*src, *label, *dst)),
        _ => Err(format!("expected src:label:dst, got `{s}`")),
    }
}

// ============================================================================
// inspect
// ============================================================================

#[derive(Serialize)]
struct DatasetSummary<'a> {
    name: &'a str,
    signature: &'a str,
    from_cache: bool,
    graph_features: Vec<&'a str>,
    graphs: Vec<GraphSummary>,
}

#[derive(Serialize)]
struct GraphSummary {
    nodes: Vec<TypeSummary>,
    edges: Vec<TypeSummary>,
}

#[derive(Serialize)]
struct TypeSummary {
    name: String,
    count: usize,
    features: Vec<String>,
}

fn summarize(graph: &HeteroGraph) -> GraphSummary {
    let nodes = graph
        .ntypes()
        .into_iter()
        .map(|t| TypeSummary {
            name: t.to_string(),
            count: graph.num_nodes(t),
            features: graph
                .node_features(t)
                .map(|f| f.keys().cloned().collect())
                .unwrap_or_default(),
        })
        .collect();
    let edges = graph
        .canonical_etypes()
        .into_iter()
        .map(|t| TypeSummary {
            name: t.to_string(),
            count: graph.num_edges(t),
            features: graph
                .edge_features(t)
                .map(|f| f.keys().cloned().collect())
                .unwrap_or_default(),
        })
        .collect();
    GraphSummary { nodes, edges }
}

fn cmd_inspect(ds: &CsvDataset, format: &str) -> Result<()> {
    let summary = DatasetSummary {
        name: ds.name(),
        signature: ds.signature(),
        from_cache: ds.loaded_from_cache(),
        graph_features: ds.graph_features().keys().map(String::as_str).collect(),
        graphs: ds.graphs().iter().map(summarize).collect(),
    };

    match format {
        "json" => println!("{}", serde_json::to_string_pretty(&summary)?),
        "text" => print_summary(&summary, ds.data_dir()),
        other => bail!("unknown format `{other}` (expected text|json)"),
    }
    Ok(())
}

fn print_summary(summary: &DatasetSummary<'_>, dir: &Path) {
    println!("{} {}", summary.name.bold(), dir.display().to_string().dimmed());
    println!("signature: {}", summary.signature);
    println!("graphs: {}", summary.graphs.len());
    if !summary.graph_features.is_empty() {
        println!("graph features: {}", summary.graph_features.join(", "));
    }
    // Only the first graph; use --format json for all of them.
    for (i, graph) in summary.graphs.iter().take(1).enumerate() {
        println!("graph {i}:");
        for t in graph.nodes.iter().chain(&graph.edges) {
            println!("  {:<32} {:>10}  [{}]", t.name.cyan(), t.count, t.features.join(", "));
        }
    }
}
