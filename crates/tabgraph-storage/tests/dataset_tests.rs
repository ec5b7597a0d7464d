use rand::Rng;
use std::fmt::Write as _;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tabgraph_ingest_csv::{
    DataParser, DefaultDataParser, Feature, FeatureMap, ParserRegistry, RawTable,
};
use tabgraph_schema::{DataError, EdgeType, Result};
use tabgraph_storage::{CsvDataset, DatasetOptions, GRAPH_CACHE_FILE};
use tempfile::tempdir;

const HOMO_META: &str = "\
version: 1.0.0
dataset_name: default_name
node_data:
  - file_name: test_nodes.csv
edge_data:
  - file_name: test_edges.csv
";

fn write_homo(dir: &Path, num_nodes: usize, num_edges: usize) {
    let mut rng = rand::thread_rng();
    std::fs::write(dir.join("meta.yaml"), HOMO_META).unwrap();

    let mut nodes = String::from("node_id,label,feat\n");
    for i in 0..num_nodes {
        let label = rng.gen_range(0..10);
        writeln!(nodes, "{i},{label},\"[{:.3}, {:.3}]\"", rng.gen::<f64>(), rng.gen::<f64>()).unwrap();
    }
    std::fs::write(dir.join("test_nodes.csv"), nodes).unwrap();

    let mut edges = String::from("src_id,dst_id,label,feat\n");
    for _ in 0..num_edges {
        let (s, d) = (rng.gen_range(0..num_nodes), rng.gen_range(0..num_nodes));
        writeln!(edges, "{s},{d},{},\"[{:.3}]\"", rng.gen_range(0..3), rng.gen::<f64>()).unwrap();
    }
    std::fs::write(dir.join("test_edges.csv"), edges).unwrap();
}

fn counting_registry(counter: Arc<AtomicUsize>) -> ParserRegistry {
    let parser = move |table: &RawTable| -> Result<FeatureMap> {
        counter.fetch_add(1, Ordering::SeqCst);
        DefaultDataParser.parse(table)
    };
    ParserRegistry::new()
        .with_node_parser("_V", parser.clone())
        .with_edge_parser(EdgeType::default(), parser)
}

#[test]
fn single_homogeneous_graph() {
    let dir = tempdir().unwrap();
    write_homo(dir.path(), 100, 1000);

    let ds = CsvDataset::load(dir.path(), DatasetOptions::default()).unwrap();
    assert_eq!(ds.len(), 1);
    assert_eq!(ds.name(), "default_name");
    assert!(ds.signature().starts_with("sha256:"));
    assert!(ds.has_cache());
    assert!(!ds.loaded_from_cache());
    assert_eq!(ds.save_dir(), dir.path().join(".tabgraph"));
    assert!(ds.save_dir().join(GRAPH_CACHE_FILE).exists());

    let g = ds.graph(0).unwrap();
    assert!(g.is_homogeneous());
    assert_eq!(g.num_nodes("_V"), 100);
    assert_eq!(g.num_edges(&EdgeType::default()), 1000);
    let nfeat = g.node_features("_V").unwrap();
    assert!(matches!(nfeat["label"], Feature::Int(_)));
    assert_eq!(nfeat["feat"].width(), 2);
    assert_eq!(g.edge_features(&EdgeType::default()).unwrap()["feat"].width(), 1);

    let (_, row) = ds.get(0).unwrap();
    assert!(row.is_empty());
    assert!(ds.get(1).is_none());
}

#[test]
fn cache_hit_skips_parsing_and_matches() {
    let dir = tempdir().unwrap();
    write_homo(dir.path(), 50, 200);
    let counter = Arc::new(AtomicUsize::new(0));

    let first = CsvDataset::load(
        dir.path(),
        DatasetOptions::default().parsers(counting_registry(counter.clone())),
    )
    .unwrap();
    assert_eq!(counter.load(Ordering::SeqCst), 2);

    let second = CsvDataset::load(
        dir.path(),
        DatasetOptions::default().parsers(counting_registry(counter.clone())),
    )
    .unwrap();
    assert_eq!(counter.load(Ordering::SeqCst), 2);
    assert!(second.loaded_from_cache());
    assert_eq!(first.graphs(), second.graphs());
    assert_eq!(first.signature(), second.signature());

    let _ = CsvDataset::load(
        dir.path(),
        DatasetOptions::default()
            .force_reload(true)
            .parsers(counting_registry(counter.clone())),
    )
    .unwrap();
    assert_eq!(counter.load(Ordering::SeqCst), 4);
}

#[test]
fn changed_table_invalidates_cache() {
    let dir = tempdir().unwrap();
    write_homo(dir.path(), 20, 40);
    let first = CsvDataset::load(dir.path(), DatasetOptions::default()).unwrap();

    std::fs::write(dir.path().join("test_nodes.csv"), {
        let mut s = String::from("node_id,label,feat\n");
        for i in 0..25 {
            writeln!(s, "{i},1,\"[0.0, 1.0]\"").unwrap();
        }
        s
    })
    .unwrap();

    let second = CsvDataset::load(dir.path(), DatasetOptions::default()).unwrap();
    assert!(!second.loaded_from_cache());
    assert_ne!(first.signature(), second.signature());
    assert_eq!(second.graph(0).unwrap().num_nodes("_V"), 25);
}

#[test]
fn changed_manifest_alone_invalidates_cache() {
    let dir = tempdir().unwrap();
    write_homo(dir.path(), 20, 40);
    let first = CsvDataset::load(dir.path(), DatasetOptions::default()).unwrap();
    assert!(CsvDataset::load(dir.path(), DatasetOptions::default()).unwrap().loaded_from_cache());

    let renamed = HOMO_META.replace("dataset_name: default_name", "dataset_name: renamed");
    std::fs::write(dir.path().join("meta.yaml"), renamed).unwrap();

    let parses = Arc::new(AtomicUsize::new(0));
    let options = DatasetOptions::default().parsers(counting_registry(parses.clone()));
    let second = CsvDataset::load(dir.path(), options).unwrap();
    assert!(!second.loaded_from_cache());
    assert_eq!(parses.load(Ordering::SeqCst), 2);
    assert_ne!(first.signature(), second.signature());
    assert_eq!(second.name(), "renamed");
    assert_eq!(second.graph(0).unwrap().num_nodes("_V"), 20);
}

#[test]
fn hash_key_separates_cache_entries() {
    let dir = tempdir().unwrap();
    write_homo(dir.path(), 10, 10);
    let plain = CsvDataset::load(dir.path(), DatasetOptions::default()).unwrap();
    let keyed = CsvDataset::load(dir.path(), DatasetOptions::default().hash_key("variant")).unwrap();
    let again = CsvDataset::load(dir.path(), DatasetOptions::default().hash_key("variant")).unwrap();

    assert_ne!(plain.signature(), keyed.signature());
    assert_eq!(keyed.signature(), again.signature());
    assert!(again.loaded_from_cache());
}

#[test]
fn corrupt_cache_falls_back_to_rebuild() {
    let dir = tempdir().unwrap();
    write_homo(dir.path(), 10, 10);
    let first = CsvDataset::load(dir.path(), DatasetOptions::default()).unwrap();
    std::fs::write(first.save_dir().join(GRAPH_CACHE_FILE), b"junk").unwrap();

    let second = CsvDataset::load(dir.path(), DatasetOptions::default()).unwrap();
    assert!(!second.loaded_from_cache());
    assert_eq!(first.graphs(), second.graphs());
    assert!(second.has_cache());
}

#[test]
fn custom_save_dir() {
    let dir = tempdir().unwrap();
    let save = tempdir().unwrap();
    write_homo(dir.path(), 10, 10);
    let ds = CsvDataset::load(dir.path(), DatasetOptions::default().save_dir(save.path())).unwrap();
    assert_eq!(ds.save_dir(), save.path());
    assert!(save.path().join(GRAPH_CACHE_FILE).exists());
    assert!(!dir.path().join(".tabgraph").exists());
}

#[test]
fn multiple_graphs_with_graph_table() {
    let dir = tempdir().unwrap();
    std::fs::write(
        dir.path().join("meta.yaml"),
        "\
version: 1.0.0
dataset_name: multi
node_data:
  - file_name: nodes.csv
edge_data:
  - file_name: edges.csv
graph_data:
  file_name: graphs.csv
",
    )
    .unwrap();

    let mut rng = rand::thread_rng();
    let mut nodes = String::from("graph_id,node_id,feat\n");
    let mut edges = String::from("graph_id,src_id,dst_id\n");
    let mut graphs = String::from("graph_id,label,feat\n");
    for gid in 0..10 {
        for nid in 0..100 {
            writeln!(nodes, "{gid},{nid},{:.2}", rng.gen::<f64>()).unwrap();
        }
        for _ in 0..1000 {
            writeln!(edges, "{gid},{},{}", rng.gen_range(0..100), rng.gen_range(0..100)).unwrap();
        }
        writeln!(graphs, "{gid},{},\"[{gid}.5, 1.0]\"", gid % 2).unwrap();
    }
    std::fs::write(dir.path().join("nodes.csv"), nodes).unwrap();
    std::fs::write(dir.path().join("edges.csv"), edges).unwrap();
    std::fs::write(dir.path().join("graphs.csv"), graphs).unwrap();

    let ds = CsvDataset::load(dir.path(), DatasetOptions::default()).unwrap();
    assert_eq!(ds.len(), 10);
    assert_eq!(ds.graph_features()["label"].len(), 10);
    for i in 0..10 {
        let (g, row) = ds.get(i).unwrap();
        assert_eq!(g.num_nodes("_V"), 100);
        assert_eq!(g.num_edges(&EdgeType::default()), 1000);
        assert_eq!(row["label"], Feature::Int(vec![(i % 2) as i64]));
        assert_eq!(row["feat"].float_row(0), Some(&[i as f64 + 0.5, 1.0][..]));
    }

    // Graph table no longer covers graphs 8 and 9.
    let mut short = String::from("graph_id,label\n");
    for gid in 0..8 {
        writeln!(short, "{gid},0").unwrap();
    }
    std::fs::write(dir.path().join("graphs.csv"), short).unwrap();
    let err = CsvDataset::load(dir.path(), DatasetOptions::default()).unwrap_err();
    assert!(matches!(err, DataError::Reference(_)));
}

#[test]
fn customized_parser_applies_to_its_type_only() {
    let dir = tempdir().unwrap();
    std::fs::write(
        dir.path().join("meta.yaml"),
        "\
version: 1.0.0
dataset_name: hetero
separator: '|'
node_data:
  - file_name: users.csv
    ntype: user
  - file_name: items.csv
    ntype: item
edge_data:
  - file_name: likes.csv
    etype: [user, like, item]
  - file_name: follows.csv
    etype: [user, follow, user]
",
    )
    .unwrap();
    std::fs::write(dir.path().join("users.csv"), "node_id|label\n0|1\n1|2\n2|3\n").unwrap();
    std::fs::write(dir.path().join("items.csv"), "node_id|label\n0|5\n1|6\n").unwrap();
    std::fs::write(dir.path().join("likes.csv"), "src_id|dst_id|label\n0|1|0\n2|0|1\n").unwrap();
    std::fs::write(dir.path().join("follows.csv"), "src_id|dst_id|label\n0|1|7\n").unwrap();

    let plus_two = |table: &RawTable| -> Result<FeatureMap> {
        let mut data = DefaultDataParser.parse(table)?;
        if let Some(Feature::Int(values)) = data.get_mut("label") {
            values.iter_mut().for_each(|v| *v += 2);
        }
        Ok(data)
    };
    let parsers = ParserRegistry::new()
        .with_node_parser("user", plus_two)
        .with_edge_parser(("user", "like", "item"), plus_two);

    let ds = CsvDataset::load(dir.path(), DatasetOptions::default().parsers(parsers)).unwrap();
    let g = ds.graph(0).unwrap();
    assert!(!g.is_homogeneous());
    assert_eq!(g.node_features("user").unwrap()["label"], Feature::Int(vec![3, 4, 5]));
    assert_eq!(g.node_features("item").unwrap()["label"], Feature::Int(vec![5, 6]));
    let like = EdgeType::from(("user", "like", "item"));
    let follow = EdgeType::from(("user", "follow", "user"));
    assert_eq!(g.edge_features(&like).unwrap()["label"], Feature::Int(vec![2, 3]));
    assert_eq!(g.edge_features(&follow).unwrap()["label"], Feature::Int(vec![7]));
}

#[test]
fn missing_table_and_bad_manifest_fail() {
    let dir = tempdir().unwrap();
    std::fs::write(dir.path().join("meta.yaml"), HOMO_META).unwrap();
    std::fs::write(dir.path().join("test_nodes.csv"), "node_id\n0\n").unwrap();
    let err = CsvDataset::load(dir.path(), DatasetOptions::default()).unwrap_err();
    assert!(matches!(err, DataError::Io { .. }));

    std::fs::write(dir.path().join("meta.yaml"), "version: 0.0.0\ndataset_name: x\nnode_data: []\nedge_data: []\n").unwrap();
    let err = CsvDataset::load(dir.path(), DatasetOptions::default()).unwrap_err();
    assert!(matches!(err, DataError::Schema(_)));
}

#[test]
fn saved_edits_survive_reload() {
    let dir = tempdir().unwrap();
    write_homo(dir.path(), 5, 5);
    let mut ds = CsvDataset::load(dir.path(), DatasetOptions::default()).unwrap();
    ds.graphs_mut()[0]
        .node_features_mut("_V")
        .unwrap()
        .insert("flag".into(), Feature::Bool(vec![true; 5]));
    ds.save().unwrap();

    let again = CsvDataset::load(dir.path(), DatasetOptions::default()).unwrap();
    assert!(again.loaded_from_cache());
    assert!(again.graph(0).unwrap().node_features("_V").unwrap().contains_key("flag"));
}
