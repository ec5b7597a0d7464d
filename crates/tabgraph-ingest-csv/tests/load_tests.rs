use rand::Rng;
use std::fmt::Write as _;
use std::path::Path;
use tabgraph_ingest_csv::{DefaultDataParser, EdgeData, Feature, GraphData, NodeData};
use tabgraph_schema::{DataError, EdgeType, MetaEdge, MetaGraph, MetaNode};
use tempfile::tempdir;

fn write_csv(dir: &Path, name: &str, headers: &[&str], rows: &[Vec<String>]) {
    let mut text = headers.join(",");
    text.push('\n');
    for row in rows {
        writeln!(text, "{}", row.join(",")).unwrap();
    }
    std::fs::write(dir.join(name), text).unwrap();
}

#[test]
fn node_table_minimum() {
    let dir = tempdir().unwrap();
    let rows: Vec<Vec<String>> = (0..100).map(|i| vec![i.to_string()]).collect();
    write_csv(dir.path(), "nodes.csv", &["node_id"], &rows);

    let ndata =
        NodeData::load_from_csv(&MetaNode::new("nodes.csv"), dir.path(), b',', &DefaultDataParser).unwrap();
    assert_eq!(ndata.id(), (0..100).collect::<Vec<i64>>().as_slice());
    assert!(ndata.data().is_empty());
}

#[test]
fn node_table_with_label_and_graph_id() {
    let dir = tempdir().unwrap();
    let mut rng = rand::thread_rng();
    let labels: Vec<i64> = (0..100).map(|_| rng.gen_range(0..3)).collect();

    let rows: Vec<Vec<String>> = (0..100)
        .map(|i| vec![i.to_string(), labels[i].to_string()])
        .collect();
    write_csv(dir.path(), "nodes.csv", &["node_id", "label"], &rows);
    let ndata =
        NodeData::load_from_csv(&MetaNode::new("nodes.csv"), dir.path(), b',', &DefaultDataParser).unwrap();
    assert_eq!(ndata.data().len(), 1);
    assert_eq!(ndata.data()["label"], Feature::Int(labels.clone()));
    assert_eq!(ndata.graph_id(), vec![0; 100].as_slice());
    assert_eq!(ndata.ntype(), "_V");

    let rows: Vec<Vec<String>> = (0..100)
        .map(|i| vec![i.to_string(), labels[i].to_string(), "1".to_string()])
        .collect();
    write_csv(dir.path(), "nodes.csv", &["node_id", "label", "graph_id"], &rows);
    let ndata =
        NodeData::load_from_csv(&MetaNode::new("nodes.csv"), dir.path(), b',', &DefaultDataParser).unwrap();
    assert_eq!(ndata.data().len(), 1);
    assert_eq!(ndata.graph_id(), vec![1; 100].as_slice());
}

#[test]
fn node_table_without_id_column_fails() {
    let dir = tempdir().unwrap();
    write_csv(dir.path(), "nodes.csv", &["label"], &[vec!["1".into()]]);
    let err = NodeData::load_from_csv(&MetaNode::new("nodes.csv"), dir.path(), b',', &DefaultDataParser)
        .unwrap_err();
    assert!(matches!(err, DataError::MissingColumn { ref column, .. } if column == "node_id"));
}

#[test]
fn edge_table_round_trips_columns() {
    let dir = tempdir().unwrap();
    let mut rng = rand::thread_rng();
    let src: Vec<i64> = (0..1000).map(|_| rng.gen_range(0..100)).collect();
    let dst: Vec<i64> = (0..1000).map(|_| rng.gen_range(0..100)).collect();
    let feat: Vec<i64> = (0..1000).map(|_| rng.gen_range(0..3)).collect();

    let rows: Vec<Vec<String>> = (0..1000)
        .map(|i| {
            vec![
                src[i].to_string(),
                dst[i].to_string(),
                i.to_string(),
                feat[i].to_string(),
            ]
        })
        .collect();
    write_csv(dir.path(), "edges.csv", &["src_id", "dst_id", "graph_id", "feat"], &rows);

    let edata =
        EdgeData::load_from_csv(&MetaEdge::new("edges.csv"), dir.path(), b',', &DefaultDataParser).unwrap();
    assert_eq!(edata.src(), src.as_slice());
    assert_eq!(edata.dst(), dst.as_slice());
    assert_eq!(edata.graph_id(), (0..1000).collect::<Vec<i64>>().as_slice());
    assert_eq!(edata.data()["feat"], Feature::Int(feat));
    assert_eq!(edata.etype(), &EdgeType::default());
}

#[test]
fn edge_table_requires_both_endpoints() {
    let dir = tempdir().unwrap();
    write_csv(dir.path(), "edges.csv", &["src_id"], &[vec!["1".into()]]);
    let err = EdgeData::load_from_csv(&MetaEdge::new("edges.csv"), dir.path(), b',', &DefaultDataParser)
        .unwrap_err();
    assert!(matches!(err, DataError::MissingColumn { ref column, .. } if column == "dst_id"));

    write_csv(dir.path(), "edges.csv", &["dst_id"], &[vec!["1".into()]]);
    let err = EdgeData::load_from_csv(&MetaEdge::new("edges.csv"), dir.path(), b',', &DefaultDataParser)
        .unwrap_err();
    assert!(matches!(err, DataError::MissingColumn { ref column, .. } if column == "src_id"));
}

#[test]
fn graph_table_requires_graph_id() {
    let dir = tempdir().unwrap();
    let rows: Vec<Vec<String>> = (0..10)
        .map(|i| vec![i.to_string(), format!("\"[{i}.5, 1.0]\"")])
        .collect();
    write_csv(dir.path(), "graph.csv", &["graph_id", "feat"], &rows);
    let gdata =
        GraphData::load_from_csv(&MetaGraph::new("graph.csv"), dir.path(), b',', &DefaultDataParser).unwrap();
    assert_eq!(gdata.graph_id(), (0..10).collect::<Vec<i64>>().as_slice());
    let feat = gdata.feature("feat").unwrap();
    assert_eq!(feat.width(), 2);
    assert_eq!(feat.float_row(3), Some(&[3.5, 1.0][..]));

    write_csv(dir.path(), "graph.csv", &["label"], &[vec!["1".into()]]);
    let err = GraphData::load_from_csv(&MetaGraph::new("graph.csv"), dir.path(), b',', &DefaultDataParser)
        .unwrap_err();
    assert!(matches!(err, DataError::MissingColumn { .. }));
}

#[test]
fn custom_node_id_field_and_separator() {
    let dir = tempdir().unwrap();
    std::fs::write(dir.path().join("n.csv"), "uid|score\n7|0.5\n9|1.5\n").unwrap();
    let mut meta = MetaNode::new("n.csv").with_ntype("user");
    meta.node_id_field = "uid".to_string();

    let ndata = NodeData::load_from_csv(&meta, dir.path(), b'|', &DefaultDataParser).unwrap();
    assert_eq!(ndata.id(), &[7, 9]);
    assert_eq!(ndata.ntype(), "user");
    assert_eq!(ndata.data()["score"], Feature::Float(vec![0.5, 1.5]));
}

#[test]
fn leading_index_column_is_not_surfaced() {
    let dir = tempdir().unwrap();
    std::fs::write(
        dir.path().join("nodes.csv"),
        ",node_id,label\n0,10,1\n1,11,0\n",
    )
    .unwrap();
    let ndata =
        NodeData::load_from_csv(&MetaNode::new("nodes.csv"), dir.path(), b',', &DefaultDataParser).unwrap();
    assert_eq!(ndata.id(), &[10, 11]);
    assert_eq!(ndata.data().keys().collect::<Vec<_>>(), vec!["label"]);
}
