use tabgraph_schema::{load_manifest, DataError, EdgeType, TypeKind};
use tempfile::tempdir;

fn write_manifest(dir: &std::path::Path, text: &str) -> std::path::PathBuf {
    let path = dir.join("meta.yaml");
    std::fs::write(&path, text).unwrap();
    path
}

#[test]
fn empty_tables_are_workable() {
    let dir = tempdir().unwrap();
    let path = write_manifest(
        dir.path(),
        "version: 1.0.0\ndataset_name: default\nnode_data: []\nedge_data: []\n",
    );
    let meta = load_manifest(&path).unwrap();
    assert_eq!(meta.version, "1.0.0");
    assert_eq!(meta.dataset_name, "default");
    assert_eq!(meta.separator, ",");
    assert!(meta.node_data.is_empty());
    assert!(meta.edge_data.is_empty());
    assert!(meta.graph_data.is_none());
}

#[test]
fn optional_fields_override_defaults() {
    let dir = tempdir().unwrap();
    let path = write_manifest(
        dir.path(),
        r#"
version: 1.0.0
dataset_name: default
separator: "|"
node_data:
  - file_name: nodes.csv
    ntype: user
    graph_id_field: xxx
    node_id_field: xxx
edge_data:
  - file_name: edges.csv
    etype: [user, follow, user]
    graph_id_field: xxx
    src_id_field: xxx
    dst_id_field: xxx
graph_data:
  file_name: graph.csv
  graph_id_field: xxx
"#,
    );
    let meta = load_manifest(&path).unwrap();
    assert_eq!(meta.separator_byte(), b'|');

    let ndata = &meta.node_data[0];
    assert_eq!(ndata.ntype, "user");
    assert_eq!(ndata.graph_id_field, "xxx");
    assert_eq!(ndata.node_id_field, "xxx");

    let edata = &meta.edge_data[0];
    assert_eq!(edata.etype, EdgeType::from(("user", "follow", "user")));
    assert_eq!(edata.graph_id_field, "xxx");
    assert_eq!(edata.src_id_field, "xxx");
    assert_eq!(edata.dst_id_field, "xxx");

    let gdata = meta.graph_data.as_ref().unwrap();
    assert_eq!(gdata.file_name, "graph.csv");
    assert_eq!(gdata.graph_id_field, "xxx");
}

#[test]
fn each_required_key_is_enforced() {
    let dir = tempdir().unwrap();
    let lines = [
        "version: 1.0.0",
        "dataset_name: default",
        "node_data: []",
        "edge_data: []",
    ];
    for skip in 0..lines.len() {
        let text: Vec<&str> = lines
            .iter()
            .enumerate()
            .filter(|(i, _)| *i != skip)
            .map(|(_, l)| *l)
            .collect();
        let path = write_manifest(dir.path(), &text.join("\n"));
        let err = load_manifest(&path).unwrap_err();
        assert!(
            matches!(err, DataError::Schema(_)),
            "dropping `{}` should fail with a schema error, got {err:?}",
            lines[skip]
        );
    }
}

#[test]
fn descriptors_require_file_name() {
    let dir = tempdir().unwrap();
    let path = write_manifest(
        dir.path(),
        "version: 1.0.0\ndataset_name: d\nnode_data:\n  - ntype: user\nedge_data: []\n",
    );
    assert!(matches!(load_manifest(&path), Err(DataError::Schema(_))));

    let path = write_manifest(
        dir.path(),
        "version: 1.0.0\ndataset_name: d\nnode_data: []\nedge_data:\n  - etype: [a, b, c]\n",
    );
    assert!(matches!(load_manifest(&path), Err(DataError::Schema(_))));

    let path = write_manifest(
        dir.path(),
        "version: 1.0.0\ndataset_name: d\nnode_data: []\nedge_data: []\ngraph_data:\n  graph_id_field: g\n",
    );
    assert!(matches!(load_manifest(&path), Err(DataError::Schema(_))));
}

#[test]
fn unsupported_version_is_rejected() {
    let dir = tempdir().unwrap();
    let path = write_manifest(
        dir.path(),
        "version: 0.0.0\ndataset_name: d\nnode_data:\n  - file_name: nodes_0.csv\nedge_data:\n  - file_name: edges_0.csv\n",
    );
    assert!(matches!(load_manifest(&path), Err(DataError::Schema(_))));
}

#[test]
fn duplicate_node_types_are_rejected() {
    let dir = tempdir().unwrap();
    let path = write_manifest(
        dir.path(),
        "version: 1.0.0\ndataset_name: d\nnode_data:\n  - file_name: nodes.csv\n  - file_name: nodes.csv\nedge_data:\n  - file_name: edges.csv\n",
    );
    match load_manifest(&path) {
        Err(DataError::DuplicateType { kind, label }) => {
            assert_eq!(kind, TypeKind::Node);
            assert_eq!(label, "_V");
        }
        other => panic!("expected duplicate node type, got {other:?}"),
    }
}

#[test]
fn duplicate_edge_types_are_rejected() {
    let dir = tempdir().unwrap();
    let path = write_manifest(
        dir.path(),
        "version: 1.0.0\ndataset_name: d\nnode_data:\n  - file_name: nodes.csv\nedge_data:\n  - file_name: edges.csv\n  - file_name: edges.csv\n",
    );
    match load_manifest(&path) {
        Err(DataError::DuplicateType { kind, .. }) => assert_eq!(kind, TypeKind::Edge),
        other => panic!("expected duplicate edge type, got {other:?}"),
    }
}

#[test]
fn same_label_in_different_triples_is_fine() {
    let dir = tempdir().unwrap();
    let path = write_manifest(
        dir.path(),
        "version: 1.0.0\ndataset_name: d\nnode_data: []\nedge_data:\n  - file_name: a.csv\n    etype: [user, like, item]\n  - file_name: b.csv\n    etype: [user, like, user]\n",
    );
    let meta = load_manifest(&path).unwrap();
    assert_eq!(meta.edge_data.len(), 2);
}

#[test]
fn missing_manifest_file_is_io_error() {
    let dir = tempdir().unwrap();
    let err = load_manifest(&dir.path().join("meta.yaml")).unwrap_err();
    assert!(matches!(err, DataError::Io { .. }));
}
