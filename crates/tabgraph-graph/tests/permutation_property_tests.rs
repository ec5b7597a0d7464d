use proptest::prelude::*;
use tabgraph_graph::construct_graphs;
use tabgraph_ingest_csv::{EdgeData, Feature, FeatureMap, NodeData};
use tabgraph_schema::EdgeType;

const MAX_NODES: usize = 40;
const MAX_EDGES: usize = 120;

#[derive(Debug, Clone)]
struct TableCase {
    ids: Vec<i64>,
    edges: Vec<(usize, usize)>,
    order: Vec<usize>,
}

fn table_case_strategy() -> impl Strategy<Value = TableCase> {
    prop::collection::btree_set(-1000i64..1000, 1..=MAX_NODES).prop_flat_map(|ids| {
        let ids: Vec<i64> = ids.into_iter().collect();
        let n = ids.len();
        (
            Just(ids),
            prop::collection::vec((0..n, 0..n), 0..=MAX_EDGES),
            Just((0..n).collect::<Vec<usize>>()).prop_shuffle(),
        )
            .prop_map(|(ids, edges, order)| TableCase { ids, edges, order })
    })
}

/// `(ext src, ext dst, weight)` per edge, read back through the node feature.
fn edge_view(ids: &[i64], order: &[usize], edges: &[(usize, usize)]) -> Vec<(i64, i64, i64)> {
    let node_ids: Vec<i64> = order.iter().map(|&i| ids[i]).collect();
    let ndata = NodeData::new(
        node_ids.clone(),
        [("ext".to_string(), Feature::Int(node_ids))].into_iter().collect(),
    )
    .unwrap();
    let weights: Vec<i64> = (0..edges.len() as i64).collect();
    let edata = EdgeData::new(
        edges.iter().map(|&(s, _)| ids[s]).collect::<Vec<i64>>(),
        edges.iter().map(|&(_, d)| ids[d]).collect::<Vec<i64>>(),
        [("w".to_string(), Feature::Int(weights))].into_iter().collect::<FeatureMap>(),
    )
    .unwrap();

    let (graphs, _) = construct_graphs(&[ndata], &[edata], None).unwrap();
    let g = &graphs[0];
    let etype = EdgeType::default();
    let ext = g.node_features("_V").unwrap()["ext"].as_int().unwrap();
    let w = g.edge_features(&etype).unwrap()["w"].as_int().unwrap();
    let (s, d) = g.edges(&etype).unwrap();
    (0..s.len()).map(|i| (ext[s[i]], ext[d[i]], w[i])).collect()
}

proptest! {
    #[test]
    fn permuting_node_rows_gives_isomorphic_graph(case in table_case_strategy()) {
        let identity: Vec<usize> = (0..case.ids.len()).collect();
        let base = edge_view(&case.ids, &identity, &case.edges);
        let permuted = edge_view(&case.ids, &case.order, &case.edges);
        prop_assert_eq!(base, permuted);
    }

    #[test]
    fn node_count_equals_distinct_ids(ids in prop::collection::vec(0i64..30, 1..100)) {
        let ndata = NodeData::new(ids.clone(), FeatureMap::new()).unwrap();
        let (graphs, _) = construct_graphs(&[ndata], &[], None).unwrap();
        let mut distinct = ids.clone();
        distinct.sort_unstable();
        distinct.dedup();
        prop_assert_eq!(graphs[0].num_nodes("_V"), distinct.len());
    }
}
