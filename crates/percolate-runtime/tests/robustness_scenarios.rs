//! End-to-end robustness experiments.
//!
//! Each test builds a graph, derives an attack order and runs the
//! percolation engine through the public prelude, the way a caller would.

use percolate_runtime::prelude::*;
use rand::rngs::StdRng;
use rand::SeedableRng;

// ============================================================================
// Attack orders
// ============================================================================

#[test]
fn every_strategy_orders_every_node_once() {
    let mut rng = StdRng::seed_from_u64(21);
    let graphs = vec![
        complete_graph(8),
        barabasi_albert_graph(60, 2, &mut rng).unwrap(),
        watts_strogatz_graph(40, 4, 0.2, &mut rng).unwrap(),
        NetworkGraph::new_undirected(),
    ];
    let strategies = ["random", "degree", "betweenness", "fiedler"];

    for graph in &graphs {
        let mut expected = graph.nodes();
        expected.sort();
        for name in strategies {
            let strategy: AttackStrategy = name.parse().unwrap();
            let order = attack_order(graph, &strategy, &AttackOptions::default());
            let mut got = order.into_vec();
            got.sort();
            assert_eq!(got, expected, "strategy {}", name);
        }
    }
}

#[test]
fn targeted_attack_fragments_scale_free_graph_faster_than_random() {
    let graph = barabasi_albert_graph(300, 2, &mut StdRng::seed_from_u64(2)).unwrap();
    let config = PercolationConfig {
        num_steps: Some(10),
        kirchhoff_max_n: 0,
        ..PercolationConfig::default()
    };

    let targeted = run_percolation(&graph, &degree_attack(&graph, false), &config).unwrap();
    let random = run_percolation(&graph, &random_attack(&graph, Some(2)), &config).unwrap();

    // After removing 20% of the nodes, hubs-first leaves a smaller giant component.
    assert_eq!(targeted[2].removed_nodes, 60);
    assert!(targeted[2].gcc_fraction < random[2].gcc_fraction);
}

// ============================================================================
// Components
// ============================================================================

#[test]
fn two_disjoint_triangles() {
    let mut graph = NetworkGraph::new_undirected();
    for (a, b) in [(0, 1), (1, 2), (2, 0), (3, 4), (4, 5), (5, 3)] {
        graph.add_edge(NodeId(a), NodeId(b));
    }
    assert_eq!(number_of_components(&graph, ComponentKind::Weak), 2);
    assert_eq!(component_partition_by_name(&graph, "weak").unwrap().len(), 2);
    assert!(matches!(
        component_partition_by_name(&graph, "diagonal"),
        Err(PercolateError::InvalidKind(_))
    ));
}

#[test]
fn strong_kind_tracks_directed_cycles() {
    let mut graph = NetworkGraph::new_directed();
    for (a, b) in [(0, 1), (1, 2), (2, 0), (2, 3), (3, 4)] {
        graph.add_edge(NodeId(a), NodeId(b));
    }
    let order = AttackOrder::validated(
        &graph,
        vec![NodeId(4), NodeId(3), NodeId(0), NodeId(1), NodeId(2)],
    )
    .unwrap();
    let config = PercolationConfig {
        kind: ComponentKind::Strong,
        ..PercolationConfig::default()
    };
    let records = run_percolation(&graph, &order, &config).unwrap();

    assert_eq!(records[0].gcc_size, 3);
    assert_eq!(records[0].num_components, 3);
    // Breaking the cycle leaves only singletons.
    assert_eq!(records[3].gcc_size, 1);
}

// ============================================================================
// Percolation engine
// ============================================================================

#[test]
fn complete_graph_loses_one_tenth_per_removal() {
    let graph = complete_graph(10);
    let order = degree_attack(&graph, false);
    assert_eq!(order.as_slice(), graph.nodes().as_slice());

    let records = run_percolation(&graph, &order, &PercolationConfig::default()).unwrap();
    let fractions: Vec<f64> = records.iter().map(|r| r.gcc_fraction).collect();
    for (removed, fraction) in fractions.iter().enumerate() {
        assert!((fraction - (10 - removed) as f64 / 10.0).abs() < 1e-12);
    }
}

#[test]
fn connected_inputs_start_at_one_and_end_at_zero() {
    let mut rng = StdRng::seed_from_u64(13);
    let graphs = vec![
        cycle_graph(15),
        watts_strogatz_graph(30, 4, 0.1, &mut rng).unwrap(),
        complete_graph(5),
    ];
    for graph in &graphs {
        let order = betweenness_attack(graph, false, true);
        let config = PercolationConfig {
            num_steps: Some(4),
            ..PercolationConfig::default()
        };
        let records = run_percolation(graph, &order, &config).unwrap();
        assert!(records.len() <= 5);
        assert_eq!(records.first().unwrap().gcc_fraction, 1.0);
        assert_eq!(records.last().unwrap().gcc_fraction, 0.0);
    }
}

#[test]
fn fiedler_attack_on_a_path() {
    let graph = path_graph(5);
    let order = fiedler_attack(&graph);
    let records = run_percolation(&graph, &order, &PercolationConfig::default()).unwrap();

    let mut first_two = order.as_slice()[..2].to_vec();
    first_two.sort();
    assert_eq!(first_two, vec![NodeId(0), NodeId(4)]);
    assert_eq!(records[1].num_components, 1);
    assert_eq!(records[1].gcc_size, 4);
}

#[test]
fn runs_can_stop_early() {
    let graph = complete_graph(20);
    let order = random_attack(&graph, Some(5));
    let mut run = PercolationRun::new(&graph, &order, PercolationConfig::default()).unwrap();

    let first: Vec<MetricsRecord> = run.by_ref().take(3).collect();
    assert_eq!(first.len(), 3);
    assert_eq!(run.removed(), 2);
    assert_eq!(run.working_graph().node_count(), 18);
    assert_eq!(graph.node_count(), 20);
}

// ============================================================================
// Spectral guard
// ============================================================================

#[test]
fn kirchhoff_size_guard() {
    assert!(kirchhoff_index(&cycle_graph(1000), 1000).is_ok());
    assert!(matches!(
        kirchhoff_index(&cycle_graph(1001), 1000),
        Err(PercolateError::TooLarge { nodes: 1001, max_nodes: 1000 })
    ));
}

// ============================================================================
// Export
// ============================================================================

#[test]
fn records_survive_a_csv_file() {
    let graph = path_graph(6);
    let order = degree_attack(&graph, false);
    let records = run_percolation(&graph, &order, &PercolationConfig::default()).unwrap();

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("curve.csv");
    write_csv_file(&records, &path).unwrap();

    let back = read_csv(std::fs::File::open(&path).unwrap()).unwrap();
    assert_eq!(back.len(), records.len());
    assert_eq!(back.last().unwrap().algebraic_connectivity_gcc, None);
    for (a, b) in back.iter().zip(&records) {
        assert_eq!(a.gcc_size, b.gcc_size);
        assert_eq!(a.kirchhoff_index_gcc.is_some(), b.kirchhoff_index_gcc.is_some());
    }
}
