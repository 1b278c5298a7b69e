use consensus_cluster::cluster::{generate_partitions, modularity};
use consensus_cluster::consensus::{sweep_thresholds, ConsensusMatrix};
use consensus_cluster::{
    consensus_partition, edge_consistency, node_consistency, ConsensusConfig, ConsensusEngine,
    Error, GraphBuilder, Louvain, Partition, WeightedGraph,
};

fn chain() -> WeightedGraph {
    let mut builder = GraphBuilder::new();
    builder.add_edge("A", "B", 1.0).unwrap();
    builder.add_edge("C", "D", 1.0).unwrap();
    builder.add_edge("B", "C", 0.1).unwrap();
    builder.build().unwrap()
}

fn seeds() -> Vec<Partition> {
    vec![
        Partition::new(vec![0, 0, 1, 1]),
        Partition::new(vec![0, 0, 1, 1]),
        Partition::new(vec![0, 0, 0, 1]),
    ]
}

fn cliques() -> WeightedGraph {
    let mut builder = GraphBuilder::new();
    for group in [["a1", "a2", "a3", "a4"], ["b1", "b2", "b3", "b4"]] {
        for i in 0..group.len() {
            for j in (i + 1)..group.len() {
                builder.add_edge(group[i], group[j], 1.0).unwrap();
            }
        }
    }
    builder.add_edge("a1", "b1", 0.05).unwrap();
    builder.build().unwrap()
}

#[test]
fn test_chain_end_to_end() {
    let graph = chain();
    let config = ConsensusConfig::default().with_threshold(0.5);
    let outcome = consensus_partition(&Louvain::new(), &graph, &seeds(), &config).unwrap();

    assert_eq!(outcome.iterations, 1);
    assert!(outcome.partition.same_grouping(&Partition::new(vec![0, 0, 1, 1])));

    let edges = edge_consistency(&graph, &outcome.matrix);
    assert_eq!(edges.len(), graph.edge_count());
    let bridge = edges
        .iter()
        .find(|e| (e.source.as_str(), e.target.as_str()) == ("B", "C"))
        .unwrap();
    assert!((bridge.consensus.unwrap() - 1.0 / 3.0).abs() < 1e-12);
    assert!((bridge.consistency.unwrap() - 1.0 / 3.0).abs() < 1e-12);

    let nodes = node_consistency(&graph, &edges, None).unwrap();
    assert_eq!(nodes.len(), 4);
    assert_eq!(nodes[0].node, "A");
    assert_eq!(nodes[0].mean, Some(1.0));
    assert!((nodes[1].mean.unwrap() - 2.0 / 3.0).abs() < 1e-12);
    for node in &nodes {
        let fractions: Vec<f64> = node.neighbors.iter().filter_map(|f| f.fraction).collect();
        assert!(fractions.windows(2).all(|pair| pair[0] >= pair[1]));
    }

    // Same inputs give the same tables
    let again = node_consistency(&graph, &edge_consistency(&graph, &outcome.matrix), None).unwrap();
    assert_eq!(nodes, again);
}

#[test]
fn test_matrix_is_symmetric_and_bounded() {
    let graph = cliques();
    let partitions = generate_partitions(&Louvain::new(), &graph, 12, None, 3).unwrap();
    let matrix = ConsensusMatrix::build(&partitions).unwrap();

    for a in 0..graph.node_count() as u32 {
        for b in 0..graph.node_count() as u32 {
            assert_eq!(matrix.get(a, b), matrix.get(b, a));
            if let Some(value) = matrix.get(a, b) {
                assert!(value > 0.0 && value <= 1.0);
            }
        }
    }
}

#[test]
fn test_engine_from_scratch_finds_cliques() {
    let graph = cliques();
    let config = ConsensusConfig::default()
        .with_partition_count(16)
        .with_seed(11);
    let engine = ConsensusEngine::new(Louvain::new(), config);

    let seeds = engine.initial_partitions(&graph).unwrap();
    assert_eq!(seeds.len(), 16);
    let outcome = engine.consensus_partition(&graph, &seeds).unwrap();

    // Nodes are indexed in insertion order
    let expected = Partition::new(vec![0, 0, 0, 0, 1, 1, 1, 1]);
    assert!(outcome.partition.same_grouping(&expected));
    assert!(modularity(&graph, &outcome.partition, 1.0) > 0.4);
}

#[test]
fn test_sweep_shares_seeds_across_thresholds() {
    let graph = cliques();
    let config = ConsensusConfig::default().with_partition_count(8);
    let engine = ConsensusEngine::new(Louvain::new(), config);
    let seeds = engine.initial_partitions(&graph).unwrap();

    let results = sweep_thresholds(
        engine.detector(),
        &graph,
        &seeds,
        &[0.25, 0.5, 0.75],
        engine.config(),
    )
    .unwrap();
    assert_eq!(results.len(), 3);
    for result in results.iter().filter(|r| r.converged()) {
        let partition = result.partition.as_ref().unwrap();
        assert_eq!(partition.len(), graph.node_count());
        assert!(result.modularity.is_some());
    }
}

#[test]
fn test_rejects_mismatched_seeds() {
    let graph = chain();
    let seeds = vec![Partition::new(vec![0, 0, 1])];
    let result = consensus_partition(&Louvain::new(), &graph, &seeds, &ConsensusConfig::default());
    assert!(matches!(result, Err(Error::MalformedInput(_))));
}
