//! Structural node descriptors reported next to node consistency

use crate::graph::WeightedGraph;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

const EIGENVECTOR_MAX_ITER: usize = 1000;
const EIGENVECTOR_TOLERANCE: f64 = 1e-10;

/// Structural summary of one node
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeProfile {
    pub node: String,
    pub degree: usize,
    pub weighted_degree: f64,
    pub eigenvector_centrality: f64,
    pub betweenness: f64,
}

/// Compute degree, strength and centralities for every node
pub fn node_profiles(graph: &WeightedGraph) -> Vec<NodeProfile> {
    let eigenvector = eigenvector_centrality(graph);
    let betweenness = betweenness_centrality(graph);

    (0..graph.node_count())
        .map(|node| NodeProfile {
            node: graph.node_id(node).to_string(),
            degree: graph.degree(node),
            weighted_degree: graph.strength(node),
            eigenvector_centrality: eigenvector[node],
            betweenness: betweenness[node],
        })
        .collect()
}

/// Unweighted eigenvector centrality, scaled so the maximum is 1
///
/// Power iteration runs on `A + I`, which has the same leading
/// eigenvector as `A` but does not oscillate on bipartite graphs.
pub fn eigenvector_centrality(graph: &WeightedGraph) -> Vec<f64> {
    let n = graph.node_count();
    if graph.edge_count() == 0 {
        return vec![1.0; n];
    }

    let mut scores: Vec<f64> = (0..n).map(|node| graph.degree(node) as f64 + 1.0).collect();
    scale_to_max(&mut scores);

    for _ in 0..EIGENVECTOR_MAX_ITER {
        let mut next: Vec<f64> = (0..n)
            .map(|node| {
                scores[node]
                    + graph
                        .neighbors(node)
                        .iter()
                        .map(|&(neighbor, _)| scores[neighbor as usize])
                        .sum::<f64>()
            })
            .collect();
        scale_to_max(&mut next);

        let delta: f64 = next
            .iter()
            .zip(&scores)
            .map(|(a, b)| (a - b).abs())
            .sum();
        scores = next;
        if delta < EIGENVECTOR_TOLERANCE {
            break;
        }
    }

    // Isolated nodes only feed themselves through the identity shift
    for (node, score) in scores.iter_mut().enumerate() {
        if graph.degree(node) == 0 {
            *score = 0.0;
        }
    }
    scores
}

fn scale_to_max(values: &mut [f64]) {
    let max = values.iter().cloned().fold(0.0, f64::max);
    if max > 0.0 {
        values.iter_mut().for_each(|v| *v /= max);
    }
}

/// Unweighted betweenness centrality (Brandes), each unordered pair counted once
pub fn betweenness_centrality(graph: &WeightedGraph) -> Vec<f64> {
    let n = graph.node_count();

    let totals = (0..n)
        .into_par_iter()
        .map(|source| single_source_dependencies(graph, source))
        .reduce(
            || vec![0.0; n],
            |mut acc, partial| {
                acc.iter_mut().zip(partial).for_each(|(a, p)| *a += p);
                acc
            },
        );

    // Each shortest path was counted from both of its endpoints
    totals.into_iter().map(|v| v / 2.0).collect()
}

fn single_source_dependencies(graph: &WeightedGraph, source: usize) -> Vec<f64> {
    let n = graph.node_count();
    let mut stack = Vec::with_capacity(n);
    let mut predecessors: Vec<Vec<usize>> = vec![Vec::new(); n];
    let mut sigma = vec![0.0f64; n];
    let mut distance = vec![-1i64; n];
    sigma[source] = 1.0;
    distance[source] = 0;

    let mut queue = VecDeque::new();
    queue.push_back(source);
    while let Some(v) = queue.pop_front() {
        stack.push(v);
        for &(w, _) in graph.neighbors(v) {
            let w = w as usize;
            if distance[w] < 0 {
                distance[w] = distance[v] + 1;
                queue.push_back(w);
            }
            if distance[w] == distance[v] + 1 {
                sigma[w] += sigma[v];
                predecessors[w].push(v);
            }
        }
    }

    let mut delta = vec![0.0f64; n];
    while let Some(w) = stack.pop() {
        for &v in &predecessors[w] {
            delta[v] += sigma[v] / sigma[w] * (1.0 + delta[w]);
        }
    }
    delta[source] = 0.0;
    delta
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::GraphBuilder;

    fn star() -> WeightedGraph {
        let mut builder = GraphBuilder::new();
        builder.add_edge("hub", "a", 1.0).unwrap();
        builder.add_edge("hub", "b", 2.0).unwrap();
        builder.add_edge("hub", "c", 3.0).unwrap();
        builder.build().unwrap()
    }

    #[test]
    fn test_star_betweenness() {
        let scores = betweenness_centrality(&star());
        // hub lies on the paths a-b, a-c, b-c
        assert!((scores[0] - 3.0).abs() < 1e-9);
        assert!(scores[1].abs() < 1e-9);
    }

    #[test]
    fn test_path_betweenness() {
        let mut builder = GraphBuilder::new();
        builder.add_edge("a", "b", 1.0).unwrap();
        builder.add_edge("b", "c", 1.0).unwrap();
        builder.add_edge("c", "d", 1.0).unwrap();
        let scores = betweenness_centrality(&builder.build().unwrap());
        assert!((scores[1] - 2.0).abs() < 1e-9);
        assert!((scores[2] - 2.0).abs() < 1e-9);
        assert!(scores[0].abs() < 1e-9);
    }

    #[test]
    fn test_star_eigenvector() {
        let scores = eigenvector_centrality(&star());
        assert!((scores[0] - 1.0).abs() < 1e-6);
        assert!(scores[1] < 1.0);
        assert!((scores[1] - scores[3]).abs() < 1e-6);
    }

    #[test]
    fn test_profiles() {
        let mut builder = GraphBuilder::new();
        builder.add_edge("a", "b", 1.5).unwrap();
        builder.add_node("lonely");
        let profiles = node_profiles(&builder.build().unwrap());
        assert_eq!(profiles.len(), 3);
        assert_eq!(profiles[0].degree, 1);
        assert!((profiles[0].weighted_degree - 1.5).abs() < 1e-12);
        assert_eq!(profiles[2].node, "lonely");
        assert_eq!(profiles[2].eigenvector_centrality, 0.0);
        assert_eq!(profiles[2].betweenness, 0.0);
    }
}
