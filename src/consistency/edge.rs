//! Edge-level consistency

use crate::consensus::ConsensusMatrix;
use crate::graph::WeightedGraph;
use serde::{Deserialize, Serialize};

/// Consensus evidence for one edge of the graph
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EdgeConsistency {
    pub source: String,
    pub target: String,
    pub weight: f64,

    /// Co-membership frequency of the endpoints, `None` if never co-clustered
    pub consensus: Option<f64>,

    /// Consensus relative to the strongest consensus around either endpoint
    pub consistency: Option<f64>,
}

/// Attach consensus and consistency values to every edge
///
/// The consistency of edge (i, j) is its consensus divided by the largest
/// consensus among all edges incident to i or j, so 1 marks an edge at least
/// as stable as anything in its neighborhood. Edges without co-membership
/// evidence get `None` for both values and do not enter any neighbor's
/// normalization.
pub fn edge_consistency(graph: &WeightedGraph, matrix: &ConsensusMatrix) -> Vec<EdgeConsistency> {
    let consensus: Vec<Option<f64>> = graph
        .edges()
        .iter()
        .map(|edge| matrix.get(edge.source, edge.target))
        .collect();

    // Strongest defined consensus around each node
    let neighborhood_max: Vec<Option<f64>> = (0..graph.node_count())
        .map(|node| {
            graph
                .neighbors(node)
                .iter()
                .filter_map(|&(_, edge_idx)| consensus[edge_idx as usize])
                .reduce(f64::max)
        })
        .collect();

    graph
        .edges()
        .iter()
        .zip(&consensus)
        .map(|(edge, &value)| {
            let consistency = value.and_then(|value| {
                let max = [
                    neighborhood_max[edge.source as usize],
                    neighborhood_max[edge.target as usize],
                ]
                .into_iter()
                .flatten()
                .reduce(f64::max)?;
                (max > 0.0).then(|| value / max)
            });

            EdgeConsistency {
                source: graph.node_id(edge.source as usize).to_string(),
                target: graph.node_id(edge.target as usize).to_string(),
                weight: edge.weight,
                consensus: value,
                consistency,
            }
        })
        .collect()
}
