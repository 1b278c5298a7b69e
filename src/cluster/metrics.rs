//! Community statistics for a final partition

use crate::cluster::Partition;
use crate::graph::WeightedGraph;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Number of highest-degree members reported per community
const CENTRAL_NODES: usize = 5;

/// Summary of one community of a partition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Community {
    /// Canonical label of the community
    pub id: usize,

    /// Member node indices
    pub members: Vec<u32>,

    pub size: usize,

    /// Internal edges / potential internal edges
    pub density: f64,

    /// Sum of weights of internal edges
    pub internal_weight: f64,

    /// Members with the most internal edges, highest first
    pub central_nodes: Vec<u32>,
}

/// Summarize every community, largest first
pub fn summarize_communities(graph: &WeightedGraph, partition: &Partition) -> Vec<Community> {
    let mut communities: Vec<Community> = partition
        .communities()
        .into_iter()
        .enumerate()
        .map(|(id, members)| {
            let member_set: HashSet<u32> = members.iter().copied().collect();

            let mut internal_edges = 0usize;
            let mut internal_weight = 0.0;
            let mut internal_degrees: Vec<(u32, usize)> = Vec::with_capacity(members.len());
            for &node in &members {
                let mut degree = 0;
                for &(neighbor, edge_idx) in graph.neighbors(node as usize) {
                    if member_set.contains(&neighbor) {
                        degree += 1;
                        // Count each internal edge from its lower endpoint
                        if node < neighbor {
                            internal_edges += 1;
                            internal_weight += graph.edge(edge_idx as usize).weight;
                        }
                    }
                }
                internal_degrees.push((node, degree));
            }

            internal_degrees.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));
            let central_nodes = internal_degrees
                .iter()
                .take(CENTRAL_NODES)
                .map(|&(node, _)| node)
                .collect();

            Community {
                id,
                size: members.len(),
                density: density(members.len(), internal_edges),
                internal_weight,
                central_nodes,
                members,
            }
        })
        .collect();

    communities.sort_by(|a, b| b.size.cmp(&a.size).then(a.id.cmp(&b.id)));
    communities
}

/// Density of an undirected community with `size` members
fn density(size: usize, internal_edges: usize) -> f64 {
    if size <= 1 {
        return 1.0; // By convention, singleton communities have density 1
    }
    let potential_edges = size * (size - 1) / 2;
    internal_edges as f64 / potential_edges as f64
}
