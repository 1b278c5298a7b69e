//! Graph algorithms used by the consensus loop

use crate::consensus::ConsensusMatrix;
use crate::graph::{Edge, WeightedGraph};

/// Union-Find data structure for connected component analysis
pub struct DisjointSets {
    /// Parent pointers (parent[i] = parent of node i)
    parent: Vec<u32>,

    /// Size of each set (for union by size)
    rank: Vec<u32>,
}

impl DisjointSets {
    /// Create a new DisjointSets data structure
    pub fn new(size: usize) -> Self {
        Self {
            parent: (0..size as u32).collect(),
            rank: vec![1; size],
        }
    }

    /// Find the root of the set containing x with path compression
    pub fn find(&mut self, x: u32) -> u32 {
        let mut root = x;
        while self.parent[root as usize] != root {
            root = self.parent[root as usize];
        }

        let mut node = x;
        while self.parent[node as usize] != root {
            let next = self.parent[node as usize];
            self.parent[node as usize] = root;
            node = next;
        }
        root
    }

    /// Union the sets containing x and y
    pub fn union(&mut self, x: u32, y: u32) {
        let root_x = self.find(x);
        let root_y = self.find(y);

        if root_x == root_y {
            return;
        }

        // Attach smaller tree under root of larger tree
        let rank_x = self.rank[root_x as usize];
        let rank_y = self.rank[root_y as usize];

        if rank_x > rank_y {
            self.parent[root_y as usize] = root_x;
            self.rank[root_x as usize] += rank_y;
        } else {
            self.parent[root_x as usize] = root_y;
            self.rank[root_y as usize] += rank_x;
        }
    }
}

/// Keep only the edges whose co-membership value reaches `threshold`
///
/// Edges whose endpoints were never co-clustered are dropped whatever the
/// threshold. With `reweight`, surviving edges carry their co-membership
/// value as weight; otherwise they keep the original weight. All nodes are
/// kept, isolated or not.
pub fn threshold_graph(
    graph: &WeightedGraph,
    matrix: &ConsensusMatrix,
    threshold: f64,
    reweight: bool,
) -> WeightedGraph {
    let edges: Vec<Edge> = graph
        .edges()
        .iter()
        .filter_map(|edge| {
            let value = matrix.get(edge.source, edge.target)?;
            if value < threshold {
                return None;
            }
            let weight = if reweight { value } else { edge.weight };
            Some(Edge::new(edge.source, edge.target, weight))
        })
        .collect();

    log::debug!(
        "Threshold {:.3} kept {} of {} edges",
        threshold,
        edges.len(),
        graph.edge_count()
    );

    // A subset of a valid graph's edges needs no re-validation
    WeightedGraph::from_parts(graph.node_ids().to_vec(), edges)
}

/// Number of connected components, isolated nodes included
pub fn connected_components(graph: &WeightedGraph) -> usize {
    petgraph::algo::connected_components(&graph.to_petgraph())
}
