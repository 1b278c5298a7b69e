//! Weighted undirected graph with stable node identity

use crate::error::{Error, Result};
use petgraph::graph::{NodeIndex, UnGraph};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

/// Undirected weighted edge, stored with `source < target`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Edge {
    pub source: u32,
    pub target: u32,
    pub weight: f64,
}

impl Edge {
    /// Create an edge with its endpoints put in canonical order
    pub fn new(a: u32, b: u32, weight: f64) -> Self {
        let (source, target) = if a < b { (a, b) } else { (b, a) };
        Self {
            source,
            target,
            weight,
        }
    }

    /// The endpoint that is not `node`
    pub fn other(&self, node: u32) -> u32 {
        if self.source == node {
            self.target
        } else {
            self.source
        }
    }
}

/// Compressed sparse representation of a weighted undirected graph
///
/// Every edge appears once in `edges` and twice in the adjacency arrays
/// (once per endpoint). Adjacency lists are sorted by neighbor so that
/// edge lookup is a binary search.
#[derive(Debug, Clone, Serialize)]
pub struct WeightedGraph {
    /// Original string ID of each node, indexed by node index
    node_ids: Vec<String>,

    /// Canonical edge list
    edges: Vec<Edge>,

    /// offsets[i] to offsets[i+1] defines the adjacency range for node i
    offsets: Vec<u32>,

    /// Concatenated adjacency lists of (neighbor, edge index)
    adjacency: Vec<(u32, u32)>,

    #[serde(skip)]
    id_to_index: HashMap<String, u32>,
}

impl WeightedGraph {
    /// Assemble a graph from node IDs and an already validated edge list
    pub(crate) fn from_parts(node_ids: Vec<String>, edges: Vec<Edge>) -> Self {
        let node_count = node_ids.len();

        let mut degrees = vec![0u32; node_count];
        for edge in &edges {
            degrees[edge.source as usize] += 1;
            degrees[edge.target as usize] += 1;
        }

        let mut offsets = Vec::with_capacity(node_count + 1);
        offsets.push(0);
        let mut offset = 0;
        for &degree in &degrees {
            offset += degree;
            offsets.push(offset);
        }

        let mut adjacency = vec![(0u32, 0u32); offset as usize];
        let mut cursor: Vec<u32> = offsets[..node_count].to_vec();
        for (idx, edge) in edges.iter().enumerate() {
            let idx = idx as u32;
            adjacency[cursor[edge.source as usize] as usize] = (edge.target, idx);
            cursor[edge.source as usize] += 1;
            adjacency[cursor[edge.target as usize] as usize] = (edge.source, idx);
            cursor[edge.target as usize] += 1;
        }

        for node in 0..node_count {
            let start = offsets[node] as usize;
            let end = offsets[node + 1] as usize;
            adjacency[start..end].sort_unstable_by_key(|&(neighbor, _)| neighbor);
        }

        let id_to_index = node_ids
            .iter()
            .enumerate()
            .map(|(idx, id)| (id.clone(), idx as u32))
            .collect();

        Self {
            node_ids,
            edges,
            offsets,
            adjacency,
            id_to_index,
        }
    }

    /// Derive a graph over the same nodes with a different edge list
    ///
    /// The edges must satisfy the same rules as [`GraphBuilder`]: endpoints
    /// inside the node set, no self-loops, no repeated node pair and
    /// positive finite weights.
    ///
    /// [`GraphBuilder`]: crate::graph::GraphBuilder
    pub fn with_edges(&self, edges: Vec<Edge>) -> Result<Self> {
        let node_count = self.node_count() as u32;
        let mut seen = HashSet::with_capacity(edges.len());
        let mut canonical = Vec::with_capacity(edges.len());

        for edge in edges {
            let edge = Edge::new(edge.source, edge.target, edge.weight);
            if edge.target >= node_count {
                return Err(Error::malformed(format!(
                    "edge {}-{} refers to a node outside the graph",
                    edge.source, edge.target
                )));
            }
            if edge.source == edge.target {
                return Err(Error::malformed(format!(
                    "self-loop on node '{}'",
                    self.node_id(edge.source as usize)
                )));
            }
            if !(edge.weight.is_finite() && edge.weight > 0.0) {
                return Err(Error::malformed(format!(
                    "edge {}-{} has invalid weight {}",
                    self.node_id(edge.source as usize),
                    self.node_id(edge.target as usize),
                    edge.weight
                )));
            }
            if !seen.insert((edge.source, edge.target)) {
                return Err(Error::malformed(format!(
                    "duplicate edge {}-{}",
                    self.node_id(edge.source as usize),
                    self.node_id(edge.target as usize)
                )));
            }
            canonical.push(edge);
        }

        Ok(Self::from_parts(self.node_ids.clone(), canonical))
    }

    pub fn node_count(&self) -> usize {
        self.node_ids.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.node_ids.is_empty()
    }

    pub fn node_id(&self, node: usize) -> &str {
        &self.node_ids[node]
    }

    pub fn node_ids(&self) -> &[String] {
        &self.node_ids
    }

    /// Look up the index of a node by its string ID
    pub fn index_of(&self, id: &str) -> Option<u32> {
        self.id_to_index.get(id).copied()
    }

    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    pub fn edge(&self, idx: usize) -> &Edge {
        &self.edges[idx]
    }

    /// Neighbors of a node as (neighbor, edge index), sorted by neighbor
    pub fn neighbors(&self, node: usize) -> &[(u32, u32)] {
        let start = self.offsets[node] as usize;
        let end = self.offsets[node + 1] as usize;
        &self.adjacency[start..end]
    }

    /// Index of the edge between `a` and `b`, if any
    pub fn find_edge(&self, a: u32, b: u32) -> Option<usize> {
        let neighbors = self.neighbors(a as usize);
        neighbors
            .binary_search_by_key(&b, |&(neighbor, _)| neighbor)
            .ok()
            .map(|pos| neighbors[pos].1 as usize)
    }

    /// Number of incident edges
    pub fn degree(&self, node: usize) -> usize {
        (self.offsets[node + 1] - self.offsets[node]) as usize
    }

    /// Sum of incident edge weights
    pub fn strength(&self, node: usize) -> f64 {
        self.neighbors(node)
            .iter()
            .map(|&(_, idx)| self.edges[idx as usize].weight)
            .sum()
    }

    /// Sum of all edge weights, each edge counted once
    pub fn total_weight(&self) -> f64 {
        self.edges.iter().map(|e| e.weight).sum()
    }

    /// Convert to a petgraph graph whose node indices match ours
    pub fn to_petgraph(&self) -> UnGraph<(), f64> {
        let mut graph = UnGraph::with_capacity(self.node_count(), self.edge_count());
        for _ in 0..self.node_count() {
            graph.add_node(());
        }
        for edge in &self.edges {
            graph.add_edge(
                NodeIndex::new(edge.source as usize),
                NodeIndex::new(edge.target as usize),
                edge.weight,
            );
        }
        graph
    }
}
