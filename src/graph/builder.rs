//! Graph construction module

use crate::error::{Error, Result};
use crate::graph::{Edge, WeightedGraph};
use std::collections::{HashMap, HashSet};

/// Builder for incrementally constructing a WeightedGraph
pub struct GraphBuilder {
    /// Mapping from string IDs to node indices
    id_to_index: HashMap<String, u32>,

    /// Node string IDs in insertion order
    node_ids: Vec<String>,

    /// Edges added so far, canonical order
    edges: Vec<Edge>,

    /// Unordered pairs already present
    seen: HashSet<(u32, u32)>,
}

impl GraphBuilder {
    pub fn new() -> Self {
        Self::with_capacity(0)
    }

    /// Create a new graph builder with the given node capacity
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            id_to_index: HashMap::with_capacity(capacity),
            node_ids: Vec::with_capacity(capacity),
            edges: Vec::new(),
            seen: HashSet::new(),
        }
    }

    /// Get or create a node index for the given string ID
    pub fn add_node(&mut self, id: &str) -> u32 {
        if let Some(&idx) = self.id_to_index.get(id) {
            return idx;
        }

        let idx = self.node_ids.len() as u32;
        self.id_to_index.insert(id.to_string(), idx);
        self.node_ids.push(id.to_string());
        idx
    }

    /// Add an undirected weighted edge between two nodes
    pub fn add_edge(&mut self, src_id: &str, dst_id: &str, weight: f64) -> Result<()> {
        if src_id == dst_id {
            return Err(Error::malformed(format!("self-loop on node '{src_id}'")));
        }
        if !(weight.is_finite() && weight > 0.0) {
            return Err(Error::malformed(format!(
                "edge {src_id}-{dst_id} has non-positive weight {weight}"
            )));
        }

        let src_idx = self.add_node(src_id);
        let dst_idx = self.add_node(dst_id);
        let edge = Edge::new(src_idx, dst_idx, weight);

        if !self.seen.insert((edge.source, edge.target)) {
            return Err(Error::malformed(format!(
                "duplicate edge {src_id}-{dst_id}"
            )));
        }
        self.edges.push(edge);
        Ok(())
    }

    pub fn node_count(&self) -> usize {
        self.node_ids.len()
    }

    /// Build the weighted graph
    pub fn build(self) -> Result<WeightedGraph> {
        if self.node_ids.is_empty() {
            return Err(Error::malformed("graph has no nodes"));
        }
        Ok(WeightedGraph::from_parts(self.node_ids, self.edges))
    }
}

impl Default for GraphBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_assigns_stable_indices() {
        let mut builder = GraphBuilder::new();
        builder.add_edge("A", "B", 1.0).unwrap();
        builder.add_edge("C", "B", 0.5).unwrap();
        builder.add_node("D");
        let graph = builder.build().unwrap();

        assert_eq!(graph.node_count(), 4);
        assert_eq!(graph.edge_count(), 2);
        assert_eq!(graph.node_id(0), "A");
        assert_eq!(graph.index_of("D"), Some(3));
        assert_eq!(graph.degree(3), 0);
    }

    #[test]
    fn test_rejects_self_loop() {
        let mut builder = GraphBuilder::new();
        let result = builder.add_edge("A", "A", 1.0);
        assert!(matches!(result, Err(Error::MalformedInput(_))));
    }

    #[test]
    fn test_rejects_duplicate_in_either_direction() {
        let mut builder = GraphBuilder::new();
        builder.add_edge("A", "B", 1.0).unwrap();
        assert!(builder.add_edge("A", "B", 2.0).is_err());
        assert!(builder.add_edge("B", "A", 2.0).is_err());
    }

    #[test]
    fn test_rejects_bad_weight() {
        let mut builder = GraphBuilder::new();
        assert!(builder.add_edge("A", "B", 0.0).is_err());
        assert!(builder.add_edge("A", "B", -1.0).is_err());
        assert!(builder.add_edge("A", "B", f64::NAN).is_err());
    }

    #[test]
    fn test_empty_graph_is_rejected() {
        assert!(GraphBuilder::new().build().is_err());
    }
}
