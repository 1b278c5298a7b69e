//! Partitions and community detection

pub mod detection;
pub mod generator;
pub mod metrics;

pub use detection::{modularity, CommunityDetection, Louvain};
pub use generator::{generate_partitions, run_seed};
pub use metrics::{summarize_communities, Community};

use crate::error::{Error, Result};
use crate::graph::{DisjointSets, WeightedGraph};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::hash::Hash;

/// Assignment of every node (by index) to a community label
///
/// Label values carry no meaning beyond equality: two partitions that group
/// the nodes the same way are interchangeable, see [`Partition::same_grouping`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Partition {
    labels: Vec<usize>,
}

impl Partition {
    pub fn new(labels: Vec<usize>) -> Self {
        Self { labels }
    }

    /// Every node in its own community
    pub fn singletons(node_count: usize) -> Self {
        Self::new((0..node_count).collect())
    }

    /// Build a partition from (node ID, label) pairs with arbitrary labels
    ///
    /// Every node of `graph` must be assigned exactly once and no unknown
    /// node may appear.
    pub fn from_assignments<'a, L, I>(graph: &WeightedGraph, assignments: I) -> Result<Self>
    where
        L: Hash + Eq,
        I: IntoIterator<Item = (&'a str, L)>,
    {
        let mut label_ids: HashMap<L, usize> = HashMap::new();
        let mut labels: Vec<Option<usize>> = vec![None; graph.node_count()];

        for (id, label) in assignments {
            let node = graph
                .index_of(id)
                .ok_or_else(|| Error::malformed(format!("partition names unknown node '{id}'")))?;
            let next = label_ids.len();
            let label = *label_ids.entry(label).or_insert(next);
            if labels[node as usize].replace(label).is_some() {
                return Err(Error::malformed(format!(
                    "node '{id}' is assigned more than once"
                )));
            }
        }

        let labels = labels
            .into_iter()
            .enumerate()
            .map(|(node, label)| {
                label.ok_or_else(|| {
                    Error::malformed(format!(
                        "partition does not assign node '{}'",
                        graph.node_id(node)
                    ))
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self::new(labels))
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn label(&self, node: usize) -> usize {
        self.labels[node]
    }

    pub fn labels(&self) -> &[usize] {
        &self.labels
    }

    /// Whether two nodes share a community
    pub fn co_clustered(&self, a: usize, b: usize) -> bool {
        self.labels[a] == self.labels[b]
    }

    /// Relabel communities 0, 1, 2, ... in order of first appearance
    pub fn canonical(&self) -> Partition {
        let mut mapping: HashMap<usize, usize> = HashMap::new();
        let labels = self
            .labels
            .iter()
            .map(|&label| {
                let next = mapping.len();
                *mapping.entry(label).or_insert(next)
            })
            .collect();
        Partition::new(labels)
    }

    /// Same grouping of nodes, regardless of the label values used
    pub fn same_grouping(&self, other: &Partition) -> bool {
        self.len() == other.len() && self.canonical() == other.canonical()
    }

    pub fn community_count(&self) -> usize {
        self.communities().len()
    }

    /// Member lists, one per community, in canonical label order
    pub fn communities(&self) -> Vec<Vec<u32>> {
        let canonical = self.canonical();
        let mut communities: Vec<Vec<u32>> = Vec::new();
        for (node, &label) in canonical.labels.iter().enumerate() {
            if label == communities.len() {
                communities.push(Vec::new());
            }
            communities[label].push(node as u32);
        }
        communities
    }

    /// Split every community into its connected pieces within `graph`
    pub fn restrict_to(&self, graph: &WeightedGraph) -> Partition {
        let mut sets = DisjointSets::new(self.len());
        for edge in graph.edges() {
            if self.co_clustered(edge.source as usize, edge.target as usize) {
                sets.union(edge.source, edge.target);
            }
        }

        let roots = (0..self.len() as u32)
            .map(|node| sets.find(node) as usize)
            .collect();
        Partition::new(roots).canonical()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::GraphBuilder;

    fn chain() -> WeightedGraph {
        let mut builder = GraphBuilder::new();
        builder.add_edge("A", "B", 1.0).unwrap();
        builder.add_edge("C", "D", 1.0).unwrap();
        builder.build().unwrap()
    }

    #[test]
    fn test_canonical_relabels_by_first_appearance() {
        let partition = Partition::new(vec![7, 3, 7, 9]);
        assert_eq!(partition.canonical().labels(), &[0, 1, 0, 2]);
        assert_eq!(partition.community_count(), 3);
    }

    #[test]
    fn test_same_grouping_ignores_labels() {
        let a = Partition::new(vec![0, 0, 1, 1]);
        let b = Partition::new(vec![5, 5, 2, 2]);
        let c = Partition::new(vec![0, 1, 1, 1]);
        assert!(a.same_grouping(&b));
        assert!(!a.same_grouping(&c));
        assert!(!a.same_grouping(&Partition::new(vec![0, 0, 1])));
    }

    #[test]
    fn test_communities() {
        let partition = Partition::new(vec![2, 0, 2, 1]);
        assert_eq!(partition.communities(), vec![vec![0, 2], vec![1], vec![3]]);
    }

    #[test]
    fn test_from_assignments_with_opaque_labels() {
        let graph = chain();
        let partition = Partition::from_assignments(
            &graph,
            vec![("D", "red"), ("A", "blue"), ("B", "blue"), ("C", "red")],
        )
        .unwrap();
        assert!(partition.same_grouping(&Partition::new(vec![0, 0, 1, 1])));
    }

    #[test]
    fn test_from_assignments_rejects_mismatched_nodes() {
        let graph = chain();
        let missing = Partition::from_assignments(&graph, vec![("A", 0), ("B", 0), ("C", 1)]);
        assert!(matches!(missing, Err(Error::MalformedInput(_))));

        let unknown = Partition::from_assignments(
            &graph,
            vec![("A", 0), ("B", 0), ("C", 1), ("D", 1), ("E", 1)],
        );
        assert!(unknown.is_err());

        let twice = Partition::from_assignments(
            &graph,
            vec![("A", 0), ("B", 0), ("C", 1), ("D", 1), ("A", 1)],
        );
        assert!(twice.is_err());
    }

    #[test]
    fn test_restrict_splits_disconnected_communities() {
        let graph = chain();
        // One community holding two components
        let partition = Partition::new(vec![0, 0, 0, 0]);
        let restricted = partition.restrict_to(&graph);
        assert!(restricted.same_grouping(&Partition::new(vec![0, 0, 1, 1])));

        // Edges across communities do not merge them
        let partition = Partition::new(vec![0, 1, 1, 0]);
        let restricted = partition.restrict_to(&graph);
        assert_eq!(restricted.community_count(), 4);
    }
}
