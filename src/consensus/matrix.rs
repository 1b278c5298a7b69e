//! Co-membership (consensus) matrix

use crate::cluster::Partition;
use crate::error::{Error, Result};
use itertools::Itertools;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// One stored pair of the matrix
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ConsensusEntry {
    pub source: u32,
    pub target: u32,
    pub value: f64,
}

/// Symmetric node-pair co-membership frequencies over a set of partitions
///
/// Only pairs that shared a community in at least one partition are
/// stored; every other off-diagonal pair reads as missing. Counts are kept
/// as integers and divided on read, so the result depends only on how many
/// partitions agree, not on their order.
#[derive(Debug, Clone, PartialEq)]
pub struct ConsensusMatrix {
    node_count: usize,
    partition_count: usize,
    counts: HashMap<(u32, u32), u32>,
}

impl ConsensusMatrix {
    /// Count, for every pair co-clustered at least once, how many partitions agree
    pub fn build(partitions: &[Partition]) -> Result<Self> {
        let first = partitions
            .first()
            .ok_or_else(|| Error::malformed("cannot build a consensus matrix from zero partitions"))?;
        let node_count = first.len();
        if let Some(bad) = partitions.iter().find(|p| p.len() != node_count) {
            return Err(Error::malformed(format!(
                "partitions cover different node sets ({} vs {} nodes)",
                node_count,
                bad.len()
            )));
        }

        let counts = partitions
            .par_iter()
            .fold(HashMap::new, |mut counts: HashMap<(u32, u32), u32>, partition| {
                for members in partition.communities() {
                    // Members are ascending, so pairs come out as (min, max)
                    for (a, b) in members.iter().copied().tuple_combinations() {
                        *counts.entry((a, b)).or_insert(0) += 1;
                    }
                }
                counts
            })
            .reduce(HashMap::new, |mut left, right| {
                for (pair, count) in right {
                    *left.entry(pair).or_insert(0) += count;
                }
                left
            });

        log::debug!(
            "Consensus matrix over {} partitions holds {} pairs",
            partitions.len(),
            counts.len()
        );

        Ok(Self {
            node_count,
            partition_count: partitions.len(),
            counts,
        })
    }

    /// Co-membership frequency of two nodes
    ///
    /// `None` stands for the implicit value 0: the pair was never placed in
    /// the same community, or `a == b`. Callers that need the dense value
    /// read it as `get(a, b).unwrap_or(0.0)`; threshold filtering and edge
    /// consistency keep the distinction.
    pub fn get(&self, a: u32, b: u32) -> Option<f64> {
        if a == b {
            return None;
        }
        let key = if a < b { (a, b) } else { (b, a) };
        self.counts
            .get(&key)
            .map(|&count| count as f64 / self.partition_count as f64)
    }

    pub fn node_count(&self) -> usize {
        self.node_count
    }

    pub fn partition_count(&self) -> usize {
        self.partition_count
    }

    /// Number of stored pairs
    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    /// All stored pairs, sorted by (source, target)
    pub fn entries(&self) -> Vec<ConsensusEntry> {
        self.counts
            .iter()
            .map(|(&(source, target), &count)| ConsensusEntry {
                source,
                target,
                value: count as f64 / self.partition_count as f64,
            })
            .sorted_by_key(|entry| (entry.source, entry.target))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scenario() -> Vec<Partition> {
        // Nodes A, B, C, D
        vec![
            Partition::new(vec![0, 0, 1, 1]),
            Partition::new(vec![0, 0, 1, 1]),
            Partition::new(vec![0, 0, 0, 1]),
        ]
    }

    #[test]
    fn test_single_partition_is_binary() {
        let matrix = ConsensusMatrix::build(&[Partition::new(vec![0, 0, 1, 1, 0])]).unwrap();
        assert_eq!(matrix.get(0, 1), Some(1.0));
        assert_eq!(matrix.get(0, 4), Some(1.0));
        assert_eq!(matrix.get(2, 3), Some(1.0));
        assert_eq!(matrix.get(0, 2), None);
        assert_eq!(matrix.len(), 4);
    }

    #[test]
    fn test_scenario_values() {
        let matrix = ConsensusMatrix::build(&scenario()).unwrap();
        assert_eq!(matrix.get(0, 1), Some(1.0));
        assert!((matrix.get(2, 3).unwrap() - 2.0 / 3.0).abs() < 1e-12);
        assert!((matrix.get(1, 2).unwrap() - 1.0 / 3.0).abs() < 1e-12);
        assert!((matrix.get(0, 2).unwrap() - 1.0 / 3.0).abs() < 1e-12);
        assert_eq!(matrix.get(0, 3), None);
    }

    #[test]
    fn test_symmetric_and_bounded() {
        let matrix = ConsensusMatrix::build(&scenario()).unwrap();
        for a in 0..4 {
            for b in 0..4 {
                assert_eq!(matrix.get(a, b), matrix.get(b, a));
                if let Some(value) = matrix.get(a, b) {
                    assert!((0.0..=1.0).contains(&value));
                }
            }
        }
        assert_eq!(matrix.get(1, 1), None);
    }

    #[test]
    fn test_partition_order_is_irrelevant() {
        let mut reversed = scenario();
        reversed.reverse();
        assert_eq!(
            ConsensusMatrix::build(&scenario()).unwrap(),
            ConsensusMatrix::build(&reversed).unwrap()
        );
    }

    #[test]
    fn test_entries_are_sorted() {
        let matrix = ConsensusMatrix::build(&scenario()).unwrap();
        let pairs: Vec<(u32, u32)> = matrix
            .entries()
            .iter()
            .map(|e| (e.source, e.target))
            .collect();
        assert_eq!(pairs, vec![(0, 1), (0, 2), (1, 2), (2, 3)]);
    }

    #[test]
    fn test_unobserved_pairs_read_as_zero() {
        let matrix = ConsensusMatrix::build(&scenario()).unwrap();
        // A and D never share a community, the diagonal is not stored
        assert_eq!(matrix.get(0, 3), None);
        assert_eq!(matrix.get(0, 3).unwrap_or(0.0), 0.0);
        assert_eq!(matrix.get(2, 2).unwrap_or(0.0), 0.0);
        assert!(matrix.entries().iter().all(|e| e.value > 0.0));
    }

    #[test]
    fn test_rejects_empty_and_mismatched_input() {
        assert!(matches!(
            ConsensusMatrix::build(&[]),
            Err(Error::MalformedInput(_))
        ));
        let mismatched = vec![Partition::singletons(3), Partition::singletons(4)];
        assert!(ConsensusMatrix::build(&mismatched).is_err());
    }
}
