//! Community detection: the pluggable oracle and a seeded Louvain
//!
//! The consensus engine only needs "partition this graph, optionally
//! starting from this assignment". [`CommunityDetection`] captures that
//! capability; [`Louvain`] is the built-in weighted modularity optimizer.
//!
//! ## Louvain (Blondel et al. 2008)
//!
//! 1. **Local moving**: visit nodes in random order and move each to the
//!    neighboring community with the largest modularity gain, until a full
//!    pass moves nothing.
//! 2. **Aggregation**: collapse every community into one node, with
//!    internal weight kept as a self-loop, and repeat on the smaller graph.
//!
//! The visiting order is the only source of randomness and is driven by the
//! per-call seed, so a run is reproducible from (graph, initial, seed).

use crate::cluster::Partition;
use crate::error::{Error, Result};
use crate::graph::WeightedGraph;
use rand::prelude::*;
use rand::rngs::StdRng;
use std::collections::BTreeMap;

const GAIN_EPSILON: f64 = 1e-12;

/// A nondeterministic, quality-optimizing community detection routine
///
/// Implementations must be pure given their inputs: the same graph, initial
/// partition and seed yield the same partition.
pub trait CommunityDetection: Sync {
    /// Partition `graph`, refining `initial` when given
    fn detect(
        &self,
        graph: &WeightedGraph,
        initial: Option<&Partition>,
        seed: u64,
    ) -> Result<Partition>;
}

/// Louvain community detection algorithm.
#[derive(Debug, Clone)]
pub struct Louvain {
    /// Resolution parameter (gamma).
    resolution: f64,
    /// Maximum local moving passes per level.
    max_iter: usize,
    /// Maximum levels of aggregation.
    max_levels: usize,
}

impl Louvain {
    /// Create a new Louvain detector with default settings.
    pub fn new() -> Self {
        Self {
            resolution: 1.0,
            max_iter: 100,
            max_levels: 10,
        }
    }

    /// Set resolution parameter.
    ///
    /// Higher values produce smaller communities.
    pub fn with_resolution(mut self, resolution: f64) -> Self {
        self.resolution = resolution;
        self
    }

    /// Phase 1: move nodes between communities, starting from `labels`.
    /// Returns (labels, moved).
    fn local_moving(
        &self,
        level: &Level,
        mut labels: Vec<usize>,
        rng: &mut StdRng,
    ) -> (Vec<usize>, bool) {
        let n = level.n;
        let m = level.total_weight;

        let mut community_degrees = vec![0.0; n];
        let mut community_sizes = vec![0usize; n];
        for node in 0..n {
            community_degrees[labels[node]] += level.degrees[node];
            community_sizes[labels[node]] += 1;
        }
        let mut empty: Vec<usize> = (0..n).filter(|&c| community_sizes[c] == 0).collect();

        let mut order: Vec<usize> = (0..n).collect();
        let mut weight_to = vec![0.0; n];
        let mut touched_flag = vec![false; n];
        let mut touched: Vec<usize> = Vec::new();
        let mut any_moved = false;

        for _pass in 0..self.max_iter {
            order.shuffle(rng);
            let mut moved = false;

            for &node in &order {
                let current = labels[node];
                let ki = level.degrees[node];

                for &(neighbor, w) in &level.adj[node] {
                    let c = labels[neighbor];
                    if !touched_flag[c] {
                        touched_flag[c] = true;
                        touched.push(c);
                    }
                    weight_to[c] += w;
                }

                // Take the node out of its community
                community_degrees[current] -= ki;
                community_sizes[current] -= 1;

                // Gain of joining community c, scaled by m
                let gain = |k_in: f64, sigma_tot: f64| {
                    k_in - self.resolution * sigma_tot * ki / (2.0 * m)
                };

                let mut best = current;
                let mut best_gain = gain(weight_to[current], community_degrees[current]);
                for &c in &touched {
                    if c == current {
                        continue;
                    }
                    let g = gain(weight_to[c], community_degrees[c]);
                    if g > best_gain + GAIN_EPSILON {
                        best = c;
                        best_gain = g;
                    }
                }

                // Standing alone has gain 0
                if best == current && community_sizes[current] > 0 && best_gain < -GAIN_EPSILON {
                    if let Some(c) = empty.pop() {
                        best = c;
                    }
                }

                labels[node] = best;
                community_degrees[best] += ki;
                community_sizes[best] += 1;
                if best != current {
                    moved = true;
                    if community_sizes[current] == 0 {
                        empty.push(current);
                    }
                }

                for &c in &touched {
                    weight_to[c] = 0.0;
                    touched_flag[c] = false;
                }
                touched.clear();
            }

            if !moved {
                break;
            }
            any_moved = true;
        }

        (labels, any_moved)
    }
}

impl Default for Louvain {
    fn default() -> Self {
        Self::new()
    }
}

impl CommunityDetection for Louvain {
    fn detect(
        &self,
        graph: &WeightedGraph,
        initial: Option<&Partition>,
        seed: u64,
    ) -> Result<Partition> {
        let n = graph.node_count();
        if n == 0 {
            return Err(Error::malformed("cannot detect communities in an empty graph"));
        }
        if let Some(initial) = initial {
            if initial.len() != n {
                return Err(Error::malformed(format!(
                    "initial partition covers {} nodes, graph has {}",
                    initial.len(),
                    n
                )));
            }
        }

        if graph.edge_count() == 0 {
            // No edges: each node is its own community
            return Ok(Partition::singletons(n));
        }

        let mut rng = StdRng::seed_from_u64(seed);
        let mut level = Level::from_graph(graph);

        // membership[v] = node of the current level that holds original node v
        let mut membership: Vec<usize> = (0..n).collect();
        let mut start: Vec<usize> = match initial {
            Some(partition) => partition.canonical().labels().to_vec(),
            None => (0..n).collect(),
        };

        for _level in 0..self.max_levels {
            let (mut labels, _moved) = self.local_moving(&level, start, &mut rng);
            let count = renumber(&mut labels);

            for m in membership.iter_mut() {
                *m = labels[*m];
            }

            // Nothing merged, so aggregation would reproduce this level
            if count == level.n {
                break;
            }

            level = level.aggregate(&labels, count);
            start = (0..count).collect();
        }

        Ok(Partition::new(membership).canonical())
    }
}

/// One level of the Louvain hierarchy
struct Level {
    n: usize,
    /// Adjacency without self-loops: node -> [(neighbor, weight)]
    adj: Vec<Vec<(usize, f64)>>,
    /// Weight collapsed into each node by aggregation
    self_loops: Vec<f64>,
    /// Weighted degree, self-loops counted twice
    degrees: Vec<f64>,
    /// Total edge weight m
    total_weight: f64,
}

impl Level {
    fn from_graph(graph: &WeightedGraph) -> Self {
        let n = graph.node_count();
        let mut adj = vec![Vec::new(); n];
        for edge in graph.edges() {
            let (i, j) = (edge.source as usize, edge.target as usize);
            adj[i].push((j, edge.weight));
            adj[j].push((i, edge.weight));
        }
        let degrees = (0..n).map(|node| graph.strength(node)).collect();

        Self {
            n,
            adj,
            self_loops: vec![0.0; n],
            degrees,
            total_weight: graph.total_weight(),
        }
    }

    /// Phase 2: collapse communities (labels 0..count) into single nodes.
    fn aggregate(&self, labels: &[usize], count: usize) -> Level {
        let mut self_loops = vec![0.0; count];
        for (node, &sl) in self.self_loops.iter().enumerate() {
            self_loops[labels[node]] += sl;
        }

        // Ordered map keeps the aggregated adjacency reproducible
        let mut between: BTreeMap<(usize, usize), f64> = BTreeMap::new();
        for node in 0..self.n {
            for &(neighbor, w) in &self.adj[node] {
                if node >= neighbor {
                    continue;
                }
                let (ci, cj) = (labels[node], labels[neighbor]);
                if ci == cj {
                    self_loops[ci] += w;
                } else {
                    let key = if ci < cj { (ci, cj) } else { (cj, ci) };
                    *between.entry(key).or_insert(0.0) += w;
                }
            }
        }

        let mut adj = vec![Vec::new(); count];
        let mut degrees: Vec<f64> = self_loops.iter().map(|sl| 2.0 * sl).collect();
        for (&(i, j), &w) in &between {
            adj[i].push((j, w));
            adj[j].push((i, w));
            degrees[i] += w;
            degrees[j] += w;
        }

        let total_weight = between.values().sum::<f64>() + self_loops.iter().sum::<f64>();

        Level {
            n: count,
            adj,
            self_loops,
            degrees,
            total_weight,
        }
    }
}

/// Renumber labels to 0..k by first appearance, returning k
fn renumber(labels: &mut [usize]) -> usize {
    let mut mapping = vec![usize::MAX; labels.len()];
    let mut next = 0;
    for label in labels.iter_mut() {
        if mapping[*label] == usize::MAX {
            mapping[*label] = next;
            next += 1;
        }
        *label = mapping[*label];
    }
    next
}

/// Weighted modularity of a partition
///
/// `Q = Σ_c [ w_in(c) / m - γ (d(c) / 2m)² ]`, with `w_in(c)` the weight
/// inside community c and `d(c)` its total weighted degree.
pub fn modularity(graph: &WeightedGraph, partition: &Partition, resolution: f64) -> f64 {
    let m = graph.total_weight();
    if m == 0.0 {
        return 0.0;
    }

    let canonical = partition.canonical();
    let count = canonical.labels().iter().max().map_or(0, |&max| max + 1);
    let mut internal = vec![0.0; count];
    let mut degree = vec![0.0; count];

    for edge in graph.edges() {
        let (ci, cj) = (
            canonical.label(edge.source as usize),
            canonical.label(edge.target as usize),
        );
        degree[ci] += edge.weight;
        degree[cj] += edge.weight;
        if ci == cj {
            internal[ci] += edge.weight;
        }
    }

    internal
        .iter()
        .zip(&degree)
        .map(|(w_in, d)| w_in / m - resolution * (d / (2.0 * m)).powi(2))
        .sum()
}
