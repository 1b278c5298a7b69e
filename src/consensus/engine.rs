//! Threshold-and-reiterate consensus clustering
//!
//! Each round turns the current candidate partitions into a consensus
//! matrix, keeps only the graph edges whose co-membership reaches the
//! threshold, and re-clusters that filtered graph once per candidate,
//! seeding every run with its candidate split along the surviving edges.
//! The loop stops as soon as all fresh candidates group the nodes the same
//! way. Rounds are strictly sequential; runs within a round are not.

use crate::cluster::{generate_partitions, run_seed, CommunityDetection, Partition};
use crate::config::ConsensusConfig;
use crate::consensus::ConsensusMatrix;
use crate::error::{Error, Result};
use crate::graph::{connected_components, threshold_graph, WeightedGraph};
use rayon::prelude::*;
use std::collections::HashSet;

/// Converged result of a consensus run
#[derive(Debug, Clone)]
pub struct ConsensusOutcome {
    /// Consensus matrix of the candidates that led to agreement
    pub matrix: ConsensusMatrix,

    /// The agreed partition, canonically labeled
    pub partition: Partition,

    /// Number of rounds performed
    pub iterations: usize,
}

/// Runs consensus clustering with a fixed detector and configuration
pub struct ConsensusEngine<D> {
    detector: D,
    config: ConsensusConfig,
}

impl<D: CommunityDetection> ConsensusEngine<D> {
    pub fn new(detector: D, config: ConsensusConfig) -> Self {
        Self { detector, config }
    }

    pub fn config(&self) -> &ConsensusConfig {
        &self.config
    }

    pub fn detector(&self) -> &D {
        &self.detector
    }

    /// Generate the initial candidates from scratch
    pub fn initial_partitions(&self, graph: &WeightedGraph) -> Result<Vec<Partition>> {
        self.config.validate()?;
        generate_partitions(
            &self.detector,
            graph,
            self.config.partition_count,
            None,
            self.config.seed,
        )
    }

    /// Iterate from `seeds` until every fresh candidate agrees
    pub fn consensus_partition(
        &self,
        graph: &WeightedGraph,
        seeds: &[Partition],
    ) -> Result<ConsensusOutcome> {
        consensus_partition(&self.detector, graph, seeds, &self.config)
    }
}

/// Iterate from `seeds` until every fresh candidate agrees
///
/// The number of candidates per round is `seeds.len()`;
/// `config.partition_count` only matters when generating initial
/// candidates. Fails with [`Error::NonConvergence`] once
/// `config.max_iterations` rounds pass without agreement.
///
/// Candidates are split into the connected pieces of the thresholded graph
/// before they seed a round. A single candidate at threshold 0 therefore
/// comes back unchanged only if each of its communities is connected by
/// edges it co-clusters; otherwise the disconnected members are separated.
pub fn consensus_partition<D: CommunityDetection + ?Sized>(
    detector: &D,
    graph: &WeightedGraph,
    seeds: &[Partition],
    config: &ConsensusConfig,
) -> Result<ConsensusOutcome> {
    config.validate()?;
    if graph.is_empty() {
        return Err(Error::malformed("graph has no nodes"));
    }
    if seeds.is_empty() {
        return Err(Error::malformed("no candidate partitions to start from"));
    }
    if let Some(bad) = seeds.iter().find(|p| p.len() != graph.node_count()) {
        return Err(Error::malformed(format!(
            "candidate partition covers {} nodes, graph has {}",
            bad.len(),
            graph.node_count()
        )));
    }

    let count = seeds.len();
    let mut candidates: Vec<Partition> = seeds.to_vec();
    let mut iteration = 0usize;

    loop {
        if let Some(cap) = config.max_iterations {
            if iteration >= cap {
                log::warn!(
                    "Consensus at threshold {:.3} gave up after {} iterations",
                    config.threshold,
                    cap
                );
                return Err(Error::NonConvergence { iterations: cap });
            }
        }
        iteration += 1;

        let matrix = ConsensusMatrix::build(&candidates)?;
        let filtered = threshold_graph(graph, &matrix, config.threshold, config.reweight);

        let restricted: Vec<Partition> = candidates
            .par_iter()
            .map(|partition| partition.restrict_to(&filtered))
            .collect();

        let next = generate_partitions(
            detector,
            &filtered,
            count,
            Some(restricted.as_slice()),
            run_seed(config.seed, iteration as u64),
        )?;

        let distinct = distinct_groupings(&next);
        log::info!(
            "Iteration {}: {} co-clustered pairs, {} of {} edges kept, {} distinct partitions",
            iteration,
            matrix.len(),
            filtered.edge_count(),
            graph.edge_count(),
            distinct
        );
        if log::log_enabled!(log::Level::Debug) {
            log::debug!(
                "Iteration {}: thresholded graph has {} components",
                iteration,
                connected_components(&filtered)
            );
        }

        if distinct == 1 {
            let partition = next[0].canonical();
            log::info!(
                "Converged after {} iterations with {} communities",
                iteration,
                partition.community_count()
            );
            return Ok(ConsensusOutcome {
                matrix,
                partition,
                iterations: iteration,
            });
        }

        candidates = next;
    }
}

/// Number of different groupings among `partitions`, ignoring labels
fn distinct_groupings(partitions: &[Partition]) -> usize {
    partitions
        .iter()
        .map(Partition::canonical)
        .collect::<HashSet<_>>()
        .len()
}
