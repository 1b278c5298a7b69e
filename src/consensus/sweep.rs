//! Consensus clustering across a range of thresholds

use crate::cluster::{modularity, CommunityDetection, Partition};
use crate::config::ConsensusConfig;
use crate::consensus::consensus_partition;
use crate::consistency::{edge_consistency, node_consistency, NodeConsistency};
use crate::error::{Error, Result};
use crate::graph::WeightedGraph;
use serde::{Deserialize, Serialize};

/// Outcome of the consensus loop at one threshold
///
/// Fields other than `threshold` are `None` when the loop did not converge
/// within the iteration cap.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ThresholdResult {
    pub threshold: f64,
    pub partition: Option<Partition>,
    pub iterations: Option<usize>,
    /// Modularity of the consensus partition on the original graph
    pub modularity: Option<f64>,
    pub nodes: Option<Vec<NodeConsistency>>,
}

impl ThresholdResult {
    pub fn converged(&self) -> bool {
        self.partition.is_some()
    }
}

/// Thresholds `0, step, 2*step, ...` strictly below 1
pub fn threshold_range(step: f64) -> Result<Vec<f64>> {
    if !(step > 0.0 && step <= 1.0) {
        return Err(Error::malformed(format!(
            "threshold step must lie in (0, 1], got {step}"
        )));
    }

    Ok((0..)
        .map(|i| i as f64 * step)
        .take_while(|&t| t < 1.0 - 1e-9)
        .collect())
}

/// Run the consensus loop once per threshold, all from the same seeds
///
/// Non-convergence at a threshold is recorded and the sweep moves on; any
/// other error aborts it.
pub fn sweep_thresholds<D: CommunityDetection + ?Sized>(
    detector: &D,
    graph: &WeightedGraph,
    seeds: &[Partition],
    thresholds: &[f64],
    config: &ConsensusConfig,
) -> Result<Vec<ThresholdResult>> {
    let mut results = Vec::with_capacity(thresholds.len());

    for &threshold in thresholds {
        log::info!("Sweep threshold: {:.3}", threshold);
        let run_config = config.clone().with_threshold(threshold);

        match consensus_partition(detector, graph, seeds, &run_config) {
            Ok(outcome) => {
                let edges = edge_consistency(graph, &outcome.matrix);
                let nodes = node_consistency(graph, &edges, Some(config.cutoffs.as_slice()))?;
                results.push(ThresholdResult {
                    threshold,
                    modularity: Some(modularity(graph, &outcome.partition, config.resolution)),
                    iterations: Some(outcome.iterations),
                    partition: Some(outcome.partition),
                    nodes: Some(nodes),
                });
            }
            Err(Error::NonConvergence { iterations }) => {
                log::warn!(
                    "No consensus at threshold {:.3} within {} iterations",
                    threshold,
                    iterations
                );
                results.push(ThresholdResult {
                    threshold,
                    partition: None,
                    iterations: None,
                    modularity: None,
                    nodes: None,
                });
            }
            Err(err) => return Err(err),
        }
    }

    Ok(results)
}
