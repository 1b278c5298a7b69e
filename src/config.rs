//! Configuration management for consensus clustering

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};

/// Cutoffs used for the fraction-of-consistent-neighbors columns when none are given
pub const DEFAULT_CUTOFFS: [f64; 3] = [0.8, 0.9, 1.0];

/// Parameters of a consensus clustering run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConsensusConfig {
    /// Minimum co-membership frequency for an edge to survive a round
    pub threshold: f64,

    /// Number of candidate partitions generated per round
    pub partition_count: usize,

    /// Upper bound on re-clustering rounds (`None` = unbounded)
    pub max_iterations: Option<usize>,

    /// Cutoffs for the node-level consistent-neighbor fractions
    pub cutoffs: Vec<f64>,

    /// Base seed from which every clustering run derives its own seed
    pub seed: u64,

    /// Reweight surviving edges by their co-membership value
    pub reweight: bool,

    /// Modularity resolution used by the built-in Louvain detector
    pub resolution: f64,
}

impl Default for ConsensusConfig {
    fn default() -> Self {
        Self {
            threshold: 0.5,
            partition_count: 100,
            max_iterations: Some(100),
            cutoffs: DEFAULT_CUTOFFS.to_vec(),
            seed: 0,
            reweight: true,
            resolution: 1.0,
        }
    }
}

impl ConsensusConfig {
    /// Create a new configuration with custom values
    pub fn new(
        threshold: f64,
        partition_count: usize,
        max_iterations: Option<usize>,
        seed: u64,
    ) -> Self {
        Self {
            threshold,
            partition_count,
            max_iterations,
            seed,
            ..Self::default()
        }
    }

    pub fn with_threshold(mut self, threshold: f64) -> Self {
        self.threshold = threshold;
        self
    }

    pub fn with_partition_count(mut self, partition_count: usize) -> Self {
        self.partition_count = partition_count;
        self
    }

    pub fn with_max_iterations(mut self, max_iterations: Option<usize>) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    pub fn with_cutoffs(mut self, cutoffs: Vec<f64>) -> Self {
        self.cutoffs = cutoffs;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_reweight(mut self, reweight: bool) -> Self {
        self.reweight = reweight;
        self
    }

    pub fn with_resolution(mut self, resolution: f64) -> Self {
        self.resolution = resolution;
        self
    }

    /// Check parameter ranges before any clustering work starts
    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.threshold) {
            return Err(Error::malformed(format!(
                "threshold must lie in [0, 1], got {}",
                self.threshold
            )));
        }
        if self.partition_count == 0 {
            return Err(Error::malformed("partition count must be positive"));
        }
        if self.max_iterations == Some(0) {
            return Err(Error::malformed("iteration cap must be positive"));
        }
        if self.cutoffs.iter().any(|c| !c.is_finite()) {
            return Err(Error::malformed("consistency cutoffs must be finite"));
        }
        if !(self.resolution.is_finite() && self.resolution > 0.0) {
            return Err(Error::malformed("resolution must be a positive number"));
        }
        Ok(())
    }
}
